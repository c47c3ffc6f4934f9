//! Attribute serialization.
//!
//! Every annotation is built from an explicit, ordered attribute table
//! (`Vec<Attribute>`) plus a static set of [`SerializeRules`]. The table order
//! is the output order, so two calls on the same descriptor always produce the
//! same text.
//!
//! Per attribute, in this order:
//! 1. excluded names are skipped;
//! 2. null values are skipped;
//! 3. a registered formatter renders the value (an empty result skips it);
//! 4. literal names holding a non-empty array/object render as JSON;
//! 5. any other non-scalar is skipped;
//! 6. scalars render bare (numbers, booleans) or double-quoted (strings).

use serde_json::Value;

/// Alias the annotation namespace is imported under (`use ... as ORM;`).
pub const DEFAULT_ALIAS: &str = "ORM";

/// Custom rendering for one attribute. An empty string drops the attribute.
pub type Formatter = fn(&Value) -> String;

/// One `name=value` slot of an annotation, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub value: Value,
}

impl Attribute {
    pub fn new(name: &'static str, value: impl Into<Value>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Per-record inclusion and formatting rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeRules {
    /// Names never emitted, whatever their value.
    pub excluded: &'static [&'static str],
    /// Names whose collection value is emitted as an embedded JSON literal.
    pub literal: &'static [&'static str],
    /// Names with a custom formatter.
    pub formatters: &'static [(&'static str, Formatter)],
}

impl SerializeRules {
    pub const NONE: SerializeRules = SerializeRules {
        excluded: &[],
        literal: &[],
        formatters: &[],
    };

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(&name)
    }

    fn is_literal(&self, name: &str) -> bool {
        self.literal.contains(&name)
    }

    fn formatter(&self, name: &str) -> Option<Formatter> {
        self.formatters
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, format)| *format)
    }
}

/// Serialize an attribute table into `a="x", b=1, c=true`.
pub fn serialize_attributes(attributes: &[Attribute], rules: &SerializeRules) -> String {
    let mut parts = Vec::with_capacity(attributes.len());

    for attribute in attributes {
        let name = attribute.name;
        let value = &attribute.value;

        if rules.is_excluded(name) || value.is_null() {
            continue;
        }

        if let Some(format) = rules.formatter(name) {
            let rendered = format(value);
            if !rendered.is_empty() {
                parts.push(format!("{name}={rendered}"));
            }
            continue;
        }

        if rules.is_literal(name) {
            let non_empty = match value {
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
                _ => false,
            };
            if non_empty {
                parts.push(format!("{name}={value}"));
                continue;
            }
        }

        if let Some(rendered) = render_scalar(value) {
            parts.push(format!("{name}={rendered}"));
        }
    }

    parts.join(", ")
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(quote(text)),
        _ => None,
    }
}

/// Double-quote a string the way annotation parsers expect (`"` is doubled).
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// `Doctrine\ORM\Mapping\Column` -> `Column`.
pub fn short_type_name(tag: &str) -> &str {
    tag.rsplit('\\').next().unwrap_or(tag)
}

/// Numeric attributes that mean "unset" when zero.
pub fn non_zero(value: &Value) -> String {
    match value.as_f64() {
        Some(number) if number != 0.0 => value.to_string(),
        _ => String::new(),
    }
}

/// `["persist","remove"]` -> `{"persist","remove"}`.
pub fn quoted_set(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => quote(text),
                    other => other.to_string(),
                })
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
        _ => String::new(),
    }
}

/// Already-rendered nested annotations -> `{@ORM\A(..),@ORM\B(..)}`.
pub fn nested_set(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let rendered: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            format!("{{{}}}", rendered.join(","))
        }
        _ => String::new(),
    }
}

/// A rendered annotation: `@<alias>\<ShortName>` with an optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    short_name: String,
    body: Option<String>,
}

impl Annotation {
    /// A record annotation; always carries parentheses.
    pub fn record(tag: &str, attributes: &[Attribute], rules: &SerializeRules) -> Self {
        Self {
            short_name: short_type_name(tag).to_string(),
            body: Some(serialize_attributes(attributes, rules)),
        }
    }

    /// A marker annotation such as `@ORM\Id`.
    pub fn marker(tag: &str) -> Self {
        Self {
            short_name: short_type_name(tag).to_string(),
            body: None,
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn render(&self, alias: &str) -> String {
        match &self.body {
            Some(body) => format!("@{alias}\\{}({body})", self.short_name),
            None => format!("@{alias}\\{}", self.short_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMN_LIKE: SerializeRules = SerializeRules {
        excluded: &["name"],
        literal: &["options"],
        formatters: &[("precision", non_zero), ("scale", non_zero)],
    };

    fn column_attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("name", "title"),
            Attribute::new("column", "C"),
            Attribute::new("type", "string"),
            Attribute::new("nullable", false),
            Attribute::new("length", 255),
            Attribute::new("unique", Value::Null),
            Attribute::new("precision", 0),
            Attribute::new("scale", 0),
            Attribute::new("options", json!({})),
        ]
    }

    #[test]
    fn column_attributes_keep_declaration_order() {
        let out = serialize_attributes(&column_attributes(), &COLUMN_LIKE);
        assert_eq!(
            out,
            r#"column="C", type="string", nullable=false, length=255"#
        );
    }

    #[test]
    fn excluded_attribute_never_appears() {
        let out = serialize_attributes(&column_attributes(), &COLUMN_LIKE);
        assert!(!out.contains("name="), "{out}");
    }

    #[test]
    fn literal_collection_is_emitted_as_json() {
        let attributes = vec![
            Attribute::new("column", "price"),
            Attribute::new("options", json!({"unsigned": true, "default": 0})),
        ];
        let out = serialize_attributes(&attributes, &COLUMN_LIKE);
        assert_eq!(out, r#"column="price", options={"unsigned":true,"default":0}"#);
    }

    #[test]
    fn non_scalar_without_rule_is_skipped() {
        let attributes = vec![
            Attribute::new("tags", json!(["a", "b"])),
            Attribute::new("flag", true),
        ];
        let out = serialize_attributes(&attributes, &SerializeRules::NONE);
        assert_eq!(out, "flag=true");
    }

    #[test]
    fn formatter_with_empty_result_drops_attribute() {
        let rules = SerializeRules {
            formatters: &[("cascade", quoted_set)],
            ..SerializeRules::NONE
        };
        let empty = vec![Attribute::new("cascade", json!([]))];
        assert_eq!(serialize_attributes(&empty, &rules), "");

        let set = vec![Attribute::new("cascade", json!(["persist", "remove"]))];
        assert_eq!(
            serialize_attributes(&set, &rules),
            r#"cascade={"persist","remove"}"#
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let attributes = vec![Attribute::new("comment", r#"say "hi""#)];
        assert_eq!(
            serialize_attributes(&attributes, &SerializeRules::NONE),
            r#"comment="say ""hi""""#
        );
    }

    #[test]
    fn short_name_strips_namespace() {
        assert_eq!(short_type_name("Doctrine\\ORM\\Mapping\\Column"), "Column");
        assert_eq!(short_type_name("Column"), "Column");
    }

    #[test]
    fn annotation_renders_with_alias() {
        let record = Annotation::record(
            "Doctrine\\ORM\\Mapping\\Column",
            &[Attribute::new("type", "integer")],
            &SerializeRules::NONE,
        );
        assert_eq!(record.render("ORM"), r#"@ORM\Column(type="integer")"#);
        assert_eq!(
            Annotation::marker("Doctrine\\ORM\\Mapping\\Id").render("Mapping"),
            r"@Mapping\Id"
        );
    }
}
