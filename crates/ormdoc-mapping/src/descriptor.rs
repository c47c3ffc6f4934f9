//! Entity, field, relation, index and callback descriptors.
//!
//! Descriptors are plain values built once per mapping document. Each variant
//! exposes its attribute table explicitly; the shared serializer in
//! [`crate::annotation`] turns that table into text.

use crate::annotation::{nested_set, non_zero, quoted_set, Annotation, Attribute, SerializeRules};
use serde::Serialize;
use serde_json::{Map, Value};

/// Fully-qualified annotation class names.
pub mod tags {
    pub const ENTITY: &str = "Doctrine\\ORM\\Mapping\\Entity";
    pub const TABLE: &str = "Doctrine\\ORM\\Mapping\\Table";
    pub const HAS_LIFECYCLE_CALLBACKS: &str = "Doctrine\\ORM\\Mapping\\HasLifecycleCallbacks";
    pub const COLUMN: &str = "Doctrine\\ORM\\Mapping\\Column";
    pub const ID: &str = "Doctrine\\ORM\\Mapping\\Id";
    pub const GENERATED_VALUE: &str = "Doctrine\\ORM\\Mapping\\GeneratedValue";
    pub const MANY_TO_ONE: &str = "Doctrine\\ORM\\Mapping\\ManyToOne";
    pub const ONE_TO_MANY: &str = "Doctrine\\ORM\\Mapping\\OneToMany";
    pub const MANY_TO_MANY: &str = "Doctrine\\ORM\\Mapping\\ManyToMany";
    pub const JOIN_COLUMN: &str = "Doctrine\\ORM\\Mapping\\JoinColumn";
    pub const JOIN_TABLE: &str = "Doctrine\\ORM\\Mapping\\JoinTable";
    pub const INDEX: &str = "Doctrine\\ORM\\Mapping\\Index";
    pub const UNIQUE_CONSTRAINT: &str = "Doctrine\\ORM\\Mapping\\UniqueConstraint";
}

const COLUMN_RULES: SerializeRules = SerializeRules {
    excluded: &["targetEntity", "mappedBy", "inversedBy", "cascade", "fetch"],
    literal: &["options"],
    formatters: &[("precision", non_zero), ("scale", non_zero)],
};

const RELATION_RULES: SerializeRules = SerializeRules {
    excluded: &[
        "column",
        "type",
        "nullable",
        "length",
        "unique",
        "precision",
        "scale",
        "options",
    ],
    literal: &[],
    formatters: &[("cascade", quoted_set)],
};

const JOIN_TABLE_RULES: SerializeRules = SerializeRules {
    excluded: &[],
    literal: &[],
    formatters: &[("joinColumns", nested_set), ("inverseJoinColumns", nested_set)],
};

const TABLE_RULES: SerializeRules = SerializeRules {
    excluded: &[],
    literal: &[],
    formatters: &[("uniqueConstraints", nested_set), ("indexes", nested_set)],
};

const INDEX_RULES: SerializeRules = SerializeRules {
    excluded: &[],
    literal: &[],
    formatters: &[("columns", quoted_set)],
};

// ============================================================================
// Entity
// ============================================================================

/// In-memory model of one mapping document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescriptor {
    /// Fully-qualified class name, e.g. `App\Entity\Book`.
    pub class_name: String,
    pub table: String,
    pub repository_class: String,
    pub has_lifecycle_callbacks: bool,
    /// Plain fields, many-to-one, one-to-many, many-to-many, identifiers.
    pub fields: Vec<FieldDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub unique_constraints: Vec<IndexDescriptor>,
    pub callbacks: Vec<LifecycleCallback>,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Lines for the documentation block above the class declaration.
    pub fn class_annotation_lines(&self, alias: &str) -> Vec<String> {
        let entity = Annotation::record(
            tags::ENTITY,
            &[Attribute::new("repositoryClass", self.repository_class.as_str())],
            &SerializeRules::NONE,
        );

        let render_all = |indexes: &[IndexDescriptor]| -> Value {
            Value::Array(
                indexes
                    .iter()
                    .map(|index| Value::String(index.annotation().render(alias)))
                    .collect(),
            )
        };

        let table = Annotation::record(
            tags::TABLE,
            &[
                Attribute::new("name", self.table.as_str()),
                Attribute::new("uniqueConstraints", render_all(self.unique_constraints.as_slice())),
                Attribute::new("indexes", render_all(self.indexes.as_slice())),
            ],
            &TABLE_RULES,
        );

        let mut lines = vec![entity.render(alias), table.render(alias)];
        if self.has_lifecycle_callbacks {
            lines.push(Annotation::marker(tags::HAS_LIFECYCLE_CALLBACKS).render(alias));
        }
        lines
    }
}

// ============================================================================
// Fields
// ============================================================================

/// One mapped member of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Property name in the class.
    pub name: String,
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub scalar_type: Option<String>,
    pub nullable: Option<bool>,
    pub unique: Option<bool>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// Engine-specific options in document order.
    pub options: Map<String, Value>,
    pub variant: FieldVariant,
}

/// The closed set of field shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum FieldVariant {
    Plain,
    Identifier {
        strategy: Option<String>,
    },
    ManyToOne(Relation),
    OneToMany(Relation),
    ManyToMany {
        relation: Relation,
        join_table: Option<JoinTable>,
    },
}

/// Relation attributes shared by the three association kinds.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Relation {
    pub target_entity: String,
    pub mapped_by: Option<String>,
    pub inversed_by: Option<String>,
    pub fetch: Option<String>,
    pub join_column: Option<JoinColumn>,
    /// Operation names without the `cascade-` prefix.
    pub cascade: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, variant: FieldVariant) -> Self {
        Self {
            name: name.into(),
            column: None,
            scalar_type: None,
            nullable: None,
            unique: None,
            length: None,
            precision: None,
            scale: None,
            options: Map::new(),
            variant,
        }
    }

    pub fn relation(&self) -> Option<&Relation> {
        match &self.variant {
            FieldVariant::ManyToOne(relation) | FieldVariant::OneToMany(relation) => Some(relation),
            FieldVariant::ManyToMany { relation, .. } => Some(relation),
            FieldVariant::Plain | FieldVariant::Identifier { .. } => None,
        }
    }

    /// The full attribute table, in output order. Variants pick what they
    /// need through their rules.
    pub fn attributes(&self) -> Vec<Attribute> {
        let relation = self.relation();
        let cascade = relation
            .map(|relation| {
                Value::Array(
                    relation
                        .cascade
                        .iter()
                        .map(|operation| Value::String(operation.clone()))
                        .collect(),
                )
            })
            .unwrap_or(Value::Null);

        vec![
            Attribute::new("column", self.column.clone()),
            Attribute::new("type", self.scalar_type.clone()),
            Attribute::new("nullable", self.nullable),
            Attribute::new("length", self.length),
            Attribute::new("unique", self.unique),
            Attribute::new("precision", self.precision),
            Attribute::new("scale", self.scale),
            Attribute::new("options", Value::Object(self.options.clone())),
            Attribute::new("targetEntity", relation.map(|r| r.target_entity.clone())),
            Attribute::new("mappedBy", relation.and_then(|r| r.mapped_by.clone())),
            Attribute::new("inversedBy", relation.and_then(|r| r.inversed_by.clone())),
            Attribute::new("cascade", cascade),
            Attribute::new("fetch", relation.and_then(|r| r.fetch.clone())),
        ]
    }

    fn column_annotation(&self) -> Annotation {
        Annotation::record(tags::COLUMN, &self.attributes(), &COLUMN_RULES)
    }

    fn relation_annotation(&self, tag: &str) -> Annotation {
        Annotation::record(tag, &self.attributes(), &RELATION_RULES)
    }

    /// Serialized primary annotation of this field.
    pub fn serialize(&self, alias: &str) -> String {
        match &self.variant {
            FieldVariant::Plain | FieldVariant::Identifier { .. } => {
                self.column_annotation().render(alias)
            }
            FieldVariant::ManyToOne(_) => self.relation_annotation(tags::MANY_TO_ONE).render(alias),
            FieldVariant::OneToMany(_) => self.relation_annotation(tags::ONE_TO_MANY).render(alias),
            FieldVariant::ManyToMany { .. } => {
                self.relation_annotation(tags::MANY_TO_MANY).render(alias)
            }
        }
    }

    /// Lines for the documentation block above the property.
    pub fn annotation_lines(&self, alias: &str) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.variant {
            FieldVariant::Plain => lines.push(self.serialize(alias)),
            FieldVariant::Identifier { strategy } => {
                lines.push(Annotation::marker(tags::ID).render(alias));
                lines.push(self.serialize(alias));
                if let Some(strategy) = strategy {
                    let generated = Annotation::record(
                        tags::GENERATED_VALUE,
                        &[Attribute::new("strategy", strategy.as_str())],
                        &SerializeRules::NONE,
                    );
                    lines.push(generated.render(alias));
                }
            }
            FieldVariant::ManyToOne(relation) | FieldVariant::OneToMany(relation) => {
                lines.push(self.serialize(alias));
                if let Some(join_column) = &relation.join_column {
                    lines.push(join_column.annotation().render(alias));
                }
            }
            FieldVariant::ManyToMany { join_table, .. } => {
                lines.push(self.serialize(alias));
                if let Some(join_table) = join_table {
                    lines.push(join_table.annotation(alias).render(alias));
                }
            }
        }
        lines
    }
}

// ============================================================================
// Joins
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JoinColumn {
    pub name: Option<String>,
    pub referenced_column_name: Option<String>,
    pub nullable: bool,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl JoinColumn {
    pub fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("name", self.name.clone()),
            Attribute::new("referencedColumnName", self.referenced_column_name.clone()),
            Attribute::new("nullable", self.nullable),
            Attribute::new("onDelete", self.on_delete.clone()),
            Attribute::new("onUpdate", self.on_update.clone()),
        ]
    }

    pub fn annotation(&self) -> Annotation {
        Annotation::record(tags::JOIN_COLUMN, &self.attributes(), &SerializeRules::NONE)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JoinTable {
    pub name: String,
    pub join_columns: Vec<JoinColumn>,
    pub inverse_join_columns: Vec<JoinColumn>,
}

impl JoinTable {
    pub fn attributes(&self, alias: &str) -> Vec<Attribute> {
        let nested = |columns: &[JoinColumn]| -> Value {
            Value::Array(
                columns
                    .iter()
                    .map(|column| Value::String(column.annotation().render(alias)))
                    .collect(),
            )
        };
        vec![
            Attribute::new("name", self.name.as_str()),
            Attribute::new("joinColumns", nested(self.join_columns.as_slice())),
            Attribute::new("inverseJoinColumns", nested(self.inverse_join_columns.as_slice())),
        ]
    }

    pub fn annotation(&self, alias: &str) -> Annotation {
        Annotation::record(tags::JOIN_TABLE, &self.attributes(alias), &JOIN_TABLE_RULES)
    }
}

// ============================================================================
// Indexes and callbacks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexKind {
    Index,
    UniqueConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    pub kind: IndexKind,
    pub name: Option<String>,
    pub columns: Vec<String>,
}

impl IndexDescriptor {
    pub fn annotation(&self) -> Annotation {
        let tag = match self.kind {
            IndexKind::Index => tags::INDEX,
            IndexKind::UniqueConstraint => tags::UNIQUE_CONSTRAINT,
        };
        let columns = Value::Array(
            self.columns
                .iter()
                .map(|column| Value::String(column.clone()))
                .collect(),
        );
        Annotation::record(
            tag,
            &[
                Attribute::new("name", self.name.clone()),
                Attribute::new("columns", columns),
            ],
            &INDEX_RULES,
        )
    }
}

/// A lifecycle hook: event type plus the method that handles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleCallback {
    /// As written in the mapping: `prePersist` or `pre-persist`.
    pub event: String,
    pub method: String,
}

impl LifecycleCallback {
    /// `prePersist` / `pre-persist` -> `PrePersist`.
    pub fn annotation_name(&self) -> String {
        self.event
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let mut chars = segment.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }

    pub fn annotation(&self, alias: &str) -> String {
        format!("@{alias}\\{}", self.annotation_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn title_field() -> FieldDescriptor {
        FieldDescriptor {
            column: Some("C".to_string()),
            scalar_type: Some("string".to_string()),
            nullable: Some(false),
            length: Some(255),
            precision: Some(0),
            ..FieldDescriptor::new("title", FieldVariant::Plain)
        }
    }

    #[test]
    fn plain_field_serializes_in_declaration_order() {
        let field = title_field();
        let first = field.serialize("ORM");
        assert_eq!(
            first,
            r#"@ORM\Column(column="C", type="string", nullable=false, length=255)"#
        );
        assert_eq!(first, field.serialize("ORM"));
    }

    #[test]
    fn options_render_as_literal() {
        let mut field = title_field();
        field.options.insert("default".to_string(), json!("n/a"));
        assert!(field
            .serialize("ORM")
            .ends_with(r#"length=255, options={"default":"n/a"})"#));
    }

    #[test]
    fn relation_without_join_column_has_single_line() {
        let field = FieldDescriptor::new(
            "author",
            FieldVariant::ManyToOne(Relation {
                target_entity: "App\\Entity\\Author".to_string(),
                inversed_by: Some("books".to_string()),
                ..Relation::default()
            }),
        );
        assert_eq!(
            field.annotation_lines("ORM"),
            vec![r#"@ORM\ManyToOne(targetEntity="App\Entity\Author", inversedBy="books")"#]
        );
    }

    #[test]
    fn relation_with_join_column_and_cascade() {
        let field = FieldDescriptor::new(
            "author",
            FieldVariant::ManyToOne(Relation {
                target_entity: "Author".to_string(),
                cascade: vec!["persist".to_string(), "remove".to_string()],
                fetch: Some("LAZY".to_string()),
                join_column: Some(JoinColumn {
                    name: Some("author_id".to_string()),
                    referenced_column_name: Some("id".to_string()),
                    nullable: false,
                    on_delete: Some("CASCADE".to_string()),
                    on_update: None,
                }),
                ..Relation::default()
            }),
        );
        assert_eq!(
            field.annotation_lines("ORM"),
            vec![
                r#"@ORM\ManyToOne(targetEntity="Author", cascade={"persist","remove"}, fetch="LAZY")"#
                    .to_string(),
                r#"@ORM\JoinColumn(name="author_id", referencedColumnName="id", nullable=false, onDelete="CASCADE")"#
                    .to_string(),
            ]
        );
    }

    #[test]
    fn many_to_many_renders_join_table() {
        let column = |name: &str| JoinColumn {
            name: Some(name.to_string()),
            referenced_column_name: Some("id".to_string()),
            nullable: true,
            ..JoinColumn::default()
        };
        let field = FieldDescriptor::new(
            "tags",
            FieldVariant::ManyToMany {
                relation: Relation {
                    target_entity: "Tag".to_string(),
                    ..Relation::default()
                },
                join_table: Some(JoinTable {
                    name: "book_tag".to_string(),
                    join_columns: vec![column("book_id")],
                    inverse_join_columns: vec![column("tag_id")],
                }),
            },
        );
        let lines = field.annotation_lines("ORM");
        assert_eq!(lines[0], r#"@ORM\ManyToMany(targetEntity="Tag")"#);
        assert_eq!(
            lines[1],
            r#"@ORM\JoinTable(name="book_tag", joinColumns={@ORM\JoinColumn(name="book_id", referencedColumnName="id", nullable=true)}, inverseJoinColumns={@ORM\JoinColumn(name="tag_id", referencedColumnName="id", nullable=true)})"#
        );
    }

    #[test]
    fn identifier_lines() {
        let field = FieldDescriptor {
            scalar_type: Some("integer".to_string()),
            ..FieldDescriptor::new(
                "id",
                FieldVariant::Identifier {
                    strategy: Some("AUTO".to_string()),
                },
            )
        };
        assert_eq!(
            field.annotation_lines("ORM"),
            vec![
                r"@ORM\Id".to_string(),
                r#"@ORM\Column(type="integer")"#.to_string(),
                r#"@ORM\GeneratedValue(strategy="AUTO")"#.to_string(),
            ]
        );
    }

    #[test]
    fn class_lines_include_indexes_and_callbacks_marker() {
        let entity = EntityDescriptor {
            class_name: "App\\Entity\\Book".to_string(),
            table: "book".to_string(),
            repository_class: "App\\Repository\\BookRepository".to_string(),
            has_lifecycle_callbacks: true,
            fields: Vec::new(),
            indexes: vec![IndexDescriptor {
                kind: IndexKind::Index,
                name: Some("title_idx".to_string()),
                columns: vec!["title".to_string(), "isbn".to_string()],
            }],
            unique_constraints: Vec::new(),
            callbacks: Vec::new(),
        };
        assert_eq!(
            entity.class_annotation_lines("ORM"),
            vec![
                r#"@ORM\Entity(repositoryClass="App\Repository\BookRepository")"#.to_string(),
                r#"@ORM\Table(name="book", indexes={@ORM\Index(name="title_idx", columns={"title","isbn"})})"#
                    .to_string(),
                r"@ORM\HasLifecycleCallbacks".to_string(),
            ]
        );
    }

    #[test]
    fn callback_names_are_pascal_cased() {
        let camel = LifecycleCallback {
            event: "prePersist".to_string(),
            method: "touch".to_string(),
        };
        let kebab = LifecycleCallback {
            event: "post-load".to_string(),
            method: "hydrate".to_string(),
        };
        assert_eq!(camel.annotation("ORM"), r"@ORM\PrePersist");
        assert_eq!(kebab.annotation("ORM"), r"@ORM\PostLoad");
    }
}
