//! Mapping document -> [`EntityDescriptor`].

use crate::descriptor::{
    EntityDescriptor, FieldDescriptor, FieldVariant, IndexDescriptor, IndexKind, JoinColumn,
    JoinTable, LifecycleCallback, Relation,
};
use crate::xml::{parse_document, parse_options, Element};
use crate::MappingError;
use std::collections::HashSet;

/// Parse one XML mapping document into an entity descriptor.
///
/// Fields are appended in a fixed order: plain fields, many-to-one,
/// one-to-many, many-to-many, then identifiers.
pub fn parse_mapping_xml(text: &str) -> Result<EntityDescriptor, MappingError> {
    let root = parse_document(text)?;
    let entity = if root.name == "entity" {
        &root
    } else {
        root.child("entity").ok_or(MappingError::MissingEntity)?
    };

    let class_name = required(entity, "name")?.to_string();
    let table = required(entity, "table")?.to_string();
    let repository_class = required(entity, "repository-class")?.to_string();

    let mut fields = Vec::new();
    for element in entity.children_named("field") {
        fields.push(plain_field(element)?);
    }
    for element in entity.children_named("many-to-one") {
        fields.push(relation_field(element, RelationKind::ManyToOne)?);
    }
    for element in entity.children_named("one-to-many") {
        fields.push(relation_field(element, RelationKind::OneToMany)?);
    }
    for element in entity.children_named("many-to-many") {
        fields.push(relation_field(element, RelationKind::ManyToMany)?);
    }
    for element in entity.children_named("id") {
        fields.push(identifier_field(element)?);
    }

    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.name.as_str()) {
            return Err(MappingError::DuplicateField {
                entity: class_name,
                field: field.name.clone(),
            });
        }
    }

    let indexes = entity
        .nested("indexes", "index")
        .map(|element| index(element, IndexKind::Index))
        .collect::<Result<Vec<_>, _>>()?;
    let unique_constraints = entity
        .nested("unique-constraints", "unique-constraint")
        .map(|element| index(element, IndexKind::UniqueConstraint))
        .collect::<Result<Vec<_>, _>>()?;

    let has_lifecycle_callbacks = entity.child("lifecycle-callbacks").is_some();
    let callbacks = entity
        .nested("lifecycle-callbacks", "lifecycle-callback")
        .map(callback)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EntityDescriptor {
        class_name,
        table,
        repository_class,
        has_lifecycle_callbacks,
        fields,
        indexes,
        unique_constraints,
        callbacks,
    })
}

#[derive(Debug, Clone, Copy)]
enum RelationKind {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

fn required<'a>(element: &'a Element, attribute: &'static str) -> Result<&'a str, MappingError> {
    element
        .attr(attribute)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| MappingError::MissingAttribute {
            element: element.name.clone(),
            attribute,
        })
}

fn optional(element: &Element, attribute: &str) -> Option<String> {
    element.attr(attribute).map(str::to_string)
}

fn number(element: &Element, attribute: &'static str) -> Result<Option<u32>, MappingError> {
    match element.attr(attribute) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| invalid(element, attribute, raw)),
    }
}

fn flag(element: &Element, attribute: &'static str) -> Result<Option<bool>, MappingError> {
    match element.attr(attribute) {
        None => Ok(None),
        Some(raw) => parse_bool(raw)
            .map(Some)
            .ok_or_else(|| invalid(element, attribute, raw)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(element: &Element, attribute: &'static str, value: &str) -> MappingError {
    MappingError::InvalidAttribute {
        element: element.name.clone(),
        attribute,
        value: value.to_string(),
    }
}

/// Column attributes shared by `<field>` and `<id>`.
fn column_attributes(
    element: &Element,
    mut field: FieldDescriptor,
) -> Result<FieldDescriptor, MappingError> {
    field.column = optional(element, "column");
    field.scalar_type = optional(element, "type");
    field.length = number(element, "length")?;
    field.nullable = flag(element, "nullable")?;
    field.unique = flag(element, "unique")?;
    field.precision = number(element, "precision")?;
    field.scale = number(element, "scale")?;
    if let Some(options) = element.child("options") {
        field.options = parse_options(options);
    }
    Ok(field)
}

fn plain_field(element: &Element) -> Result<FieldDescriptor, MappingError> {
    let name = required(element, "name")?;
    column_attributes(element, FieldDescriptor::new(name, FieldVariant::Plain))
}

fn identifier_field(element: &Element) -> Result<FieldDescriptor, MappingError> {
    let name = required(element, "name")?;
    let strategy = element
        .child("generator")
        .and_then(|generator| optional(generator, "strategy"));
    column_attributes(
        element,
        FieldDescriptor::new(name, FieldVariant::Identifier { strategy }),
    )
}

fn relation_field(element: &Element, kind: RelationKind) -> Result<FieldDescriptor, MappingError> {
    let name = required(element, "field")?;
    let relation = Relation {
        target_entity: required(element, "target-entity")?.to_string(),
        mapped_by: optional(element, "mapped-by"),
        inversed_by: optional(element, "inversed-by"),
        fetch: optional(element, "fetch"),
        join_column: element
            .child("join-column")
            .or_else(|| element.nested("join-columns", "join-column").next())
            .map(join_column)
            .transpose()?,
        cascade: cascade(element),
    };

    let variant = match kind {
        RelationKind::ManyToOne => FieldVariant::ManyToOne(relation),
        RelationKind::OneToMany => FieldVariant::OneToMany(relation),
        RelationKind::ManyToMany => FieldVariant::ManyToMany {
            relation,
            join_table: element.child("join-table").map(join_table).transpose()?,
        },
    };

    Ok(FieldDescriptor::new(name, variant))
}

fn cascade(element: &Element) -> Vec<String> {
    element
        .children_named("cascade")
        .flat_map(|group| group.children.iter())
        .map(|operation| {
            operation
                .name
                .strip_prefix("cascade-")
                .unwrap_or(&operation.name)
                .to_string()
        })
        .collect()
}

fn join_column(element: &Element) -> Result<JoinColumn, MappingError> {
    Ok(JoinColumn {
        name: optional(element, "name"),
        referenced_column_name: optional(element, "referenced-column-name"),
        nullable: flag(element, "nullable")?.unwrap_or(true),
        on_delete: optional(element, "on-delete"),
        on_update: optional(element, "on-update"),
    })
}

fn join_table(element: &Element) -> Result<JoinTable, MappingError> {
    Ok(JoinTable {
        name: required(element, "name")?.to_string(),
        join_columns: element
            .nested("join-columns", "join-column")
            .map(join_column)
            .collect::<Result<_, _>>()?,
        inverse_join_columns: element
            .nested("inverse-join-columns", "join-column")
            .map(join_column)
            .collect::<Result<_, _>>()?,
    })
}

fn index(element: &Element, kind: IndexKind) -> Result<IndexDescriptor, MappingError> {
    let columns = required(element, "columns")?
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect();
    Ok(IndexDescriptor {
        kind,
        name: optional(element, "name"),
        columns,
    })
}

fn callback(element: &Element) -> Result<LifecycleCallback, MappingError> {
    Ok(LifecycleCallback {
        event: required(element, "type")?.to_string(),
        method: required(element, "method")?.to_string(),
    })
}
