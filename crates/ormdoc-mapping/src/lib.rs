//! Mapping metadata for ormdoc
//!
//! Turns one persistence mapping document (Doctrine-style `.orm.xml`) into an
//! [`EntityDescriptor`] and renders the descriptor's pieces as annotation
//! lines:
//! - fields / identifiers -> `@ORM\Column`, `@ORM\Id`, `@ORM\GeneratedValue`
//! - relations -> `@ORM\ManyToOne`, `@ORM\OneToMany`, `@ORM\ManyToMany`
//!   plus their `JoinColumn` / `JoinTable`
//! - the entity itself -> `@ORM\Entity`, `@ORM\Table`, `@ORM\HasLifecycleCallbacks`
//! - lifecycle callbacks -> `@ORM\PrePersist` and friends
//!
//! This crate knows nothing about source files. Placing the rendered lines
//! into a class is the job of `ormdoc-source`.

pub mod annotation;
pub mod builder;
pub mod descriptor;
pub mod xml;

pub use annotation::{
    serialize_attributes, short_type_name, Annotation, Attribute, Formatter, SerializeRules,
    DEFAULT_ALIAS,
};
pub use builder::parse_mapping_xml;
pub use descriptor::*;

use thiserror::Error;

/// A mapping document that cannot be turned into an entity descriptor.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping is not well-formed XML: {0}")]
    Xml(String),

    #[error("mapping has no <entity> element")]
    MissingEntity,

    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("<{element}> attribute `{attribute}` has invalid value `{value}`")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },

    #[error("entity {entity} declares field `{field}` more than once")]
    DuplicateField { entity: String, field: String },
}
