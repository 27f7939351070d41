//! Entity metadata: entity identity, table aliases and the alias registry.

pub mod alias;
pub mod entity;
pub mod provider;

pub use alias::Alias;
pub use entity::{Column, Entity, EntityMeta};
pub use provider::{MetadataProvider, DEFAULT_PARAMETER_PREFIX};
