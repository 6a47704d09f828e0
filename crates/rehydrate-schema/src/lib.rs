//! Schema model for denormalization: entity definitions, the node shapes that describe how
//! values reference them, and the registry entity references are resolved through.

mod entity;
mod error;
mod index;
mod model;

pub use entity::{EntitySchema, IdAccessor, IdAttribute};
pub use error::SchemaError;
pub use index::{DefEntity, SchemaDoc, SchemaIndex};
pub use model::*;
