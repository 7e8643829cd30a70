//! ormeta protocol types.
//!
//! This crate defines the runtime value model used to represent entity
//! instances, id maps and value maps exchanged between the metadata engine and
//! the layers that consume it (repositories, query builders, hydrators).

pub mod error;
pub mod value;

pub use error::Error;
pub use value::{Value, ValueMap};
