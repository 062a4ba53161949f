//! Message model shared by the sluice cores
//!
//! This crate defines:
//! - `Part`: opaque payload bytes plus string metadata
//! - `Batch`: an ordered collection of parts with a binary wire codec
//! - `Metadata`: the per-part key/value annotations
//!
//! Batches are the unit both the durable buffer and the mapping interpreter
//! operate on. All data is owned, so `Clone` is a deep copy.

pub mod batch;
pub mod codec;
pub mod error;
pub mod metadata;
pub mod part;

pub use batch::Batch;
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use part::Part;
