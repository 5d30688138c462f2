//! hydrate-core - document model for cluster-backed template resolution
//!
//! This crate provides the structured [`Document`] type the resolution
//! pipeline operates on, together with its canonical YAML codec and the
//! core error taxonomy.

pub mod document;
pub mod error;

pub use document::Document;
pub use error::{CoreError, Result};
