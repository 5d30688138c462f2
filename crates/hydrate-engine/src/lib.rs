//! hydrate-engine - MiniJinja templating for configuration documents
//!
//! This crate provides the template execution half of the resolution
//! pipeline:
//! - Detection of template syntax in serialized documents
//! - A per-call MiniJinja environment with the value transforms
//!   (base64enc, base64dec, indent) registered as functions and filters
//! - Phase-tagged template errors with source diagnostics

pub mod engine;
pub mod error;
pub mod transforms;

pub use engine::{has_template, Engine, EngineBuilder};
pub use error::{DecodeError, TemplateError, TemplatePhase};
