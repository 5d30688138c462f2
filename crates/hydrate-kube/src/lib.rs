//! hydrate-kube - cluster lookups and document resolution
//!
//! This crate connects the template engine to a Kubernetes cluster:
//! - **ClusterReader**: typed reads for secrets, config maps, cluster
//!   claims, and arbitrary resources, with a real `kube`-backed
//!   implementation and an in-memory mock for tests
//! - **ResourceKindCatalog**: optional discovery snapshot so generic
//!   lookups skip per-call discovery
//! - **Resolver**: the entry point that round-trips a document through
//!   the engine with the lookup functions bound to the configured reader

pub mod catalog;
pub mod error;
mod functions;
pub mod mock;
pub mod reader;
pub mod resolver;

pub use catalog::{ResourceKind, ResourceKindCatalog};
pub use error::{LookupError, ResolveError, Result};
pub use mock::{LookupCounts, MockClusterReader};
pub use reader::{ClusterReader, KubeReader};
pub use resolver::{Resolver, ResolverBuilder};

pub use hydrate_core::Document;
pub use hydrate_engine::{has_template, TemplateError, TemplatePhase};
