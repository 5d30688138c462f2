//! Error types for hydrate-kube

use miette::Diagnostic;
use thiserror::Error;

use hydrate_core::CoreError;
use hydrate_engine::TemplateError;

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors from a cluster lookup performed by a template function.
///
/// Every variant carries the coordinates of the read that failed so the
/// message pinpoints the referenced object, not just the failure class.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LookupError {
    /// Kubernetes API error (transport, auth, server-side failure)
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Secret does not exist
    #[error("secret '{namespace}/{name}' not found")]
    SecretNotFound { namespace: String, name: String },

    /// Config map does not exist
    #[error("config map '{namespace}/{name}' not found")]
    ConfigMapNotFound { namespace: String, name: String },

    /// Object exists but the requested data key does not
    #[error("key '{key}' not found in {kind} '{namespace}/{name}'")]
    KeyNotFound {
        kind: &'static str,
        namespace: String,
        name: String,
        key: String,
    },

    /// Cluster claim does not exist
    #[error("cluster claim '{name}' not found")]
    ClaimNotFound { name: String },

    /// Cluster claim exists but carries no value
    #[error("cluster claim '{name}' has no value")]
    ClaimValueMissing { name: String },

    /// Secret value is not text
    #[error("key '{key}' in secret '{namespace}/{name}' is not valid UTF-8")]
    InvalidUtf8 {
        namespace: String,
        name: String,
        key: String,
    },

    /// Group/version/kind could not be parsed
    #[error("malformed resource kind '{api_version}/{kind}'")]
    MalformedKind { api_version: String, kind: String },

    /// Group/version/kind is not served by the cluster (or absent from the
    /// configured catalog)
    #[error("unknown resource kind '{group}/{version}/{kind}'")]
    UnknownKind {
        group: String,
        version: String,
        kind: String,
    },

    /// Fetched resource could not be re-encoded as a template value
    #[error("failed to encode resource '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from a single resolution call.
///
/// All-or-nothing: whichever stage fails, no document is returned and
/// nothing is retried here.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ResolveError {
    /// Document could not be serialized or the resolved text parsed back
    #[error(transparent)]
    Codec(#[from] CoreError),

    /// Template parsing or execution failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    /// Cluster client could not be constructed
    #[error("failed to initialize cluster client: {0}")]
    Client(#[source] kube::Error),

    /// Lookup runtime could not be started
    #[error("failed to start lookup runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
