//! Document resolution against live cluster state

use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::debug;

use hydrate_core::Document;
use hydrate_engine::Engine;

use crate::catalog::ResourceKindCatalog;
use crate::error::{ResolveError, Result};
use crate::functions;
use crate::reader::{ClusterReader, KubeReader};

/// Resolver builder
pub struct ResolverBuilder {
    reader: Option<Arc<dyn ClusterReader>>,
    catalog: Option<Arc<ResourceKindCatalog>>,
    strict: bool,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            reader: None,
            catalog: None,
            strict: true,
        }
    }

    /// Use an explicit cluster reader (a mock in tests, or a pre-built
    /// [`KubeReader`])
    pub fn reader(mut self, reader: Arc<dyn ClusterReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Supply a resource-kind catalog snapshot for generic lookups.
    ///
    /// Only applies when the builder constructs its own [`KubeReader`];
    /// an explicit reader brings its own kind-mapping strategy.
    pub fn catalog(mut self, catalog: ResourceKindCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Set strict mode (fail on undefined template variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build the resolver.
    ///
    /// Without an explicit reader this connects a Kubernetes client from
    /// the ambient environment (kubeconfig or in-cluster service account).
    pub fn build(self) -> Result<Resolver> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let runtime = Arc::new(runtime);

        let reader: Arc<dyn ClusterReader> = match self.reader {
            Some(reader) => reader,
            None => {
                let client = runtime
                    .block_on(kube::Client::try_default())
                    .map_err(ResolveError::Client)?;
                let reader = match self.catalog {
                    Some(catalog) => KubeReader::with_catalog(client, catalog),
                    None => KubeReader::new(client),
                };
                Arc::new(reader)
            }
        };

        Ok(Resolver {
            reader,
            runtime,
            engine: Engine::new(self.strict),
        })
    }
}

/// Entry point for resolving template directives inside a document.
///
/// A resolution call serializes the document to its canonical YAML form,
/// parses and executes that text as a template whose functions read from
/// the configured cluster, and parses the resolved text back into a
/// document. Each call is self-contained: the function registry is
/// rebound and the template state rebuilt every time, and no lookup
/// result is cached.
pub struct Resolver {
    reader: Arc<dyn ClusterReader>,
    runtime: Arc<Runtime>,
    engine: Engine,
}

impl Resolver {
    /// Create a builder
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Create a resolver connected to the ambient cluster environment
    pub fn try_default() -> Result<Self> {
        Self::builder().build()
    }

    /// Resolve every template directive in the document.
    ///
    /// Returns a new document; the input is never mutated, and on any
    /// failure no document is returned at all. This call blocks on
    /// cluster reads and must not be invoked from inside an async
    /// runtime.
    pub fn resolve(&self, document: &Document) -> Result<Document> {
        let source = document.to_yaml()?;
        debug!(bytes = source.len(), "serialized document for resolution");

        let reader = self.reader.clone();
        let runtime = self.runtime.clone();
        let resolved = self.engine.render(&source, move |env| {
            functions::register(env, reader, runtime);
        })?;

        let document = Document::from_yaml(&resolved)?;
        debug!("document resolved");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::mock::MockClusterReader;
    use hydrate_engine::{has_template, DecodeError, TemplatePhase};

    fn resolver_with(reader: MockClusterReader) -> Resolver {
        Resolver::builder()
            .reader(Arc::new(reader))
            .build()
            .unwrap()
    }

    fn resolve_yaml(resolver: &Resolver, yaml: &str) -> Result<Document> {
        resolver.resolve(&Document::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_document_without_templates_is_unchanged() {
        let resolver = resolver_with(MockClusterReader::new());
        let doc = Document::from_yaml(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: app-config
data:
  log-level: debug
  replicas: "3"
"#,
        )
        .unwrap();

        let resolved = resolver.resolve(&doc).unwrap();
        assert_eq!(resolved, doc);
    }

    #[test]
    fn test_base64enc_leaf_substitution() {
        let resolver = resolver_with(MockClusterReader::new());
        let resolved = resolve_yaml(&resolver, r#"value: '{{ base64enc("x") }}'"#).unwrap();

        assert_eq!(resolved.get("value").unwrap(), "eA==");
    }

    #[test]
    fn test_base64_round_trip_is_identity() {
        let resolver = resolver_with(MockClusterReader::new());
        let resolved =
            resolve_yaml(&resolver, r#"value: '{{ base64dec(base64enc("hello")) }}'"#).unwrap();

        assert_eq!(resolved.get("value").unwrap(), "hello");
    }

    #[test]
    fn test_from_secret() {
        let reader =
            MockClusterReader::new().with_secret("app", "db-secret", "password", "db-password");
        let resolver = resolver_with(reader);

        let resolved = resolve_yaml(
            &resolver,
            r#"password: '{{ fromSecret("app", "db-secret", "password") }}'"#,
        )
        .unwrap();

        assert_eq!(resolved.get("password").unwrap(), "db-password");
    }

    #[test]
    fn test_from_config_map_and_claim() {
        let reader = MockClusterReader::new()
            .with_config_map("app", "settings", "region", "eu-west-1")
            .with_claim("id.k8s.io", "cluster-east");
        let resolver = resolver_with(reader);

        let resolved = resolve_yaml(
            &resolver,
            r#"
region: '{{ fromConfigMap("app", "settings", "region") }}'
cluster: '{{ fromClusterClaim("id.k8s.io") }}'
"#,
        )
        .unwrap();

        assert_eq!(resolved.get("region").unwrap(), "eu-west-1");
        assert_eq!(resolved.get("cluster").unwrap(), "cluster-east");
    }

    #[test]
    fn test_lookup_found_resource_is_navigable() {
        let reader = MockClusterReader::new().with_resource(
            "apps/v1",
            "Deployment",
            "app",
            "web",
            serde_json::json!({
                "metadata": { "name": "web" },
                "spec": { "replicas": 2 }
            }),
        );
        let resolver = resolver_with(reader);

        let resolved = resolve_yaml(
            &resolver,
            r#"replicas: '{{ lookup("apps/v1", "Deployment", "app", "web").spec.replicas }}'"#,
        )
        .unwrap();

        assert_eq!(resolved.get("replicas").unwrap(), "2");
    }

    #[test]
    fn test_lookup_not_found_yields_empty_value() {
        let resolver = resolver_with(MockClusterReader::new());

        let resolved = resolve_yaml(
            &resolver,
            r#"resource: '{{ lookup("v1", "ConfigMap", "app", "missing") }}'"#,
        )
        .unwrap();

        // Not found is not an error; the position holds the empty value
        assert_eq!(resolved.get("resource").unwrap(), "{}");
    }

    #[test]
    fn test_lookup_malformed_kind_fails() {
        let resolver = resolver_with(MockClusterReader::new());

        let err = resolve_yaml(
            &resolver,
            r#"resource: '{{ lookup("apps/", "Deployment", "app", "web") }}'"#,
        )
        .unwrap_err();

        let ResolveError::Template(template_err) = err else {
            panic!("expected template error");
        };
        assert_eq!(template_err.phase(), TemplatePhase::Execute);
        assert!(error_chain_contains::<LookupError>(&template_err));
    }

    #[test]
    fn test_missing_secret_surfaces_lookup_error() {
        let resolver = resolver_with(MockClusterReader::new());

        let err = resolve_yaml(
            &resolver,
            r#"password: '{{ fromSecret("app", "gone", "password") }}'"#,
        )
        .unwrap_err();

        let ResolveError::Template(template_err) = err else {
            panic!("expected template error");
        };
        assert_eq!(template_err.phase(), TemplatePhase::Execute);
        assert!(error_chain_contains::<LookupError>(&template_err));
    }

    #[test]
    fn test_malformed_base64_fails_with_decode_cause() {
        let resolver = resolver_with(MockClusterReader::new());

        let err = resolve_yaml(&resolver, r#"value: '{{ base64dec("%%%") }}'"#).unwrap_err();

        let ResolveError::Template(template_err) = err else {
            panic!("expected template error");
        };
        assert_eq!(template_err.phase(), TemplatePhase::Execute);
        assert!(error_chain_contains::<DecodeError>(&template_err));
    }

    #[test]
    fn test_invalid_syntax_fails_in_parse_phase_without_mutation() {
        let resolver = resolver_with(MockClusterReader::new());
        let doc = Document::from_yaml("value: '{{ fromSecret('").unwrap();
        let before = doc.clone();

        let err = resolver.resolve(&doc).unwrap_err();

        let ResolveError::Template(template_err) = err else {
            panic!("expected template error");
        };
        assert_eq!(template_err.phase(), TemplatePhase::Parse);
        assert!(template_err.template_source().contains("fromSecret"));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_pipelines_and_conditionals() {
        let reader = MockClusterReader::new().with_secret("app", "tls", "cert", "CERT\nDATA");
        let resolver = resolver_with(reader);

        let resolved = resolve_yaml(
            &resolver,
            r#"
cert: '{{ fromSecret("app", "tls", "cert") | base64enc }}'
mode: "{% if true %}enabled{% else %}disabled{% endif %}"
"#,
        )
        .unwrap();

        assert_eq!(resolved.get("cert").unwrap(), "Q0VSVApEQVRB");
        assert_eq!(resolved.get("mode").unwrap(), "enabled");
    }

    #[test]
    fn test_nested_structure_preserved_around_substitution() {
        let reader = MockClusterReader::new().with_secret("app", "db-secret", "password", "s3cr3t");
        let resolver = resolver_with(reader);

        let resolved = resolve_yaml(
            &resolver,
            r#"
spec:
  database:
    host: postgres.svc
    port: 5432
    password: '{{ fromSecret("app", "db-secret", "password") }}'
  features:
    - metrics
    - tracing
"#,
        )
        .unwrap();

        assert_eq!(resolved.get("spec.database.host").unwrap(), "postgres.svc");
        assert_eq!(resolved.get("spec.database.port").unwrap(), 5432);
        assert_eq!(resolved.get("spec.database.password").unwrap(), "s3cr3t");
        assert_eq!(
            resolved.get("spec.features").unwrap(),
            &serde_json::json!(["metrics", "tracing"])
        );
    }

    #[test]
    fn test_detection_matches_resolution_need() {
        assert!(has_template("password: {{ fromSecret(\"a\", \"b\", \"c\") }}"));
        assert!(!has_template("password: literal"));
        assert!(!has_template(""));
    }

    /// Walk an error's source chain looking for a cause of type `T`
    fn error_chain_contains<T: std::error::Error + 'static>(
        err: &(dyn std::error::Error + 'static),
    ) -> bool {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = current {
            if e.downcast_ref::<T>().is_some() {
                return true;
            }
            current = e.source();
        }
        false
    }
}
