//! Mock cluster reader for testing
//!
//! Stores fixtures in memory so templates can be resolved in unit tests
//! without a cluster. Exported publicly: downstream callers test their
//! own documents against it too.

use async_trait::async_trait;
use kube::core::GroupVersionKind;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::LookupError;
use crate::reader::ClusterReader;

/// In-memory cluster reader for testing
#[derive(Clone, Default)]
pub struct MockClusterReader {
    /// (namespace, name, key) -> value
    secrets: HashMap<(String, String, String), String>,
    config_maps: HashMap<(String, String, String), String>,
    /// claim name -> value
    claims: HashMap<String, String>,
    /// (gvk key, namespace, name) -> resource
    resources: HashMap<(String, String, String), JsonValue>,
    /// Track lookup counts for assertions
    operations: Arc<RwLock<LookupCounts>>,
}

/// Counts of lookups performed, for testing assertions
#[derive(Debug, Default, Clone)]
pub struct LookupCounts {
    pub secrets: usize,
    pub config_maps: usize,
    pub claims: usize,
    pub resources: usize,
}

impl MockClusterReader {
    /// Create a new empty mock reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret data key
    pub fn with_secret(mut self, namespace: &str, name: &str, key: &str, value: &str) -> Self {
        self.secrets.insert(
            (namespace.to_string(), name.to_string(), key.to_string()),
            value.to_string(),
        );
        self
    }

    /// Add a config map data key
    pub fn with_config_map(mut self, namespace: &str, name: &str, key: &str, value: &str) -> Self {
        self.config_maps.insert(
            (namespace.to_string(), name.to_string(), key.to_string()),
            value.to_string(),
        );
        self
    }

    /// Add a cluster claim value
    pub fn with_claim(mut self, name: &str, value: &str) -> Self {
        self.claims.insert(name.to_string(), value.to_string());
        self
    }

    /// Add an arbitrary resource. Pass an empty namespace for
    /// cluster-scoped resources.
    pub fn with_resource(
        mut self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        resource: JsonValue,
    ) -> Self {
        let gvk_key = format!("{}/{}", api_version, kind);
        self.resources.insert(
            (gvk_key, namespace.to_string(), name.to_string()),
            resource,
        );
        self
    }

    /// Get lookup counts for assertions
    pub fn lookup_counts(&self) -> LookupCounts {
        self.operations.read().unwrap().clone()
    }
}

fn gvk_key(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        format!("{}/{}", gvk.version, gvk.kind)
    } else {
        format!("{}/{}/{}", gvk.group, gvk.version, gvk.kind)
    }
}

#[async_trait]
impl ClusterReader for MockClusterReader {
    async fn secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, LookupError> {
        self.operations.write().unwrap().secrets += 1;

        self.secrets
            .get(&(namespace.to_string(), name.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn config_map_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, LookupError> {
        self.operations.write().unwrap().config_maps += 1;

        self.config_maps
            .get(&(namespace.to_string(), name.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::ConfigMapNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn cluster_claim(&self, name: &str) -> Result<String, LookupError> {
        self.operations.write().unwrap().claims += 1;

        self.claims
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::ClaimNotFound {
                name: name.to_string(),
            })
    }

    async fn resource(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<JsonValue>, LookupError> {
        self.operations.write().unwrap().resources += 1;

        let ns = namespace.unwrap_or_default().to_string();
        Ok(self
            .resources
            .get(&(gvk_key(gvk), ns, name.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_gvk;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_secret_fixture() {
        let reader = MockClusterReader::new().with_secret("app", "db-secret", "password", "hunter2");

        let value = block_on(reader.secret_value("app", "db-secret", "password")).unwrap();
        assert_eq!(value, "hunter2");

        let err = block_on(reader.secret_value("app", "db-secret", "username")).unwrap_err();
        assert!(matches!(err, LookupError::SecretNotFound { .. }));

        assert_eq!(reader.lookup_counts().secrets, 2);
    }

    #[test]
    fn test_claim_fixture() {
        let reader = MockClusterReader::new().with_claim("id.k8s.io", "cluster-east");

        assert_eq!(block_on(reader.cluster_claim("id.k8s.io")).unwrap(), "cluster-east");
        assert!(matches!(
            block_on(reader.cluster_claim("region")).unwrap_err(),
            LookupError::ClaimNotFound { .. }
        ));
    }

    #[test]
    fn test_resource_fixture_and_absence() {
        let deployment = serde_json::json!({
            "metadata": { "name": "web", "namespace": "app" },
            "spec": { "replicas": 2 }
        });
        let reader =
            MockClusterReader::new().with_resource("apps/v1", "Deployment", "app", "web", deployment);

        let gvk = parse_gvk("apps/v1", "Deployment").unwrap();
        let found = block_on(reader.resource(&gvk, Some("app"), "web")).unwrap();
        assert_eq!(found.unwrap().pointer("/spec/replicas").unwrap(), 2);

        let missing = block_on(reader.resource(&gvk, Some("app"), "gone")).unwrap();
        assert!(missing.is_none());
    }
}
