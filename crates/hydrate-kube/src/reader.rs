//! Typed cluster reads backing the template lookup functions

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, DynamicObject};
use kube::core::GroupVersionKind;
use kube::discovery::{ApiResource, Discovery, Scope};
use kube::Client;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::ResourceKindCatalog;
use crate::error::LookupError;

/// Group/version/kind of the cluster-identity claim resource
const CLUSTER_CLAIM_GROUP: &str = "cluster.open-cluster-management.io";
const CLUSTER_CLAIM_VERSION: &str = "v1alpha1";
const CLUSTER_CLAIM_KIND: &str = "ClusterClaim";
const CLUSTER_CLAIM_PLURAL: &str = "clusterclaims";

/// Typed reads against a cluster.
///
/// This is the seam between the template functions and the cluster API:
/// the resolver only ever talks to this trait, so tests swap in
/// [`crate::MockClusterReader`] instead of a live client.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// Read a named key from a secret's data, decoded to plain text
    async fn secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, LookupError>;

    /// Read a named key from a config map's data
    async fn config_map_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, LookupError>;

    /// Read the value of a named cluster-identity claim
    async fn cluster_claim(&self, name: &str) -> Result<String, LookupError>;

    /// Fetch an arbitrary resource by coordinates.
    ///
    /// `Ok(None)` means the resource does not exist — callers decide
    /// whether absence is an error.
    async fn resource(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<JsonValue>, LookupError>;
}

/// Cluster reader backed by a real Kubernetes client
pub struct KubeReader {
    client: Client,
    catalog: Option<Arc<ResourceKindCatalog>>,
}

impl KubeReader {
    /// Create a reader over an existing client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            catalog: None,
        }
    }

    /// Create a reader with a pre-fetched resource-kind catalog.
    ///
    /// With a catalog configured, generic lookups resolve kinds from the
    /// snapshot and never fall back to discovery; without one, every
    /// lookup runs its own discovery pass.
    pub fn with_catalog(client: Client, catalog: Arc<ResourceKindCatalog>) -> Self {
        Self {
            client,
            catalog: Some(catalog),
        }
    }

    /// Resolve a GVK to its REST resource and scope
    async fn api_resource_for(
        &self,
        gvk: &GroupVersionKind,
    ) -> Result<(ApiResource, bool), LookupError> {
        if let Some(catalog) = &self.catalog {
            return match catalog.find(gvk) {
                Some(kind) => Ok((kind.api_resource(), kind.namespaced)),
                None => Err(LookupError::UnknownKind {
                    group: gvk.group.clone(),
                    version: gvk.version.clone(),
                    kind: gvk.kind.clone(),
                }),
            };
        }

        debug!(
            group = %gvk.group,
            version = %gvk.version,
            kind = %gvk.kind,
            "no resource-kind catalog configured, running discovery"
        );
        let discovery = Discovery::new(self.client.clone()).run().await?;
        match discovery.resolve_gvk(gvk) {
            Some((ar, caps)) => Ok((ar, caps.scope == Scope::Namespaced)),
            None => Err(LookupError::UnknownKind {
                group: gvk.group.clone(),
                version: gvk.version.clone(),
                kind: gvk.kind.clone(),
            }),
        }
    }
}

#[async_trait]
impl ClusterReader for KubeReader {
    async fn secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, LookupError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get_opt(name)
            .await?
            .ok_or_else(|| LookupError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let data = secret.data.unwrap_or_default();
        let value = data.get(key).ok_or_else(|| LookupError::KeyNotFound {
            kind: "secret",
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })?;

        String::from_utf8(value.0.clone()).map_err(|_| LookupError::InvalidUtf8 {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })
    }

    async fn config_map_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, LookupError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = api
            .get_opt(name)
            .await?
            .ok_or_else(|| LookupError::ConfigMapNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        config_map
            .data
            .unwrap_or_default()
            .get(key)
            .cloned()
            .ok_or_else(|| LookupError::KeyNotFound {
                kind: "config map",
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.to_string(),
            })
    }

    async fn cluster_claim(&self, name: &str) -> Result<String, LookupError> {
        let gvk = GroupVersionKind {
            group: CLUSTER_CLAIM_GROUP.to_string(),
            version: CLUSTER_CLAIM_VERSION.to_string(),
            kind: CLUSTER_CLAIM_KIND.to_string(),
        };
        let ar = ApiResource::from_gvk_with_plural(&gvk, CLUSTER_CLAIM_PLURAL);

        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &ar);
        let claim = api
            .get_opt(name)
            .await?
            .ok_or_else(|| LookupError::ClaimNotFound {
                name: name.to_string(),
            })?;

        claim
            .data
            .pointer("/spec/value")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| LookupError::ClaimValueMissing {
                name: name.to_string(),
            })
    }

    async fn resource(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<JsonValue>, LookupError> {
        let (api_resource, namespaced) = self.api_resource_for(gvk).await?;

        let api: Api<DynamicObject> = match namespace {
            Some(ns) if namespaced => Api::namespaced_with(self.client.clone(), ns, &api_resource),
            _ => Api::all_with(self.client.clone(), &api_resource),
        };

        match api.get_opt(name).await? {
            Some(obj) => {
                let value = serde_json::to_value(&obj).map_err(|e| LookupError::Encode {
                    name: name.to_string(),
                    source: e,
                })?;
                Ok(Some(value))
            }
            None => {
                debug!(kind = %gvk.kind, name, "resource not found, yielding empty value");
                Ok(None)
            }
        }
    }
}
