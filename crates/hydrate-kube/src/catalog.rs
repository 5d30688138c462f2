//! Snapshot of discoverable API resource kinds
//!
//! The catalog lets the resolver map group/version/kind coordinates to
//! REST resources without a discovery round trip per lookup. It is built
//! once (by the caller or via [`ResourceKindCatalog::discover`]) and read
//! only afterwards.

use kube::core::GroupVersionKind;
use kube::discovery::{ApiResource, Discovery, Scope};
use serde::{Deserialize, Serialize};

/// A single discoverable resource kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
}

impl ResourceKind {
    /// Key in `group/version/kind` form (`version/kind` for the core group)
    pub fn gvk_key(&self) -> String {
        if self.group.is_empty() {
            format!("{}/{}", self.version, self.kind)
        } else {
            format!("{}/{}/{}", self.group, self.version, self.kind)
        }
    }

    /// Build the dynamic API resource for this kind
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
        };
        ApiResource::from_gvk_with_plural(&gvk, &self.plural)
    }

    fn matches(&self, gvk: &GroupVersionKind) -> bool {
        self.group == gvk.group && self.version == gvk.version && self.kind == gvk.kind
    }
}

/// An immutable snapshot of served resource kinds
#[derive(Debug, Clone, Default)]
pub struct ResourceKindCatalog {
    kinds: Vec<ResourceKind>,
}

impl ResourceKindCatalog {
    /// Build a catalog from an externally assembled kind list
    pub fn new(kinds: Vec<ResourceKind>) -> Self {
        Self { kinds }
    }

    /// Take a fresh snapshot of everything the cluster serves (incl. CRDs)
    pub async fn discover(client: &kube::Client) -> Result<Self, kube::Error> {
        let discovery = Discovery::new(client.clone()).run().await?;

        let mut kinds = Vec::new();
        for group in discovery.groups() {
            for (ar, caps) in group.recommended_resources() {
                kinds.push(ResourceKind {
                    group: ar.group.clone(),
                    version: ar.version.clone(),
                    kind: ar.kind.clone(),
                    plural: ar.plural.clone(),
                    namespaced: matches!(caps.scope, Scope::Namespaced),
                });
            }
        }
        kinds.sort_by(|a, b| a.gvk_key().cmp(&b.gvk_key()));

        Ok(Self { kinds })
    }

    /// Look up a kind by its group/version/kind coordinates
    pub fn find(&self, gvk: &GroupVersionKind) -> Option<&ResourceKind> {
        self.kinds.iter().find(|k| k.matches(gvk))
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }
}

/// Parse `api_version` + `kind` coordinates into a GroupVersionKind.
///
/// `"apps/v1"` splits into group `apps`, version `v1`; a bare `"v1"` is
/// the core group. Empty segments are malformed rather than silently
/// treated as core.
pub(crate) fn parse_gvk(
    api_version: &str,
    kind: &str,
) -> Result<GroupVersionKind, crate::error::LookupError> {
    let malformed = || crate::error::LookupError::MalformedKind {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
    };

    if api_version.is_empty() || kind.is_empty() {
        return Err(malformed());
    }

    let (group, version) = match api_version.rsplit_once('/') {
        Some((g, v)) if !g.is_empty() && !v.is_empty() => (g.to_string(), v.to_string()),
        Some(_) => return Err(malformed()),
        None => (String::new(), api_version.to_string()),
    };

    Ok(GroupVersionKind {
        group,
        version,
        kind: kind.to_string(),
    })
}
