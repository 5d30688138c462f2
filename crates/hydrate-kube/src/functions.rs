//! Template lookup functions bound to a cluster reader
//!
//! The lookups are registered as named functions rather than one generic
//! accessor so a reviewer scanning a document sees exactly which secret,
//! config map, or claim it references.

use minijinja::{Environment, Error, ErrorKind, Value};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::catalog::parse_gvk;
use crate::error::LookupError;
use crate::reader::ClusterReader;

/// Register the cluster lookup functions on an environment.
///
/// Each closure captures the reader and the runtime used to block on the
/// underlying async reads, so the registry is rebound to the configured
/// reader on every resolution call.
pub(crate) fn register(
    env: &mut Environment<'static>,
    reader: Arc<dyn ClusterReader>,
    runtime: Arc<Runtime>,
) {
    {
        let reader = reader.clone();
        let runtime = runtime.clone();
        env.add_function(
            "fromSecret",
            move |namespace: String, name: String, key: String| -> Result<String, Error> {
                runtime
                    .block_on(reader.secret_value(&namespace, &name, &key))
                    .map_err(lookup_failed)
            },
        );
    }

    {
        let reader = reader.clone();
        let runtime = runtime.clone();
        env.add_function(
            "fromConfigMap",
            move |namespace: String, name: String, key: String| -> Result<String, Error> {
                runtime
                    .block_on(reader.config_map_value(&namespace, &name, &key))
                    .map_err(lookup_failed)
            },
        );
    }

    {
        let reader = reader.clone();
        let runtime = runtime.clone();
        env.add_function(
            "fromClusterClaim",
            move |name: String| -> Result<String, Error> {
                runtime
                    .block_on(reader.cluster_claim(&name))
                    .map_err(lookup_failed)
            },
        );
    }

    env.add_function(
        "lookup",
        move |api_version: String, kind: String, namespace: String, name: String| -> Result<Value, Error> {
            let gvk = parse_gvk(&api_version, &kind).map_err(lookup_failed)?;

            // Empty namespace selects cluster scope
            let ns = (!namespace.is_empty()).then_some(namespace.as_str());

            match runtime
                .block_on(reader.resource(&gvk, ns, &name))
                .map_err(lookup_failed)?
            {
                Some(resource) => Ok(Value::from_serialize(&resource)),
                // Absence is not an error here: templates probe for
                // optional resources and branch on the empty result
                None => Ok(Value::from_serialize(serde_json::Map::new())),
            }
        },
    );
}

/// Surface a lookup failure through template execution, keeping the typed
/// error as the cause
fn lookup_failed(err: LookupError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}
