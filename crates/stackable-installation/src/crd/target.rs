use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::{LocalSecretReference, raw_object_schema};

/// A Target describes an environment an installation deploys into, e.g. a
/// Kubernetes cluster.
///
/// The access configuration is either given inline or read from a secret,
/// never both.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "landscape.stackable.tech",
    version = "v1alpha1",
    kind = "Target",
    plural = "targets",
    derive = "PartialEq",
    crates(
        kube_core = "kube::core",
        k8s_openapi = "k8s_openapi",
        schemars = "schemars"
    ),
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    /// The type of the target, e.g. `kubernetes-cluster`. Target imports are
    /// matched against it.
    #[serde(default, rename = "type")]
    pub target_type: String,

    /// Inline access configuration.
    #[serde(default, rename = "config", skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "raw_object_schema")]
    pub configuration: Option<serde_json::Value>,

    /// Secret holding the access configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalSecretReference>,
}
