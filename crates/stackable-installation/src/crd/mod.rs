//! Resource types consumed by the validators.
//!
//! [`Installation`] and [`Target`] are Kubernetes custom resources. A
//! [`Blueprint`] is not stored in the cluster, it is read from a blueprint
//! file system and describes the typed imports and exports of a reusable
//! component together with its nested subinstallations.

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};

pub mod blueprint;
pub mod installation;
pub mod target;

pub use blueprint::*;
pub use installation::*;
pub use target::*;

/// The API group of all custom resources in this crate.
pub const GROUP: &str = "landscape.stackable.tech";

/// A reference to a secret in the namespace of the referencing object.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSecretReference {
    /// Name of the secret.
    pub name: String,

    /// Key of the secret, the whole secret data is used if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A reference to a config map in the namespace of the referencing object.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfigMapReference {
    /// Name of the config map.
    pub name: String,

    /// Key of the config map, the whole config map data is used if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A reference to a namespaced object.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub name: String,
    pub namespace: String,
}

/// A JSON schema describing the shape of a data import or export.
///
/// The schema itself is opaque to validation, only its presence matters.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonSchemaDefinition(pub serde_json::Value);

/// Schema for arbitrary, unvalidated objects (e.g. inline configuration).
pub fn raw_object_schema(_: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true,
    })
}

/// Returns `true` if `value` is [`Some`] and not empty.
pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
