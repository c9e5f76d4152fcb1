use indexmap::IndexMap;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::{LocalConfigMapReference, LocalSecretReference, raw_object_schema};

/// An Installation deploys a blueprint with concrete imports and publishes
/// the blueprint's exports under the given names.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "landscape.stackable.tech",
    version = "v1alpha1",
    kind = "Installation",
    plural = "installations",
    shortname = "inst",
    derive = "PartialEq",
    crates(
        kube_core = "kube::core",
        k8s_openapi = "k8s_openapi",
        schemars = "schemars"
    ),
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct InstallationSpec {
    /// The blueprint to install, either inline or as a reference.
    #[serde(default)]
    pub blueprint: BlueprintDefinition,

    /// The component descriptor the blueprint is resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_descriptor: Option<ComponentDescriptorDefinition>,

    /// Data and targets consumed by the blueprint.
    #[serde(default)]
    pub imports: InstallationImports,

    /// Data and targets published by the blueprint.
    #[serde(default)]
    pub exports: InstallationExports,

    /// Periodic reconciliation of the installation after it succeeded or
    /// failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_reconcile: Option<AutomaticReconcile>,
}

/// Either an inline blueprint or a reference to one. Exactly one must be set.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDefinition {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<RemoteBlueprintReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineBlueprint>,
}

/// A blueprint resource of a component descriptor.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBlueprintReference {
    pub resource_name: String,
}

/// A blueprint given as an inline file system.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineBlueprint {
    #[schemars(schema_with = "raw_object_schema")]
    pub filesystem: serde_json::Value,
}

/// Either an inline component descriptor or a reference to one. Exactly one
/// must be set.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptorDefinition {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<ComponentDescriptorReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "raw_object_schema")]
    pub inline: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptorReference {
    pub component_name: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticReconcile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded_reconcile: Option<SucceededReconcile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_reconcile: Option<FailedReconcile>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SucceededReconcile {
    /// Standard five-field cron expression, e.g. `*/15 * * * *`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_spec: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedReconcile {
    /// How often a failed installation is retried, unlimited if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_reconciles: Option<u32>,

    /// Standard five-field cron expression, e.g. `0 3 * * *`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_spec: Option<String>,
}

/// The imports of an installation or installation template.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationImports {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataImport>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetImport>,
}

/// The exports of an installation or installation template.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationExports {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataExport>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetExport>,
}

/// A data import. Exactly one of `dataRef`, `secretRef` and `configMapRef`
/// must be set.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataImport {
    /// Name of the import in the blueprint.
    pub name: String,

    /// Name of a data object in the enclosing scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_ref: Option<String>,

    /// Only allowed on the root installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalSecretReference>,

    /// Only allowed on the root installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<LocalConfigMapReference>,
}

/// A target import. Exactly one source must be set.
///
/// `target` may reference a single element of a target list (`name[0]`) or
/// of a target map (`name[key]`).
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetImport {
    /// Name of the import in the blueprint.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,

    /// Keys must be valid target map keys, values reference single targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_map: Option<IndexMap<String, String>>,

    #[serde(default, rename = "targetMapRef", skip_serializing_if = "Option::is_none")]
    pub target_map_reference: Option<String>,

    #[serde(default, rename = "targetListRef", skip_serializing_if = "Option::is_none")]
    pub target_list_reference: Option<String>,
}

/// Publishes the blueprint export `name` as data object `dataRef`.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub name: String,

    #[serde(default)]
    pub data_ref: String,
}

/// Publishes the blueprint export `name` as target `target`.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetExport {
    pub name: String,

    #[serde(default)]
    pub target: String,
}
