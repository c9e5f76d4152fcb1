use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use strum::Display;

use crate::crd::{InstallationExports, InstallationImports, JsonSchemaDefinition};

/// A blueprint declares what a reusable component imports and exports, how
/// it is deployed and which nested installations it consists of.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<ExportDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deploy_executions: Vec<TemplateExecutor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_executions: Vec<TemplateExecutor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subinstallations: Vec<SubinstallationTemplate>,
}

/// The value kind of an import.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ImportType {
    Data,
    Target,
    TargetList,
    TargetMap,
}

/// The value kind of an export.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ExportType {
    Data,
    Target,
}

impl From<ExportType> for ImportType {
    fn from(value: ExportType) -> Self {
        match value {
            ExportType::Data => Self::Data,
            ExportType::Target => Self::Target,
        }
    }
}

/// A named value a blueprint consumes.
///
/// The kind is either given explicitly via `type` or, in the legacy format,
/// derived from whether `schema` (data) or `targetType` (target) is set.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDefinition {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub import_type: Option<ImportType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonSchemaDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Defaults to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Imports that only exist if this (optional) import is satisfied.
    #[serde(
        default,
        rename = "imports",
        alias = "conditionalImports",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditional_imports: Vec<ImportDefinition>,
}

impl ImportDefinition {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }
}

/// A named value a blueprint produces.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDefinition {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub export_type: Option<ExportType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonSchemaDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

/// A template used to render deploy items or exports.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExecutor {
    pub name: String,

    /// The templating engine, e.g. `GoTemplate`.
    #[serde(default, rename = "type")]
    pub executor_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<serde_json::Value>,
}

/// A nested installation, given either as a file in the blueprint file system
/// or inline. Exactly one of both must be set.
///
/// The inline template shares the object with `file`, every key besides
/// `file` belongs to the template.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubinstallationTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub installation_template: Option<Box<InstallationTemplate>>,
}

impl<'de> Deserialize<'de> for SubinstallationTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;

        let file = fields
            .remove("file")
            .map(serde_json::from_value::<Option<String>>)
            .transpose()
            .map_err(D::Error::custom)?
            .flatten();

        let installation_template = if fields.is_empty() {
            None
        } else {
            let template = serde_json::from_value(serde_json::Value::Object(fields))
                .map_err(D::Error::custom)?;
            Some(Box::new(template))
        };

        Ok(Self {
            file,
            installation_template,
        })
    }
}

/// A node of the installation tree.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationTemplate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub blueprint: InstallationTemplateBlueprintDefinition,

    #[serde(default)]
    pub imports: InstallationImports,

    #[serde(default)]
    pub exports: InstallationExports,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_data_mappings: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_data_mappings: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subinstallations: Vec<SubinstallationTemplate>,
}

/// The blueprint of an installation template. Exactly one of `ref` and
/// `filesystem` must be set.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationTemplateBlueprintDefinition {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn deserialize_blueprint() {
        let input = indoc! {r#"
            imports:
              - name: cluster
                targetType: kubernetes-cluster
              - name: config
                type: data
                schema:
                  type: object
              - name: optional-db
                type: target
                targetType: postgres
                required: false
                imports:
                  - name: db-credentials
                    schema:
                      type: string
            exports:
              - name: endpoint
                type: data
                schema:
                  type: string
            deployExecutions:
              - name: default
                type: GoTemplate
                file: /deploy-execution.yaml
            subinstallations:
              - file: /subinst-a.yaml
              - name: inline
                blueprint:
                  ref: cd://resources/inline
                imports:
                  targets:
                    - name: cluster
                      target: cluster
        "#};

        let blueprint: Blueprint = serde_yaml::from_str(input).expect("blueprint must deserialize");

        assert_eq!(blueprint.imports.len(), 3);
        assert_eq!(blueprint.imports[1].import_type, Some(ImportType::Data));
        assert!(blueprint.imports[0].is_required());
        assert!(!blueprint.imports[2].is_required());
        assert_eq!(blueprint.imports[2].conditional_imports.len(), 1);
        assert_eq!(blueprint.deploy_executions[0].executor_type, "GoTemplate");

        assert_eq!(
            blueprint.subinstallations[0].file.as_deref(),
            Some("/subinst-a.yaml")
        );
        assert!(blueprint.subinstallations[0].installation_template.is_none());

        let inline = blueprint.subinstallations[1]
            .installation_template
            .as_ref()
            .expect("inline template must be set");
        assert_eq!(inline.name, "inline");
        assert_eq!(
            inline.blueprint.reference.as_deref(),
            Some("cd://resources/inline")
        );
    }

    #[test]
    fn deserialize_subinstallation_with_file_and_inline_template() {
        let input = indoc! {r#"
            file: /subinst.yaml
            name: both
        "#};

        let subinstallation: SubinstallationTemplate =
            serde_yaml::from_str(input).expect("subinstallation must deserialize");

        assert_eq!(subinstallation.file.as_deref(), Some("/subinst.yaml"));
        assert_eq!(
            subinstallation
                .installation_template
                .map(|template| template.name),
            Some("both".to_owned())
        );
    }

    #[test]
    fn import_type_display() {
        assert_eq!(ImportType::TargetList.to_string(), "targetList");
        assert_eq!(ImportType::from(ExportType::Target), ImportType::Target);
    }
}
