use tracing::{debug, instrument};

use crate::{
    crd::Blueprint,
    field::{ErrorList, Path},
    validation::{
        definitions::{
            validate_blueprint_export_definitions, validate_blueprint_import_definitions,
            validate_template_executor_list,
        },
        scope::{Scope, validate_templates_in_scope},
        template::{inline_templates, validate_subinstallations},
    },
};

/// Validates a blueprint: its definitions, its executors and its
/// subinstallations, which have to be satisfiable by the blueprint's imports.
///
/// Subinstallations referenced by file are only checked structurally, they
/// have to be resolved into inline templates beforehand to take part in the
/// satisfaction check.
#[instrument(skip_all)]
pub fn validate_blueprint(blueprint: &Blueprint) -> ErrorList {
    let mut errors =
        validate_blueprint_import_definitions(&Path::new("imports"), &blueprint.imports);
    errors.extend(validate_blueprint_export_definitions(
        &Path::new("exports"),
        &blueprint.exports,
    ));
    errors.extend(validate_template_executor_list(
        &Path::new("deployExecutions"),
        &blueprint.deploy_executions,
    ));
    errors.extend(validate_template_executor_list(
        &Path::new("exportExecutions"),
        &blueprint.export_executions,
    ));

    let subinstallations_path = Path::new("subinstallations");
    errors.extend(validate_subinstallations(
        &subinstallations_path,
        &blueprint.subinstallations,
    ));
    errors.extend(validate_templates_in_scope(
        &subinstallations_path,
        &Scope::from_import_definitions(&blueprint.imports),
        inline_templates(&blueprint.subinstallations),
    ));

    debug!(violations = errors.len(), "validated blueprint");
    errors
}
