use std::collections::HashSet;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::{debug, instrument};

use crate::{
    crd::{
        AutomaticReconcile, BlueprintDefinition, ComponentDescriptorDefinition, DataExport,
        DataImport, Installation, InstallationExports, InstallationImports, InstallationSpec,
        LocalConfigMapReference, LocalSecretReference, ObjectReference, TargetExport, TargetImport,
    },
    field::{Error, ErrorList, Path},
    validation::{
        cron::validate_cron_spec,
        names::{
            DNS_1123_LABEL_MAX_LENGTH, TARGET_MAP_KEY_ERROR_MSG, is_dns_1123_label,
            is_target_map_key, max_len_error, name_is_dns_label,
        },
        one_of::validate_exactly_one_of,
    },
};

/// Prefix prepended to the installation name by the objects derived from it.
pub const INSTALLATION_PREFIX: &str = "inst-";

/// The maximum length of an installation name.
pub const INSTALLATION_NAME_MAX_LENGTH: usize =
    DNS_1123_LABEL_MAX_LENGTH - INSTALLATION_PREFIX.len();

/// The maximum length of the `generateName` of an installation. Kubernetes
/// appends five random characters to it.
pub const INSTALLATION_GENERATE_NAME_MAX_LENGTH: usize = INSTALLATION_NAME_MAX_LENGTH - 5;

const CRON_SPEC_ERROR_MSG: &str = "field must be a valid cron spec";

/// Validates an [`Installation`], its metadata at `metadata` and its spec at
/// `spec`.
#[instrument(
    skip_all,
    fields(installation = installation.metadata.name.as_deref().unwrap_or_default())
)]
pub fn validate_installation(installation: &Installation) -> ErrorList {
    let mut errors =
        validate_installation_object_meta(&installation.metadata, &Path::new("metadata"));
    errors.extend(validate_installation_spec(
        &installation.spec,
        &Path::new("spec"),
    ));

    debug!(violations = errors.len(), "validated installation");
    errors
}

fn validate_installation_object_meta(metadata: &ObjectMeta, path: &Path) -> ErrorList {
    let mut errors = validate_object_meta(metadata, path);

    let name = metadata.name.as_deref().unwrap_or_default();
    let generate_name = metadata.generate_name.as_deref().unwrap_or_default();

    if name.len() > INSTALLATION_NAME_MAX_LENGTH {
        errors.push(Error::invalid(
            &path.child("name"),
            name,
            max_len_error(INSTALLATION_NAME_MAX_LENGTH),
        ));
    } else if generate_name.len() > INSTALLATION_GENERATE_NAME_MAX_LENGTH {
        errors.push(Error::invalid(
            &path.child("generateName"),
            generate_name,
            max_len_error(INSTALLATION_GENERATE_NAME_MAX_LENGTH),
        ));
    }

    errors
}

/// The generic part of the metadata validation of a namespaced object whose
/// name must be a DNS-1123 label.
fn validate_object_meta(metadata: &ObjectMeta, path: &Path) -> ErrorList {
    let mut errors = ErrorList::new();

    let name = metadata.name.as_deref().unwrap_or_default();
    let generate_name = metadata.generate_name.as_deref().unwrap_or_default();
    let namespace = metadata.namespace.as_deref().unwrap_or_default();

    if !generate_name.is_empty() {
        if let Err(err) = name_is_dns_label(generate_name, true) {
            errors.push(Error::invalid(
                &path.child("generateName"),
                generate_name,
                err.to_string(),
            ));
        }
    }

    if name.is_empty() {
        if generate_name.is_empty() {
            errors.push(Error::required(
                &path.child("name"),
                "name or generateName is required",
            ));
        }
    } else if let Err(err) = name_is_dns_label(name, false) {
        errors.push(Error::invalid(&path.child("name"), name, err.to_string()));
    }

    if namespace.is_empty() {
        errors.push(Error::required(
            &path.child("namespace"),
            "namespace must not be empty",
        ));
    } else if let Err(err) = is_dns_1123_label(namespace) {
        errors.push(Error::invalid(
            &path.child("namespace"),
            namespace,
            err.to_string(),
        ));
    }

    errors
}

/// Validates the spec of an installation.
pub fn validate_installation_spec(spec: &InstallationSpec, path: &Path) -> ErrorList {
    let mut errors = validate_installation_imports(&spec.imports, &path.child("imports"));
    errors.extend(validate_installation_exports(
        &spec.exports,
        &path.child("exports"),
    ));
    errors.extend(validate_installation_blueprint(
        &spec.blueprint,
        &path.child("blueprint"),
    ));
    if let Some(component_descriptor) = &spec.component_descriptor {
        errors.extend(validate_installation_component_descriptor(
            component_descriptor,
            &path.child("componentDescriptor"),
        ));
    }
    if let Some(automatic_reconcile) = &spec.automatic_reconcile {
        errors.extend(validate_installation_automatic_reconcile(
            automatic_reconcile,
            &path.child("automaticReconcile"),
        ));
    }

    errors
}

fn validate_installation_blueprint(blueprint: &BlueprintDefinition, path: &Path) -> ErrorList {
    validate_exactly_one_of(&path.child("definition"), blueprint)
}

fn validate_installation_component_descriptor(
    component_descriptor: &ComponentDescriptorDefinition,
    path: &Path,
) -> ErrorList {
    validate_exactly_one_of(&path.child("definition"), component_descriptor)
}

fn validate_installation_automatic_reconcile(
    automatic_reconcile: &AutomaticReconcile,
    path: &Path,
) -> ErrorList {
    let schedules = [
        (
            "succeededReconcile",
            automatic_reconcile
                .succeeded_reconcile
                .as_ref()
                .and_then(|reconcile| reconcile.cron_spec.as_deref()),
        ),
        (
            "failedReconcile",
            automatic_reconcile
                .failed_reconcile
                .as_ref()
                .and_then(|reconcile| reconcile.cron_spec.as_deref()),
        ),
    ];

    schedules
        .into_iter()
        .filter_map(|(field, cron_spec)| {
            let cron_spec = cron_spec.filter(|spec| !spec.is_empty())?;
            let err = validate_cron_spec(cron_spec).err()?;

            debug!(field, cron_spec, error = %err, "invalid cron spec");
            Some(Error::invalid(
                &path.child(field).child("cronSpec"),
                cron_spec,
                CRON_SPEC_ERROR_MSG,
            ))
        })
        .collect()
}

/// Validates the data and target imports of an installation or installation
/// template. Data and target imports share one namespace.
pub(crate) fn validate_installation_imports(
    imports: &InstallationImports,
    path: &Path,
) -> ErrorList {
    let mut names = HashSet::new();

    let mut errors = validate_data_imports(&imports.data, &path.child("data"), &mut names);
    errors.extend(validate_target_imports(
        &imports.targets,
        &path.child("targets"),
        &mut names,
    ));

    errors
}

fn validate_data_imports<'a>(
    imports: &'a [DataImport],
    path: &Path,
    names: &mut HashSet<&'a str>,
) -> ErrorList {
    let mut errors = ErrorList::new();

    for (i, import) in imports.iter().enumerate() {
        let import_path = path.index(i);

        errors.extend(validate_exactly_one_of(&import_path, import));

        if let Some(secret_ref) = &import.secret_ref {
            errors.extend(validate_local_secret_reference(
                secret_ref,
                &import_path.child("secretRef"),
            ));
        }
        if let Some(config_map_ref) = &import.config_map_ref {
            errors.extend(validate_local_config_map_reference(
                config_map_ref,
                &import_path.child("configMapRef"),
            ));
        }

        if import.name.is_empty() {
            errors.push(Error::required(
                &import_path.child("name"),
                "name must not be empty",
            ));
            continue;
        }
        if !names.insert(&import.name) {
            errors.push(Error::duplicate(&import_path, &import.name));
        }
    }

    errors
}

fn validate_target_imports<'a>(
    imports: &'a [TargetImport],
    path: &Path,
    names: &mut HashSet<&'a str>,
) -> ErrorList {
    let mut errors = ErrorList::new();

    for (i, import) in imports.iter().enumerate() {
        let import_path = path.index(i);

        if import.name.is_empty() {
            errors.push(Error::required(
                &import_path.child("name"),
                "name must not be empty",
            ));
        }

        errors.extend(validate_exactly_one_of(&import_path, import));

        for (k, target) in import.targets.iter().flatten().enumerate() {
            if target.is_empty() {
                errors.push(Error::required(
                    &import_path.child("targets").index(k),
                    "target must not be empty",
                ));
            }
        }

        for (key, target) in import.target_map.iter().flatten() {
            let key_path = import_path.child("targetMap").key(key);

            if !is_target_map_key(key) {
                errors.push(Error::invalid(&key_path, key, TARGET_MAP_KEY_ERROR_MSG));
            }
            if target.is_empty() {
                errors.push(Error::required(&key_path, "target must not be empty"));
            }
        }

        if !import.name.is_empty() && !names.insert(&import.name) {
            errors.push(Error::duplicate(&import_path, &import.name));
        }
    }

    errors
}

/// Validates the data and target exports of an installation or installation
/// template. Names must be unique per list.
pub(crate) fn validate_installation_exports(
    exports: &InstallationExports,
    path: &Path,
) -> ErrorList {
    let mut errors = validate_data_exports(&exports.data, &path.child("data"));
    errors.extend(validate_target_exports(
        &exports.targets,
        &path.child("targets"),
    ));
    errors
}

fn validate_data_exports(exports: &[DataExport], path: &Path) -> ErrorList {
    validate_exports(
        exports
            .iter()
            .map(|export| (export.name.as_str(), export.data_ref.as_str())),
        path,
        "dataRef",
    )
}

fn validate_target_exports(exports: &[TargetExport], path: &Path) -> ErrorList {
    validate_exports(
        exports
            .iter()
            .map(|export| (export.name.as_str(), export.target.as_str())),
        path,
        "target",
    )
}

/// Both export kinds consist of a name and the symbol published under it.
fn validate_exports<'a>(
    exports: impl IntoIterator<Item = (&'a str, &'a str)>,
    path: &Path,
    symbol_field: &str,
) -> ErrorList {
    let mut errors = ErrorList::new();
    let mut names = HashSet::new();

    for (i, (name, symbol)) in exports.into_iter().enumerate() {
        let export_path = path.index(i);

        if symbol.is_empty() {
            errors.push(Error::required(
                &export_path.child(symbol_field),
                format!("{symbol_field} must not be empty"),
            ));
        }
        if name.is_empty() {
            errors.push(Error::required(
                &export_path.child("name"),
                "name must not be empty",
            ));
            continue;
        }
        if !names.insert(name) {
            errors.push(Error::duplicate(&export_path, name));
        }
    }

    errors
}

/// Validates that both name and namespace of an object reference are set.
pub fn validate_object_reference(reference: &ObjectReference, path: &Path) -> ErrorList {
    let mut errors = ErrorList::new();

    if reference.name.is_empty() {
        errors.push(Error::required(
            &path.child("name"),
            "name must not be empty",
        ));
    }
    if reference.namespace.is_empty() {
        errors.push(Error::required(
            &path.child("namespace"),
            "namespace must not be empty",
        ));
    }

    errors
}

pub fn validate_object_reference_list(references: &[ObjectReference], path: &Path) -> ErrorList {
    references
        .iter()
        .enumerate()
        .flat_map(|(i, reference)| validate_object_reference(reference, &path.index(i)))
        .collect()
}

pub fn validate_local_secret_reference(reference: &LocalSecretReference, path: &Path) -> ErrorList {
    validate_local_reference_name(&reference.name, path)
}

pub fn validate_local_config_map_reference(
    reference: &LocalConfigMapReference,
    path: &Path,
) -> ErrorList {
    validate_local_reference_name(&reference.name, path)
}

fn validate_local_reference_name(name: &str, path: &Path) -> ErrorList {
    if name.is_empty() {
        Error::required(&path.child("name"), "name must not be empty").into()
    } else {
        ErrorList::new()
    }
}
