//! Validation of the import, export and executor declarations of a blueprint.

use std::collections::HashSet;

use crate::{
    crd::{ExportDefinition, ExportType, ImportDefinition, ImportType, TemplateExecutor, is_set},
    field::{Error, ErrorList, Path},
};

/// The outcome of determining the value kind of a definition.
///
/// The kind is resolved before any kind specific field is looked at, see
/// [`resolve_import_kind`] and [`resolve_export_kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindResolution<K> {
    /// The kind is given by `type`.
    Explicit(K),

    /// The kind is derived from the legacy `schema` (data) or `targetType`
    /// (target) field.
    Inferred(K),

    /// Neither `type` nor any legacy indicator is set.
    Missing,

    /// `type` is not set but both legacy indicators are.
    Ambiguous,
}

impl<K: Copy> KindResolution<K> {
    /// Returns the resolved kind, if there is one.
    pub fn kind(&self) -> Option<K> {
        match self {
            Self::Explicit(kind) | Self::Inferred(kind) => Some(*kind),
            Self::Missing | Self::Ambiguous => None,
        }
    }

    fn into_result(self, path: &Path, name: &str) -> Result<K, Error> {
        match self {
            Self::Explicit(kind) | Self::Inferred(kind) => Ok(kind),
            Self::Missing => Err(Error::required(
                path,
                "type must be set, or in the legacy format either schema or targetType",
            )),
            Self::Ambiguous => Err(Error::invalid(
                path,
                name,
                "only one of schema and targetType may be set if no type is given",
            )),
        }
    }
}

fn resolve_kind<K>(
    explicit: Option<K>,
    has_schema: bool,
    has_target_type: bool,
    data: K,
    target: K,
) -> KindResolution<K> {
    match (explicit, has_schema, has_target_type) {
        (Some(kind), _, _) => KindResolution::Explicit(kind),
        (None, true, false) => KindResolution::Inferred(data),
        (None, false, true) => KindResolution::Inferred(target),
        (None, false, false) => KindResolution::Missing,
        (None, true, true) => KindResolution::Ambiguous,
    }
}

/// Determines the value kind of an import definition.
pub fn resolve_import_kind(definition: &ImportDefinition) -> KindResolution<ImportType> {
    resolve_kind(
        definition.import_type,
        definition.schema.is_some(),
        is_set(&definition.target_type),
        ImportType::Data,
        ImportType::Target,
    )
}

/// Determines the value kind of an export definition.
pub fn resolve_export_kind(definition: &ExportDefinition) -> KindResolution<ExportType> {
    resolve_kind(
        definition.export_type,
        definition.schema.is_some(),
        is_set(&definition.target_type),
        ExportType::Data,
        ExportType::Target,
    )
}

/// Checks that exactly the fields belonging to `kind` are set.
fn validate_kind_fields(
    path: &Path,
    name: &str,
    kind: ImportType,
    has_schema: bool,
    has_target_type: bool,
) -> ErrorList {
    let mut errors = ErrorList::new();

    match kind {
        ImportType::Data => {
            if !has_schema {
                errors.push(Error::required(
                    path,
                    format!("Schema must be set for type {kind}"),
                ));
            }
            if has_target_type {
                errors.push(Error::invalid(
                    path,
                    name,
                    format!("TargetType must not be set for type {kind}"),
                ));
            }
        }
        ImportType::Target | ImportType::TargetList | ImportType::TargetMap => {
            if !has_target_type {
                errors.push(Error::required(
                    path,
                    format!("TargetType must be set for type {kind}"),
                ));
            }
            if has_schema {
                errors.push(Error::invalid(
                    path,
                    name,
                    format!("Schema must not be set for type {kind}"),
                ));
            }
        }
    }

    errors
}

/// Validates the import definitions of a blueprint.
///
/// Names must be unique across the whole definition tree, conditional
/// imports included.
pub fn validate_blueprint_import_definitions(
    path: &Path,
    definitions: &[ImportDefinition],
) -> ErrorList {
    validate_import_definitions(path, definitions, &mut HashSet::new())
}

fn validate_import_definitions<'a>(
    path: &Path,
    definitions: &'a [ImportDefinition],
    names: &mut HashSet<&'a str>,
) -> ErrorList {
    let mut errors = ErrorList::new();

    for (i, definition) in definitions.iter().enumerate() {
        let index_path = path.index(i);

        if definition.name.is_empty() {
            errors.push(Error::required(
                &index_path.child("name"),
                "name must not be empty",
            ));
            continue;
        }
        if !names.insert(&definition.name) {
            errors.push(Error::duplicate(&index_path, &definition.name));
        }

        let definition_path = index_path.key(&definition.name);

        match resolve_import_kind(definition).into_result(&definition_path, &definition.name) {
            Ok(kind) => errors.extend(validate_kind_fields(
                &definition_path,
                &definition.name,
                kind,
                definition.schema.is_some(),
                is_set(&definition.target_type),
            )),
            Err(error) => errors.push(error),
        }

        if !definition.conditional_imports.is_empty() {
            if definition.is_required() {
                errors.push(Error::invalid(
                    &definition_path,
                    &definition.name,
                    "conditional imports on required import",
                ));
            }

            errors.extend(validate_import_definitions(
                &definition_path.child("imports"),
                &definition.conditional_imports,
                names,
            ));
        }
    }

    errors
}

/// Validates the export definitions of a blueprint.
pub fn validate_blueprint_export_definitions(
    path: &Path,
    definitions: &[ExportDefinition],
) -> ErrorList {
    let mut errors = ErrorList::new();
    let mut names = HashSet::new();

    for (i, definition) in definitions.iter().enumerate() {
        let index_path = path.index(i);

        if definition.name.is_empty() {
            errors.push(Error::required(
                &index_path.child("name"),
                "name must not be empty",
            ));
            continue;
        }
        if !names.insert(definition.name.as_str()) {
            errors.push(Error::duplicate(&index_path, &definition.name));
        }

        let definition_path = index_path.key(&definition.name);

        match resolve_export_kind(definition).into_result(&definition_path, &definition.name) {
            Ok(kind) => errors.extend(validate_kind_fields(
                &definition_path,
                &definition.name,
                kind.into(),
                definition.schema.is_some(),
                is_set(&definition.target_type),
            )),
            Err(error) => errors.push(error),
        }
    }

    errors
}

/// Validates the deploy or export executors of a blueprint.
pub fn validate_template_executor_list(path: &Path, executors: &[TemplateExecutor]) -> ErrorList {
    let mut errors = ErrorList::new();
    let mut names = HashSet::new();

    for (i, executor) in executors.iter().enumerate() {
        let index_path = path.index(i);

        if executor.name.is_empty() {
            errors.push(Error::required(
                &index_path.child("name"),
                "name must not be empty",
            ));
            continue;
        }
        if !names.insert(executor.name.as_str()) {
            errors.push(Error::duplicate(&index_path, &executor.name));
        }

        if executor.executor_type.is_empty() {
            errors.push(Error::required(
                &index_path.key(&executor.name).child("type"),
                "type must not be empty",
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{crd::JsonSchemaDefinition, field::ErrorType};

    fn schema() -> Option<JsonSchemaDefinition> {
        Some(JsonSchemaDefinition(serde_json::json!({"type": "string"})))
    }

    fn import(name: &str, import_type: Option<ImportType>) -> ImportDefinition {
        ImportDefinition {
            name: name.to_owned(),
            import_type,
            ..Default::default()
        }
    }

    fn target_import(name: &str, import_type: ImportType) -> ImportDefinition {
        ImportDefinition {
            target_type: Some("test".to_owned()),
            ..import(name, Some(import_type))
        }
    }

    fn data_import(name: &str) -> ImportDefinition {
        ImportDefinition {
            schema: schema(),
            ..import(name, Some(ImportType::Data))
        }
    }

    fn contains(errors: &ErrorList, error_type: ErrorType, field: &str) -> bool {
        errors
            .iter()
            .any(|error| error.error_type == error_type && error.field == field)
    }

    #[test]
    fn valid_import_definitions() {
        let definitions = [
            target_import("my-import1", ImportType::Target),
            target_import("my-import2", ImportType::TargetList),
            data_import("my-import3"),
        ];

        let errors = validate_blueprint_import_definitions(&Path::new("b"), &definitions);
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn import_definition_without_name() {
        let errors =
            validate_blueprint_import_definitions(&Path::new("b"), &[import("", None)]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Required, "b[0].name"));
    }

    #[test]
    fn import_definition_without_type() {
        let errors =
            validate_blueprint_import_definitions(&Path::new("b"), &[import("myimport", None)]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Required, "b[0][myimport]"));
    }

    #[test]
    fn legacy_import_definition_with_schema_and_target_type() {
        let definition = ImportDefinition {
            schema: schema(),
            target_type: Some("test".to_owned()),
            ..import("myimport", None)
        };

        let errors = validate_blueprint_import_definitions(&Path::new("x"), &[definition]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Invalid, "x[0][myimport]"));
    }

    #[test]
    fn import_definition_without_config_for_type() {
        let definitions = [
            import("myimport1", Some(ImportType::Data)),
            import("myimport2", Some(ImportType::Target)),
            import("myimport3", Some(ImportType::TargetList)),
        ];

        let errors = validate_blueprint_import_definitions(&Path::new("x"), &definitions);

        let details = errors
            .iter()
            .map(|error| (error.error_type, error.field.as_str(), error.detail.as_str()))
            .collect::<Vec<_>>();
        let expected = [
            (ErrorType::Required, "x[0][myimport1]", "Schema"),
            (ErrorType::Required, "x[1][myimport2]", "TargetType"),
            (ErrorType::Required, "x[2][myimport3]", "TargetType"),
        ];
        assert_eq!(details.len(), expected.len());
        for (actual, (error_type, field, mentions)) in details.iter().zip(expected) {
            assert_eq!((actual.0, actual.1), (error_type, field));
            assert!(actual.2.contains(mentions), "unexpected detail: {actual:?}");
        }
    }

    #[test]
    fn import_definition_with_wrong_config_for_type() {
        let with_both = |name: &str, import_type| ImportDefinition {
            schema: schema(),
            target_type: Some("test".to_owned()),
            ..import(name, Some(import_type))
        };
        let definitions = [
            with_both("myimport1", ImportType::Data),
            with_both("myimport2", ImportType::Target),
            with_both("myimport3", ImportType::TargetList),
        ];

        let errors = validate_blueprint_import_definitions(&Path::new("x"), &definitions);

        let details = errors
            .iter()
            .map(|error| (error.error_type, error.field.as_str(), error.detail.as_str()))
            .collect::<Vec<_>>();
        let expected = [
            (ErrorType::Invalid, "x[0][myimport1]", "TargetType"),
            (ErrorType::Invalid, "x[1][myimport2]", "Schema"),
            (ErrorType::Invalid, "x[2][myimport3]", "Schema"),
        ];
        assert_eq!(details.len(), expected.len());
        for (actual, (error_type, field, mentions)) in details.iter().zip(expected) {
            assert_eq!((actual.0, actual.1), (error_type, field));
            assert!(actual.2.contains(mentions), "unexpected detail: {actual:?}");
        }
    }

    #[test]
    fn conditional_imports_on_required_import() {
        let definition = ImportDefinition {
            target_type: Some("test".to_owned()),
            conditional_imports: vec![ImportDefinition {
                target_type: Some("test".to_owned()),
                ..import("myConditionalImport", None)
            }],
            ..import("myimport", None)
        };

        let errors = validate_blueprint_import_definitions(&Path::new("x"), &[definition]);

        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().expect("one error");
        assert_eq!(error.error_type, ErrorType::Invalid);
        assert_eq!(error.field, "x[0][myimport]");
        assert_eq!(error.detail, "conditional imports on required import");
    }

    #[test]
    fn conditional_imports_are_validated() {
        let definition = ImportDefinition {
            required: Some(false),
            conditional_imports: vec![import("conditional", None), data_import("myimport")],
            ..target_import("myimport", ImportType::Target)
        };

        let errors = validate_blueprint_import_definitions(&Path::new("x"), &[definition]);

        assert_eq!(errors.len(), 2);
        assert!(contains(&errors, ErrorType::Required, "x[0][myimport].imports[0][conditional]"));
        assert!(contains(&errors, ErrorType::Duplicate, "x[0][myimport].imports[1]"));
    }

    #[test]
    fn target_map_import_definition() {
        let errors = validate_blueprint_import_definitions(&Path::new("x"), &[
            target_import("myimport", ImportType::TargetMap),
        ]);
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn duplicate_import_definitions() {
        let errors = validate_blueprint_import_definitions(&Path::new("x"), &[
            data_import("myimport"),
            target_import("myimport", ImportType::Target),
        ]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Duplicate, "x[1]"));
    }

    #[rstest]
    #[case(None, false, false, KindResolution::Missing)]
    #[case(None, true, true, KindResolution::Ambiguous)]
    #[case(None, true, false, KindResolution::Inferred(ImportType::Data))]
    #[case(None, false, true, KindResolution::Inferred(ImportType::Target))]
    #[case(
        Some(ImportType::TargetMap),
        false,
        true,
        KindResolution::Explicit(ImportType::TargetMap)
    )]
    #[case(Some(ImportType::Data), true, true, KindResolution::Explicit(ImportType::Data))]
    fn import_kind_resolution(
        #[case] import_type: Option<ImportType>,
        #[case] has_schema: bool,
        #[case] has_target_type: bool,
        #[case] expected: KindResolution<ImportType>,
    ) {
        let definition = ImportDefinition {
            schema: has_schema.then(JsonSchemaDefinition::default),
            target_type: has_target_type.then(|| "test".to_owned()),
            ..import("myimport", import_type)
        };

        assert_eq!(resolve_import_kind(&definition), expected);
    }

    #[test]
    fn valid_export_definitions() {
        let definitions = [
            ExportDefinition {
                name: "my-export1".to_owned(),
                export_type: Some(ExportType::Target),
                target_type: Some("test".to_owned()),
                ..Default::default()
            },
            ExportDefinition {
                name: "my-export2".to_owned(),
                export_type: Some(ExportType::Data),
                schema: schema(),
                ..Default::default()
            },
        ];

        let errors = validate_blueprint_export_definitions(&Path::new("b"), &definitions);
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[rstest]
    #[case("", ErrorType::Required, "b[0].name")]
    #[case("myimport", ErrorType::Required, "b[0][myimport]")]
    fn invalid_export_definition(
        #[case] name: &str,
        #[case] error_type: ErrorType,
        #[case] field: &str,
    ) {
        let definition = ExportDefinition {
            name: name.to_owned(),
            ..Default::default()
        };

        let errors = validate_blueprint_export_definitions(&Path::new("b"), &[definition]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, error_type, field));
    }

    #[test]
    fn valid_template_executor() {
        let executor = TemplateExecutor {
            name: "myname".to_owned(),
            executor_type: "mytype".to_owned(),
            ..Default::default()
        };

        let errors = validate_template_executor_list(&Path::new("b"), &[executor]);
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[rstest]
    #[case("", "mytype", ErrorType::Required, "b[0].name")]
    #[case("myname", "", ErrorType::Required, "b[0][myname].type")]
    fn invalid_template_executor(
        #[case] name: &str,
        #[case] executor_type: &str,
        #[case] error_type: ErrorType,
        #[case] field: &str,
    ) {
        let executor = TemplateExecutor {
            name: name.to_owned(),
            executor_type: executor_type.to_owned(),
            ..Default::default()
        };

        let errors = validate_template_executor_list(&Path::new("b"), &[executor]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, error_type, field));
    }

    #[test]
    fn duplicate_template_executors() {
        let executor = TemplateExecutor {
            name: "myname".to_owned(),
            executor_type: "mytype".to_owned(),
            ..Default::default()
        };

        let errors =
            validate_template_executor_list(&Path::new("b"), &[executor.clone(), executor]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Duplicate, "b[1]"));
    }
}
