use crate::{
    crd::{InstallationTemplate, SubinstallationTemplate},
    field::{Error, ErrorList, Path},
    validation::{
        installation::{validate_installation_exports, validate_installation_imports},
        names::is_dns_1123_label,
        one_of::validate_exactly_one_of,
        scope::{Scope, validate_templates_in_scope},
    },
};

/// Validates a single installation template, including the satisfaction of
/// its own inline subinstallations.
///
/// Secrets and config maps can only be imported by the root installation,
/// templates have to reference data that is already in scope.
pub fn validate_installation_template(path: &Path, template: &InstallationTemplate) -> ErrorList {
    let mut errors = validate_template_fields(path, template);
    errors.extend(validate_nested_templates(path, template));
    errors
}

/// The checks of [`validate_installation_template`] that only look at the
/// template itself.
pub(crate) fn validate_template_fields(path: &Path, template: &InstallationTemplate) -> ErrorList {
    let mut errors = ErrorList::new();

    let name_path = path.child("name");
    if template.name.is_empty() {
        errors.push(Error::required(&name_path, "name must not be empty"));
    } else if let Err(err) = is_dns_1123_label(&template.name) {
        errors.push(Error::invalid(&name_path, &template.name, err.to_string()));
    }

    errors.extend(validate_exactly_one_of(
        &path.child("blueprint"),
        &template.blueprint,
    ));

    let imports_path = path.child("imports");
    errors.extend(validate_installation_imports(
        &template.imports,
        &imports_path,
    ));
    for (i, import) in template.imports.data.iter().enumerate() {
        let import_path = imports_path.child("data").index(i);

        if import.secret_ref.is_some() {
            errors.push(Error::forbidden(
                &import_path.child("secretRef"),
                "secret references are only allowed in installations",
            ));
        }
        if import.config_map_ref.is_some() {
            errors.push(Error::forbidden(
                &import_path.child("configMapRef"),
                "config map references are only allowed in installations",
            ));
        }
    }

    errors.extend(validate_installation_exports(
        &template.exports,
        &path.child("exports"),
    ));

    errors
}

/// Validates the subinstallations of `template` against its imports.
pub(crate) fn validate_nested_templates(path: &Path, template: &InstallationTemplate) -> ErrorList {
    let subinstallations_path = path.child("subinstallations");

    let mut errors = validate_subinstallations(&subinstallations_path, &template.subinstallations);
    errors.extend(validate_templates_in_scope(
        &subinstallations_path,
        &Scope::from_installation_imports(&template.imports),
        inline_templates(&template.subinstallations),
    ));

    errors
}

/// Validates that every subinstallation is given either by file or inline.
pub fn validate_subinstallations(
    path: &Path,
    subinstallations: &[SubinstallationTemplate],
) -> ErrorList {
    subinstallations
        .iter()
        .enumerate()
        .flat_map(|(k, subinstallation)| validate_exactly_one_of(&path.index(k), subinstallation))
        .collect()
}

/// Returns the inline templates of `subinstallations` together with their
/// position in the list.
pub(crate) fn inline_templates(
    subinstallations: &[SubinstallationTemplate],
) -> impl Iterator<Item = (usize, &InstallationTemplate)> {
    subinstallations
        .iter()
        .enumerate()
        .filter_map(|(k, subinstallation)| {
            subinstallation
                .installation_template
                .as_deref()
                .map(|template| (k, template))
        })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;
    use crate::{
        crd::{
            DataImport, InstallationTemplateBlueprintDefinition, LocalConfigMapReference,
            LocalSecretReference,
        },
        field::ErrorType,
    };

    fn template(name: &str, blueprint_ref: Option<&str>) -> InstallationTemplate {
        InstallationTemplate {
            name: name.to_owned(),
            blueprint: InstallationTemplateBlueprintDefinition {
                reference: blueprint_ref.map(str::to_owned),
                filesystem: None,
            },
            ..Default::default()
        }
    }

    fn contains(errors: &ErrorList, error_type: ErrorType, field: &str) -> bool {
        errors
            .iter()
            .any(|error| error.error_type == error_type && error.field == field)
    }

    #[test]
    fn valid_template() {
        let errors =
            validate_installation_template(&Path::new(""), &template("myname", Some("my-ref")));
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[rstest]
    #[case("", Some("my-ref"), ErrorType::Required, "b.name")]
    #[case("%$.-", Some("my-ref"), ErrorType::Invalid, "b.name")]
    #[case("myname", None, ErrorType::Required, "b.blueprint")]
    fn invalid_template(
        #[case] name: &str,
        #[case] blueprint_ref: Option<&str>,
        #[case] error_type: ErrorType,
        #[case] field: &str,
    ) {
        let errors =
            validate_installation_template(&Path::new("b"), &template(name, blueprint_ref));

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, error_type, field));
    }

    #[test]
    fn blueprint_ref_and_filesystem() {
        let mut template = template("myname", Some("my-ref"));
        template.blueprint.filesystem = Some(serde_json::json!({"blueprint.yaml": ""}));

        let errors = validate_installation_template(&Path::new("b"), &template);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Invalid, "b.blueprint"));
    }

    #[test]
    fn secret_and_config_map_imports_are_forbidden() {
        let mut template = template("myname", Some("my-ref"));
        template.imports.data = vec![
            DataImport {
                name: "myimport".to_owned(),
                secret_ref: Some(LocalSecretReference {
                    name: "mysecret".to_owned(),
                    key: None,
                }),
                ..Default::default()
            },
            DataImport {
                name: "mysecondimport".to_owned(),
                config_map_ref: Some(LocalConfigMapReference {
                    name: "mycm".to_owned(),
                    key: None,
                }),
                ..Default::default()
            },
        ];

        let errors = validate_installation_template(&Path::new("b"), &template);

        assert_eq!(errors.len(), 2);
        assert!(contains(&errors, ErrorType::Forbidden, "b.imports.data[0].secretRef"));
        assert!(contains(&errors, ErrorType::Forbidden, "b.imports.data[1].configMapRef"));
    }

    #[test]
    fn subinstallation_with_file_and_inline_template() {
        let subinstallation = SubinstallationTemplate {
            file: Some("mypath".to_owned()),
            installation_template: Some(Box::default()),
        };

        let errors = validate_subinstallations(&Path::new("b"), &[subinstallation]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Invalid, "b[0]"));
    }

    #[test]
    fn subinstallation_without_file_and_inline_template() {
        let errors =
            validate_subinstallations(&Path::new("b"), &[SubinstallationTemplate::default()]);

        assert_eq!(errors.len(), 1);
        assert!(contains(&errors, ErrorType::Required, "b[0]"));
    }

    #[test]
    fn nested_subinstallations_are_validated() {
        let template: InstallationTemplate = serde_yaml::from_str(indoc! {r#"
            name: parent
            blueprint:
              ref: my-ref
            imports:
              targets:
                - name: cluster
                  target: some-cluster
            subinstallations:
              - {}
              - name: child
                blueprint:
                  ref: my-ref
                imports:
                  data:
                    - name: config
                      secretRef:
                        name: my-secret
                  targets:
                    - name: cluster
                      target: cluster
                    - name: other
                      target: other-cluster
        "#})
        .expect("template must deserialize");

        let errors = validate_installation_template(&Path::new("b"), &template);

        let errors = errors
            .iter()
            .map(|error| (error.error_type, error.field.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(errors, vec![
            (ErrorType::Required, "b.subinstallations[0]"),
            (ErrorType::Forbidden, "b.subinstallations[1].imports.data[0].secretRef"),
            (ErrorType::NotFound, "b.subinstallations[1].imports.targets[1][other]"),
        ]);
    }
}
