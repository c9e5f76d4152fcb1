//! Mutual exclusion of optional fields.

use crate::{
    crd::{
        BlueprintDefinition, ComponentDescriptorDefinition, DataImport,
        InstallationTemplateBlueprintDefinition, SubinstallationTemplate, TargetImport, is_set,
    },
    field::{Error, ErrorList, Path},
};

/// Types with a group of optional fields of which exactly one must be set.
pub trait ExclusiveFields {
    /// Returns the serialized name of every field of the group together with
    /// whether it is set, in declaration order.
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)>;
}

/// Fails unless exactly one of the [`ExclusiveFields`] of `object` is set.
///
/// No field set results in a single [`Required`](crate::field::ErrorType::Required)
/// error at `path`, more than one field set in a single
/// [`Invalid`](crate::field::ErrorType::Invalid) error at `path`.
pub fn validate_exactly_one_of(path: &Path, object: &impl ExclusiveFields) -> ErrorList {
    let fields = object.exclusive_fields();
    let names = fields
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let set = fields
        .iter()
        .filter(|(_, is_set)| *is_set)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();

    match set.len() {
        0 => Error::required(path, format!("exactly one of {names} must be set")).into(),
        1 => ErrorList::new(),
        found => Error::invalid(
            path,
            set.join(", "),
            format!("exactly one of {names} must be set but found {found}"),
        )
        .into(),
    }
}

impl ExclusiveFields for BlueprintDefinition {
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("inline", self.inline.is_some()),
            ("ref", self.reference.is_some()),
        ]
    }
}

impl ExclusiveFields for ComponentDescriptorDefinition {
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("inline", self.inline.is_some()),
            ("ref", self.reference.is_some()),
        ]
    }
}

impl ExclusiveFields for InstallationTemplateBlueprintDefinition {
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("ref", is_set(&self.reference)),
            ("filesystem", self.filesystem.is_some()),
        ]
    }
}

impl ExclusiveFields for SubinstallationTemplate {
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("file", is_set(&self.file)),
            ("installationTemplate", self.installation_template.is_some()),
        ]
    }
}

impl ExclusiveFields for DataImport {
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("dataRef", is_set(&self.data_ref)),
            ("secretRef", self.secret_ref.is_some()),
            ("configMapRef", self.config_map_ref.is_some()),
        ]
    }
}

impl ExclusiveFields for TargetImport {
    fn exclusive_fields(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("target", is_set(&self.target)),
            ("targets", self.targets.is_some()),
            ("targetMap", self.target_map.is_some()),
            ("targetMapRef", is_set(&self.target_map_reference)),
            ("targetListRef", is_set(&self.target_list_reference)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use rstest::rstest;

    use super::*;
    use crate::{
        crd::{LocalConfigMapReference, LocalSecretReference},
        field::ErrorType,
    };

    fn data_import(data_ref: bool, secret_ref: bool, config_map_ref: bool) -> DataImport {
        DataImport {
            name: "myimport".to_owned(),
            data_ref: data_ref.then(|| "my-data".to_owned()),
            secret_ref: secret_ref.then(LocalSecretReference::default),
            config_map_ref: config_map_ref.then(LocalConfigMapReference::default),
        }
    }

    #[rstest]
    #[case(data_import(false, false, false), Some(ErrorType::Required))]
    #[case(data_import(true, false, false), None)]
    #[case(data_import(false, true, false), None)]
    #[case(data_import(false, false, true), None)]
    #[case(data_import(true, true, false), Some(ErrorType::Invalid))]
    #[case(data_import(true, false, true), Some(ErrorType::Invalid))]
    #[case(data_import(true, true, true), Some(ErrorType::Invalid))]
    fn data_import_sources(#[case] import: DataImport, #[case] expected: Option<ErrorType>) {
        let errors = validate_exactly_one_of(&Path::new("x").index(0), &import);

        match expected {
            Some(error_type) => {
                assert_eq!(errors.len(), 1);
                let error = errors.iter().next().expect("one error");
                assert_eq!(error.error_type, error_type);
                assert_eq!(error.field, "x[0]");
            }
            None => assert!(errors.is_empty(), "unexpected errors: {errors}"),
        }
    }

    #[test]
    fn empty_data_ref_is_not_set() {
        let import = DataImport {
            data_ref: Some(String::new()),
            ..data_import(false, false, false)
        };

        let errors = validate_exactly_one_of(&Path::new("x"), &import);
        assert_eq!(
            errors.iter().map(|e| e.error_type).collect::<Vec<_>>(),
            vec![ErrorType::Required]
        );
    }

    #[test]
    fn target_import_reports_all_set_fields() {
        let import = TargetImport {
            name: "myimport".to_owned(),
            target: Some("a".to_owned()),
            targets: Some(vec!["b".to_owned()]),
            target_map: Some(IndexMap::new()),
            ..Default::default()
        };

        let errors = validate_exactly_one_of(&Path::new("x"), &import);
        let error = errors.iter().next().expect("one error");

        assert_eq!(errors.len(), 1);
        assert_eq!(error.error_type, ErrorType::Invalid);
        assert_eq!(error.value.as_deref(), Some("target, targets, targetMap"));
        assert_eq!(
            error.detail,
            "exactly one of target, targets, targetMap, targetMapRef, targetListRef must be set but found 3"
        );
    }
}
