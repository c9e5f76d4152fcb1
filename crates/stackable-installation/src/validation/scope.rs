//! Satisfaction of the imports of nested installation templates.
//!
//! Nested templates are resolved in document order. The imports of a template
//! may only reference
//!
//! - the imports of the enclosing installation (its [`Scope`]) and
//! - the exports of the templates declared *before* it on the same level.
//!
//! A template never sees the imports of its grandparent or the exports of
//! templates on other levels. There are no back-references, so a single pass
//! over the templates suffices.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use tracing::{debug, instrument, trace};

use crate::{
    crd::{
        ImportDefinition, ImportType, InstallationImports, InstallationTemplate, TargetImport,
        is_set,
    },
    field::{Error, ErrorList, Path},
    validation::{
        definitions::resolve_import_kind,
        reference::{Suffix, TargetReference},
        template::{validate_nested_templates, validate_template_fields},
    },
};

/// The imports of an enclosing installation, visible to all of its nested
/// templates.
#[derive(Clone, Debug, Default)]
pub struct Scope<'a> {
    symbols: HashMap<&'a str, Vec<ImportType>>,
}

impl<'a> Scope<'a> {
    /// Builds the scope of a blueprint from its import definitions, including
    /// conditional imports.
    ///
    /// Definitions without a name or without a resolvable kind are left out,
    /// they are reported by the definition validation.
    pub fn from_import_definitions(definitions: &'a [ImportDefinition]) -> Self {
        let mut scope = Self::default();
        scope.insert_definitions(definitions);
        scope
    }

    fn insert_definitions(&mut self, definitions: &'a [ImportDefinition]) {
        for definition in definitions {
            if let Some(kind) = resolve_import_kind(definition).kind() {
                self.insert(kind, &definition.name);
            }
            self.insert_definitions(&definition.conditional_imports);
        }
    }

    /// Builds the scope of an installation template from its imports, which
    /// is what its own nested templates resolve against.
    pub fn from_installation_imports(imports: &'a InstallationImports) -> Self {
        let mut scope = Self::default();

        for import in &imports.data {
            scope.insert(ImportType::Data, &import.name);
        }
        for import in &imports.targets {
            if let Some(kind) = target_import_kind(import) {
                scope.insert(kind, &import.name);
            }
        }

        scope
    }

    fn insert(&mut self, kind: ImportType, name: &'a str) {
        if !name.is_empty() {
            self.symbols.entry(name).or_default().push(kind);
        }
    }

    /// Returns `true` if `name` is imported with exactly the value `kind`.
    pub fn contains(&self, kind: ImportType, name: &str) -> bool {
        self.symbols
            .get(name)
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    /// Returns `true` if `name` is imported as data (for [`ImportType::Data`])
    /// or as any kind of target (for all other kinds).
    fn contains_family(&self, kind: ImportType, name: &str) -> bool {
        self.symbols.get(name).is_some_and(|kinds| {
            kinds
                .iter()
                .any(|imported| (*imported == ImportType::Data) == (kind == ImportType::Data))
        })
    }
}

/// The value kind a target import provides to nested templates.
fn target_import_kind(import: &TargetImport) -> Option<ImportType> {
    if is_set(&import.target) {
        Some(ImportType::Target)
    } else if import.targets.is_some() || is_set(&import.target_list_reference) {
        Some(ImportType::TargetList)
    } else if import.target_map.is_some() || is_set(&import.target_map_reference) {
        Some(ImportType::TargetMap)
    } else {
        None
    }
}

/// The exports of the templates processed so far on one level.
#[derive(Debug, Default)]
struct ExportScope<'a> {
    data: HashMap<&'a str, Exporter>,
    targets: HashMap<&'a str, Exporter>,
}

#[derive(Debug)]
struct Exporter {
    path: Path,

    /// Whether a collision was already reported for this exporter.
    reported: bool,
}

impl<'a> ExportScope<'a> {
    fn contains(&self, kind: ImportType, name: &str) -> bool {
        match kind {
            ImportType::Data => self.data.contains_key(name),
            ImportType::Target => self.targets.contains_key(name),
            ImportType::TargetList | ImportType::TargetMap => false,
        }
    }

    /// Makes the exports of `template` visible to the following templates.
    fn register(
        &mut self,
        path: &Path,
        scope: &Scope<'_>,
        template: &'a InstallationTemplate,
    ) -> ErrorList {
        let exports_path = path.child("exports");

        let mut errors = register_exports(
            &mut self.data,
            &exports_path.child("data"),
            template
                .exports
                .data
                .iter()
                .map(|export| (export.name.as_str(), export.data_ref.as_str())),
            |symbol| scope.contains_family(ImportType::Data, symbol),
            "data object",
        );
        errors.extend(register_exports(
            &mut self.targets,
            &exports_path.child("targets"),
            template
                .exports
                .targets
                .iter()
                .map(|export| (export.name.as_str(), export.target.as_str())),
            |symbol| scope.contains_family(ImportType::Target, symbol),
            "target",
        ));

        errors
    }
}

fn register_exports<'a>(
    exporters: &mut HashMap<&'a str, Exporter>,
    path: &Path,
    exports: impl IntoIterator<Item = (&'a str, &'a str)>,
    is_imported: impl Fn(&str) -> bool,
    kind: &str,
) -> ErrorList {
    let mut errors = ErrorList::new();

    for (i, (name, symbol)) in exports.into_iter().enumerate() {
        // Reported by the template validation
        if symbol.is_empty() {
            continue;
        }

        let export_path = path.index(i).key(format!("{name}/{symbol}"));

        if is_imported(symbol) {
            errors.push(Error::forbidden(
                &export_path,
                format!("{kind} {symbol:?} is already imported by the parent"),
            ));
            continue;
        }

        match exporters.entry(symbol) {
            Entry::Occupied(mut entry) => {
                let detail =
                    format!("{kind} {symbol:?} is exported by more than one subinstallation");
                let earlier = entry.get_mut();
                if !earlier.reported {
                    errors.push(Error::forbidden(&earlier.path, detail.clone()));
                    earlier.reported = true;
                }
                errors.push(Error::forbidden(&export_path, detail));
            }
            Entry::Vacant(entry) => {
                entry.insert(Exporter {
                    path: export_path,
                    reported: false,
                });
            }
        }
    }

    errors
}

/// Validates nested installation templates against the import definitions
/// of the enclosing blueprint.
///
/// Every template is validated on its own (see
/// [`validate_installation_template`]), and every import must be satisfied by
/// `imports` or by an export of an earlier template. Exports must neither
/// shadow an import of the parent nor collide with each other. Violations of
/// a template precede those of its nested templates.
///
/// [`validate_installation_template`]: crate::validation::validate_installation_template
#[instrument(skip_all, fields(path = %path, templates = templates.len()))]
pub fn validate_installation_templates(
    path: &Path,
    imports: &[ImportDefinition],
    templates: &[InstallationTemplate],
) -> ErrorList {
    let scope = Scope::from_import_definitions(imports);
    let errors = validate_templates_in_scope(path, &scope, templates.iter().enumerate());

    debug!(violations = errors.len(), "validated installation templates");
    errors
}

/// Validates templates, given with their position below `path`, against
/// `scope`.
pub(crate) fn validate_templates_in_scope<'a>(
    path: &Path,
    scope: &Scope<'_>,
    templates: impl IntoIterator<Item = (usize, &'a InstallationTemplate)>,
) -> ErrorList {
    let mut errors = ErrorList::new();
    let mut exports = ExportScope::default();
    let mut names = HashSet::new();

    for (j, template) in templates {
        let template_path = path.index(j);

        errors.extend(validate_template_fields(&template_path, template));

        if !template.name.is_empty() && !names.insert(template.name.as_str()) {
            errors.push(Error::duplicate(&template_path, &template.name));
        }

        errors.extend(validate_data_imports_satisfied(
            &template_path,
            scope,
            &exports,
            template,
        ));
        errors.extend(validate_target_imports_satisfied(
            &template_path,
            scope,
            &exports,
            template,
        ));

        errors.extend(exports.register(&template_path, scope, template));

        // Nested templates come after everything declared by the template
        // itself
        errors.extend(validate_nested_templates(&template_path, template));
    }

    errors
}

fn is_satisfied(
    scope: &Scope<'_>,
    exports: &ExportScope<'_>,
    kind: ImportType,
    name: &str,
) -> bool {
    let satisfied = scope.contains(kind, name) || exports.contains(kind, name);
    if !satisfied {
        trace!(%kind, name, "reference not found in scope");
    }
    satisfied
}

fn validate_data_imports_satisfied(
    path: &Path,
    scope: &Scope<'_>,
    exports: &ExportScope<'_>,
    template: &InstallationTemplate,
) -> ErrorList {
    let imports_path = path.child("imports").child("data");

    template
        .imports
        .data
        .iter()
        .enumerate()
        .filter_map(|(i, import)| {
            let data_ref = import.data_ref.as_deref().filter(|r| !r.is_empty())?;
            if is_satisfied(scope, exports, ImportType::Data, data_ref) {
                return None;
            }

            Some(Error::not_found(
                &imports_path.index(i).key(&import.name),
                data_ref,
                "no data import of the parent or data export of a previous subinstallation with this name",
            ))
        })
        .collect()
}

fn validate_target_imports_satisfied(
    path: &Path,
    scope: &Scope<'_>,
    exports: &ExportScope<'_>,
    template: &InstallationTemplate,
) -> ErrorList {
    let mut errors = ErrorList::new();
    let imports_path = path.child("imports").child("targets");

    for (i, import) in template.imports.targets.iter().enumerate() {
        let import_path = imports_path.index(i);
        let not_found = |reference: &str, kind: ImportType| {
            Error::not_found(
                &import_path.key(&import.name),
                reference,
                format!(
                    "no import of the parent or export of a previous subinstallation of type \
                     {kind} with this name"
                ),
            )
        };

        if let Some(target) = import.target.as_deref().filter(|t| !t.is_empty()) {
            let reference = TargetReference::parse(target);
            let kinds: &[ImportType] = match reference.suffix {
                None => &[ImportType::Target],
                // Integers are valid target map keys as well
                Some(Suffix::Index(_)) => &[ImportType::TargetList, ImportType::TargetMap],
                Some(Suffix::Key(_)) => &[ImportType::TargetMap],
            };

            if !kinds
                .iter()
                .any(|kind| is_satisfied(scope, exports, *kind, reference.name))
            {
                errors.push(not_found(target, kinds[0]));
            }
        }

        for (k, target) in import.targets.iter().flatten().enumerate() {
            if !target.is_empty() && !is_satisfied(scope, exports, ImportType::Target, target) {
                errors.push(Error::not_found(
                    &import_path.child("targets").index(k),
                    target,
                    "no target import of the parent or target export of a previous subinstallation with this name",
                ));
            }
        }

        for (key, target) in import.target_map.iter().flatten() {
            if !target.is_empty() && !is_satisfied(scope, exports, ImportType::Target, target) {
                errors.push(Error::not_found(
                    &import_path.child("targetMap").key(key),
                    target,
                    "no target import of the parent or target export of a previous subinstallation with this name",
                ));
            }
        }

        let references = [
            (&import.target_map_reference, ImportType::TargetMap),
            (&import.target_list_reference, ImportType::TargetList),
        ];
        for (reference, kind) in references {
            if let Some(reference) = reference
                .as_deref()
                .filter(|r| !r.is_empty() && !is_satisfied(scope, exports, kind, r))
            {
                errors.push(not_found(reference, kind));
            }
        }
    }

    errors
}
