//! Semantic validation of installations, blueprints and targets.
//!
//! All validators are pure functions over borrowed input. They never stop at
//! the first problem but return every violation found as a
//! [`field::ErrorList`](crate::field::ErrorList), an empty list means the
//! input is valid.

pub mod blueprint;
pub mod cron;
pub mod definitions;
pub mod installation;
pub mod names;
pub mod one_of;
pub mod reference;
pub mod scope;
pub mod target;
pub mod template;

pub use blueprint::validate_blueprint;
pub use definitions::{
    validate_blueprint_export_definitions, validate_blueprint_import_definitions,
    validate_template_executor_list,
};
pub use installation::{
    validate_installation, validate_installation_spec, validate_local_config_map_reference,
    validate_local_secret_reference, validate_object_reference, validate_object_reference_list,
};
pub use one_of::validate_exactly_one_of;
pub use scope::validate_installation_templates;
pub use target::validate_target;
pub use template::{validate_installation_template, validate_subinstallations};
