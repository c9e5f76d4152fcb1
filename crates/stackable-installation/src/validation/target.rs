use tracing::{debug, instrument};

use crate::{
    crd::Target,
    field::{Error, ErrorList, Path},
    validation::installation::validate_local_secret_reference,
};

/// Validates a [`Target`]. The access configuration is given either inline
/// or by secret, not both.
#[instrument(skip_all, fields(target = target.metadata.name.as_deref().unwrap_or_default()))]
pub fn validate_target(target: &Target) -> ErrorList {
    let path = Path::new("spec");
    let mut errors = ErrorList::new();

    // The configuration holds credentials and is never part of a violation
    if target.spec.configuration.is_some() && target.spec.secret_ref.is_some() {
        errors.push(Error::invalid(
            &path,
            "config, secretRef",
            "either config or secretRef may be set, not both",
        ));
    }

    if let Some(secret_ref) = &target.spec.secret_ref {
        errors.extend(validate_local_secret_reference(
            secret_ref,
            &path.child("secretRef"),
        ));
    }

    debug!(violations = errors.len(), "validated target");
    errors
}
