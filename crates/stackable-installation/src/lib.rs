//! Validation of installation trees before anything is deployed.
//!
//! An [`Installation`](crd::Installation) deploys a [`Blueprint`](crd::Blueprint)
//! which declares typed imports and exports and may consist of nested
//! installation templates. This crate checks that such a tree is well formed
//! and that every import of every nested template can be satisfied by
//! something in its scope. It never renders templates, touches a cluster or
//! resolves actual values.
//!
//! Violations are collected in a [`field::ErrorList`], see [`validation`] for
//! the entry points.

pub mod crd;
pub mod field;
pub mod validation;
pub mod yaml;

// External re-exports
pub use k8s_openapi;
pub use kube;
pub use schemars;
// Internal re-exports
pub use yaml::CustomResourceExt;
