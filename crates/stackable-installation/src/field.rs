//! Path-qualified validation errors.
//!
//! This is adapted from the Kubernetes field error package. See
//! apimachinery/pkg/util/validation/field in the Kubernetes source.
//!
//! Every validator in [`crate::validation`] returns an [`ErrorList`]. A single
//! [`Error`] is anchored to a structural location described by a [`Path`], e.g.
//! `spec.imports.targets[0][my-import]`.

use std::fmt::{Display, Write as _};

use serde::Serialize;
use strum::Display as StrumDisplay;

/// A structural location inside a validated object.
///
/// A [`Path`] is an immutable value. [`Path::child`], [`Path::index`] and
/// [`Path::key`] return new paths and leave `self` untouched, which makes it
/// cheap to hand a path down into nested validators.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    root: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Segment {
    Child(String),
    Index(usize),
    Key(String),
}

impl Path {
    /// Creates a new root path, e.g. `Path::new("spec")`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    /// Returns a new path pointing to the field `name` below `self`.
    pub fn child(&self, name: impl Into<String>) -> Self {
        self.with(Segment::Child(name.into()))
    }

    /// Returns a new path pointing to the sequence element at `index`.
    pub fn index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    /// Returns a new path pointing to the mapping element (or named element)
    /// identified by `key`.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(Segment::Key(key.into()))
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);

        Self {
            root: self.root.clone(),
            segments,
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buffer = self.root.clone();

        for segment in &self.segments {
            match segment {
                Segment::Child(name) => {
                    if !buffer.is_empty() {
                        buffer.push('.');
                    }
                    buffer.push_str(name);
                }
                Segment::Index(index) => write!(buffer, "[{index}]")?,
                Segment::Key(key) => write!(buffer, "[{key}]")?,
            }
        }

        f.write_str(&buffer)
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The kind of a validation [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, StrumDisplay)]
pub enum ErrorType {
    /// A mandatory field or name is absent.
    #[strum(to_string = "Required value")]
    Required,

    /// A present value violates a format or mutual-exclusion rule.
    #[strum(to_string = "Invalid value")]
    Invalid,

    /// A value is syntactically valid but not allowed in this context.
    #[strum(to_string = "Forbidden")]
    Forbidden,

    /// A name collides with another one in the same uniqueness scope.
    #[strum(to_string = "Duplicate value")]
    Duplicate,

    /// A reference cannot be resolved against anything in scope.
    #[strum(to_string = "Not found")]
    NotFound,
}

/// A single violation found during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    /// What kind of rule was violated.
    #[serde(rename = "type")]
    pub error_type: ErrorType,

    /// The rendered [`Path`] of the offending field.
    pub field: String,

    /// The offending value, if it is useful to show it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Free-form detail, may be empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl Error {
    fn new(
        error_type: ErrorType,
        path: &Path,
        value: Option<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            field: path.to_string(),
            value,
            detail: detail.into(),
        }
    }

    pub fn required(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Required, path, None, detail)
    }

    pub fn invalid(path: &Path, value: impl Display, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Invalid, path, Some(value.to_string()), detail)
    }

    pub fn forbidden(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Forbidden, path, None, detail)
    }

    pub fn duplicate(path: &Path, value: impl Display) -> Self {
        Self::new(ErrorType::Duplicate, path, Some(value.to_string()), "")
    }

    pub fn not_found(path: &Path, value: impl Display, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::NotFound, path, Some(value.to_string()), detail)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{field}: {error_type}", field = self.field, error_type = self.error_type)?;

        if let Some(value) = &self.value {
            write!(f, ": {value:?}")?;
        }

        if !self.detail.is_empty() {
            write!(f, ": {detail}", detail = self.detail)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

/// An ordered collection of [`Error`]s.
///
/// Validators never stop at the first violation. They append to an
/// [`ErrorList`] and keep going, so that callers see every problem at once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorList(Vec<Error>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Returns [`Ok`] if no violations were collected, the list itself
    /// otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Extend<Error> for ErrorList {
    fn extend<T: IntoIterator<Item = Error>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Error> for ErrorList {
    fn from_iter<T: IntoIterator<Item = Error>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ErrorList {
    type IntoIter = std::vec::IntoIter<Error>;
    type Item = Error;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type IntoIter = std::slice::Iter<'a, Error>;
    type Item = &'a Error;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Error> for ErrorList {
    fn from(value: Error) -> Self {
        Self(vec![value])
    }
}

impl Display for ErrorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            let prefix = match i {
                0 => "",
                _ => ", ",
            };
            write!(f, "{prefix}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}
