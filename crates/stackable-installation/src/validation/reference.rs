//! Parsing of target references.
//!
//! A target import may reference a whole target, or a single element of a
//! target list (`my-list[0]`) or target map (`my-map[key]`):
//!
//! ```text
//! reference := name ( '[' suffix ']' )?
//! suffix    := index | key
//! ```

use std::{fmt::Display, sync::LazyLock};

use regex::Regex;

static TARGET_REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[\]]+)\[([^\[\]]+)\]$").expect("failed to compile target reference regex")
});

/// A parsed target reference, borrowing from the referencing string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetReference<'a> {
    /// The name of the referenced symbol.
    pub name: &'a str,

    /// The element of a target list or map, [`None`] for a bare reference.
    pub suffix: Option<Suffix<'a>>,
}

/// The element selector of a [`TargetReference`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suffix<'a> {
    /// Element of a target list, or of a target map whose key is an
    /// integer.
    Index(usize),

    /// Element of a target map.
    Key(&'a str),
}

impl<'a> TargetReference<'a> {
    /// Parses `reference`. This never fails, anything not matching the
    /// grammar is a bare name.
    pub fn parse(reference: &'a str) -> Self {
        let Some(captures) = TARGET_REFERENCE_REGEX.captures(reference) else {
            return Self {
                name: reference,
                suffix: None,
            };
        };

        // Both groups are mandatory in the expression
        let (Some(name), Some(suffix)) = (captures.get(1), captures.get(2)) else {
            return Self {
                name: reference,
                suffix: None,
            };
        };
        let suffix = suffix.as_str();

        Self {
            name: name.as_str(),
            suffix: Some(match suffix.parse::<usize>() {
                Ok(index) => Suffix::Index(index),
                Err(_) => Suffix::Key(suffix),
            }),
        }
    }
}

impl Display for TargetReference<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.suffix {
            None => f.write_str(self.name),
            Some(Suffix::Index(index)) => write!(f, "{name}[{index}]", name = self.name),
            Some(Suffix::Key(key)) => write!(f, "{name}[{key}]", name = self.name),
        }
    }
}
