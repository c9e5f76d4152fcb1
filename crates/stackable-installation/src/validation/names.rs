//! Name and key grammars shared by the validators.
//!
//! This is adapted from Kubernetes.
//! See apimachinery/pkg/util/validation/validation.go and
//! apimachinery/pkg/api/validation/generic.go in the Kubernetes source.

use std::{fmt::Display, sync::LazyLock};

use const_format::concatcp;
use regex::Regex;
use snafu::Snafu;

/// Maximum length of a DNS-1123 label.
pub const DNS_1123_LABEL_MAX_LENGTH: usize = 63;
const DNS_1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const DNS_1123_LABEL_ERROR_MSG: &str = "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character";

// The length restriction is part of the expression.
const TARGET_MAP_KEY_FMT: &str = concatcp!(
    "[a-z0-9]([a-z0-9.-]{0,",
    DNS_1123_LABEL_MAX_LENGTH - 2,
    "}[a-z0-9])?"
);
pub const TARGET_MAP_KEY_ERROR_MSG: &str = "key must contain only lower-case alphanumeric characters, dots, or dashes; it must begin and end with a lower-case alphanumeric character; it must not be empty, and not longer than 63 characters";

// Lazily initialized regular expressions
static DNS_1123_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{DNS_1123_LABEL_FMT}$"))
        .expect("failed to compile DNS-1123 label regex")
});

static TARGET_MAP_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{TARGET_MAP_KEY_FMT}$")).expect("failed to compile target map key regex")
});

type Result<T = (), E = Errors> = std::result::Result<T, E>;

/// A collection of errors discovered while checking a single value.
#[derive(Debug)]
pub struct Errors(Vec<Error>);

impl Display for Errors {
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

impl std::error::Error for Errors {}

/// A single grammar violation.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(transparent)]
    Regex { source: RegexError },

    #[snafu(display("must be no more than {max_length} bytes"))]
    TooLong { length: usize, max_length: usize },
}

#[derive(Debug)]
pub struct RegexError {
    /// The primary error message.
    msg: &'static str,

    /// The regex that the input must match.
    regex: &'static str,

    /// Examples of valid inputs (if non-empty).
    examples: &'static [&'static str],
}

impl Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            msg,
            regex,
            examples,
        } = self;
        write!(f, "{msg} (")?;
        for (i, example) in examples.iter().enumerate() {
            let prefix = match i {
                0 => "e.g.",
                _ => "or",
            };
            write!(f, "{prefix} {example:?}, ")?;
        }
        write!(f, "regex used for validation is {regex:?})")
    }
}

impl std::error::Error for RegexError {}

/// Returns the detail message used when a value exceeds `max_length`.
pub fn max_len_error(max_length: usize) -> String {
    format!("must be no more than {max_length} bytes")
}

/// Returns [`Ok`] if `value`'s length fits within `max_length`.
fn validate_str_length(value: &str, max_length: usize) -> Result<(), Error> {
    if value.len() > max_length {
        TooLongSnafu {
            length: value.len(),
            max_length,
        }
        .fail()
    } else {
        Ok(())
    }
}

/// Returns [`Ok`] if `value` matches `regex`.
fn validate_str_regex(
    value: &str,
    regex: &'static Regex,
    error_msg: &'static str,
    examples: &'static [&'static str],
) -> Result<(), Error> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(RegexError {
            msg: error_msg,
            regex: regex
                .as_str()
                // Clean up start/end-of-line markers
                .trim_start_matches('^')
                .trim_end_matches('$'),
            examples,
        }
        .into())
    }
}

/// Returns [`Ok`] if *all* validations are [`Ok`], otherwise returns all errors.
fn validate_all(validations: impl IntoIterator<Item = Result<(), Error>>) -> Result {
    let errors = validations
        .into_iter()
        .filter_map(|res| res.err())
        .collect::<Vec<_>>();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Errors(errors))
    }
}

/// Tests for a string that conforms to the definition of a lowercase label in
/// DNS (RFC 1123), as used for Kubernetes object names.
pub fn is_dns_1123_label(value: &str) -> Result {
    validate_all([
        validate_str_length(value, DNS_1123_LABEL_MAX_LENGTH),
        validate_str_regex(
            value,
            &DNS_1123_LABEL_REGEX,
            DNS_1123_LABEL_ERROR_MSG,
            &["my-name", "123-abc"],
        ),
    ])
}

/// Tests whether `value` is usable as key of a target map import.
pub fn is_target_map_key(value: &str) -> bool {
    TARGET_MAP_KEY_REGEX.is_match(value)
}

// mask_trailing_dash replaces the final character of a string with a label safe
// value if is a dash.
fn mask_trailing_dash(mut name: String) -> String {
    if name.ends_with('-') {
        name.pop();
        name.push('a');
    }

    name
}

/// Checks whether the passed in name is a valid object name.
///
/// # Arguments
///
/// * `name` - is the name to check for validity
/// * `prefix` - indicates whether `name` is just a prefix (ending in a dash, which would
///   otherwise not be legal at the end)
pub fn name_is_dns_label(name: &str, prefix: bool) -> Result {
    let mut name = name.to_owned();
    if prefix {
        name = mask_trailing_dash(name);
    }

    is_dns_1123_label(&name)
}
