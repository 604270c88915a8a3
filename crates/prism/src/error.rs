//! Error taxonomy shared by the conversion, generation, and registry layers.
//!
//! Every failure in this crate is returned as a value:
//!
//! - [`ParseError`] - a color literal that is not of an accepted shape
//! - [`RangeViolation`] - a well-formed OKLCH component outside its domain
//! - [`OklchError`] - either of the above, from the combined constructor
//! - [`MarkerError`] - the generated region of a token file cannot be located
//! - [`ProcessError`] - one diagnostic from a generation pass
//! - [`ResolveError`] - a variable reference chain that cannot be followed
//!
//! [`UnresolvedReference`] is a warning, not an error: it never fails an
//! operation and is only collected for reporting.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

/// Error returned when a color literal does not have an accepted shape.
///
/// # Example
///
/// ```rust
/// use prism::{ParseError, parse_oklch};
///
/// let err = parse_oklch("oklch(0.5 0.1)").unwrap_err();
/// assert!(matches!(err, ParseError::Shape { .. }));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text is not of the expected form at all.
    #[error("expected {expected}, got {input:?}")]
    Shape {
        expected: &'static str,
        input: String,
    },
    /// A component is not a decimal number.
    #[error("invalid number {component:?} in {input:?}")]
    Number { component: String, input: String },
    /// A component parsed, but is NaN or infinite.
    #[error("non-finite component {component:?} in {input:?}")]
    NonFinite { component: String, input: String },
}

impl ParseError {
    pub(crate) fn shape(expected: &'static str, input: &str) -> Self {
        Self::Shape {
            expected,
            input: input.to_string(),
        }
    }
}

/// The OKLCH component a [`RangeViolation`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OklchField {
    Lightness,
    Chroma,
    Hue,
}

impl fmt::Display for OklchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lightness => "lightness",
            Self::Chroma => "chroma",
            Self::Hue => "hue",
        };
        f.write_str(name)
    }
}

/// A well-formed OKLCH component that lies outside its allowed interval.
///
/// Validation collects one violation per offending field, so a single
/// definition can yield several.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field} {value} is outside [{min}, {max}]")]
pub struct RangeViolation {
    pub field: OklchField,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeViolation {
    pub(crate) fn check(
        field: OklchField,
        value: f64,
        range: &RangeInclusive<f64>,
    ) -> Option<Self> {
        if range.contains(&value) {
            None
        } else {
            Some(Self {
                field,
                value,
                min: *range.start(),
                max: *range.end(),
            })
        }
    }
}

fn join_violations(violations: &[RangeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error from constructing a validated [`OklchColor`](crate::OklchColor).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OklchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("out of range: {}", join_violations(.0))]
    Range(Vec<RangeViolation>),
}

impl From<Vec<RangeViolation>> for OklchError {
    fn from(violations: Vec<RangeViolation>) -> Self {
        Self::Range(violations)
    }
}

/// The generated region of a token file could not be located.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("generated region start marker {0:?} not found")]
    MissingStart(String),
    #[error("generated region end marker {0:?} not found")]
    MissingEnd(String),
    #[error("generated region end marker {end:?} appears before start marker {start:?}")]
    OutOfOrder { start: String, end: String },
}

/// One diagnostic produced by a generation pass.
///
/// Definition errors exclude a single definition from the generated region;
/// marker errors abort the splice and leave the text untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("line {line}: --{name}: {error}")]
    Definition {
        line: usize,
        name: String,
        #[source]
        error: OklchError,
    },
    #[error(transparent)]
    Markers(#[from] MarkerError),
}

impl ProcessError {
    /// Returns true if this error prevented the generated region from being written.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Markers(_))
    }
}

/// A variable reference chain that cannot be followed to a concrete value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("variable --{0} is not defined")]
    Missing(String),
    #[error("reference cycle: {}", format_cycle(.0))]
    Cycle(Vec<String>),
    #[error("reference chain from --{name} exceeds {depth} levels")]
    TooDeep { name: String, depth: usize },
    #[error("expansion of --{name} exceeds {limit} bytes")]
    TooLong { name: String, limit: usize },
}

fn format_cycle(path: &[String]) -> String {
    path.iter()
        .map(|name| format!("--{name}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A `var()` reference whose target is not known to the style provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UnresolvedReference {
    /// The variable whose value contains the reference.
    pub variable: String,
    /// The referenced name that could not be found.
    pub reference: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--{} references undefined --{}",
            self.variable, self.reference
        )
    }
}
