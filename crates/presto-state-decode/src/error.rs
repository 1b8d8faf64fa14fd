// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy shared by the resolver, the decoder and model constructors.

use crate::path::Path;
use std::fmt;
use thiserror::Error;

/// Why a single field failed its construction-time invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// A required field was absent (or explicitly `null`).
    Missing,
    /// A count or byte size was negative.
    Negative(i64),
    /// A numeric value does not fit the target range.
    OutOfRange {
        /// Textual form of the offending value.
        value: String,
        /// Name of the target range (e.g. `u32`).
        target: &'static str,
    },
    /// A textual identifier was empty.
    Empty,
    /// A closed enumeration received a name outside its value space.
    UnknownName(String),
    /// Any other invariant violation, with a short detail.
    Invalid(String),
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("required field is missing"),
            Self::Negative(v) => write!(f, "must be non-negative, got {v}"),
            Self::OutOfRange { value, target } => write!(f, "{value} is out of range for {target}"),
            Self::Empty => f.write_str("must not be empty"),
            Self::UnknownName(name) => write!(f, "unknown name {name:?}"),
            Self::Invalid(detail) => f.write_str(detail),
        }
    }
}

/// A decoded or constructed field violates a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: {reason}")]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// What went wrong.
    pub reason: ValidationReason,
}

impl ValidationError {
    /// Build an error for `field`.
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }

    /// Shorthand for [`ValidationReason::Missing`].
    pub fn missing(field: &'static str) -> Self {
        Self::new(field, ValidationReason::Missing)
    }

    /// Shorthand for [`ValidationReason::Invalid`].
    pub fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::Invalid(detail.into()))
    }
}

/// Interface/variant pair attached to validation failures raised inside a
/// resolved variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantRef {
    /// Capability interface name.
    pub interface: &'static str,
    /// Selected variant name.
    pub variant: &'static str,
}

impl fmt::Display for VariantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.interface, self.variant)
    }
}

/// Classification of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// A field violated a structural invariant.
    #[error("validation failed: {error}{}", in_variant(.variant))]
    Validation {
        /// Underlying field failure.
        error: ValidationError,
        /// Innermost resolved variant, when the failure happened inside one.
        variant: Option<VariantRef>,
    },
    /// No registered variant matches the payload.
    #[error("no {interface} variant matches: {detail}")]
    UnknownVariant {
        /// Capability interface name.
        interface: &'static str,
        /// Tag value or key set that failed to match.
        detail: String,
    },
    /// More than one maximal structural candidate remained.
    #[error("ambiguous {interface} payload, candidates: {}", .candidates.join(", "))]
    AmbiguousVariant {
        /// Capability interface name.
        interface: &'static str,
        /// Names of the maximal candidates, in registration order.
        candidates: Vec<&'static str>,
    },
    /// Input is not JSON or has the wrong basic shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

fn in_variant(variant: &Option<VariantRef>) -> String {
    variant.map(|v| format!(" (in {v})")).unwrap_or_default()
}

/// A decode failure together with the field chain from the root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {path}")]
pub struct DecodeError {
    /// Field chain from the payload root to the failing value.
    pub path: Path,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// Build an error at `path`.
    pub fn new(path: Path, kind: DecodeErrorKind) -> Self {
        Self { path, kind }
    }

    /// Malformed-payload error at the root (used for parse failures).
    pub fn malformed_root(reason: impl Into<String>) -> Self {
        Self::new(Path::root(), DecodeErrorKind::Malformed(reason.into()))
    }

    /// Returns the underlying validation failure, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match &self.kind {
            DecodeErrorKind::Validation { error, .. } => Some(error),
            _ => None,
        }
    }

    /// `true` for [`DecodeErrorKind::Malformed`].
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::Malformed(_))
    }
}
