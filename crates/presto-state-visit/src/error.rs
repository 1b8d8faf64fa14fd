// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Visitor failures.

use thiserror::Error;

/// Why a visit could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisitError {
    /// The visitor has no handling for this node kind.
    #[error("unsupported node kind `{kind}`")]
    Unsupported {
        /// Wire tag of the node.
        kind: &'static str,
    },
    /// A placeholder refers past the end of the supplied parameters.
    #[error("parameter {position} requested but only {available} supplied")]
    MissingParameter {
        /// Placeholder position.
        position: u32,
        /// Number of supplied parameters.
        available: usize,
    },
    /// A supplied parameter has no SQL literal form.
    #[error("parameter {position} cannot be rendered as a literal")]
    InvalidParameter {
        /// Placeholder position.
        position: u32,
    },
}
