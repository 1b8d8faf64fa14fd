// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opt-in best-effort decoding: keep the raw payload next to the result.

use crate::decoder::{decode_str, Decode};
use crate::error::DecodeError;
use crate::registry::Registry;

/// Raw payload plus the outcome of decoding it.
///
/// Used by call sites that must keep the original text for diagnostics even
/// when decoding fails (mbean and query-detail endpoints). Nothing is thrown;
/// the caller inspects [`BestEffort::is_success`].
#[derive(Debug, Clone)]
pub struct BestEffort<T> {
    raw: String,
    result: Result<T, DecodeError>,
}

impl<T> BestEffort<T> {
    /// Original payload text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `true` when decoding succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Decoded value, if any.
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// Captured failure, if any.
    pub fn error(&self) -> Option<&DecodeError> {
        self.result.as_ref().err()
    }

    /// Drop the raw payload and keep the result.
    pub fn into_result(self) -> Result<T, DecodeError> {
        self.result
    }

    /// Split into raw payload and result.
    pub fn into_parts(self) -> (String, Result<T, DecodeError>) {
        (self.raw, self.result)
    }
}

/// Decode `raw`, capturing any failure instead of returning it.
pub fn decode_best_effort<T: Decode>(registry: &Registry, raw: impl Into<String>) -> BestEffort<T> {
    let raw = raw.into();
    let result = decode_str(registry, &raw);
    BestEffort { raw, result }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_raw_payload() {
        let out = decode_best_effort::<u32>(&Registry::default(), "-3");
        assert!(!out.is_success());
        assert_eq!(out.raw(), "-3");
        assert!(out.value().is_none());
        assert!(out.error().unwrap().validation().is_some());
    }

    #[test]
    fn success_exposes_value() {
        let out = decode_best_effort::<Vec<String>>(&Registry::default(), r#"["a","b"]"#);
        assert!(out.is_success());
        assert_eq!(out.value().unwrap().len(), 2);
        let (raw, result) = out.into_parts();
        assert_eq!(raw, r#"["a","b"]"#);
        assert!(result.is_ok());
    }
}
