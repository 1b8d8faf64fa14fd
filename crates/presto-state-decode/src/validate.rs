// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Construction-time checks shared by value-model constructors.
//!
//! Constructors accept wire-typed signed integers and narrow them here, so a
//! value built in code and a value decoded from a payload pass through the
//! same gate.

use crate::error::{ValidationError, ValidationReason};

/// Narrow a count or byte size to `u64`, rejecting negatives.
pub fn non_negative(field: &'static str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::new(field, ValidationReason::Negative(value)))
}

/// Narrow a count to `u32`, rejecting negatives and values above `u32::MAX`.
pub fn non_negative_u32(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    let wide = non_negative(field, value)?;
    u32::try_from(wide).map_err(|_| {
        ValidationError::new(
            field,
            ValidationReason::OutOfRange {
                value: wide.to_string(),
                target: "u32",
            },
        )
    })
}

/// Require a non-empty string.
pub fn non_empty(field: &'static str, value: impl Into<String>) -> Result<String, ValidationError> {
    let value = value.into();
    if value.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::Empty));
    }
    Ok(value)
}

/// Require `value <= bound`, naming `field` on failure.
pub fn at_most(
    field: &'static str,
    value: u64,
    bound_field: &'static str,
    bound: u64,
) -> Result<(), ValidationError> {
    if value > bound {
        return Err(ValidationError::invalid(
            field,
            format!("{value} exceeds {bound_field} ({bound})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn negative_count_names_field() {
        let err = non_negative("bufferedPages", -1).unwrap_err();
        assert_eq!(err.field, "bufferedPages");
        assert_eq!(err.reason, ValidationReason::Negative(-1));
    }

    #[test]
    fn u32_overflow_is_out_of_range() {
        let err = non_negative_u32("partition", i64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err.reason, ValidationReason::OutOfRange { target: "u32", .. }));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(
            non_empty("bufferId", "").unwrap_err().reason,
            ValidationReason::Empty
        );
        assert_eq!(non_empty("bufferId", "0").unwrap(), "0");
    }

    #[test]
    fn bound_violation_mentions_both_fields() {
        let err = at_most("completedTasks", 5, "totalTasks", 4).unwrap_err();
        assert_eq!(err.to_string(), "field `completedTasks`: 5 exceeds totalTasks (4)");
    }

    proptest! {
        #[test]
        fn non_negative_accepts_exactly_the_non_negatives(v in any::<i64>()) {
            prop_assert_eq!(non_negative("n", v).is_ok(), v >= 0);
        }
    }
}
