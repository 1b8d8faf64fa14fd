// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Data sizes and durations as the engine prints them (`"1.50MB"`, `"12ms"`).
//!
//! Both travel as `<magnitude><unit>` strings. Integral magnitudes print
//! without decimals; everything else prints with two.

use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError, ValidationReason};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

fn split_magnitude<'a>(field: &'static str, text: &'a str) -> Result<(f64, &'a str), ValidationError> {
    let text = text.trim();
    if text.starts_with('-') {
        return Err(ValidationError::invalid(field, format!("{text:?} is negative")));
    }
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(|| ValidationError::invalid(field, format!("{text:?} has no unit")))?;
    let (number, unit) = text.split_at(split);
    let magnitude: f64 = number
        .parse()
        .map_err(|_| ValidationError::invalid(field, format!("{text:?} has no magnitude")))?;
    Ok((magnitude, unit.trim_start()))
}

fn write_magnitude(f: &mut fmt::Formatter<'_>, magnitude: f64, unit: &str) -> fmt::Result {
    if magnitude.fract() == 0.0 {
        write!(f, "{magnitude:.0}{unit}")
    } else {
        write!(f, "{magnitude:.2}{unit}")
    }
}

/// Unit of a [`DataSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataUnit {
    /// Bytes.
    Byte,
    /// 2^10 bytes.
    Kilobyte,
    /// 2^20 bytes.
    Megabyte,
    /// 2^30 bytes.
    Gigabyte,
    /// 2^40 bytes.
    Terabyte,
    /// 2^50 bytes.
    Petabyte,
}

impl DataUnit {
    const ALL: [Self; 6] = [
        Self::Byte,
        Self::Kilobyte,
        Self::Megabyte,
        Self::Gigabyte,
        Self::Terabyte,
        Self::Petabyte,
    ];

    /// Suffix as printed by the engine.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Byte => "B",
            Self::Kilobyte => "kB",
            Self::Megabyte => "MB",
            Self::Gigabyte => "GB",
            Self::Terabyte => "TB",
            Self::Petabyte => "PB",
        }
    }

    /// Bytes per unit.
    pub const fn factor(self) -> u64 {
        1 << (10 * self as u32)
    }
}

/// A byte quantity with its display unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataSize {
    magnitude: f64,
    unit: DataUnit,
}

impl DataSize {
    /// Build from a non-negative, finite magnitude.
    pub fn new(magnitude: f64, unit: DataUnit) -> Result<Self, ValidationError> {
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(ValidationError::invalid(
                "dataSize",
                format!("{magnitude} is not a non-negative finite size"),
            ));
        }
        Ok(Self { magnitude, unit })
    }

    /// Byte count in the `B` unit.
    #[allow(clippy::cast_precision_loss)]
    pub fn of_bytes(bytes: u64) -> Self {
        Self {
            magnitude: bytes as f64,
            unit: DataUnit::Byte,
        }
    }

    /// Magnitude in [`DataSize::unit`].
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Display unit.
    pub fn unit(&self) -> DataUnit {
        self.unit
    }

    /// Size in bytes, rounded to the nearest byte.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn to_bytes(&self) -> u64 {
        (self.magnitude * self.unit.factor() as f64).round() as u64
    }
}

impl FromStr for DataSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (magnitude, suffix) = split_magnitude("dataSize", s)?;
        let unit = DataUnit::ALL
            .into_iter()
            .find(|u| u.suffix() == suffix)
            .ok_or_else(|| {
                ValidationError::new("dataSize", ValidationReason::UnknownName(suffix.to_owned()))
            })?;
        Self::new(magnitude, unit)
    }
}

impl fmt::Display for DataSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_magnitude(f, self.magnitude, self.unit.suffix())
    }
}

/// Unit of a [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    /// Nanoseconds.
    Nanos,
    /// Microseconds.
    Micros,
    /// Milliseconds.
    Millis,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl TimeUnit {
    const ALL: [Self; 7] = [
        Self::Nanos,
        Self::Micros,
        Self::Millis,
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::Days,
    ];

    /// Suffix as printed by the engine.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Nanos => "ns",
            Self::Micros => "us",
            Self::Millis => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }

    /// Milliseconds per unit.
    pub const fn millis(self) -> f64 {
        match self {
            Self::Nanos => 1e-6,
            Self::Micros => 1e-3,
            Self::Millis => 1.0,
            Self::Seconds => 1e3,
            Self::Minutes => 6e4,
            Self::Hours => 3.6e6,
            Self::Days => 8.64e7,
        }
    }
}

/// A time span with its display unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    magnitude: f64,
    unit: TimeUnit,
}

impl Duration {
    /// Build from a non-negative, finite magnitude.
    pub fn new(magnitude: f64, unit: TimeUnit) -> Result<Self, ValidationError> {
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(ValidationError::invalid(
                "duration",
                format!("{magnitude} is not a non-negative finite duration"),
            ));
        }
        Ok(Self { magnitude, unit })
    }

    /// Magnitude in [`Duration::unit`].
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Display unit.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Length in (fractional) milliseconds.
    pub fn to_millis(&self) -> f64 {
        self.magnitude * self.unit.millis()
    }

    /// Convert to a standard duration, or `None` when the span does not fit.
    pub fn to_std(&self) -> Option<std::time::Duration> {
        std::time::Duration::try_from_secs_f64(self.to_millis() / 1e3).ok()
    }
}

impl FromStr for Duration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (magnitude, suffix) = split_magnitude("duration", s)?;
        let unit = TimeUnit::ALL
            .into_iter()
            .find(|u| u.suffix() == suffix)
            .ok_or_else(|| {
                ValidationError::new("duration", ValidationReason::UnknownName(suffix.to_owned()))
            })?;
        Self::new(magnitude, unit)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_magnitude(f, self.magnitude, self.unit.suffix())
    }
}

macro_rules! text_scalar {
    ($($name:ident),+) => {$(
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl Decode for $name {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let text = String::decode(value, cx)?;
                text.parse().map_err(|e: ValidationError| cx.invalid(e.reason))
            }
        }
    )+};
}

text_scalar!(DataSize, Duration);
