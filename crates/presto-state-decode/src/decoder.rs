// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tree decoder: recursive, path-tracking conversion of a JSON value into a
//! typed tree.
//!
//! Every type that can appear in a coordinator payload implements [`Decode`].
//! Composite impls pull their fields through the [`Decoder`] helpers, which
//! maintain the field chain so that the first failure anywhere in the tree
//! is reported with its full path. Interface-typed fields go through
//! [`Decoder::resolve`].

use crate::error::{DecodeError, DecodeErrorKind, ValidationError, ValidationReason};
use crate::path::{Path, PathSegment};
use crate::registry::{Interface, Registry};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A JSON object as seen by [`Decode`] impls.
pub type Object = Map<String, Value>;

/// Types that can be rebuilt from a coordinator JSON value.
pub trait Decode: Sized {
    /// Decode `value`; `cx` carries the registry and the current path.
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError>;
}

/// Decode state for one call: the registry and the field chain.
#[derive(Debug)]
pub struct Decoder<'r> {
    registry: &'r Registry,
    path: Path,
}

impl<'r> Decoder<'r> {
    /// Start decoding at the payload root.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            path: Path::root(),
        }
    }

    /// Registry used for interface-typed fields.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Field chain to the value currently being decoded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode `value` as `T` at the current path.
    pub fn decode<T: Decode>(&mut self, value: &Value) -> Result<T, DecodeError> {
        T::decode(value, self)
    }

    /// Resolve an interface-typed value to its concrete variant.
    pub fn resolve<I: Interface + ?Sized>(&mut self, value: &Value) -> Result<I::Value, DecodeError> {
        crate::resolve::resolve::<I>(self, value)
    }

    /// View `value` as an object, or fail with a malformed-payload error.
    pub fn object<'v>(&self, value: &'v Value) -> Result<&'v Object, DecodeError> {
        value
            .as_object()
            .ok_or_else(|| self.malformed(format!("expected object, found {}", kind_of(value))))
    }

    /// Decode a required field. Absent and `null` both fail with
    /// [`ValidationReason::Missing`].
    pub fn required<T: Decode>(&mut self, obj: &Object, field: &'static str) -> Result<T, DecodeError> {
        match obj.get(field) {
            Some(value) if !value.is_null() => self.scoped(field, |cx| T::decode(value, cx)),
            _ => Err(DecodeError::new(
                self.path.child(field),
                DecodeErrorKind::Validation {
                    error: ValidationError::missing(field),
                    variant: None,
                },
            )),
        }
    }

    /// Decode an optional field; absent and `null` yield `None`.
    pub fn optional<T: Decode>(
        &mut self,
        obj: &Object,
        field: &'static str,
    ) -> Result<Option<T>, DecodeError> {
        match obj.get(field) {
            Some(value) if !value.is_null() => self.scoped(field, |cx| T::decode(value, cx)).map(Some),
            _ => Ok(None),
        }
    }

    /// Decode a field that the engine omits when it holds its default
    /// (e.g. an empty stack trace).
    pub fn defaulted<T: Decode + Default>(
        &mut self,
        obj: &Object,
        field: &'static str,
    ) -> Result<T, DecodeError> {
        Ok(self.optional(obj, field)?.unwrap_or_default())
    }

    /// Run `f` with `seg` pushed onto the path.
    pub fn scoped<T>(
        &mut self,
        seg: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.path.push(seg.into());
        let out = f(self);
        self.path.pop();
        out
    }

    /// Lift a constructor's validation result, locating the failure at the
    /// offending field below the current path.
    pub fn validated<T>(&self, result: Result<T, ValidationError>) -> Result<T, DecodeError> {
        result.map_err(|error| {
            DecodeError::new(
                self.path.child(error.field),
                DecodeErrorKind::Validation {
                    error,
                    variant: None,
                },
            )
        })
    }

    /// Validation failure for the value at the current path.
    pub fn invalid(&self, reason: ValidationReason) -> DecodeError {
        DecodeError::new(
            self.path.clone(),
            DecodeErrorKind::Validation {
                error: ValidationError::new(self.current_field(), reason),
                variant: None,
            },
        )
    }

    /// Malformed-payload failure at the current path.
    pub fn malformed(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::new(self.path.clone(), DecodeErrorKind::Malformed(reason.into()))
    }

    /// Any failure at the current path.
    pub fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(self.path.clone(), kind)
    }

    /// Innermost named field on the path (`$` at the root).
    pub fn current_field(&self) -> &'static str {
        self.path
            .segments()
            .iter()
            .rev()
            .find_map(|seg| match seg {
                PathSegment::Field(name) => Some(*name),
                _ => None,
            })
            .unwrap_or("$")
    }
}

/// JSON type name used in malformed-payload messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a whole payload that is already parsed.
pub fn decode_value<T: Decode>(registry: &Registry, value: &Value) -> Result<T, DecodeError> {
    Decoder::new(registry).decode(value)
}

/// Parse and decode JSON text.
pub fn decode_str<T: Decode>(registry: &Registry, text: &str) -> Result<T, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::malformed_root(e.to_string()))?;
    decode_value(registry, &value)
}

/// Parse and decode JSON bytes.
pub fn decode_slice<T: Decode>(registry: &Registry, bytes: &[u8]) -> Result<T, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::malformed_root(e.to_string()))?;
    decode_value(registry, &value)
}

// --- Primitive impls -------------------------------------------------------

impl Decode for Value {
    fn decode(value: &Value, _cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

impl Decode for bool {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        value
            .as_bool()
            .ok_or_else(|| cx.malformed(format!("expected boolean, found {}", kind_of(value))))
    }
}

impl Decode for String {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| cx.malformed(format!("expected string, found {}", kind_of(value))))
    }
}

impl Decode for f64 {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        value
            .as_f64()
            .ok_or_else(|| cx.malformed(format!("expected number, found {}", kind_of(value))))
    }
}

impl Decode for i64 {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let Value::Number(n) = value else {
            return Err(cx.malformed(format!("expected integer, found {}", kind_of(value))));
        };
        if let Some(i) = n.as_i64() {
            return Ok(i);
        }
        match n.as_u64() {
            Some(u) => Err(cx.invalid(ValidationReason::OutOfRange {
                value: u.to_string(),
                target: "i64",
            })),
            None => Err(cx.malformed(format!("expected integer, found float {n}"))),
        }
    }
}

impl Decode for i32 {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let wide = i64::decode(value, cx)?;
        Self::try_from(wide).map_err(|_| {
            cx.invalid(ValidationReason::OutOfRange {
                value: wide.to_string(),
                target: "i32",
            })
        })
    }
}

impl Decode for u64 {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        if let Some(u) = value.as_u64() {
            return Ok(u);
        }
        let signed = i64::decode(value, cx)?;
        // as_u64 only fails for integers when they are negative.
        Err(cx.invalid(ValidationReason::Negative(signed)))
    }
}

impl Decode for u32 {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let wide = u64::decode(value, cx)?;
        Self::try_from(wide).map_err(|_| {
            cx.invalid(ValidationReason::OutOfRange {
                value: wide.to_string(),
                target: "u32",
            })
        })
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::decode(value, cx).map(Some)
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let items = value
            .as_array()
            .ok_or_else(|| cx.malformed(format!("expected array, found {}", kind_of(value))))?;
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| cx.scoped(idx, |cx| T::decode(item, cx)))
            .collect()
    }
}

impl<T: Decode> Decode for BTreeMap<String, T> {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        obj.iter()
            .map(|(key, item)| {
                cx.scoped(PathSegment::Key(key.clone()), |cx| T::decode(item, cx))
                    .map(|decoded| (key.clone(), decoded))
            })
            .collect()
    }
}
