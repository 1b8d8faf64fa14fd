// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opaque identifiers.
//!
//! Every identifier travels as a single bare JSON string equal to its
//! canonical text. Equality, hashing and ordering follow the wrapped value.

use presto_state_decode::validate::non_empty;
use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError, ValidationReason};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal, $check:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap `text`.
            pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
                let text = text.into();
                $check($field, &text)?;
                Ok(Self(text))
            }

            /// Canonical text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Decode for $name {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let text = String::decode(value, cx)?;
                Self::new(text).map_err(|e| cx.invalid(e.reason))
            }
        }
    };
}

fn check_non_empty(field: &'static str, text: &str) -> Result<(), ValidationError> {
    non_empty(field, text).map(drop)
}

fn check_query_id(field: &'static str, text: &str) -> Result<(), ValidationError> {
    check_non_empty(field, text)?;
    match text
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
    {
        Some(bad) => Err(ValidationError::invalid(
            field,
            format!("unexpected character {bad:?}"),
        )),
        None => Ok(()),
    }
}

string_id!(
    /// Query identifier, e.g. `20240101_120000_00003_abcde`.
    QueryId,
    "queryId",
    check_query_id
);
string_id!(
    /// Output buffer identifier (the partition number as text).
    OutputBufferId,
    "bufferId",
    check_non_empty
);
string_id!(
    /// Catalog/connector identifier.
    ConnectorId,
    "connectorId",
    check_non_empty
);
string_id!(
    /// Memory pool identifier (`general`, `reserved`, ...).
    MemoryPoolId,
    "memoryPool",
    check_non_empty
);
string_id!(
    /// Plan node identifier, unique within a fragment.
    PlanNodeId,
    "id",
    check_non_empty
);
string_id!(
    /// Plan fragment identifier (the stage number as text).
    PlanFragmentId,
    "fragmentId",
    check_non_empty
);

fn parse_ordinal(field: &'static str, part: &str) -> Result<u32, ValidationError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            field,
            format!("expected a decimal ordinal, found {part:?}"),
        ));
    }
    part.parse().map_err(|_| {
        ValidationError::new(
            field,
            ValidationReason::OutOfRange {
                value: part.to_owned(),
                target: "u32",
            },
        )
    })
}

/// Stage identifier: `<queryId>.<stage>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageId {
    query_id: QueryId,
    stage: u32,
}

impl StageId {
    /// Parse canonical text.
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let text = text.as_ref();
        let (query, stage) = text
            .split_once('.')
            .ok_or_else(|| ValidationError::invalid("stageId", format!("{text:?} has no stage part")))?;
        Ok(Self {
            query_id: QueryId::new(query)?,
            stage: parse_ordinal("stageId", stage)?,
        })
    }

    /// Build from parts.
    pub fn from_parts(query_id: QueryId, stage: u32) -> Self {
        Self { query_id, stage }
    }

    /// Owning query.
    pub fn query_id(&self) -> &QueryId {
        &self.query_id
    }

    /// Stage ordinal within the query.
    pub fn stage(&self) -> u32 {
        self.stage
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.query_id, self.stage)
    }
}

/// Task identifier: `<queryId>.<stage>.<task>` with an optional
/// `.<attempt>` suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId {
    stage_id: StageId,
    task: u32,
    attempt: Option<u32>,
}

impl TaskId {
    /// Parse canonical text.
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let text = text.as_ref();
        let parts: Vec<&str> = text.split('.').collect();
        let (query, stage, task, attempt) = match parts.as_slice() {
            [q, s, t] => (*q, *s, *t, None),
            [q, s, t, a] => (*q, *s, *t, Some(*a)),
            _ => {
                return Err(ValidationError::invalid(
                    "taskId",
                    format!("{text:?} is not <query>.<stage>.<task>[.<attempt>]"),
                ))
            }
        };
        Ok(Self {
            stage_id: StageId::from_parts(QueryId::new(query)?, parse_ordinal("taskId", stage)?),
            task: parse_ordinal("taskId", task)?,
            attempt: attempt.map(|a| parse_ordinal("taskId", a)).transpose()?,
        })
    }

    /// Owning stage.
    pub fn stage_id(&self) -> &StageId {
        &self.stage_id
    }

    /// Task ordinal within the stage.
    pub fn task(&self) -> u32 {
        self.task
    }

    /// Retry attempt, when the engine reports one.
    pub fn attempt(&self) -> Option<u32> {
        self.attempt
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stage_id, self.task)?;
        if let Some(attempt) = self.attempt {
            write!(f, ".{attempt}")?;
        }
        Ok(())
    }
}

macro_rules! parsed_id_glue {
    ($($name:ident),+) => {$(
        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl Decode for $name {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let text = String::decode(value, cx)?;
                Self::new(text).map_err(|e| cx.invalid(e.reason))
            }
        }
    )+};
}

parsed_id_glue!(StageId, TaskId, TransactionId);

/// Transaction identifier (UUID, canonical lowercase hyphenated form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(uuid::Uuid);

impl TransactionId {
    /// Parse any textual UUID form.
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        uuid::Uuid::parse_str(text.as_ref())
            .map(Self)
            .map_err(|e| ValidationError::invalid("transactionId", e.to_string()))
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
