// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Memory pool snapshots.

use crate::ids::QueryId;
use presto_state_decode::validate::non_negative;
use presto_state_decode::{Decode, DecodeError, Decoder, Object, PathSegment, ValidationError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Reservations held in one memory pool.
///
/// The engine over-commits pools, so `reserved_bytes` may exceed
/// `max_bytes`; [`MemoryPoolInfo::free_bytes`] goes negative in that case.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPoolInfo {
    max_bytes: u64,
    reserved_bytes: u64,
    reserved_revocable_bytes: u64,
    query_memory_reservations: BTreeMap<QueryId, u64>,
    query_memory_revocable_reservations: BTreeMap<QueryId, u64>,
}

impl MemoryPoolInfo {
    /// Validate wire-typed byte counts.
    pub fn new(
        max_bytes: i64,
        reserved_bytes: i64,
        reserved_revocable_bytes: i64,
        query_memory_reservations: BTreeMap<QueryId, u64>,
        query_memory_revocable_reservations: BTreeMap<QueryId, u64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            max_bytes: non_negative("maxBytes", max_bytes)?,
            reserved_bytes: non_negative("reservedBytes", reserved_bytes)?,
            reserved_revocable_bytes: non_negative(
                "reservedRevocableBytes",
                reserved_revocable_bytes,
            )?,
            query_memory_reservations,
            query_memory_revocable_reservations,
        })
    }

    /// Pool capacity.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Bytes reserved by all queries.
    pub fn reserved_bytes(&self) -> u64 {
        self.reserved_bytes
    }

    /// Revocable bytes reserved by all queries.
    pub fn reserved_revocable_bytes(&self) -> u64 {
        self.reserved_revocable_bytes
    }

    /// Per-query reservations.
    pub fn query_memory_reservations(&self) -> &BTreeMap<QueryId, u64> {
        &self.query_memory_reservations
    }

    /// Per-query revocable reservations.
    pub fn query_memory_revocable_reservations(&self) -> &BTreeMap<QueryId, u64> {
        &self.query_memory_revocable_reservations
    }

    /// Capacity left after regular and revocable reservations.
    pub fn free_bytes(&self) -> i128 {
        i128::from(self.max_bytes)
            - i128::from(self.reserved_bytes)
            - i128::from(self.reserved_revocable_bytes)
    }

    /// Regular plus revocable bytes held by `query`.
    pub fn reserved_by(&self, query: &QueryId) -> u64 {
        let regular = self.query_memory_reservations.get(query).copied();
        let revocable = self.query_memory_revocable_reservations.get(query).copied();
        regular.unwrap_or(0).saturating_add(revocable.unwrap_or(0))
    }
}

// Map keys are query ids, so they are validated like any other id field.
fn reservations(
    cx: &mut Decoder<'_>,
    obj: &Object,
    field: &'static str,
) -> Result<BTreeMap<QueryId, u64>, DecodeError> {
    cx.scoped(field, |cx| {
        let Some(value) = obj.get(field).filter(|v| !v.is_null()) else {
            return Ok(BTreeMap::new());
        };
        let entries = cx.object(value)?;
        let mut out = BTreeMap::new();
        for (key, bytes) in entries {
            cx.scoped(PathSegment::Key(key.clone()), |cx| {
                let id = QueryId::decode(&Value::String(key.clone()), cx)?;
                out.insert(id, u64::decode(bytes, cx)?);
                Ok(())
            })?;
        }
        Ok(out)
    })
}

impl Decode for MemoryPoolInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let max_bytes = cx.required(obj, "maxBytes")?;
        let reserved_bytes = cx.required(obj, "reservedBytes")?;
        let reserved_revocable_bytes = cx.required(obj, "reservedRevocableBytes")?;
        let regular = reservations(cx, obj, "queryMemoryReservations")?;
        let revocable = reservations(cx, obj, "queryMemoryRevocableReservations")?;
        cx.validated(Self::new(
            max_bytes,
            reserved_bytes,
            reserved_revocable_bytes,
            regular,
            revocable,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_decode::{decode_value, Registry, ValidationReason};
    use serde_json::json;

    #[test]
    fn over_committed_pool_decodes() {
        let payload = json!({
            "maxBytes": 1000,
            "reservedBytes": 900,
            "reservedRevocableBytes": 200,
            "queryMemoryReservations": {"q_1": 600, "q_2": 300},
            "queryMemoryRevocableReservations": {"q_1": 200}
        });
        let pool: MemoryPoolInfo = decode_value(&Registry::default(), &payload).unwrap();
        assert_eq!(pool.free_bytes(), -100);
        let q1: QueryId = "q_1".parse().unwrap();
        assert_eq!(pool.reserved_by(&q1), 800);
        assert_eq!(serde_json::to_value(&pool).unwrap(), payload);
    }

    #[test]
    fn bad_query_key_is_located() {
        let payload = json!({
            "maxBytes": 1000,
            "reservedBytes": 0,
            "reservedRevocableBytes": 0,
            "queryMemoryReservations": {"Q-1": 1}
        });
        let err = decode_value::<MemoryPoolInfo>(&Registry::default(), &payload).unwrap_err();
        assert_eq!(err.path.to_string(), "queryMemoryReservations[\"Q-1\"]");
        assert!(err.validation().is_some());
    }

    #[test]
    fn negative_reservation_is_rejected() {
        let payload = json!({
            "maxBytes": 1000,
            "reservedBytes": 0,
            "reservedRevocableBytes": 0,
            "queryMemoryReservations": {"q_1": -5}
        });
        let err = decode_value::<MemoryPoolInfo>(&Registry::default(), &payload).unwrap_err();
        assert_eq!(err.validation().unwrap().reason, ValidationReason::Negative(-5));
    }
}
