// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use presto_state_decode::{
    decode_value, Decode, DecodeError, DecodeErrorKind, Decoder, Registry, ValidationReason,
    VariantDef, VariantRef,
};
use presto_state_dry_tests::fixtures::TRANSACTION_ID;
use presto_state_model::handle::{
    Handle, HiveTransactionHandle, RemoteTransactionHandle, SystemTableHandle, TpchColumnHandle,
    TpchTableHandle,
};
use presto_state_model::{
    register_standard, standard_registry, ColumnHandle, ConnectorPartitioningHandle,
    ConnectorTableHandle, ConnectorTransactionHandle, PartitioningHandle, SchemaTableName,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::any::Any;

fn table(payload: &Value) -> Result<Box<dyn ConnectorTableHandle>, DecodeError> {
    decode_value(standard_registry().unwrap(), payload)
}

#[test]
fn unique_signature_selects_its_variant() {
    let handle = table(&json!({"tableName": "orders", "scaleFactor": 0.01})).unwrap();
    assert_eq!(handle.variant(), "tpch");
    let tpch = handle.as_any().downcast_ref::<TpchTableHandle>().unwrap();
    assert_eq!(tpch.table_name, "orders");
    assert_eq!(handle.schema_table_name().to_string(), "tiny.orders");
}

#[test]
fn superset_signature_wins_over_its_subset() {
    let handle = table(&json!({
        "connectorId": "system",
        "schemaName": "runtime",
        "tableName": "queries"
    }))
    .unwrap();
    assert!(handle.as_any().is::<SystemTableHandle>());
    assert_eq!(
        handle.schema_table_name(),
        SchemaTableName {
            schema: "runtime".into(),
            table: "queries".into()
        }
    );
}

#[test]
fn incomparable_maximal_matches_are_ambiguous() {
    let err = table(&json!({
        "schemaName": "sales",
        "tableName": "orders",
        "scaleFactor": 1.0
    }))
    .unwrap_err();
    assert_eq!(
        err.kind,
        DecodeErrorKind::AmbiguousVariant {
            interface: "ConnectorTableHandle",
            candidates: vec!["tpch", "hive"],
        }
    );
}

#[test]
fn no_matching_signature_is_unknown() {
    let err = table(&json!({"topicName": "events"})).unwrap_err();
    assert!(matches!(
        err.kind,
        DecodeErrorKind::UnknownVariant { interface: "ConnectorTableHandle", .. }
    ));
    assert!(err.path.is_root());
}

#[test]
fn empty_signature_is_the_fallback_transaction() {
    let registry = standard_registry().unwrap();

    let remote: Box<dyn ConnectorTransactionHandle> = decode_value(registry, &json!({})).unwrap();
    assert!(remote.as_any().is::<RemoteTransactionHandle>());
    assert!(remote.transaction_id().is_none());

    let hive: Box<dyn ConnectorTransactionHandle> =
        decode_value(registry, &json!({"uuid": TRANSACTION_ID})).unwrap();
    assert!(hive.as_any().is::<HiveTransactionHandle>());
    assert_eq!(hive.transaction_id().unwrap().to_string(), TRANSACTION_ID);
}

#[test]
fn fallback_transaction_refuses_unclaimed_fields() {
    let registry = standard_registry().unwrap();

    let err = decode_value::<Box<dyn ConnectorTransactionHandle>>(
        registry,
        &json!({"foo": 1, "bar": 2}),
    )
    .unwrap_err();
    assert_eq!(
        err.kind,
        DecodeErrorKind::UnknownVariant {
            interface: "ConnectorTransactionHandle",
            detail: "keys [bar, foo]".into(),
        }
    );
    assert!(err.path.is_root());

    // A system transaction missing its id is not a remote one.
    let err = decode_value::<Box<dyn ConnectorTransactionHandle>>(
        registry,
        &json!({"connectorId": "system"}),
    )
    .unwrap_err();
    assert!(matches!(
        err.kind,
        DecodeErrorKind::UnknownVariant { interface: "ConnectorTransactionHandle", .. }
    ));
}

#[test]
fn column_with_type_resolves_to_tpch() {
    let column: Box<dyn ColumnHandle> = decode_value(
        standard_registry().unwrap(),
        &json!({"columnName": "orderkey", "type": "bigint"}),
    )
    .unwrap();
    let tpch = column.as_any().downcast_ref::<TpchColumnHandle>().unwrap();
    assert_eq!(tpch.column_type, "bigint");
    assert_eq!(column.column_name(), "orderkey");
}

#[test]
fn failures_inside_a_variant_name_it() {
    let err = decode_value::<PartitioningHandle>(
        standard_registry().unwrap(),
        &json!({
            "connectorId": "hive",
            "connectorHandle": {"bucketCount": -4, "bucketFunctionType": "HIVE_COMPATIBLE"}
        }),
    )
    .unwrap_err();
    assert_eq!(err.path.to_string(), "connectorHandle.bucketCount");
    assert_eq!(
        err.kind,
        DecodeErrorKind::Validation {
            error: presto_state_decode::ValidationError::new(
                "bucketCount",
                ValidationReason::Negative(-4)
            ),
            variant: Some(VariantRef {
                interface: "ConnectorPartitioningHandle",
                variant: "hive",
            }),
        }
    );
}

#[test]
fn interface_payload_must_be_an_object() {
    let err = table(&json!(["orders"])).unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn handles_encode_through_their_variant() {
    let handle = table(&json!({"schemaName": "web", "tableName": "clicks"})).unwrap();
    assert_eq!(
        serde_json::to_value(&handle).unwrap(),
        json!({"schemaName": "web", "tableName": "clicks"})
    );
}

// A connector outside the built-in set, registered by the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KafkaTableHandle {
    topic_name: String,
    message_data_format: String,
}

impl Handle for KafkaTableHandle {
    fn variant(&self) -> &'static str {
        "kafka"
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ConnectorTableHandle for KafkaTableHandle {
    fn schema_table_name(&self) -> SchemaTableName {
        SchemaTableName {
            schema: "default".into(),
            table: self.topic_name.clone(),
        }
    }
}

impl Decode for KafkaTableHandle {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            topic_name: cx.required(obj, "topicName")?,
            message_data_format: cx.required(obj, "messageDataFormat")?,
        })
    }
}

fn kafka_table(
    value: &Value,
    cx: &mut Decoder<'_>,
) -> Result<Box<dyn ConnectorTableHandle>, DecodeError> {
    Ok(Box::new(KafkaTableHandle::decode(value, cx)?))
}

#[test]
fn custom_connectors_extend_the_standard_set() {
    let registry = register_standard(Registry::builder())
        .unwrap()
        .register(VariantDef::<dyn ConnectorTableHandle>::structural(
            "kafka",
            &["topicName", "messageDataFormat"],
            kafka_table,
        ))
        .unwrap()
        .build();

    let payload = json!({"topicName": "events", "messageDataFormat": "json"});
    let handle: Box<dyn ConnectorTableHandle> = decode_value(&registry, &payload).unwrap();
    assert_eq!(handle.variant(), "kafka");
    assert_eq!(handle.schema_table_name().to_string(), "default.events");
    assert_eq!(serde_json::to_value(&handle).unwrap(), payload);

    // The shared registry is untouched.
    assert!(table(&payload).is_err());
}

#[test]
fn partitioning_wrapper_delegates_to_connector_handle() {
    let handle: PartitioningHandle = decode_value(
        standard_registry().unwrap(),
        &json!({"connectorHandle": {"partitioning": "COORDINATOR_ONLY", "function": "SINGLE"}}),
    )
    .unwrap();
    assert!(handle.is_single_node());
    assert!(handle.is_coordinator_only());
    assert_eq!(handle.connector_handle.label(), "COORDINATOR_ONLY");
    let _: &dyn ConnectorPartitioningHandle = handle.connector_handle.as_ref();
}
