// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use presto_state_decode::{decode_value, DecodeErrorKind, ValidationReason, VariantRef};
use presto_state_dry_tests::fixtures::{
    orders_scan, output_fragment, parameter_comparison, price_predicate, source_fragment,
};
use presto_state_model::expression::{ComparisonExpression, Parameter};
use presto_state_model::plan::TableScanNode;
use presto_state_model::scalar::{AggregationStep, ComparisonOperator};
use presto_state_model::{standard_registry, Expression, PlanFragment, PlanNode, PlanNodeId};
use serde_json::json;

fn fragment(payload: &serde_json::Value) -> PlanFragment {
    decode_value(standard_registry().unwrap(), payload).unwrap()
}

#[test]
fn source_fragment_round_trips() {
    let payload = source_fragment();
    let decoded = fragment(&payload);

    assert_eq!(decoded.id.as_str(), "1");
    assert_eq!(decoded.root.kind(), "aggregation");
    assert!(!decoded.partitioning.is_single_node());
    assert_eq!(serde_json::to_value(&decoded).unwrap(), payload);
}

#[test]
fn nodes_are_reachable_by_id() {
    let decoded = fragment(&source_fragment());
    let scan = decoded.root.find(&PlanNodeId::new("0").unwrap()).unwrap();
    let PlanNode::TableScan(TableScanNode {
        table, assignments, ..
    }) = scan
    else {
        panic!("expected a table scan, got {}", scan.kind());
    };
    assert_eq!(table.connector_handle.schema_table_name().to_string(), "tiny.orders");
    assert_eq!(assignments["totalprice"].column_name(), "totalprice");

    let PlanNode::Aggregation(aggregation) = &decoded.root else {
        panic!("expected aggregation root");
    };
    assert_eq!(aggregation.step, AggregationStep::Partial);
    assert!(aggregation.grouping_keys.is_empty());
}

#[test]
fn output_fragment_lists_its_remote_sources() {
    let decoded = fragment(&output_fragment());
    let sources: Vec<&str> = decoded.remote_sources().iter().map(|id| id.as_str()).collect();
    assert_eq!(sources, ["1"]);
    assert!(decoded.partitioning.is_single_node());
    assert_eq!(serde_json::to_value(&decoded).unwrap(), output_fragment());
}

#[test]
fn expression_tree_decodes_left_to_right() {
    let expr: Expression =
        decode_value(standard_registry().unwrap(), &parameter_comparison()).unwrap();
    let Expression::Comparison(ComparisonExpression {
        operator,
        left,
        right,
    }) = &expr
    else {
        panic!("expected comparison, got {}", expr.kind());
    };
    assert_eq!(*operator, ComparisonOperator::Equal);
    assert!(matches!(**left, Expression::Parameter(Parameter { position: 0 })));
    assert!(matches!(**right, Expression::Parameter(Parameter { position: 1 })));
    assert_eq!(expr.max_parameter(), Some(1));
    assert_eq!(serde_json::to_value(&expr).unwrap(), parameter_comparison());
}

#[test]
fn unknown_node_tag_is_reported_with_its_path() {
    let mut payload = source_fragment();
    payload["root"]["source"]["@type"] = json!("sample");
    let err = decode_value::<PlanFragment>(standard_registry().unwrap(), &payload).unwrap_err();
    assert_eq!(err.path.to_string(), "root.source");
    assert!(matches!(
        err.kind,
        DecodeErrorKind::UnknownVariant { interface: "PlanNode", .. }
    ));
}

#[test]
fn untagged_scan_falls_back_to_its_shape() {
    let mut scan = orders_scan("7");
    scan.as_object_mut().unwrap().remove("@type");
    let node: PlanNode = decode_value(standard_registry().unwrap(), &scan).unwrap();
    assert_eq!(node.kind(), "tablescan");
    assert_eq!(node.id().as_str(), "7");
}

#[test]
fn untagged_project_has_no_shape_to_match() {
    let payload = json!({"id": "9", "source": orders_scan("0"), "assignments": {}});
    let err = decode_value::<PlanNode>(standard_registry().unwrap(), &payload).unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::UnknownVariant { .. }));
}

#[test]
fn non_string_tag_is_malformed() {
    let err = decode_value::<Expression>(standard_registry().unwrap(), &json!({"@type": 3}))
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn bad_field_inside_a_node_names_the_node_kind() {
    let mut payload = source_fragment();
    payload["root"]["source"]["predicate"] = price_predicate();
    payload["root"]["source"]["predicate"]["operator"] = json!("LIKE");
    let err = decode_value::<PlanFragment>(standard_registry().unwrap(), &payload).unwrap_err();
    assert_eq!(err.path.to_string(), "root.source.predicate.operator");
    let DecodeErrorKind::Validation { error, variant } = &err.kind else {
        panic!("expected validation failure, got {err}");
    };
    assert_eq!(error.reason, ValidationReason::UnknownName("LIKE".into()));
    assert_eq!(
        *variant,
        Some(VariantRef {
            interface: "Expression",
            variant: "comparison",
        })
    );
}

#[test]
fn null_literal_and_defaults_round_trip() {
    let payload = json!({
        "@type": "functionCall",
        "name": "coalesce",
        "arguments": [{"@type": "symbol", "name": "x"}, {"@type": "null"}]
    });
    let expr: Expression = decode_value(standard_registry().unwrap(), &payload).unwrap();
    assert_eq!(expr.children().len(), 2);
    assert_eq!(expr.children()[1].kind(), "null");
    assert_eq!(serde_json::to_value(&expr).unwrap(), payload);
}
