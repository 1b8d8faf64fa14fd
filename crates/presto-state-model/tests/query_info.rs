// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use presto_state_decode::{decode_best_effort, decode_str, decode_value, ValidationReason};
use presto_state_dry_tests::fixtures::{buffer_info, memory_failure, QUERY_ID, TRANSACTION_ID};
use presto_state_dry_tests::{QueryInfoBuilder, StageInfoBuilder, TaskInfoBuilder};
use presto_state_model::{
    standard_registry, QueryInfo, QueryState, StageId, StageInfo, StageState, TaskId,
};
use serde_json::json;

fn query(payload: &serde_json::Value) -> QueryInfo {
    decode_value(standard_registry().unwrap(), payload).unwrap()
}

#[test]
fn full_snapshot_round_trips() {
    let payload = QueryInfoBuilder::new().build();
    let info = query(&payload);

    assert_eq!(info.query_id().as_str(), QUERY_ID);
    assert_eq!(info.state(), QueryState::Running);
    assert_eq!(info.transaction_id().unwrap().to_string(), TRANSACTION_ID);
    assert_eq!(info.query_stats().elapsed_time().to_millis(), 2500.0);
    assert_eq!(serde_json::to_value(&info).unwrap(), payload);
}

#[test]
fn stage_tree_is_walked_depth_first() {
    let info = query(&QueryInfoBuilder::new().build());
    let root = info.output_stage().unwrap();
    let order: Vec<u32> = root.all_stages().iter().map(|s| s.stage_id().stage()).collect();
    assert_eq!(order, [0, 1]);

    let leaf = StageId::new(format!("{QUERY_ID}.1")).unwrap();
    assert_eq!(info.find_stage(&leaf).unwrap().tasks().len(), 1);
    let fragments: Vec<&str> = info.fragments().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(fragments, ["0", "1"]);

    let task = TaskId::new(format!("{QUERY_ID}.0.0.0")).unwrap();
    let buffers = root.find_task(&task).unwrap().output_buffers();
    assert_eq!(buffers.buffers()[0].pages_sent(), 10);
}

#[test]
fn deep_failure_reports_the_full_path() {
    let mut broken = buffer_info("1", 0, 1);
    broken["bufferedPages"] = json!(-1);
    let stage = StageInfoBuilder::new(&format!("{QUERY_ID}.0"))
        .task(
            TaskInfoBuilder::new(&format!("{QUERY_ID}.0.0.0"))
                .buffers(vec![buffer_info("0", 1, 1), broken])
                .build(),
        )
        .build();
    let payload = QueryInfoBuilder::new().output_stage(Some(stage)).build();
    let err = decode_value::<QueryInfo>(standard_registry().unwrap(), &payload).unwrap_err();

    assert_eq!(
        err.path.to_string(),
        "outputStage.tasks[0].outputBuffers.buffers[1].bufferedPages"
    );
    assert_eq!(err.validation().unwrap().reason, ValidationReason::Negative(-1));
}

#[test]
fn task_from_another_stage_is_rejected() {
    let stage = StageInfoBuilder::new(&format!("{QUERY_ID}.0"))
        .task(TaskInfoBuilder::new(&format!("{QUERY_ID}.3.0")).build())
        .build();
    let err = decode_value::<StageInfo>(standard_registry().unwrap(), &stage).unwrap_err();
    assert_eq!(err.path.to_string(), "tasks");
}

#[test]
fn planning_query_has_no_stages() {
    let payload = QueryInfoBuilder::new()
        .state("PLANNING")
        .output_stage(None)
        .without_transaction()
        .build();
    let info = query(&payload);
    assert!(info.output_stage().is_none());
    assert!(info.fragments().is_empty());
    assert!(info.transaction_id().is_none());
    assert_eq!(serde_json::to_value(&info).unwrap(), payload);
}

#[test]
fn failed_query_keeps_its_cause_chain() {
    let payload = QueryInfoBuilder::new().failed(memory_failure()).build();
    let info = query(&payload);
    let failure = info.failure_info().unwrap();
    assert!(info.state().is_done());
    assert_eq!(failure.chain().count(), 2);
    assert_eq!(failure.root_cause().stack().len(), 1);
    assert_eq!(serde_json::to_value(&info).unwrap(), payload);
}

#[test]
fn null_optional_fields_read_as_absent() {
    let mut payload = QueryInfoBuilder::new().build();
    payload["failureInfo"] = json!(null);
    payload["outputStage"]["plan"] = json!(null);
    let info = query(&payload);
    assert!(info.failure_info().is_none());
    assert!(info.output_stage().unwrap().plan().is_none());
}

#[test]
fn null_required_field_is_missing() {
    let mut payload = QueryInfoBuilder::new().build();
    payload["queryStats"] = json!(null);
    let err = decode_value::<QueryInfo>(standard_registry().unwrap(), &payload).unwrap_err();
    assert_eq!(err.validation().unwrap().reason, ValidationReason::Missing);
    assert_eq!(err.path.to_string(), "queryStats");
}

#[test]
fn best_effort_keeps_raw_text_on_failure() {
    let mut payload = QueryInfoBuilder::new().build();
    payload["state"] = json!("EXPLODED");
    let raw = payload.to_string();

    let outcome = decode_best_effort::<QueryInfo>(standard_registry().unwrap(), raw.clone());
    assert!(!outcome.is_success());
    assert_eq!(outcome.raw(), raw);
    assert_eq!(outcome.error().unwrap().path.to_string(), "state");

    let ok = decode_best_effort::<QueryInfo>(
        standard_registry().unwrap(),
        QueryInfoBuilder::new().build().to_string(),
    );
    assert!(ok.is_success());
    assert_eq!(ok.value().unwrap().state(), QueryState::Running);
}

#[test]
fn unparseable_text_is_malformed_at_the_root() {
    let err = decode_str::<QueryInfo>(standard_registry().unwrap(), "{\"queryId\": ").unwrap_err();
    assert!(err.is_malformed());
    assert!(err.path.is_root());
}

#[test]
fn stage_state_is_typed() {
    let info = query(&QueryInfoBuilder::new().build());
    assert_eq!(info.output_stage().unwrap().state(), StageState::Running);
}
