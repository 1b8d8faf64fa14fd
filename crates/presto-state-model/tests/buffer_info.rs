// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use presto_state_decode::{decode_str, decode_value, DecodeErrorKind, ValidationReason};
use presto_state_dry_tests::fixtures::{buffer_info, output_buffers};
use presto_state_model::{standard_registry, BufferInfo, OutputBufferId, OutputBufferInfo};

#[test]
fn engine_buffer_payload_decodes() {
    let payload = r#"{"bufferId":"0","finished":false,"bufferedPages":3,"pagesSent":10,
        "pageBufferInfo":{"partition":0,"bufferedPages":3,"bufferedBytes":1024,"rowsAdded":100,"pagesAdded":3}}"#;
    let info: BufferInfo = decode_str(standard_registry().unwrap(), payload).unwrap();

    assert_eq!(info.buffer_id().as_str(), "0");
    assert!(!info.finished());
    assert_eq!(info.buffered_pages(), 3);
    assert_eq!(info.pages_sent(), 10);
    assert_eq!(info.page_buffer_info().partition(), 0);
    assert_eq!(info.page_buffer_info().buffered_bytes(), 1024);
}

#[test]
fn negative_buffered_pages_is_a_validation_error() {
    let payload = r#"{"bufferId":"0","finished":false,"bufferedPages":-1,"pagesSent":10,
        "pageBufferInfo":{"partition":0,"bufferedPages":3,"bufferedBytes":1024,"rowsAdded":100,"pagesAdded":3}}"#;
    let err = decode_str::<BufferInfo>(standard_registry().unwrap(), payload).unwrap_err();

    let DecodeErrorKind::Validation { error, variant } = &err.kind else {
        panic!("expected validation failure, got {err}");
    };
    assert_eq!(error.field, "bufferedPages");
    assert_eq!(error.reason, ValidationReason::Negative(-1));
    assert!(variant.is_none());
    assert_eq!(err.path.to_string(), "bufferedPages");
}

#[test]
fn extra_keys_are_ignored_and_not_re_emitted() {
    let mut payload = buffer_info("2", 1, 1);
    payload["spoolingInfo"] = serde_json::json!({"ignored": true});
    let info: BufferInfo = decode_value(standard_registry().unwrap(), &payload).unwrap();
    let encoded = serde_json::to_value(&info).unwrap();
    assert!(encoded.get("spoolingInfo").is_none());
    assert_eq!(encoded, buffer_info("2", 1, 1));
}

#[test]
fn output_buffers_round_trip() {
    let payload = output_buffers(vec![buffer_info("0", 3, 10), buffer_info("1", 0, 7)]);
    let info: OutputBufferInfo = decode_value(standard_registry().unwrap(), &payload).unwrap();
    assert_eq!(info.buffers().len(), 2);
    let second = info.buffer(&OutputBufferId::new("1").unwrap()).unwrap();
    assert_eq!(second.pages_sent(), 7);
    assert_eq!(serde_json::to_value(&info).unwrap(), payload);
}

#[test]
fn empty_buffer_list_decodes_to_empty_vec() {
    let payload = output_buffers(Vec::new());
    let info: OutputBufferInfo = decode_value(standard_registry().unwrap(), &payload).unwrap();
    assert!(info.buffers().is_empty());
}

#[test]
fn wrong_json_type_is_malformed() {
    let mut payload = buffer_info("0", 1, 1);
    payload["pagesSent"] = serde_json::json!("ten");
    let err = decode_value::<BufferInfo>(standard_registry().unwrap(), &payload).unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(err.path.to_string(), "pagesSent");
}

#[test]
fn unknown_buffer_state_names_the_value() {
    let mut payload = output_buffers(Vec::new());
    payload["state"] = serde_json::json!("DRAINING");
    let err = decode_value::<OutputBufferInfo>(standard_registry().unwrap(), &payload).unwrap_err();
    assert_eq!(
        err.validation().map(|v| v.reason.clone()),
        Some(ValidationReason::UnknownName("DRAINING".into()))
    );
    assert_eq!(err.path.to_string(), "state");
    assert_eq!(err.validation().map(|v| v.field), Some("state"));
}
