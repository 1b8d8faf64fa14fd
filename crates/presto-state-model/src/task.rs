// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Task status and task info snapshots.

use crate::buffer::OutputBufferInfo;
use crate::ids::{PlanNodeId, TaskId};
use crate::scalar::TaskState;
use presto_state_decode::validate::{non_empty, non_negative, non_negative_u32};
use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// Lightweight task status polled by the coordinator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    task_id: TaskId,
    version: u64,
    state: TaskState,
    #[serde(rename = "self")]
    self_uri: String,
    queued_partitioned_drivers: u32,
    running_partitioned_drivers: u32,
    memory_reservation_in_bytes: u64,
}

impl TaskStatus {
    /// Validate wire-typed counters.
    pub fn new(
        task_id: TaskId,
        version: i64,
        state: TaskState,
        self_uri: String,
        queued_partitioned_drivers: i64,
        running_partitioned_drivers: i64,
        memory_reservation_in_bytes: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            task_id,
            version: non_negative("version", version)?,
            state,
            self_uri: non_empty("self", self_uri)?,
            queued_partitioned_drivers: non_negative_u32(
                "queuedPartitionedDrivers",
                queued_partitioned_drivers,
            )?,
            running_partitioned_drivers: non_negative_u32(
                "runningPartitionedDrivers",
                running_partitioned_drivers,
            )?,
            memory_reservation_in_bytes: non_negative(
                "memoryReservationInBytes",
                memory_reservation_in_bytes,
            )?,
        })
    }

    /// Task identifier.
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Monotonic status version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Worker URI serving this task.
    pub fn self_uri(&self) -> &str {
        &self.self_uri
    }

    /// Queued drivers over partitioned splits.
    pub fn queued_partitioned_drivers(&self) -> u32 {
        self.queued_partitioned_drivers
    }

    /// Running drivers over partitioned splits.
    pub fn running_partitioned_drivers(&self) -> u32 {
        self.running_partitioned_drivers
    }

    /// User memory reserved by the task.
    pub fn memory_reservation_in_bytes(&self) -> u64 {
        self.memory_reservation_in_bytes
    }
}

impl Decode for TaskStatus {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let task_id = cx.required(obj, "taskId")?;
        let version = cx.required(obj, "version")?;
        let state = cx.required(obj, "state")?;
        let self_uri = cx.required(obj, "self")?;
        let queued = cx.required(obj, "queuedPartitionedDrivers")?;
        let running = cx.required(obj, "runningPartitionedDrivers")?;
        let memory = cx.required(obj, "memoryReservationInBytes")?;
        cx.validated(Self::new(
            task_id, version, state, self_uri, queued, running, memory,
        ))
    }
}

/// Full task snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    task_status: TaskStatus,
    last_heartbeat: String,
    output_buffers: OutputBufferInfo,
    no_more_splits: Vec<PlanNodeId>,
    needs_plan: bool,
}

impl TaskInfo {
    /// Assemble a snapshot. `last_heartbeat` is kept as the engine's
    /// ISO-8601 text.
    pub fn new(
        task_status: TaskStatus,
        last_heartbeat: String,
        output_buffers: OutputBufferInfo,
        no_more_splits: Vec<PlanNodeId>,
        needs_plan: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            task_status,
            last_heartbeat: non_empty("lastHeartbeat", last_heartbeat)?,
            output_buffers,
            no_more_splits,
            needs_plan,
        })
    }

    /// Status part.
    pub fn task_status(&self) -> &TaskStatus {
        &self.task_status
    }

    /// Last heartbeat timestamp, verbatim.
    pub fn last_heartbeat(&self) -> &str {
        &self.last_heartbeat
    }

    /// Output buffer snapshot.
    pub fn output_buffers(&self) -> &OutputBufferInfo {
        &self.output_buffers
    }

    /// Source nodes that will receive no more splits.
    pub fn no_more_splits(&self) -> &[PlanNodeId] {
        &self.no_more_splits
    }

    /// `true` while the worker still waits for its fragment.
    pub fn needs_plan(&self) -> bool {
        self.needs_plan
    }
}

impl Decode for TaskInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let task_status = cx.required(obj, "taskStatus")?;
        let last_heartbeat = cx.required(obj, "lastHeartbeat")?;
        let output_buffers = cx.required(obj, "outputBuffers")?;
        let no_more_splits = cx.required(obj, "noMoreSplits")?;
        let needs_plan = cx.required(obj, "needsPlan")?;
        cx.validated(Self::new(
            task_status,
            last_heartbeat,
            output_buffers,
            no_more_splits,
            needs_plan,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_decode::{decode_value, Registry, ValidationReason};
    use serde_json::json;

    fn status_json() -> Value {
        json!({
            "taskId": "q_1.0.0.0",
            "version": 7,
            "state": "RUNNING",
            "self": "http://worker-1:8080/v1/task/q_1.0.0.0",
            "queuedPartitionedDrivers": 2,
            "runningPartitionedDrivers": 4,
            "memoryReservationInBytes": 1048576
        })
    }

    #[test]
    fn decodes_status() {
        let status: TaskStatus = decode_value(&Registry::default(), &status_json()).unwrap();
        assert_eq!(status.task_id().task(), 0);
        assert_eq!(status.state(), TaskState::Running);
        assert_eq!(status.running_partitioned_drivers(), 4);
        assert_eq!(serde_json::to_value(&status).unwrap(), status_json());
    }

    #[test]
    fn malformed_task_id_is_a_validation_error() {
        let mut payload = status_json();
        payload["taskId"] = json!("q_1.zero.0");
        let err = decode_value::<TaskStatus>(&Registry::default(), &payload).unwrap_err();
        let validation = err.validation().unwrap();
        assert_eq!(validation.field, "taskId");
        assert!(matches!(validation.reason, ValidationReason::Invalid(_)));
        assert_eq!(err.path.to_string(), "taskId");
    }

    #[test]
    fn empty_self_uri_is_rejected() {
        let mut payload = status_json();
        payload["self"] = json!("");
        let err = decode_value::<TaskStatus>(&Registry::default(), &payload).unwrap_err();
        assert_eq!(err.validation().unwrap().reason, ValidationReason::Empty);
        assert_eq!(err.path.to_string(), "self");
    }
}
