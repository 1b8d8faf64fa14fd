// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Query-level snapshots: statistics, failures and the full query info.

use crate::ids::{MemoryPoolId, QueryId, StageId, TransactionId};
use crate::plan::PlanFragment;
use crate::scalar::QueryState;
use crate::stage::StageInfo;
use crate::units::{DataSize, Duration};
use presto_state_decode::validate::{at_most, non_empty, non_negative, non_negative_u32};
use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// Aggregate counters for a query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    create_time: String,
    elapsed_time: Duration,
    total_tasks: u32,
    running_tasks: u32,
    completed_tasks: u32,
    total_drivers: u32,
    queued_drivers: u32,
    running_drivers: u32,
    completed_drivers: u32,
    raw_input_data_size: DataSize,
    raw_input_positions: u64,
    peak_user_memory_reservation: DataSize,
}

impl QueryStats {
    /// Validate wire-typed counters. Completed tasks and drivers may not
    /// exceed their totals.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        create_time: String,
        elapsed_time: Duration,
        total_tasks: i64,
        running_tasks: i64,
        completed_tasks: i64,
        total_drivers: i64,
        queued_drivers: i64,
        running_drivers: i64,
        completed_drivers: i64,
        raw_input_data_size: DataSize,
        raw_input_positions: i64,
        peak_user_memory_reservation: DataSize,
    ) -> Result<Self, ValidationError> {
        let stats = Self {
            create_time: non_empty("createTime", create_time)?,
            elapsed_time,
            total_tasks: non_negative_u32("totalTasks", total_tasks)?,
            running_tasks: non_negative_u32("runningTasks", running_tasks)?,
            completed_tasks: non_negative_u32("completedTasks", completed_tasks)?,
            total_drivers: non_negative_u32("totalDrivers", total_drivers)?,
            queued_drivers: non_negative_u32("queuedDrivers", queued_drivers)?,
            running_drivers: non_negative_u32("runningDrivers", running_drivers)?,
            completed_drivers: non_negative_u32("completedDrivers", completed_drivers)?,
            raw_input_data_size,
            raw_input_positions: non_negative("rawInputPositions", raw_input_positions)?,
            peak_user_memory_reservation,
        };
        at_most(
            "completedTasks",
            stats.completed_tasks.into(),
            "totalTasks",
            stats.total_tasks.into(),
        )?;
        at_most(
            "completedDrivers",
            stats.completed_drivers.into(),
            "totalDrivers",
            stats.total_drivers.into(),
        )?;
        Ok(stats)
    }

    /// Creation timestamp, verbatim.
    pub fn create_time(&self) -> &str {
        &self.create_time
    }

    /// Wall time since creation.
    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }

    /// Tasks scheduled so far.
    pub fn total_tasks(&self) -> u32 {
        self.total_tasks
    }

    /// Tasks running now.
    pub fn running_tasks(&self) -> u32 {
        self.running_tasks
    }

    /// Tasks finished.
    pub fn completed_tasks(&self) -> u32 {
        self.completed_tasks
    }

    /// Drivers created so far.
    pub fn total_drivers(&self) -> u32 {
        self.total_drivers
    }

    /// Drivers waiting for a thread.
    pub fn queued_drivers(&self) -> u32 {
        self.queued_drivers
    }

    /// Drivers running now.
    pub fn running_drivers(&self) -> u32 {
        self.running_drivers
    }

    /// Drivers finished.
    pub fn completed_drivers(&self) -> u32 {
        self.completed_drivers
    }

    /// Bytes read from connectors.
    pub fn raw_input_data_size(&self) -> DataSize {
        self.raw_input_data_size
    }

    /// Rows read from connectors.
    pub fn raw_input_positions(&self) -> u64 {
        self.raw_input_positions
    }

    /// Peak user memory.
    pub fn peak_user_memory_reservation(&self) -> DataSize {
        self.peak_user_memory_reservation
    }

    /// Completed fraction of drivers, `None` before any driver exists.
    pub fn progress(&self) -> Option<f64> {
        (self.total_drivers > 0)
            .then(|| f64::from(self.completed_drivers) / f64::from(self.total_drivers))
    }
}

impl Decode for QueryStats {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let create_time = cx.required(obj, "createTime")?;
        let elapsed_time = cx.required(obj, "elapsedTime")?;
        let total_tasks = cx.required(obj, "totalTasks")?;
        let running_tasks = cx.required(obj, "runningTasks")?;
        let completed_tasks = cx.required(obj, "completedTasks")?;
        let total_drivers = cx.required(obj, "totalDrivers")?;
        let queued_drivers = cx.required(obj, "queuedDrivers")?;
        let running_drivers = cx.required(obj, "runningDrivers")?;
        let completed_drivers = cx.required(obj, "completedDrivers")?;
        let raw_input_data_size = cx.required(obj, "rawInputDataSize")?;
        let raw_input_positions = cx.required(obj, "rawInputPositions")?;
        let peak_user_memory_reservation = cx.required(obj, "peakUserMemoryReservation")?;
        cx.validated(Self::new(
            create_time,
            elapsed_time,
            total_tasks,
            running_tasks,
            completed_tasks,
            total_drivers,
            queued_drivers,
            running_drivers,
            completed_drivers,
            raw_input_data_size,
            raw_input_positions,
            peak_user_memory_reservation,
        ))
    }
}

/// Failure report, chained through `cause`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionFailureInfo {
    #[serde(rename = "type")]
    failure_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Box<ExecutionFailureInfo>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stack: Vec<String>,
}

impl ExecutionFailureInfo {
    /// Build a failure record; `failure_type` is the exception class name.
    pub fn new(
        failure_type: String,
        message: Option<String>,
        cause: Option<Self>,
        stack: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            failure_type: non_empty("type", failure_type)?,
            message,
            cause: cause.map(Box::new),
            stack,
        })
    }

    /// Exception class name.
    pub fn failure_type(&self) -> &str {
        &self.failure_type
    }

    /// Message, if the engine recorded one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Underlying failure.
    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }

    /// Stack frames, innermost first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// This failure followed by its causes.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |f| f.cause())
    }

    /// Innermost cause.
    pub fn root_cause(&self) -> &Self {
        self.chain().last().unwrap_or(self)
    }
}

impl Decode for ExecutionFailureInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let failure_type = cx.required(obj, "type")?;
        let message = cx.optional(obj, "message")?;
        let cause = cx.optional(obj, "cause")?;
        let stack = cx.defaulted(obj, "stack")?;
        cx.validated(Self::new(failure_type, message, cause, stack))
    }
}

/// Full snapshot of one query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    query_id: QueryId,
    state: QueryState,
    memory_pool: MemoryPoolId,
    scheduled: bool,
    #[serde(rename = "self")]
    self_uri: String,
    query: String,
    query_stats: QueryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<TransactionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_stage: Option<StageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_info: Option<ExecutionFailureInfo>,
}

impl QueryInfo {
    /// Assemble a snapshot. The output stage, when present, must belong to
    /// this query.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        query_id: QueryId,
        state: QueryState,
        memory_pool: MemoryPoolId,
        scheduled: bool,
        self_uri: String,
        query: String,
        query_stats: QueryStats,
        transaction_id: Option<TransactionId>,
        output_stage: Option<StageInfo>,
        failure_info: Option<ExecutionFailureInfo>,
    ) -> Result<Self, ValidationError> {
        if let Some(stage) = &output_stage {
            if stage.stage_id().query_id() != &query_id {
                return Err(ValidationError::invalid(
                    "outputStage",
                    format!("stage {} belongs to another query", stage.stage_id()),
                ));
            }
        }
        Ok(Self {
            query_id,
            state,
            memory_pool,
            scheduled,
            self_uri: non_empty("self", self_uri)?,
            query,
            query_stats,
            transaction_id,
            output_stage,
            failure_info,
        })
    }

    /// Query identifier.
    pub fn query_id(&self) -> &QueryId {
        &self.query_id
    }

    /// Lifecycle state.
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Memory pool the query is assigned to.
    pub fn memory_pool(&self) -> &MemoryPoolId {
        &self.memory_pool
    }

    /// `true` once every stage is scheduled.
    pub fn scheduled(&self) -> bool {
        self.scheduled
    }

    /// Coordinator URI of this query.
    pub fn self_uri(&self) -> &str {
        &self.self_uri
    }

    /// SQL text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Aggregate counters.
    pub fn query_stats(&self) -> &QueryStats {
        &self.query_stats
    }

    /// Transaction, when one was started.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Root of the stage tree, once planned.
    pub fn output_stage(&self) -> Option<&StageInfo> {
        self.output_stage.as_ref()
    }

    /// Failure report for failed queries.
    pub fn failure_info(&self) -> Option<&ExecutionFailureInfo> {
        self.failure_info.as_ref()
    }

    /// Stage lookup across the stage tree.
    pub fn find_stage(&self, id: &StageId) -> Option<&StageInfo> {
        self.output_stage
            .iter()
            .flat_map(StageInfo::all_stages)
            .find(|s| s.stage_id() == id)
    }

    /// Planned fragments in stage order.
    pub fn fragments(&self) -> Vec<&PlanFragment> {
        self.output_stage
            .iter()
            .flat_map(StageInfo::all_stages)
            .filter_map(StageInfo::plan)
            .collect()
    }
}

impl Decode for QueryInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let query_id = cx.required(obj, "queryId")?;
        let state = cx.required(obj, "state")?;
        let memory_pool = cx.required(obj, "memoryPool")?;
        let scheduled = cx.required(obj, "scheduled")?;
        let self_uri = cx.required(obj, "self")?;
        let query = cx.required(obj, "query")?;
        let query_stats = cx.required(obj, "queryStats")?;
        let transaction_id = cx.optional(obj, "transactionId")?;
        let output_stage = cx.optional(obj, "outputStage")?;
        let failure_info = cx.optional(obj, "failureInfo")?;
        cx.validated(Self::new(
            query_id,
            state,
            memory_pool,
            scheduled,
            self_uri,
            query,
            query_stats,
            transaction_id,
            output_stage,
            failure_info,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_decode::{decode_value, Registry, ValidationReason};
    use serde_json::json;

    fn stats_json(completed: i64, total: i64) -> Value {
        json!({
            "createTime": "2024-01-01T12:00:00.000Z",
            "elapsedTime": "1.50s",
            "totalTasks": total,
            "runningTasks": 0,
            "completedTasks": completed,
            "totalDrivers": 8,
            "queuedDrivers": 0,
            "runningDrivers": 2,
            "completedDrivers": 6,
            "rawInputDataSize": "12MB",
            "rawInputPositions": 1000,
            "peakUserMemoryReservation": "1.25MB"
        })
    }

    #[test]
    fn stats_round_trip_and_progress() {
        let stats: QueryStats = decode_value(&Registry::default(), &stats_json(3, 4)).unwrap();
        assert_eq!(stats.raw_input_data_size().to_bytes(), 12 * 1024 * 1024);
        assert_eq!(stats.progress(), Some(0.75));
        assert_eq!(serde_json::to_value(&stats).unwrap(), stats_json(3, 4));
    }

    #[test]
    fn completed_beyond_total_is_rejected() {
        let err = decode_value::<QueryStats>(&Registry::default(), &stats_json(5, 4)).unwrap_err();
        assert_eq!(err.validation().unwrap().field, "completedTasks");
        assert_eq!(err.path.to_string(), "completedTasks");
    }

    #[test]
    fn failure_chain_walks_causes() {
        let payload = json!({
            "type": "com.facebook.presto.spi.PrestoException",
            "message": "Query exceeded memory limit",
            "cause": {"type": "java.lang.OutOfMemoryError", "stack": ["a.b(C.java:1)"]},
            "stack": ["x.y(Z.java:10)"]
        });
        let failure: ExecutionFailureInfo = decode_value(&Registry::default(), &payload).unwrap();
        assert_eq!(failure.chain().count(), 2);
        assert_eq!(failure.root_cause().failure_type(), "java.lang.OutOfMemoryError");
        assert!(failure.root_cause().message().is_none());
        assert_eq!(serde_json::to_value(&failure).unwrap(), payload);
    }

    #[test]
    fn nested_cause_failure_is_located() {
        let payload = json!({"type": "A", "cause": {"type": ""}});
        let err = decode_value::<ExecutionFailureInfo>(&Registry::default(), &payload).unwrap_err();
        assert_eq!(err.path.to_string(), "cause.type");
        assert_eq!(err.validation().unwrap().reason, ValidationReason::Empty);
    }
}
