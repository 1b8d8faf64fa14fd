// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Coordinator-state JSON payloads for tests.
//!
//! Every builder emits exactly the keys the engine publishes, with no extras,
//! so decoded trees re-encode to the same JSON.

use serde_json::{json, Value};

/// Query id used by the default builders.
pub const QUERY_ID: &str = "20240101_120000_00003_abcde";

/// Transaction id used by the default builders.
pub const TRANSACTION_ID: &str = "8f14e45f-ceea-467f-a0e6-bd7d4f1c2e5a";

/// Page-buffer snapshot for `partition`.
pub fn page_buffer_info(partition: i64, buffered_pages: i64) -> Value {
    json!({
        "partition": partition,
        "bufferedPages": buffered_pages,
        "bufferedBytes": buffered_pages * 1024,
        "rowsAdded": 100,
        "pagesAdded": buffered_pages,
    })
}

/// Per-consumer buffer snapshot.
pub fn buffer_info(buffer_id: &str, buffered_pages: i64, pages_sent: i64) -> Value {
    let partition: i64 = buffer_id.parse().unwrap_or(0);
    json!({
        "bufferId": buffer_id,
        "finished": false,
        "bufferedPages": buffered_pages,
        "pagesSent": pages_sent,
        "pageBufferInfo": page_buffer_info(partition, buffered_pages),
    })
}

/// Partitioned output buffer over `buffers`.
pub fn output_buffers(buffers: Vec<Value>) -> Value {
    json!({
        "type": "PARTITIONED",
        "state": "OPEN",
        "canAddBuffers": false,
        "canAddPages": true,
        "totalBufferedBytes": 4096,
        "totalBufferedPages": 4,
        "totalRowsSent": 1000,
        "totalPagesSent": 10,
        "buffers": buffers,
    })
}

/// `left = right` over two placeholders (positions 0 and 1).
pub fn parameter_comparison() -> Value {
    json!({
        "@type": "comparison",
        "operator": "EQUAL",
        "left": {"@type": "parameter", "position": 0},
        "right": {"@type": "parameter", "position": 1},
    })
}

/// `totalprice > 1000.5`.
pub fn price_predicate() -> Value {
    json!({
        "@type": "comparison",
        "operator": "GREATER_THAN",
        "left": {"@type": "symbol", "name": "totalprice"},
        "right": {"@type": "double", "value": 1000.5},
    })
}

/// Scan of `tpch.tiny.orders` producing `orderkey` and `totalprice`.
pub fn orders_scan(id: &str) -> Value {
    json!({
        "@type": "tablescan",
        "id": id,
        "table": {
            "connectorId": "tpch",
            "connectorHandle": {"tableName": "orders", "scaleFactor": 0.01},
            "transaction": {},
        },
        "outputSymbols": ["orderkey", "totalprice"],
        "assignments": {
            "orderkey": {"columnName": "orderkey", "type": "bigint"},
            "totalprice": {"columnName": "totalprice", "type": "double"},
        },
    })
}

fn system_partitioning(partitioning: &str, function: &str) -> Value {
    json!({"connectorHandle": {"partitioning": partitioning, "function": function}})
}

fn single_output_scheme(layout: &[&str]) -> Value {
    json!({
        "partitioning": {"handle": system_partitioning("SINGLE", "SINGLE"), "arguments": []},
        "outputLayout": layout,
    })
}

/// Leaf fragment `1`: partial `count(*)` over filtered orders.
pub fn source_fragment() -> Value {
    json!({
        "id": "1",
        "root": {
            "@type": "aggregation",
            "id": "2",
            "source": {
                "@type": "filter",
                "id": "1",
                "source": orders_scan("0"),
                "predicate": price_predicate(),
            },
            "aggregations": {
                "count": {"@type": "functionCall", "name": "count", "arguments": []},
            },
            "groupingKeys": [],
            "step": "PARTIAL",
        },
        "partitioning": system_partitioning("SOURCE", "UNKNOWN"),
        "partitioningScheme": single_output_scheme(&["count"]),
    })
}

/// Root fragment `0`: gathers fragment `1` and names the result column.
pub fn output_fragment() -> Value {
    json!({
        "id": "0",
        "root": {
            "@type": "output",
            "id": "4",
            "source": {
                "@type": "remoteSource",
                "id": "3",
                "sourceFragmentIds": ["1"],
                "outputs": ["count"],
                "exchangeType": "GATHER",
            },
            "columnNames": ["_col0"],
            "outputs": ["count"],
        },
        "partitioning": system_partitioning("SINGLE", "SINGLE"),
        "partitioningScheme": single_output_scheme(&["count"]),
    })
}

/// Engine-style query statistics.
pub fn query_stats() -> Value {
    json!({
        "createTime": "2024-01-01T12:00:00.000Z",
        "elapsedTime": "2.50s",
        "totalTasks": 2,
        "runningTasks": 1,
        "completedTasks": 1,
        "totalDrivers": 8,
        "queuedDrivers": 0,
        "runningDrivers": 4,
        "completedDrivers": 4,
        "rawInputDataSize": "1.50MB",
        "rawInputPositions": 15000,
        "peakUserMemoryReservation": "256kB",
    })
}

/// Builder for task-info payloads.
///
/// # Example
///
/// ```
/// use presto_state_dry_tests::TaskInfoBuilder;
///
/// let task = TaskInfoBuilder::new("q_1.0.0").state("FINISHED").build();
/// assert_eq!(task["taskStatus"]["state"], "FINISHED");
/// ```
pub struct TaskInfoBuilder {
    task_id: String,
    state: String,
    buffers: Vec<Value>,
    needs_plan: bool,
}

impl TaskInfoBuilder {
    /// Running task with one empty consumer buffer.
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_owned(),
            state: "RUNNING".to_owned(),
            buffers: vec![buffer_info("0", 0, 0)],
            needs_plan: false,
        }
    }

    /// Task state name.
    pub fn state(mut self, state: &str) -> Self {
        self.state = state.to_owned();
        self
    }

    /// Replace the consumer buffers.
    pub fn buffers(mut self, buffers: Vec<Value>) -> Self {
        self.buffers = buffers;
        self
    }

    /// Mark the task as still waiting for its fragment.
    pub fn needs_plan(mut self) -> Self {
        self.needs_plan = true;
        self
    }

    /// Build the payload.
    pub fn build(self) -> Value {
        json!({
            "taskStatus": {
                "taskId": self.task_id,
                "version": 7,
                "state": self.state,
                "self": format!("http://worker-1:8080/v1/task/{}", self.task_id),
                "queuedPartitionedDrivers": 0,
                "runningPartitionedDrivers": 2,
                "memoryReservationInBytes": 1048576,
            },
            "lastHeartbeat": "2024-01-01T12:00:02.000Z",
            "outputBuffers": output_buffers(self.buffers),
            "noMoreSplits": [],
            "needsPlan": self.needs_plan,
        })
    }
}

/// Builder for stage-info payloads.
pub struct StageInfoBuilder {
    stage_id: String,
    state: String,
    plan: Option<Value>,
    tasks: Vec<Value>,
    sub_stages: Vec<Value>,
}

impl StageInfoBuilder {
    /// Running, unplanned stage with no tasks.
    pub fn new(stage_id: &str) -> Self {
        Self {
            stage_id: stage_id.to_owned(),
            state: "RUNNING".to_owned(),
            plan: None,
            tasks: Vec::new(),
            sub_stages: Vec::new(),
        }
    }

    /// Stage state name.
    pub fn state(mut self, state: &str) -> Self {
        self.state = state.to_owned();
        self
    }

    /// Attach a plan fragment.
    pub fn plan(mut self, fragment: Value) -> Self {
        self.plan = Some(fragment);
        self
    }

    /// Add a task built with [`TaskInfoBuilder`].
    pub fn task(mut self, task: Value) -> Self {
        self.tasks.push(task);
        self
    }

    /// Add a child stage.
    pub fn sub_stage(mut self, stage: Value) -> Self {
        self.sub_stages.push(stage);
        self
    }

    /// Build the payload.
    pub fn build(self) -> Value {
        let mut stage = json!({
            "stageId": self.stage_id,
            "state": self.state,
            "tasks": self.tasks,
            "subStages": self.sub_stages,
        });
        if let (Some(plan), Some(obj)) = (self.plan, stage.as_object_mut()) {
            obj.insert("plan".to_owned(), plan);
        }
        stage
    }
}

/// Builder for query-info payloads.
///
/// The default build is a running two-stage `count(*)` over TPC-H orders:
/// stage 0 runs [`output_fragment`], stage 1 runs [`source_fragment`].
pub struct QueryInfoBuilder {
    query_id: String,
    state: String,
    output_stage: Option<Value>,
    failure_info: Option<Value>,
    transaction_id: Option<String>,
}

impl Default for QueryInfoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryInfoBuilder {
    /// Running query with the default two-stage plan.
    pub fn new() -> Self {
        let source = StageInfoBuilder::new(&format!("{QUERY_ID}.1"))
            .plan(source_fragment())
            .task(TaskInfoBuilder::new(&format!("{QUERY_ID}.1.0.0")).build())
            .build();
        let output = StageInfoBuilder::new(&format!("{QUERY_ID}.0"))
            .plan(output_fragment())
            .task(
                TaskInfoBuilder::new(&format!("{QUERY_ID}.0.0.0"))
                    .buffers(vec![buffer_info("0", 3, 10), buffer_info("1", 1, 2)])
                    .build(),
            )
            .sub_stage(source)
            .build();
        Self {
            query_id: QUERY_ID.to_owned(),
            state: "RUNNING".to_owned(),
            output_stage: Some(output),
            failure_info: None,
            transaction_id: Some(TRANSACTION_ID.to_owned()),
        }
    }

    /// Query state name.
    pub fn state(mut self, state: &str) -> Self {
        self.state = state.to_owned();
        self
    }

    /// Replace the stage tree (`None` for a query still being planned).
    pub fn output_stage(mut self, stage: Option<Value>) -> Self {
        self.output_stage = stage;
        self
    }

    /// Attach a failure report and mark the query failed.
    pub fn failed(mut self, failure: Value) -> Self {
        self.state = "FAILED".to_owned();
        self.failure_info = Some(failure);
        self
    }

    /// Drop the transaction id.
    pub fn without_transaction(mut self) -> Self {
        self.transaction_id = None;
        self
    }

    /// Build the payload.
    pub fn build(self) -> Value {
        let mut info = json!({
            "queryId": self.query_id,
            "state": self.state,
            "memoryPool": "general",
            "scheduled": true,
            "self": format!("http://coordinator:8080/v1/query/{}", self.query_id),
            "query": "SELECT count(*) FROM orders WHERE totalprice > 1000.5",
            "queryStats": query_stats(),
        });
        if let Some(obj) = info.as_object_mut() {
            let optional = [
                ("transactionId", self.transaction_id.map(Value::String)),
                ("outputStage", self.output_stage),
                ("failureInfo", self.failure_info),
            ];
            for (key, value) in optional {
                if let Some(value) = value {
                    obj.insert(key.to_owned(), value);
                }
            }
        }
        info
    }
}

/// Two-level failure chain (`PrestoException` caused by an OOM).
pub fn memory_failure() -> Value {
    json!({
        "type": "com.facebook.presto.ExceededMemoryLimitException",
        "message": "Query exceeded per-node user memory limit of 1GB",
        "cause": {
            "type": "java.lang.OutOfMemoryError",
            "stack": ["java.nio.Bits.reserveMemory(Bits.java:694)"],
        },
        "stack": ["com.facebook.presto.memory.QueryContext.enforceUserMemoryLimit(QueryContext.java:309)"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_has_two_stages() {
        let info = QueryInfoBuilder::new().build();
        let output = &info["outputStage"];
        assert_eq!(output["stageId"], format!("{QUERY_ID}.0"));
        assert_eq!(output["subStages"].as_array().map(Vec::len), Some(1));
        assert!(info.get("failureInfo").is_none());
    }

    #[test]
    fn unplanned_stage_omits_plan() {
        let stage = StageInfoBuilder::new("q_1.0").build();
        assert!(stage.get("plan").is_none());
    }

    #[test]
    fn failed_query_carries_report() {
        let info = QueryInfoBuilder::new().failed(memory_failure()).build();
        assert_eq!(info["state"], "FAILED");
        assert_eq!(info["failureInfo"]["cause"]["type"], "java.lang.OutOfMemoryError");
    }
}
