// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed model of the coordinator-state JSON API.
//!
//! Snapshots ([`QueryInfo`], [`StageInfo`], [`TaskInfo`], [`OutputBufferInfo`],
//! [`MemoryPoolInfo`]) validate their invariants on construction and decode
//! through [`presto_state_decode`]. Connector handles are trait objects picked
//! by field shape; plan nodes and expressions are closed enums tagged by
//! `@type`. Every type serializes back to the engine's wire form.
//!
//! ```ignore
//! use presto_state_model::{standard_registry, QueryInfo};
//!
//! let registry = standard_registry()?;
//! let info: QueryInfo = presto_state_decode::decode_str(registry, &body)?;
//! ```
#![forbid(unsafe_code)]

pub mod buffer;
pub mod expression;
pub mod handle;
pub mod ids;
pub mod memory;
pub mod plan;
pub mod query;
pub mod registry;
pub mod scalar;
pub mod stage;
pub mod task;
pub mod units;

pub use buffer::{BufferInfo, OutputBufferInfo, PageBufferInfo};
pub use expression::Expression;
pub use handle::{
    ColumnHandle, ConnectorPartitioningHandle, ConnectorTableHandle, ConnectorTransactionHandle,
    Handle, PartitioningHandle, PartitioningScheme, SchemaTableName, TableHandle,
};
pub use ids::{
    ConnectorId, MemoryPoolId, OutputBufferId, PlanFragmentId, PlanNodeId, QueryId, StageId,
    TaskId, TransactionId,
};
pub use memory::MemoryPoolInfo;
pub use plan::{PlanFragment, PlanNode};
pub use query::{ExecutionFailureInfo, QueryInfo, QueryStats};
pub use registry::{build_standard, register_standard, standard_registry};
pub use scalar::{BufferState, BufferType, QueryState, StageState, TaskState};
pub use stage::StageInfo;
pub use task::{TaskInfo, TaskStatus};
pub use units::{DataSize, Duration};
