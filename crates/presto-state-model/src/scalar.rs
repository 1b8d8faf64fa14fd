// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closed enumerations carried as their case-sensitive symbolic names.

use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError, ValidationReason};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    // Outside a decoder there is no field; `$` marks the value itself.
                    other => Err(ValidationError::new(
                        "$",
                        ValidationReason::UnknownName(other.to_owned()),
                    )),
                }
            }
        }

        impl Decode for $name {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let text = String::decode(value, cx)?;
                text.parse().map_err(|e: ValidationError| cx.invalid(e.reason))
            }
        }
    };
}

wire_enum!(
    /// Lifecycle of a query on the coordinator.
    QueryState {
        /// Waiting in a resource group queue.
        Queued = "QUEUED",
        /// Waiting for cluster resources.
        WaitingForResources = "WAITING_FOR_RESOURCES",
        /// Being dispatched to a coordinator.
        Dispatching = "DISPATCHING",
        /// Being planned.
        Planning = "PLANNING",
        /// Stages are being scheduled.
        Starting = "STARTING",
        /// At least one task is running.
        Running = "RUNNING",
        /// Draining final output.
        Finishing = "FINISHING",
        /// Completed successfully.
        Finished = "FINISHED",
        /// Completed with a failure.
        Failed = "FAILED",
    }
);

impl QueryState {
    /// `true` for terminal states.
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

wire_enum!(
    /// Lifecycle of a stage.
    StageState {
        /// Planned, not yet scheduling.
        Planned = "PLANNED",
        /// Tasks are being placed.
        Scheduling = "SCHEDULING",
        /// Splits are being assigned.
        SchedulingSplits = "SCHEDULING_SPLITS",
        /// Fully scheduled.
        Scheduled = "SCHEDULED",
        /// Running.
        Running = "RUNNING",
        /// Completed successfully.
        Finished = "FINISHED",
        /// Canceled by the user.
        Canceled = "CANCELED",
        /// Aborted because the query failed elsewhere.
        Aborted = "ABORTED",
        /// Failed.
        Failed = "FAILED",
    }
);

impl StageState {
    /// `true` for terminal states.
    pub const fn is_done(self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Canceled | Self::Aborted | Self::Failed
        )
    }
}

wire_enum!(
    /// Lifecycle of a task.
    TaskState {
        /// Created, not yet running.
        Planned = "PLANNED",
        /// Running.
        Running = "RUNNING",
        /// Completed successfully.
        Finished = "FINISHED",
        /// Canceled.
        Canceled = "CANCELED",
        /// Aborted.
        Aborted = "ABORTED",
        /// Failed.
        Failed = "FAILED",
    }
);

impl TaskState {
    /// `true` for terminal states.
    pub const fn is_done(self) -> bool {
        !matches!(self, Self::Planned | Self::Running)
    }
}

wire_enum!(
    /// Output buffer lifecycle.
    BufferState {
        /// Accepting buffers and pages.
        Open = "OPEN",
        /// No new buffers may be added.
        NoMoreBuffers = "NO_MORE_BUFFERS",
        /// No new pages may be added.
        NoMorePages = "NO_MORE_PAGES",
        /// Draining remaining pages.
        Flushing = "FLUSHING",
        /// All pages consumed.
        Finished = "FINISHED",
        /// Failed.
        Failed = "FAILED",
    }
);

impl BufferState {
    /// `true` once the buffer will accept nothing further.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

wire_enum!(
    /// How a task's output buffer distributes pages.
    BufferType {
        /// One buffer per downstream partition.
        Partitioned = "PARTITIONED",
        /// Every consumer receives every page.
        Broadcast = "BROADCAST",
        /// Any consumer may take any page.
        Arbitrary = "ARBITRARY",
        /// Pages are dropped.
        Discarding = "DISCARDING",
        /// Pages are spooled to external storage.
        Spooling = "SPOOLING",
    }
);

wire_enum!(
    /// Exchange distribution.
    ExchangeType {
        /// Many producers, one consumer.
        Gather = "GATHER",
        /// Hash redistribution.
        Repartition = "REPARTITION",
        /// Every consumer receives every row.
        Replicate = "REPLICATE",
    }
);

wire_enum!(
    /// Where an exchange happens.
    ExchangeScope {
        /// Within one task.
        Local = "LOCAL",
        /// Between stages, streamed.
        RemoteStreaming = "REMOTE_STREAMING",
        /// Between stages, materialized.
        RemoteMaterialized = "REMOTE_MATERIALIZED",
    }
);

wire_enum!(
    /// Aggregation phase.
    AggregationStep {
        /// Partial aggregation before an exchange.
        Partial = "PARTIAL",
        /// Final aggregation after an exchange.
        Final = "FINAL",
        /// Intermediate combine step.
        Intermediate = "INTERMEDIATE",
        /// Single-step aggregation.
        Single = "SINGLE",
    }
);

wire_enum!(
    /// Limit phase.
    LimitStep {
        /// Per-task limit.
        Partial = "PARTIAL",
        /// Global limit.
        Final = "FINAL",
    }
);

wire_enum!(
    /// Engine-defined partitioning.
    SystemPartitioning {
        /// Single node.
        Single = "SINGLE",
        /// Fixed number of nodes.
        Fixed = "FIXED",
        /// Follows the source splits.
        Source = "SOURCE",
        /// Scaled writers.
        Scaled = "SCALED",
        /// Coordinator only.
        CoordinatorOnly = "COORDINATOR_ONLY",
        /// Arbitrary placement.
        Arbitrary = "ARBITRARY",
    }
);

wire_enum!(
    /// Engine-defined row-to-partition function.
    SystemPartitionFunction {
        /// Everything to partition zero.
        Single = "SINGLE",
        /// Hash of the partitioning columns.
        Hash = "HASH",
        /// Round robin.
        RoundRobin = "ROUND_ROBIN",
        /// Every row to every partition.
        Broadcast = "BROADCAST",
        /// Not known to the client.
        Unknown = "UNKNOWN",
    }
);

wire_enum!(
    /// Hive bucketing hash flavor.
    BucketFunctionType {
        /// Hive-compatible hashing.
        HiveCompatible = "HIVE_COMPATIBLE",
        /// Engine-native hashing.
        PrestoNative = "PRESTO_NATIVE",
    }
);

wire_enum!(
    /// Role of a Hive column.
    HiveColumnType {
        /// Partition key.
        PartitionKey = "PARTITION_KEY",
        /// Regular data column.
        Regular = "REGULAR",
        /// Synthesized by the connector (`$path`, `$bucket`).
        Synthesized = "SYNTHESIZED",
        /// Pushed-down aggregate.
        Aggregated = "AGGREGATED",
    }
);

wire_enum!(
    /// Binary comparison.
    ComparisonOperator {
        /// `=`
        Equal = "EQUAL",
        /// `<>`
        NotEqual = "NOT_EQUAL",
        /// `<`
        LessThan = "LESS_THAN",
        /// `<=`
        LessThanOrEqual = "LESS_THAN_OR_EQUAL",
        /// `>`
        GreaterThan = "GREATER_THAN",
        /// `>=`
        GreaterThanOrEqual = "GREATER_THAN_OR_EQUAL",
        /// `IS DISTINCT FROM`
        IsDistinctFrom = "IS_DISTINCT_FROM",
    }
);

impl ComparisonOperator {
    /// SQL spelling.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::IsDistinctFrom => "IS DISTINCT FROM",
        }
    }
}

wire_enum!(
    /// Boolean connective.
    LogicalOperator {
        /// `AND`
        And = "AND",
        /// `OR`
        Or = "OR",
    }
);

wire_enum!(
    /// Binary arithmetic.
    ArithmeticOperator {
        /// `+`
        Add = "ADD",
        /// `-`
        Subtract = "SUBTRACT",
        /// `*`
        Multiply = "MULTIPLY",
        /// `/`
        Divide = "DIVIDE",
        /// `%`
        Modulus = "MODULUS",
    }
);

impl ArithmeticOperator {
    /// SQL spelling.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulus => "%",
        }
    }
}
