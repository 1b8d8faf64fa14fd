// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plan fragments and plan nodes.
//!
//! Plan nodes are a closed family discriminated by `@type`; each node owns
//! its sources. Scans embed connector handles, which are resolved by shape.

use crate::expression::Expression;
use crate::handle::{ColumnHandle, PartitioningHandle, PartitioningScheme, TableHandle};
use crate::ids::{PlanFragmentId, PlanNodeId};
use crate::scalar::{AggregationStep, ExchangeScope, ExchangeType, LimitStep};
use presto_state_decode::{Decode, DecodeError, Decoder, Interface};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Root of a fragment: names the result columns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Input.
    pub source: Box<PlanNode>,
    /// User-visible column names.
    pub column_names: Vec<String>,
    /// Symbols feeding each column.
    pub outputs: Vec<String>,
}

/// Computes new symbols from expressions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Input.
    pub source: Box<PlanNode>,
    /// Output symbol to defining expression.
    pub assignments: BTreeMap<String, Expression>,
}

/// Drops rows failing a predicate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Input.
    pub source: Box<PlanNode>,
    /// Row predicate.
    pub predicate: Expression,
}

/// Reads a connector table.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableScanNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Scanned table.
    pub table: TableHandle,
    /// Produced symbols, in order.
    pub output_symbols: Vec<String>,
    /// Symbol to connector column.
    pub assignments: BTreeMap<String, Box<dyn ColumnHandle>>,
}

/// Grouped aggregation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Input.
    pub source: Box<PlanNode>,
    /// Output symbol to aggregate call.
    pub aggregations: BTreeMap<String, Expression>,
    /// Grouping symbols.
    pub grouping_keys: Vec<String>,
    /// Phase.
    pub step: AggregationStep,
}

/// Row-count limit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Input.
    pub source: Box<PlanNode>,
    /// Maximum rows.
    pub count: u64,
    /// Phase.
    pub step: LimitStep,
}

/// Redistributes rows between drivers or stages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Distribution.
    #[serde(rename = "type")]
    pub exchange_type: ExchangeType,
    /// Local or remote.
    pub scope: ExchangeScope,
    /// Output partitioning.
    pub partitioning_scheme: PartitioningScheme,
    /// Inputs.
    pub sources: Vec<PlanNode>,
}

/// Reads the output of other fragments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSourceNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Producing fragments.
    pub source_fragment_ids: Vec<PlanFragmentId>,
    /// Produced symbols.
    pub outputs: Vec<String>,
    /// Distribution of the producing exchange.
    pub exchange_type: ExchangeType,
}

/// Inline rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesNode {
    /// Node id.
    pub id: PlanNodeId,
    /// Produced symbols.
    pub output_symbols: Vec<String>,
    /// Row expressions, one vector per row.
    pub rows: Vec<Vec<Expression>>,
}

/// One plan node.
#[derive(Debug, Serialize)]
#[serde(tag = "@type")]
pub enum PlanNode {
    /// Output.
    #[serde(rename = "output")]
    Output(OutputNode),
    /// Projection.
    #[serde(rename = "project")]
    Project(ProjectNode),
    /// Filter.
    #[serde(rename = "filter")]
    Filter(FilterNode),
    /// Table scan.
    #[serde(rename = "tablescan")]
    TableScan(TableScanNode),
    /// Aggregation.
    #[serde(rename = "aggregation")]
    Aggregation(AggregationNode),
    /// Limit.
    #[serde(rename = "limit")]
    Limit(LimitNode),
    /// Exchange.
    #[serde(rename = "exchange")]
    Exchange(ExchangeNode),
    /// Remote source.
    #[serde(rename = "remoteSource")]
    RemoteSource(RemoteSourceNode),
    /// Inline values.
    #[serde(rename = "values")]
    Values(ValuesNode),
}

impl PlanNode {
    /// Wire tag of this node.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Output(_) => "output",
            Self::Project(_) => "project",
            Self::Filter(_) => "filter",
            Self::TableScan(_) => "tablescan",
            Self::Aggregation(_) => "aggregation",
            Self::Limit(_) => "limit",
            Self::Exchange(_) => "exchange",
            Self::RemoteSource(_) => "remoteSource",
            Self::Values(_) => "values",
        }
    }

    /// Node id.
    pub fn id(&self) -> &PlanNodeId {
        match self {
            Self::Output(n) => &n.id,
            Self::Project(n) => &n.id,
            Self::Filter(n) => &n.id,
            Self::TableScan(n) => &n.id,
            Self::Aggregation(n) => &n.id,
            Self::Limit(n) => &n.id,
            Self::Exchange(n) => &n.id,
            Self::RemoteSource(n) => &n.id,
            Self::Values(n) => &n.id,
        }
    }

    /// Direct sources, in order.
    pub fn sources(&self) -> Vec<&Self> {
        match self {
            Self::Output(OutputNode { source, .. })
            | Self::Project(ProjectNode { source, .. })
            | Self::Filter(FilterNode { source, .. })
            | Self::Aggregation(AggregationNode { source, .. })
            | Self::Limit(LimitNode { source, .. }) => vec![&**source],
            Self::Exchange(node) => node.sources.iter().collect(),
            Self::TableScan(_) | Self::RemoteSource(_) | Self::Values(_) => Vec::new(),
        }
    }

    /// Pre-order search by node id.
    pub fn find(&self, id: &PlanNodeId) -> Option<&Self> {
        if self.id() == id {
            return Some(self);
        }
        self.sources().into_iter().find_map(|s| s.find(id))
    }
}

impl Interface for PlanNode {
    type Value = Self;
    const NAME: &'static str = "PlanNode";
    const TAG_KEY: Option<&'static str> = Some("@type");
}

impl Decode for PlanNode {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        cx.resolve::<Self>(value)
    }
}

impl Decode for Box<PlanNode> {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        PlanNode::decode(value, cx).map(Box::new)
    }
}

macro_rules! plan_node {
    ($($node:ident => $variant:ident { $($field:ident: $wire:literal),* }),+ $(,)?) => {$(
        impl Decode for $node {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let obj = cx.object(value)?;
                Ok(Self { $($field: cx.required(obj, $wire)?),* })
            }
        }

        impl From<$node> for PlanNode {
            fn from(node: $node) -> Self {
                Self::$variant(node)
            }
        }
    )+};
}

plan_node!(
    OutputNode => Output { id: "id", source: "source", column_names: "columnNames", outputs: "outputs" },
    ProjectNode => Project { id: "id", source: "source", assignments: "assignments" },
    FilterNode => Filter { id: "id", source: "source", predicate: "predicate" },
    TableScanNode => TableScan {
        id: "id", table: "table", output_symbols: "outputSymbols", assignments: "assignments"
    },
    AggregationNode => Aggregation {
        id: "id", source: "source", aggregations: "aggregations",
        grouping_keys: "groupingKeys", step: "step"
    },
    LimitNode => Limit { id: "id", source: "source", count: "count", step: "step" },
    ExchangeNode => Exchange {
        id: "id", exchange_type: "type", scope: "scope",
        partitioning_scheme: "partitioningScheme", sources: "sources"
    },
    RemoteSourceNode => RemoteSource {
        id: "id", source_fragment_ids: "sourceFragmentIds", outputs: "outputs",
        exchange_type: "exchangeType"
    },
    ValuesNode => Values { id: "id", output_symbols: "outputSymbols", rows: "rows" },
);

/// Unit of distributed execution: a plan subtree plus its partitioning.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFragment {
    /// Fragment id.
    pub id: PlanFragmentId,
    /// Root node.
    pub root: PlanNode,
    /// Where the fragment runs.
    pub partitioning: PartitioningHandle,
    /// How its output is partitioned.
    pub partitioning_scheme: PartitioningScheme,
}

impl PlanFragment {
    /// Fragments this one reads from, in plan order.
    pub fn remote_sources(&self) -> Vec<&PlanFragmentId> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if let PlanNode::RemoteSource(remote) = node {
                out.extend(remote.source_fragment_ids.iter());
            }
            stack.extend(node.sources().into_iter().rev());
        }
        out
    }
}

impl Decode for PlanFragment {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            id: cx.required(obj, "id")?,
            root: cx.required(obj, "root")?,
            partitioning: cx.required(obj, "partitioning")?,
            partitioning_scheme: cx.required(obj, "partitioningScheme")?,
        })
    }
}
