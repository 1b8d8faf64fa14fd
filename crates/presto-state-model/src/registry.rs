// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The standard registry: built-in connector handles plus the expression and
//! plan-node families.
//!
//! [`standard_registry`] builds the table once on first use and hands out a
//! shared reference afterwards. Callers that also decode custom connector
//! handles start from [`register_standard`] and add their own variants:
//!
//! ```ignore
//! let registry = register_standard(Registry::builder())?
//!     .register(VariantDef::<dyn ConnectorTableHandle>::structural(
//!         "kafka",
//!         &["topicName", "messageDataFormat"],
//!         decode_kafka_table,
//!     ))?
//!     .build();
//! ```

use crate::expression::{
    ArithmeticBinaryExpression, BetweenPredicate, BooleanLiteral, Cast, ComparisonExpression,
    DoubleLiteral, Expression, FunctionCall, Identifier, IsNullPredicate,
    LogicalBinaryExpression, LongLiteral, NotExpression, Parameter, StringLiteral,
    SubqueryExpression, SymbolReference,
};
use crate::handle::{
    ColumnHandle, ConnectorPartitioningHandle, ConnectorTableHandle, ConnectorTransactionHandle,
    GlobalSystemTransactionHandle, HiveColumnHandle, HivePartitioningHandle, HiveTableHandle,
    HiveTransactionHandle, RemoteTransactionHandle, SystemColumnHandle,
    SystemPartitioningHandle, SystemTableHandle, TpchColumnHandle, TpchPartitioningHandle,
    TpchTableHandle,
};
use crate::plan::{
    AggregationNode, ExchangeNode, FilterNode, LimitNode, OutputNode, PlanNode, ProjectNode,
    RemoteSourceNode, TableScanNode, ValuesNode,
};
use once_cell::sync::OnceCell;
use presto_state_decode::{
    Decode, DecodeError, Decoder, Registry, RegistryBuilder, RegistryError, VariantDef,
};
use serde_json::Value;

static STANDARD: OnceCell<Registry> = OnceCell::new();

/// Shared registry with every built-in variant.
pub fn standard_registry() -> Result<&'static Registry, RegistryError> {
    STANDARD.get_or_try_init(build_standard)
}

/// Fresh registry with every built-in variant.
pub fn build_standard() -> Result<Registry, RegistryError> {
    register_standard(Registry::builder()).map(RegistryBuilder::build)
}

/// Add every built-in variant to `builder`.
pub fn register_standard(builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    let builder = register_handles(builder)?;
    let builder = register_expressions(builder)?;
    register_plan_nodes(builder)
}

fn partitioning<T>(
    value: &Value,
    cx: &mut Decoder<'_>,
) -> Result<Box<dyn ConnectorPartitioningHandle>, DecodeError>
where
    T: ConnectorPartitioningHandle + Decode,
{
    Ok(Box::new(T::decode(value, cx)?))
}

fn transaction<T>(
    value: &Value,
    cx: &mut Decoder<'_>,
) -> Result<Box<dyn ConnectorTransactionHandle>, DecodeError>
where
    T: ConnectorTransactionHandle + Decode,
{
    Ok(Box::new(T::decode(value, cx)?))
}

fn table<T>(value: &Value, cx: &mut Decoder<'_>) -> Result<Box<dyn ConnectorTableHandle>, DecodeError>
where
    T: ConnectorTableHandle + Decode,
{
    Ok(Box::new(T::decode(value, cx)?))
}

fn column<T>(value: &Value, cx: &mut Decoder<'_>) -> Result<Box<dyn ColumnHandle>, DecodeError>
where
    T: ColumnHandle + Decode,
{
    Ok(Box::new(T::decode(value, cx)?))
}

fn register_handles(builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    builder
        .register_all::<dyn ConnectorPartitioningHandle>([
            VariantDef::structural(
                "system",
                &["partitioning", "function"],
                partitioning::<SystemPartitioningHandle>,
            ),
            VariantDef::structural(
                "hive",
                &["bucketCount", "bucketFunctionType"],
                partitioning::<HivePartitioningHandle>,
            ),
            VariantDef::structural(
                "tpch",
                &["table", "totalRows"],
                partitioning::<TpchPartitioningHandle>,
            ),
        ])?
        .register_all::<dyn ConnectorTransactionHandle>([
            VariantDef::structural("hive", &["uuid"], transaction::<HiveTransactionHandle>),
            VariantDef::structural(
                "global-system",
                &["connectorId", "transactionId"],
                transaction::<GlobalSystemTransactionHandle>,
            ),
            VariantDef::structural("remote", &[], transaction::<RemoteTransactionHandle>),
        ])?
        .register_all::<dyn ConnectorTableHandle>([
            VariantDef::structural("tpch", &["tableName", "scaleFactor"], table::<TpchTableHandle>),
            VariantDef::structural("hive", &["schemaName", "tableName"], table::<HiveTableHandle>),
            VariantDef::structural(
                "system",
                &["connectorId", "schemaName", "tableName"],
                table::<SystemTableHandle>,
            ),
        ])?
        .register_all::<dyn ColumnHandle>([
            VariantDef::structural("system", &["columnName"], column::<SystemColumnHandle>),
            VariantDef::structural("tpch", &["columnName", "type"], column::<TpchColumnHandle>),
            VariantDef::structural(
                "hive",
                &["name", "hiveType", "hiveColumnIndex", "columnType"],
                column::<HiveColumnHandle>,
            ),
        ])
}

fn expression<T>(value: &Value, cx: &mut Decoder<'_>) -> Result<Expression, DecodeError>
where
    T: Decode + Into<Expression>,
{
    T::decode(value, cx).map(Into::into)
}

fn null_literal(value: &Value, cx: &mut Decoder<'_>) -> Result<Expression, DecodeError> {
    cx.object(value)?;
    Ok(Expression::Null)
}

fn register_expressions(builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    builder.register_all::<Expression>([
        VariantDef::tagged("identifier", "identifier", expression::<Identifier>),
        VariantDef::tagged("symbol", "symbol", expression::<SymbolReference>),
        VariantDef::tagged("long", "long", expression::<LongLiteral>),
        VariantDef::tagged("double", "double", expression::<DoubleLiteral>),
        VariantDef::tagged("string", "string", expression::<StringLiteral>),
        VariantDef::tagged("boolean", "boolean", expression::<BooleanLiteral>),
        VariantDef::tagged("null", "null", null_literal),
        VariantDef::tagged("parameter", "parameter", expression::<Parameter>),
        VariantDef::tagged("comparison", "comparison", expression::<ComparisonExpression>),
        VariantDef::tagged(
            "logicalBinary",
            "logicalBinary",
            expression::<LogicalBinaryExpression>,
        ),
        VariantDef::tagged(
            "arithmeticBinary",
            "arithmeticBinary",
            expression::<ArithmeticBinaryExpression>,
        ),
        VariantDef::tagged("not", "not", expression::<NotExpression>),
        VariantDef::tagged("isNull", "isNull", expression::<IsNullPredicate>),
        VariantDef::tagged("between", "between", expression::<BetweenPredicate>),
        VariantDef::tagged("functionCall", "functionCall", expression::<FunctionCall>),
        VariantDef::tagged("cast", "cast", expression::<Cast>),
        VariantDef::tagged("subquery", "subquery", expression::<SubqueryExpression>),
    ])
}

fn plan_node<T>(value: &Value, cx: &mut Decoder<'_>) -> Result<PlanNode, DecodeError>
where
    T: Decode + Into<PlanNode>,
{
    T::decode(value, cx).map(Into::into)
}

// Nodes whose key set is unique among plan nodes also carry a signature,
// so older payloads that omit `@type` still resolve.
fn register_plan_nodes(builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    builder.register_all::<PlanNode>([
        VariantDef::tagged("output", "output", plan_node::<OutputNode>)
            .with_signature(&["id", "source", "columnNames", "outputs"]),
        VariantDef::tagged("project", "project", plan_node::<ProjectNode>),
        VariantDef::tagged("filter", "filter", plan_node::<FilterNode>)
            .with_signature(&["id", "source", "predicate"]),
        VariantDef::tagged("tablescan", "tablescan", plan_node::<TableScanNode>)
            .with_signature(&["id", "table", "outputSymbols", "assignments"]),
        VariantDef::tagged("aggregation", "aggregation", plan_node::<AggregationNode>)
            .with_signature(&["id", "source", "aggregations", "groupingKeys", "step"]),
        VariantDef::tagged("limit", "limit", plan_node::<LimitNode>)
            .with_signature(&["id", "source", "count", "step"]),
        VariantDef::tagged("exchange", "exchange", plan_node::<ExchangeNode>)
            .with_signature(&["id", "partitioningScheme", "sources"]),
        VariantDef::tagged("remoteSource", "remoteSource", plan_node::<RemoteSourceNode>)
            .with_signature(&["id", "sourceFragmentIds"]),
        VariantDef::tagged("values", "values", plan_node::<ValuesNode>)
            .with_signature(&["id", "outputSymbols", "rows"]),
    ])
}
