// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! SQL expression trees embedded in plan nodes.
//!
//! Expressions form a closed family discriminated by `@type`. Each node owns
//! its children; there is no sharing.

use crate::scalar::{ArithmeticOperator, ComparisonOperator, LogicalOperator};
use presto_state_decode::{Decode, DecodeError, Decoder, Interface};
use serde::Serialize;
use serde_json::Value;

/// Plain identifier reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    /// Identifier text, unquoted.
    pub value: String,
}

/// Planner symbol reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReference {
    /// Symbol name.
    pub name: String,
}

/// `BIGINT` literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongLiteral {
    /// Value.
    pub value: i64,
}

/// `DOUBLE` literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoubleLiteral {
    /// Value.
    pub value: f64,
}

/// `VARCHAR` literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringLiteral {
    /// Value, unescaped.
    pub value: String,
}

/// `BOOLEAN` literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanLiteral {
    /// Value.
    pub value: bool,
}

/// Positional `?` placeholder of a prepared statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Zero-based position.
    pub position: u32,
}

/// `left <op> right`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonExpression {
    /// Operator.
    pub operator: ComparisonOperator,
    /// Left operand.
    pub left: Box<Expression>,
    /// Right operand.
    pub right: Box<Expression>,
}

/// `left AND right` / `left OR right`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalBinaryExpression {
    /// Operator.
    pub operator: LogicalOperator,
    /// Left operand.
    pub left: Box<Expression>,
    /// Right operand.
    pub right: Box<Expression>,
}

/// `left <op> right` over numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArithmeticBinaryExpression {
    /// Operator.
    pub operator: ArithmeticOperator,
    /// Left operand.
    pub left: Box<Expression>,
    /// Right operand.
    pub right: Box<Expression>,
}

/// `NOT value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotExpression {
    /// Negated operand.
    pub value: Box<Expression>,
}

/// `value IS NULL`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsNullPredicate {
    /// Tested operand.
    pub value: Box<Expression>,
}

/// `value BETWEEN min AND max`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetweenPredicate {
    /// Tested operand.
    pub value: Box<Expression>,
    /// Lower bound.
    pub min: Box<Expression>,
    /// Upper bound.
    pub max: Box<Expression>,
}

/// Function invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments in call order.
    pub arguments: Vec<Expression>,
    /// `DISTINCT` aggregate.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub distinct: bool,
}

/// `CAST(expression AS type)` / `TRY_CAST`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cast {
    /// Converted operand.
    pub expression: Box<Expression>,
    /// Target type signature.
    #[serde(rename = "type")]
    pub target_type: String,
    /// `TRY_CAST` semantics.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub safe: bool,
}

/// Scalar subquery. The body is kept verbatim; query grammar is not modelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubqueryExpression {
    /// Raw query tree.
    pub query: Value,
}

/// One SQL expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type")]
pub enum Expression {
    /// Identifier.
    #[serde(rename = "identifier")]
    Identifier(Identifier),
    /// Symbol reference.
    #[serde(rename = "symbol")]
    Symbol(SymbolReference),
    /// Integer literal.
    #[serde(rename = "long")]
    Long(LongLiteral),
    /// Double literal.
    #[serde(rename = "double")]
    Double(DoubleLiteral),
    /// String literal.
    #[serde(rename = "string")]
    String(StringLiteral),
    /// Boolean literal.
    #[serde(rename = "boolean")]
    Boolean(BooleanLiteral),
    /// `NULL`.
    #[serde(rename = "null")]
    Null,
    /// Placeholder.
    #[serde(rename = "parameter")]
    Parameter(Parameter),
    /// Comparison.
    #[serde(rename = "comparison")]
    Comparison(ComparisonExpression),
    /// `AND` / `OR`.
    #[serde(rename = "logicalBinary")]
    LogicalBinary(LogicalBinaryExpression),
    /// Arithmetic.
    #[serde(rename = "arithmeticBinary")]
    ArithmeticBinary(ArithmeticBinaryExpression),
    /// Negation.
    #[serde(rename = "not")]
    Not(NotExpression),
    /// Null test.
    #[serde(rename = "isNull")]
    IsNull(IsNullPredicate),
    /// Range test.
    #[serde(rename = "between")]
    Between(BetweenPredicate),
    /// Function call.
    #[serde(rename = "functionCall")]
    FunctionCall(FunctionCall),
    /// Type conversion.
    #[serde(rename = "cast")]
    Cast(Cast),
    /// Subquery.
    #[serde(rename = "subquery")]
    Subquery(SubqueryExpression),
}

impl Expression {
    /// Wire tag of this node.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "identifier",
            Self::Symbol(_) => "symbol",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
            Self::Parameter(_) => "parameter",
            Self::Comparison(_) => "comparison",
            Self::LogicalBinary(_) => "logicalBinary",
            Self::ArithmeticBinary(_) => "arithmeticBinary",
            Self::Not(_) => "not",
            Self::IsNull(_) => "isNull",
            Self::Between(_) => "between",
            Self::FunctionCall(_) => "functionCall",
            Self::Cast(_) => "cast",
            Self::Subquery(_) => "subquery",
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Comparison(ComparisonExpression { left, right, .. })
            | Self::LogicalBinary(LogicalBinaryExpression { left, right, .. })
            | Self::ArithmeticBinary(ArithmeticBinaryExpression { left, right, .. }) => {
                vec![&**left, &**right]
            }
            Self::Not(NotExpression { value }) | Self::IsNull(IsNullPredicate { value }) => {
                vec![&**value]
            }
            Self::Between(node) => vec![&*node.value, &*node.min, &*node.max],
            Self::FunctionCall(node) => node.arguments.iter().collect(),
            Self::Cast(node) => vec![&*node.expression],
            Self::Identifier(_)
            | Self::Symbol(_)
            | Self::Long(_)
            | Self::Double(_)
            | Self::String(_)
            | Self::Boolean(_)
            | Self::Null
            | Self::Parameter(_)
            | Self::Subquery(_) => Vec::new(),
        }
    }

    /// Highest placeholder position in the tree, if any.
    pub fn max_parameter(&self) -> Option<u32> {
        let own = match self {
            Self::Parameter(p) => Some(p.position),
            _ => None,
        };
        self.children()
            .into_iter()
            .filter_map(Self::max_parameter)
            .chain(own)
            .max()
    }
}

impl Interface for Expression {
    type Value = Self;
    const NAME: &'static str = "Expression";
    const TAG_KEY: Option<&'static str> = Some("@type");
}

impl Decode for Expression {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        cx.resolve::<Self>(value)
    }
}

macro_rules! expression_node {
    ($($node:ident => $variant:ident { $($field:ident: $wire:literal),* }),+ $(,)?) => {$(
        impl Decode for $node {
            fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
                let obj = cx.object(value)?;
                Ok(Self { $($field: cx.required(obj, $wire)?),* })
            }
        }

        impl From<$node> for Expression {
            fn from(node: $node) -> Self {
                Self::$variant(node)
            }
        }
    )+};
}

expression_node!(
    Identifier => Identifier { value: "value" },
    SymbolReference => Symbol { name: "name" },
    LongLiteral => Long { value: "value" },
    DoubleLiteral => Double { value: "value" },
    StringLiteral => String { value: "value" },
    BooleanLiteral => Boolean { value: "value" },
    Parameter => Parameter { position: "position" },
    ComparisonExpression => Comparison { operator: "operator", left: "left", right: "right" },
    LogicalBinaryExpression => LogicalBinary { operator: "operator", left: "left", right: "right" },
    ArithmeticBinaryExpression => ArithmeticBinary { operator: "operator", left: "left", right: "right" },
    NotExpression => Not { value: "value" },
    IsNullPredicate => IsNull { value: "value" },
    BetweenPredicate => Between { value: "value", min: "min", max: "max" },
);

impl Decode for FunctionCall {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            name: cx.required(obj, "name")?,
            arguments: cx.required(obj, "arguments")?,
            distinct: cx.defaulted(obj, "distinct")?,
        })
    }
}

impl From<FunctionCall> for Expression {
    fn from(node: FunctionCall) -> Self {
        Self::FunctionCall(node)
    }
}

impl Decode for Cast {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            expression: cx.required(obj, "expression")?,
            target_type: cx.required(obj, "type")?,
            safe: cx.defaulted(obj, "safe")?,
        })
    }
}

impl From<Cast> for Expression {
    fn from(node: Cast) -> Self {
        Self::Cast(node)
    }
}

impl Decode for SubqueryExpression {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        Ok(Self {
            query: cx.required(obj, "query")?,
        })
    }
}

impl From<SubqueryExpression> for Expression {
    fn from(node: SubqueryExpression) -> Self {
        Self::Subquery(node)
    }
}

impl Decode for Box<Expression> {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        Expression::decode(value, cx).map(Box::new)
    }
}
