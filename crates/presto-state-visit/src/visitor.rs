// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Double dispatch over expression and plan trees.
//!
//! Each node family gets a visitor trait with one hook per kind. Dispatch is a
//! plain `match` in [`accept_expression`] / [`accept_plan`]; the trees carry no
//! behaviour. Every hook falls through to `visit_default`, which fails with
//! [`VisitError::Unsupported`] unless the visitor overrides it. The default
//! receives the node's direct children so a recursive fallback is one loop.
//!
//! Visitors take `&self` and thread mutable state through the context `C`.

use crate::error::VisitError;
use presto_state_model::expression::{
    ArithmeticBinaryExpression, BetweenPredicate, BooleanLiteral, Cast, ComparisonExpression,
    DoubleLiteral, FunctionCall, Identifier, IsNullPredicate, LogicalBinaryExpression,
    LongLiteral, NotExpression, Parameter, StringLiteral, SubqueryExpression, SymbolReference,
};
use presto_state_model::plan::{
    AggregationNode, ExchangeNode, FilterNode, LimitNode, OutputNode, ProjectNode,
    RemoteSourceNode, TableScanNode, ValuesNode,
};
use presto_state_model::{Expression, PlanNode};

/// Visitor over [`Expression`] trees.
pub trait ExpressionVisitor<C> {
    /// Result of visiting one node.
    type Output;

    /// Fallback for kinds without a dedicated hook.
    ///
    /// # Errors
    /// [`VisitError::Unsupported`] unless overridden.
    fn visit_default(
        &self,
        kind: &'static str,
        _children: &[&Expression],
        _cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        Err(VisitError::Unsupported { kind })
    }

    /// Identifier.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_identifier(&self, _node: &Identifier, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("identifier", &[], cx)
    }

    /// Symbol reference.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_symbol(&self, _node: &SymbolReference, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("symbol", &[], cx)
    }

    /// Integer literal.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_long(&self, _node: &LongLiteral, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("long", &[], cx)
    }

    /// Double literal.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_double(&self, _node: &DoubleLiteral, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("double", &[], cx)
    }

    /// String literal.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_string(&self, _node: &StringLiteral, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("string", &[], cx)
    }

    /// Boolean literal.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_boolean(&self, _node: &BooleanLiteral, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("boolean", &[], cx)
    }

    /// `NULL`.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_null(&self, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("null", &[], cx)
    }

    /// Placeholder.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_parameter(&self, _node: &Parameter, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("parameter", &[], cx)
    }

    /// Comparison.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_comparison(
        &self,
        node: &ComparisonExpression,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("comparison", &[node.left.as_ref(), node.right.as_ref()], cx)
    }

    /// `AND` / `OR`.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_logical_binary(
        &self,
        node: &LogicalBinaryExpression,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("logicalBinary", &[node.left.as_ref(), node.right.as_ref()], cx)
    }

    /// Arithmetic.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_arithmetic_binary(
        &self,
        node: &ArithmeticBinaryExpression,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("arithmeticBinary", &[node.left.as_ref(), node.right.as_ref()], cx)
    }

    /// Negation.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_not(&self, node: &NotExpression, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("not", &[node.value.as_ref()], cx)
    }

    /// Null test.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_is_null(&self, node: &IsNullPredicate, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("isNull", &[node.value.as_ref()], cx)
    }

    /// Range test.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_between(&self, node: &BetweenPredicate, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default(
            "between",
            &[node.value.as_ref(), node.min.as_ref(), node.max.as_ref()],
            cx,
        )
    }

    /// Function call.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_function_call(
        &self,
        node: &FunctionCall,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        let arguments: Vec<&Expression> = node.arguments.iter().collect();
        self.visit_default("functionCall", &arguments, cx)
    }

    /// Type conversion.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_cast(&self, node: &Cast, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("cast", &[node.expression.as_ref()], cx)
    }

    /// Subquery. Its body is opaque, so no children are passed on.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_subquery(
        &self,
        _node: &SubqueryExpression,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("subquery", &[], cx)
    }
}

/// Routes `expr` to the matching hook of `visitor`.
///
/// # Errors
/// Whatever the hook returns.
pub fn accept_expression<C, V>(
    visitor: &V,
    expr: &Expression,
    cx: &mut C,
) -> Result<V::Output, VisitError>
where
    V: ExpressionVisitor<C> + ?Sized,
{
    match expr {
        Expression::Identifier(n) => visitor.visit_identifier(n, cx),
        Expression::Symbol(n) => visitor.visit_symbol(n, cx),
        Expression::Long(n) => visitor.visit_long(n, cx),
        Expression::Double(n) => visitor.visit_double(n, cx),
        Expression::String(n) => visitor.visit_string(n, cx),
        Expression::Boolean(n) => visitor.visit_boolean(n, cx),
        Expression::Null => visitor.visit_null(cx),
        Expression::Parameter(n) => visitor.visit_parameter(n, cx),
        Expression::Comparison(n) => visitor.visit_comparison(n, cx),
        Expression::LogicalBinary(n) => visitor.visit_logical_binary(n, cx),
        Expression::ArithmeticBinary(n) => visitor.visit_arithmetic_binary(n, cx),
        Expression::Not(n) => visitor.visit_not(n, cx),
        Expression::IsNull(n) => visitor.visit_is_null(n, cx),
        Expression::Between(n) => visitor.visit_between(n, cx),
        Expression::FunctionCall(n) => visitor.visit_function_call(n, cx),
        Expression::Cast(n) => visitor.visit_cast(n, cx),
        Expression::Subquery(n) => visitor.visit_subquery(n, cx),
    }
}

/// Visitor over [`PlanNode`] trees.
pub trait PlanVisitor<C> {
    /// Result of visiting one node.
    type Output;

    /// Fallback for kinds without a dedicated hook.
    ///
    /// # Errors
    /// [`VisitError::Unsupported`] unless overridden.
    fn visit_default(
        &self,
        kind: &'static str,
        _sources: &[&PlanNode],
        _cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        Err(VisitError::Unsupported { kind })
    }

    /// Output.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_output(&self, node: &OutputNode, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("output", &[node.source.as_ref()], cx)
    }

    /// Projection.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_project(&self, node: &ProjectNode, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("project", &[node.source.as_ref()], cx)
    }

    /// Filter.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_filter(&self, node: &FilterNode, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("filter", &[node.source.as_ref()], cx)
    }

    /// Table scan.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_table_scan(
        &self,
        _node: &TableScanNode,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("tablescan", &[], cx)
    }

    /// Aggregation.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_aggregation(
        &self,
        node: &AggregationNode,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("aggregation", &[node.source.as_ref()], cx)
    }

    /// Limit.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_limit(&self, node: &LimitNode, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("limit", &[node.source.as_ref()], cx)
    }

    /// Exchange.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_exchange(&self, node: &ExchangeNode, cx: &mut C) -> Result<Self::Output, VisitError> {
        let sources: Vec<&PlanNode> = node.sources.iter().collect();
        self.visit_default("exchange", &sources, cx)
    }

    /// Remote source.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_remote_source(
        &self,
        _node: &RemoteSourceNode,
        cx: &mut C,
    ) -> Result<Self::Output, VisitError> {
        self.visit_default("remoteSource", &[], cx)
    }

    /// Inline values.
    ///
    /// # Errors
    /// Propagates the fallback.
    fn visit_values(&self, _node: &ValuesNode, cx: &mut C) -> Result<Self::Output, VisitError> {
        self.visit_default("values", &[], cx)
    }
}

/// Routes `node` to the matching hook of `visitor`.
///
/// # Errors
/// Whatever the hook returns.
pub fn accept_plan<C, V>(visitor: &V, node: &PlanNode, cx: &mut C) -> Result<V::Output, VisitError>
where
    V: PlanVisitor<C> + ?Sized,
{
    match node {
        PlanNode::Output(n) => visitor.visit_output(n, cx),
        PlanNode::Project(n) => visitor.visit_project(n, cx),
        PlanNode::Filter(n) => visitor.visit_filter(n, cx),
        PlanNode::TableScan(n) => visitor.visit_table_scan(n, cx),
        PlanNode::Aggregation(n) => visitor.visit_aggregation(n, cx),
        PlanNode::Limit(n) => visitor.visit_limit(n, cx),
        PlanNode::Exchange(n) => visitor.visit_exchange(n, cx),
        PlanNode::RemoteSource(n) => visitor.visit_remote_source(n, cx),
        PlanNode::Values(n) => visitor.visit_values(n, cx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_model::scalar::ComparisonOperator;

    struct Silent;

    impl ExpressionVisitor<()> for Silent {
        type Output = ();
    }

    // Opts into a total traversal by overriding the fallback.
    struct LeafCounter;

    impl ExpressionVisitor<usize> for LeafCounter {
        type Output = ();

        fn visit_default(
            &self,
            _kind: &'static str,
            children: &[&Expression],
            cx: &mut usize,
        ) -> Result<(), VisitError> {
            if children.is_empty() {
                *cx += 1;
            }
            for child in children {
                accept_expression(self, child, cx)?;
            }
            Ok(())
        }
    }

    fn comparison() -> Expression {
        ComparisonExpression {
            operator: ComparisonOperator::LessThan,
            left: Box::new(SymbolReference { name: "a".into() }.into()),
            right: Box::new(
                FunctionCall {
                    name: "greatest".into(),
                    arguments: vec![LongLiteral { value: 1 }.into(), Expression::Null],
                    distinct: false,
                }
                .into(),
            ),
        }
        .into()
    }

    #[test]
    fn unhandled_kind_is_unsupported() {
        let err = accept_expression(&Silent, &comparison(), &mut ()).unwrap_err();
        assert_eq!(err, VisitError::Unsupported { kind: "comparison" });
        assert_eq!(
            accept_expression(&Silent, &Expression::Null, &mut ()).unwrap_err(),
            VisitError::Unsupported { kind: "null" }
        );
    }

    #[test]
    fn overridden_default_reaches_every_leaf() {
        let mut leaves = 0;
        accept_expression(&LeafCounter, &comparison(), &mut leaves).unwrap();
        assert_eq!(leaves, 3);
    }
}
