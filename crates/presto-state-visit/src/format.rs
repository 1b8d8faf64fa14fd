// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renders expressions in engine SQL syntax.
//!
//! Binary and predicate forms are always parenthesized, so the output never
//! depends on operator precedence. Placeholders are replaced by literals
//! when a parameter list is supplied and printed as `?` otherwise.

use crate::error::VisitError;
use crate::visitor::{accept_expression, ExpressionVisitor};
use presto_state_model::expression::{
    ArithmeticBinaryExpression, BetweenPredicate, BooleanLiteral, Cast, ComparisonExpression,
    DoubleLiteral, FunctionCall, Identifier, IsNullPredicate, LogicalBinaryExpression,
    LongLiteral, NotExpression, Parameter, StringLiteral, SymbolReference,
};
use presto_state_model::Expression;
use serde_json::Value;

/// Formats `expr`, substituting `params` for placeholders when given.
///
/// # Errors
/// [`VisitError::MissingParameter`] for a placeholder past the end of
/// `params`, [`VisitError::InvalidParameter`] for an object parameter, and
/// [`VisitError::Unsupported`] for subqueries.
pub fn format_expression(expr: &Expression, params: Option<&[Value]>) -> Result<String, VisitError> {
    ExpressionFormatter::new(params).format(expr)
}

/// Expression visitor producing SQL text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionFormatter<'p> {
    params: Option<&'p [Value]>,
}

impl<'p> ExpressionFormatter<'p> {
    /// Formatter with an optional parameter list.
    pub const fn new(params: Option<&'p [Value]>) -> Self {
        Self { params }
    }

    /// Formats one tree.
    ///
    /// # Errors
    /// See [`format_expression`].
    pub fn format(&self, expr: &Expression) -> Result<String, VisitError> {
        accept_expression(self, expr, &mut ())
    }

    fn binary(&self, left: &Expression, op: &str, right: &Expression) -> Result<String, VisitError> {
        let left = self.format(left)?;
        let right = self.format(right)?;
        Ok(format!("({left} {op} {right})"))
    }

    fn parameter(&self, position: u32) -> Result<String, VisitError> {
        let Some(params) = self.params else {
            return Ok("?".to_owned());
        };
        let value = usize::try_from(position)
            .ok()
            .and_then(|index| params.get(index))
            .ok_or(VisitError::MissingParameter {
                position,
                available: params.len(),
            })?;
        literal(value, position)
    }
}

impl ExpressionVisitor<()> for ExpressionFormatter<'_> {
    type Output = String;

    fn visit_identifier(&self, node: &Identifier, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(quote_identifier(&node.value))
    }

    fn visit_symbol(&self, node: &SymbolReference, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(node.name.clone())
    }

    fn visit_long(&self, node: &LongLiteral, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(node.value.to_string())
    }

    fn visit_double(&self, node: &DoubleLiteral, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(format_double(node.value))
    }

    fn visit_string(&self, node: &StringLiteral, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(quote_string(&node.value))
    }

    fn visit_boolean(&self, node: &BooleanLiteral, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(node.value.to_string())
    }

    fn visit_null(&self, _cx: &mut ()) -> Result<String, VisitError> {
        Ok("null".to_owned())
    }

    fn visit_parameter(&self, node: &Parameter, _cx: &mut ()) -> Result<String, VisitError> {
        self.parameter(node.position)
    }

    fn visit_comparison(
        &self,
        node: &ComparisonExpression,
        _cx: &mut (),
    ) -> Result<String, VisitError> {
        self.binary(&node.left, node.operator.symbol(), &node.right)
    }

    fn visit_logical_binary(
        &self,
        node: &LogicalBinaryExpression,
        _cx: &mut (),
    ) -> Result<String, VisitError> {
        self.binary(&node.left, node.operator.name(), &node.right)
    }

    fn visit_arithmetic_binary(
        &self,
        node: &ArithmeticBinaryExpression,
        _cx: &mut (),
    ) -> Result<String, VisitError> {
        self.binary(&node.left, node.operator.symbol(), &node.right)
    }

    fn visit_not(&self, node: &NotExpression, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(format!("(NOT {})", self.format(&node.value)?))
    }

    fn visit_is_null(&self, node: &IsNullPredicate, _cx: &mut ()) -> Result<String, VisitError> {
        Ok(format!("({} IS NULL)", self.format(&node.value)?))
    }

    fn visit_between(&self, node: &BetweenPredicate, _cx: &mut ()) -> Result<String, VisitError> {
        let value = self.format(&node.value)?;
        let min = self.format(&node.min)?;
        let max = self.format(&node.max)?;
        Ok(format!("({value} BETWEEN {min} AND {max})"))
    }

    fn visit_function_call(&self, node: &FunctionCall, _cx: &mut ()) -> Result<String, VisitError> {
        let arguments = node
            .arguments
            .iter()
            .map(|arg| self.format(arg))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        let distinct = if node.distinct { "DISTINCT " } else { "" };
        Ok(format!("{}({distinct}{arguments})", node.name))
    }

    fn visit_cast(&self, node: &Cast, _cx: &mut ()) -> Result<String, VisitError> {
        let function = if node.safe { "TRY_CAST" } else { "CAST" };
        let operand = self.format(&node.expression)?;
        Ok(format!("{function}({operand} AS {})", node.target_type))
    }
}

/// `'text'` with embedded quotes doubled.
pub fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Bare when the identifier is a plain lowercase word, double-quoted otherwise.
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        name.to_owned()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn format_double(value: f64) -> String {
    if value.is_nan() {
        "nan()".to_owned()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "infinity()".to_owned()
        } else {
            "-infinity()".to_owned()
        }
    } else {
        // Debug keeps the fractional part of integral values (`1.0`).
        format!("{value:?}")
    }
}

fn literal(value: &Value, position: u32) -> Result<String, VisitError> {
    match value {
        Value::Null => Ok("null".to_owned()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(quote_string(s)),
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| literal(item, position))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("ARRAY[{}]", items.join(", ")))
        }
        Value::Object(_) => Err(VisitError::InvalidParameter { position }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_model::scalar::{ArithmeticOperator, ComparisonOperator, LogicalOperator};
    use serde_json::json;

    fn param(position: u32) -> Box<Expression> {
        Box::new(Parameter { position }.into())
    }

    fn symbol(name: &str) -> Box<Expression> {
        Box::new(SymbolReference { name: name.into() }.into())
    }

    #[test]
    fn parameters_substitute_in_order() {
        let expr: Expression = ComparisonExpression {
            operator: ComparisonOperator::Equal,
            left: param(0),
            right: param(1),
        }
        .into();
        let params = [json!(42), json!("x")];
        assert_eq!(format_expression(&expr, Some(&params)).unwrap(), "(42 = 'x')");
        assert_eq!(format_expression(&expr, None).unwrap(), "(? = ?)");
    }

    #[test]
    fn missing_parameter_reports_what_was_supplied() {
        let expr: Expression = NotExpression { value: param(2) }.into();
        let err = format_expression(&expr, Some(&[json!(1)])).unwrap_err();
        assert_eq!(
            err,
            VisitError::MissingParameter {
                position: 2,
                available: 1
            }
        );
    }

    #[test]
    fn nested_forms_are_parenthesized() {
        let sum: Expression = ArithmeticBinaryExpression {
            operator: ArithmeticOperator::Add,
            left: symbol("a"),
            right: Box::new(LongLiteral { value: 1 }.into()),
        }
        .into();
        let expr: Expression = LogicalBinaryExpression {
            operator: LogicalOperator::Or,
            left: Box::new(IsNullPredicate { value: symbol("b") }.into()),
            right: Box::new(
                BetweenPredicate {
                    value: Box::new(sum),
                    min: Box::new(DoubleLiteral { value: 1.0 }.into()),
                    max: param(0),
                }
                .into(),
            ),
        }
        .into();
        assert_eq!(
            format_expression(&expr, Some(&[json!(9.5)])).unwrap(),
            "((b IS NULL) OR ((a + 1) BETWEEN 1.0 AND 9.5))"
        );
    }

    #[test]
    fn calls_and_casts() {
        let count: Expression = FunctionCall {
            name: "count".into(),
            arguments: vec![*symbol("custkey")],
            distinct: true,
        }
        .into();
        assert_eq!(format_expression(&count, None).unwrap(), "count(DISTINCT custkey)");

        let cast: Expression = Cast {
            expression: Box::new(StringLiteral { value: "it's".into() }.into()),
            target_type: "varchar(4)".into(),
            safe: true,
        }
        .into();
        assert_eq!(
            format_expression(&cast, None).unwrap(),
            "TRY_CAST('it''s' AS varchar(4))"
        );
    }

    #[test]
    fn literal_edge_cases() {
        assert_eq!(format_double(f64::NAN), "nan()");
        assert_eq!(format_double(f64::NEG_INFINITY), "-infinity()");
        assert_eq!(format_double(0.25), "0.25");
        assert_eq!(quote_identifier("order_key"), "order_key");
        assert_eq!(quote_identifier("Order Key"), "\"Order Key\"");
        assert_eq!(quote_identifier("1st"), "\"1st\"");
        assert_eq!(literal(&json!([1, "a", null]), 0).unwrap(), "ARRAY[1, 'a', null]");
        assert_eq!(
            literal(&json!({"k": 1}), 3).unwrap_err(),
            VisitError::InvalidParameter { position: 3 }
        );
    }
}
