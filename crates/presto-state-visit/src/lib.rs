// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Visitors over decoded plan and expression trees.
//!
//! The node families in `presto-state-model` are closed enums; this crate
//! adds behaviour from outside through [`ExpressionVisitor`] and
//! [`PlanVisitor`]. Kinds a visitor does not handle fail with
//! [`VisitError::Unsupported`] unless it overrides `visit_default`.
//!
//! ```ignore
//! let expr: Expression = decode_value(standard_registry()?, &payload)?;
//! let sql = format_expression(&expr, Some(&[json!(42), json!("x")]))?;
//! assert_eq!(sql, "(42 = 'x')");
//! ```
#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod print;
pub mod scans;
pub mod visitor;

pub use error::VisitError;
pub use format::{format_expression, quote_identifier, quote_string, ExpressionFormatter};
pub use print::{print_fragment, print_plan, PlanPrinter, PrintContext, PrintOptions};
pub use scans::{collect_fragment_scans, collect_table_scans, ScannedTable, TableScanCollector};
pub use visitor::{accept_expression, accept_plan, ExpressionVisitor, PlanVisitor};
