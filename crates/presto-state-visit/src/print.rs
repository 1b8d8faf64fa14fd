// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Indented text rendering of plans.
//!
//! ```text
//! Fragment 1 [SOURCE]
//!     - Aggregation(PARTIAL)[count := count()]
//!         - Filter[(totalprice > 1000.5)]
//!             - TableScan[tpch:tiny.orders]
//! ```

use crate::error::VisitError;
use crate::format::format_expression;
use crate::visitor::{accept_plan, PlanVisitor};
use presto_state_model::plan::{
    AggregationNode, ExchangeNode, FilterNode, LimitNode, OutputNode, ProjectNode,
    RemoteSourceNode, TableScanNode, ValuesNode,
};
use presto_state_model::{Expression, PlanFragment, PlanNode};
use std::collections::BTreeMap;

/// Layout knobs for [`PlanPrinter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Append each node's output symbols.
    pub show_layout: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            show_layout: false,
        }
    }
}

/// Text being built plus the current depth.
#[derive(Debug, Default)]
pub struct PrintContext {
    out: String,
    depth: usize,
}

impl PrintContext {
    /// Rendered text so far.
    pub fn into_text(self) -> String {
        self.out
    }
}

/// Plan visitor writing one line per node.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanPrinter {
    options: PrintOptions,
}

/// Renders a plan tree with default options.
///
/// # Errors
/// None in practice; every node kind is handled.
pub fn print_plan(node: &PlanNode) -> Result<String, VisitError> {
    PlanPrinter::default().print(node)
}

/// Renders a fragment with default options.
///
/// # Errors
/// See [`print_plan`].
pub fn print_fragment(fragment: &PlanFragment) -> Result<String, VisitError> {
    PlanPrinter::default().print_fragment(fragment)
}

impl PlanPrinter {
    /// Printer with explicit options.
    pub const fn new(options: PrintOptions) -> Self {
        Self { options }
    }

    /// Renders `node` and its sources.
    ///
    /// # Errors
    /// See [`print_plan`].
    pub fn print(&self, node: &PlanNode) -> Result<String, VisitError> {
        let mut cx = PrintContext::default();
        accept_plan(self, node, &mut cx)?;
        Ok(cx.into_text())
    }

    /// Renders a fragment header followed by its plan.
    ///
    /// # Errors
    /// See [`print_plan`].
    pub fn print_fragment(&self, fragment: &PlanFragment) -> Result<String, VisitError> {
        let pad = " ".repeat(self.options.indent);
        let mut cx = PrintContext::default();
        cx.out.push_str(&format!(
            "Fragment {} [{}]\n",
            fragment.id,
            fragment.partitioning.connector_handle.label()
        ));
        if self.options.show_layout {
            let scheme = &fragment.partitioning_scheme;
            cx.out.push_str(&format!(
                "{pad}Output layout: [{}]\n{pad}Output partitioning: {}\n",
                scheme.output_layout.join(", "),
                scheme.partitioning.handle.connector_handle.label()
            ));
        }
        cx.depth = 1;
        accept_plan(self, &fragment.root, &mut cx)?;
        Ok(cx.into_text())
    }

    fn line(&self, cx: &mut PrintContext, text: &str, layout: &[String]) {
        cx.out.push_str(&" ".repeat(cx.depth * self.options.indent));
        cx.out.push_str("- ");
        cx.out.push_str(text);
        if self.options.show_layout && !layout.is_empty() {
            cx.out.push_str(&format!(" => [{}]", layout.join(", ")));
        }
        cx.out.push('\n');
    }

    fn descend(&self, sources: &[&PlanNode], cx: &mut PrintContext) -> Result<(), VisitError> {
        cx.depth += 1;
        for source in sources {
            accept_plan(self, source, cx)?;
        }
        cx.depth -= 1;
        Ok(())
    }
}

// Plans may embed expressions the formatter cannot render; show the kind.
fn expression(expr: &Expression) -> String {
    format_expression(expr, None).unwrap_or_else(|err| match err {
        VisitError::Unsupported { kind } => format!("<{kind}>"),
        other => other.to_string(),
    })
}

fn assignments(map: &BTreeMap<String, Expression>) -> String {
    map.iter()
        .map(|(symbol, expr)| format!("{symbol} := {}", expression(expr)))
        .collect::<Vec<_>>()
        .join(", ")
}

impl PlanVisitor<PrintContext> for PlanPrinter {
    type Output = ();

    fn visit_output(&self, node: &OutputNode, cx: &mut PrintContext) -> Result<(), VisitError> {
        self.line(cx, &format!("Output[{}]", node.column_names.join(", ")), &node.outputs);
        self.descend(&[node.source.as_ref()], cx)
    }

    fn visit_project(&self, node: &ProjectNode, cx: &mut PrintContext) -> Result<(), VisitError> {
        let layout: Vec<String> = node.assignments.keys().cloned().collect();
        self.line(cx, &format!("Project[{}]", assignments(&node.assignments)), &layout);
        self.descend(&[node.source.as_ref()], cx)
    }

    fn visit_filter(&self, node: &FilterNode, cx: &mut PrintContext) -> Result<(), VisitError> {
        self.line(cx, &format!("Filter[{}]", expression(&node.predicate)), &[]);
        self.descend(&[node.source.as_ref()], cx)
    }

    fn visit_table_scan(
        &self,
        node: &TableScanNode,
        cx: &mut PrintContext,
    ) -> Result<(), VisitError> {
        let table = format!(
            "TableScan[{}:{}]",
            node.table.connector_id,
            node.table.connector_handle.schema_table_name()
        );
        self.line(cx, &table, &node.output_symbols);
        Ok(())
    }

    fn visit_aggregation(
        &self,
        node: &AggregationNode,
        cx: &mut PrintContext,
    ) -> Result<(), VisitError> {
        let mut text = format!(
            "Aggregation({})[{}]",
            node.step,
            assignments(&node.aggregations)
        );
        if !node.grouping_keys.is_empty() {
            text.push_str(&format!(" by [{}]", node.grouping_keys.join(", ")));
        }
        let layout: Vec<String> = node
            .grouping_keys
            .iter()
            .chain(node.aggregations.keys())
            .cloned()
            .collect();
        self.line(cx, &text, &layout);
        self.descend(&[node.source.as_ref()], cx)
    }

    fn visit_limit(&self, node: &LimitNode, cx: &mut PrintContext) -> Result<(), VisitError> {
        self.line(cx, &format!("Limit({})[{}]", node.step, node.count), &[]);
        self.descend(&[node.source.as_ref()], cx)
    }

    fn visit_exchange(&self, node: &ExchangeNode, cx: &mut PrintContext) -> Result<(), VisitError> {
        let scheme = &node.partitioning_scheme;
        let text = format!(
            "Exchange({}, {})[{}]",
            node.scope,
            node.exchange_type,
            scheme.partitioning.handle.connector_handle.label()
        );
        self.line(cx, &text, &scheme.output_layout);
        let sources: Vec<&PlanNode> = node.sources.iter().collect();
        self.descend(&sources, cx)
    }

    fn visit_remote_source(
        &self,
        node: &RemoteSourceNode,
        cx: &mut PrintContext,
    ) -> Result<(), VisitError> {
        let ids: Vec<&str> = node.source_fragment_ids.iter().map(|id| id.as_str()).collect();
        self.line(cx, &format!("RemoteSource[{}]", ids.join(", ")), &node.outputs);
        Ok(())
    }

    fn visit_values(&self, node: &ValuesNode, cx: &mut PrintContext) -> Result<(), VisitError> {
        let rows: Vec<String> = node
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(expression).collect();
                format!("({})", cells.join(", "))
            })
            .collect();
        self.line(cx, &format!("Values[{}]", rows.join(", ")), &node.output_symbols);
        Ok(())
    }
}
