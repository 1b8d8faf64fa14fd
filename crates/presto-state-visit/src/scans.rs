// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Finds every table a plan reads.

use crate::error::VisitError;
use crate::visitor::{accept_plan, PlanVisitor};
use presto_state_model::plan::TableScanNode;
use presto_state_model::{
    ConnectorId, PlanFragment, PlanNode, PlanNodeId, SchemaTableName,
};

/// One scan found in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTable {
    /// Scan node.
    pub node_id: PlanNodeId,
    /// Connector serving the table.
    pub connector_id: ConnectorId,
    /// Connector handle variant (`tpch`, `hive`, ...).
    pub handle_variant: &'static str,
    /// Qualified table name.
    pub table: SchemaTableName,
}

/// Collects scans in plan order. Every other kind recurses into its sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableScanCollector;

impl PlanVisitor<Vec<ScannedTable>> for TableScanCollector {
    type Output = ();

    fn visit_default(
        &self,
        _kind: &'static str,
        sources: &[&PlanNode],
        cx: &mut Vec<ScannedTable>,
    ) -> Result<(), VisitError> {
        for source in sources {
            accept_plan(self, source, cx)?;
        }
        Ok(())
    }

    fn visit_table_scan(
        &self,
        node: &TableScanNode,
        cx: &mut Vec<ScannedTable>,
    ) -> Result<(), VisitError> {
        cx.push(ScannedTable {
            node_id: node.id.clone(),
            connector_id: node.table.connector_id.clone(),
            handle_variant: node.table.connector_handle.variant(),
            table: node.table.connector_handle.schema_table_name(),
        });
        Ok(())
    }
}

/// Scans under `root`, in pre-order.
///
/// # Errors
/// None in practice; the collector handles every kind.
pub fn collect_table_scans(root: &PlanNode) -> Result<Vec<ScannedTable>, VisitError> {
    let mut found = Vec::new();
    accept_plan(&TableScanCollector, root, &mut found)?;
    Ok(found)
}

/// Scans across several fragments, in fragment order.
///
/// # Errors
/// See [`collect_table_scans`].
pub fn collect_fragment_scans<'a, I>(fragments: I) -> Result<Vec<ScannedTable>, VisitError>
where
    I: IntoIterator<Item = &'a PlanFragment>,
{
    let mut found = Vec::new();
    for fragment in fragments {
        accept_plan(&TableScanCollector, &fragment.root, &mut found)?;
    }
    Ok(found)
}
