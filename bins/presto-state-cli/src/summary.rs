// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One-screen summaries of decoded snapshots.

use presto_state_model::{
    BufferInfo, DataSize, Expression, MemoryPoolInfo, OutputBufferInfo, PlanFragment, QueryInfo,
    StageInfo, TaskInfo,
};
use presto_state_visit::{collect_table_scans, format_expression, VisitError};

/// Human-readable key facts about a decoded value.
pub trait Summary {
    /// Name used in messages.
    const LABEL: &'static str;

    /// Summary lines, without trailing newlines.
    fn summary(&self) -> Vec<String>;
}

fn bytes(n: u64) -> String {
    DataSize::of_bytes(n).to_string()
}

impl Summary for QueryInfo {
    const LABEL: &'static str = "query";

    fn summary(&self) -> Vec<String> {
        let stats = self.query_stats();
        let mut lines = vec![
            format!("query {} [{}]", self.query_id(), self.state()),
            format!("  pool: {}  scheduled: {}", self.memory_pool(), self.scheduled()),
            format!(
                "  elapsed: {}  tasks: {}/{}  drivers: {}/{}",
                stats.elapsed_time(),
                stats.completed_tasks(),
                stats.total_tasks(),
                stats.completed_drivers(),
                stats.total_drivers()
            ),
        ];
        if let Some(progress) = stats.progress() {
            lines.push(format!("  progress: {:.1}%", progress * 100.0));
        }
        if let Some(stage) = self.output_stage() {
            lines.push(format!("  stages: {}", stage.all_stages().len()));
        }
        if let Some(failure) = self.failure_info() {
            let root = failure.root_cause();
            lines.push(format!(
                "  failed: {}: {}",
                root.failure_type(),
                root.message().unwrap_or("")
            ));
        }
        lines
    }
}

impl Summary for StageInfo {
    const LABEL: &'static str = "stage";

    fn summary(&self) -> Vec<String> {
        self.all_stages()
            .into_iter()
            .map(|stage| {
                format!(
                    "stage {} [{}] tasks: {} sub-stages: {}",
                    stage.stage_id(),
                    stage.state(),
                    stage.tasks().len(),
                    stage.sub_stages().len()
                )
            })
            .collect()
    }
}

impl Summary for TaskInfo {
    const LABEL: &'static str = "task";

    fn summary(&self) -> Vec<String> {
        let status = self.task_status();
        let mut lines = vec![
            format!("task {} [{}] v{}", status.task_id(), status.state(), status.version()),
            format!(
                "  drivers: {} queued, {} running  memory: {}",
                status.queued_partitioned_drivers(),
                status.running_partitioned_drivers(),
                bytes(status.memory_reservation_in_bytes())
            ),
        ];
        lines.extend(self.output_buffers().summary().into_iter().map(|l| format!("  {l}")));
        lines
    }
}

impl Summary for OutputBufferInfo {
    const LABEL: &'static str = "output buffer";

    fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} buffers [{}]: {} pages / {} buffered, {} pages sent",
            self.buffer_type(),
            self.state(),
            self.total_buffered_pages(),
            bytes(self.total_buffered_bytes()),
            self.total_pages_sent()
        )];
        lines.extend(self.buffers().iter().flat_map(|b| b.summary()).map(|l| format!("  {l}")));
        lines
    }
}

impl Summary for BufferInfo {
    const LABEL: &'static str = "buffer";

    fn summary(&self) -> Vec<String> {
        let page = self.page_buffer_info();
        vec![format!(
            "buffer {}{}: {} buffered, {} sent, partition {} holds {}",
            self.buffer_id(),
            if self.finished() { " (finished)" } else { "" },
            self.buffered_pages(),
            self.pages_sent(),
            page.partition(),
            bytes(page.buffered_bytes())
        )]
    }
}

impl Summary for MemoryPoolInfo {
    const LABEL: &'static str = "memory pool";

    fn summary(&self) -> Vec<String> {
        let free = self.free_bytes();
        let free = if free < 0 {
            format!("over-committed by {}", bytes(u64::try_from(-free).unwrap_or(u64::MAX)))
        } else {
            format!("{} free", bytes(u64::try_from(free).unwrap_or(u64::MAX)))
        };
        let mut lines = vec![format!(
            "pool {} of {} reserved ({free})",
            bytes(self.reserved_bytes()),
            bytes(self.max_bytes())
        )];
        lines.extend(
            self.query_memory_reservations()
                .iter()
                .map(|(query, reserved)| format!("  {query}: {}", bytes(*reserved))),
        );
        lines
    }
}

impl Summary for PlanFragment {
    const LABEL: &'static str = "fragment";

    fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "fragment {} [{}] root: {} ({})",
            self.id,
            self.partitioning.connector_handle.label(),
            self.root.kind(),
            self.root.id()
        )];
        let sources: Vec<&str> = self.remote_sources().iter().map(|id| id.as_str()).collect();
        if !sources.is_empty() {
            lines.push(format!("  reads fragments: {}", sources.join(", ")));
        }
        if let Ok(scans) = collect_table_scans(&self.root) {
            lines.extend(
                scans
                    .iter()
                    .map(|s| format!("  scans {}:{}", s.connector_id, s.table)),
            );
        }
        lines
    }
}

impl Summary for Expression {
    const LABEL: &'static str = "expression";

    fn summary(&self) -> Vec<String> {
        let text = match format_expression(self, None) {
            Ok(sql) => sql,
            Err(VisitError::Unsupported { kind }) => format!("<{kind}>"),
            Err(other) => other.to_string(),
        };
        let mut lines = vec![format!("{} expression: {text}", self.kind())];
        if let Some(max) = self.max_parameter() {
            lines.push(format!("  placeholders: {}", max + 1));
        }
        lines
    }
}
