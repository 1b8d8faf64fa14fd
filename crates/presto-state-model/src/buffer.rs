// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Output buffer snapshots reported per task.

use crate::ids::OutputBufferId;
use crate::scalar::{BufferState, BufferType};
use presto_state_decode::validate::{non_negative, non_negative_u32};
use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// Page counters for one partition of an output buffer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBufferInfo {
    partition: u32,
    buffered_pages: u64,
    buffered_bytes: u64,
    rows_added: u64,
    pages_added: u64,
}

impl PageBufferInfo {
    /// Validate wire-typed counters.
    pub fn new(
        partition: i64,
        buffered_pages: i64,
        buffered_bytes: i64,
        rows_added: i64,
        pages_added: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            partition: non_negative_u32("partition", partition)?,
            buffered_pages: non_negative("bufferedPages", buffered_pages)?,
            buffered_bytes: non_negative("bufferedBytes", buffered_bytes)?,
            rows_added: non_negative("rowsAdded", rows_added)?,
            pages_added: non_negative("pagesAdded", pages_added)?,
        })
    }

    /// Partition number.
    pub fn partition(&self) -> u32 {
        self.partition
    }

    /// Pages currently buffered.
    pub fn buffered_pages(&self) -> u64 {
        self.buffered_pages
    }

    /// Bytes currently buffered.
    pub fn buffered_bytes(&self) -> u64 {
        self.buffered_bytes
    }

    /// Rows added since creation.
    pub fn rows_added(&self) -> u64 {
        self.rows_added
    }

    /// Pages added since creation.
    pub fn pages_added(&self) -> u64 {
        self.pages_added
    }
}

impl Decode for PageBufferInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let partition = cx.required(obj, "partition")?;
        let buffered_pages = cx.required(obj, "bufferedPages")?;
        let buffered_bytes = cx.required(obj, "bufferedBytes")?;
        let rows_added = cx.required(obj, "rowsAdded")?;
        let pages_added = cx.required(obj, "pagesAdded")?;
        cx.validated(Self::new(
            partition,
            buffered_pages,
            buffered_bytes,
            rows_added,
            pages_added,
        ))
    }
}

/// State of one downstream consumer's buffer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferInfo {
    buffer_id: OutputBufferId,
    finished: bool,
    buffered_pages: u64,
    pages_sent: u64,
    page_buffer_info: PageBufferInfo,
}

impl BufferInfo {
    /// Validate wire-typed counters.
    pub fn new(
        buffer_id: OutputBufferId,
        finished: bool,
        buffered_pages: i64,
        pages_sent: i64,
        page_buffer_info: PageBufferInfo,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            buffer_id,
            finished,
            buffered_pages: non_negative("bufferedPages", buffered_pages)?,
            pages_sent: non_negative("pagesSent", pages_sent)?,
            page_buffer_info,
        })
    }

    /// Consumer identifier.
    pub fn buffer_id(&self) -> &OutputBufferId {
        &self.buffer_id
    }

    /// `true` once the consumer acknowledged the last page.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Pages waiting for this consumer.
    pub fn buffered_pages(&self) -> u64 {
        self.buffered_pages
    }

    /// Pages delivered to this consumer.
    pub fn pages_sent(&self) -> u64 {
        self.pages_sent
    }

    /// Per-partition counters.
    pub fn page_buffer_info(&self) -> &PageBufferInfo {
        &self.page_buffer_info
    }
}

impl Decode for BufferInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let buffer_id = cx.required(obj, "bufferId")?;
        let finished = cx.required(obj, "finished")?;
        let buffered_pages = cx.required(obj, "bufferedPages")?;
        let pages_sent = cx.required(obj, "pagesSent")?;
        let page_buffer_info = cx.required(obj, "pageBufferInfo")?;
        cx.validated(Self::new(
            buffer_id,
            finished,
            buffered_pages,
            pages_sent,
            page_buffer_info,
        ))
    }
}

/// A task's output buffer with its per-consumer breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBufferInfo {
    #[serde(rename = "type")]
    buffer_type: BufferType,
    state: BufferState,
    can_add_buffers: bool,
    can_add_pages: bool,
    total_buffered_bytes: u64,
    total_buffered_pages: u64,
    total_rows_sent: u64,
    total_pages_sent: u64,
    buffers: Vec<BufferInfo>,
}

impl OutputBufferInfo {
    /// Validate wire-typed counters.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buffer_type: BufferType,
        state: BufferState,
        can_add_buffers: bool,
        can_add_pages: bool,
        total_buffered_bytes: i64,
        total_buffered_pages: i64,
        total_rows_sent: i64,
        total_pages_sent: i64,
        buffers: Vec<BufferInfo>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            buffer_type,
            state,
            can_add_buffers,
            can_add_pages,
            total_buffered_bytes: non_negative("totalBufferedBytes", total_buffered_bytes)?,
            total_buffered_pages: non_negative("totalBufferedPages", total_buffered_pages)?,
            total_rows_sent: non_negative("totalRowsSent", total_rows_sent)?,
            total_pages_sent: non_negative("totalPagesSent", total_pages_sent)?,
            buffers,
        })
    }

    /// Distribution kind.
    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    /// Lifecycle state.
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// `true` while new consumers may attach.
    pub fn can_add_buffers(&self) -> bool {
        self.can_add_buffers
    }

    /// `true` while producers may enqueue.
    pub fn can_add_pages(&self) -> bool {
        self.can_add_pages
    }

    /// Bytes buffered across all consumers.
    pub fn total_buffered_bytes(&self) -> u64 {
        self.total_buffered_bytes
    }

    /// Pages buffered across all consumers.
    pub fn total_buffered_pages(&self) -> u64 {
        self.total_buffered_pages
    }

    /// Rows sent across all consumers.
    pub fn total_rows_sent(&self) -> u64 {
        self.total_rows_sent
    }

    /// Pages sent across all consumers.
    pub fn total_pages_sent(&self) -> u64 {
        self.total_pages_sent
    }

    /// Per-consumer buffers.
    pub fn buffers(&self) -> &[BufferInfo] {
        &self.buffers
    }

    /// Consumer buffer by id.
    pub fn buffer(&self, id: &OutputBufferId) -> Option<&BufferInfo> {
        self.buffers.iter().find(|b| b.buffer_id() == id)
    }
}

impl Decode for OutputBufferInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let buffer_type = cx.required(obj, "type")?;
        let state = cx.required(obj, "state")?;
        let can_add_buffers = cx.required(obj, "canAddBuffers")?;
        let can_add_pages = cx.required(obj, "canAddPages")?;
        let total_buffered_bytes = cx.required(obj, "totalBufferedBytes")?;
        let total_buffered_pages = cx.required(obj, "totalBufferedPages")?;
        let total_rows_sent = cx.required(obj, "totalRowsSent")?;
        let total_pages_sent = cx.required(obj, "totalPagesSent")?;
        let buffers = cx.required(obj, "buffers")?;
        cx.validated(Self::new(
            buffer_type,
            state,
            can_add_buffers,
            can_add_pages,
            total_buffered_bytes,
            total_buffered_pages,
            total_rows_sent,
            total_pages_sent,
            buffers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_decode::{decode_value, Registry, ValidationReason};
    use serde_json::json;

    fn page(partition: i64) -> PageBufferInfo {
        PageBufferInfo::new(partition, 3, 1024, 100, 3).unwrap()
    }

    #[test]
    fn negative_counter_names_its_field() {
        let err = BufferInfo::new(OutputBufferId::new("0").unwrap(), false, -1, 10, page(0))
            .unwrap_err();
        assert_eq!(err.field, "bufferedPages");
        assert_eq!(err.reason, ValidationReason::Negative(-1));

        let err = PageBufferInfo::new(0, 0, 0, 0, -9).unwrap_err();
        assert_eq!(err.field, "pagesAdded");
    }

    #[test]
    fn partition_beyond_u32_is_out_of_range() {
        let err = PageBufferInfo::new(1 << 33, 0, 0, 0, 0).unwrap_err();
        assert!(matches!(err.reason, ValidationReason::OutOfRange { .. }));
    }

    #[test]
    fn nested_failure_carries_full_path() {
        let payload = json!({
            "type": "PARTITIONED",
            "state": "OPEN",
            "canAddBuffers": true,
            "canAddPages": true,
            "totalBufferedBytes": 0,
            "totalBufferedPages": 0,
            "totalRowsSent": 0,
            "totalPagesSent": 0,
            "buffers": [
                {"bufferId": "0", "finished": false, "bufferedPages": 0, "pagesSent": 0,
                 "pageBufferInfo": {"partition": 0, "bufferedPages": 0, "bufferedBytes": 0,
                                    "rowsAdded": 0, "pagesAdded": 0}},
                {"bufferId": "1", "finished": false, "bufferedPages": 0, "pagesSent": 0,
                 "pageBufferInfo": {"partition": 1, "bufferedPages": 0, "bufferedBytes": -5,
                                    "rowsAdded": 0, "pagesAdded": 0}}
            ]
        });
        let err = decode_value::<OutputBufferInfo>(&Registry::default(), &payload).unwrap_err();
        assert_eq!(err.path.to_string(), "buffers[1].pageBufferInfo.bufferedBytes");
        assert_eq!(err.validation().unwrap().reason, ValidationReason::Negative(-5));
    }

    #[test]
    fn lookup_by_buffer_id() {
        let first = BufferInfo::new(OutputBufferId::new("0").unwrap(), true, 0, 4, page(0)).unwrap();
        let second = BufferInfo::new(OutputBufferId::new("1").unwrap(), false, 2, 1, page(1)).unwrap();
        let info = OutputBufferInfo::new(
            BufferType::Partitioned,
            BufferState::Flushing,
            false,
            false,
            2048,
            2,
            10,
            5,
            vec![first, second],
        )
        .unwrap();
        let found = info.buffer(&OutputBufferId::new("1").unwrap()).unwrap();
        assert_eq!(found.page_buffer_info().partition(), 1);
        assert!(info.buffer(&OutputBufferId::new("7").unwrap()).is_none());
    }
}
