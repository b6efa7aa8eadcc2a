use crate::storage::TableReader;

/// Byte range of one column inside a frame, relative to the column's data
/// region in the frame's partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSpan {
    pub offset: u64,
    pub len: u64,
}

/// One contiguous run of rows inside a single partition.
///
/// A frame borrows the cursor that produced it, so it cannot outlive the next
/// `advance` and the memory it points at stays mapped while it exists.
pub struct PageFrame<'a, R: TableReader> {
    reader: &'a R,
    spans: &'a [ColumnSpan],
    partition_index: usize,
    row_count: u64,
    first_timestamp: Option<i64>,
    last_timestamp: Option<i64>,
}

impl<'a, R: TableReader> PageFrame<'a, R> {
    pub(super) fn new(
        reader: &'a R,
        spans: &'a [ColumnSpan],
        partition_index: usize,
        row_count: u64,
        timestamps: (Option<i64>, Option<i64>),
    ) -> Self {
        Self {
            reader,
            spans,
            partition_index,
            row_count,
            first_timestamp: timestamps.0,
            last_timestamp: timestamps.1,
        }
    }

    pub fn partition_index(&self) -> usize {
        self.partition_index
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.spans.len()
    }

    pub fn column_span(&self, column: usize) -> ColumnSpan {
        assert!(
            column < self.spans.len(),
            "column {column} out of range (frame has {} columns)",
            self.spans.len()
        );
        self.spans[column]
    }

    /// Address of the column's first byte in this frame. Valid while the
    /// cursor's reader stays bound, which the frame's lifetime guarantees.
    pub fn column_address(&self, column: usize) -> usize {
        let span = self.column_span(column);
        self.reader
            .column(self.partition_index, column)
            .base_address()
            + span.offset as usize
    }

    pub fn column_byte_length(&self, column: usize) -> u64 {
        self.column_span(column).len
    }

    pub fn column_bytes(&self, column: usize) -> &'a [u8] {
        let span = self.column_span(column);
        let data = self.reader.column(self.partition_index, column).data();
        let start = span.offset as usize;
        &data[start..start + span.len as usize]
    }

    /// First value of the designated timestamp column, `None` if the table
    /// has none.
    pub fn first_timestamp(&self) -> Option<i64> {
        self.first_timestamp
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }
}
