use log::{debug, trace, warn};

use crate::column::{ColumnSizing, boundary};
use crate::core::FrameError;
use crate::storage::{TableMetadata, TableReader};

use super::frame::{ColumnSpan, PageFrame};
use super::locator::RowPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Bound to a reader, nothing produced since the last reset or rewind.
    Fresh,
    Iterating,
    Exhausted,
    /// No reader bound. Terminal until the next reset.
    Closed,
}

/// Walks the partitions of a table and exposes each non-empty one as a
/// `PageFrame`.
///
/// The cursor owns its reader from `reset*` until `close` (or drop). Only the
/// first frame after a resume honours the pending skip; every later frame
/// starts at row 0 of its partition.
pub struct PageFrameCursor<R: TableReader> {
    reader: Option<R>,
    state: CursorState,
    next_partition: usize,
    partition_count: usize,
    sizings: Vec<ColumnSizing>,
    timestamp_index: Option<usize>,
    pending_skip: u64,
    // Set by `reset_from`: the first visited partition must hold the resume row.
    strict_resume: bool,
    spans: Vec<ColumnSpan>,
    first_timestamp: Option<i64>,
    last_timestamp: Option<i64>,
}

impl<R: TableReader> Default for PageFrameCursor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TableReader> PageFrameCursor<R> {
    pub fn new() -> Self {
        Self {
            reader: None,
            state: CursorState::Closed,
            next_partition: 0,
            partition_count: 0,
            sizings: Vec::new(),
            timestamp_index: None,
            pending_skip: 0,
            strict_resume: false,
            spans: Vec::new(),
            first_timestamp: None,
            last_timestamp: None,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Bind `reader` and start from the first partition.
    pub fn reset(&mut self, reader: R) {
        self.bind(reader);
    }

    /// Bind `reader` and start at `local_offset` rows into `partition`.
    ///
    /// A partition holding no more than `local_offset` rows is treated as
    /// already replicated and skipped.
    pub fn reset_at(&mut self, reader: R, partition: usize, local_offset: u64) {
        self.bind(reader);
        self.next_partition = partition;
        self.pending_skip = local_offset;
        debug!("Cursor resuming at partition {partition}, row {local_offset}");
    }

    /// Bind `reader` and start at `global_row`.
    ///
    /// Unlike `reset_at`, the located partition must still hold the resume row
    /// when it is visited; otherwise `advance` fails with `ResumeMismatch`.
    /// On a locate error the reader is closed and the cursor left untouched.
    pub fn reset_from(&mut self, mut reader: R, global_row: u64) -> Result<(), FrameError> {
        let position = match RowPosition::locate(&mut reader, global_row) {
            Ok(position) => position,
            Err(e) => {
                reader.close();
                return Err(e);
            }
        };
        self.reset_at(reader, position.partition_index, position.local_offset);
        self.strict_resume = true;
        Ok(())
    }

    fn bind(&mut self, reader: R) {
        self.close();

        let metadata = reader.metadata();
        self.sizings.clear();
        self.sizings
            .extend(metadata.columns().iter().map(|c| c.column_type.sizing()));
        self.timestamp_index = metadata.timestamp_index();
        self.spans.clear();
        self.spans
            .resize(metadata.column_count(), ColumnSpan::default());
        debug!(
            "Cursor bound to table with {} columns, {} partitions, {} rows",
            metadata.column_count(),
            reader.partition_count(),
            reader.total_row_count()
        );

        self.reader = Some(reader);
        self.rewind();
    }

    /// Restart from partition 0 with no pending skip, keeping the reader.
    pub fn rewind(&mut self) {
        self.partition_count = self.bound_reader("rewind").partition_count();
        self.next_partition = 0;
        self.pending_skip = 0;
        self.strict_resume = false;
        self.first_timestamp = None;
        self.last_timestamp = None;
        self.state = CursorState::Fresh;
        debug!("Cursor rewound over {} partitions", self.partition_count);
    }

    /// Produce the next frame, or `None` once every partition has been visited.
    ///
    /// A storage fault leaves the cursor positioned on the failing partition.
    /// Panics on a closed cursor.
    pub fn advance(&mut self) -> Result<Option<PageFrame<'_, R>>, FrameError> {
        let Some(reader) = self.reader.as_mut() else {
            panic!("advance called on a closed page frame cursor");
        };

        while self.next_partition < self.partition_count {
            let partition = self.next_partition;
            let skip = self.pending_skip;
            let row_count = reader.open_partition(partition)?;

            if row_count <= skip {
                if self.strict_resume {
                    return Err(FrameError::ResumeMismatch {
                        partition,
                        row_count,
                        skip,
                    });
                }
                if row_count < skip {
                    warn!(
                        "Partition {partition} holds {row_count} rows, fewer than resume offset {skip}"
                    );
                }
                self.next_partition += 1;
                self.pending_skip = 0;
                continue;
            }

            fill_spans(&*reader, partition, skip, row_count, &self.sizings, &mut self.spans)?;
            let timestamps = match self.timestamp_index {
                Some(ts) => {
                    let column = reader.column(partition, ts);
                    let span = self.spans[ts];
                    (
                        Some(column.read_i64(span.offset)?),
                        Some(column.read_i64(span.offset + span.len - 8)?),
                    )
                }
                None => (None, None),
            };

            self.next_partition += 1;
            self.pending_skip = 0;
            self.strict_resume = false;
            self.first_timestamp = timestamps.0;
            self.last_timestamp = timestamps.1;
            self.state = CursorState::Iterating;

            let frame_rows = row_count - skip;
            trace!("Frame on partition {partition}: rows {skip}..{row_count}");
            return Ok(Some(PageFrame::new(
                &*reader,
                &self.spans,
                partition,
                frame_rows,
                timestamps,
            )));
        }

        if self.state != CursorState::Exhausted {
            debug!("Cursor exhausted after {} partitions", self.partition_count);
        }
        self.strict_resume = false;
        self.state = CursorState::Exhausted;
        Ok(None)
    }

    /// Release the reader. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            debug!("Closing page frame cursor");
            reader.close();
        }
        self.state = CursorState::Closed;
    }

    /// Total row count of the bound table.
    pub fn size(&self) -> u64 {
        self.bound_reader("size").total_row_count()
    }

    pub fn metadata(&self) -> &TableMetadata {
        self.bound_reader("metadata").metadata()
    }

    /// First and last timestamp of the most recent frame.
    pub fn timestamps(&self) -> (Option<i64>, Option<i64>) {
        (self.first_timestamp, self.last_timestamp)
    }

    fn bound_reader(&self, op: &str) -> &R {
        match &self.reader {
            Some(reader) => reader,
            None => panic!("{op} called on a closed page frame cursor"),
        }
    }
}

impl<R: TableReader> Drop for PageFrameCursor<R> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Compute every column's span over rows `skip..row_count` of `partition`.
fn fill_spans<R: TableReader>(
    reader: &R,
    partition: usize,
    skip: u64,
    row_count: u64,
    sizings: &[ColumnSizing],
    spans: &mut [ColumnSpan],
) -> Result<(), FrameError> {
    for (column, (sizing, span)) in sizings.iter().zip(spans.iter_mut()).enumerate() {
        let data = reader.column(partition, column);
        *span = match *sizing {
            ColumnSizing::Fixed { .. } => {
                let fixed_len = |rows: u64| {
                    sizing.fixed_len(rows).ok_or_else(|| {
                        data.corrupt(format!("{rows} rows overflow the column byte length"))
                    })
                };
                ColumnSpan {
                    offset: fixed_len(skip)?,
                    len: fixed_len(row_count - skip)?,
                }
            }
            ColumnSizing::Variable(kind) => {
                let end = boundary(kind, &data, row_count, row_count)?;
                let start = if skip > 0 {
                    boundary(kind, &data, skip, row_count)?
                } else {
                    0
                };
                if start > end {
                    return Err(data.corrupt(format!(
                        "row {skip} starts at {start}, past the end of the partition at {end}"
                    )));
                }
                ColumnSpan {
                    offset: start,
                    len: end - start,
                }
            }
        };
        data.data_slice(span.offset, span.len)?;
    }
    Ok(())
}
