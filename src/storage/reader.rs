use crate::core::FrameError;

use super::TableMetadata;

/// Bytes of one column within one opened partition.
///
/// `data` is the column's primary region. Variable-length columns also carry
/// `index`, the offset-index sidecar holding one 8-byte entry per row. All
/// reads are bounds-checked; a read past the end is reported as a corrupt
/// column, never as a panic.
#[derive(Clone, Copy, Debug)]
pub struct ColumnData<'a> {
    partition: usize,
    column: usize,
    data: &'a [u8],
    index: Option<&'a [u8]>,
}

impl<'a> ColumnData<'a> {
    pub fn new(partition: usize, column: usize, data: &'a [u8], index: Option<&'a [u8]>) -> Self {
        Self {
            partition,
            column,
            data,
            index,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn index(&self) -> Option<&'a [u8]> {
        self.index
    }

    /// Address of the first byte of the data region.
    ///
    /// Only meaningful while the reader that produced this view stays open.
    pub fn base_address(&self) -> usize {
        self.data.as_ptr() as usize
    }

    pub fn read_i64(&self, offset: u64) -> Result<i64, FrameError> {
        let bytes = self.data_slice(offset, 8)?;
        Ok(bytemuck::pod_read_unaligned::<i64>(bytes))
    }

    /// Code-unit count stored in front of a string value.
    pub fn read_string_header(&self, offset: u64) -> Result<i32, FrameError> {
        let bytes = self.data_slice(offset, 4)?;
        Ok(bytemuck::pod_read_unaligned::<i32>(bytes))
    }

    /// Byte length stored in front of a binary value.
    pub fn read_binary_header(&self, offset: u64) -> Result<i64, FrameError> {
        self.read_i64(offset)
    }

    /// Offset-index entry for `row`.
    pub fn read_index(&self, row: u64) -> Result<u64, FrameError> {
        let index = self.index.ok_or_else(|| self.corrupt("column has no offset index"))?;
        let start = row
            .checked_mul(8)
            .and_then(|s| usize::try_from(s).ok())
            .filter(|s| s.checked_add(8).is_some_and(|end| end <= index.len()))
            .ok_or_else(|| {
                self.corrupt(format!(
                    "offset index entry {row} beyond index of {} bytes",
                    index.len()
                ))
            })?;
        let entry = bytemuck::pod_read_unaligned::<i64>(&index[start..start + 8]);
        u64::try_from(entry)
            .map_err(|_| self.corrupt(format!("negative offset index entry {entry} at row {row}")))
    }

    /// Checked sub-slice of the data region.
    pub fn data_slice(&self, offset: u64, len: u64) -> Result<&'a [u8], FrameError> {
        let range = offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len() as u64)
            .map(|end| offset as usize..end as usize)
            .ok_or_else(|| {
                self.corrupt(format!(
                    "read of {len} bytes at {offset} beyond data region of {} bytes",
                    self.data.len()
                ))
            })?;
        Ok(&self.data[range])
    }

    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> FrameError {
        FrameError::corrupt(self.partition, self.column, reason)
    }
}

/// Read-consistent snapshot of a partitioned columnar table.
///
/// Partitions are materialized lazily: `open_partition` must succeed before
/// `column` is called for that partition.
pub trait TableReader {
    fn metadata(&self) -> &TableMetadata;

    fn partition_count(&self) -> usize;

    /// Materialize a partition and return its row count.
    fn open_partition(&mut self, partition: usize) -> Result<u64, FrameError>;

    /// Column bytes of an opened partition.
    ///
    /// Panics if the partition has not been opened.
    fn column(&self, partition: usize, column: usize) -> ColumnData<'_>;

    fn total_row_count(&self) -> u64;

    /// Release the snapshot. Called exactly once by the owner.
    fn close(self)
    where
        Self: Sized;
}
