use crate::core::FrameError;
use crate::storage::TableReader;

/// A global row expressed as a partition and a 0-based row within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    pub partition_index: usize,
    pub local_offset: u64,
}

impl RowPosition {
    /// Walk partitions in order, opening each, until the one holding
    /// `global_row` is found.
    ///
    /// A row equal to a partition's row count belongs to the next partition.
    /// `global_row == total_row_count` locates the end of the table
    /// (`partition_count`, 0), which yields no frames.
    ///
    /// Panics if `global_row` exceeds the table's total row count.
    pub fn locate<R: TableReader + ?Sized>(
        reader: &mut R,
        global_row: u64,
    ) -> Result<Self, FrameError> {
        let total = reader.total_row_count();
        assert!(
            global_row <= total,
            "global row {global_row} beyond table of {total} rows"
        );

        let partition_count = reader.partition_count();
        let mut remaining = global_row;
        for partition_index in 0..partition_count {
            let rows = reader.open_partition(partition_index)?;
            if remaining < rows {
                return Ok(Self {
                    partition_index,
                    local_offset: remaining,
                });
            }
            remaining -= rows;
        }

        if remaining == 0 {
            return Ok(Self {
                partition_index: partition_count,
                local_offset: 0,
            });
        }
        Err(FrameError::RowCountMismatch {
            expected: total,
            actual: global_row - remaining,
        })
    }
}
