use log::debug;

use crate::column::{ColumnType, encode_binary, encode_string};
use crate::core::FrameError;

use super::{ColumnData, TableMetadata, TableReader};

/// A single typed cell, as handed to `PartitionBuilder::append_row`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Float(f32),
    Symbol(i32),
    Long(i64),
    Double(f64),
    Date(i64),
    Timestamp(i64),
    Long256([u64; 4]),
    String(Option<&'a str>),
    Binary(Option<&'a [u8]>),
}

impl Value<'_> {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Byte(_) => ColumnType::Byte,
            Value::Short(_) => ColumnType::Short,
            Value::Char(_) => ColumnType::Char,
            Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
            Value::Symbol(_) => ColumnType::Symbol,
            Value::Long(_) => ColumnType::Long,
            Value::Double(_) => ColumnType::Double,
            Value::Date(_) => ColumnType::Date,
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Long256(_) => ColumnType::Long256,
            Value::String(_) => ColumnType::String,
            Value::Binary(_) => ColumnType::Binary,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            Value::Boolean(v) => out.push(v as u8),
            Value::Byte(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Value::Short(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Value::Char(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Value::Int(v) | Value::Symbol(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Value::Float(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Value::Long(v) | Value::Date(v) | Value::Timestamp(v) => {
                out.extend_from_slice(&v.to_ne_bytes())
            }
            Value::Double(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Value::Long256(words) => {
                for w in words {
                    out.extend_from_slice(&w.to_ne_bytes());
                }
            }
            Value::String(v) => encode_string(v, out),
            Value::Binary(v) => encode_binary(v, out),
        }
    }
}

#[derive(Debug)]
struct HeapColumn {
    data: Vec<u8>,
    index: Option<Vec<u8>>,
}

/// Column bytes of one finished in-memory partition.
pub struct HeapPartition {
    row_count: u64,
    columns: Vec<HeapColumn>,
}

impl HeapPartition {
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn data(&self, column: usize) -> &[u8] {
        &self.columns[column].data
    }

    pub fn index(&self, column: usize) -> Option<&[u8]> {
        self.columns[column].index.as_deref()
    }
}

/// Row-at-a-time encoder producing a `HeapPartition` for a given layout.
#[derive(Debug)]
pub struct PartitionBuilder<'m> {
    metadata: &'m TableMetadata,
    row_count: u64,
    columns: Vec<HeapColumn>,
}

impl<'m> PartitionBuilder<'m> {
    pub fn new(metadata: &'m TableMetadata) -> Self {
        let columns = metadata
            .columns()
            .iter()
            .map(|c| HeapColumn {
                data: Vec::new(),
                index: c.column_type.is_variable().then(Vec::new),
            })
            .collect();
        Self {
            metadata,
            row_count: 0,
            columns,
        }
    }

    /// Encode one row. The row is rejected as a whole if any cell does not
    /// match its column type.
    pub fn append_row(&mut self, row: &[Value<'_>]) -> Result<&mut Self, FrameError> {
        if row.len() != self.columns.len() {
            return Err(FrameError::MetadataError(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, value) in row.iter().enumerate() {
            let expected = self.metadata.column_type(column);
            if value.column_type() != expected {
                return Err(FrameError::TypeMismatch {
                    column,
                    expected: expected.to_string(),
                    actual: value.column_type().to_string(),
                });
            }
        }

        for (column, value) in self.columns.iter_mut().zip(row) {
            if let Some(index) = column.index.as_mut() {
                index.extend_from_slice(&(column.data.len() as i64).to_ne_bytes());
            }
            value.encode(&mut column.data);
        }
        self.row_count += 1;
        Ok(self)
    }

    pub fn finish(self) -> HeapPartition {
        HeapPartition {
            row_count: self.row_count,
            columns: self.columns,
        }
    }
}

/// In-memory `TableReader`. Partitions are opened lazily like on-disk ones,
/// so reading a partition before `open_partition` is a caller bug here too.
pub struct HeapTable {
    metadata: TableMetadata,
    partitions: Vec<HeapPartition>,
    opened: Vec<bool>,
}

impl HeapTable {
    pub fn new(metadata: TableMetadata) -> Self {
        Self {
            metadata,
            partitions: Vec::new(),
            opened: Vec::new(),
        }
    }

    pub fn push_partition(&mut self, partition: HeapPartition) -> Result<usize, FrameError> {
        if partition.column_count() != self.metadata.column_count() {
            return Err(FrameError::MetadataError(format!(
                "partition has {} columns, table has {}",
                partition.column_count(),
                self.metadata.column_count()
            )));
        }
        self.partitions.push(partition);
        self.opened.push(false);
        Ok(self.partitions.len() - 1)
    }

    pub fn partition(&self, partition: usize) -> &HeapPartition {
        &self.partitions[partition]
    }
}

impl TableReader for HeapTable {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn open_partition(&mut self, partition: usize) -> Result<u64, FrameError> {
        let p = self
            .partitions
            .get(partition)
            .ok_or_else(|| FrameError::PartitionOpen {
                partition,
                reason: format!("table has {} partitions", self.partitions.len()),
            })?;
        self.opened[partition] = true;
        Ok(p.row_count)
    }

    fn column(&self, partition: usize, column: usize) -> ColumnData<'_> {
        assert!(
            self.opened[partition],
            "partition {partition} read before open_partition"
        );
        let p = &self.partitions[partition];
        ColumnData::new(partition, column, p.data(column), p.index(column))
    }

    fn total_row_count(&self) -> u64 {
        self.partitions
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.row_count))
    }

    fn close(self) {
        debug!(
            "Closing heap table with {} partitions",
            self.partitions.len()
        );
    }
}
