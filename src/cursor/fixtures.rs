use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::column::ColumnType;
use crate::core::FrameError;
use crate::storage::{
    ColumnData, ColumnMetadata, HeapTable, PartitionBuilder, TableMetadata, TableReader, Value,
};

pub(crate) const TS: usize = 0;
pub(crate) const PRICE: usize = 1;
pub(crate) const QTY: usize = 2;
pub(crate) const NOTE: usize = 3;
pub(crate) const BLOB: usize = 4;

pub(crate) fn trades_metadata(with_timestamp: bool) -> TableMetadata {
    TableMetadata::new(
        vec![
            ColumnMetadata::new("ts", ColumnType::Timestamp),
            ColumnMetadata::new("price", ColumnType::Double),
            ColumnMetadata::new("qty", ColumnType::Int),
            ColumnMetadata::new("note", ColumnType::String),
            ColumnMetadata::new("blob", ColumnType::Binary),
        ],
        with_timestamp.then_some(TS),
    )
    .unwrap()
}

pub(crate) fn trades(partition_rows: &[u64]) -> HeapTable {
    build(trades_metadata(true), partition_rows)
}

pub(crate) fn trades_without_timestamp(partition_rows: &[u64]) -> HeapTable {
    build(trades_metadata(false), partition_rows)
}

/// Timestamp of global row `row`.
pub(crate) fn ts_of(row: u64) -> i64 {
    1_700_000_000_000_000 + row as i64 * 1_000
}

fn build(metadata: TableMetadata, partition_rows: &[u64]) -> HeapTable {
    let mut table = HeapTable::new(metadata.clone());
    let mut global = 0u64;
    for &rows in partition_rows {
        let mut builder = PartitionBuilder::new(&metadata);
        for _ in 0..rows {
            let note = format!("note-{global}");
            let blob: Vec<u8> = (0..global % 7).map(|b| b as u8).collect();
            builder
                .append_row(&[
                    Value::Timestamp(ts_of(global)),
                    Value::Double(global as f64 * 0.5),
                    Value::Int(global as i32),
                    Value::String((global % 5 != 0).then_some(note.as_str())),
                    Value::Binary((global % 4 != 0).then_some(blob.as_slice())),
                ])
                .unwrap();
            global += 1;
        }
        table.push_partition(builder.finish()).unwrap();
    }
    table
}

/// Reader wrapper that counts `close` calls and injects storage faults.
pub(crate) struct Probe<R> {
    inner: R,
    closes: Rc<Cell<usize>>,
    failing: Option<usize>,
    total: Option<u64>,
    shrink: Option<(usize, u64)>,
    overstate: Option<(usize, u64)>,
    opened: HashSet<usize>,
}

impl<R: TableReader> Probe<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            closes: Rc::new(Cell::new(0)),
            failing: None,
            total: None,
            shrink: None,
            overstate: None,
            opened: HashSet::new(),
        }
    }

    pub(crate) fn closes(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }

    pub(crate) fn failing_partition(mut self, partition: usize) -> Self {
        self.failing = Some(partition);
        self
    }

    pub(crate) fn reporting_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Report `rows` for `partition` on every open after the first one.
    pub(crate) fn shrinking(mut self, partition: usize, rows: u64) -> Self {
        self.shrink = Some((partition, rows));
        self
    }

    /// Report `rows` for `partition` on every open, whatever its data holds.
    pub(crate) fn overstating(mut self, partition: usize, rows: u64) -> Self {
        self.overstate = Some((partition, rows));
        self
    }
}

impl<R: TableReader> TableReader for Probe<R> {
    fn metadata(&self) -> &TableMetadata {
        self.inner.metadata()
    }

    fn partition_count(&self) -> usize {
        self.inner.partition_count()
    }

    fn open_partition(&mut self, partition: usize) -> Result<u64, FrameError> {
        if self.failing == Some(partition) {
            return Err(FrameError::PartitionOpen {
                partition,
                reason: "injected".to_string(),
            });
        }
        let rows = self.inner.open_partition(partition)?;
        let reopened = !self.opened.insert(partition);
        match (self.shrink, self.overstate) {
            (_, Some((p, claimed))) if p == partition => Ok(claimed),
            (Some((p, shrunk)), _) if p == partition && reopened => Ok(shrunk),
            _ => Ok(rows),
        }
    }

    fn column(&self, partition: usize, column: usize) -> ColumnData<'_> {
        self.inner.column(partition, column)
    }

    fn total_row_count(&self) -> u64 {
        self.total.unwrap_or_else(|| self.inner.total_row_count())
    }

    fn close(self) {
        self.closes.set(self.closes.get() + 1);
        self.inner.close();
    }
}
