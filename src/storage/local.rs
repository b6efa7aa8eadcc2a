use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use log::{debug, info};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::column::ColumnSizing;
use crate::core::FrameError;

use super::{ColumnData, TableMetadata, TableReader};

pub const MANIFEST_FILE: &str = "_meta.json";
pub const DATA_EXT: &str = "d";
pub const INDEX_EXT: &str = "i";
const INDEX_ENTRY_BYTES: u64 = 8;

/// Contents of `_meta.json` at the root of a table directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableManifest {
    pub metadata: TableMetadata,
    pub partitions: Vec<PartitionManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartitionManifest {
    /// Sub-directory holding the partition's column files.
    pub name: String,
    pub row_count: u64,
}

pub fn data_file_name(column: &str) -> String {
    format!("{column}.{DATA_EXT}")
}

pub fn index_file_name(column: &str) -> String {
    format!("{column}.{INDEX_EXT}")
}

/// Mapped file contents. Zero-length files are never mapped.
enum Region {
    Mapped(Mmap),
    Empty,
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Region::Mapped(mmap) => &mmap[..],
            Region::Empty => &[],
        }
    }
}

struct MappedColumn {
    data: Region,
    index: Option<Region>,
}

struct MappedPartition {
    row_count: u64,
    columns: Vec<MappedColumn>,
}

/// Table directory on local disk, partitions memory-mapped on first open.
///
/// Layout:
/// ```text
/// <dir>/_meta.json                  // TableManifest
/// <dir>/<partition>/<column>.d      // column data
/// <dir>/<partition>/<column>.i      // offset index, variable-length columns only
/// ```
pub struct LocalTable {
    dir: PathBuf,
    manifest: TableManifest,
    partitions: Vec<Option<MappedPartition>>,
}

impl LocalTable {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FrameError> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&manifest_path).map_err(|e| {
            FrameError::IoError(format!("reading {}: {}", manifest_path.display(), e))
        })?;
        let manifest: TableManifest = serde_json::from_str(&raw)?;
        manifest.metadata.validate()?;

        info!(
            "Opened table {} with {} columns and {} partitions",
            dir.display(),
            manifest.metadata.column_count(),
            manifest.partitions.len()
        );

        let partitions = manifest.partitions.iter().map(|_| None).collect();
        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
            partitions,
        })
    }

    fn map_partition(&self, partition: usize) -> Result<MappedPartition, FrameError> {
        let entry = self
            .manifest
            .partitions
            .get(partition)
            .ok_or_else(|| FrameError::PartitionOpen {
                partition,
                reason: format!("table has {} partitions", self.manifest.partitions.len()),
            })?;
        let part_dir = self.dir.join(&entry.name);
        let rows = entry.row_count;
        let open_err = |reason: String| FrameError::PartitionOpen { partition, reason };

        let mut columns = Vec::with_capacity(self.manifest.metadata.column_count());
        for column in self.manifest.metadata.columns() {
            let data_path = part_dir.join(data_file_name(&column.name));
            let data = map_file(&data_path)
                .map_err(|e| open_err(format!("{}: {e}", data_path.display())))?;

            let sizing = column.column_type.sizing();
            let index = match sizing {
                ColumnSizing::Fixed { .. } => {
                    let expected = sizing.fixed_len(rows).ok_or_else(|| {
                        open_err(format!(
                            "{}: {rows} rows overflow the column byte length",
                            data_path.display()
                        ))
                    })?;
                    if (data.len() as u64) < expected {
                        return Err(open_err(format!(
                            "{}: {} bytes, expected at least {expected}",
                            data_path.display(),
                            data.len()
                        )));
                    }
                    None
                }
                ColumnSizing::Variable(_) => {
                    let index_path = part_dir.join(index_file_name(&column.name));
                    let index = map_file(&index_path)
                        .map_err(|e| open_err(format!("{}: {e}", index_path.display())))?;
                    let expected = rows.checked_mul(INDEX_ENTRY_BYTES).ok_or_else(|| {
                        open_err(format!(
                            "{}: {rows} rows overflow the offset index length",
                            index_path.display()
                        ))
                    })?;
                    if (index.len() as u64) < expected {
                        return Err(open_err(format!(
                            "{}: {} bytes, expected at least {expected}",
                            index_path.display(),
                            index.len()
                        )));
                    }
                    Some(index)
                }
            };
            columns.push(MappedColumn { data, index });
        }

        debug!(
            "Mapped partition {} ({}) with {} rows",
            partition, entry.name, rows
        );
        Ok(MappedPartition {
            row_count: rows,
            columns,
        })
    }
}

fn map_file(path: &Path) -> std::io::Result<Region> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Region::Empty);
    }
    // SAFETY: the file is opened read-only and we treat the mapping as immutable.
    let mmap = unsafe { Mmap::map(&file) }?;
    Ok(Region::Mapped(mmap))
}

impl TableReader for LocalTable {
    fn metadata(&self) -> &TableMetadata {
        &self.manifest.metadata
    }

    fn partition_count(&self) -> usize {
        self.manifest.partitions.len()
    }

    fn open_partition(&mut self, partition: usize) -> Result<u64, FrameError> {
        if let Some(Some(mapped)) = self.partitions.get(partition) {
            return Ok(mapped.row_count);
        }
        let mapped = self.map_partition(partition)?;
        let rows = mapped.row_count;
        self.partitions[partition] = Some(mapped);
        Ok(rows)
    }

    fn column(&self, partition: usize, column: usize) -> ColumnData<'_> {
        let Some(mapped) = &self.partitions[partition] else {
            panic!("partition {partition} read before open_partition");
        };
        let col = &mapped.columns[column];
        ColumnData::new(partition, column, &col.data, col.index.as_deref())
    }

    fn total_row_count(&self) -> u64 {
        self.manifest
            .partitions
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.row_count))
    }

    fn close(self) {
        let mapped = self.partitions.iter().filter(|p| p.is_some()).count();
        debug!(
            "Closing table {} ({} partitions mapped)",
            self.dir.display(),
            mapped
        );
    }
}

#[cfg(all(test, feature = "testutil"))]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::storage::{ColumnMetadata, HeapTable, PartitionBuilder, Value};
    use crate::testutil::write_local_table;
    use tempfile::TempDir;

    fn sample_table() -> HeapTable {
        let metadata = TableMetadata::new(
            vec![
                ColumnMetadata::new("ts", ColumnType::Timestamp),
                ColumnMetadata::new("name", ColumnType::String),
            ],
            Some(0),
        )
        .unwrap();
        let mut table = HeapTable::new(metadata.clone());
        for (p, rows) in [(0i64, 2i64), (1, 0), (2, 3)] {
            let mut builder = PartitionBuilder::new(&metadata);
            for r in 0..rows {
                builder
                    .append_row(&[Value::Timestamp(p * 100 + r), Value::String(Some("row"))])
                    .unwrap();
            }
            table.push_partition(builder.finish()).unwrap();
        }
        table
    }

    #[test]
    fn test_open_and_map_partitions() {
        let dir = TempDir::new().unwrap();
        write_local_table(dir.path(), &sample_table()).unwrap();

        let mut table = LocalTable::open(dir.path()).unwrap();
        assert_eq!(table.partition_count(), 3);
        assert_eq!(table.total_row_count(), 5);

        assert_eq!(table.open_partition(0).unwrap(), 2);
        assert_eq!(table.open_partition(1).unwrap(), 0);
        assert_eq!(table.open_partition(2).unwrap(), 3);
        // second open is served from the mapping
        assert_eq!(table.open_partition(2).unwrap(), 3);

        let ts = table.column(2, 0);
        assert_eq!(ts.read_i64(16).unwrap(), 202);
        let empty = table.column(1, 1);
        assert!(empty.data().is_empty());
        assert_eq!(empty.index().map(|i| i.len()), Some(0));
        table.close();
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = LocalTable::open(dir.path()).err().unwrap();
        assert!(matches!(err, FrameError::IoError(_)));
    }

    #[test]
    fn test_missing_partition_dir_fails_open() {
        let dir = TempDir::new().unwrap();
        let manifest = write_local_table(dir.path(), &sample_table()).unwrap();
        std::fs::remove_dir_all(dir.path().join(&manifest.partitions[2].name)).unwrap();

        let mut table = LocalTable::open(dir.path()).unwrap();
        assert_eq!(table.open_partition(0).unwrap(), 2);
        let err = table.open_partition(2).unwrap_err();
        assert!(matches!(err, FrameError::PartitionOpen { partition: 2, .. }));
    }

    #[test]
    fn test_truncated_fixed_column_fails_open() {
        let dir = TempDir::new().unwrap();
        let manifest = write_local_table(dir.path(), &sample_table()).unwrap();
        let ts_path = dir
            .path()
            .join(&manifest.partitions[0].name)
            .join(data_file_name("ts"));
        std::fs::write(&ts_path, [0u8; 12]).unwrap();

        let mut table = LocalTable::open(dir.path()).unwrap();
        let err = table.open_partition(0).unwrap_err();
        assert!(err.to_string().contains("expected at least 16"));
    }

    fn with_row_count(dir: &Path, mut manifest: TableManifest, rows: u64) {
        manifest.partitions[0].row_count = rows;
        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_overflowing_fixed_row_count_fails_open() {
        let dir = TempDir::new().unwrap();
        let manifest = write_local_table(dir.path(), &sample_table()).unwrap();
        with_row_count(dir.path(), manifest, (1 << 61) + 1);

        let mut table = LocalTable::open(dir.path()).unwrap();
        let err = table.open_partition(0).unwrap_err();
        assert!(matches!(err, FrameError::PartitionOpen { partition: 0, .. }));
        assert!(err.to_string().contains("overflow the column byte length"));
    }

    #[test]
    fn test_overflowing_index_row_count_fails_open() {
        let metadata =
            TableMetadata::new(vec![ColumnMetadata::new("name", ColumnType::String)], None)
                .unwrap();
        let mut heap = HeapTable::new(metadata.clone());
        let mut builder = PartitionBuilder::new(&metadata);
        builder.append_row(&[Value::String(Some("row"))]).unwrap();
        heap.push_partition(builder.finish()).unwrap();

        let dir = TempDir::new().unwrap();
        let manifest = write_local_table(dir.path(), &heap).unwrap();
        with_row_count(dir.path(), manifest, (1 << 61) + 1);

        let mut table = LocalTable::open(dir.path()).unwrap();
        let err = table.open_partition(0).unwrap_err();
        assert!(matches!(err, FrameError::PartitionOpen { partition: 0, .. }));
        assert!(err.to_string().contains("overflow the offset index length"));
    }

    #[test]
    fn test_total_row_count_saturates() {
        let dir = TempDir::new().unwrap();
        let mut manifest = write_local_table(dir.path(), &sample_table()).unwrap();
        manifest.partitions[1].row_count = u64::MAX - 1;
        with_row_count(dir.path(), manifest, 2);

        let table = LocalTable::open(dir.path()).unwrap();
        assert_eq!(table.total_row_count(), u64::MAX);
    }

    #[test]
    fn test_bad_timestamp_in_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = r#"{
            "metadata": {"columns": [{"name": "ts", "type": "int"}], "timestamp_index": 0},
            "partitions": []
        }"#;
        std::fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();
        let err = LocalTable::open(dir.path()).err().unwrap();
        assert!(matches!(err, FrameError::MetadataError(_)));
    }
}
