//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::column::ColumnType;
use crate::core::FrameError;
use crate::storage::{
    ColumnMetadata, HeapTable, MANIFEST_FILE, PartitionBuilder, PartitionManifest,
    TableManifest, TableMetadata, TableReader, Value, data_file_name, index_file_name,
};

/// Microsecond timestamp of 2024-01-01T00:00:00Z.
pub const EPOCH_2024_MICROS: i64 = 1_704_067_200_000_000;

/// Day-named partition directory, `2024-01-01` for index 0.
pub fn partition_name(index: usize) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    base.checked_add_days(Days::new(index as u64))
        .unwrap_or(base)
        .format("%Y-%m-%d")
        .to_string()
}

/// Persist a heap table in the `LocalTable` directory layout.
pub fn write_local_table(dir: &Path, table: &HeapTable) -> Result<TableManifest, FrameError> {
    let metadata = table.metadata();
    let mut partitions = Vec::with_capacity(table.partition_count());

    for index in 0..table.partition_count() {
        let name = partition_name(index);
        let part_dir = dir.join(&name);
        fs::create_dir_all(&part_dir)?;

        let partition = table.partition(index);
        for (column, meta) in metadata.columns().iter().enumerate() {
            fs::write(part_dir.join(data_file_name(&meta.name)), partition.data(column))?;
            if let Some(offsets) = partition.index(column) {
                fs::write(part_dir.join(index_file_name(&meta.name)), offsets)?;
            }
        }
        partitions.push(PartitionManifest {
            name,
            row_count: partition.row_count(),
        });
    }

    let manifest = TableManifest {
        metadata: metadata.clone(),
        partitions,
    };
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;
    Ok(manifest)
}

/// Layout with one column of every type and `ts` as designated timestamp.
pub fn all_types_metadata() -> TableMetadata {
    let columns = vec![
        ColumnMetadata::new("ts", ColumnType::Timestamp),
        ColumnMetadata::new("flag", ColumnType::Boolean),
        ColumnMetadata::new("b", ColumnType::Byte),
        ColumnMetadata::new("s", ColumnType::Short),
        ColumnMetadata::new("c", ColumnType::Char),
        ColumnMetadata::new("i", ColumnType::Int),
        ColumnMetadata::new("f", ColumnType::Float),
        ColumnMetadata::new("sym", ColumnType::Symbol),
        ColumnMetadata::new("l", ColumnType::Long),
        ColumnMetadata::new("d", ColumnType::Double),
        ColumnMetadata::new("day", ColumnType::Date),
        ColumnMetadata::new("hash", ColumnType::Long256),
        ColumnMetadata::new("str", ColumnType::String),
        ColumnMetadata::new("bin", ColumnType::Binary),
    ];
    TableMetadata::new(columns, Some(0)).unwrap_or_else(|e| panic!("all_types_metadata: {e}"))
}

/// Deterministic table in `all_types_metadata` layout. Row `n` carries
/// timestamp `EPOCH_2024_MICROS + n * 1000`; strings and binaries have random
/// lengths and are NULL roughly one time in eight.
pub fn generate_table(seed: u64, partition_rows: &[u64]) -> HeapTable {
    let metadata = all_types_metadata();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = HeapTable::new(metadata.clone());
    let mut global = 0u64;

    for &rows in partition_rows {
        let mut builder = PartitionBuilder::new(&metadata);
        for _ in 0..rows {
            let str_len = rng.gen_range(0..24);
            let text: String = (0..str_len).map(|_| rng.gen_range('a'..='z')).collect();
            let bin_len = rng.gen_range(0..48);
            let bytes: Vec<u8> = (0..bin_len).map(|_| rng.r#gen::<u8>()).collect();
            let n = global as i64;

            builder
                .append_row(&[
                    Value::Timestamp(EPOCH_2024_MICROS + n * 1_000),
                    Value::Boolean(n % 2 == 1),
                    Value::Byte(n as i8),
                    Value::Short(n as i16),
                    Value::Char(b'A' as u16 + (n % 26) as u16),
                    Value::Int(n as i32),
                    Value::Float(n as f32),
                    Value::Symbol((n % 16) as i32),
                    Value::Long(n),
                    Value::Double(n as f64),
                    Value::Date(EPOCH_2024_MICROS / 1_000 + n),
                    Value::Long256([n as u64, 0, 0, !0]),
                    Value::String((!rng.gen_ratio(1, 8)).then_some(text.as_str())),
                    Value::Binary((!rng.gen_ratio(1, 8)).then_some(bytes.as_slice())),
                ])
                .unwrap_or_else(|e| panic!("generate_table: {e}"));
            global += 1;
        }
        table
            .push_partition(builder.finish())
            .unwrap_or_else(|e| panic!("generate_table: {e}"));
    }
    table
}

/// Random partition sizes, with empty partitions mixed in.
pub fn random_partition_rows(seed: u64, partitions: usize, max_rows: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..partitions)
        .map(|_| {
            if rng.gen_ratio(1, 5) {
                0
            } else {
                rng.gen_range(1..=max_rows)
            }
        })
        .collect()
}

/// Write `generate_table` output to a fresh temp dir.
pub fn local_fixture(
    seed: u64,
    partition_rows: &[u64],
) -> Result<(tempfile::TempDir, TableManifest), FrameError> {
    let dir = tempfile::TempDir::new()?;
    let manifest = write_local_table(dir.path(), &generate_table(seed, partition_rows))?;
    Ok((dir, manifest))
}
