use serde::{Deserialize, Serialize};

use crate::column::ColumnType;
use crate::core::FrameError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Column layout of a table plus its designated timestamp column, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableMetadata {
    columns: Vec<ColumnMetadata>,
    #[serde(default)]
    timestamp_index: Option<usize>,
}

impl TableMetadata {
    pub fn new(
        columns: Vec<ColumnMetadata>,
        timestamp_index: Option<usize>,
    ) -> Result<Self, FrameError> {
        let metadata = Self {
            columns,
            timestamp_index,
        };
        metadata.validate()?;
        Ok(metadata)
    }

    /// The designated timestamp must exist and be a fixed 8-byte timestamp,
    /// frames read its first and last value straight from the column bytes.
    pub(crate) fn validate(&self) -> Result<(), FrameError> {
        let Some(idx) = self.timestamp_index else {
            return Ok(());
        };
        let column = self.columns.get(idx).ok_or_else(|| {
            FrameError::MetadataError(format!(
                "timestamp index {idx} out of range (have {} columns)",
                self.columns.len()
            ))
        })?;
        if column.column_type != ColumnType::Timestamp {
            return Err(FrameError::MetadataError(format!(
                "timestamp column '{}' has type {}",
                column.name, column.column_type
            )));
        }
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn column_type(&self, column: usize) -> ColumnType {
        self.columns[column].column_type
    }

    pub fn column_name(&self, column: usize) -> &str {
        &self.columns[column].name
    }

    pub fn timestamp_index(&self) -> Option<usize> {
        self.timestamp_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_timestamp_column() {
        let metadata = TableMetadata::new(
            vec![
                ColumnMetadata::new("sym", ColumnType::Symbol),
                ColumnMetadata::new("ts", ColumnType::Timestamp),
            ],
            Some(1),
        )
        .unwrap();
        assert_eq!(metadata.column_count(), 2);
        assert_eq!(metadata.timestamp_index(), Some(1));
        assert_eq!(metadata.column_name(1), "ts");
        assert_eq!(metadata.column_type(0), ColumnType::Symbol);
    }

    #[test]
    fn test_timestamp_must_be_timestamp_type() {
        let err = TableMetadata::new(vec![ColumnMetadata::new("ts", ColumnType::Long)], Some(0))
            .unwrap_err();
        assert_eq!(
            err,
            FrameError::MetadataError("timestamp column 'ts' has type long".to_string())
        );
    }

    #[test]
    fn test_timestamp_index_out_of_range() {
        let err = TableMetadata::new(vec![], Some(0)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"columns":[{"name":"v","type":"string"}]}"#;
        let metadata: TableMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.timestamp_index(), None);
        assert_eq!(metadata.column_type(0), ColumnType::String);
    }
}
