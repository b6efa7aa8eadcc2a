mod heap;
mod local;
mod metadata;
mod reader;

pub use heap::{HeapPartition, HeapTable, PartitionBuilder, Value};
pub use local::{
    DATA_EXT, INDEX_EXT, LocalTable, MANIFEST_FILE, PartitionManifest, TableManifest,
    data_file_name, index_file_name,
};
pub use metadata::{ColumnMetadata, TableMetadata};
pub use reader::{ColumnData, TableReader};
