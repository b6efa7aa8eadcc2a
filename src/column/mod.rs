mod sizing;
mod var;

pub use sizing::{ColumnSizing, ColumnType, VarKind};
pub use var::{
    BINARY_LENGTH_BYTES, NULL_LEN, STRING_LENGTH_BYTES, boundary, encode_binary, encode_string,
    value_size,
};
