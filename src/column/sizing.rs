use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of a table column as recorded in table metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Float,
    /// Dictionary key into a symbol table; the values themselves live elsewhere.
    Symbol,
    Long,
    Double,
    Date,
    Timestamp,
    Long256,
    String,
    Binary,
}

/// Kind of self-describing header a variable-length value starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    String,
    Binary,
}

/// How the bytes of a column relate to its row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSizing {
    /// Every row takes `width` bytes, `width == 1 << shift`.
    Fixed { width: u64, shift: u32 },
    Variable(VarKind),
}

impl ColumnType {
    /// Encoded size of one value, `None` for variable-length types.
    pub fn byte_size(self) -> Option<u64> {
        match self.sizing() {
            ColumnSizing::Fixed { width, .. } => Some(width),
            ColumnSizing::Variable(_) => None,
        }
    }

    pub fn sizing(self) -> ColumnSizing {
        let width: u64 = match self {
            ColumnType::String => return ColumnSizing::Variable(VarKind::String),
            ColumnType::Binary => return ColumnSizing::Variable(VarKind::Binary),
            ColumnType::Boolean | ColumnType::Byte => 1,
            ColumnType::Short | ColumnType::Char => 2,
            ColumnType::Int | ColumnType::Float | ColumnType::Symbol => 4,
            ColumnType::Long | ColumnType::Double | ColumnType::Date | ColumnType::Timestamp => 8,
            ColumnType::Long256 => 32,
        };
        ColumnSizing::Fixed {
            width,
            shift: width.trailing_zeros(),
        }
    }

    pub fn is_variable(self) -> bool {
        matches!(self.sizing(), ColumnSizing::Variable(_))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Byte => "byte",
            ColumnType::Short => "short",
            ColumnType::Char => "char",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Symbol => "symbol",
            ColumnType::Long => "long",
            ColumnType::Double => "double",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Long256 => "long256",
            ColumnType::String => "string",
            ColumnType::Binary => "binary",
        };
        f.write_str(name)
    }
}

impl ColumnSizing {
    /// Byte length of `rows` values of a fixed-width column.
    ///
    /// `None` for variable-length columns, or when the length does not fit
    /// in a `u64` (only possible with a corrupt row count).
    pub fn fixed_len(self, rows: u64) -> Option<u64> {
        match self {
            ColumnSizing::Fixed { width, .. } => rows.checked_mul(width),
            ColumnSizing::Variable(_) => None,
        }
    }
}
