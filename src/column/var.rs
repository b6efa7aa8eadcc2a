use bytemuck::cast_slice;

use crate::core::FrameError;
use crate::storage::ColumnData;

use super::VarKind;

/// Size of the code-unit count in front of every string value.
pub const STRING_LENGTH_BYTES: u64 = 4;
/// Size of the byte length in front of every binary value.
pub const BINARY_LENGTH_BYTES: u64 = 8;
/// Header value marking a NULL string or binary. A NULL occupies only its header.
pub const NULL_LEN: i64 = -1;

/// Encoded size (header plus payload) of the value starting at `offset`.
pub fn value_size(kind: VarKind, column: &ColumnData<'_>, offset: u64) -> Result<u64, FrameError> {
    let (header_size, payload) = match kind {
        VarKind::String => {
            let units = i64::from(column.read_string_header(offset)?);
            (STRING_LENGTH_BYTES, payload_len(column, offset, units)? * 2)
        }
        VarKind::Binary => {
            let len = column.read_binary_header(offset)?;
            (BINARY_LENGTH_BYTES, payload_len(column, offset, len)?)
        }
    };
    Ok(header_size + payload)
}

fn payload_len(column: &ColumnData<'_>, offset: u64, header: i64) -> Result<u64, FrameError> {
    if header == NULL_LEN {
        return Ok(0);
    }
    u64::try_from(header)
        .map_err(|_| column.corrupt(format!("negative value length {header} at {offset}")))
}

/// Byte offset in the data region right after the first `row` values of a
/// partition holding `partition_rows` rows.
///
/// The offset index stores the start of each row, so boundaries inside the
/// partition are a single index load. The boundary after the last rows is
/// derived from the start of the preceding row plus that value's own header.
///
/// Panics unless `1 <= row <= partition_rows`; the boundary after zero rows is
/// always 0 and callers handle it without reading anything.
pub fn boundary(
    kind: VarKind,
    column: &ColumnData<'_>,
    row: u64,
    partition_rows: u64,
) -> Result<u64, FrameError> {
    assert!(
        row >= 1 && row <= partition_rows,
        "boundary row {row} outside 1..={partition_rows}"
    );

    let offset = if row + 1 < partition_rows {
        column.read_index(row)?
    } else {
        let start = column.read_index(row - 1)?;
        start
            .checked_add(value_size(kind, column, start)?)
            .ok_or_else(|| column.corrupt(format!("value at {start} overflows")))?
    };

    let data_len = column.data().len() as u64;
    if offset > data_len {
        return Err(column.corrupt(format!(
            "boundary {offset} after row {row} beyond data region of {data_len} bytes"
        )));
    }
    Ok(offset)
}

/// Append a string value in its on-disk form: code-unit count, then UTF-16
/// code units.
pub fn encode_string(value: Option<&str>, out: &mut Vec<u8>) {
    match value {
        None => out.extend_from_slice(&(NULL_LEN as i32).to_ne_bytes()),
        Some(s) => {
            let units: Vec<u16> = s.encode_utf16().collect();
            out.extend_from_slice(&(units.len() as i32).to_ne_bytes());
            out.extend_from_slice(cast_slice(&units));
        }
    }
}

/// Append a binary value in its on-disk form: byte length, then raw bytes.
pub fn encode_binary(value: Option<&[u8]>, out: &mut Vec<u8>) {
    match value {
        None => out.extend_from_slice(&NULL_LEN.to_ne_bytes()),
        Some(bytes) => {
            out.extend_from_slice(&(bytes.len() as i64).to_ne_bytes());
            out.extend_from_slice(bytes);
        }
    }
}
