//! Record decoding.
//!
//! A record is one row's column payload: a header followed by the column
//! values. The header opens with a varint giving the total header size in
//! bytes (including that varint itself), then one serial-type varint per
//! column. The body packs the values back to back in the same order.
//!
//! See: <https://www.sqlite.org/fileformat.html#record_format>

use litescan_error::{LitescanError, Result};

use crate::serial_type::read_varint;
use crate::value::ColumnValue;

/// One decoded record: an ordered sequence of column values.
///
/// The number of values always equals the number of serial types listed in
/// the record header, and the decoded widths always sum to exactly the
/// payload length the record was decoded from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    values: Vec<ColumnValue>,
    header_size: usize,
}

impl Record {
    /// Decode a complete record from `payload`.
    ///
    /// The payload must contain exactly one record; any slack indicates a
    /// corrupt cell and fails with `RecordLengthMismatch`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (header_size_raw, header_varint_len) =
            read_varint(payload).ok_or(LitescanError::TruncatedVarint {
                page: None,
                offset: 0,
            })?;
        let header_size = header_size_raw as usize;

        if header_size < header_varint_len || header_size > payload.len() {
            return Err(LitescanError::RecordLengthMismatch {
                expected: payload.len(),
                actual: header_size,
            });
        }

        let mut serial_types = Vec::new();
        let mut offset = header_varint_len;
        while offset < header_size {
            let (serial_type, consumed) = read_varint(&payload[offset..header_size])
                .ok_or(LitescanError::TruncatedVarint { page: None, offset })?;
            serial_types.push(serial_type);
            offset += consumed;
        }

        let mut body_offset = header_size;
        let mut values = Vec::with_capacity(serial_types.len());
        for &serial_type in &serial_types {
            let value = ColumnValue::decode(serial_type, &payload[body_offset..])?;
            body_offset += value.len();
            values.push(value);
        }

        if body_offset != payload.len() {
            return Err(LitescanError::RecordLengthMismatch {
                expected: payload.len(),
                actual: body_offset,
            });
        }

        Ok(Self {
            values,
            header_size,
        })
    }

    /// The decoded column values, in column order.
    pub fn values(&self) -> &[ColumnValue] {
        &self.values
    }

    /// The value at column `index`.
    pub fn get(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Size of the record header in bytes, including its own size varint.
    pub const fn header_size(&self) -> usize {
        self.header_size
    }
}

impl std::ops::Index<usize> for Record {
    type Output = ColumnValue;

    fn index(&self, index: usize) -> &ColumnValue {
        &self.values[index]
    }
}
