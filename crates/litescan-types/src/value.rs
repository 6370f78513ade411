//! Typed column values and their canonical textual rendering.

use litescan_error::{LitescanError, Result};

use crate::encoding::read_int_be;
use crate::serial_type::{classify_serial_type, serial_type_len, SerialTypeClass};

/// The decoded payload of a single column.
///
/// Reserved serial types (10, 11) decode to `Null`; the originating serial
/// type is preserved on the [`ColumnValue`] wrapper.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ValueKind {
    /// SQL NULL.
    Null,
    /// A signed 64-bit integer (serial types 1-6).
    Integer(i64),
    /// A 64-bit IEEE 754 float (serial type 7).
    Float(f64),
    /// The integer constant 0 (serial type 8).
    Zero,
    /// The integer constant 1 (serial type 9).
    One,
    /// Text bytes in the database's declared encoding (odd types >= 13).
    ///
    /// Kept as raw bytes; the file header's text encoding governs their
    /// interpretation and litescan leaves string reconstruction to callers.
    Text(Vec<u8>),
    /// A binary blob (even types >= 12).
    Blob(Vec<u8>),
}

/// One decoded column value: its serial type, its typed payload, and the raw
/// byte span it was decoded from.
///
/// The raw span's length always equals the width implied by the serial type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColumnValue {
    serial_type: u64,
    kind: ValueKind,
    raw: Vec<u8>,
}

impl ColumnValue {
    /// Decode one value of the given serial type from the front of `buf`.
    ///
    /// Consumes exactly `serial_type_len(serial_type)` bytes; fails with
    /// `NotEnoughBytes` when the buffer is shorter than that.
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(serial_type: u64, buf: &[u8]) -> Result<Self> {
        let width = serial_type_len(serial_type) as usize;
        let raw = buf
            .get(..width)
            .ok_or(LitescanError::NotEnoughBytes {
                needed: width,
                have: buf.len(),
            })?
            .to_vec();

        let kind = match classify_serial_type(serial_type) {
            SerialTypeClass::Null | SerialTypeClass::Reserved => ValueKind::Null,
            SerialTypeClass::Zero => ValueKind::Zero,
            SerialTypeClass::One => ValueKind::One,
            SerialTypeClass::Integer => {
                let v = read_int_be(&raw, width).expect("span length checked above");
                ValueKind::Integer(v)
            }
            SerialTypeClass::Float => {
                let bytes: [u8; 8] = raw.as_slice().try_into().expect("serial type 7 is 8 bytes");
                ValueKind::Float(f64::from_be_bytes(bytes))
            }
            SerialTypeClass::Text => ValueKind::Text(raw.clone()),
            SerialTypeClass::Blob => ValueKind::Blob(raw.clone()),
        };

        Ok(Self {
            serial_type,
            kind,
            raw,
        })
    }

    /// The serial type this value was decoded from.
    pub const fn serial_type(&self) -> u64 {
        self.serial_type
    }

    /// The typed payload.
    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// The raw byte span the value occupies in the record body.
    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Width of the raw span in bytes.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the raw span is empty (null, constants, empty text/blob).
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Whether this value is NULL (including the reserved serial types).
    pub const fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    /// Integer view: serial types 1-6 plus the constants 0 and 1.
    pub const fn as_integer(&self) -> Option<i64> {
        match self.kind {
            ValueKind::Integer(v) => Some(v),
            ValueKind::Zero => Some(0),
            ValueKind::One => Some(1),
            _ => None,
        }
    }

    /// Float view.
    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Text bytes, if this is a text value.
    pub fn as_text(&self) -> Option<&[u8]> {
        match &self.kind {
            ValueKind::Text(b) => Some(b),
            _ => None,
        }
    }

    /// Blob bytes, if this is a blob value.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match &self.kind {
            ValueKind::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Canonical textual form.
    ///
    /// - Null renders as the empty string.
    /// - Integers render as signed decimal.
    /// - Floats render in scientific notation with 8 fractional digits and a
    ///   signed two-digit exponent (`1.50000000e+00`).
    /// - The constants render as `0` and `1`.
    /// - Blobs render as `[b0,b1,...]` with at most nine byte values, longer
    ///   blobs eliding the rest as `,...`.
    /// - Text renders its bytes as UTF-8, lossily.
    pub fn render(&self) -> String {
        match &self.kind {
            ValueKind::Null => String::new(),
            ValueKind::Integer(v) => v.to_string(),
            ValueKind::Float(v) => render_float(*v),
            ValueKind::Zero => "0".to_owned(),
            ValueKind::One => "1".to_owned(),
            ValueKind::Text(b) => String::from_utf8_lossy(b).into_owned(),
            ValueKind::Blob(b) => render_blob(b),
        }
    }
}

impl std::fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Scientific notation with 8 fractional digits and a signed two-digit
/// exponent: `-3.14000000e+00`, `1.25000000e-03`.
fn render_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }
    let formatted = format!("{value:.8e}");
    let (mantissa, exponent) = formatted
        .split_once('e')
        .expect("{:e} always emits an exponent");
    let exponent: i32 = exponent.parse().expect("{:e} exponent is an integer");
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

/// Blob preview: at most nine byte values, then `,...`.
fn render_blob(bytes: &[u8]) -> String {
    let mut out = String::from("[");
    for (i, b) in bytes.iter().take(9).enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&b.to_string());
    }
    if bytes.len() > 9 {
        out.push_str(",...");
    }
    out.push(']');
    out
}
