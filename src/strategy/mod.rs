mod dict;
mod plain;

use serde::{Deserialize, Serialize};

use crate::{ColumnType, Result, Value};

/// How a column's values are laid out inside its block.
///
/// `Dict` replaces repeated strings with integer codes into a per-block
/// lookup table and is only valid for [`ColumnType::Utf8`]. `Plain` stores
/// fixed-width little-endian values for numeric types and length-prefixed
/// strings for utf8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Dict,
    Plain,
}

impl Encoding {
    pub fn default_for(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Utf8 => Encoding::Dict,
            _ => Encoding::Plain,
        }
    }
}

/// Encodes one column's buffered values into an uncompressed payload.
/// Pure; fails with [`crate::ColfileError::Encoding`] when a value does not
/// carry the declared type.
pub(crate) fn encode_values(
    ty: ColumnType,
    encoding: Encoding,
    values: &[Value],
) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Dict => dict::encode(values),
        Encoding::Plain => plain::encode(ty, values),
    }
}

/// Inverse of [`encode_values`] for the same type, encoding and row count.
/// Fails with [`crate::ColfileError::CorruptData`] when the payload does not
/// hold exactly `rows` well-formed elements.
pub(crate) fn decode_values(
    ty: ColumnType,
    encoding: Encoding,
    bytes: &[u8],
    rows: usize,
) -> Result<Vec<Value>> {
    match encoding {
        Encoding::Dict => dict::decode(bytes, rows),
        Encoding::Plain => plain::decode(ty, bytes, rows),
    }
}
