//! Compress-flag framing around an encoded column payload.
//!
//! A column block is a single flag byte (0 = raw, 1 = deflate) followed by
//! the payload. Payloads below the configured threshold are stored raw.

use crate::compress::{compress, decompress, CompressConfig};
use crate::strategy::{decode_values, encode_values, Encoding};
use crate::{ColfileError, ColumnType, Result, Value};

pub(crate) fn encode_column(
    ty: ColumnType,
    encoding: Encoding,
    values: &[Value],
    cfg: &CompressConfig,
) -> Result<Vec<u8>> {
    let payload = encode_values(ty, encoding, values)?;
    let mut out = Vec::with_capacity(payload.len() + 1);
    if payload.len() >= cfg.threshold {
        out.push(1);
        out.extend(compress(&payload, cfg)?);
    } else {
        out.push(0);
        out.extend(payload);
    }
    Ok(out)
}

pub(crate) fn decode_column(
    ty: ColumnType,
    encoding: Encoding,
    bytes: &[u8],
    rows: usize,
) -> Result<Vec<Value>> {
    let Some((&flag, payload)) = bytes.split_first() else {
        return Err(ColfileError::CorruptData("empty column block".to_string()));
    };
    match flag {
        0 => decode_values(ty, encoding, payload, rows),
        1 => decode_values(ty, encoding, &decompress(payload)?, rows),
        other => Err(ColfileError::CorruptData(format!(
            "invalid compression flag {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_blocks_stay_raw() {
        let values = vec![Value::I64(1), Value::I64(2)];
        let cfg = CompressConfig::default();
        let block = encode_column(ColumnType::I64, Encoding::Plain, &values, &cfg).unwrap();
        assert_eq!(block[0], 0);
        assert_eq!(
            decode_column(ColumnType::I64, Encoding::Plain, &block, 2).unwrap(),
            values
        );
    }

    #[test]
    fn large_blocks_compress() {
        let values: Vec<Value> = (0..1000).map(|_| Value::I64(7)).collect();
        let cfg = CompressConfig::default();
        let block = encode_column(ColumnType::I64, Encoding::Plain, &values, &cfg).unwrap();
        assert_eq!(block[0], 1);
        assert!(block.len() < 8000);
        assert_eq!(
            decode_column(ColumnType::I64, Encoding::Plain, &block, 1000).unwrap(),
            values
        );
    }

    #[test]
    fn garbage_after_compress_flag_is_corrupt() {
        let err = decode_column(ColumnType::I64, Encoding::Plain, &[1, 0xde, 0xad], 1).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }

    #[test]
    fn empty_block_is_corrupt() {
        let err = decode_column(ColumnType::I64, Encoding::Plain, &[], 0).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }
}
