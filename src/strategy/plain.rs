use crate::{ColfileError, ColumnType, Result, Value};

fn type_mismatch(ty: ColumnType, row: usize, value: &Value) -> ColfileError {
    ColfileError::Encoding(format!(
        "expected {ty} at row {row}, got {}",
        value.column_type()
    ))
}

pub(crate) fn encode(ty: ColumnType, values: &[Value]) -> Result<Vec<u8>> {
    match ty {
        ColumnType::Utf8 => {
            let mut strings: Vec<&str> = Vec::with_capacity(values.len());
            for (row, value) in values.iter().enumerate() {
                match value {
                    Value::Utf8(s) => strings.push(s),
                    other => return Err(type_mismatch(ty, row, other)),
                }
            }
            Ok(postcard::to_allocvec(&strings)?)
        }
        _ => {
            // fixed_width is Some for every non-utf8 type
            let width = ty.fixed_width().unwrap_or(8);
            let mut out = Vec::with_capacity(values.len() * width);
            for (row, value) in values.iter().enumerate() {
                match (ty, value) {
                    (ColumnType::F64, Value::F64(v)) => out.extend_from_slice(&v.to_le_bytes()),
                    (ColumnType::I64, Value::I64(v)) => out.extend_from_slice(&v.to_le_bytes()),
                    (ColumnType::Timestamp, Value::Timestamp(v)) => {
                        out.extend_from_slice(&v.to_le_bytes())
                    }
                    (ColumnType::Bool, Value::Bool(v)) => out.push(*v as u8),
                    (_, other) => return Err(type_mismatch(ty, row, other)),
                }
            }
            Ok(out)
        }
    }
}

pub(crate) fn decode(ty: ColumnType, bytes: &[u8], rows: usize) -> Result<Vec<Value>> {
    match ty {
        ColumnType::Utf8 => {
            let strings: Vec<String> = postcard::from_bytes(bytes)
                .map_err(|e| ColfileError::CorruptData(format!("plain utf8 payload: {e}")))?;
            if strings.len() != rows {
                return Err(ColfileError::CorruptData(format!(
                    "plain utf8 block holds {} values, expected {rows}",
                    strings.len()
                )));
            }
            Ok(strings.into_iter().map(Value::Utf8).collect())
        }
        _ => {
            let width = ty.fixed_width().unwrap_or(8);
            if bytes.len() != rows * width {
                return Err(ColfileError::CorruptData(format!(
                    "plain {ty} block is {} bytes, expected {rows} x {width}",
                    bytes.len()
                )));
            }
            bytes
                .chunks_exact(width)
                .map(|chunk| match ty {
                    ColumnType::F64 => {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(chunk);
                        Ok(Value::F64(f64::from_le_bytes(buf)))
                    }
                    ColumnType::I64 => {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(chunk);
                        Ok(Value::I64(i64::from_le_bytes(buf)))
                    }
                    ColumnType::Timestamp => {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(chunk);
                        Ok(Value::Timestamp(i64::from_le_bytes(buf)))
                    }
                    ColumnType::Bool => match chunk[0] {
                        0 => Ok(Value::Bool(false)),
                        1 => Ok(Value::Bool(true)),
                        other => Err(ColfileError::CorruptData(format!(
                            "invalid bool byte {other}"
                        ))),
                    },
                    ColumnType::Utf8 => unreachable!("handled above"),
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_f64() {
        let values: Vec<Value> = (0..100).map(|i| Value::F64(i as f64 * 0.5)).collect();
        let bytes = encode(ColumnType::F64, &values).unwrap();
        assert_eq!(bytes.len(), 800);
        assert_eq!(decode(ColumnType::F64, &bytes, 100).unwrap(), values);
    }

    #[test]
    fn round_trip_i64_and_timestamp() {
        let values = vec![Value::I64(-5), Value::I64(0), Value::I64(i64::MAX)];
        let bytes = encode(ColumnType::I64, &values).unwrap();
        assert_eq!(decode(ColumnType::I64, &bytes, 3).unwrap(), values);

        let stamps = vec![Value::Timestamp(1_700_000_000_000), Value::Timestamp(0)];
        let bytes = encode(ColumnType::Timestamp, &stamps).unwrap();
        assert_eq!(decode(ColumnType::Timestamp, &bytes, 2).unwrap(), stamps);
    }

    #[test]
    fn round_trip_bool() {
        let values = vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)];
        let bytes = encode(ColumnType::Bool, &values).unwrap();
        assert_eq!(bytes, vec![1, 0, 1]);
        assert_eq!(decode(ColumnType::Bool, &bytes, 3).unwrap(), values);
    }

    #[test]
    fn round_trip_plain_utf8() {
        let values = vec![Value::Utf8("hi".into()), Value::Utf8("".into())];
        let bytes = encode(ColumnType::Utf8, &values).unwrap();
        assert_eq!(decode(ColumnType::Utf8, &bytes, 2).unwrap(), values);
    }

    #[test]
    fn rejects_wrong_type() {
        let err = encode(ColumnType::F64, &[Value::I64(1)]).unwrap_err();
        assert!(matches!(err, ColfileError::Encoding(_)));
    }

    #[test]
    fn rejects_short_block() {
        let err = decode(ColumnType::F64, &[0u8; 12], 2).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }

    #[test]
    fn rejects_invalid_bool_byte() {
        let err = decode(ColumnType::Bool, &[2], 1).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }
}
