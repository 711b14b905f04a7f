use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ColfileError, Result, Value};

/// Serialized form of a dictionary-encoded string column: the lookup table
/// in first-appearance order, then one code per row.
#[derive(Debug, Serialize, Deserialize)]
struct DictPayload {
    table: Vec<String>,
    codes: Vec<u32>,
}

pub(crate) fn encode(values: &[Value]) -> Result<Vec<u8>> {
    let mut table: Vec<String> = Vec::new();
    let mut index: HashMap<String, u32> = HashMap::new();
    let mut codes = Vec::with_capacity(values.len());
    for (row, value) in values.iter().enumerate() {
        let Value::Utf8(s) = value else {
            return Err(ColfileError::Encoding(format!(
                "expected utf8 at row {row}, got {}",
                value.column_type()
            )));
        };
        let code = match index.get(s) {
            Some(&code) => code,
            None => {
                let code = table.len() as u32;
                table.push(s.clone());
                index.insert(s.clone(), code);
                code
            }
        };
        codes.push(code);
    }
    Ok(postcard::to_allocvec(&DictPayload { table, codes })?)
}

pub(crate) fn decode(bytes: &[u8], rows: usize) -> Result<Vec<Value>> {
    let payload: DictPayload = postcard::from_bytes(bytes)
        .map_err(|e| ColfileError::CorruptData(format!("dict payload: {e}")))?;
    if payload.codes.len() != rows {
        return Err(ColfileError::CorruptData(format!(
            "dict block holds {} codes, expected {rows}",
            payload.codes.len()
        )));
    }
    payload
        .codes
        .iter()
        .map(|&code| {
            payload
                .table
                .get(code as usize)
                .map(|s| Value::Utf8(s.clone()))
                .ok_or_else(|| {
                    ColfileError::CorruptData(format!(
                        "dict code {code} out of range, table holds {} entries",
                        payload.table.len()
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::Utf8(s.to_string())).collect()
    }

    #[test]
    fn round_trip_deduplicates() {
        let values = utf8(&["a", "b", "a", "a", "c", "b"]);
        let bytes = encode(&values).unwrap();
        let payload: DictPayload = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(payload.table, vec!["a", "b", "c"]);
        assert_eq!(payload.codes, vec![0, 1, 0, 0, 2, 1]);
        assert_eq!(decode(&bytes, values.len()).unwrap(), values);
    }

    #[test]
    fn empty_column() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(decode(&bytes, 0).unwrap(), vec![]);
    }

    #[test]
    fn rejects_non_string() {
        let err = encode(&[Value::F64(1.0)]).unwrap_err();
        assert!(matches!(err, ColfileError::Encoding(_)));
    }

    #[test]
    fn rejects_out_of_range_code() {
        let bytes = postcard::to_allocvec(&DictPayload {
            table: vec!["a".to_string()],
            codes: vec![0, 7],
        })
        .unwrap();
        let err = decode(&bytes, 2).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let bytes = encode(&utf8(&["a", "b"])).unwrap();
        let err = decode(&bytes, 3).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }
}
