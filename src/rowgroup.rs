//! One row group: a bounded batch of rows encoded column by column.
//!
//! On the wire a row group is a postcard header followed by the concatenated
//! column blocks. The header records every block's byte length, so a reader
//! can slice out a single column without decoding any of the others.

use itertools::{izip, Itertools};
use serde::{Deserialize, Serialize};

use crate::column::{decode_column, encode_column};
use crate::compress::CompressConfig;
use crate::strategy::Encoding;
use crate::{ColfileError, ColumnType, Result, Row, Schema, Value};

/// Upper bound on the declared row count of one group. Prevents a corrupt
/// header from driving huge allocations.
const MAX_GROUP_ROWS: u64 = 1 << 24;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChunkMeta {
    pub name: String,
    pub ty: ColumnType,
    pub encoding: Encoding,
    /// Byte length of this column's block, compression flag included.
    pub len: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RowGroupHeader {
    pub rows: u64,
    pub columns: Vec<ChunkMeta>,
}

/// Buffers rows column-major and serializes them as one row group.
pub struct RowGroupWriter {
    schema: Schema,
    capacity: usize,
    compress: CompressConfig,
    buffers: Vec<Vec<Value>>,
}

impl RowGroupWriter {
    pub fn new(schema: Schema, capacity: usize, compress: CompressConfig) -> Self {
        let buffers = schema.columns().iter().map(|_| Vec::new()).collect();
        Self {
            schema,
            capacity: capacity.max(1),
            compress,
            buffers,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows_buffered(&self) -> usize {
        self.buffers.first().map_or(0, Vec::len)
    }

    pub fn is_full(&self) -> bool {
        self.rows_buffered() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.rows_buffered() == 0
    }

    /// Buffers one row. The row must hold a value of the declared type for
    /// every schema column; keys outside the schema are ignored.
    pub fn push(&mut self, row: &Row) -> Result<()> {
        // Validate the whole row before touching the buffers, so a rejected
        // row leaves no partial column behind.
        for def in self.schema.columns() {
            match row.get(&def.name) {
                None => {
                    return Err(ColfileError::SchemaMismatch(format!(
                        "missing column `{}`",
                        def.name
                    )))
                }
                Some(value) if value.column_type() != def.ty => {
                    return Err(ColfileError::SchemaMismatch(format!(
                        "column `{}` expects {}, got {}",
                        def.name,
                        def.ty,
                        value.column_type()
                    )))
                }
                Some(_) => {}
            }
        }
        for (def, buffer) in izip!(self.schema.columns(), &mut self.buffers) {
            // checked above, so the value is always present
            if let Some(value) = row.get(&def.name) {
                buffer.push(value.clone());
            }
        }
        Ok(())
    }

    /// Encodes every buffered column, emits header plus blocks and clears
    /// the buffer for the next group.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let rows = self.rows_buffered() as u64;
        let mut metas = Vec::with_capacity(self.schema.len());
        let mut blocks = Vec::with_capacity(self.schema.len());
        for (def, buffer) in izip!(self.schema.columns(), &mut self.buffers) {
            let block = encode_column(def.ty, def.encoding, buffer, &self.compress)?;
            metas.push(ChunkMeta {
                name: def.name.clone(),
                ty: def.ty,
                encoding: def.encoding,
                len: block.len() as u32,
            });
            blocks.push(block);
            buffer.clear();
        }
        let mut out = postcard::to_allocvec(&RowGroupHeader {
            rows,
            columns: metas,
        })?;
        for block in blocks {
            out.extend(block);
        }
        Ok(out)
    }
}

/// Read-side view of one serialized row group. Columns are decoded lazily:
/// a column that is never requested is never decompressed.
#[derive(Debug)]
pub struct RowGroupReader {
    header: RowGroupHeader,
    /// Per-column byte ranges into `bytes`, in header order.
    ranges: Vec<std::ops::Range<usize>>,
    bytes: Vec<u8>,
}

impl RowGroupReader {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (header, rest) = postcard::take_from_bytes::<RowGroupHeader>(&bytes)
            .map_err(|e| ColfileError::CorruptData(format!("row group header: {e}")))?;
        if header.rows > MAX_GROUP_ROWS {
            return Err(ColfileError::CorruptData(format!(
                "row group declares {} rows",
                header.rows
            )));
        }
        let mut offset = bytes.len() - rest.len();
        let mut ranges = Vec::with_capacity(header.columns.len());
        for meta in &header.columns {
            let end = offset + meta.len as usize;
            if end > bytes.len() {
                return Err(ColfileError::CorruptData(format!(
                    "column `{}` block runs past the row group",
                    meta.name
                )));
            }
            ranges.push(offset..end);
            offset = end;
        }
        if offset != bytes.len() {
            return Err(ColfileError::CorruptData(format!(
                "{} trailing bytes after the last column block",
                bytes.len() - offset
            )));
        }
        Ok(Self {
            header,
            ranges,
            bytes,
        })
    }

    pub fn row_count(&self) -> usize {
        self.header.rows as usize
    }

    fn chunk_index(&self, name: &str) -> Result<usize> {
        self.header
            .columns
            .iter()
            .position(|meta| meta.name == name)
            .ok_or_else(|| ColfileError::ColumnNotFound {
                name: name.to_string(),
                available: self.header.columns.iter().map(|meta| &meta.name).join(", "),
            })
    }

    /// Decodes one column in full.
    pub fn read_column(&self, name: &str) -> Result<Vec<Value>> {
        let index = self.chunk_index(name)?;
        let meta = &self.header.columns[index];
        decode_column(
            meta.ty,
            meta.encoding,
            &self.bytes[self.ranges[index].clone()],
            self.row_count(),
        )
    }

    /// Reads a group-local window of rows, decoding only the projected
    /// columns. `None` projects every column. The window is clamped to the
    /// rows this group holds.
    pub fn read_rows(
        &self,
        projection: Option<&[&str]>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>> {
        let rows = self.row_count();
        if offset >= rows || limit == 0 {
            return Ok(Vec::new());
        }
        let take = limit.min(rows - offset);
        let names: Vec<&str> = match projection {
            Some(names) => names.to_vec(),
            None => self
                .header
                .columns
                .iter()
                .map(|meta| meta.name.as_str())
                .collect(),
        };
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            columns.push(self.read_column(name)?);
        }
        let mut out = Vec::with_capacity(take);
        for i in offset..offset + take {
            out.push(
                izip!(&names, &columns)
                    .map(|(name, column)| (name.to_string(), column[i].clone()))
                    .collect(),
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnDef;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("name", ColumnType::Utf8),
            ColumnDef::new("score", ColumnType::F64),
            ColumnDef::new("active", ColumnType::Bool),
        ])
        .unwrap()
    }

    fn sample_rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                Row::new()
                    .with("name", format!("user{}", i % 3))
                    .with("score", i as f64)
                    .with("active", i % 2 == 0)
            })
            .collect()
    }

    fn build_group(rows: &[Row]) -> Vec<u8> {
        let mut writer = RowGroupWriter::new(schema(), rows.len(), CompressConfig::default());
        for row in rows {
            writer.push(row).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn round_trip() {
        let rows = sample_rows(50);
        let reader = RowGroupReader::from_bytes(build_group(&rows)).unwrap();
        assert_eq!(reader.row_count(), 50);
        assert_eq!(reader.read_rows(None, 0, 50).unwrap(), rows);
    }

    #[test]
    fn window_is_clamped() {
        let rows = sample_rows(10);
        let reader = RowGroupReader::from_bytes(build_group(&rows)).unwrap();
        assert_eq!(reader.read_rows(None, 7, 100).unwrap(), rows[7..].to_vec());
        assert!(reader.read_rows(None, 10, 5).unwrap().is_empty());
    }

    #[test]
    fn projection_only_returns_requested_columns() {
        let rows = sample_rows(10);
        let reader = RowGroupReader::from_bytes(build_group(&rows)).unwrap();
        let projected = reader.read_rows(Some(&["score"]), 0, 10).unwrap();
        for (i, row) in projected.iter().enumerate() {
            assert_eq!(row.len(), 1);
            assert_eq!(row.get("score"), Some(&Value::F64(i as f64)));
            assert!(row.get("name").is_none());
        }
    }

    #[test]
    fn read_single_column() {
        let rows = sample_rows(6);
        let reader = RowGroupReader::from_bytes(build_group(&rows)).unwrap();
        let names = reader.read_column("name").unwrap();
        assert_eq!(names[0], Value::Utf8("user0".to_string()));
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn unknown_column_is_reported() {
        let reader = RowGroupReader::from_bytes(build_group(&sample_rows(3))).unwrap();
        let err = reader.read_column("missing").unwrap_err();
        assert!(matches!(err, ColfileError::ColumnNotFound { .. }));
    }

    #[test]
    fn push_rejects_missing_and_wrong_typed_values() {
        let mut writer = RowGroupWriter::new(schema(), 10, CompressConfig::default());
        let err = writer
            .push(&Row::new().with("name", "a").with("score", 1.0))
            .unwrap_err();
        assert!(matches!(err, ColfileError::SchemaMismatch(_)));

        let err = writer
            .push(
                &Row::new()
                    .with("name", "a")
                    .with("score", 1i64)
                    .with("active", true),
            )
            .unwrap_err();
        assert!(matches!(err, ColfileError::SchemaMismatch(_)));

        // rejected rows must leave the buffers untouched
        assert!(writer.is_empty());
    }

    #[test]
    fn extra_row_keys_are_ignored() {
        let mut writer = RowGroupWriter::new(schema(), 10, CompressConfig::default());
        writer
            .push(
                &Row::new()
                    .with("name", "a")
                    .with("score", 1.0)
                    .with("active", true)
                    .with("scratch", 99i64),
            )
            .unwrap();
        let reader = RowGroupReader::from_bytes(writer.finish().unwrap()).unwrap();
        assert_eq!(reader.read_rows(None, 0, 1).unwrap()[0].len(), 3);
    }

    #[test]
    fn truncated_group_is_corrupt() {
        let bytes = build_group(&sample_rows(5));
        let err = RowGroupReader::from_bytes(bytes[..bytes.len() - 3].to_vec()).unwrap_err();
        assert!(matches!(err, ColfileError::CorruptData(_)));
    }

    #[test]
    fn finish_clears_the_buffer() {
        let mut writer = RowGroupWriter::new(schema(), 10, CompressConfig::default());
        for row in sample_rows(4) {
            writer.push(&row).unwrap();
        }
        writer.finish().unwrap();
        assert!(writer.is_empty());
    }
}
