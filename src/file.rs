//! Single-file container: row-group blocks, then a postcard footer, then a
//! fixed trailer (`u32` footer length + magic).
//!
//! The footer is written once, after the last row group. A writer that never
//! reaches [`FileWriter::finish`] leaves no trailer behind, so a half-written
//! file fails to open instead of yielding partial data.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compress::CompressConfig;
use crate::rowgroup::{RowGroupReader, RowGroupWriter};
use crate::{ColfileError, Result, Row, Schema, Value};

const MAGIC: &[u8; 4] = b"CFL1";
/// Trailer = footer length (u32 LE) + tail magic.
const TRAILER_LEN: u64 = 8;

#[derive(Debug, Serialize, Deserialize)]
struct RowGroupMeta {
    offset: u64,
    len: u64,
    rows: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Footer {
    schema: Schema,
    row_groups: Vec<RowGroupMeta>,
}

/// Streaming writer. Rows are buffered into row groups of `row_group_size`
/// rows; every full group is encoded and flushed to disk immediately, so the
/// full dataset is never resident at once.
pub struct FileWriter {
    file: BufWriter<File>,
    group: RowGroupWriter,
    row_groups: Vec<RowGroupMeta>,
    offset: u64,
}

impl FileWriter {
    pub fn create<P: AsRef<Path>>(path: P, schema: Schema, row_group_size: usize) -> Result<Self> {
        Self::with_compression(path, schema, row_group_size, CompressConfig::default())
    }

    pub fn with_compression<P: AsRef<Path>>(
        path: P,
        schema: Schema,
        row_group_size: usize,
        compress: CompressConfig,
    ) -> Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(MAGIC)?;
        Ok(Self {
            file,
            group: RowGroupWriter::new(schema, row_group_size, compress),
            row_groups: Vec::new(),
            offset: MAGIC.len() as u64,
        })
    }

    pub fn schema(&self) -> &Schema {
        self.group.schema()
    }

    /// Rows written so far, flushed groups and the current buffer included.
    pub fn row_count(&self) -> usize {
        self.row_groups.iter().map(|meta| meta.rows as usize).sum::<usize>()
            + self.group.rows_buffered()
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        self.group.push(row)?;
        if self.group.is_full() {
            self.flush_group()?;
        }
        Ok(())
    }

    /// Consumes rows one at a time; the iterator may be lazy.
    pub fn write_rows<I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Row>,
    {
        for row in rows {
            self.write_row(&row)?;
        }
        Ok(())
    }

    fn flush_group(&mut self) -> Result<()> {
        if self.group.is_empty() {
            return Ok(());
        }
        let rows = self.group.rows_buffered() as u64;
        let bytes = self.group.finish()?;
        self.file.write_all(&bytes)?;
        self.row_groups.push(RowGroupMeta {
            offset: self.offset,
            len: bytes.len() as u64,
            rows,
        });
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Flushes the partial group, writes footer and trailer and syncs the
    /// file. Consumes the writer; the handle is released on every exit path.
    pub fn finish(mut self) -> Result<()> {
        self.flush_group()?;
        let footer = postcard::to_allocvec(&Footer {
            schema: self.group.schema().clone(),
            row_groups: std::mem::take(&mut self.row_groups),
        })?;
        self.file.write_all(&footer)?;
        self.file.write_all(&(footer.len() as u32).to_le_bytes())?;
        self.file.write_all(MAGIC)?;
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        Ok(())
    }
}

/// Reader over a finalized container file. Opening parses only the footer;
/// row groups are fetched and decoded on demand. Any number of readers may
/// open the same finalized file independently.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    footer: Footer,
    total_rows: usize,
}

impl FileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < MAGIC.len() as u64 + TRAILER_LEN {
            return Err(ColfileError::CorruptData(format!(
                "file is {file_len} bytes, too short for a container"
            )));
        }

        let mut head = [0u8; 4];
        file.read_exact(&mut head)?;
        if &head != MAGIC {
            return Err(ColfileError::CorruptData("bad head magic".to_string()));
        }

        file.seek(SeekFrom::End(-(TRAILER_LEN as i64)))?;
        let mut trailer = [0u8; 8];
        file.read_exact(&mut trailer)?;
        if &trailer[4..] != MAGIC {
            return Err(ColfileError::CorruptData(
                "bad tail magic, file was not finalized".to_string(),
            ));
        }
        let footer_len = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]) as u64;
        let data_end = file_len - TRAILER_LEN;
        if footer_len > data_end - MAGIC.len() as u64 {
            return Err(ColfileError::CorruptData(format!(
                "footer length {footer_len} is out of bounds"
            )));
        }

        file.seek(SeekFrom::Start(data_end - footer_len))?;
        let mut footer_bytes = vec![0u8; footer_len as usize];
        file.read_exact(&mut footer_bytes)?;
        let footer: Footer = postcard::from_bytes(&footer_bytes)
            .map_err(|e| ColfileError::CorruptData(format!("footer: {e}")))?;

        let groups_end = data_end - footer_len;
        for (index, meta) in footer.row_groups.iter().enumerate() {
            // offset and len come from the footer; a crafted pair can
            // overflow the sum, so add checked
            match meta.offset.checked_add(meta.len) {
                Some(end) if end <= groups_end => {}
                _ => {
                    return Err(ColfileError::CorruptData(format!(
                        "row group {index} runs past the footer"
                    )))
                }
            }
        }
        let total_rows = footer.row_groups.iter().map(|meta| meta.rows as usize).sum();
        Ok(Self {
            file,
            footer,
            total_rows,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.footer.schema
    }

    pub fn row_count(&self) -> usize {
        self.total_rows
    }

    pub fn row_group_count(&self) -> usize {
        self.footer.row_groups.len()
    }

    /// Loads and parses one row group from disk.
    fn load_group(&mut self, index: usize) -> Result<RowGroupReader> {
        let meta = &self.footer.row_groups[index];
        self.file.seek(SeekFrom::Start(meta.offset))?;
        let mut bytes = vec![0u8; meta.len as usize];
        self.file.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ColfileError::CorruptData(format!("row group {index} is truncated"))
            } else {
                ColfileError::Io(e)
            }
        })?;
        RowGroupReader::from_bytes(bytes).map_err(|e| match e {
            ColfileError::CorruptData(msg) => {
                ColfileError::CorruptData(format!("row group {index}: {msg}"))
            }
            other => other,
        })
    }

    /// Reads every row in write order.
    pub fn read_all(&mut self) -> Result<Vec<Row>> {
        let total = self.total_rows;
        self.read_rows(None, 0, total)
    }

    /// Reads a window of `limit` rows starting at the global row `offset`,
    /// optionally projected to a subset of columns. Row groups entirely
    /// outside the window are skipped without being read or decoded; a
    /// window that extends past the last row is clamped. Fails with
    /// [`ColfileError::OutOfRange`] when `offset` lies beyond the last row.
    pub fn read_rows(
        &mut self,
        projection: Option<&[&str]>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>> {
        if let Some(names) = projection {
            for name in names {
                self.footer.schema.require(name)?;
            }
        }
        if offset > 0 && offset >= self.total_rows {
            return Err(ColfileError::OutOfRange {
                start: offset,
                total: self.total_rows,
            });
        }
        let end = offset.saturating_add(limit).min(self.total_rows);
        let mut out = Vec::with_capacity(end - offset);
        let mut group_start = 0usize;
        for index in 0..self.footer.row_groups.len() {
            let rows = self.footer.row_groups[index].rows as usize;
            let group_end = group_start + rows;
            if group_end > offset && group_start < end {
                let local_offset = offset.saturating_sub(group_start);
                let local_limit = end.min(group_end) - (group_start + local_offset);
                let group = self.load_group(index)?;
                out.extend(group.read_rows(projection, local_offset, local_limit)?);
            }
            group_start = group_end;
            if group_start >= end {
                break;
            }
        }
        Ok(out)
    }

    /// Reads one page of rows. `read_page(size, n)` returns the global rows
    /// `[size * n, size * (n + 1))`: callers that count pages from 1 never
    /// see the first `size` rows. That skip convention is part of the
    /// caller-facing contract and is kept as-is. The final page may be
    /// shorter than `page_size`.
    pub fn read_page(&mut self, page_size: usize, page: usize) -> Result<Vec<Row>> {
        self.read_rows(None, page_size.saturating_mul(page), page_size)
    }

    /// Decodes one column across every row group, in write order.
    pub fn read_column(&mut self, name: &str) -> Result<Vec<Value>> {
        self.footer.schema.require(name)?;
        let mut out = Vec::with_capacity(self.total_rows);
        for index in 0..self.footer.row_groups.len() {
            out.extend(self.load_group(index)?.read_column(name)?);
        }
        Ok(out)
    }

    /// Folds a column through `f` one row group at a time; only a single
    /// group's decoded values are resident at any point.
    pub fn fold_column<A, F>(&mut self, name: &str, init: A, mut f: F) -> Result<A>
    where
        F: FnMut(A, &Value) -> A,
    {
        self.footer.schema.require(name)?;
        let mut acc = init;
        for index in 0..self.footer.row_groups.len() {
            let values = self.load_group(index)?.read_column(name)?;
            for value in &values {
                acc = f(acc, value);
            }
        }
        Ok(acc)
    }

    /// Sum of a numeric (f64, i64 or timestamp) column as f64.
    pub fn column_sum(&mut self, name: &str) -> Result<f64> {
        let index = self.footer.schema.require(name)?;
        let ty = self.footer.schema.columns()[index].ty;
        if ty.fixed_width().is_none() || ty == crate::ColumnType::Bool {
            return Err(ColfileError::SchemaMismatch(format!(
                "column `{name}` has type {ty}, expected a numeric column"
            )));
        }
        self.fold_column(name, 0.0, |acc, value| {
            acc + match value {
                Value::F64(v) => *v,
                Value::I64(v) | Value::Timestamp(v) => *v as f64,
                _ => 0.0,
            }
        })
    }

    /// Arithmetic mean of a numeric column; NaN for an empty file.
    pub fn column_mean(&mut self, name: &str) -> Result<f64> {
        let sum = self.column_sum(name)?;
        Ok(sum / self.total_rows as f64)
    }
}
