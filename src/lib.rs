//! Single-file columnar storage container.
//!
//! A `colfile` container holds one schema's worth of typed rows, batched
//! into row groups. Each row group stores its columns as independent
//! compressed blocks, so readers can
//!
//! - scan everything ([`FileReader::read_all`]),
//! - read one page of rows, skipping whole row groups without decoding them
//!   ([`FileReader::read_page`]),
//! - project a single column ([`FileReader::read_column`]),
//! - stream-aggregate a column one row group at a time
//!   ([`FileReader::fold_column`]).
//!
//! Files are write-once: [`FileWriter`] streams rows to disk and seals the
//! file with a trailing footer on [`FileWriter::finish`]. A file without a
//! footer is invalid and never yields partial data.
//!
//! ```no_run
//! use colfile::{ColumnDef, ColumnType, FileReader, FileWriter, Row, Schema};
//!
//! # fn main() -> colfile::Result<()> {
//! let schema = Schema::new(vec![
//!     ColumnDef::new("name", ColumnType::Utf8),
//!     ColumnDef::new("score", ColumnType::F64),
//! ])?;
//! let mut writer = FileWriter::create("users.colfile", schema, 1000)?;
//! writer.write_row(&Row::new().with("name", "ada").with("score", 1.0))?;
//! writer.finish()?;
//!
//! let mut reader = FileReader::open("users.colfile")?;
//! let mean = reader.column_mean("score")?;
//! # Ok(())
//! # }
//! ```

mod column;
mod compress;
mod err;
mod file;
mod row;
mod rowgroup;
mod schema;
mod strategy;
mod value;

pub use compress::CompressConfig;
pub use err::{ColfileError, Result};
pub use file::{FileReader, FileWriter};
pub use row::Row;
pub use rowgroup::{RowGroupReader, RowGroupWriter};
pub use schema::{ColumnDef, Schema};
pub use strategy::Encoding;
pub use value::{ColumnType, Value};
