use thiserror::Error;

pub type Result<T> = std::result::Result<T, ColfileError>;

#[derive(Error, Debug)]
pub enum ColfileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] postcard::Error),
    #[error("row does not match schema: {0}")]
    SchemaMismatch(String),
    #[error("`{0}` during column encoding")]
    Encoding(String),
    #[error("corrupt data: {0}")]
    CorruptData(String),
    #[error("column `{name}` not found, file has columns [{available}]")]
    ColumnNotFound { name: String, available: String },
    #[error("row {start} is out of range, file holds {total} rows")]
    OutOfRange { start: usize, total: usize },
}
