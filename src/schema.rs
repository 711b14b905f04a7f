use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{ColfileError, ColumnType, Encoding, Result};

/// One column of a schema: name, primitive type and block encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub encoding: Encoding,
}

impl ColumnDef {
    /// New column with the default encoding for its type (dictionary for
    /// strings, plain otherwise).
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            encoding: Encoding::default_for(ty),
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Ordered set of column definitions. Immutable once a writer is opened;
/// stored in the file footer so readers never need out-of-band knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Validates that the schema holds at least one column, that names are
    /// unique and that dictionary encoding is only requested for string
    /// columns.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ColfileError::SchemaMismatch(
                "schema must declare at least one column".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for def in &columns {
            if !seen.insert(def.name.as_str()) {
                return Err(ColfileError::SchemaMismatch(format!(
                    "duplicate column name `{}`",
                    def.name
                )));
            }
            if def.encoding == Encoding::Dict && def.ty != ColumnType::Utf8 {
                return Err(ColfileError::SchemaMismatch(format!(
                    "column `{}`: dictionary encoding requires utf8, got {}",
                    def.name, def.ty
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|def| def.name == name)
    }

    /// Index lookup that reports the known column names on failure.
    pub(crate) fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| ColfileError::ColumnNotFound {
                name: name.to_string(),
                available: self.columns.iter().map(|def| &def.name).join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_encodings() {
        let def = ColumnDef::new("name", ColumnType::Utf8);
        assert_eq!(def.encoding, Encoding::Dict);
        let def = ColumnDef::new("score", ColumnType::F64);
        assert_eq!(def.encoding, Encoding::Plain);
    }

    #[test]
    fn rejects_zero_columns() {
        // a writer over a columnless schema would buffer nothing and
        // silently drop every row
        let err = Schema::new(vec![]).unwrap_err();
        assert!(matches!(err, ColfileError::SchemaMismatch(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Schema::new(vec![
            ColumnDef::new("a", ColumnType::I64),
            ColumnDef::new("a", ColumnType::F64),
        ])
        .unwrap_err();
        assert!(matches!(err, ColfileError::SchemaMismatch(_)));
    }

    #[test]
    fn rejects_dict_on_numeric() {
        let err = Schema::new(vec![
            ColumnDef::new("a", ColumnType::I64).with_encoding(Encoding::Dict)
        ])
        .unwrap_err();
        assert!(matches!(err, ColfileError::SchemaMismatch(_)));
    }

    #[test]
    fn unknown_column_lists_known_names() {
        let schema = Schema::new(vec![
            ColumnDef::new("a", ColumnType::I64),
            ColumnDef::new("b", ColumnType::F64),
        ])
        .unwrap();
        let err = schema.require("c").unwrap_err();
        assert_eq!(
            err.to_string(),
            "column `c` not found, file has columns [a, b]"
        );
    }
}
