//! Table view.
//!
//! Two accepted input shapes, normalized to the dense form:
//! - dense:  { "columns": ["a", "b"], "rows": [[1, 2], [3, 4]] }
//! - matrix: { "matrix": { "values": [[1, 2]], "row_labels": [...], "col_labels": [...] } }
//!
//! Matrix payloads without column labels get `c1..cN` defaults; row labels,
//! when present, become a leading "row" column.

use crate::view::ViewError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    rows: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    matrix: Option<RawMatrix>,
}

#[derive(Debug, Deserialize)]
struct RawMatrix {
    values: Vec<Vec<Value>>,
    #[serde(default)]
    row_labels: Option<Vec<String>>,
    #[serde(default)]
    col_labels: Option<Vec<String>>,
}

impl Table {
    pub fn validate(raw: &str) -> Result<Table, ViewError> {
        let parsed: RawTable = serde_json::from_str(raw)?;

        if let Some(matrix) = parsed.matrix {
            return Self::from_matrix(matrix);
        }

        match (parsed.columns, parsed.rows) {
            (Some(columns), Some(rows)) => {
                if columns.is_empty() {
                    return Err(ViewError::Table("columns must be non-empty".to_string()));
                }
                for (i, row) in rows.iter().enumerate() {
                    if row.len() != columns.len() {
                        return Err(ViewError::Table(format!(
                            "row {} has {} cells, expected {}",
                            i,
                            row.len(),
                            columns.len()
                        )));
                    }
                }
                Ok(Table { columns, rows })
            }
            _ => Err(ViewError::Table(
                "needs either columns+rows or matrix".to_string(),
            )),
        }
    }

    fn from_matrix(matrix: RawMatrix) -> Result<Table, ViewError> {
        if matrix.values.is_empty() {
            return Err(ViewError::Table("matrix values must be non-empty".to_string()));
        }
        let width = matrix.values[0].len();
        if width == 0 {
            return Err(ViewError::Table("matrix rows must be non-empty".to_string()));
        }
        for (i, row) in matrix.values.iter().enumerate() {
            if row.len() != width {
                return Err(ViewError::Table(format!(
                    "matrix row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
        }

        let mut columns = match matrix.col_labels {
            Some(labels) => {
                if labels.len() != width {
                    return Err(ViewError::Table(format!(
                        "{} col_labels for width {}",
                        labels.len(),
                        width
                    )));
                }
                labels
            }
            None => (1..=width).map(|i| format!("c{}", i)).collect(),
        };

        let mut rows = matrix.values;
        if let Some(labels) = matrix.row_labels {
            if labels.len() != rows.len() {
                return Err(ViewError::Table(format!(
                    "{} row_labels for {} rows",
                    labels.len(),
                    rows.len()
                )));
            }
            columns.insert(0, "row".to_string());
            for (row, label) in rows.iter_mut().zip(labels) {
                row.insert(0, Value::String(label));
            }
        }

        Ok(Table { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn matrix_gets_default_column_labels() {
        let table = Table::validate(r#"{"matrix":{"values":[[1,2],[3,4]]}}"#).unwrap();
        assert_eq!(table.columns, vec!["c1", "c2"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn matrix_row_labels_become_leading_column() {
        let table = Table::validate(
            r#"{"matrix":{"values":[[1],[2]],"row_labels":["a","b"],"col_labels":["v"]}}"#,
        )
        .unwrap();
        assert_eq!(table.columns, vec!["row", "v"]);
        assert_eq!(table.rows[0], vec![json!("a"), json!(1)]);
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(Table::validate(r#"{"columns":["a","b"],"rows":[[1]]}"#).is_err());
        assert!(Table::validate(r#"{"matrix":{"values":[[1,2],[3]]}}"#).is_err());
    }
}
