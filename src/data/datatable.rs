use crate::error::{FunifierError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Represents the data type of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Json,
    Null,
    Mixed, // For columns with mixed types
}

impl DataType {
    /// Merge two types (for columns with mixed types)
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return self.clone();
        }

        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => t.clone(),
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub null_count: usize,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Null,
            nullable: true,
            null_count: 0,
        }
    }

}

/// A single cell value in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Nested object or array, kept as decoded
    Json(JsonValue),
    Null,
}

impl DataValue {
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => DataValue::Null,
            JsonValue::Bool(b) => DataValue::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => DataValue::Integer(i),
                None => n
                    .as_f64()
                    .map(DataValue::Float)
                    .unwrap_or_else(|| DataValue::String(n.to_string())),
            },
            JsonValue::String(s) => DataValue::String(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => DataValue::Json(value.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Integer(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            DataValue::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Json(_) => DataType::Json,
            DataValue::Null => DataType::Null,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Json(v) => write!(f, "{}", v),
            DataValue::Null => write!(f, ""),
        }
    }
}

/// A row of data in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows returned by one query; the column set follows the upstream payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<DataRow>,
}

impl ResultTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build a table from row objects.
    ///
    /// Columns are the union of all keys in first-seen order; a key missing
    /// from a row becomes `Null` in that row.
    pub fn from_json_rows(rows: &[Map<String, JsonValue>], name: impl Into<String>) -> Result<Self> {
        let mut table = ResultTable::new(name);

        let mut column_names: Vec<&str> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !column_names.contains(&key.as_str()) {
                    column_names.push(key);
                }
            }
        }
        for name in &column_names {
            table.add_column(DataColumn::new(*name));
        }

        for row in rows {
            let values = column_names
                .iter()
                .map(|name| row.get(*name).map_or(DataValue::Null, DataValue::from_json))
                .collect();
            table.add_row(DataRow::new(values))?;
        }

        table.infer_column_types();
        Ok(table)
    }

    pub fn add_column(&mut self, column: DataColumn) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn add_row(&mut self, row: DataRow) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(FunifierError::decode(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn get_column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get column names as a vector
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Infer and update column types based on data
    pub fn infer_column_types(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            let mut inferred_type = DataType::Null;
            let mut null_count = 0;

            for row in &self.rows {
                if let Some(value) = row.get(col_idx) {
                    if value.is_null() {
                        null_count += 1;
                    } else {
                        inferred_type = inferred_type.merge(&value.data_type());
                    }
                }
            }

            column.data_type = inferred_type;
            column.null_count = null_count;
            column.nullable = null_count > 0;
        }
    }

    /// Get a value at specific row and column
    pub fn get_value(&self, row: usize, col: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(col)
    }

    /// Get a value by row index and column name
    pub fn get_value_by_name(&self, row: usize, col_name: &str) -> Option<&DataValue> {
        let col_idx = self.get_column_index(col_name)?;
        self.get_value(row, col_idx)
    }

    /// All values of one column, top to bottom
    pub fn column_values(&self, col_name: &str) -> Option<Vec<&DataValue>> {
        let col_idx = self.get_column_index(col_name)?;
        Some(self.rows.iter().filter_map(|r| r.get(col_idx)).collect())
    }

}
