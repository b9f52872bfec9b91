//! Interpretation of Funifier response bodies.
//!
//! A body is first read as a table: either an array of row objects or an
//! object of columns (`{"col": {"0": v}}` / `{"col": [v]}`). When it is not a
//! table it is read as an error envelope `{errorCode, errorMessage}`. A table
//! is returned whole or not at all.

use crate::data::datatable::ResultTable;
use crate::error::{FunifierError, Result, SUCCESS_CODE};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    error_code: Option<i64>,
    error_message: Option<String>,
}

/// Decode a response body into a table, or into the upstream error it carries
pub fn decode_table(body: &str, name: &str) -> Result<ResultTable> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FunifierError::decode(format!("response is not valid JSON: {}", e)))?;

    if let Some(rows) = table_rows(&value) {
        let table = ResultTable::from_json_rows(&rows, name)?;
        debug!(
            target: "decoder",
            "Decoded {} rows x {} columns for {}",
            table.row_count(),
            table.column_count(),
            name
        );
        return Ok(table);
    }

    debug!(target: "decoder", "Body of {} is not a table, reading error envelope", name);
    match serde_json::from_value::<ErrorEnvelope>(value) {
        Ok(ErrorEnvelope {
            error_code: Some(code),
            error_message,
        }) if code != SUCCESS_CODE => {
            let message = error_message.unwrap_or_else(|| "no error message".to_string());
            warn!(target: "decoder", "Funifier returned error {}: {}", code, message);
            Err(FunifierError::Api { code, message })
        }
        _ => Err(FunifierError::decode(
            "response is neither a table nor an error envelope",
        )),
    }
}

/// Value of the `count` column of the first row; an empty table counts as zero
pub fn extract_count(table: &ResultTable) -> Result<i64> {
    if table.is_empty() {
        return Ok(0);
    }

    let value = table
        .get_value_by_name(0, "count")
        .ok_or_else(|| FunifierError::decode("count column missing from response"))?;
    value
        .as_i64()
        .ok_or_else(|| FunifierError::decode(format!("count '{}' is not an integer", value)))
}

fn table_rows(value: &Value) -> Option<Vec<Map<String, Value>>> {
    match value {
        Value::Array(items) => items.iter().map(|item| item.as_object().cloned()).collect(),
        Value::Object(columns) => columns_to_rows(columns),
        _ => None,
    }
}

/// Turn an object-of-columns into rows, ordered by row index
fn columns_to_rows(columns: &Map<String, Value>) -> Option<Vec<Map<String, Value>>> {
    if columns.is_empty()
        || !columns
            .values()
            .all(|column| column.is_object() || column.is_array())
    {
        return None;
    }

    let mut index: Vec<String> = Vec::new();
    for column in columns.values() {
        match column {
            Value::Object(cells) => {
                for key in cells.keys() {
                    if !index.contains(key) {
                        index.push(key.clone());
                    }
                }
            }
            Value::Array(cells) => {
                for i in 0..cells.len() {
                    let key = i.to_string();
                    if !index.contains(&key) {
                        index.push(key);
                    }
                }
            }
            _ => return None,
        }
    }
    index.sort_by(|a, b| compare_index(a, b));

    let rows = index
        .iter()
        .map(|key| {
            columns
                .iter()
                .map(|(name, column)| {
                    let cell = match column {
                        Value::Object(cells) => cells.get(key),
                        Value::Array(cells) => key.parse::<usize>().ok().and_then(|i| cells.get(i)),
                        _ => None,
                    };
                    (name.clone(), cell.cloned().unwrap_or(Value::Null))
                })
                .collect()
        })
        .collect();
    Some(rows)
}

fn compare_index(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
