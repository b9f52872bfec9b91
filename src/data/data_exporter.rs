use crate::data::datatable::ResultTable;
use crate::error::{FunifierError, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles exporting result tables to CSV
pub struct DataExporter;

impl DataExporter {
    /// Write the table as CSV: header row from the column names, then one
    /// line per row. Returns the number of data rows written.
    pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<usize> {
        if table.column_count() == 0 {
            return Err(FunifierError::Export("No data to export".to_string()));
        }

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(table.columns.iter().map(|c| c.name.as_str()))?;

        for row in &table.rows {
            wtr.write_record(row.values.iter().map(|v| v.to_string()))?;
        }

        wtr.flush()?;
        Ok(table.row_count())
    }

    /// CSV document as UTF-8 bytes
    pub fn to_csv_bytes(table: &ResultTable) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        Self::write_csv(table, &mut buffer)?;
        Ok(buffer)
    }

    /// Export the table to `path`, returning a status message
    pub fn export_to_csv(table: &ResultTable, path: &Path) -> Result<String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let row_count = Self::write_csv(table, file)?;
        info!("Exported {} rows to {}", row_count, path.display());

        Ok(format!("Exported {} rows to {}", row_count, path.display()))
    }

    /// `{lottery_uid}.csv`, with path separators and other unsafe characters
    /// replaced so the UID cannot point outside the output directory
    pub fn export_filename(lottery_uid: &str) -> String {
        let stem: String = lottery_uid
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_start_matches('.');
        if stem.is_empty() {
            "export.csv".to_string()
        } else {
            format!("{}.csv", stem)
        }
    }

    /// Resolve the output path: an explicit path wins, otherwise
    /// `{lottery_uid}.csv` inside `output_dir` (or the current directory)
    pub fn output_path(
        explicit: Option<&Path>,
        output_dir: Option<&Path>,
        lottery_uid: &str,
    ) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let filename = Self::export_filename(lottery_uid);
                match output_dir {
                    Some(dir) => dir.join(filename),
                    None => PathBuf::from(filename),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::ResultTable;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn winners() -> ResultTable {
        let rows: Vec<Map<String, Value>> = json!([
            {"player": "p1", "lotteryUID": "L1", "street": "Main St, 4", "zip": 5000, "tos_accepted": true},
            {"player": "p2", "lotteryUID": "L1", "street": null, "zip": 8000, "tos_accepted": false}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect();
        ResultTable::from_json_rows(&rows, "winners").unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let bytes = DataExporter::to_csv_bytes(&winners()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "player,lotteryUID,street,zip,tos_accepted");
        assert_eq!(lines[1], "p1,L1,\"Main St, 4\",5000,true");
        assert_eq!(lines[2], "p2,L1,,8000,false");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_table_has_nothing_to_export() {
        let table = ResultTable::new("empty");
        assert!(matches!(
            DataExporter::to_csv_bytes(&table),
            Err(FunifierError::Export(_))
        ));
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = DataExporter::output_path(None, Some(dir.path()), "L1");
        assert_eq!(path, dir.path().join("L1.csv"));

        let message = DataExporter::export_to_csv(&winners(), &path).unwrap();
        assert!(message.contains("Exported 2 rows"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][2], "Main St, 4");
    }

    #[test]
    fn test_export_filename_is_sanitised() {
        assert_eq!(DataExporter::export_filename("6553a1b2c3"), "6553a1b2c3.csv");
        assert_eq!(DataExporter::export_filename("../etc/passwd"), "_etc_passwd.csv");
        assert_eq!(DataExporter::export_filename("  "), "export.csv");
    }

    #[test]
    fn test_explicit_output_path_wins() {
        let explicit = PathBuf::from("/tmp/out.csv");
        assert_eq!(
            DataExporter::output_path(Some(&explicit), Some(Path::new("/data")), "L1"),
            explicit
        );
    }
}
