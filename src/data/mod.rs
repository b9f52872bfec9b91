//! Result tables and their export

pub mod data_exporter;
pub mod datatable;

pub use data_exporter::DataExporter;
pub use datatable::{DataColumn, DataRow, DataType, DataValue, ResultTable};
