//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod json_report_adapter;
pub mod json_snapshot_adapter;
pub mod quote_record;
pub mod snapshot_file;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
