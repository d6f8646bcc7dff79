//! Domain error types.

/// Top-level error type for flowband.
#[derive(Debug, thiserror::Error)]
pub enum FlowbandError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to read snapshot {source_name}: {reason}")]
    SnapshotRead { source_name: String, reason: String },

    #[error("failed to parse snapshot {source_name}: {reason}")]
    SnapshotParse { source_name: String, reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("storage query error: {reason}")]
    StorageQuery { reason: String },

    #[error("no snapshot data for {trade_date}")]
    NoData { trade_date: String },

    #[error("no usable quotes: {total} rows, all skipped")]
    EmptyUniverse { total: usize },

    #[error("failed to write report {path}: {reason}")]
    ReportWrite { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FlowbandError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            FlowbandError::Io(_) | FlowbandError::ReportWrite { .. } => 1,
            FlowbandError::ConfigParse { .. }
            | FlowbandError::ConfigMissing { .. }
            | FlowbandError::ConfigInvalid { .. } => 2,
            FlowbandError::Storage { .. } | FlowbandError::StorageQuery { .. } => 3,
            FlowbandError::SnapshotRead { .. } | FlowbandError::SnapshotParse { .. } => 4,
            FlowbandError::NoData { .. } | FlowbandError::EmptyUniverse { .. } => 5,
        }
    }
}

impl From<&FlowbandError> for std::process::ExitCode {
    fn from(err: &FlowbandError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
