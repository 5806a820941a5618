//! Error types for the seeding library.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration errors (bad YAML, missing settings).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when the CSV source directory does not exist.
pub const EXIT_SOURCE_DIR_MISSING: u8 = 2;
/// Exit code for connection or statement failures on the database.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Exit code for unreadable CSV data or rows with bad identifiers.
pub const EXIT_DATA_ERROR: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code for result serialization errors.
pub const EXIT_SERIALIZE_ERROR: u8 = 8;

/// Main error type for seeding operations.
#[derive(Error, Debug)]
pub enum SeedError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV directory is configured but absent.
    #[error("CSV source directory not found: {}", .0.display())]
    SourceDirMissing(PathBuf),

    /// Target database connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// CSV file could not be read or decoded.
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A row carries an identifier or foreign key that is not an integer.
    #[error("Invalid row in {file} at line {line}: {message}")]
    InvalidRow {
        file: String,
        line: u64,
        message: String,
    },

    /// A failure inside a named stage of the run.
    #[error("Stage '{stage}' failed")]
    Stage {
        stage: String,
        #[source]
        source: Box<SeedError>,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SeedError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        SeedError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Csv error for the named file.
    pub fn csv(file: impl Into<String>, source: csv::Error) -> Self {
        SeedError::Csv {
            file: file.into(),
            source,
        }
    }

    /// Create an InvalidRow error.
    pub fn invalid_row(file: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
        SeedError::InvalidRow {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Wrap an error with the name of the stage it happened in.
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        SeedError::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SeedError::Config(_) | SeedError::Yaml(_) => EXIT_CONFIG_ERROR,
            SeedError::SourceDirMissing(_) => EXIT_SOURCE_DIR_MISSING,
            SeedError::Target(_) | SeedError::Pool { .. } => EXIT_TARGET_ERROR,
            SeedError::Csv { .. } | SeedError::InvalidRow { .. } => EXIT_DATA_ERROR,
            SeedError::Stage { source, .. } => source.exit_code(),
            SeedError::Io(_) => EXIT_IO_ERROR,
            SeedError::Json(_) => EXIT_SERIALIZE_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for seeding operations.
pub type Result<T> = std::result::Result<T, SeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_reports_inner_exit_code() {
        let err = SeedError::invalid_row("consultation.csv", 4, "id 'x' is not an integer")
            .in_stage("consultation");
        assert_eq!(err.exit_code(), EXIT_DATA_ERROR);

        let err = SeedError::SourceDirMissing(PathBuf::from("/nope")).in_stage("preflight");
        assert_eq!(err.exit_code(), EXIT_SOURCE_DIR_MISSING);
    }

    #[test]
    fn test_format_detailed_includes_cause_chain() {
        let err = SeedError::invalid_row("training.csv", 7, "client_id '' is not an integer")
            .in_stage("training");
        let text = err.format_detailed();
        assert!(text.starts_with("Error: Stage 'training' failed"));
        assert!(text.contains("Caused by:"));
        assert!(text.contains("training.csv at line 7"));
    }

    #[test]
    fn test_config_and_yaml_share_exit_code() {
        assert_eq!(SeedError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        let yaml_err = serde_yaml::from_str::<u32>("[").unwrap_err();
        assert_eq!(SeedError::from(yaml_err).exit_code(), EXIT_CONFIG_ERROR);
    }
}
