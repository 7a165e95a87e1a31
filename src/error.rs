// Error taxonomy for the dashboard.
//
// Schema errors reject a whole upload. Zero denominators and empty
// selections are not errors at all; they surface as values (`NaN`,
// `Classification::Undefined`, empty tables).
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("{0} column contains values of the wrong type")]
    InvalidType(String),

    #[error("Invalid month name in data: {0:?}")]
    InvalidMonth(String),

    #[error("{0} column must not contain negative values")]
    NegativeValue(String),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file format: {0} (expected .csv)")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rejected upload: {0}")]
    Schema(#[from] SchemaError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown schema kind {0:?} (expected \"solo\" or \"firm\")")]
    UnknownSchema(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
