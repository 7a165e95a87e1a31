use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::SchemaKind;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SALES_DASHBOARD_CONFIG";
pub const CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub path: String,
    pub schema: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: String,
    pub export_file: String,
    pub summary_file: String,
    pub preview_rows: usize,
    #[serde(default = "default_top_months")]
    pub top_months: usize,
}

fn default_top_months() -> usize {
    3
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[data]
path = "data/solo_sales.csv"
schema = "solo"

[output]
dir = "."
export_file = "filtered_sales.csv"
summary_file = "summary.json"
preview_rows = 5
top_months = 3
"#;

impl Config {
    pub fn schema_kind(&self) -> Result<SchemaKind, ConfigError> {
        self.data.schema.parse()
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data.path)
    }

    pub fn export_path(&self) -> PathBuf {
        Path::new(&self.output.dir).join(&self.output.export_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        Path::new(&self.output.dir).join(&self.output.summary_file)
    }
}

pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(contents)?;
    // Reject an unknown schema up front rather than at first load.
    config.schema_kind()?;
    Ok(config)
}

/// Load configuration.
///
/// Search order:
/// 1. The file named by `SALES_DASHBOARD_CONFIG`
/// 2. `dashboard.toml` in the working directory
/// 3. The embedded default
pub fn load_config() -> Result<Config, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        tracing::info!("Loading config from: {}", path);
        return load_config_from(Path::new(&path));
    }
    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        tracing::info!("Loading config from: {}", local.display());
        return load_config_from(local);
    }
    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
