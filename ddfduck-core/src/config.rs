//! Configuration system for ddfduck.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment. CLI flags are
//! applied on top by the binary.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upstream repository of the Gapminder Systema Globalis dataset.
pub const DEFAULT_REPO_URL: &str =
    "https://github.com/open-numbers/ddf--gapminder--systema_globalis.git";

/// Top-level configuration for a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the DDF dataset lives and how its files are recognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local checkout of the dataset repository.
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,
    /// Git URL cloned when `repo_path` does not exist.
    #[serde(default = "default_repo_url")]
    pub repo_url: String,
    /// Clone or pull the repository before converting.
    #[serde(default = "default_true")]
    pub fetch: bool,
    /// File name of the concept dictionary at the repository root.
    #[serde(default = "default_concepts_file")]
    pub concepts_file: String,
    /// Filename substrings marking translated (non-primary-language) files.
    #[serde(default = "default_excluded_markers")]
    pub excluded_markers: Vec<String>,
    /// Extension of tabular files, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            repo_url: default_repo_url(),
            fetch: true,
            concepts_file: default_concepts_file(),
            excluded_markers: default_excluded_markers(),
            extension: default_extension(),
        }
    }
}

impl SourceConfig {
    /// Full path of the concept dictionary.
    pub fn concepts_path(&self) -> PathBuf {
        self.repo_path.join(&self.concepts_file)
    }
}

fn default_repo_path() -> PathBuf {
    PathBuf::from("./ddf--gapminder--systema_globalis")
}

fn default_repo_url() -> String {
    DEFAULT_REPO_URL.to_string()
}

fn default_concepts_file() -> String {
    "ddf--concepts.csv".to_string()
}

fn default_excluded_markers() -> Vec<String> {
    ["--zh", "--es", "--fr", "--ar", "--ru"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_true() -> bool {
    true
}

/// Output database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// DuckDB worker threads (`SET threads`).
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// DuckDB `enable_object_cache` setting.
    #[serde(default = "default_true")]
    pub enable_object_cache: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            threads: default_threads(),
            enable_object_cache: true,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("gapminder.duckdb")
}

fn default_threads() -> usize {
    4
}

/// Table import settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Rows sampled for type inference when a table comes from one file.
    #[serde(default = "default_single_sample")]
    pub single_file_sample_size: usize,
    /// Rows sampled per file when several files are unioned.
    #[serde(default = "default_union_sample")]
    pub union_sample_size: usize,
    /// Column names that get a secondary index when present.
    #[serde(default = "default_index_candidates")]
    pub index_candidates: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            single_file_sample_size: default_single_sample(),
            union_sample_size: default_union_sample(),
            index_candidates: default_index_candidates(),
        }
    }
}

fn default_single_sample() -> usize {
    1000
}

fn default_union_sample() -> usize {
    500
}

fn default_index_candidates() -> Vec<String> {
    ["geo", "country", "time", "year", "region"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Logging settings consumed by the binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Optional JSON log file written alongside the stderr stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ConvertConfig {
    /// Render the configuration as TOML, e.g. for `ddfduck config show`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "ddfduck", "ddfduck")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `DDFDUCK_`, nested with `__`)
/// 2. Explicit config file (`--config`)
/// 3. Workspace-local config (`.ddfduck/config.toml`)
/// 4. User config (`~/.config/ddfduck/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<ConvertConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ConvertConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".ddfduck").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Box::new(figment::Error::from(format!(
                "configuration file not found: {}",
                path.display()
            ))));
        }
        figment = figment.merge(Toml::file(path));
    }

    // DDFDUCK_DATABASE__OUTPUT_PATH, DDFDUCK_SOURCE__FETCH, etc.
    figment = figment.merge(Env::prefixed("DDFDUCK_").split("__"));

    figment.extract().map_err(Box::new)
}
