use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::core::error::{Context, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,         // SQLite file, ":memory:" for a private in-memory store
    pub id_store_path: PathBuf,         // Per-table ID counters (JSON)
    pub table_prefix: String,
    pub table_suffix: String,

    pub busy_timeout_ms: u64,
    pub wal_mode: bool,

    pub column_cache_size: usize,       // Tables whose live columns stay cached

    // Filter validation limits
    pub max_bool_clauses: usize,
    pub max_filter_depth: usize,

    pub log_filter: String,             // Used when RUST_LOG is unset
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("./data/navdb.sqlite"),
            id_store_path: PathBuf::from("./data/id_store.json"),
            table_prefix: String::new(),
            table_suffix: String::new(),

            busy_timeout_ms: 5_000,
            wal_mode: true,

            column_cache_size: 64,

            max_bool_clauses: 256,
            max_filter_depth: 8,

            log_filter: "info".to_string(),
            debug: false,
        }
    }
}

impl Config {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).context("read config")?;
        let config: Config = toml::from_str(&content).context("parse config")?;
        info!(path = %path.display(), table_prefix = %config.table_prefix, "loaded config");
        Ok(config)
    }

    /// Config rooted in `dir`, used for disposable stores.
    pub fn in_dir(dir: &Path) -> Self {
        Config {
            database_path: dir.join("navdb.sqlite"),
            id_store_path: dir.join("id_store.json"),
            ..Config::default()
        }
    }

    pub fn full_table_name(&self, table: &str) -> String {
        format!("{}{}{}", self.table_prefix, table, self.table_suffix)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.table_prefix, "");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table_prefix = \"cms_\"\nwal_mode = false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.table_prefix, "cms_");
        assert!(!config.wal_mode);
        assert_eq!(config.column_cache_size, 64);
        assert_eq!(config.full_table_name("nav"), "cms_nav");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table_prefix = [").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::Parse);
    }
}
