use crate::error::{FriError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding `aql_general.csv` / `aql_special.csv`
pub const AQL_DIR_ENV: &str = "FRI_VERDICT_AQL_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AQL table for the general levels (I, II, III)
    pub aql_general: Option<PathBuf>,
    /// AQL table for the special levels (S1 to S4)
    pub aql_special: Option<PathBuf>,
    /// Non-conformity rule table (CSV/XLSX)
    pub nc_rules: Option<PathBuf>,
    /// Extra remark rules (JSON)
    pub catalog: Option<PathBuf>,
    /// Worker threads for folder evaluation, 0 = one per core
    pub jobs: usize,
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aql_general: None,
            aql_special: None,
            nc_rules: None,
            catalog: None,
            jobs: 0,
            pretty: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FriError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("fri-verdict").join("config.json"))
    }

    /// AQL tables from the config, or else from `FRI_VERDICT_AQL_DIR`
    pub fn aql_tables(&self) -> (Option<PathBuf>, Option<PathBuf>) {
        let from_env = std::env::var_os(AQL_DIR_ENV).map(PathBuf::from);
        self.aql_tables_with(from_env.as_deref())
    }

    fn aql_tables_with(&self, aql_dir: Option<&Path>) -> (Option<PathBuf>, Option<PathBuf>) {
        let in_dir = |name: &str| {
            aql_dir
                .map(|dir| dir.join(name))
                .filter(|path| path.is_file())
        };

        (
            self.aql_general.clone().or_else(|| in_dir("aql_general.csv")),
            self.aql_special.clone().or_else(|| in_dir("aql_special.csv")),
        )
    }
}
