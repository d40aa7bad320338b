use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DATA_DIR_ENV: &str = "CLUBHOUSE_DIR";

/// Monthly dues per non-guest player.
pub const MONTHLY_FEE: f64 = 28.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClubConfig {
    pub monthly_fee: f64,
    /// Name stamped into `updated_by` on every write.
    pub editor: String,
    /// Length of the top scorer / most games lists.
    pub top_n: usize,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            monthly_fee: MONTHLY_FEE,
            editor: "President".to_string(),
            top_n: 5,
        }
    }
}

impl ClubConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        let config: ClubConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `config.json` from `dir`, falling back to defaults when absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.monthly_fee.is_finite() || self.monthly_fee < 0.0 {
            return Err(anyhow!("monthly_fee must be a non-negative number"));
        }
        if self.editor.trim().is_empty() {
            return Err(anyhow!("editor must not be empty"));
        }
        Ok(())
    }
}

/// Data directory: explicit value, then `$CLUBHOUSE_DIR`, then `~/.clubhouse`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(".clubhouse"))
}
