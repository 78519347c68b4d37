use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Outbound mail submission settings. The password is the relay app
/// password for the shared sender identity; leave it empty to disable
/// notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub relay: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            relay: "smtp.gmail.com".to_string(),
            port: 587,
            sender: "formularios@plantaeagrocredito.com.br".to_string(),
            password: String::new(),
        }
    }
}

/// Platform configuration, one YAML file per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding one JSON file per contract
    pub data_dir: PathBuf,
    /// Consolidated responses spreadsheet
    pub spreadsheet_path: PathBuf,
    /// Address the HTTP surface binds to
    pub bind_addr: String,
    /// Base URL embedded in notification links
    pub form_link_base: String,
    pub smtp: SmtpConfig,
    /// Username to password table for the session gate
    pub users: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dados"),
            spreadsheet_path: PathBuf::from("respostas_preenchidas.xlsx"),
            bind_addr: "127.0.0.1:5000".to_string(),
            form_link_base: "https://riscos.plantaeagrocredito.com.br/formulario".to_string(),
            smtp: SmtpConfig::default(),
            users: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the provided path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the configuration, falling back to defaults when the file
    /// does not exist yet.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration to the specified path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Creates a default config file if it doesn't exist.
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Self::default().save(path)
    }
}

/// Gets the path to the config file: the `GR10_CONFIG_PATH` environment
/// variable when set, otherwise `~/.gr10.config`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("GR10_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".gr10.config"))
}
