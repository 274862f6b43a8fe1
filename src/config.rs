use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up next to the executable when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "appsettings.json";

pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Migration settings loaded from `appsettings.json`.
///
/// JSON keys are matched case-insensitively (`SourcePath`, `sourcepath` and
/// `SOURCEPATH` are the same field). Missing strings default to empty.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Root holding one home directory per legacy account
    #[serde(rename = "sourcepath")]
    pub source_path: PathBuf,

    /// Root holding the optional `<account>.V2` profile directories
    #[serde(rename = "rprofilespath")]
    pub profiles_path: PathBuf,

    #[serde(rename = "destinationpath")]
    pub destination_path: PathBuf,

    /// CSV mapping `email,legacy-account-id`
    #[serde(rename = "csvfilepath")]
    pub csv_file_path: PathBuf,

    /// Name of the home subfolder created under each destination user folder
    #[serde(rename = "userhomefoldername")]
    pub user_home_folder_name: String,

    #[serde(rename = "maxretries")]
    pub max_retries: i32,

    /// Literal substring that truncates a legacy account id
    #[serde(rename = "trimtoken")]
    pub trim_token: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_path: PathBuf::new(),
            profiles_path: PathBuf::new(),
            destination_path: PathBuf::new(),
            csv_file_path: PathBuf::new(),
            user_home_folder_name: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            trim_token: String::new(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).context("Settings are not valid JSON")?;

        let serde_json::Value::Object(fields) = value else {
            anyhow::bail!("Settings must be a JSON object");
        };

        // Fold keys so serde sees one canonical spelling
        let folded: serde_json::Map<String, serde_json::Value> = fields
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();

        let settings = serde_json::from_value(serde_json::Value::Object(folded))
            .context("Settings contain a field of the wrong type")?;
        Ok(settings)
    }
}

/// `appsettings.json` in the directory holding the running executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to determine executable path")?;
    let base = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Executable path {} has no parent", exe.display()))?;
    Ok(base.join(CONFIG_FILE_NAME))
}
