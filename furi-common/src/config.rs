//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "FURI_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "furi.db";

/// Dictionary location inside the root folder when none is configured
pub const DICTIONARY_DIR: &str = "dictionary";

/// TOML configuration file contents
///
/// Every section is optional; missing keys fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuriConfig {
    /// Root folder holding the database
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub llm: LlmSettings,
    pub pipeline: PipelineSettings,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Which chat API the reading generator talks to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Anthropic,
}

/// `[llm]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    /// Model name; provider default when unset
    pub model: Option<String>,
    /// API base URL; provider default when unset
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Answer from the built-in mock table instead of the network
    pub mock: bool,
    /// Request timeout. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: None,
            base_url: None,
            api_key: None,
            mock: false,
            request_timeout_secs: None,
        }
    }
}

/// When the morphology layer runs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MorphologyTrigger {
    /// Only when the exact-match layer recorded nothing
    NoCandidates,
    /// Whenever recorded ranges leave any gap in the text
    #[default]
    CoverageGap,
}

/// Feature layout of the morphological dictionary
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryFormat {
    /// IPADIC and derivatives (reading is feature column 7)
    #[default]
    Ipadic,
    /// UniDic (reading is feature column 6)
    Unidic,
}

/// `[pipeline]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    pub morphology_trigger: MorphologyTrigger,
    /// Compiled `system.dic` file or MeCab source directory
    /// (`lex.csv`, `matrix.def`, `char.def`, `unk.def`)
    pub dictionary_path: Option<PathBuf>,
    pub dictionary_format: DictionaryFormat,
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<FuriConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load configuration from the platform config file
///
/// Returns defaults when no config file exists. A file that exists but fails to
/// parse is an error.
pub fn load_config() -> Result<FuriConfig> {
    match config_file_path() {
        Ok(path) => load_config_from(&path),
        Err(_) => Ok(FuriConfig::default()),
    }
}

/// Load configuration from an explicit path
pub fn load_config_from(path: &Path) -> Result<FuriConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_config(&content)
}

/// Write configuration to `path`, creating parent directories
pub fn write_config(config: &FuriConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    // Write to a sibling temp file and rename over the target
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Root folder resolution priority:
/// 1. Command-line argument
/// 2. `FURI_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &FuriConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Dictionary path: `pipeline.dictionary_path`, else `<root>/dictionary`
pub fn dictionary_path(root_folder: &Path, config: &FuriConfig) -> PathBuf {
    config
        .pipeline
        .dictionary_path
        .clone()
        .unwrap_or_else(|| root_folder.join(DICTIONARY_DIR))
}

/// Default configuration file path for the platform
pub fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/furi/config.toml first, then /etc/furi/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("furi").join("config.toml"));
        let system_config = PathBuf::from("/etc/furi/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("furi").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Path where user-level configuration is written
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("furi").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("furi.toml"))
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("furi"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/furi"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("furi"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/furi"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("furi"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\furi"))
    } else {
        PathBuf::from("./furi_data")
    }
}
