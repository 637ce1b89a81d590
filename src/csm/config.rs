use crate::cipher::KdfParams;
use crate::codec::Separators;
use crate::error::{CsmError, Result};
use crate::locator::{LocatorDefaults, SourceLocator};
use crate::search::SearchType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_TYPE: &str = "file";
const DEFAULT_NAME: &str = "accounts";
const DEFAULT_FORMAT: &str = "ct";

/// Configuration for csm, stored in config.json in the configuration
/// directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsmConfig {
    /// Medium used when a locator has no `type://` prefix
    #[serde(default = "default_type")]
    pub default_type: String,

    /// Source name used when none is given
    #[serde(default = "default_name")]
    pub default_name: String,

    /// Format used when a locator has no extension
    #[serde(default = "default_format")]
    pub default_format: String,

    #[serde(default)]
    pub search_type: SearchType,

    /// Recover what can be read from damaged sources instead of failing
    #[serde(default)]
    pub brute_force: bool,

    #[serde(default = "default_record_separator")]
    pub record_separator: String,

    #[serde(default = "default_field_separator")]
    pub field_separator: String,

    /// Sources opened at start-up; the last one becomes the default
    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    /// Key id used to encrypt new sources
    #[serde(default)]
    pub user_key: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Record shapes by name, e.g. `User*,Password*,Host` (`*` = essential)
    #[serde(default = "default_templates")]
    pub account_templates: BTreeMap<String, String>,

    #[serde(default)]
    pub kdf: KdfParams,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_record_separator() -> String {
    Separators::default().record
}

fn default_field_separator() -> String {
    Separators::default().field
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_templates() -> BTreeMap<String, String> {
    [
        ("Login", "User*,Password*,Host,Description"),
        ("Card", "Number*,Expires*,PIN,Bank"),
        ("Wifi", "SSID*,Password*"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for CsmConfig {
    fn default() -> Self {
        Self {
            default_type: default_type(),
            default_name: default_name(),
            default_format: default_format(),
            search_type: SearchType::default(),
            brute_force: false,
            record_separator: default_record_separator(),
            field_separator: default_field_separator(),
            sources: Vec::new(),
            user_name: None,
            user_key: None,
            log_level: default_log_level(),
            log_file: None,
            account_templates: default_templates(),
            kdf: KdfParams::default(),
        }
    }
}

impl CsmConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(CsmError::Io)?;
        let config: CsmConfig =
            serde_json::from_str(&content).map_err(CsmError::Serialization)?;
        config.separators().validate()?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(CsmError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(CsmError::Serialization)?;
        fs::write(config_path, content).map_err(CsmError::Io)?;
        Ok(())
    }

    pub fn locator_defaults(&self) -> LocatorDefaults {
        LocatorDefaults {
            medium: self.default_type.clone(),
            name: self.default_name.clone(),
            format: self.default_format.clone(),
        }
    }

    pub fn separators(&self) -> Separators {
        Separators {
            record: self.record_separator.clone(),
            field: self.field_separator.clone(),
        }
    }

    pub fn locator(&self, raw: &str) -> SourceLocator {
        SourceLocator::parse(raw, &self.locator_defaults())
    }

    /// Locator of the default source, built from the default name.
    pub fn default_locator(&self) -> SourceLocator {
        SourceLocator::from_parts(&self.default_name, None, None, &self.locator_defaults())
    }

    /// Template lookup ignores case.
    pub fn template(&self, name: &str) -> Option<&str> {
        self.account_templates
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
