//! Persisted settings of one panel item
//!
//! Settings live in `$XDG_CONFIG_HOME/fsguard/<instance>.rc` as `KEY=value`
//! lines. Thresholds are percentages of the filesystem size. Files written
//! before the `schema` key existed stored thresholds in megabytes; those
//! thresholds are dropped in favour of the defaults when such a file is read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Current on-disk layout. 2 = percent-based thresholds.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported config schema {0}")]
    UnsupportedSchema(u32),
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Value {value:?} for {key} cannot be stored, it mixes quote characters")]
    Unstorable { key: &'static str, value: String },
}

/// Where a loaded config came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read from an up-to-date file
    Stored,
    /// Read from an older file, needs to be written back
    Migrated,
    /// No file exists yet
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Path whose filesystem is monitored
    pub path: PathBuf,
    pub display_name: String,
    pub show_display_name: bool,
    /// Free percentage at or below which the state is "warning"
    pub warning_threshold_pct: u8,
    /// Free percentage at or below which the state is "urgent"
    pub urgent_threshold_pct: u8,
    pub show_size: bool,
    pub show_meter: bool,
    pub show_button: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/"),
            display_name: String::new(),
            show_display_name: true,
            warning_threshold_pct: 8,
            urgent_threshold_pct: 2,
            show_size: true,
            show_meter: true,
            show_button: true,
        }
    }
}

impl MonitorConfig {
    /// Like [`Self::load_from`], but a missing file yields the defaults
    ///
    /// # Errors
    /// Fails if the file exists but cannot be read or contains invalid values
    pub fn load_file(file: &Path) -> Result<(Self, Origin), ConfigError> {
        if !file.exists() {
            return Ok((Self::default(), Origin::Defaults));
        }
        Self::load_from(file)
    }

    /// # Errors
    /// Fails if the file cannot be read or contains invalid values
    pub fn load_from(file: &Path) -> Result<(Self, Origin), ConfigError> {
        let entries = env_file_reader::read_file(file).map_err(|source| ConfigError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        Self::from_entries(&entries)
    }

    /// Writes the settings to `file`, creating its directory if needed
    ///
    /// # Errors
    /// Fails if a value cannot be stored or the file cannot be written
    pub fn save_to(&self, file: &Path) -> Result<(), ConfigError> {
        let contents = self.to_file_contents()?;
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: file.to_path_buf(),
            source,
        };
        if let Some(dir) = file.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        std::fs::write(file, contents).map_err(write_err)
    }

    /// Builds a config from parsed `KEY=value` entries, filling in defaults
    /// for missing keys
    ///
    /// # Errors
    /// Fails on values that do not parse or on a schema newer than this build
    pub fn from_entries(entries: &HashMap<String, String>) -> Result<(Self, Origin), ConfigError> {
        let defaults = Self::default();

        let schema = entries
            .get("schema")
            .map(|v| {
                v.trim().parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                    key: "schema",
                    value: v.clone(),
                })
            })
            .transpose()?;
        if let Some(schema) = schema {
            if schema > SCHEMA_VERSION {
                return Err(ConfigError::UnsupportedSchema(schema));
            }
        }

        let (warning_threshold_pct, urgent_threshold_pct) = if schema.is_none()
            && (entries.contains_key("yellow") || entries.contains_key("red"))
        {
            log::warn!(
                "Config uses megabyte thresholds, resetting to {}% / {}%",
                defaults.warning_threshold_pct,
                defaults.urgent_threshold_pct
            );
            (defaults.warning_threshold_pct, defaults.urgent_threshold_pct)
        } else {
            (
                get_percent(entries, "yellow", defaults.warning_threshold_pct)?,
                get_percent(entries, "red", defaults.urgent_threshold_pct)?,
            )
        };
        if urgent_threshold_pct > warning_threshold_pct {
            log::debug!(
                "Urgent threshold {urgent_threshold_pct}% is above warning threshold {warning_threshold_pct}%"
            );
        }

        let path = entries
            .get("mnt")
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(defaults.path, PathBuf::from);

        let config = Self {
            path,
            display_name: entries.get("label").cloned().unwrap_or_default(),
            show_display_name: get_bool(entries, "label_visible", defaults.show_display_name)?,
            warning_threshold_pct,
            urgent_threshold_pct,
            show_size: get_bool(entries, "lab_size_visible", defaults.show_size)?,
            show_meter: get_bool(entries, "progress_bar_visible", defaults.show_meter)?,
            show_button: !get_bool(entries, "hide_button", !defaults.show_button)?,
        };
        let origin = if schema.is_some() {
            Origin::Stored
        } else {
            Origin::Migrated
        };
        Ok((config, origin))
    }

    /// # Errors
    /// Fails for text values that cannot be quoted so they read back unchanged
    pub fn to_file_contents(&self) -> Result<String, ConfigError> {
        let entries = [
            ("schema", SCHEMA_VERSION.to_string()),
            ("mnt", quote("mnt", &self.path.to_string_lossy())?),
            ("label", quote("label", &self.display_name)?),
            ("label_visible", self.show_display_name.to_string()),
            ("yellow", self.warning_threshold_pct.to_string()),
            ("red", self.urgent_threshold_pct.to_string()),
            ("lab_size_visible", self.show_size.to_string()),
            ("progress_bar_visible", self.show_meter.to_string()),
            ("hide_button", (!self.show_button).to_string()),
        ];
        let mut out = String::from("# fsguard settings, thresholds in percent\n");
        for (key, value) in entries {
            out.push_str(key);
            out.push('=');
            out.push_str(&value);
            out.push('\n');
        }
        Ok(out)
    }
}

fn file_name(instance: &str) -> String {
    format!("{instance}.rc")
}

/// Settings file of a panel instance, `None` without a home directory
#[must_use]
pub fn config_file(instance: &str) -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("fsguard").get_config_file(file_name(instance))
}

fn get_bool(
    entries: &HashMap<String, String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = entries.get(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.clone(),
        }),
    }
}

fn get_percent(
    entries: &HashMap<String, String>,
    key: &'static str,
    default: u8,
) -> Result<u8, ConfigError> {
    let Some(value) = entries.get(key) else {
        return Ok(default);
    };
    let Ok(percent) = value.trim().parse::<u32>() else {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.clone(),
        });
    };
    if percent > 100 {
        log::warn!("{key}={percent} is above 100%, clamping");
    }
    Ok(u8::try_from(percent.min(100)).unwrap_or(100))
}

/// Quotes a value so it reads back unchanged. Double quotes expand escape
/// sequences, so values with `"` or `\` go into single quotes, which are
/// taken literally.
fn quote(key: &'static str, value: &str) -> Result<String, ConfigError> {
    if !value.contains(['"', '\\']) {
        Ok(format!("\"{value}\""))
    } else if !value.contains('\'') {
        Ok(format!("'{value}'"))
    } else {
        Err(ConfigError::Unstorable {
            key,
            value: value.to_owned(),
        })
    }
}
