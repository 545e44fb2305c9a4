use std::fs;
use std::path::{Path, PathBuf};

use toml_edit::DocumentMut;

use crate::io::recovery::atomic_write;
use crate::model::config::AppConfig;
use crate::util::unicode::is_single_glyph;

const CONFIG_FILE: &str = "config.toml";

/// Every key `tasky config` accepts, as `table.field`
pub const CONFIG_KEYS: &[&str] = &[
    "defaults.list_name",
    "defaults.fallback_list_name",
    "defaults.new_list_prompt",
    "defaults.emoji",
    "ui.show_ids",
    "ui.due_badges",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config syntax: {0}")]
    Syntax(#[from] toml_edit::TomlError),
    #[error("unknown config key {0:?} (known: {keys})", keys = CONFIG_KEYS.join(", "))]
    UnknownKey(String),
    #[error("{key} expects true or false, got {value:?}")]
    NotABool { key: String, value: String },
    #[error("{key}: {reason}, got {value:?}")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

fn read_text(data_dir: &Path) -> Result<String, ConfigError> {
    let path = config_path(data_dir);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}

/// Parsed config. A missing file means all defaults.
pub fn load_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    parse_config(&read_text(data_dir)?)
}

fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

/// List names must not be blank and the emoji must be one glyph.
fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let d = &config.defaults;
    let invalid = |key: &str, value: &str, reason| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };
    for (key, value) in [
        ("defaults.list_name", &d.list_name),
        ("defaults.fallback_list_name", &d.fallback_list_name),
    ] {
        if value.trim().is_empty() {
            return Err(invalid(key, value.as_str(), "must not be blank"));
        }
    }
    if !is_single_glyph(d.emoji.trim()) {
        return Err(invalid("defaults.emoji", d.emoji.as_str(), "must be a single glyph"));
    }
    Ok(())
}

/// The raw document, for edits that keep comments and layout.
pub fn read_config_doc(data_dir: &Path) -> Result<DocumentMut, ConfigError> {
    Ok(read_text(data_dir)?.parse::<DocumentMut>()?)
}

pub fn write_config(data_dir: &Path, doc: &DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(data_dir);
    fs::create_dir_all(data_dir)
        .and_then(|()| atomic_write(&path, doc.to_string().as_bytes()))
        .map_err(|source| ConfigError::Write { path, source })
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    key.split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Set `table.field` in the document. `ui.*` keys take booleans, the rest strings.
/// The edited document is re-validated before being handed back.
pub fn set_value(doc: &mut DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let (table, field) = split_key(key)?;
    if !doc.contains_table(table) {
        doc[table] = toml_edit::table();
    }
    doc[table][field] = if table == "ui" {
        match value {
            "true" => toml_edit::value(true),
            "false" => toml_edit::value(false),
            _ => {
                return Err(ConfigError::NotABool {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
    } else {
        toml_edit::value(value)
    };
    parse_config(&doc.to_string())?;
    Ok(())
}

/// Effective value of `table.field`, defaults included.
pub fn get_value(config: &AppConfig, key: &str) -> Result<String, ConfigError> {
    split_key(key)?;
    let value = match key {
        "defaults.list_name" => config.defaults.list_name.clone(),
        "defaults.fallback_list_name" => config.defaults.fallback_list_name.clone(),
        "defaults.new_list_prompt" => config.defaults.new_list_prompt.clone(),
        "defaults.emoji" => config.defaults.emoji.clone(),
        "ui.show_ids" => config.ui.show_ids.to_string(),
        "ui.due_badges" => config.ui.due_badges.to_string(),
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    };
    Ok(value)
}
