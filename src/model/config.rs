use serde::{Deserialize, Serialize};

use super::list::DEFAULT_EMOJI;
use crate::util::unicode::is_single_glyph;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Name of the list seeded on first launch
    #[serde(default = "default_list_name")]
    pub list_name: String,
    /// Name used when a new list is created with a blank name
    #[serde(default = "default_fallback_list_name")]
    pub fallback_list_name: String,
    /// Suggested text when prompting for a new list name
    #[serde(default = "default_new_list_prompt")]
    pub new_list_prompt: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            list_name: default_list_name(),
            fallback_list_name: default_fallback_list_name(),
            new_list_prompt: default_new_list_prompt(),
            emoji: default_emoji(),
        }
    }
}

impl DefaultsConfig {
    /// Seeded list name. Blank values fall back to the built-in name.
    pub fn seed_list_name(&self) -> String {
        non_blank(&self.list_name).unwrap_or_else(default_list_name)
    }

    /// Name for lists created with a blank name.
    pub fn fallback_name(&self) -> String {
        non_blank(&self.fallback_list_name).unwrap_or_else(default_fallback_list_name)
    }

    /// Emoji for new lists, or the built-in pin when the configured one is not
    /// a single glyph.
    pub fn list_emoji(&self) -> String {
        let emoji = self.emoji.trim();
        if is_single_glyph(emoji) {
            emoji.to_string()
        } else {
            default_emoji()
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Print task and list ids in text output
    #[serde(default = "default_true")]
    pub show_ids: bool,
    /// Print due-date urgency markers
    #[serde(default = "default_true")]
    pub due_badges: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_ids: true,
            due_badges: true,
        }
    }
}

fn default_list_name() -> String {
    "Mis tareas".to_string()
}

fn default_fallback_list_name() -> String {
    "Lista".to_string()
}

fn default_new_list_prompt() -> String {
    "Nueva lista".to_string()
}

fn default_emoji() -> String {
    DEFAULT_EMOJI.to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.defaults.list_name, "Mis tareas");
        assert_eq!(config.defaults.fallback_list_name, "Lista");
        assert_eq!(config.defaults.emoji, DEFAULT_EMOJI);
        assert!(config.ui.show_ids);
        assert!(config.ui.due_badges);
    }

    #[test]
    fn invalid_defaults_fall_back_to_builtins() {
        let defaults = DefaultsConfig {
            list_name: "  ".into(),
            fallback_list_name: String::new(),
            new_list_prompt: String::new(),
            emoji: "not an emoji".into(),
        };
        assert_eq!(defaults.seed_list_name(), "Mis tareas");
        assert_eq!(defaults.fallback_name(), "Lista");
        assert_eq!(defaults.list_emoji(), DEFAULT_EMOJI);

        let custom = DefaultsConfig {
            list_name: " Inbox ".into(),
            emoji: "🗂".into(),
            ..DefaultsConfig::default()
        };
        assert_eq!(custom.seed_list_name(), "Inbox");
        assert_eq!(custom.list_emoji(), "🗂");
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[defaults]
list_name = "Inbox"

[ui]
show_ids = false
"#,
        )
        .unwrap();
        assert_eq!(config.defaults.list_name, "Inbox");
        assert_eq!(config.defaults.fallback_list_name, "Lista");
        assert!(!config.ui.show_ids);
        assert!(config.ui.due_badges);
    }
}
