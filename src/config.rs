use crate::selection::{SelectionPolicy, DEFAULT_MAX_SELECTION, DEFAULT_SIMILARITY_CUTOFF};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".budgetbite.json";

/// Connection settings for the local Ollama server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    /// Read timeout per request. Generation on small machines is slow.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:11434".to_string(),
            timeout_secs: 300,
            connect_timeout_secs: 5,
        }
    }
}

/// How user selections are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub max_selection: usize,
    /// Minimum similarity ratio (0.0..=1.0) for a fuzzy meal-name match.
    pub similarity_cutoff: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_selection: DEFAULT_MAX_SELECTION,
            similarity_cutoff: DEFAULT_SIMILARITY_CUTOFF,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ollama model tag used for both generation calls.
    pub model: String,
    /// Meals document (`.docx` or plain text).
    pub meals_path: PathBuf,
    /// Store inventory document (`.docx` or plain text).
    pub inventory_path: PathBuf,
    /// Store name used in prompts and the "no close match" phrase.
    pub store_name: String,
    pub selection: SelectionConfig,
    pub ollama: OllamaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gemma3:4b".to_string(),
            meals_path: PathBuf::from("meals.docx"),
            inventory_path: PathBuf::from("walmart.docx"),
            store_name: "Walmart".to_string(),
            selection: SelectionConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Config {
    /// Range checks for values that would otherwise fail silently later:
    /// `max_selection == 0` selects nothing and a cutoff outside `[0, 1]`
    /// disables approximate matching.
    pub fn validate(&self) -> anyhow::Result<()> {
        let sel = &self.selection;
        anyhow::ensure!(
            sel.max_selection > 0,
            "selection.max_selection must be at least 1 (got {})",
            sel.max_selection
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&sel.similarity_cutoff),
            "selection.similarity_cutoff must be between 0.0 and 1.0 (got {})",
            sel.similarity_cutoff
        );
        Ok(())
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            max_selection: self.selection.max_selection,
            similarity_cutoff: self.selection.similarity_cutoff,
        }
    }
}

/// `<config_dir>/budgetbite/config.json`, used when the working directory has
/// no config file.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("budgetbite").join("config.json"))
}

/// Load the first config found: explicit path, `./.budgetbite.json`, then the
/// user config. Missing files mean defaults; an unparsable file is reported
/// and ignored.
pub fn load_config(work_dir: &Path, explicit: Option<&Path>) -> Config {
    let candidates: Vec<PathBuf> = match explicit {
        Some(p) => vec![p.to_path_buf()],
        None => std::iter::once(work_dir.join(CONFIG_FILE_NAME))
            .chain(user_config_path())
            .collect(),
    };

    for path in candidates {
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        match serde_json::from_str::<Config>(&text) {
            Ok(cfg) => {
                debug!(path = %path.display(), "loaded config");
                return cfg;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparsable config, using defaults");
                return Config::default();
            }
        }
    }
    Config::default()
}
