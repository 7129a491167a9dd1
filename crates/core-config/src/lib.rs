//! Configuration loading and parsing.
//!
//! Parses `oxsel.toml` (or an override path provided by the binary). Every
//! section is optional and unknown fields are ignored, so an empty or missing
//! file yields the defaults:
//!
//! ```toml
//! [wrap]            # per selection mode: "stay" or "wrap"
//! search = "wrap"
//! word_short = "stay"
//!
//! [history]
//! depth = 100       # selection jump list entries per buffer
//!
//! [undo]
//! depth = 200       # undo snapshots per buffer
//!
//! [lsp]
//! timeout_ms = 2000
//!
//! [search]
//! case_insensitive = false
//! ```

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

/// What Next/Previous do after running off either end of the candidates.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WrapSetting {
    Stay,
    Wrap,
}

/// Per-mode wrap overrides; `None` keeps the mode's built-in default.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct WrapConfig {
    #[serde(default)]
    pub character: Option<WrapSetting>,
    #[serde(default)]
    pub word_short: Option<WrapSetting>,
    #[serde(default)]
    pub word_long: Option<WrapSetting>,
    #[serde(default)]
    pub line_trimmed: Option<WrapSetting>,
    #[serde(default)]
    pub line_full: Option<WrapSetting>,
    #[serde(default)]
    pub column: Option<WrapSetting>,
    #[serde(default)]
    pub token: Option<WrapSetting>,
    #[serde(default)]
    pub syntax_node: Option<WrapSetting>,
    #[serde(default)]
    pub regex: Option<WrapSetting>,
    #[serde(default)]
    pub search: Option<WrapSetting>,
    #[serde(default)]
    pub lsp: Option<WrapSetting>,
    #[serde(default)]
    pub mark: Option<WrapSetting>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_depth")]
    pub depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: Self::default_depth(),
        }
    }
}

impl HistoryConfig {
    const fn default_depth() -> usize {
        100
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UndoConfig {
    #[serde(default = "UndoConfig::default_depth")]
    pub depth: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            depth: Self::default_depth(),
        }
    }
}

impl UndoConfig {
    const fn default_depth() -> usize {
        200
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LspConfig {
    #[serde(default = "LspConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LspConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl LspConfig {
    const fn default_timeout_ms() -> u64 {
        2000
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    #[serde(default)]
    pub case_insensitive: bool,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub wrap: WrapConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub lsp: LspConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub source: Option<PathBuf>,
    pub file: ConfigFile, // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxsel.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxsel").join("oxsel.toml");
    }
    PathBuf::from("oxsel.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            // A broken file must not keep the editor from starting.
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// History depth; zero is raised to one so the jump list can hold the last position.
    pub fn history_depth(&self) -> usize {
        let raw = self.file.history.depth;
        if raw == 0 {
            info!(target: "config", raw, clamped = 1, "history_depth_clamped");
            return 1;
        }
        raw
    }

    pub fn undo_depth(&self) -> usize {
        self.file.undo.depth.max(1)
    }

    pub fn lsp_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.file.lsp.timeout_ms)
    }
}
