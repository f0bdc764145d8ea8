use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::{DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_PROBE_MODEL};

/// RGB color represented as a 3-element array.
pub type Rgb = [u8; 3];

/// Gemini API settings as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfigFile {
    /// API base URL
    pub api_base: String,
    /// Model answering chat messages (can also be set via GEMINI_MODEL)
    pub chat_model: String,
    /// Model used to validate a new API key
    pub probe_model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens per reply
    pub max_output_tokens: u32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Top-k sampling cutoff
    pub top_k: u32,
}

impl Default for GeminiConfigFile {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            probe_model: DEFAULT_PROBE_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

/// Color configuration for the UI.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    /// Chat area gradient start color (Blue by default)
    pub chat_gradient_start: Rgb,
    /// Chat area gradient end color (Purple by default)
    pub chat_gradient_end: Rgb,
    /// Input area gradient start color
    pub input_gradient_start: Rgb,
    /// Input area gradient end color
    pub input_gradient_end: Rgb,
    /// User message color
    pub user: Rgb,
    /// Assistant message color
    pub assistant: Rgb,
    /// Error banner color
    pub error: Rgb,
    /// Success color (ready status, saved key)
    pub success: Rgb,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            chat_gradient_start: [66, 133, 244], // Google blue
            chat_gradient_end: [155, 114, 203],  // Gemini purple
            input_gradient_start: [66, 133, 244],
            input_gradient_end: [217, 101, 112], // Rose
            user: [96, 165, 250],
            assistant: [220, 220, 230],
            error: [255, 100, 100],
            success: [100, 255, 100],
        }
    }
}

/// Behavior configuration for the UI.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Number of lines to scroll with Page Up/Down
    pub scroll_page_size: usize,
    /// How long the "Saved" confirmation shows before switching to chat
    pub saved_display_ms: u64,
    /// Event polling interval in milliseconds
    pub idle_poll_ms: u64,
    /// Cursor blink interval in milliseconds
    pub cursor_blink_ms: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            scroll_page_size: 10,
            saved_display_ms: 1000,
            idle_poll_ms: 50,
            cursor_blink_ms: 530,
        }
    }
}

/// Where the API key is stored.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file path; defaults to ~/.local/share/gemini-panel/storage.json
    pub path: Option<PathBuf>,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfigFile,
    pub behavior: BehaviorConfig,
    pub colors: ColorConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Returns the default config file path: ~/.config/gemini-panel/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gemini-panel").join("config.toml"))
    }

    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Self {
        Self::default_path()
            .map(|path| Self::load_or_default(&path))
            .unwrap_or_default()
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl ColorConfig {
    /// Convert an RGB array to a tuple for gradient math.
    pub fn to_tuple(rgb: &Rgb) -> (u8, u8, u8) {
        (rgb[0], rgb[1], rgb[2])
    }

    /// Convert an RGB array to a ratatui Color.
    pub fn to_color(rgb: &Rgb) -> ratatui::style::Color {
        ratatui::style::Color::Rgb(rgb[0], rgb[1], rgb[2])
    }

    /// Get chat gradient colors as tuples.
    pub fn chat_gradient(&self) -> ((u8, u8, u8), (u8, u8, u8)) {
        (
            Self::to_tuple(&self.chat_gradient_start),
            Self::to_tuple(&self.chat_gradient_end),
        )
    }

    /// Get input gradient colors as tuples.
    pub fn input_gradient(&self) -> ((u8, u8, u8), (u8, u8, u8)) {
        (
            Self::to_tuple(&self.input_gradient_start),
            Self::to_tuple(&self.input_gradient_end),
        )
    }
}
