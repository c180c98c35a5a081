use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How keywords are generated and laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    /// One shared list, refreshed by a single call.
    Flat,
    /// Four chained layers mapped to the four vertical bands of the canvas.
    #[default]
    Layered,
}

impl KeywordMode {
    /// Nominal interval between refresh cycles.
    pub fn refresh_interval(self) -> Duration {
        match self {
            KeywordMode::Flat => Duration::from_secs(10),
            KeywordMode::Layered => Duration::from_secs(15),
        }
    }

    /// Parse the value of `STUDIO_MODE`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(KeywordMode::Flat),
            "layered" => Some(KeywordMode::Layered),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeywordMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordMode::Flat => write!(f, "flat"),
            KeywordMode::Layered => write!(f, "layered"),
        }
    }
}

/// Where frames come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSettings {
    /// Synthetic animated gradient.
    #[default]
    Dummy,
    /// A still image decoded once from disk.
    Still { path: String },
}

/// Upstream inference API settings. The credential itself is never stored in
/// the settings file; it is read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamSettings {
    pub api_url: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
        }
    }
}

/// Canvas and paint-loop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SketchSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub grid_spacing: u32,
    pub min_text_size: f32,
    pub max_text_size: f32,
    pub hover_padding: f32,
    pub emphasis_chance: f64,
    pub emphasis_scale: f32,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_rate: 20,
            grid_spacing: 15,
            min_text_size: 5.0,
            max_text_size: 20.0,
            hover_padding: 20.0,
            emphasis_chance: 0.1,
            emphasis_scale: 1.5,
        }
    }
}

/// Top-level settings file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudioSettings {
    pub bind_addr: String,
    pub mode: KeywordMode,
    /// Relay base URL for the keyword client. `None` calls the relay
    /// in-process.
    pub keyword_endpoint: Option<String>,
    /// Override for the mode's nominal refresh interval.
    pub refresh_interval_secs: Option<u64>,
    pub fetch_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub jpeg_quality: u8,
    pub log_level: String,
    pub source: SourceSettings,
    pub upstream: UpstreamSettings,
    pub sketch: SketchSettings,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            mode: KeywordMode::default(),
            keyword_endpoint: None,
            refresh_interval_secs: None,
            fetch_timeout_secs: 30,
            max_body_bytes: 16 * 1024 * 1024,
            jpeg_quality: 92,
            log_level: "info".to_string(),
            source: SourceSettings::default(),
            upstream: UpstreamSettings::default(),
            sketch: SketchSettings::default(),
        }
    }
}

impl StudioSettings {
    /// Effective refresh interval: explicit override, else the mode's default.
    /// Never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.mode.refresh_interval())
            .max(Duration::from_secs(1))
    }

    /// Keyword and upstream request timeout, at least one second.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}
