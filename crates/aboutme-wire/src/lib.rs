//! Request/response contract between the keyword relay and its clients.
//!
//! Both the relay handlers and the keyword client depend on this crate so the
//! JSON shapes, route paths and fallback strings cannot drift apart.

use serde::{Deserialize, Serialize};

/// Route for single-shot (flat) keyword generation.
pub const FLAT_PATH: &str = "/keywords";

/// Route for one step of the layered keyword chain.
pub const LAYERED_PATH: &str = "/keywords-layered";

/// Number of layers produced by one layered capture cycle.
pub const LAYER_COUNT: usize = 4;

/// Caption shown in every cell before the first refresh cycle begins.
pub const IDLE_CAPTION: &str = "ABOUT ME";

/// Sentinel list returned by a failed flat fetch.
pub const FLAT_SENTINEL: &str = "Error";

/// Placeholder layers shown after a failed layered cycle.
pub const LAYER_PLACEHOLDERS: [&str; LAYER_COUNT] = ["Error", "Analyzing", "Image", "Content"];

/// The two relay routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Single-shot subject keywords.
    Flat,
    /// One step of the layered chain, optionally seeded by prior keywords.
    Layered,
}

impl Endpoint {
    /// Route path served by the relay.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Flat => FLAT_PATH,
            Endpoint::Layered => LAYERED_PATH,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Body accepted by both relay endpoints.
///
/// Every field is optional on the wire so that validation can report a
/// missing image with a proper status instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl KeywordRequest {
    /// Build a request carrying an image and optional prior keywords.
    pub fn new(image: impl Into<String>, keywords: Option<Vec<String>>) -> Self {
        Self {
            image: Some(image.into()),
            keywords,
        }
    }

    /// The image data URL, treating an empty string as absent.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }

    /// Prior keywords, treating an empty list as absent.
    pub fn existing_keywords(&self) -> Option<&[String]> {
        self.keywords.as_deref().filter(|k| !k.is_empty())
    }
}

/// Body returned by both relay endpoints: either `keywords` or `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KeywordResponse {
    pub fn keywords(keywords: Vec<String>) -> Self {
        Self {
            keywords: Some(keywords),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            keywords: None,
            error: Some(message.into()),
        }
    }
}

/// Split a model answer into keywords: comma separated, trimmed, no empties.
pub fn parse_keyword_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

/// The placeholder layer set as owned lists.
pub fn placeholder_layers() -> [Vec<String>; LAYER_COUNT] {
    LAYER_PLACEHOLDERS.map(|word| vec![word.to_string()])
}

/// The flat-mode sentinel as an owned list.
pub fn flat_sentinel() -> Vec<String> {
    vec![FLAT_SENTINEL.to_string()]
}
