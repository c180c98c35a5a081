use serde::{Deserialize, Serialize};

use super::color::Rgb;

/// One drawn keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub size: f32,
    pub color: Rgb,
    /// Enlarged and whitened because the pointer is over it.
    pub emphasised: bool,
}

/// Result of one paint cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub started: bool,
    pub glyphs: Vec<Glyph>,
}

impl Scene {
    /// Black canvas with nothing on it, served before the first paint.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            sequence: 0,
            width,
            height,
            background: Rgb::BLACK,
            started: false,
            glyphs: Vec::new(),
        }
    }
}

/// Pointer position in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_serializes_camel_case() {
        let scene = Scene {
            sequence: 7,
            width: 2,
            height: 1,
            background: Rgb([1, 2, 3]),
            started: true,
            glyphs: vec![Glyph {
                text: "red".into(),
                x: 0.0,
                y: 15.0,
                size: 10.0,
                color: Rgb::WHITE,
                emphasised: false,
            }],
        };
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["background"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["glyphs"][0]["text"], "red");
        assert_eq!(json["glyphs"][0]["emphasised"], false);
    }

    #[test]
    fn pointer_parses_coordinates_or_null() {
        let p: Option<Pointer> = serde_json::from_str(r#"{"x":10,"y":20.5}"#).unwrap();
        assert_eq!(p, Some(Pointer { x: 10.0, y: 20.5 }));
        let none: Option<Pointer> = serde_json::from_str("null").unwrap();
        assert!(none.is_none());
    }
}
