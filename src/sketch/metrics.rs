/// Measures rendered text width.
pub trait TextMetrics: Send + Sync {
    fn text_width(&self, text: &str, size: f32) -> f32;
}

/// Fixed advance per character, a fair stand-in for the default sans face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    /// Advance as a fraction of the font size.
    pub advance: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_length_and_size() {
        let m = MonospaceMetrics::default();
        assert_eq!(m.text_width("", 10.0), 0.0);
        assert!((m.text_width("abcd", 10.0) - 24.0).abs() < 1e-4);
        assert!((m.text_width("abcd", 20.0) - 48.0).abs() < 1e-4);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let m = MonospaceMetrics { advance: 1.0 };
        assert_eq!(m.text_width("héllo", 1.0), 5.0);
    }
}
