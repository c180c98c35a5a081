use aboutme_wire::IDLE_CAPTION;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::color::{average_color, Rgb, Sampler};
use super::metrics::TextMetrics;
use super::scene::{Glyph, Pointer, Scene};
use crate::capture::buffer::Frame;
use crate::keywords::board::BoardSnapshot;
use crate::settings::types::SketchSettings;

/// Lays keywords out over the latest frame.
pub struct Compositor<M> {
    settings: SketchSettings,
    metrics: M,
}

impl<M: TextMetrics> Compositor<M> {
    pub fn new(settings: SketchSettings, metrics: M) -> Self {
        Self { settings, metrics }
    }

    pub fn settings(&self) -> &SketchSettings {
        &self.settings
    }

    fn random_size<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (min, max) = (self.settings.min_text_size, self.settings.max_text_size);
        if max > min {
            rng.random_range(min..max)
        } else {
            min
        }
    }

    fn is_hovered(&self, pointer: Option<Pointer>, x: f32, y: f32, width: f32, size: f32) -> bool {
        let Some(p) = pointer else {
            return false;
        };
        let pad = self.settings.hover_padding;
        p.x >= x - pad && p.x <= x + width + pad && p.y >= y - size - pad && p.y <= y + pad
    }

    /// Compose one scene.
    ///
    /// Every grid point from the top-left corner to the right and bottom
    /// edges inclusive gets at most one glyph.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        frame: Option<&Frame>,
        board: &BoardSnapshot,
        pointer: Option<Pointer>,
        sequence: u64,
        rng: &mut R,
    ) -> Scene {
        let (width, height) = (self.settings.width, self.settings.height);
        let spacing = self.settings.grid_spacing.max(1) as usize;
        let background = frame.map_or(Rgb::BLACK, average_color);
        let sampler = frame.map(|f| Sampler::new(f, width, height));

        let mut glyphs = Vec::new();
        for gy in (0..=height).step_by(spacing) {
            let y = gy as f32;
            let words = board.keywords.for_row(y, height as f32);
            for gx in (0..=width).step_by(spacing) {
                let x = gx as f32;
                let size = self.random_size(rng);
                let text = if board.started {
                    match words.choose(rng) {
                        Some(word) => word.as_str(),
                        None => continue,
                    }
                } else {
                    IDLE_CAPTION
                };
                let color = sampler.as_ref().map_or(Rgb::WHITE, |s| s.sample(x, y));
                let text_width = self.metrics.text_width(text, size);

                let glyph = if self.is_hovered(pointer, x, y, text_width, size) {
                    if !rng.random_bool(self.settings.emphasis_chance.clamp(0.0, 1.0)) {
                        continue;
                    }
                    Glyph {
                        text: text.to_string(),
                        x,
                        y,
                        size: size * self.settings.emphasis_scale,
                        color: Rgb::WHITE,
                        emphasised: true,
                    }
                } else {
                    Glyph {
                        text: text.to_string(),
                        x,
                        y,
                        size,
                        color,
                        emphasised: false,
                    }
                };
                glyphs.push(glyph);
            }
        }

        Scene {
            sequence,
            width,
            height,
            background,
            started: board.started,
            glyphs,
        }
    }
}
