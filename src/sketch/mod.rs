// Sketch: per-frame keyword layout over the live image.

pub mod color;
pub mod compose;
pub mod metrics;
pub mod runtime;
pub mod scene;
