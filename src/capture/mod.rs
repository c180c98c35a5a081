// Capture domain: frame sources, buffering, and data-URL encoding.

pub mod buffer;
pub mod dummy;
pub mod encode;
pub mod error;
pub mod session;
pub mod source;
pub mod still;
