// Diagnostics: runtime counters for the studio loops.

pub mod stats;
