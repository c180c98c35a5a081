// Keywords: client calls, the layered chain, shared board, and refresh timing.

pub mod board;
pub mod client;
pub mod fetch;
pub mod refresh;
