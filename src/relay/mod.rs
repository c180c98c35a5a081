// Relay domain: reshapes keyword requests into vision-model calls.

pub mod error;
pub mod prompt;
pub mod service;
pub mod upstream;
