// Server: HTTP routes for the relay, studio control, and scene polling.

pub mod error;
pub mod http;
pub mod routes;
