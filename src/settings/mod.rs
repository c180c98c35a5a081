// Settings: studio configuration from file and environment.

pub mod store;
pub mod types;
