pub mod capture;
pub mod diagnostics;
pub mod keywords;
pub mod relay;
pub mod server;
pub mod settings;
pub mod sketch;
pub mod studio;

use settings::store::SettingsStore;
use studio::{Studio, StudioError};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Run the studio until Ctrl-C.
pub fn run() -> Result<(), StudioError> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();

    let settings_path = SettingsStore::default_path();
    let settings = SettingsStore::load_with_env(&settings_path)?;
    init_logging(&settings.log_level);
    tracing::info!("settings loaded from {}", settings_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("studio")
        .build()
        .map_err(StudioError::Runtime)?;

    let studio = match Studio::launch(&settings, runtime.handle().clone()) {
        Ok(studio) => studio,
        Err(e) => {
            tracing::error!("studio failed to start: {e}");
            return Err(e);
        }
    };
    tracing::info!("open http://{}/scene, POST /start to begin", studio.local_addr());

    let signal = runtime.block_on(tokio::signal::ctrl_c());
    tracing::info!("shutting down");
    studio.shutdown();
    signal.map_err(StudioError::Signal)
}
