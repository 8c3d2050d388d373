use metrics_exporter_prometheus::PrometheusHandle;
use shiftboard::config::DirectoryConfig;
use shiftboard::error::AppError;
use shiftboard::memory::InMemoryDirectory;
use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seed file when configured, otherwise the built-in demo directory.
pub(crate) fn load_directory(config: &DirectoryConfig) -> Result<InMemoryDirectory, AppError> {
    match &config.seed_path {
        Some(path) => {
            let file = File::open(path)?;
            let directory = InMemoryDirectory::from_json_reader(BufReader::new(file))?;
            info!(path = %path.display(), "directory seeded from file");
            Ok(directory)
        }
        None => {
            warn!("APP_DIRECTORY_SEED not set; using the built-in demo directory");
            Ok(InMemoryDirectory::demo())
        }
    }
}
