use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::manifest::error::ManifestError;
use crate::manifest::store::{FsStore, ManifestStore};
use crate::manifest::types::Manifest;

/// Manifests that loaded, plus per-file failures
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully parsed manifests, in input order
    pub manifests: Vec<Manifest>,
    pub failures: Vec<LoadFailure>,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: ManifestError,
}

/// Load manifests from the filesystem
pub async fn load(paths: &[PathBuf]) -> LoadOutcome {
    load_with(Arc::new(FsStore), paths).await
}

/// Load manifests concurrently from `store`.
///
/// A malformed or unreadable file is reported in `failures` and excluded;
/// the remaining files are still loaded.
pub async fn load_with<S: ManifestStore>(store: Arc<S>, paths: &[PathBuf]) -> LoadOutcome {
    let tasks = paths.iter().cloned().map(|path| {
        let store = Arc::clone(&store);
        async move {
            let result = read_manifest(store, path.clone()).await;
            (path, result)
        }
    });

    let mut outcome = LoadOutcome::default();
    for (path, result) in join_all(tasks).await {
        match result {
            Ok(manifest) => outcome.manifests.push(manifest),
            Err(error) => {
                warn!("Skipping {}: {}", path.display(), error);
                outcome.failures.push(LoadFailure { path, error });
            }
        }
    }

    debug!(
        "Loaded {} manifests ({} failed)",
        outcome.manifests.len(),
        outcome.failures.len()
    );
    outcome
}

async fn read_manifest<S: ManifestStore>(
    store: Arc<S>,
    path: PathBuf,
) -> Result<Manifest, ManifestError> {
    let read_path = path.clone();
    let raw = tokio::task::spawn_blocking(move || store.read(&read_path))
        .await
        .map_err(|e| ManifestError::Task(e.to_string()))?
        .map_err(ManifestError::Read)?;

    Manifest::parse(path, &raw)
}
