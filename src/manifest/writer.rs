use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info};

use crate::manifest::error::ManifestError;
use crate::manifest::store::{FsStore, ManifestStore};
use crate::manifest::types::Manifest;

/// Result of writing a set of manifests
#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub written: Vec<PathBuf>,
    /// Manifests skipped because nothing in them changed
    pub unchanged: usize,
    pub failures: Vec<WriteFailure>,
}

#[derive(Debug)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub error: ManifestError,
}

/// Write changed manifests to the filesystem
pub async fn write(manifests: &[Manifest]) -> WriteOutcome {
    write_with(Arc::new(FsStore), manifests).await
}

/// Write every changed manifest through `store`, one task per file.
///
/// Each file is replaced atomically. Writes across files are not
/// transactional: a failure is reported for that file and files written
/// before it stay written.
pub async fn write_with<S: ManifestStore>(store: Arc<S>, manifests: &[Manifest]) -> WriteOutcome {
    let mut outcome = WriteOutcome::default();

    let tasks = manifests
        .iter()
        .filter(|manifest| {
            let changed = manifest.is_changed();
            if !changed {
                outcome.unchanged += 1;
            }
            changed
        })
        .map(|manifest| {
            let store = Arc::clone(&store);
            let path = manifest.path().to_path_buf();
            // Build the full content before touching the file
            let contents = manifest.to_json_string();
            async move {
                let result = match contents {
                    Ok(contents) => write_manifest(store, path.clone(), contents).await,
                    Err(error) => Err(error),
                };
                (path, result)
            }
        })
        .collect::<Vec<_>>();

    for (path, result) in join_all(tasks).await {
        match result {
            Ok(()) => {
                info!("Wrote {}", path.display());
                outcome.written.push(path);
            }
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                outcome.failures.push(WriteFailure { path, error: e });
            }
        }
    }
    outcome
}

async fn write_manifest<S: ManifestStore>(
    store: Arc<S>,
    path: PathBuf,
    contents: String,
) -> Result<(), ManifestError> {
    tokio::task::spawn_blocking(move || store.write(&path, &contents))
        .await
        .map_err(|e| ManifestError::Task(e.to_string()))?
        .map_err(ManifestError::Write)
}
