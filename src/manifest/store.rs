//! File access for manifests

use std::io::Write;
use std::path::Path;

#[cfg(test)]
use mockall::automock;
use tempfile::NamedTempFile;

/// Trait for reading and writing manifest files
#[cfg_attr(test, automock)]
pub trait ManifestStore: Send + Sync + 'static {
    /// Read the whole file as text
    fn read(&self, path: &Path) -> std::io::Result<String>;

    /// Replace the file contents; a failure must leave the original intact
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// Store backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl ManifestStore for FsStore {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        write_atomic(path, contents)
    }
}

/// Write through a temp file in the same directory, then rename over `path`
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.as_file().sync_all()?;

    // Temp files are created 0600; keep the target's permissions
    if let Ok(metadata) = std::fs::metadata(path) {
        temp_file.as_file().set_permissions(metadata.permissions())?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();

        write_atomic(&path, "{\n  \"name\": \"a\"\n}\n").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"name\": \"a\"\n}\n"
        );
    }

    #[test]
    fn write_atomic_leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");

        write_atomic(&path, "{}").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_atomic_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("package.json");

        assert!(write_atomic(&path, "{}").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn fs_store_reads_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();

        assert_eq!(FsStore.read(&path).unwrap(), "{}");
    }
}
