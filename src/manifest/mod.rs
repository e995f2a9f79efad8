//! Loading and writing package.json manifests

pub mod error;
pub mod loader;
pub mod store;
pub mod types;
pub mod writer;

pub use error::ManifestError;
pub use loader::{LoadFailure, LoadOutcome, load, load_with};
pub use store::{FsStore, ManifestStore};
pub use types::Manifest;
pub use writer::{WriteFailure, WriteOutcome, write, write_with};
