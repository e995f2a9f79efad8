//! Temporary monorepo fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use depsync::command::RunOptions;

/// A monorepo on disk that is removed when dropped
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Write `packages/<name>/package.json` with `name` as its first key
    pub fn with_package(self, name: &str, contents: Value) -> Self {
        let mut object = serde_json::Map::new();
        object.insert("name".to_string(), Value::String(name.to_string()));
        if let Value::Object(rest) = contents {
            object.extend(rest);
        }
        let text = serde_json::to_string_pretty(&Value::Object(object)).expect("serialize") + "\n";
        self.with_file(&format!("packages/{name}/package.json"), &text)
    }

    /// Write `.depsyncrc.json`
    pub fn with_config(self, config: Value) -> Self {
        let text = serde_json::to_string_pretty(&config).expect("serialize");
        self.with_file(".depsyncrc.json", &text)
    }

    pub fn with_file(self, relative: &str, contents: &str) -> Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
        fs::write(&path, contents).expect("write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.path().join("packages").join(name).join("package.json")
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.manifest_path(name)).expect("read manifest")
    }

    pub fn read_json(&self, name: &str) -> Value {
        serde_json::from_str(&self.read(name)).expect("parse manifest")
    }

    pub fn options(&self) -> RunOptions {
        RunOptions {
            cwd: self.path().to_path_buf(),
            ..RunOptions::default()
        }
    }
}
