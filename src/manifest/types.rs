use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::instance::dependency_type::{DependencyLocation, Strategy};
use crate::manifest::error::ManifestError;

const DEFAULT_INDENT: &str = "  ";

/// A parsed package.json
///
/// Key order is preserved (`serde_json` is built with `preserve_order`), as
/// are the indentation and the trailing newline of the original file.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    contents: Value,
    indent: String,
    trailing_newline: bool,
    changed: bool,
}

impl Manifest {
    pub fn parse(path: impl Into<PathBuf>, raw: &str) -> Result<Self, ManifestError> {
        let contents: Value = serde_json::from_str(raw).map_err(ManifestError::Parse)?;
        if !contents.is_object() {
            return Err(ManifestError::NotAnObject);
        }

        Ok(Self {
            path: path.into(),
            contents,
            indent: detect_indent(raw),
            trailing_newline: raw.ends_with('\n'),
            changed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `name` field
    pub fn name(&self) -> Option<&str> {
        self.contents.get("name").and_then(Value::as_str)
    }

    /// The `name` field, or the file path for unnamed manifests
    pub fn package_name(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.path.display().to_string(),
        }
    }

    pub fn contents(&self) -> &Value {
        &self.contents
    }

    /// Look up a value by JSON pointer (`/pnpm/overrides`)
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.contents.pointer(pointer)
    }

    /// Whether any specifier was rewritten since loading
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Rewrite the specifier of one dependency at `location`.
    ///
    /// Returns true when the stored value changed.
    pub fn set_specifier(
        &mut self,
        location: &DependencyLocation,
        name: &str,
        specifier: &str,
    ) -> Result<bool, ManifestError> {
        let missing = || ManifestError::MissingField {
            pointer: location.pointer.clone(),
            name: name.to_string(),
        };

        let (slot, next) = match &location.strategy {
            Strategy::VersionsByName => {
                let slot = self
                    .contents
                    .pointer_mut(&location.pointer)
                    .and_then(Value::as_object_mut)
                    .and_then(|map| map.get_mut(name))
                    .filter(|value| value.is_string())
                    .ok_or_else(missing)?;
                (slot, specifier.to_string())
            }
            Strategy::NameAtVersion => {
                let slot = self
                    .contents
                    .pointer_mut(&location.pointer)
                    .filter(|value| value.is_string())
                    .ok_or_else(missing)?;
                (slot, format!("{name}@{specifier}"))
            }
            Strategy::VersionOnly | Strategy::NameAndVersion { .. } => {
                let slot = self
                    .contents
                    .pointer_mut(&location.pointer)
                    .filter(|value| value.is_string())
                    .ok_or_else(missing)?;
                (slot, specifier.to_string())
            }
        };

        if slot.as_str() == Some(next.as_str()) {
            return Ok(false);
        }
        *slot = Value::String(next);
        self.changed = true;
        Ok(true)
    }

    /// Replace the value at `pointer`; `""` replaces the whole document.
    ///
    /// Returns true when the value changed, key order included.
    pub fn replace_value(&mut self, pointer: &str, value: Value) -> bool {
        let Some(slot) = self.contents.pointer_mut(pointer) else {
            return false;
        };
        // `Value` equality ignores the order of object keys
        if slot.to_string() == value.to_string() {
            return false;
        }
        *slot = value;
        self.changed = true;
        true
    }

    /// Serialize with the original indentation and trailing newline
    pub fn to_json_string(&self) -> Result<String, ManifestError> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        self.contents
            .serialize(&mut serializer)
            .map_err(ManifestError::Serialize)?;

        let mut text = String::from_utf8_lossy(&buffer).into_owned();
        if self.trailing_newline {
            text.push('\n');
        }
        Ok(text)
    }
}

/// Indentation of the first indented line, e.g. two spaces or a tab
fn detect_indent(raw: &str) -> String {
    raw.lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            line.chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect::<String>()
        })
        .filter(|indent| !indent.is_empty())
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}
