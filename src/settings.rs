//! Persisted tool settings.
//!
//! The CLI remembers a few values between invocations (the last input folder,
//! the default output folder) in a JSON file under the working directory:
//!
//! ```text
//! .simplifier/ig-generation.settings.json
//! {
//!   "InputPath": "/work/my-guide/input",
//!   "DefaultOutputFolder": "guides"
//! }
//! ```
//!
//! The file is shared with other tooling, so keys this crate doesn't know
//! about are kept as-is when it is written back.

use crate::config::{GUIDE_FILE, VARIABLES_FILE};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Settings file location relative to the working directory.
pub const SETTINGS_PATH: &str = ".simplifier/ig-generation.settings.json";

/// Key of the last successfully used input folder.
pub const INPUT_PATH: &str = "InputPath";

/// Key of the output root used when `--output` is not given.
pub const DEFAULT_OUTPUT_FOLDER: &str = "DefaultOutputFolder";

/// Fallback for [`DEFAULT_OUTPUT_FOLDER`].
pub const DEFAULT_OUTPUT_DIR: &str = "guides";

/// String key-value store backed by a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Settings {
    /// Load from `path`. A missing or unparsable file yields an empty store.
    pub fn load(path: &Path) -> Self {
        let values = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    /// Load from [`SETTINGS_PATH`] under the current directory.
    pub fn load_default() -> io::Result<Self> {
        Ok(Self::load(&std::env::current_dir()?.join(SETTINGS_PATH)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A non-empty string value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), Value::String(value.into()));
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// The configured output root name, or [`DEFAULT_OUTPUT_DIR`].
    pub fn output_folder(&self) -> &str {
        self.get(DEFAULT_OUTPUT_FOLDER).unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    /// All string-valued entries in key order.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .values
            .iter()
            .filter_map(|(k, v)| Some((k.as_str(), v.as_str()?)))
            .collect();
        entries.sort();
        entries
    }

    /// Where the saved [`INPUT_PATH`] stands on disk, if one is saved.
    pub fn input_status(&self) -> Option<InputFolderStatus> {
        self.get(INPUT_PATH)
            .map(|path| InputFolderStatus::inspect(Path::new(path)))
    }

    /// Write back to the file this store was loaded from, creating parents.
    pub fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)
    }
}

/// Existence of an input folder and its configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFolderStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub has_guide: bool,
    pub has_variables: bool,
}

impl InputFolderStatus {
    pub fn inspect(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            exists: path.is_dir(),
            has_guide: path.join(GUIDE_FILE).is_file(),
            has_variables: path.join(VARIABLES_FILE).is_file(),
        }
    }
}
