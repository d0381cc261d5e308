//! Guide configuration module.
//!
//! Handles loading `guide.yaml` and the optional `variables.yaml` from an
//! input folder (or from a generated guide folder, which carries a verbatim
//! copy of both).
//!
//! ## guide.yaml
//!
//! ```yaml
//! title: My Implementation Guide       # required
//! url-key: my-implementation-guide     # required, names the output folder
//! style-name: custom                   # required, a folder under styles/
//!
//! menu:                                # optional, ordered
//!   Home: index.md                     # a page (renamed to index.page.md)
//!   Guidance: true                     # the folder `guidance`
//!   Artifacts: artifacts               # a folder by literal name
//!
//! # Needed only for ImplementationGuide.json
//! id: example.fhir.ig
//! status: draft                        # draft | active | retired | unknown
//! fhirVersion: 4.0.1
//! canonical: http://example.org/fhir
//! version: 0.1.0                       # optional
//! ```
//!
//! Scalars are read as strings whatever their YAML type, so `fhirVersion: 4.0`
//! reads as `"4.0"`. Mapping order is preserved; the menu relies on it.
//!
//! ## variables.yaml
//!
//! A flat mapping of names to values, available to `{{ig-var: name}}`
//! placeholders in artifact page templates.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Root configuration file of an input (and generated) guide folder.
pub const GUIDE_FILE: &str = "guide.yaml";

/// Optional variables file next to [`GUIDE_FILE`].
pub const VARIABLES_FILE: &str = "variables.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("{0} must contain a mapping of keys to values")]
    NotMapping(&'static str),
}

// =============================================================================
// guide.yaml
// =============================================================================

/// Parsed `guide.yaml`.
///
/// Kept as an ordered YAML mapping rather than a fixed struct: the file is
/// shared with the external renderer, which owns most of its keys.
#[derive(Debug, Clone, Default)]
pub struct GuideConfig {
    values: Mapping,
}

impl GuideConfig {
    /// Load `guide.yaml` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(GUIDE_FILE);
        if !path.is_file() {
            return Err(ConfigError::NotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        content.parse()
    }

    /// A trimmed, non-empty scalar value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn title(&self) -> Option<String> {
        self.get("title")
    }

    /// The `url-key`, which names the generated guide folder.
    pub fn url_key(&self) -> Option<String> {
        self.get("url-key")
    }

    pub fn style_name(&self) -> Option<String> {
        self.get("style-name")
    }

    /// The `menu` entries in file order, or `None` if there is no `menu` mapping.
    ///
    /// `Name: true` targets the folder `name` (lower-cased key), `Name: x.md`
    /// targets a page, any other string targets a folder of that literal name.
    /// `false` and non-scalar values are dropped.
    pub fn menu(&self) -> Option<Vec<MenuItem>> {
        let Value::Mapping(menu) = self.values.get("menu")? else {
            return None;
        };
        let items = menu
            .iter()
            .filter_map(|(key, value)| {
                let name = scalar_to_string(key)?;
                let target = match value {
                    Value::Bool(true) => MenuTarget::Folder(name.to_lowercase()),
                    Value::String(s) if has_md_suffix(s) => MenuTarget::Page(s.clone()),
                    Value::String(s) => MenuTarget::Folder(s.clone()),
                    _ => return None,
                };
                Some(MenuItem { name, target })
            })
            .collect();
        Some(items)
    }

    /// Check the fields an `ImplementationGuide` resource needs.
    ///
    /// Every problem is reported, not just the first.
    pub fn ig_fields(&self) -> Result<IgFields, Vec<FieldProblem>> {
        let mut problems = Vec::new();

        let id = self.get("id");
        if id.is_none() {
            problems.push(FieldProblem::Missing("id"));
        }

        let status = match self.get("status") {
            None => {
                problems.push(FieldProblem::Missing("status"));
                None
            }
            Some(raw) => match raw.parse::<IgStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    problems.push(FieldProblem::InvalidStatus(raw.to_lowercase()));
                    None
                }
            },
        };

        let fhir_version = self.get("fhirVersion");
        if fhir_version.is_none() {
            problems.push(FieldProblem::Missing("fhirVersion"));
        }

        let canonical = self.get("canonical");
        if canonical.is_none() {
            problems.push(FieldProblem::Missing("canonical"));
        }

        match (id, status, fhir_version, canonical) {
            (Some(id), Some(status), Some(fhir_version), Some(canonical)) => Ok(IgFields {
                id,
                status,
                fhir_version,
                canonical,
                version: self.get("version"),
                title: self.get("title"),
            }),
            _ => Err(problems),
        }
    }
}

impl FromStr for GuideConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        parse_mapping(content, GUIDE_FILE).map(|values| Self { values })
    }
}

/// One `menu` entry of `guide.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Display name (the mapping key).
    pub name: String,
    pub target: MenuTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    /// A folder under `Home/`.
    Folder(String),
    /// A Markdown page reference as written in the menu, e.g. `index.md`.
    Page(String),
}

fn has_md_suffix(s: &str) -> bool {
    s.to_ascii_lowercase().ends_with(".md")
}

// =============================================================================
// ImplementationGuide fields
// =============================================================================

/// `ImplementationGuide.status` value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgStatus {
    Draft,
    Active,
    Retired,
    Unknown,
}

impl IgStatus {
    pub const ALL: [IgStatus; 4] = [Self::Draft, Self::Active, Self::Retired, Self::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Retired => "retired",
            Self::Unknown => "unknown",
        }
    }

    /// `draft, active, retired, unknown`
    pub fn allowed_values() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl FromStr for IgStatus {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or(wanted)
    }
}

impl fmt::Display for IgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `guide.yaml` values an `ImplementationGuide` resource is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgFields {
    pub id: String,
    pub status: IgStatus,
    pub fhir_version: String,
    pub canonical: String,
    pub version: Option<String>,
    pub title: Option<String>,
}

/// Why `guide.yaml` cannot back an `ImplementationGuide` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing(&'static str),
    /// The (lower-cased) status value that is not in [`IgStatus`].
    InvalidStatus(String),
}

impl FieldProblem {
    /// Short label used in "missing fields" summaries: `id`, `status (invalid value)`.
    pub fn label(&self) -> String {
        match self {
            Self::Missing(field) => (*field).to_string(),
            Self::InvalidStatus(_) => "status (invalid value)".to_string(),
        }
    }
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "missing required field '{field}'"),
            Self::InvalidStatus(value) => write!(
                f,
                "invalid status value '{value}'. Must be one of: {}",
                IgStatus::allowed_values()
            ),
        }
    }
}

// =============================================================================
// variables.yaml
// =============================================================================

/// Parsed `variables.yaml`: name → replacement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariablesConfig {
    values: BTreeMap<String, String>,
}

impl VariablesConfig {
    /// Load `variables.yaml` from `dir`.
    ///
    /// Returns `Ok(None)` if the file does not exist. An empty file is
    /// [`ConfigError::Empty`] so callers can tell it apart from a missing one.
    pub fn load(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(VARIABLES_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        content.parse().map(Some)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromStr for VariablesConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mapping = parse_mapping(content, VARIABLES_FILE)?;
        let values = mapping
            .iter()
            .filter_map(|(k, v)| Some((scalar_to_string(k)?, scalar_to_string(v)?)))
            .collect();
        Ok(Self { values })
    }
}

// =============================================================================
// Shared parsing
// =============================================================================

fn parse_mapping(content: &str, file: &'static str) -> Result<Mapping, ConfigError> {
    if is_blank_document(content) {
        return Err(ConfigError::Empty(file));
    }
    match serde_yaml::from_str::<Value>(content)? {
        Value::Null => Err(ConfigError::Empty(file)),
        Value::Mapping(m) if m.is_empty() => Err(ConfigError::Empty(file)),
        Value::Mapping(m) => Ok(m),
        _ => Err(ConfigError::NotMapping(file)),
    }
}

/// Only whitespace, comments and document markers.
fn is_blank_document(content: &str) -> bool {
    content.lines().all(|line| {
        let t = line.trim();
        t.is_empty() || t.starts_with('#') || t == "---" || t == "..."
    })
}

/// Render a YAML scalar as a string; `None` for sequences, mappings and null.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
