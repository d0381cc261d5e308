//! FHIR artifact discovery.
//!
//! Artifacts are the JSON files directly under an input's `resources/`
//! (conformance resources such as ValueSet, CodeSystem, StructureDefinition)
//! and `examples/` (instances). A file only counts as an artifact if it parses
//! as JSON and carries both `resourceType` and `id`; anything else is skipped
//! with a warning and never aborts a run.
//!
//! Besides identity, each [`ArtifactRecord`] carries the display data the
//! `ImplementationGuide` resource wants: a `name` and `description` extracted
//! from whatever shape the resource uses for them (plain string, HumanName,
//! CodeableConcept), the `url` of conformance resources, and the first
//! `meta.profile` of examples.

use crate::naming::format_title;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Conformance resources folder of an input.
pub const RESOURCES_DIR: &str = "resources";

/// Example instances folder of an input.
pub const EXAMPLES_DIR: &str = "examples";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} is missing resourceType or id", path.display())]
    MissingIdentity { path: PathBuf },
}

/// Whether an artifact came from `resources/` or `examples/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Resource,
    Example,
}

impl ArtifactKind {
    /// The input folder this kind lives in.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Resource => RESOURCES_DIR,
            Self::Example => EXAMPLES_DIR,
        }
    }
}

/// One FHIR JSON file with a `resourceType` and an `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub resource_type: String,
    pub id: String,
    /// Source file name without `.json`.
    pub file_stem: String,
    pub source_path: PathBuf,
    /// Canonical `url`; conformance resources only.
    pub url: Option<String>,
    /// Display name: `name` as string or HumanName, else the title-cased id.
    pub name: Option<String>,
    /// `description` as string or CodeableConcept.
    pub description: Option<String>,
    /// First `meta.profile` entry; examples only.
    pub example_canonical: Option<String>,
}

impl ArtifactRecord {
    /// `ResourceType/id`
    pub fn reference(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }

    pub fn is_example(&self) -> bool {
        self.kind == ArtifactKind::Example
    }
}

/// Parse a single FHIR JSON file.
pub fn parse_artifact(path: &Path, kind: ArtifactKind) -> Result<ArtifactRecord, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let resource: Value = serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let missing = || ArtifactError::MissingIdentity {
        path: path.to_path_buf(),
    };
    let object = resource.as_object().ok_or_else(missing)?;
    let resource_type = identity_string(object.get("resourceType")).ok_or_else(missing)?;
    let id = identity_string(object.get("id")).ok_or_else(missing)?;

    let name = match object.get("name") {
        Some(raw) => extract_text(raw, TextShape::HumanName),
        None => None,
    }
    .filter(|n| !n.is_empty())
    .or_else(|| Some(format_title(&id)));

    let description = object
        .get("description")
        .and_then(|raw| extract_text(raw, TextShape::CodeableConcept))
        .filter(|d| !d.is_empty());

    let (url, example_canonical) = match kind {
        ArtifactKind::Resource => (non_empty_string(object.get("url")), None),
        ArtifactKind::Example => (None, first_profile(object)),
    };

    Ok(ArtifactRecord {
        kind,
        resource_type,
        id,
        file_stem: path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        source_path: path.to_path_buf(),
        url,
        name,
        description,
        example_canonical,
    })
}

/// Result of scanning one artifact folder.
#[derive(Debug, Default)]
pub struct ArtifactScan {
    /// Artifacts in file-name order.
    pub records: Vec<ArtifactRecord>,
    /// One message per skipped file.
    pub skipped: Vec<String>,
}

/// Scan `*.json` directly under `input/<kind folder>`, sorted by file name.
///
/// A missing folder yields an empty scan. Unreadable folders are treated the
/// same way; the caller's validation step is where a missing folder is an error.
pub fn scan_artifacts(input: &Path, kind: ArtifactKind) -> ArtifactScan {
    let dir = input.join(kind.dir_name());
    let mut scan = ArtifactScan::default();

    for path in json_files(&dir) {
        match parse_artifact(&path, kind) {
            Ok(record) => {
                debug!("found {} {}", record.resource_type, record.id);
                scan.records.push(record);
            }
            Err(e) => {
                warn!("skipping {e}");
                scan.skipped.push(format!("Skipped {e}"));
            }
        }
    }
    scan
}

/// `*.json` files directly under `dir`, sorted. Empty if `dir` can't be read.
pub fn json_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    files
}

// =============================================================================
// Field extraction
// =============================================================================

/// Which FHIR datatype a loosely-typed field is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextShape {
    /// `HumanName`: `text`, else `given[]` + `family`.
    HumanName,
    /// `CodeableConcept`: `text`, else the first `coding[].display`.
    CodeableConcept,
}

/// Readable text from a field that may be a string, an object of `shape`, or
/// a list of either (the first element wins). Never fails on shape mismatch.
pub fn extract_text(value: &Value, shape: TextShape) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(object) => match shape {
            TextShape::HumanName => human_name_text(object),
            TextShape::CodeableConcept => codeable_concept_text(object),
        },
        Value::Array(items) => items.first().and_then(|first| extract_text(first, shape)),
        _ => None,
    }
}

fn human_name_text(name: &Map<String, Value>) -> Option<String> {
    if let Some(text) = non_empty_string(name.get("text")) {
        return Some(text);
    }
    let mut parts: Vec<String> = name
        .get("given")
        .and_then(Value::as_array)
        .map(|given| given.iter().filter_map(scalar_text).collect())
        .unwrap_or_default();
    if let Some(family) = non_empty_string(name.get("family")) {
        parts.push(family);
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn codeable_concept_text(concept: &Map<String, Value>) -> Option<String> {
    if let Some(text) = non_empty_string(concept.get("text")) {
        return Some(text);
    }
    concept
        .get("coding")?
        .as_array()?
        .iter()
        .find_map(|coding| non_empty_string(coding.get("display")))
}

fn first_profile(resource: &Map<String, Value>) -> Option<String> {
    resource
        .get("meta")?
        .get("profile")?
        .as_array()?
        .first()
        .and_then(scalar_text)
}

/// `resourceType` / `id`: a non-empty string, or a number rendered as text.
fn identity_string(value: Option<&Value>) -> Option<String> {
    value.and_then(scalar_text).filter(|s| !s.is_empty())
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn parses_identity_and_url() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "ValueSet-colors.json",
            r#"{"resourceType":"ValueSet","id":"colors","url":"http://x/ValueSet/colors","name":"Colors"}"#,
        );
        let record = parse_artifact(&path, ArtifactKind::Resource).unwrap();
        assert_eq!(record.resource_type, "ValueSet");
        assert_eq!(record.id, "colors");
        assert_eq!(record.file_stem, "ValueSet-colors");
        assert_eq!(record.url.as_deref(), Some("http://x/ValueSet/colors"));
        assert_eq!(record.name.as_deref(), Some("Colors"));
        assert_eq!(record.reference(), "ValueSet/colors");
        assert!(!record.is_example());
    }

    #[test]
    fn missing_id_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "a.json", r#"{"resourceType":"Patient"}"#);
        assert!(matches!(
            parse_artifact(&path, ArtifactKind::Resource),
            Err(ArtifactError::MissingIdentity { .. })
        ));
    }

    #[test]
    fn empty_resource_type_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "a.json", r#"{"resourceType":"","id":"x"}"#);
        assert!(parse_artifact(&path, ArtifactKind::Resource).is_err());
    }

    #[test]
    fn invalid_json_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "a.json", "{not json");
        assert!(matches!(
            parse_artifact(&path, ArtifactKind::Resource),
            Err(ArtifactError::Json { .. })
        ));
    }

    #[test]
    fn name_falls_back_to_title_cased_id() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "a.json",
            r#"{"resourceType":"Patient","id":"example-patient"}"#,
        );
        let record = parse_artifact(&path, ArtifactKind::Example).unwrap();
        assert_eq!(record.name.as_deref(), Some("Example Patient"));
    }

    #[test]
    fn example_captures_first_profile_not_url() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "a.json",
            r#"{"resourceType":"Patient","id":"p1","url":"http://ignored",
                "meta":{"profile":["http://x/StructureDefinition/my-patient","http://other"]}}"#,
        );
        let record = parse_artifact(&path, ArtifactKind::Example).unwrap();
        assert_eq!(
            record.example_canonical.as_deref(),
            Some("http://x/StructureDefinition/my-patient")
        );
        assert_eq!(record.url, None);
        assert!(record.is_example());
    }

    #[test]
    fn human_name_prefers_text() {
        let value = json!([{"text": "Dr. Jane Roe", "given": ["Jane"], "family": "Roe"}]);
        assert_eq!(
            extract_text(&value, TextShape::HumanName).as_deref(),
            Some("Dr. Jane Roe")
        );
    }

    #[test]
    fn human_name_joins_given_and_family() {
        let value = json!([{"given": ["Jane", "Q"], "family": "Roe"}, {"text": "second"}]);
        assert_eq!(
            extract_text(&value, TextShape::HumanName).as_deref(),
            Some("Jane Q Roe")
        );
    }

    #[test]
    fn human_name_without_parts_is_none() {
        assert_eq!(extract_text(&json!({"use": "official"}), TextShape::HumanName), None);
        assert_eq!(extract_text(&json!([]), TextShape::HumanName), None);
        assert_eq!(extract_text(&json!(42), TextShape::HumanName), None);
    }

    #[test]
    fn codeable_concept_prefers_text_then_display() {
        assert_eq!(
            extract_text(
                &json!({"text": "Blood pressure", "coding": [{"display": "BP"}]}),
                TextShape::CodeableConcept
            )
            .as_deref(),
            Some("Blood pressure")
        );
        assert_eq!(
            extract_text(
                &json!({"coding": [{"code": "x"}, {"display": "BP"}]}),
                TextShape::CodeableConcept
            )
            .as_deref(),
            Some("BP")
        );
    }

    #[test]
    fn codeable_concept_list_recurses_into_first() {
        let value = json!([{"text": "first"}, {"text": "second"}]);
        assert_eq!(
            extract_text(&value, TextShape::CodeableConcept).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn scan_skips_bad_files_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(RESOURCES_DIR);
        fs::create_dir_all(&dir).unwrap();
        write(&dir, "b.json", r#"{"resourceType":"ValueSet","id":"b"}"#);
        write(&dir, "a.json", r#"{"resourceType":"CodeSystem","id":"a"}"#);
        write(&dir, "broken.json", "nope");
        write(&dir, "noid.json", r#"{"resourceType":"ValueSet"}"#);
        write(&dir, "notes.txt", "ignored");

        let scan = scan_artifacts(tmp.path(), ArtifactKind::Resource);
        let ids: Vec<&str> = scan.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(scan.skipped.len(), 2);
    }

    #[test]
    fn scan_of_missing_folder_is_empty() {
        let tmp = TempDir::new().unwrap();
        let scan = scan_artifacts(tmp.path(), ArtifactKind::Example);
        assert!(scan.records.is_empty());
        assert!(scan.skipped.is_empty());
    }
}
