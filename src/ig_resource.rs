//! `ImplementationGuide` resource generation.
//!
//! Builds a FHIR R4 `ImplementationGuide.json` for a generated guide folder.
//! The page hierarchy comes from the generated `Home/` tree; the resource
//! list comes from re-reading the input folder's `resources/` and
//! `examples/` folders, since the generated tree only has their pages.
//!
//! ```json
//! {
//!   "resourceType": "ImplementationGuide",
//!   "id": "example.fhir.ig",
//!   "url": "http://example.org/fhir/ImplementationGuide/example.fhir.ig",
//!   "status": "draft",
//!   "fhirVersion": ["4.0.1"],
//!   "packageId": "example.fhir.ig",
//!   "definition": {
//!     "resource": [
//!       { "reference": { "reference": "ValueSet/colors" }, "exampleBoolean": false }
//!     ],
//!     "page": {
//!       "nameUrl": "Home",
//!       "title": "Home",
//!       "generation": "generated",
//!       "page": [
//!         { "nameUrl": "Home/index.page.md", "title": "Index", "generation": "markdown" }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! `guide.yaml` must carry `id`, `status`, `fhirVersion` and `canonical` for
//! this to work. [`preflight`] checks that against an input folder up front,
//! so callers can skip the resource instead of failing a whole run.

use crate::artifact::{ArtifactKind, ArtifactRecord, scan_artifacts};
use crate::config::{ConfigError, FieldProblem, GUIDE_FILE, GuideConfig, IgFields, IgStatus};
use crate::naming::{format_title, is_eligible_dir, is_page_file, page_sort_key, page_title};
use crate::toc::HOME_DIR;
use crate::types::{Generation, PageNode};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// File name of the generated resource, inside the guide folder.
pub const IG_RESOURCE_FILE: &str = "ImplementationGuide.json";

/// First line of the error list when `guide.yaml` lacks required fields.
pub const MISSING_FIELDS_HEADER: &str =
    "IG resource generation requires additional fields in guide.yaml:";

/// `guide.yaml` keys the resource needs.
pub const REQUIRED_IG_FIELDS: [&str; 4] = ["id", "status", "fhirVersion", "canonical"];

#[derive(Error, Debug)]
pub enum IgResourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pre-flight
// =============================================================================

/// Check an input folder's `guide.yaml` for the fields the resource needs.
///
/// Every problem is reported: each missing field, then an invalid status.
pub fn preflight(input: &Path) -> Result<IgFields, Vec<String>> {
    let config = match GuideConfig::load(input) {
        Ok(config) => config,
        Err(ConfigError::NotFound(_)) => return Err(vec![format!("{GUIDE_FILE} not found")]),
        Err(ConfigError::Yaml(e)) => {
            return Err(vec![format!("Error parsing {GUIDE_FILE}: {e}")]);
        }
        Err(_) => return Err(vec![format!("{GUIDE_FILE} is empty or invalid")]),
    };

    config.ig_fields().map_err(|problems| {
        let (missing, invalid): (Vec<_>, Vec<_>) = problems
            .into_iter()
            .partition(|p| matches!(p, FieldProblem::Missing(_)));
        missing
            .iter()
            .chain(invalid.iter())
            .map(|problem| match problem {
                FieldProblem::Missing(field) => format!(
                    "{GUIDE_FILE} is missing required field for IG resource generation: '{field}'"
                ),
                FieldProblem::InvalidStatus(value) => format!(
                    "Invalid status value '{value}'. Must be one of: {}",
                    IgStatus::allowed_values()
                ),
            })
            .collect()
    })
}

// =============================================================================
// Page tree
// =============================================================================

/// Build the page tree of a generated `Home/` folder.
///
/// Each folder lists its `*.page.md` files (index first, then by name) as
/// markdown leaves, followed by its eligible subfolders, recursively.
pub fn build_page_tree(home: &Path) -> std::io::Result<PageNode> {
    build_node(home, HOME_DIR.to_string(), format_title(HOME_DIR))
}

fn build_node(dir: &Path, name_url: String, title: String) -> std::io::Result<PageNode> {
    let mut pages = Vec::new();
    let mut folders = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type()?;
        if file_type.is_file() && is_page_file(&name) {
            pages.push(name);
        } else if file_type.is_dir() && is_eligible_dir(&name) {
            folders.push(name);
        }
    }
    pages.sort_by(|a, b| page_sort_key(a).cmp(&page_sort_key(b)));
    folders.sort();

    let mut children: Vec<PageNode> = pages
        .into_iter()
        .map(|page| PageNode {
            name_url: format!("{name_url}/{page}"),
            title: page_title(&page),
            generation: Generation::Markdown,
            children: Vec::new(),
        })
        .collect();
    for folder in folders {
        children.push(build_node(
            &dir.join(&folder),
            format!("{name_url}/{folder}"),
            format_title(&folder),
        )?);
    }

    Ok(PageNode {
        name_url,
        title,
        generation: Generation::Generated,
        children,
    })
}

// =============================================================================
// Resource model
// =============================================================================

/// The subset of an R4 `ImplementationGuide` this tool writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationGuide {
    pub resource_type: &'static str,
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: IgStatus,
    pub fhir_version: Vec<String>,
    pub package_id: String,
    pub definition: ImplementationGuideDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImplementationGuideDefinition {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<ImplementationGuideResource>,
    pub page: ImplementationGuidePage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationGuideResource {
    pub reference: ResourceReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_boolean: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceReference {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationGuidePage {
    pub name_url: String,
    pub title: String,
    pub generation: Generation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub page: Vec<ImplementationGuidePage>,
}

impl From<&PageNode> for ImplementationGuidePage {
    fn from(node: &PageNode) -> Self {
        Self {
            name_url: node.name_url.clone(),
            title: node.title.clone(),
            generation: node.generation,
            page: node.children.iter().map(Self::from).collect(),
        }
    }
}

impl From<&ArtifactRecord> for ImplementationGuideResource {
    fn from(record: &ArtifactRecord) -> Self {
        let (example_canonical, example_boolean) = if record.is_example() {
            match &record.example_canonical {
                Some(profile) => (Some(profile.clone()), None),
                None => (None, Some(true)),
            }
        } else {
            (None, Some(false))
        };
        Self {
            reference: ResourceReference {
                reference: record.reference(),
            },
            name: record.name.clone(),
            description: record.description.clone(),
            example_canonical,
            example_boolean,
        }
    }
}

impl ImplementationGuide {
    /// Assemble the resource from `guide.yaml` fields, the page tree and the artifacts.
    pub fn new(fields: &IgFields, root: &PageNode, artifacts: &[ArtifactRecord]) -> Self {
        let canonical = fields.canonical.trim().trim_end_matches('/');
        Self {
            resource_type: "ImplementationGuide",
            id: fields.id.clone(),
            url: format!("{canonical}/ImplementationGuide/{}", fields.id),
            version: fields.version.clone(),
            name: fields.title.as_ref().map(|t| t.replace(' ', "")),
            title: fields.title.clone(),
            status: fields.status,
            fhir_version: vec![fields.fhir_version.clone()],
            package_id: fields.id.clone(),
            definition: ImplementationGuideDefinition {
                resource: artifacts.iter().map(ImplementationGuideResource::from).collect(),
                page: ImplementationGuidePage::from(root),
            },
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Result of one [`build_ig_resource`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgResourceOutcome {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    /// Nodes in `definition.page`, root included.
    pub page_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Write `ImplementationGuide.json` into the generated guide folder `guide_dir`.
///
/// With `input`, `definition.resource` lists that input's artifacts. Failures
/// are reported in the outcome, never returned as `Err`.
pub fn build_ig_resource(guide_dir: &Path, input: Option<&Path>) -> IgResourceOutcome {
    let mut outcome = IgResourceOutcome::default();
    info!("Generating {IG_RESOURCE_FILE} for {}", guide_dir.display());

    let fields = match load_fields(guide_dir) {
        Ok(fields) => fields,
        Err(errors) => {
            outcome.errors = errors;
            return outcome;
        }
    };

    let home = guide_dir.join(HOME_DIR);
    if !home.is_dir() {
        outcome
            .errors
            .push(format!("Home directory not found: {}", home.display()));
        return outcome;
    }

    match write_resource(guide_dir, &home, input, &fields, &mut outcome) {
        Ok(path) => {
            info!(
                "Generated {} ({} pages)",
                path.display(),
                outcome.page_count
            );
            outcome.output_path = Some(path);
            outcome.success = true;
        }
        Err(e) => outcome
            .errors
            .push(format!("Error generating ImplementationGuide resource: {e}")),
    }
    outcome
}

/// Re-check the generated guide's own copy of `guide.yaml`.
fn load_fields(guide_dir: &Path) -> Result<IgFields, Vec<String>> {
    let config = match GuideConfig::load(guide_dir) {
        Ok(config) => config,
        Err(ConfigError::NotFound(_)) => {
            return Err(vec![format!("{GUIDE_FILE} not found in output directory")]);
        }
        Err(e) => return Err(vec![format!("Error reading {GUIDE_FILE}: {e}")]),
    };
    config.ig_fields().map_err(|problems| {
        let mut errors = vec![MISSING_FIELDS_HEADER.to_string()];
        errors.extend(problems.iter().map(|problem| match problem {
            FieldProblem::Missing(field) => {
                format!("Missing required field '{field}' in {GUIDE_FILE}")
            }
            FieldProblem::InvalidStatus(value) => format!(
                "Invalid status value '{value}'. Must be one of: {}",
                IgStatus::allowed_values()
            ),
        }));
        errors
    })
}

fn write_resource(
    guide_dir: &Path,
    home: &Path,
    input: Option<&Path>,
    fields: &IgFields,
    outcome: &mut IgResourceOutcome,
) -> Result<PathBuf, IgResourceError> {
    let root = build_page_tree(home)?;
    outcome.page_count = root.count();

    let mut artifacts = Vec::new();
    if let Some(input) = input {
        for kind in [ArtifactKind::Resource, ArtifactKind::Example] {
            let scan = scan_artifacts(input, kind);
            artifacts.extend(scan.records);
            outcome.warnings.extend(scan.skipped);
        }
        info!("Collected {} resources for definition.resource", artifacts.len());
    } else {
        warn!("No input folder given, definition.resource will be empty");
    }

    let guide = ImplementationGuide::new(fields, &root, &artifacts);
    let mut json = serde_json::to_string_pretty(&guide)?;
    json.push('\n');

    let path = guide_dir.join(IG_RESOURCE_FILE);
    let tmp = guide_dir.join(format!(".{IG_RESOURCE_FILE}.tmp"));
    fs::write(&tmp, json)?;
    fs::rename(&tmp, &path)?;
    Ok(path)
}
