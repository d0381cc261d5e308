//! Input folder validation.
//!
//! Checks that an input folder has everything generation needs, without
//! touching it. Checks run in order and the first structural problem stops
//! the run; it becomes the report's single error:
//!
//! 1. the input folder exists
//! 2. `resources/ examples/ pages/ styles/ pagetemplates-artifacts/` exist
//! 3. `guide.yaml` exists, is a non-empty mapping with `title`, `url-key`
//!    and `style-name`
//! 4. `styles/<style-name>/` exists with `master.html`, `settings.style`
//!    and `style.css`
//!
//! After that everything is informational: optional folders, file counts,
//! and whether `guide.yaml` is ready for an `ImplementationGuide` resource.
//! Those only ever add warnings.

use crate::artifact::{EXAMPLES_DIR, RESOURCES_DIR, json_files};
use crate::config::{
    ConfigError, FieldProblem, GUIDE_FILE, GuideConfig, IgStatus, VARIABLES_FILE, VariablesConfig,
};
use crate::naming::{PAGETEMPLATES_DIR, is_markdown, is_plain_name};
use crate::template::ARTIFACT_TEMPLATES_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const PAGES_DIR: &str = "pages";
pub const STYLES_DIR: &str = "styles";
pub const IMAGES_DIR: &str = "images";

/// Folders every input must have.
pub const REQUIRED_FOLDERS: [&str; 5] = [
    RESOURCES_DIR,
    EXAMPLES_DIR,
    PAGES_DIR,
    STYLES_DIR,
    ARTIFACT_TEMPLATES_DIR,
];

/// Folders an input may have.
pub const OPTIONAL_FOLDERS: [&str; 2] = [IMAGES_DIR, PAGETEMPLATES_DIR];

pub const REQUIRED_FILES: [&str; 1] = [GUIDE_FILE];

/// Files every style folder must have.
pub const REQUIRED_STYLE_FILES: [&str; 3] = ["master.html", "settings.style", "style.css"];

/// A structural problem that makes an input unusable.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("Missing required folders in input directory: {}", .0.join(", "))]
    MissingFolders(Vec<&'static str>),
    #[error("Missing required files in input directory: {}", .0.join(", "))]
    MissingFiles(Vec<&'static str>),
    #[error("guide.yaml is missing required '{field}' field{}", field_hint(.field))]
    MissingField { field: &'static str },
    #[error(
        "Invalid url-key '{0}' in guide.yaml\n   It names the output folder and must be a single folder name, without '/', '\\' or '..'"
    )]
    InvalidUrlKey(String),
    #[error(
        "Style folder not found: styles/{0}\n   The folder name must match the 'style-name' value in guide.yaml"
    )]
    StyleNotFound(String),
    #[error("Missing required style files in styles/{style}: {}", .missing.join(", "))]
    MissingStyleFiles {
        style: String,
        missing: Vec<&'static str>,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn field_hint(field: &str) -> &'static str {
    match field {
        "url-key" => "\n   This field is used to determine the output directory name",
        "style-name" => "\n   This field must match the name of the subfolder in styles/",
        _ => "",
    }
}

/// File counts of a valid input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCounts {
    /// `*.json` directly under `resources/`.
    pub resources: usize,
    /// `*.json` directly under `examples/`.
    pub examples: usize,
    /// Markdown files anywhere under `pages/`.
    pub pages: usize,
    /// Files directly under the style folder.
    pub styles: usize,
    /// Markdown files directly under `pagetemplates/`.
    pub pagetemplates: usize,
}

/// Outcome of validating one input folder.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub input_dir: PathBuf,
    pub is_valid: bool,
    /// Trimmed `url-key`: the generated guide's folder name.
    pub guide_name: Option<String>,
    pub guide_title: Option<String>,
    pub style_name: Option<String>,
    pub file_counts: FileCounts,
    pub has_images_folder: bool,
    /// Number of entries in `variables.yaml`, if it loaded.
    pub variable_count: Option<usize>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Whether `guide.yaml` has everything an `ImplementationGuide` needs.
    pub has_ig_resource_fields: bool,
    /// Labels of missing or invalid IG fields, e.g. `status (invalid value)`.
    pub missing_ig_fields: Vec<String>,
    pub ig_resource_id: Option<String>,
    pub ig_resource_status: Option<IgStatus>,
    pub ig_resource_fhir_version: Option<String>,
    pub ig_resource_canonical: Option<String>,
}

/// Validate the input folder at `input`. Never fails: problems end up in
/// [`ValidationReport::errors`].
pub fn validate(input: &Path) -> ValidationReport {
    let mut report = ValidationReport {
        input_dir: input.to_path_buf(),
        ..Default::default()
    };
    if let Err(e) = run_checks(input, &mut report) {
        warn!("{e}");
        report.errors.push(e.to_string());
    }
    report.is_valid = report.errors.is_empty();
    report
}

fn run_checks(input: &Path, report: &mut ValidationReport) -> Result<(), ValidationError> {
    if !input.exists() {
        return Err(ValidationError::InputNotFound(input.to_path_buf()));
    }
    info!("Validating input directory: {}", input.display());

    let missing: Vec<&'static str> = REQUIRED_FOLDERS
        .into_iter()
        .filter(|f| !input.join(f).is_dir())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFolders(missing));
    }
    debug!("found required folders: {}", REQUIRED_FOLDERS.join(", "));

    let missing: Vec<&'static str> = REQUIRED_FILES
        .into_iter()
        .filter(|f| !input.join(f).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFiles(missing));
    }

    let config = GuideConfig::load(input)?;
    let title = required(&config, "title")?;
    let url_key = required(&config, "url-key")?;
    let style_name = required(&config, "style-name")?;
    if !is_plain_name(&url_key) {
        return Err(ValidationError::InvalidUrlKey(url_key));
    }
    info!("Loaded {GUIDE_FILE}: title '{title}', style '{style_name}'");
    report.guide_title = Some(title);
    report.guide_name = Some(url_key);
    report.style_name = Some(style_name.clone());

    match VariablesConfig::load(input) {
        Ok(Some(vars)) => {
            debug!("loaded {VARIABLES_FILE} ({} variables)", vars.len());
            report.variable_count = Some(vars.len());
            if vars.is_empty() {
                report.warnings.push(format!(
                    "{VARIABLES_FILE} defines no text values; only artifact values will fill {{{{ig-var}}}} placeholders"
                ));
            }
        }
        Ok(None) => debug!("{VARIABLES_FILE} not found (optional)"),
        Err(e) => warn!("ignoring {VARIABLES_FILE}: {e}"),
    }

    check_optional_folders(input, report);
    check_style(input, &style_name)?;
    report.file_counts = count_files(input, &style_name);
    check_ig_fields(&config, report);
    Ok(())
}

fn required(config: &GuideConfig, field: &'static str) -> Result<String, ValidationError> {
    config
        .get(field)
        .ok_or(ValidationError::MissingField { field })
}

fn check_optional_folders(input: &Path, report: &mut ValidationReport) {
    let images = input.join(IMAGES_DIR);
    if images.is_dir() {
        report.has_images_folder = true;
        debug!("found optional folder {IMAGES_DIR}");
    }

    let pagetemplates = input.join(PAGETEMPLATES_DIR);
    if pagetemplates.is_dir() && count_markdown_in(&pagetemplates) == 0 {
        report.warnings.push(format!(
            "Optional folder '{PAGETEMPLATES_DIR}' is empty (no .md files found)"
        ));
    }
}

fn check_style(input: &Path, style_name: &str) -> Result<(), ValidationError> {
    let style_dir = input.join(STYLES_DIR).join(style_name);
    if !style_dir.is_dir() {
        return Err(ValidationError::StyleNotFound(style_name.to_string()));
    }
    let missing: Vec<&'static str> = REQUIRED_STYLE_FILES
        .into_iter()
        .filter(|f| !style_dir.join(f).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingStyleFiles {
            style: style_name.to_string(),
            missing,
        });
    }
    debug!("style folder {STYLES_DIR}/{style_name} is complete");
    Ok(())
}

fn count_files(input: &Path, style_name: &str) -> FileCounts {
    let pages = WalkDir::new(input.join(PAGES_DIR))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
        .count();
    let styles = fs::read_dir(input.join(STYLES_DIR).join(style_name))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0);

    FileCounts {
        resources: json_files(&input.join(RESOURCES_DIR)).len(),
        examples: json_files(&input.join(EXAMPLES_DIR)).len(),
        pages,
        styles,
        pagetemplates: count_markdown_in(&input.join(PAGETEMPLATES_DIR)),
    }
}

/// Markdown files directly under `dir`; zero if it can't be read.
fn count_markdown_in(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file() && is_markdown(&e.path()))
                .count()
        })
        .unwrap_or(0)
}

fn check_ig_fields(config: &GuideConfig, report: &mut ValidationReport) {
    report.ig_resource_id = config.get("id");
    report.ig_resource_status = config.get("status").and_then(|s| s.parse().ok());
    report.ig_resource_fhir_version = config.get("fhirVersion");
    report.ig_resource_canonical = config.get("canonical");

    match config.ig_fields() {
        Ok(_) => {
            report.has_ig_resource_fields = true;
            debug!("all ImplementationGuide fields present");
        }
        Err(problems) => {
            for problem in &problems {
                if let FieldProblem::InvalidStatus(value) = problem {
                    report.warnings.push(format!(
                        "Invalid status value '{value}' for IG resource generation. Must be one of: {}",
                        IgStatus::allowed_values()
                    ));
                }
            }
            report.missing_ig_fields = problems.iter().map(FieldProblem::label).collect();
            info!(
                "Missing IG resource fields: {} (only needed for ImplementationGuide.json)",
                report.missing_ig_fields.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn fixture_input_is_valid() {
        let tmp = setup_input();
        let report = validate(tmp.path());
        assert!(report.is_valid, "errors: {:?}", report.errors);
        assert_eq!(report.guide_name.as_deref(), Some("example-guide"));
        assert_eq!(report.guide_title.as_deref(), Some("Example Guide"));
        assert_eq!(report.style_name.as_deref(), Some("custom"));
        assert!(report.has_images_folder);
        assert!(report.has_ig_resource_fields);
        assert_eq!(report.ig_resource_status, Some(IgStatus::Draft));
        assert_eq!(report.variable_count, Some(2));
    }

    #[test]
    fn fixture_file_counts() {
        let tmp = setup_input();
        let counts = validate(tmp.path()).file_counts;
        assert_eq!(
            counts,
            FileCounts {
                resources: 4,
                examples: 2,
                pages: 3,
                styles: 3,
                pagetemplates: 1,
            }
        );
    }

    #[test]
    fn missing_input_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let report = validate(&tmp.path().join("nope"));
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Input directory not found: "));
    }

    #[test]
    fn missing_folders_are_listed_jointly() {
        let tmp = setup_input();
        fs::remove_dir_all(tmp.path().join(EXAMPLES_DIR)).unwrap();
        fs::remove_dir_all(tmp.path().join(ARTIFACT_TEMPLATES_DIR)).unwrap();
        let report = validate(tmp.path());
        assert_eq!(
            report.errors,
            vec!["Missing required folders in input directory: examples, pagetemplates-artifacts"]
        );
    }

    #[test]
    fn missing_guide_file() {
        let tmp = setup_input();
        fs::remove_file(tmp.path().join(GUIDE_FILE)).unwrap();
        let report = validate(tmp.path());
        assert_eq!(
            report.errors,
            vec!["Missing required files in input directory: guide.yaml"]
        );
    }

    #[test]
    fn empty_guide_file() {
        let tmp = setup_input();
        fs::write(tmp.path().join(GUIDE_FILE), "").unwrap();
        assert_eq!(validate(tmp.path()).errors, vec!["guide.yaml is empty"]);
    }

    #[test]
    fn missing_url_key_has_hint() {
        let tmp = setup_input();
        fs::write(
            tmp.path().join(GUIDE_FILE),
            "title: X\nstyle-name: custom\n",
        )
        .unwrap();
        let report = validate(tmp.path());
        assert!(!report.is_valid);
        assert_eq!(
            report.errors[0],
            "guide.yaml is missing required 'url-key' field\n   This field is used to determine the output directory name"
        );
    }

    #[test]
    fn url_key_must_be_a_single_folder_name() {
        let tmp = setup_input();
        for key in ["../victim", "/tmp/guide", "a/b", ".."] {
            fs::write(
                tmp.path().join(GUIDE_FILE),
                format!("title: X\nurl-key: {key}\nstyle-name: custom\n"),
            )
            .unwrap();
            let report = validate(tmp.path());
            assert!(!report.is_valid, "accepted url-key {key}");
            assert!(
                report.errors[0].starts_with(&format!("Invalid url-key '{key}' in guide.yaml")),
                "{:?}",
                report.errors
            );
        }
    }

    #[test]
    fn unknown_style_folder() {
        let tmp = setup_input();
        fs::write(
            tmp.path().join(GUIDE_FILE),
            "title: X\nurl-key: x\nstyle-name: fancy\n",
        )
        .unwrap();
        let report = validate(tmp.path());
        assert!(report.errors[0].starts_with("Style folder not found: styles/fancy"));
    }

    #[test]
    fn missing_style_files_are_listed_jointly() {
        let tmp = setup_input();
        let style = tmp.path().join("styles/custom");
        fs::remove_file(style.join("master.html")).unwrap();
        fs::remove_file(style.join("style.css")).unwrap();
        let report = validate(tmp.path());
        assert_eq!(
            report.errors,
            vec!["Missing required style files in styles/custom: master.html, style.css"]
        );
    }

    #[test]
    fn empty_pagetemplates_is_a_warning_only() {
        let tmp = setup_input();
        let dir = tmp.path().join(PAGETEMPLATES_DIR);
        fs::remove_dir_all(&dir).unwrap();
        fs::create_dir_all(&dir).unwrap();
        let report = validate(tmp.path());
        assert!(report.is_valid);
        assert!(
            report
                .warnings
                .contains(&"Optional folder 'pagetemplates' is empty (no .md files found)".to_string())
        );
    }

    #[test]
    fn variables_without_text_values_is_a_warning_only() {
        let tmp = setup_input();
        fs::write(tmp.path().join(VARIABLES_FILE), "colors: [red, green]
").unwrap();
        let report = validate(tmp.path());
        assert!(report.is_valid);
        assert_eq!(report.variable_count, Some(0));
        assert!(report.warnings.contains(
            &"variables.yaml defines no text values; only artifact values will fill {{ig-var}} placeholders"
                .to_string()
        ));
    }

    #[test]
    fn invalid_status_is_a_warning_only() {
        let tmp = setup_input();
        fs::write(
            tmp.path().join(GUIDE_FILE),
            "title: X\nurl-key: x\nstyle-name: custom\nid: a\nstatus: pending\nfhirVersion: 4.0.1\ncanonical: http://x\n",
        )
        .unwrap();
        let report = validate(tmp.path());
        assert!(report.is_valid);
        assert!(!report.has_ig_resource_fields);
        assert_eq!(report.missing_ig_fields, vec!["status (invalid value)"]);
        assert!(report.warnings.iter().any(|w| w.contains(
            "Invalid status value 'pending' for IG resource generation. Must be one of: draft, active, retired, unknown"
        )));
    }

    #[test]
    fn missing_ig_fields_do_not_invalidate() {
        let tmp = setup_input();
        fs::write(
            tmp.path().join(GUIDE_FILE),
            "title: X\nurl-key: x\nstyle-name: custom\n",
        )
        .unwrap();
        let report = validate(tmp.path());
        assert!(report.is_valid);
        assert_eq!(
            report.missing_ig_fields,
            vec!["id", "status", "fhirVersion", "canonical"]
        );
    }
}
