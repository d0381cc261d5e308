//! Guide generation.
//!
//! Turns a validated input folder into the folder tree the external renderer
//! publishes. The steps run strictly in order:
//!
//! 1. validate the input (unless skipped)
//! 2. load `guide.yaml`, `variables.yaml` and the artifact templates
//! 3. **delete and recreate** `<output>/<url-key>/` with an empty `Home/`
//! 4. copy `guide.yaml`, `variables.yaml`, `styles/`, and `images/` (into `Home/`)
//! 5. copy `pages/` into `Home/`, renaming Markdown to `<stem>.page.md`
//! 6. copy `pagetemplates/` into `Home/`
//! 7. write one page per artifact under `Home/artifacts/`
//! 8. copy custom `*.index.md` type index pages
//! 9. write every `toc.yaml`
//!
//! Step 3 discards whatever a previous run left in the guide folder; there
//! is no merge. Two runs over the same input produce identical trees.
//!
//! ## Output Structure
//!
//! ```text
//! guides/example-guide/
//! ├── guide.yaml
//! ├── variables.yaml
//! ├── styles/custom/...
//! ├── toc.yaml                      # - {name: Home, filename: Home}
//! └── Home/
//!     ├── toc.yaml                  # from the menu
//!     ├── index.page.md
//!     ├── images/...
//!     ├── pagetemplates/...
//!     ├── guidance/
//!     │   ├── toc.yaml
//!     │   └── intro.page.md
//!     └── artifacts/
//!         ├── toc.yaml
//!         ├── index.page.md
//!         ├── valueset/
//!         │   ├── toc.yaml
//!         │   └── my-vs.page.md
//!         └── examples/
//!             ├── toc.yaml
//!             └── patient-1.page.md
//! ```

use crate::artifact::{ArtifactKind, ArtifactRecord, EXAMPLES_DIR, scan_artifacts};
use crate::config::{
    ConfigError, GUIDE_FILE, GuideConfig, MenuItem, VARIABLES_FILE, VariablesConfig,
};
use crate::naming::{INDEX_PAGE, PAGETEMPLATES_DIR, is_markdown, is_plain_name, page_file_name};
use crate::template::{
    ARTIFACT_TEMPLATES_DIR, ArtifactTemplates, EXAMPLE_KIND, index_template_type,
    resolve_variables,
};
use crate::toc::{
    self, ARTIFACTS_DIR, EXAMPLES_PAGE_DIR, HOME_DIR, TocError, artifact_folder_toc,
    artifacts_toc, directory_toc, menu_toc, root_toc, write_toc,
};
use crate::validate::{IMAGES_DIR, PAGES_DIR, STYLES_DIR, validate};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Body of the synthesized `Home/artifacts/index.page.md`.
pub const ARTIFACTS_INDEX_BODY: &str = "## {{page-title}}\n\n\
This section contains all the FHIR artifacts defined in this Implementation Guide.\n\n\
{{index:children}}\n";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Input validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Could not find url-key in guide.yaml")]
    MissingUrlKey,
    #[error("Invalid url-key '{0}' in guide.yaml: it must be a single folder name")]
    InvalidUrlKey(String),
    #[error("Pages directory not found: {}", .0.display())]
    PagesNotFound(PathBuf),
    #[error("Unexpected error during generation: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected error during generation: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Unexpected error during generation: {0}")]
    Toc(#[from] TocError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Skip input validation; a broken input then fails at whichever step trips on it.
    pub skip_validation: bool,
}

/// What a generation run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// `<output root>/<guide name>`
    pub output_path: PathBuf,
    /// Trimmed `url-key`.
    pub guide_name: String,
    pub resource_count: usize,
    pub example_count: usize,
    /// Files copied from `pages/`.
    pub page_count: usize,
    /// Root and `Home/` TOCs plus each derived folder TOC; artifact TOCs are not counted.
    pub toc_files_generated: usize,
    pub warnings: Vec<String>,
}

/// Generate `<output_root>/<url-key>/` from `input`.
pub fn generate(
    input: &Path,
    output_root: &Path,
    options: &GenerateOptions,
) -> Result<GenerationSummary, GenerateError> {
    let mut warnings = Vec::new();

    if !options.skip_validation {
        let report = validate(input);
        if !report.is_valid {
            return Err(GenerateError::ValidationFailed(report.errors));
        }
        warnings.extend(report.warnings);
    }

    let loaded = load_input(input)?;
    info!("Generating IG: {}", loaded.guide_name);

    let guide_dir = prepare_output(output_root, &loaded.guide_name)?;
    let home = guide_dir.join(HOME_DIR);

    copy_root_items(input, &guide_dir)?;
    let page_count = transform_pages(input, &home)?;
    copy_pagetemplates(input, &home)?;

    let artifacts = write_artifact_pages(input, &home, &loaded)?;
    warnings.extend(artifacts.skipped.iter().cloned());
    let custom_indexes = copy_index_pages(input, &home)?;

    let toc_files_generated = write_guide_tocs(&guide_dir, loaded.config.menu())?;
    write_artifact_tocs(&home, &artifacts, &custom_indexes)?;
    info!("Generated {toc_files_generated} toc.yaml files");

    let summary = GenerationSummary {
        output_path: guide_dir,
        guide_name: loaded.guide_name,
        resource_count: artifacts.resource_count(),
        example_count: artifacts.examples.len(),
        page_count,
        toc_files_generated,
        warnings,
    };
    info!("IG generation complete: {}", summary.output_path.display());
    Ok(summary)
}

// ============================================================================
// Stage: load configuration
// ============================================================================

struct LoadedInput {
    config: GuideConfig,
    guide_name: String,
    variables: Option<VariablesConfig>,
    templates: ArtifactTemplates,
}

fn load_input(input: &Path) -> Result<LoadedInput, GenerateError> {
    let config = GuideConfig::load(input)?;
    let guide_name = config.url_key().ok_or(GenerateError::MissingUrlKey)?;
    if !is_plain_name(&guide_name) {
        return Err(GenerateError::InvalidUrlKey(guide_name));
    }
    if config.menu().is_none() {
        warn!("No menu configuration found in {GUIDE_FILE}, Home TOC will be derived");
    }

    let variables = match VariablesConfig::load(input) {
        Ok(vars) => vars,
        Err(e) => {
            warn!("ignoring {VARIABLES_FILE}: {e}");
            None
        }
    };

    let templates = ArtifactTemplates::load(input)?;
    info!("Loaded {} artifact templates", templates.len());

    Ok(LoadedInput {
        config,
        guide_name,
        variables,
        templates,
    })
}

// ============================================================================
// Stage: output folder and passthrough copies
// ============================================================================

/// Recreate `<output_root>/<guide_name>/Home/`, removing any previous guide folder.
fn prepare_output(output_root: &Path, guide_name: &str) -> Result<PathBuf, GenerateError> {
    let guide_dir = output_root.join(guide_name);
    if guide_dir.exists() {
        warn!("Removing existing output directory: {}", guide_dir.display());
        fs::remove_dir_all(&guide_dir)?;
    }
    fs::create_dir_all(guide_dir.join(HOME_DIR))?;
    debug!("created {}", guide_dir.display());
    Ok(guide_dir)
}

fn copy_root_items(input: &Path, guide_dir: &Path) -> Result<(), GenerateError> {
    for file in [GUIDE_FILE, VARIABLES_FILE] {
        let src = input.join(file);
        if src.is_file() {
            fs::copy(&src, guide_dir.join(file))?;
        }
    }
    copy_tree(&input.join(STYLES_DIR), &guide_dir.join(STYLES_DIR))?;
    copy_tree(
        &input.join(IMAGES_DIR),
        &guide_dir.join(HOME_DIR).join(IMAGES_DIR),
    )?;
    Ok(())
}

fn copy_pagetemplates(input: &Path, home: &Path) -> Result<(), GenerateError> {
    let copied = copy_tree(&input.join(PAGETEMPLATES_DIR), &home.join(PAGETEMPLATES_DIR))?;
    if copied > 0 {
        debug!("copied {copied} page templates");
    }
    Ok(())
}

/// Copy every file under `src` into `dst`; a missing `src` copies nothing.
fn copy_tree(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    copy_tree_with(src, dst, |rel| rel.to_path_buf())
}

/// Like [`copy_tree`], with `rename` mapping each file's relative path.
fn copy_tree_with<F>(src: &Path, dst: &Path, rename: F) -> Result<usize, GenerateError>
where
    F: Fn(&Path) -> PathBuf,
{
    if !src.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rename(rel));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        count += 1;
    }
    Ok(count)
}

// ============================================================================
// Stage: pages
// ============================================================================

/// Copy `pages/` into `Home/`, Markdown renamed to `<lowercased-stem>.page.md`.
fn transform_pages(input: &Path, home: &Path) -> Result<usize, GenerateError> {
    let pages = input.join(PAGES_DIR);
    if !pages.is_dir() {
        return Err(GenerateError::PagesNotFound(pages));
    }
    let count = copy_tree_with(&pages, home, |rel| {
        if is_markdown(rel) {
            rel.with_file_name(page_file_name(rel))
        } else {
            rel.to_path_buf()
        }
    })?;
    info!("Transformed and copied {count} page files");
    Ok(count)
}

// ============================================================================
// Stage: artifact pages
// ============================================================================

/// Artifacts that got a page, grouped the way their folders are.
#[derive(Debug, Default)]
struct ArtifactPages {
    /// Resources by `resourceType`, each list in file-name order.
    by_type: BTreeMap<String, Vec<ArtifactRecord>>,
    examples: Vec<ArtifactRecord>,
    skipped: Vec<String>,
}

impl ArtifactPages {
    fn resource_count(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }
}

fn write_artifact_pages(
    input: &Path,
    home: &Path,
    loaded: &LoadedInput,
) -> Result<ArtifactPages, GenerateError> {
    let artifacts_dir = home.join(ARTIFACTS_DIR);
    fs::create_dir_all(&artifacts_dir)?;
    fs::write(artifacts_dir.join(INDEX_PAGE), ARTIFACTS_INDEX_BODY)?;

    let resources = scan_artifacts(input, ArtifactKind::Resource);
    let examples = scan_artifacts(input, ArtifactKind::Example);

    let mut pages = ArtifactPages {
        skipped: resources.skipped,
        ..Default::default()
    };
    pages.skipped.extend(examples.skipped);
    let resources = keep_plain_names(resources.records, &mut pages.skipped);
    pages.examples = keep_plain_names(examples.records, &mut pages.skipped);
    for record in resources {
        pages
            .by_type
            .entry(record.resource_type.clone())
            .or_default()
            .push(record);
    }

    let base = loaded.variables.as_ref();
    for (resource_type, records) in &pages.by_type {
        let type_dir = artifacts_dir.join(resource_type.to_lowercase());
        fs::create_dir_all(&type_dir)?;
        let template = loaded.templates.get(resource_type);

        for record in records {
            let url_key = format!("{resource_type}.url");
            let vars = BTreeMap::from([
                ("file-name", record.id.as_str()),
                (url_key.as_str(), record.url.as_deref().unwrap_or("")),
            ]);
            let content = match template {
                Some(template) => render(template, &vars, base),
                None => format!(
                    "# {id}\n\n*Resource Type: {resource_type}*\n\n<!-- No template found for {resource_type} -->\n",
                    id = record.id
                ),
            };
            fs::write(type_dir.join(format!("{}.page.md", record.id)), content)?;
        }
        info!("Created {} {resource_type} artifact pages", records.len());
    }

    // The folder follows the input folder; its TOC only exists with examples.
    if input.join(EXAMPLES_DIR).is_dir() {
        let examples_dir = artifacts_dir.join(EXAMPLES_PAGE_DIR);
        fs::create_dir_all(&examples_dir)?;
        let template = loaded.templates.get(EXAMPLE_KIND);

        for record in &pages.examples {
            let reference = record.reference();
            let vars = BTreeMap::from([
                ("file-name", record.id.as_str()),
                ("Resource.id", record.id.as_str()),
                ("ResourceType/Resource.id", reference.as_str()),
            ]);
            let content = match template {
                Some(template) => render(template, &vars, base),
                None => format!(
                    "# {id}\n\n*Example of {resource_type}*\n\n<!-- No template found for examples -->\n",
                    id = record.id,
                    resource_type = record.resource_type
                ),
            };
            fs::write(examples_dir.join(format!("{}.page.md", record.id)), content)?;
        }
        info!("Created {} example artifact pages", pages.examples.len());
    }

    Ok(pages)
}

/// Drop records whose id or type would not stay inside the artifacts folder
/// as a file or folder name, noting each in `skipped`.
fn keep_plain_names(
    records: Vec<ArtifactRecord>,
    skipped: &mut Vec<String>,
) -> Vec<ArtifactRecord> {
    records
        .into_iter()
        .filter(|record| {
            let usable = is_plain_name(&record.id) && is_plain_name(&record.resource_type);
            if !usable {
                let message = format!(
                    "Skipped {}: '{}' cannot be used as a page name",
                    record.source_path.display(),
                    record.reference()
                );
                warn!("{message}");
                skipped.push(message);
            }
            usable
        })
        .collect()
}

/// Fill a template from the artifact's own variables, falling back to `variables.yaml`.
fn render(template: &str, vars: &BTreeMap<&str, &str>, base: Option<&VariablesConfig>) -> String {
    resolve_variables(template, |name| {
        vars.get(name)
            .copied()
            .or_else(|| base.and_then(|b| b.get(name)))
    })
}

/// Copy `pagetemplates-artifacts/<type>.index.md` to `Home/artifacts/<type>/index.page.md`.
///
/// Returns the (lower-cased) types that now have a custom index.
fn copy_index_pages(input: &Path, home: &Path) -> Result<BTreeSet<String>, GenerateError> {
    let mut types = BTreeSet::new();
    let dir = input.join(ARTIFACT_TEMPLATES_DIR);
    let Ok(entries) = fs::read_dir(&dir) else {
        return Ok(types);
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(resource_type) = index_template_type(&name) else {
            continue;
        };
        let resource_type = resource_type.to_lowercase();
        let target_dir = home.join(ARTIFACTS_DIR).join(&resource_type);
        fs::create_dir_all(&target_dir)?;
        fs::copy(&path, target_dir.join(INDEX_PAGE))?;
        debug!("copied {name} -> {resource_type}/{INDEX_PAGE}");
        types.insert(resource_type);
    }
    if !types.is_empty() {
        info!("Copied {} artifact index pages", types.len());
    }
    Ok(types)
}

// ============================================================================
// Stage: TOCs
// ============================================================================

/// Root TOC, `Home/` TOC and the derived TOCs below `Home/`.
///
/// The count always includes root and `Home/`, plus each derived TOC written.
fn write_guide_tocs(
    guide_dir: &Path,
    menu: Option<Vec<MenuItem>>,
) -> Result<usize, GenerateError> {
    write_toc(guide_dir, &root_toc())?;

    let home = guide_dir.join(HOME_DIR);
    let home_entries = match menu {
        Some(menu) => menu_toc(&home, &menu),
        None => directory_toc(&home)?,
    };
    if home_entries.is_empty() {
        warn!("Home TOC has no entries, not written");
    } else {
        write_toc(&home, &home_entries)?;
        debug!("wrote {HOME_DIR}/toc.yaml ({} entries)", home_entries.len());
    }

    Ok(2 + toc::write_directory_tocs(&home)?)
}

/// `Home/artifacts/` TOCs. These are not part of the reported TOC count.
fn write_artifact_tocs(
    home: &Path,
    artifacts: &ArtifactPages,
    custom_indexes: &BTreeSet<String>,
) -> Result<(), GenerateError> {
    let artifacts_dir = home.join(ARTIFACTS_DIR);
    let types: Vec<&str> = artifacts.by_type.keys().map(String::as_str).collect();
    write_toc(
        &artifacts_dir,
        &artifacts_toc(
            artifacts_dir.join(INDEX_PAGE).is_file(),
            &types,
            !artifacts.examples.is_empty(),
        ),
    )?;

    for (resource_type, records) in &artifacts.by_type {
        let folder = resource_type.to_lowercase();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let entries = artifact_folder_toc(custom_indexes.contains(&folder), &ids);
        write_toc(&artifacts_dir.join(&folder), &entries)?;
    }

    if !artifacts.examples.is_empty() {
        let ids: Vec<&str> = artifacts.examples.iter().map(|r| r.id.as_str()).collect();
        let entries = artifact_folder_toc(custom_indexes.contains(EXAMPLES_PAGE_DIR), &ids);
        write_toc(&artifacts_dir.join(EXAMPLES_PAGE_DIR), &entries)?;
    }
    debug!("wrote artifact toc.yaml files");
    Ok(())
}
