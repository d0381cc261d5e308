//! Input folder scaffolding.
//!
//! `init` lays out a fresh input folder that passes validation as-is:
//!
//! ```text
//! input/
//! ├── guide.yaml
//! ├── variables.yaml              # when the template set has one
//! ├── resources/
//! ├── examples/
//! ├── images/
//! ├── pages/index.md
//! ├── pagetemplates/
//! ├── pagetemplates-artifacts/    # codesystem.md, structuredefinition.md, ...
//! └── styles/<style>/             # master.html, settings.style, style.css
//! ```
//!
//! Files come from a template set folder when one is found, otherwise a
//! minimal set is written. Existing files are never overwritten, which makes
//! `--force` on a populated folder safe: it only fills in what is missing.
//! Finally the placeholder `title:`, `url-key:` and `style-name:` lines of
//! `guide.yaml` are replaced with the requested guide and style names.

use crate::artifact::{EXAMPLES_DIR, RESOURCES_DIR};
use crate::config::{GUIDE_FILE, VARIABLES_FILE};
use crate::naming::{PAGETEMPLATES_DIR, url_key};
use crate::template::{ARTIFACT_TEMPLATES_DIR, TEMPLATE_FILES};
use crate::validate::{IMAGES_DIR, PAGES_DIR, STYLES_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Environment variable naming a template set folder.
pub const TEMPLATES_ENV: &str = "SIMPLIFIER_IG_TEMPLATES";

/// Template set folder name looked up next to the executable.
pub const TEMPLATES_DIR: &str = "templates";

const INIT_REQUIRED_FOLDERS: [&str; 4] = [
    RESOURCES_DIR,
    EXAMPLES_DIR,
    PAGES_DIR,
    ARTIFACT_TEMPLATES_DIR,
];
const INIT_OPTIONAL_FOLDERS: [&str; 2] = [IMAGES_DIR, PAGETEMPLATES_DIR];

const PLACEHOLDER_TITLE: &str = "title: My Implementation Guide";
const PLACEHOLDER_URL_KEY: &str = "url-key: my-implementation-guide";
const PLACEHOLDER_STYLE: &str = "style-name: custom";

#[derive(Error, Debug)]
pub enum InitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(
        "Directory is not empty: {}\nUse --force to initialize anyway (existing files will not be overwritten).",
        .0.display()
    )]
    NotEmpty(PathBuf),
}

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Human guide name; becomes `title` and, slugged, `url-key`.
    pub guide_name: String,
    /// Style folder name under `styles/`.
    pub style_name: String,
    /// Proceed even if the target folder has content.
    pub force: bool,
    /// Template set folder; `None` writes the minimal defaults.
    pub template_dir: Option<PathBuf>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            guide_name: "My Implementation Guide".to_string(),
            style_name: "custom".to_string(),
            force: false,
            template_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitSummary {
    pub output_path: PathBuf,
    pub folders_created: usize,
    pub files_created: usize,
    /// Whether files came from a template set rather than the minimal defaults.
    pub used_template_set: bool,
    pub warnings: Vec<String>,
}

/// Locate a template set: `explicit`, then `$SIMPLIFIER_IG_TEMPLATES`, then
/// `templates/` next to the executable. Only existing folders count.
pub fn find_template_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    let from_env = std::env::var_os(TEMPLATES_ENV).map(PathBuf::from);
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(TEMPLATES_DIR)));

    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(from_env)
        .chain(beside_exe)
        .find(|dir| dir.is_dir())
}

/// Scaffold an input folder at `target`.
pub fn initialize(target: &Path, options: &InitOptions) -> Result<InitSummary, InitError> {
    let mut summary = InitSummary {
        output_path: target.to_path_buf(),
        ..Default::default()
    };

    if target.exists() && fs::read_dir(target)?.next().is_some() {
        if !options.force {
            return Err(InitError::NotEmpty(target.to_path_buf()));
        }
        summary
            .warnings
            .push("Directory is not empty. Existing files will not be overwritten.".to_string());
    }

    info!("Initializing IG input folder at {}", target.display());
    info!(
        "Guide name: {}, style: {}",
        options.guide_name, options.style_name
    );
    fs::create_dir_all(target)?;

    let style_dir = Path::new(STYLES_DIR).join(&options.style_name);
    let folders = INIT_REQUIRED_FOLDERS
        .iter()
        .chain(INIT_OPTIONAL_FOLDERS.iter())
        .map(PathBuf::from)
        .chain(std::iter::once(style_dir));
    for folder in folders {
        let path = target.join(&folder);
        if path.exists() {
            debug!("exists: {}/", folder.display());
        } else {
            fs::create_dir_all(&path)?;
            info!("Created: {}/", folder.display());
            summary.folders_created += 1;
        }
    }

    let mut writer = Scaffold {
        root: target,
        files_created: 0,
    };
    match options.template_dir.as_deref().filter(|d| d.is_dir()) {
        Some(templates) => {
            summary.used_template_set = true;
            copy_template_set(&mut writer, templates, &options.style_name)?;
        }
        None => {
            summary
                .warnings
                .push("Template files not found. Creating minimal configuration.".to_string());
            write_minimal_files(&mut writer, options)?;
        }
    }
    summary.files_created = writer.files_created;

    customize_guide(target, options)?;

    info!(
        "Created {} folders, {} files",
        summary.folders_created, summary.files_created
    );
    Ok(summary)
}

/// File writer that never replaces an existing file.
struct Scaffold<'a> {
    root: &'a Path,
    files_created: usize,
}

impl Scaffold<'_> {
    fn write(&mut self, rel: &Path, content: &str) -> Result<(), InitError> {
        self.place(rel, |dst| fs::write(dst, content))
    }

    fn copy(&mut self, src: &Path, rel: &Path) -> Result<(), InitError> {
        self.place(rel, |dst| fs::copy(src, dst).map(|_| ()))
    }

    fn place<F>(&mut self, rel: &Path, create: F) -> Result<(), InitError>
    where
        F: FnOnce(&Path) -> std::io::Result<()>,
    {
        let dst = self.root.join(rel);
        if dst.exists() {
            info!("Skipped (exists): {}", rel.display());
            return Ok(());
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        create(&dst)?;
        debug!("created {}", rel.display());
        self.files_created += 1;
        Ok(())
    }
}

fn copy_template_set(
    writer: &mut Scaffold<'_>,
    templates: &Path,
    style_name: &str,
) -> Result<(), InitError> {
    for file in [GUIDE_FILE, VARIABLES_FILE] {
        let src = templates.join(file);
        if src.is_file() {
            writer.copy(&src, Path::new(file))?;
        }
    }

    for folder in [PAGES_DIR, PAGETEMPLATES_DIR, ARTIFACT_TEMPLATES_DIR] {
        copy_tree(writer, &templates.join(folder), Path::new(folder))?;
    }

    // The first style folder of the set becomes styles/<style_name>.
    let styles = templates.join(STYLES_DIR);
    if styles.is_dir() {
        let mut candidates: Vec<PathBuf> = fs::read_dir(&styles)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        candidates.sort();
        if let Some(source_style) = candidates.first() {
            copy_tree(
                writer,
                source_style,
                &Path::new(STYLES_DIR).join(style_name),
            )?;
        }
    }
    Ok(())
}

/// Copy every file under `src` to `dest_rel`, keeping relative paths.
fn copy_tree(writer: &mut Scaffold<'_>, src: &Path, dest_rel: &Path) -> Result<(), InitError> {
    if !src.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        writer.copy(entry.path(), &dest_rel.join(rel))?;
    }
    Ok(())
}

fn write_minimal_files(writer: &mut Scaffold<'_>, options: &InitOptions) -> Result<(), InitError> {
    let style = options.style_name.as_str();
    let style_dir = Path::new(STYLES_DIR).join(style);

    writer.write(
        Path::new(GUIDE_FILE),
        &format!(
            "# Implementation Guide Configuration\n\
             title: {name}\n\
             url-key: {key}\n\
             style-name: {style}\n\
             \n\
             menu:\n  Home: index.md\n  Artifacts: artifacts\n",
            name = options.guide_name,
            key = url_key(&options.guide_name),
        ),
    )?;
    writer.write(
        &Path::new(PAGES_DIR).join("index.md"),
        "# {{page-title}}\n\n\
         Welcome to this FHIR Implementation Guide.\n\n\
         ## Overview\n\n\
         This Implementation Guide defines the FHIR resources and constraints for your use case.\n",
    )?;
    writer.write(&style_dir.join("master.html"), &master_html(style))?;
    writer.write(
        &style_dir.join("settings.style"),
        &format!("name: {style}\nversion: 1.0.0\n"),
    )?;
    writer.write(
        &style_dir.join("style.css"),
        "/* Add your custom styles here */\n",
    )?;

    for (kind, file) in TEMPLATE_FILES {
        writer.write(
            &Path::new(ARTIFACT_TEMPLATES_DIR).join(file),
            minimal_template(kind),
        )?;
    }
    Ok(())
}

fn master_html(style: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{{{{page-title}}}} - {{{{guide-title}}}}</title>
    <link rel="stylesheet" href="{{{{root}}}}/styles/{style}/style.css">
</head>
<body>
    <header><h1>{{{{guide-title}}}}</h1><nav>{{{{menu}}}}</nav></header>
    <main><aside>{{{{toc}}}}</aside><article>{{{{content}}}}</article></main>
</body>
</html>"#
    )
}

fn minimal_template(kind: &str) -> &'static str {
    match kind {
        "StructureDefinition" => {
            "# {{page-title}}\n\n{{tree:{{ig-var: file-name }}}}\n\n{{render:{{ig-var: file-name }}}}\n"
        }
        _ => "# {{page-title}}\n\n{{render:{{ig-var: file-name }}}}\n",
    }
}

/// Swap the template's placeholder lines in `guide.yaml` for real values.
fn customize_guide(target: &Path, options: &InitOptions) -> Result<(), InitError> {
    let path = target.join(GUIDE_FILE);
    if !path.is_file() {
        return Ok(());
    }
    let content = fs::read_to_string(&path)?;
    let updated = replace_placeholders(&content, options);
    if updated != content {
        fs::write(&path, updated)?;
    }
    Ok(())
}

fn replace_placeholders(content: &str, options: &InitOptions) -> String {
    let title = format!("title: {}", options.guide_name);
    let key = format!("url-key: {}", url_key(&options.guide_name));
    let style = format!("style-name: {}", options.style_name);

    let mut out: String = content
        .lines()
        .map(|line| match line.trim_end() {
            PLACEHOLDER_TITLE => title.as_str(),
            PLACEHOLDER_URL_KEY => key.as_str(),
            PLACEHOLDER_STYLE => style.as_str(),
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    out
}
