//! Table-of-contents derivation.
//!
//! Every navigable folder of a generated guide carries a `toc.yaml`: an
//! ordered list of `{name, filename}` records the renderer turns into
//! navigation. There are three ways a TOC comes about:
//!
//! | Folder | Source |
//! |--------|--------|
//! | `Home/` | `menu` of `guide.yaml`, else derived like any folder |
//! | other folders under `Home/` | derived from the folder contents |
//! | `Home/artifacts/**` | derived from the scanned artifacts |
//!
//! ## Derived TOCs
//!
//! Page files (`*.page.md`) come first, the index page leading and the rest
//! alphabetical, then eligible subfolders alphabetically:
//!
//! ```yaml
//! - name: Index
//!   filename: index.page.md
//! - name: Getting Started
//!   filename: getting-started.page.md
//! - name: Artifacts
//!   filename: artifacts
//! ```

use crate::config::{MenuItem, MenuTarget};
use crate::naming::{
    INDEX_PAGE, format_title, is_eligible_dir, is_page_file, menu_page_reference, page_sort_key,
    page_title,
};
use crate::types::TocEntry;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// File name of a folder's table of contents.
pub const TOC_FILE: &str = "toc.yaml";

/// Page root folder of a generated guide.
pub const HOME_DIR: &str = "Home";

/// Artifact pages folder under [`HOME_DIR`].
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Folder under [`ARTIFACTS_DIR`] holding example pages.
pub const EXAMPLES_PAGE_DIR: &str = "examples";

#[derive(Error, Debug)]
pub enum TocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// The root TOC: the single `Home` entry.
pub fn root_toc() -> Vec<TocEntry> {
    vec![TocEntry::new(HOME_DIR, HOME_DIR)]
}

/// `Home/` TOC from `menu` entries, keeping only targets that exist in `home`.
pub fn menu_toc(home: &Path, menu: &[MenuItem]) -> Vec<TocEntry> {
    menu.iter()
        .filter_map(|item| {
            let filename = match &item.target {
                MenuTarget::Page(reference) => {
                    let page = menu_page_reference(reference)?;
                    home.join(&page).is_file().then_some(page)?
                }
                MenuTarget::Folder(folder) => {
                    home.join(folder).is_dir().then(|| folder.clone())?
                }
            };
            Some(TocEntry::new(item.name.clone(), filename))
        })
        .collect()
}

/// Derive the TOC of `dir` from its immediate contents.
pub fn directory_toc(dir: &Path) -> Result<Vec<TocEntry>, TocError> {
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

    let page_entries = pages.into_iter().map(|p| TocEntry::new(page_title(&p), p));
    let folder_entries = folders
        .into_iter()
        .map(|f| TocEntry::new(format_title(&f), f));
    Ok(page_entries.chain(folder_entries).collect())
}

/// `Home/artifacts/` TOC: index page, one folder per type, then examples.
pub fn artifacts_toc(has_index: bool, types: &[&str], has_examples: bool) -> Vec<TocEntry> {
    let mut entries = Vec::with_capacity(types.len() + 2);
    if has_index {
        entries.push(TocEntry::new("Index", INDEX_PAGE));
    }
    for resource_type in types {
        entries.push(TocEntry::new(*resource_type, resource_type.to_lowercase()));
    }
    if has_examples {
        entries.push(TocEntry::new("Examples", EXAMPLES_PAGE_DIR));
    }
    entries
}

/// One artifact folder's TOC: the custom index if any, then pages by id.
pub fn artifact_folder_toc(has_custom_index: bool, ids: &[&str]) -> Vec<TocEntry> {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();

    let index = has_custom_index.then(|| TocEntry::new("Index", INDEX_PAGE));
    index
        .into_iter()
        .chain(
            sorted
                .into_iter()
                .map(|id| TocEntry::new(id, format!("{id}.page.md"))),
        )
        .collect()
}

/// Write `entries` as `dir/toc.yaml`.
pub fn write_toc(dir: &Path, entries: &[TocEntry]) -> Result<(), TocError> {
    let yaml = serde_yaml::to_string(entries)?;
    fs::write(dir.join(TOC_FILE), yaml)?;
    Ok(())
}

/// Write derived TOCs for every eligible folder strictly below `home`, except
/// the artifacts subtree. Folders without any entries get no TOC.
///
/// Returns the number of TOC files written.
pub fn write_directory_tocs(home: &Path) -> Result<usize, TocError> {
    let mut written = 0;
    let walker = WalkDir::new(home)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !e.file_type().is_dir()
                || (is_eligible_dir(&e.file_name().to_string_lossy())
                    && !(e.depth() == 1 && e.file_name() == ARTIFACTS_DIR))
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let entries = directory_toc(entry.path())?;
        if entries.is_empty() {
            continue;
        }
        write_toc(entry.path(), &entries)?;
        debug!(
            "wrote {}/{TOC_FILE} ({} entries)",
            entry.path().strip_prefix(home).unwrap_or(entry.path()).display(),
            entries.len()
        );
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    fn names(entries: &[TocEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.filename.as_str()).collect()
    }

    #[test]
    fn directory_toc_orders_index_pages_then_folders() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(&dir.join("zeta.page.md"));
        touch(&dir.join("getting-started.page.md"));
        touch(&dir.join("index.page.md"));
        touch(&dir.join("notes.txt"));
        touch(&dir.join("use_cases/a.page.md"));
        touch(&dir.join("artifacts/index.page.md"));
        touch(&dir.join("_drafts/x.page.md"));
        touch(&dir.join("pagetemplates/t.md"));

        let toc = directory_toc(dir).unwrap();
        assert_eq!(
            toc,
            vec![
                TocEntry::new("Index", "index.page.md"),
                TocEntry::new("Getting Started", "getting-started.page.md"),
                TocEntry::new("Zeta", "zeta.page.md"),
                TocEntry::new("Artifacts", "artifacts"),
                TocEntry::new("Use Cases", "use_cases"),
            ]
        );
    }

    #[test]
    fn menu_toc_keeps_existing_targets_in_order() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path();
        touch(&home.join("index.page.md"));
        touch(&home.join("guidance/intro.page.md"));
        touch(&home.join("artifacts/index.page.md"));

        let menu = vec![
            MenuItem {
                name: "Artifacts".into(),
                target: MenuTarget::Folder("artifacts".into()),
            },
            MenuItem {
                name: "Home".into(),
                target: MenuTarget::Page("Index.md".into()),
            },
            MenuItem {
                name: "Guidance".into(),
                target: MenuTarget::Folder("guidance".into()),
            },
            MenuItem {
                name: "Missing".into(),
                target: MenuTarget::Folder("nowhere".into()),
            },
            MenuItem {
                name: "Gone".into(),
                target: MenuTarget::Page("gone.md".into()),
            },
        ];
        let toc = menu_toc(home, &menu);
        assert_eq!(
            toc,
            vec![
                TocEntry::new("Artifacts", "artifacts"),
                TocEntry::new("Home", "index.page.md"),
                TocEntry::new("Guidance", "guidance"),
            ]
        );
    }

    #[test]
    fn artifacts_toc_layout() {
        let toc = artifacts_toc(true, &["CodeSystem", "ValueSet"], true);
        assert_eq!(
            toc,
            vec![
                TocEntry::new("Index", "index.page.md"),
                TocEntry::new("CodeSystem", "codesystem"),
                TocEntry::new("ValueSet", "valueset"),
                TocEntry::new("Examples", "examples"),
            ]
        );
        assert!(artifacts_toc(false, &[], false).is_empty());
    }

    #[test]
    fn artifact_folder_toc_sorts_ids_after_index() {
        let toc = artifact_folder_toc(true, &["b-vs", "a-vs"]);
        assert_eq!(names(&toc), vec!["index.page.md", "a-vs.page.md", "b-vs.page.md"]);
        assert_eq!(toc[1].name, "a-vs");

        let plain = artifact_folder_toc(false, &["x"]);
        assert_eq!(plain, vec![TocEntry::new("x", "x.page.md")]);
    }

    #[test]
    fn write_toc_is_block_style_name_first() {
        let tmp = TempDir::new().unwrap();
        write_toc(tmp.path(), &root_toc()).unwrap();
        let content = fs::read_to_string(tmp.path().join(TOC_FILE)).unwrap();
        assert_eq!(content, "- name: Home\n  filename: Home\n");
    }

    #[test]
    fn directory_tocs_skip_artifacts_and_templates() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path();
        touch(&home.join("index.page.md"));
        touch(&home.join("guidance/intro.page.md"));
        touch(&home.join("guidance/deep/more.page.md"));
        touch(&home.join("artifacts/valueset/a.page.md"));
        touch(&home.join("pagetemplates/inner/x.page.md"));
        fs::create_dir_all(home.join("empty")).unwrap();

        let written = write_directory_tocs(home).unwrap();
        assert_eq!(written, 2);
        assert!(home.join("guidance").join(TOC_FILE).is_file());
        assert!(home.join("guidance/deep").join(TOC_FILE).is_file());
        assert!(!home.join("artifacts").join(TOC_FILE).exists());
        assert!(!home.join("artifacts/valueset").join(TOC_FILE).exists());
        assert!(!home.join("pagetemplates/inner").join(TOC_FILE).exists());
        assert!(!home.join("empty").join(TOC_FILE).exists());
        // Home itself is handled by the caller.
        assert!(!home.join(TOC_FILE).exists());
    }
}
