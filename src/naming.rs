//! Centralized naming rules for generated guide trees.
//!
//! Every component that turns a filesystem name into something a reader sees
//! (TOC entries, `definition.page` titles) or decides whether a directory is a
//! real page folder goes through this module, so the TOC generator and the
//! page-tree builder can never disagree.
//!
//! ## Display Titles
//!
//! Dashes and underscores become spaces and each word is capitalized:
//! - `getting-started` → "Getting Started"
//! - `use_cases` → "Use Cases"
//! - `index` → "Index" (always)
//!
//! ## Page Files
//!
//! Markdown sources are renamed to `<lowercased-stem>.page.md` in the output:
//! - `Overview.md` → `overview.page.md`
//! - `Getting-Started.MD` → `getting-started.page.md`

use std::path::{Component, Path};

/// Suffix every generated Markdown page carries.
pub const PAGE_SUFFIX: &str = ".page.md";

/// File name of the page a directory lists first.
pub const INDEX_PAGE: &str = "index.page.md";

/// Directory name excluded from TOCs and the page tree.
pub const PAGETEMPLATES_DIR: &str = "pagetemplates";

/// Format a file or directory stem as a display title.
///
/// The literal stem `index` (any case) always yields `"Index"`. Otherwise
/// dashes and underscores become spaces and the result is title-cased: the
/// first letter of every alphabetic run is upper-cased, the rest lower-cased.
pub fn format_title(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    if name.eq_ignore_ascii_case("index") {
        return "Index".to_string();
    }
    title_case(&name.replace(['-', '_'], " "))
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Title for a generated page file: the `.page.md` suffix is stripped first.
pub fn page_title(file_name: &str) -> String {
    format_title(file_name.strip_suffix(PAGE_SUFFIX).unwrap_or(file_name))
}

/// Whether `path` has a `.md` extension (case-insensitive).
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Output name for a Markdown source: `<lowercased-stem>.page.md`.
pub fn page_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    format!("{stem}{PAGE_SUFFIX}")
}

/// Map a menu reference like `guidance/Intro.md` to its generated page path
/// `guidance/intro.page.md`. Returns `None` if `reference` is not Markdown.
pub fn menu_page_reference(reference: &str) -> Option<String> {
    let path = Path::new(reference);
    if !is_markdown(path) {
        return None;
    }
    let file = page_file_name(path);
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => Some(format!("{}/{file}", parent.to_string_lossy())),
        None => Some(file),
    }
}

/// Whether a generated file is a page (`*.page.md`).
pub fn is_page_file(name: &str) -> bool {
    name.ends_with(PAGE_SUFFIX)
}

/// Whether a page file is the directory's index page.
pub fn is_index_page(name: &str) -> bool {
    name.eq_ignore_ascii_case(INDEX_PAGE)
}

/// Sort key placing the index page first, then everything by name.
pub fn page_sort_key(name: &str) -> (bool, &str) {
    (!is_index_page(name), name)
}

/// Whether a child directory of a page folder is itself a page folder.
///
/// Hidden (`.`) and private (`_`) directories and `pagetemplates` are never
/// part of the navigable tree.
pub fn is_eligible_dir(name: &str) -> bool {
    !name.starts_with('.') && !name.starts_with('_') && name != PAGETEMPLATES_DIR
}

/// Whether `name` is exactly one normal path component, so joining it to a
/// folder stays inside that folder. Rejects `..`, `.`, separators and roots.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Derive the `url-key` from a human guide name: lower-cased, spaces to dashes.
pub fn url_key(guide_name: &str) -> String {
    guide_name.to_lowercase().replace(' ', "-")
}
