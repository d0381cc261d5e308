//! Artifact page templates.
//!
//! `pagetemplates-artifacts/` holds one Markdown template per known artifact
//! kind. A template is plain Markdown for the external renderer, with
//! `{{ig-var: name}}` placeholders that are filled in per artifact at
//! generation time:
//!
//! ```text
//! # {{page-title}}
//!
//! {{render:{{ig-var: file-name }}}}
//! ```
//!
//! Only `ig-var` placeholders are touched; every other `{{...}}` directive is
//! for the renderer and passes through unchanged, as does an `ig-var` whose
//! name has no value.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

/// Folder of artifact templates and custom type index pages.
pub const ARTIFACT_TEMPLATES_DIR: &str = "pagetemplates-artifacts";

/// Template key used for every example, whatever its resource type.
pub const EXAMPLE_KIND: &str = "Example";

/// Known template kinds and their file names.
pub const TEMPLATE_FILES: [(&str, &str); 4] = [
    ("CodeSystem", "codesystem.md"),
    ("StructureDefinition", "structuredefinition.md"),
    ("ValueSet", "valueset.md"),
    (EXAMPLE_KIND, "examples.md"),
];

/// Suffix of custom per-type index pages, e.g. `valueset.index.md`.
pub const INDEX_TEMPLATE_SUFFIX: &str = ".index.md";

static IG_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{ig-var:\s*([^}]+)\s*\}\}").unwrap());

/// Cached template texts, keyed by kind (`ValueSet`, `Example`, ...).
#[derive(Debug, Clone, Default)]
pub struct ArtifactTemplates {
    templates: BTreeMap<&'static str, String>,
}

impl ArtifactTemplates {
    /// Read whichever known templates exist under
    /// `input/pagetemplates-artifacts/`. Missing files are simply absent.
    pub fn load(input: &Path) -> io::Result<Self> {
        let dir = input.join(ARTIFACT_TEMPLATES_DIR);
        let mut templates = BTreeMap::new();
        for (kind, file) in TEMPLATE_FILES {
            let path = dir.join(file);
            if path.is_file() {
                templates.insert(kind, fs::read_to_string(&path)?);
            }
        }
        Ok(Self { templates })
    }

    pub fn get(&self, kind: &str) -> Option<&str> {
        self.templates.get(kind).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Replace each `{{ig-var: name}}` with `lookup(name)`; placeholders whose
/// name has no value are left exactly as written.
pub fn resolve_variables<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    IG_VAR
        .replace_all(template, |caps: &Captures| {
            match lookup(caps[1].trim()) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// The resource type a custom index file is for: `valueset.index.md` → `valueset`.
pub fn index_template_type(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(INDEX_TEMPLATE_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn substitutes_known_variable() {
        let v = vars(&[("file-name", "my-vs")]);
        assert_eq!(
            resolve_variables("{{render:{{ig-var: file-name }}}}", |n| v.get(n).copied()),
            "{{render:my-vs}}"
        );
    }

    #[test]
    fn tolerates_missing_whitespace() {
        let v = vars(&[("file-name", "x")]);
        assert_eq!(
            resolve_variables("a {{ig-var:file-name}} b", |n| v.get(n).copied()),
            "a x b"
        );
    }

    #[test]
    fn unknown_variable_passes_through_verbatim() {
        let text = "see {{ig-var:  missing  }} and {{page-title}}";
        assert_eq!(resolve_variables(text, |_| None), text);
    }

    #[test]
    fn dotted_and_slashed_names() {
        let v = vars(&[
            ("ValueSet.url", "http://x/ValueSet/a"),
            ("ResourceType/Resource.id", "Patient/p1"),
        ]);
        let out = resolve_variables(
            "{{ig-var: ValueSet.url}} {{ig-var: ResourceType/Resource.id}}",
            |n| v.get(n).copied(),
        );
        assert_eq!(out, "http://x/ValueSet/a Patient/p1");
    }

    #[test]
    fn empty_value_still_replaces() {
        let v = vars(&[("CodeSystem.url", "")]);
        assert_eq!(
            resolve_variables("[{{ig-var: CodeSystem.url}}]", |n| v.get(n).copied()),
            "[]"
        );
    }

    #[test]
    fn loads_only_present_templates() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(ARTIFACT_TEMPLATES_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("valueset.md"), "VS").unwrap();
        fs::write(dir.join("examples.md"), "EX").unwrap();

        let templates = ArtifactTemplates::load(tmp.path()).unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates.get("ValueSet"), Some("VS"));
        assert_eq!(templates.get(EXAMPLE_KIND), Some("EX"));
        assert_eq!(templates.get("CodeSystem"), None);
    }

    #[test]
    fn missing_folder_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(ArtifactTemplates::load(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn index_template_type_from_file_name() {
        assert_eq!(index_template_type("valueset.index.md"), Some("valueset"));
        assert_eq!(index_template_type("valueset.md"), None);
        assert_eq!(index_template_type(".index.md"), None);
    }
}
