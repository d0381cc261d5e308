//! Shared types used across the generation pipeline.
//!
//! `TocEntry` is what every `toc.yaml` holds; `PageNode` is the in-memory page
//! hierarchy the IG resource builder derives from a generated `Home/` tree.

use serde::{Deserialize, Serialize};

/// One navigation entry in a directory's `toc.yaml`.
///
/// Field order is the serialized key order: `name` first, then `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Display name shown in navigation.
    pub name: String,
    /// File or folder name relative to the directory holding the TOC.
    pub filename: String,
}

impl TocEntry {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
        }
    }
}

/// How a page in `definition.page` is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// A folder node; its content is generated by the renderer.
    Generated,
    /// A leaf page backed by a Markdown file.
    Markdown,
}

/// A page or page folder in the generated guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    /// Slash-joined path from the page root, e.g. `Home/artifacts/valueset/my-vs.page.md`.
    pub name_url: String,
    pub title: String,
    pub generation: Generation,
    pub children: Vec<PageNode>,
}

impl PageNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(PageNode::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> PageNode {
        PageNode {
            name_url: name.to_string(),
            title: name.to_string(),
            generation: Generation::Markdown,
            children: vec![],
        }
    }

    #[test]
    fn count_includes_all_levels() {
        let inner = PageNode {
            name_url: "Home/a".into(),
            title: "A".into(),
            generation: Generation::Generated,
            children: vec![leaf("Home/a/x.page.md"), leaf("Home/a/y.page.md")],
        };
        let root = PageNode {
            name_url: "Home".into(),
            title: "Home".into(),
            generation: Generation::Generated,
            children: vec![leaf("Home/index.page.md"), inner],
        };
        assert_eq!(root.count(), 5);
    }

    #[test]
    fn generation_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Generation::Generated).unwrap(),
            "\"generated\""
        );
        assert_eq!(
            serde_json::to_string(&Generation::Markdown).unwrap(),
            "\"markdown\""
        );
    }
}
