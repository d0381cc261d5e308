//! # Simplifier IG
//!
//! Turns an input folder of FHIR resources, Markdown pages and a style into
//! the folder tree Simplifier.net publishes as an Implementation Guide, plus
//! an optional `ImplementationGuide.json` resource describing it.
//!
//! # Architecture: Validate, Generate, Describe
//!
//! ```text
//! 1. Validate  input/        →  ValidationReport        (layout + guide.yaml checks)
//! 2. Generate  input/        →  guides/<url-key>/        (pages, artifacts, toc.yaml files)
//! 3. Describe  <url-key>/    →  ImplementationGuide.json (page tree + artifact list)
//! ```
//!
//! `init` sits in front of all three and scaffolds an input folder that passes
//! validation untouched. Each stage is a plain function over directories; the
//! only state carried between CLI runs is the small settings file in
//! [`settings`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Checks the input layout and `guide.yaml`, counts files, reports IG resource readiness |
//! | [`init`] | Scaffolds an input folder from a template set or minimal defaults |
//! | [`generate`] | Builds the guide folder: pages, artifact pages, index pages, TOCs |
//! | [`ig_resource`] | Builds `ImplementationGuide.json` from a generated guide |
//! | [`artifact`] | Parses FHIR resource files into [`artifact::ArtifactRecord`]s |
//! | [`template`] | Artifact page templates and `{{ig-var: name}}` substitution |
//! | [`toc`] | `toc.yaml` derivation and writing |
//! | [`config`] | `guide.yaml` and `variables.yaml` loading |
//! | [`settings`] | Persisted CLI settings (last input folder, output folder) |
//! | [`naming`] | Title formatting, `.page.md` naming, url-key slugging |
//! | [`types`] | Shared records: TOC entries and the page tree |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Output Is Rebuilt, Never Patched
//!
//! `generate` deletes the guide folder before writing it. Two runs over the
//! same input produce byte-identical trees, and files removed from the input
//! never linger in the output.
//!
//! ## Menu Order Comes From guide.yaml
//!
//! `Home/toc.yaml` follows the order of the `menu` mapping, so `guide.yaml`
//! is parsed into an insertion-ordered mapping. The root `toc.yaml` holds the
//! single `Home` entry. Everything below
//! the menu is ordered by the filesystem: index page first, then pages, then
//! folders, each alphabetical.

pub mod artifact;
pub mod config;
pub mod generate;
pub mod ig_resource;
pub mod init;
pub mod naming;
pub mod output;
pub mod settings;
pub mod template;
pub mod toc;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
