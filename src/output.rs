//! CLI output formatting for all commands.
//!
//! Progress while a command runs goes through `tracing`; this module renders
//! the final summary a user reads once it is done.
//!
//! # Output Format
//!
//! ## Validate
//!
//! ```text
//! Input is valid: input/
//!     Guide:     example-guide (Example Guide)
//!     Style:     custom
//!     Resources: 3
//!     Examples:  2
//!     Pages:     3
//!     Styles:    3 files
//!     Templates: 1
//!     IG resource: ready
//!
//! Warnings
//!     Optional folder 'pagetemplates' is empty (no .md files found)
//! ```
//!
//! ## Generate
//!
//! ```text
//! Generated example-guide → guides/example-guide
//!     Resources: 3
//!     Examples:  2
//!     Pages:     4
//!     TOC files: 8
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::GenerationSummary;
use crate::ig_resource::{IgResourceOutcome, REQUIRED_IG_FIELDS};
use crate::init::InitSummary;
use crate::settings::{InputFolderStatus, SETTINGS_PATH};
use crate::validate::ValidationReport;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// A titled, indented block; nothing at all when `items` is empty.
///
/// ```text
///
/// Warnings
///     first
///     second
/// ```
fn section(title: &str, items: &[String]) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), title.to_string()];
    for item in items {
        // Multi-line messages keep their continuation lines under the item.
        for line in item.lines() {
            lines.push(format!("{}{}", indent(1), line));
        }
    }
    lines
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ============================================================================
// Validate
// ============================================================================

pub fn format_validation_report(report: &ValidationReport) -> Vec<String> {
    let mut lines = Vec::new();
    let dir = report.input_dir.display();

    if !report.is_valid {
        lines.push(format!("Input is not valid: {dir}"));
        lines.extend(section("Errors", &report.errors));
        lines.extend(section("Warnings", &report.warnings));
        return lines;
    }

    lines.push(format!("Input is valid: {dir}"));
    let guide = match (&report.guide_name, &report.guide_title) {
        (Some(name), Some(title)) => format!("{name} ({title})"),
        (Some(name), None) => name.clone(),
        _ => String::new(),
    };
    let counts = &report.file_counts;
    lines.push(format!("{}Guide:     {guide}", indent(1)));
    lines.push(format!(
        "{}Style:     {}",
        indent(1),
        report.style_name.as_deref().unwrap_or_default()
    ));
    lines.push(format!("{}Resources: {}", indent(1), counts.resources));
    lines.push(format!("{}Examples:  {}", indent(1), counts.examples));
    lines.push(format!("{}Pages:     {}", indent(1), counts.pages));
    lines.push(format!("{}Styles:    {} files", indent(1), counts.styles));
    lines.push(format!("{}Templates: {}", indent(1), counts.pagetemplates));
    if report.has_ig_resource_fields {
        lines.push(format!("{}IG resource: ready", indent(1)));
    } else {
        lines.push(format!(
            "{}IG resource: missing {}",
            indent(1),
            report.missing_ig_fields.join(", ")
        ));
    }
    lines.extend(section("Warnings", &report.warnings));
    lines
}

pub fn print_validation_report(report: &ValidationReport) {
    for line in format_validation_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Init
// ============================================================================

pub fn format_init_summary(summary: &InitSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Initialized {}", summary.output_path.display()),
        format!(
            "{}Created {} folders, {} files{}",
            indent(1),
            summary.folders_created,
            summary.files_created,
            if summary.used_template_set {
                ""
            } else {
                " (minimal defaults)"
            }
        ),
    ];
    lines.extend(section("Warnings", &summary.warnings));
    lines.extend(section(
        "Next steps",
        &[
            "1. Add your FHIR resources to resources/".to_string(),
            "2. Add example resources to examples/".to_string(),
            "3. Add documentation pages to pages/".to_string(),
            "4. Edit guide.yaml to configure your menu".to_string(),
            "5. Run 'simplifier-ig validate' to validate the structure".to_string(),
            "6. Run 'simplifier-ig generate' to create the IG output".to_string(),
        ],
    ));
    lines
}

pub fn print_init_summary(summary: &InitSummary) {
    for line in format_init_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generation_summary(summary: &GenerationSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Generated {} → {}",
            summary.guide_name,
            summary.output_path.display()
        ),
        format!("{}Resources: {}", indent(1), summary.resource_count),
        format!("{}Examples:  {}", indent(1), summary.example_count),
        format!("{}Pages:     {}", indent(1), summary.page_count),
        format!("{}TOC files: {}", indent(1), summary.toc_files_generated),
    ];
    lines.extend(section("Warnings", &summary.warnings));
    lines
}

pub fn print_generation_summary(summary: &GenerationSummary) {
    for line in format_generation_summary(summary) {
        println!("{}", line);
    }
}

/// Why the IG resource step is being skipped, and what `guide.yaml` needs.
pub fn format_preflight_skip(problems: &[String]) -> Vec<String> {
    let mut lines = vec!["Skipping ImplementationGuide.json:".to_string()];
    for problem in problems {
        lines.push(format!("{}{}", indent(1), problem));
    }
    lines.push(format!(
        "{}Add these keys to guide.yaml to enable it: {}",
        indent(1),
        REQUIRED_IG_FIELDS.join(", ")
    ));
    lines
}

pub fn print_preflight_skip(problems: &[String]) {
    for line in format_preflight_skip(problems) {
        println!("{}", line);
    }
}

// ============================================================================
// IG resource
// ============================================================================

pub fn format_ig_outcome(outcome: &IgResourceOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match (&outcome.output_path, outcome.success) {
        (Some(path), true) => {
            lines.push(format!("Generated {}", path.display()));
            lines.push(format!("{}Pages: {}", indent(1), outcome.page_count));
        }
        _ => lines.push("ImplementationGuide.json was not generated".to_string()),
    }
    lines.extend(section("Errors", &outcome.errors));
    lines.extend(section("Warnings", &outcome.warnings));
    lines
}

pub fn print_ig_outcome(outcome: &IgResourceOutcome) {
    for line in format_ig_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Config
// ============================================================================

pub fn format_settings(
    settings_file: &Path,
    entries: &[(&str, &str)],
    input: Option<&InputFolderStatus>,
) -> Vec<String> {
    let mut lines = vec![format!("Settings ({})", settings_file.display())];
    if entries.is_empty() {
        lines.push(format!("{}(none saved in {SETTINGS_PATH})", indent(1)));
    }
    for (key, value) in entries {
        lines.push(format!("{}{key}: {value}", indent(1)));
    }

    if let Some(status) = input {
        lines.push(String::new());
        lines.push(format!("Input folder {}", status.path.display()));
        lines.push(format!("{}Exists:         {}", indent(1), yes_no(status.exists)));
        lines.push(format!(
            "{}guide.yaml:     {}",
            indent(1),
            yes_no(status.has_guide)
        ));
        lines.push(format!(
            "{}variables.yaml: {}",
            indent(1),
            yes_no(status.has_variables)
        ));
    }
    lines
}

pub fn print_settings(
    settings_file: &Path,
    entries: &[(&str, &str)],
    input: Option<&InputFolderStatus>,
) {
    for line in format_settings(settings_file, entries, input) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::FileCounts;
    use std::path::PathBuf;

    #[test]
    fn section_is_empty_without_items() {
        assert!(section("Warnings", &[]).is_empty());
    }

    #[test]
    fn section_indents_continuation_lines() {
        let lines = section("Errors", &["first\n   hint".to_string()]);
        assert_eq!(lines, vec!["", "Errors", "    first", "       hint"]);
    }

    #[test]
    fn valid_report() {
        let report = ValidationReport {
            input_dir: PathBuf::from("input"),
            is_valid: true,
            guide_name: Some("example-guide".into()),
            guide_title: Some("Example Guide".into()),
            style_name: Some("custom".into()),
            file_counts: FileCounts {
                resources: 3,
                examples: 2,
                pages: 3,
                styles: 3,
                pagetemplates: 1,
            },
            has_ig_resource_fields: false,
            missing_ig_fields: vec!["id".into(), "status (invalid value)".into()],
            warnings: vec!["careful".into()],
            ..Default::default()
        };
        let lines = format_validation_report(&report);
        assert_eq!(lines[0], "Input is valid: input");
        assert_eq!(lines[1], "    Guide:     example-guide (Example Guide)");
        assert_eq!(lines[3], "    Resources: 3");
        assert!(lines.contains(&"    IG resource: missing id, status (invalid value)".to_string()));
        assert_eq!(&lines[lines.len() - 2..], &["Warnings", "    careful"]);
    }

    #[test]
    fn invalid_report_lists_errors() {
        let report = ValidationReport {
            input_dir: PathBuf::from("input"),
            errors: vec!["Missing required folders in input directory: pages".into()],
            ..Default::default()
        };
        assert_eq!(
            format_validation_report(&report),
            vec![
                "Input is not valid: input",
                "",
                "Errors",
                "    Missing required folders in input directory: pages",
            ]
        );
    }

    #[test]
    fn generation_summary() {
        let summary = GenerationSummary {
            output_path: PathBuf::from("guides/example-guide"),
            guide_name: "example-guide".into(),
            resource_count: 3,
            example_count: 2,
            page_count: 4,
            toc_files_generated: 8,
            warnings: vec![],
        };
        assert_eq!(
            format_generation_summary(&summary),
            vec![
                "Generated example-guide → guides/example-guide",
                "    Resources: 3",
                "    Examples:  2",
                "    Pages:     4",
                "    TOC files: 8",
            ]
        );
    }

    #[test]
    fn preflight_skip_names_required_keys() {
        let lines = format_preflight_skip(&["bad status".to_string()]);
        assert_eq!(lines[1], "    bad status");
        assert_eq!(
            lines[2],
            "    Add these keys to guide.yaml to enable it: id, status, fhirVersion, canonical"
        );
    }

    #[test]
    fn init_summary_mentions_minimal_defaults() {
        let summary = InitSummary {
            output_path: PathBuf::from("input"),
            folders_created: 7,
            files_created: 9,
            used_template_set: false,
            warnings: vec![],
        };
        let lines = format_init_summary(&summary);
        assert_eq!(lines[0], "Initialized input");
        assert_eq!(lines[1], "    Created 7 folders, 9 files (minimal defaults)");
        assert!(lines.contains(&"Next steps".to_string()));
    }

    #[test]
    fn ig_outcome_success_and_failure() {
        let ok = IgResourceOutcome {
            success: true,
            output_path: Some(PathBuf::from("g/ImplementationGuide.json")),
            page_count: 12,
            ..Default::default()
        };
        assert_eq!(
            format_ig_outcome(&ok),
            vec!["Generated g/ImplementationGuide.json", "    Pages: 12"]
        );

        let failed = IgResourceOutcome {
            errors: vec!["boom".into()],
            ..Default::default()
        };
        assert_eq!(
            format_ig_outcome(&failed),
            vec![
                "ImplementationGuide.json was not generated",
                "",
                "Errors",
                "    boom",
            ]
        );
    }

    #[test]
    fn settings_listing() {
        let status = InputFolderStatus {
            path: PathBuf::from("/work/input"),
            exists: true,
            has_guide: true,
            has_variables: false,
        };
        let lines = format_settings(
            Path::new("s.json"),
            &[("InputPath", "/work/input")],
            Some(&status),
        );
        assert_eq!(
            lines,
            vec![
                "Settings (s.json)",
                "    InputPath: /work/input",
                "",
                "Input folder /work/input",
                "    Exists:         yes",
                "    guide.yaml:     yes",
                "    variables.yaml: no",
            ]
        );
    }

    #[test]
    fn settings_listing_empty() {
        let lines = format_settings(Path::new("s.json"), &[], None);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("    (none saved"));
    }
}
