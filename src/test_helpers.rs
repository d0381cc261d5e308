//! Shared test utilities for the simplifier-ig test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let input = setup_input();
//! let summary = generate(input.path(), out.path(), &GenerateOptions::default()).unwrap();
//!
//! assert_eq!(
//!     read_toc(&summary.output_path),
//!     vec![TocEntry::new("Home", "Home")]
//! );
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::toc::TOC_FILE;
use crate::types::TocEntry;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/input/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_input() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/input");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Output readers: panic with a clear message on miss
// =========================================================================

/// Parse the `toc.yaml` in `dir`. Panics if it is missing or malformed.
pub fn read_toc(dir: &Path) -> Vec<TocEntry> {
    let path = dir.join(TOC_FILE);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_yaml::from_str(&content)
        .unwrap_or_else(|e| panic!("malformed {}: {e}", path.display()))
}
