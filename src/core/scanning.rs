//! Source file discovery
//!
//! Produces the candidate files for a run: either the single explicit input
//! path, or every non-directory entry under a root whose base name matches
//! the selection pattern. Names are matched as bytes, not as lossy text.

use regex::bytes::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lazy, single-use sequence of candidate source files
pub enum Candidates<'a> {
    /// Single-file mode: yields the input path once, unchecked
    Single(Option<PathBuf>),
    /// Batch mode: a recursive walk filtered by base name
    Walk {
        entries: walkdir::IntoIter,
        pattern: &'a Regex,
    },
}

/// Select the files to decode
///
/// Without a pattern this yields `root` itself without touching the
/// filesystem; a missing file is reported later when it is opened.
///
/// With a pattern, `root` is walked recursively. Directories are never
/// yielded. Entries that fail to be read are skipped and the walk carries on.
/// Entries are visited in file name order within each directory.
pub fn select_files<'a>(root: &Path, pattern: Option<&'a Regex>) -> Candidates<'a> {
    match pattern {
        None => Candidates::Single(Some(root.to_path_buf())),
        Some(pattern) => Candidates::Walk {
            entries: WalkDir::new(root).sort_by_file_name().into_iter(),
            pattern,
        },
    }
}

impl Iterator for Candidates<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        match self {
            Candidates::Single(path) => path.take(),
            Candidates::Walk { entries, pattern } => loop {
                let entry = match entries.next()? {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::debug!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };

                if entry.file_type().is_dir() {
                    continue;
                }

                // Raw name bytes, so names that are not valid UTF-8 still match
                if pattern.is_match(entry.file_name().as_encoded_bytes()) {
                    return Some(entry.into_path());
                }
            },
        }
    }
}
