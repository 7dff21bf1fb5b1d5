//! File discovery for finding images among user-supplied targets.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::validate::Validator;

/// Discovers and validates image files.
pub struct FileDiscovery {
    validator: Validator,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Collect every valid image under `targets`, in traversal order.
    ///
    /// Files are validated directly; directories are walked (one level deep
    /// when `recursive` is false) with entries sorted by file name so the
    /// order is deterministic. Anything else is skipped with a warning.
    pub fn discover(&self, targets: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
        let mut accepted = Vec::new();

        for target in targets {
            if target.is_file() {
                if self.validator.is_image(target) {
                    accepted.push(target.clone());
                }
            } else if target.is_dir() {
                self.discover_dir(target, recursive, &mut accepted);
            } else {
                tracing::warn!(
                    "skip collecting from {:?} because this is not a file nor a directory",
                    target
                );
            }
        }

        accepted
    }

    fn discover_dir(&self, dir: &Path, recursive: bool, accepted: &mut Vec<PathBuf>) {
        let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker.follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skip unreadable entry under {:?}: {}", dir, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if self.validator.is_image(entry.path()) {
                accepted.push(entry.into_path());
            }
        }
    }
}
