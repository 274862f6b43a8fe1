use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files_copied: usize,
    pub dirs_created: usize,
}

/// Mirrors `source` into `dest`, overwriting files that already exist there.
///
/// Nothing at `dest` is ever removed, so copying into a populated directory
/// merges the two trees. Symlinks are not followed and are skipped.
pub fn copy_dir(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<CopyStats> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    let mut stats = CopyStats::default();

    if !source.is_dir() {
        anyhow::bail!("Source directory {} does not exist", source.display());
    }

    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory {}", dest.display()))?;

    // Pre-order walk: every directory is yielded before its contents
    for entry in WalkDir::new(source).min_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to walk directory {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{} escaped {}", entry.path().display(), source.display()))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory {}", target.display()))?;
            stats.dirs_created += 1;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            stats.files_copied += 1;
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }

    info!(
        "Successfully copied {} to {} ({} files, {} directories)",
        source.display(),
        dest.display(),
        stats.files_copied,
        stats.dirs_created
    );
    Ok(stats)
}
