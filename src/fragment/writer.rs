//! Writing fragments to disk and finding them again

use super::error::{FragmentError, FragmentResult};
use super::json::Fragment;
use crate::record::RecordId;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Write `fragment` to exactly `path`, failing if the file already exists.
///
/// The content is staged next to the target and linked into place, so the
/// target name never holds a partial fragment.
pub fn write_new(path: &Path, fragment: &Fragment) -> FragmentResult<()> {
    let staged = stage(path, fragment)?;
    let linked = std::fs::hard_link(&staged, path);
    discard(&staged);
    linked.map_err(|e| FragmentError::io(path, e))
}

/// Replace the contents of `path` with `fragment` in one rename.
pub fn write_replace(path: &Path, fragment: &Fragment) -> FragmentResult<()> {
    let staged = stage(path, fragment)?;
    std::fs::rename(&staged, path).map_err(|e| {
        discard(&staged);
        FragmentError::io(path, e)
    })
}

/// Hidden sibling of `target` that discovery never picks up
fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}.tmp", name, RecordId::new()))
}

fn stage(target: &Path, fragment: &Fragment) -> FragmentResult<PathBuf> {
    let json = fragment.to_json()?;
    let staged = staging_path(target);
    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staged)
        .and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        });
    match written {
        Ok(()) => Ok(staged),
        Err(e) => {
            discard(&staged);
            Err(FragmentError::io(&staged, e))
        }
    }
}

fn discard(staged: &Path) {
    if let Err(e) = std::fs::remove_file(staged) {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %staged.display(), error = %e, "could not remove staging file");
        }
    }
}

/// Write a converted report as `report_{date}_{counter}_at_{commit}.json`.
///
/// The counter is bumped until an unused name is found; exclusive creation
/// makes concurrent converters in the same directory safe.
pub fn write_report(
    dir: &Path,
    fragment: &Fragment,
    timestamp: DateTime<Utc>,
    commit: &str,
) -> FragmentResult<PathBuf> {
    let date = timestamp.format("%Y-%m-%d");
    let mut counter = 0usize;
    loop {
        let path = dir.join(format!("report_{}_{}_at_{}.json", date, counter, commit));
        match write_new(&path, fragment) {
            Ok(()) => return Ok(path),
            Err(FragmentError::Io { source, .. }) if source.kind() == ErrorKind::AlreadyExists => {
                counter += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Expand inputs into a sorted, de-duplicated list of fragment files.
///
/// Directories are walked recursively for `*.json`; inputs containing glob
/// metacharacters are expanded without matching dotfiles; anything else is taken as a file path.
pub fn discover(inputs: &[String]) -> FragmentResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry.map_err(|e| {
                    let p = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf());
                    FragmentError::io(p, e.into())
                })?;
                if entry.file_type().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some("json")
                {
                    paths.push(entry.into_path());
                }
            }
        } else if input.contains(['*', '?', '[']) {
            let hidden = glob::MatchOptions {
                require_literal_leading_dot: true,
                ..glob::MatchOptions::new()
            };
            let matches = glob::glob_with(input, hidden)
                .map_err(|e| FragmentError::Pattern(input.clone(), e.to_string()))?;
            for entry in matches {
                let p = entry.map_err(|e| {
                    let p = e.path().to_path_buf();
                    FragmentError::io(p, e.into_error())
                })?;
                paths.push(p);
            }
        } else {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}
