//! Output path resolution.
//!
//! Every processed image is written as `<stem><suffix>.<ext>`, where the
//! extension is forced by the output format:
//! - `photos/cat.jpg`, suffix `_processed`, PNG → `photos/cat_processed.png`
//! - `cat.png`, suffix `""`, WebP, output dir `out/` → `out/cat.webp`
//!
//! Destinations are planned for the whole batch up front. When two inputs
//! land on the same file (e.g. `cat.jpg` and `cat.png` both becoming
//! `cat_processed.png`), later inputs get `-2`, `-3`, … appended to the stem.
//! Every input path of the batch is reserved too, so no item writes over
//! another item's source; an item may only overwrite its own source (empty
//! suffix, same format). Other files already on disk are overwritten.
//!
//! Input discovery lives here too: [`expand_inputs`] turns the paths a user
//! typed into the list of image files a batch will process.

use crate::config::{OutputFormat, ProcessingConfig};
use crate::imaging::is_supported_input;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Stem used when the source has none (e.g. `..` or an empty path).
const FALLBACK_STEM: &str = "output";

fn stem_of(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

fn directory_for(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// Destination for one source, ignoring other items in the batch.
///
/// Never touches the filesystem: a missing `output_dir` is reported when
/// the item is written.
pub fn resolve_output_path(
    source: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
    suffix: &str,
) -> PathBuf {
    let name = format!("{}{}.{}", stem_of(source), suffix, format.extension());
    directory_for(source, output_dir).join(name)
}

/// Identity used to compare paths: canonical when the file (or at least its
/// directory) exists, the path as given otherwise.
fn path_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Destinations for a whole batch, index-aligned with `sources`.
///
/// Duplicates are disambiguated in input order, so the first claimant keeps
/// the plain name. A destination that is another item's source is treated as
/// taken. Paths are compared after resolving them against the filesystem, so
/// `a/../cat.png` and `cat.png` are the same file.
pub fn plan_output_paths(sources: &[PathBuf], config: &ProcessingConfig) -> Vec<PathBuf> {
    let output_dir = config.output_dir.as_deref();
    let extension = config.output_format.extension();
    let inputs: Vec<PathBuf> = sources.iter().map(|source| path_key(source)).collect();
    let reserved: HashSet<&PathBuf> = inputs.iter().collect();
    let mut claimed: HashSet<PathBuf> = HashSet::with_capacity(sources.len());
    let mut planned = Vec::with_capacity(sources.len());

    for (source, own) in sources.iter().zip(&inputs) {
        let is_free = |candidate: &Path| {
            let key = path_key(candidate);
            !claimed.contains(&key) && (&key == own || !reserved.contains(&key))
        };

        let plain = resolve_output_path(source, output_dir, config.output_format, &config.suffix);
        let chosen = if is_free(plain.as_path()) {
            plain
        } else {
            let dir = directory_for(source, output_dir);
            let base = format!("{}{}", stem_of(source), config.suffix);
            (2..)
                .map(|n| dir.join(format!("{base}-{n}.{extension}")))
                .find(|candidate| is_free(candidate.as_path()))
                .unwrap_or(plain)
        };
        claimed.insert(path_key(&chosen));
        planned.push(chosen);
    }
    planned
}

/// Expand directories into the supported image files they contain.
///
/// Files are passed through as given, whatever their extension, so a bad
/// explicit path still shows up as a per-item failure. Directory contents are
/// filtered by extension and sorted by name; subdirectories are only entered
/// when `recursive` is set.
pub fn expand_inputs(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }
        let walker = if recursive {
            WalkDir::new(path)
        } else {
            WalkDir::new(path).max_depth(1)
        };
        expanded.extend(
            walker
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| is_supported_input(entry.path()))
                .map(|entry| entry.into_path()),
        );
    }
    expanded
}
