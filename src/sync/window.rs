//! Version window resolution from the marker file's history

use crate::error::{Error, Result};
use crate::types::{VersionMarker, VersionWindow};
use crate::vcs::VersionControl;
use tracing::{debug, info};

/// Extract the version marker from marker file content.
///
/// The marker is the trimmed text after the first `delimiter`, or the whole
/// trimmed content when the delimiter is absent. Blank markers yield `None`.
pub fn parse_marker(content: &str, delimiter: char) -> Option<VersionMarker> {
    let content = content.trim();
    let marker = content
        .split_once(delimiter)
        .map_or(content, |(_, rest)| rest)
        .trim();
    (!marker.is_empty()).then(|| VersionMarker::new(marker))
}

/// Determine `(old, new)` from the marker file at `rev` and just before its last change.
///
/// Fails with [`Error::HistoryUnavailable`] if the file was never changed on
/// `rev`, if the change that touched it last also created it, or if either
/// version yields no marker.
pub async fn resolve_version_window(
    vcs: &dyn VersionControl,
    rev: &str,
    marker_file: &str,
    delimiter: char,
) -> Result<VersionWindow> {
    let last = vcs.last_change(rev, marker_file).await?.ok_or_else(|| {
        Error::HistoryUnavailable(format!("{marker_file} has no recorded change on {rev}"))
    })?;
    debug!(marker_file, commit = %last, "last marker change");

    let current = vcs.read_file_at(rev, marker_file).await?.ok_or_else(|| {
        Error::HistoryUnavailable(format!("{marker_file} does not exist on {rev}"))
    })?;

    let parent = format!("{last}^");
    let previous = vcs.read_file_at(&parent, marker_file).await?.ok_or_else(|| {
        Error::HistoryUnavailable(format!(
            "{marker_file} has no version before commit {last}"
        ))
    })?;

    let new = parse_marker(&current, delimiter).ok_or_else(|| {
        Error::HistoryUnavailable(format!("{marker_file} on {rev} contains no marker"))
    })?;
    let old = parse_marker(&previous, delimiter).ok_or_else(|| {
        Error::HistoryUnavailable(format!("{marker_file} at {parent} contains no marker"))
    })?;

    let window = VersionWindow { old, new };
    info!(%window, "resolved version window");
    Ok(window)
}
