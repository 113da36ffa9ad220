//! Key-shape helpers for the virtual directory tree.
//!
//! The object store is flat: a "folder" only exists as a key shape. Everything
//! here is pure string handling so the heuristics can be tested without a
//! store.

use crate::models::EntryKind;

pub const SEPARATOR: char = '/';

/// Normalizes a listing or search scope: trimmed, lower-cased and ending in
/// exactly one separator. An empty scope stays empty (bucket root).
pub fn normalize_prefix(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .to_lowercase()
        .trim_matches(SEPARATOR)
        .to_string();
    if cleaned.is_empty() {
        cleaned
    } else {
        format!("{}{}", cleaned, SEPARATOR)
    }
}

/// Strips leading and trailing separators and appends exactly one.
/// Returns `None` when nothing is left.
pub fn normalize_folder_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(SEPARATOR);
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("{}{}", trimmed, SEPARATOR))
}

/// Classifies a key remainder (the part after the query prefix).
///
/// A trailing separator marks a folder, which keeps dotted folder names such
/// as `v1.2/` intact. Otherwise a separator appearing before any extension dot
/// (or with no dot at all) means the remainder points into a folder.
pub fn classify(remainder: &str) -> EntryKind {
    if remainder.ends_with(SEPARATOR) {
        return EntryKind::Folder;
    }
    match (remainder.find(SEPARATOR), remainder.find('.')) {
        (Some(sep), Some(dot)) if sep < dot => EntryKind::Folder,
        (Some(_), None) => EntryKind::Folder,
        _ => EntryKind::File,
    }
}

pub fn separator_depth(key: &str) -> usize {
    key.matches(SEPARATOR).count()
}

/// Returns the part of `key` below `prefix` when `key` is a direct child of
/// `prefix`: a file right under it or a one-level folder marker.
pub fn child_remainder<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let remainder = key.strip_prefix(prefix)?;
    if remainder.is_empty() {
        return None;
    }
    // deeper folder markers
    if separator_depth(key) > separator_depth(prefix) + 1 {
        return None;
    }
    // files inside a subfolder
    if remainder.contains(SEPARATOR) && !remainder.ends_with(SEPARATOR) {
        return None;
    }
    Some(remainder)
}

/// Display name of an entry: its last segment, with a trailing separator for
/// folders.
pub fn entry_name(remainder: &str, kind: EntryKind) -> String {
    let last = remainder
        .trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or_default();
    match kind {
        EntryKind::Folder => format!("{}{}", last, SEPARATOR),
        EntryKind::File => last.to_string(),
    }
}

/// Everything up to and including the separator before the last segment.
pub fn parent_prefix(key: &str) -> &str {
    let trimmed = key.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => &key[..=idx],
        None => "",
    }
}

/// Joins a destination folder and a file name into an object key.
/// Empty, `.` and `..` segments are resolved; the result never starts with a
/// separator.
pub fn join_key(path: &str, file_name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR).chain(file_name.split(SEPARATOR)) {
        match segment.trim() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}
