//! Path-to-key normalization and directory prefix arithmetic.
//!
//! Rules:
//! - A key is a path with every leading `/` stripped. Nothing else changes:
//!   internal `//`, `.` and `..` segments pass through verbatim.
//! - The root directory is the empty key.
//! - A directory `d` owns every key starting with `"d/"`. Trailing slashes on
//!   a directory path are ignored, so `"dir"` and `"dir/"` name the same
//!   directory.

/// Key separator.
pub const SEPARATOR: char = '/';

/// File name of the empty object that marks a directory as existing.
pub const MARKER_NAME: &str = ".folder";

/// Normalize a filesystem-style path into an object key.
///
/// Pure and total: any string is a valid path.
///
/// # Examples
///
/// ```
/// use bucketfs_core::paths::normalize;
///
/// assert_eq!(normalize("/a/b"), "a/b");
/// assert_eq!(normalize("a/b"), "a/b");
/// assert_eq!(normalize("///x//y/"), "x//y/");
/// ```
pub fn normalize(path: &str) -> String {
    path.trim_start_matches(SEPARATOR).to_string()
}

/// Strip trailing separators from a directory key.
pub fn dir_key(key: &str) -> &str {
    key.trim_end_matches(SEPARATOR)
}

/// Listing prefix that selects every member of the directory `key`.
///
/// `""` for the root, `"<key>/"` otherwise.
pub fn dir_prefix(key: &str) -> String {
    let base = dir_key(key);
    if base.is_empty() {
        String::new()
    } else {
        format!("{base}{SEPARATOR}")
    }
}

/// Key of the marker object for the directory `key`.
pub fn marker_key(key: &str) -> String {
    format!("{}{MARKER_NAME}", dir_prefix(key))
}

/// Returns `true` if `name` is the final component of a marker key.
pub fn is_marker_name(name: &str) -> bool {
    name == MARKER_NAME
}

/// Replace the leading `old_prefix` of `key` with `new_prefix`.
///
/// Returns `None` when `key` does not start with `old_prefix`.
pub fn rebase(key: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    key.strip_prefix(old_prefix)
        .map(|rest| format!("{new_prefix}{rest}"))
}

/// Returns `true` if `key` is the directory `dir` itself or lies beneath it.
pub fn is_within(key: &str, dir: &str) -> bool {
    let dir = dir_key(dir);
    if dir.is_empty() {
        return true;
    }
    let key = dir_key(key);
    key == dir || key.starts_with(&dir_prefix(dir))
}
