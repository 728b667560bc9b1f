//! Absolute path handling.
//!
//! Paths are `/`-separated and must start with `/`. Empty components are
//! skipped, so `//a//b` names the same node as `/a/b`. There is no `.` or
//! `..` handling; those are ordinary names.

use omnifs_types::entry::MAX_NAME_LEN;

use crate::error::{FsError, FsResult};

/// Non-empty components of an absolute path, or `None` if `path` is not
/// absolute.
pub fn components(path: &str) -> Option<impl Iterator<Item = &str>> {
    let rest = path.strip_prefix('/')?;
    Some(rest.split('/').filter(|c| !c.is_empty()))
}

/// Split at the last `/` into `(parent, name)`.
///
/// The parent of a top-level name is `/`. Returns `None` for a path with
/// no `/` at all.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let idx = path.rfind('/')?;
    let parent = if idx == 0 { "/" } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

/// Check that `name` can be stored in an entry's name field.
pub fn validate_name(name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(FsError::invalid_operation("empty name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FsError::invalid_path(format!(
            "name is {} bytes, limit is {}",
            name.len(),
            MAX_NAME_LEN
        )));
    }
    if name.contains('\0') {
        return Err(FsError::invalid_path("name contains NUL"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_skip_empty() {
        let a: Vec<_> = components("//a//b/").unwrap().collect();
        assert_eq!(a, vec!["a", "b"]);
        assert_eq!(components("/").unwrap().count(), 0);
        assert!(components("a/b").is_none());
        assert!(components("").is_none());
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/docs"), Some(("/", "docs")));
        assert_eq!(split_parent("/docs/a.txt"), Some(("/docs", "a.txt")));
        assert_eq!(split_parent("/docs/"), Some(("/docs", "")));
        assert_eq!(split_parent("docs"), None);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("a.txt").is_ok());
        assert_eq!(
            validate_name("").unwrap_err().code(),
            omnifs_types::ErrorCode::InvalidOperation
        );
        assert_eq!(
            validate_name(&"x".repeat(256)).unwrap_err().code(),
            omnifs_types::ErrorCode::InvalidPath
        );
        assert!(validate_name(&"x".repeat(255)).is_ok());
    }
}
