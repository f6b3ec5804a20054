//! ZooKeeper node path construction.
//!
//! Pure functions; no session is involved. Joined paths are always absolute
//! with no empty segments, so they can be handed to the client as-is.

use crate::error::{ZkError, ZkResult};

/// Node path separator.
pub const SEPARATOR: char = '/';

/// Join `parent` and `child` into one normalized absolute node path.
///
/// Duplicate and trailing separators are dropped from both sides; an empty
/// `child` yields the normalized `parent`, and an empty result is `/`.
pub fn build_path(parent: &str, child: &str) -> String {
    let mut path = String::with_capacity(parent.len() + child.len() + 1);
    for segment in parent
        .split(SEPARATOR)
        .chain(child.split(SEPARATOR))
        .filter(|s| !s.is_empty())
    {
        path.push(SEPARATOR);
        path.push_str(segment);
    }
    if path.is_empty() {
        path.push(SEPARATOR);
    }
    path
}

/// Check `path` against the rules ZooKeeper enforces for node paths.
pub fn validate_path(path: &str) -> ZkResult<()> {
    let invalid = |reason: &str| ZkError::Config(format!("invalid node path '{path}': {reason}"));

    if !path.starts_with(SEPARATOR) {
        return Err(invalid("path must start with '/'"));
    }
    if path.len() == 1 {
        return Ok(());
    }
    if path.ends_with(SEPARATOR) {
        return Err(invalid("path must not end with '/'"));
    }
    for segment in path[1..].split(SEPARATOR) {
        match segment {
            "" => return Err(invalid("empty node name")),
            "." | ".." => return Err(invalid("relative node names are not allowed")),
            s if s.chars().any(is_forbidden) => {
                return Err(invalid("node name contains a forbidden character"));
            }
            _ => {}
        }
    }
    Ok(())
}

// surrogates cannot appear in a `str`, the rest of ZooKeeper's list can
fn is_forbidden(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}' | '\u{e000}'..='\u{f8ff}' | '\u{fff0}'..='\u{ffff}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_path_simple() {
        assert_eq!(build_path("/config", "/app/db"), "/config/app/db");
        assert_eq!(build_path("/config", "app/db"), "/config/app/db");
    }

    #[test]
    fn test_build_path_normalizes_separators() {
        assert_eq!(build_path("/config/", "/app/db/"), "/config/app/db");
        assert_eq!(build_path("config", "//app///db"), "/config/app/db");
        assert_eq!(build_path("//config//", "app"), "/config/app");
    }

    #[test]
    fn test_build_path_empty_child() {
        assert_eq!(build_path("/config", ""), "/config");
        assert_eq!(build_path("/config/", "/"), "/config");
    }

    #[test]
    fn test_build_path_root_parent() {
        assert_eq!(build_path("/", "/app"), "/app");
        assert_eq!(build_path("/", "/"), "/");
        assert_eq!(build_path("", ""), "/");
    }

    #[test]
    fn test_build_path_properties() {
        let roots = ["/config", "/config/", "config", "/a/b/c"];
        let children = ["/app/db", "app", "/x//y/", ""];
        for root in roots {
            let normalized_root = build_path(root, "");
            for child in children {
                let path = build_path(root, child);
                assert!(path.starts_with(&normalized_root), "{path} !~ {normalized_root}");
                assert!(!path.contains("//"), "{path}");
                assert!(path == "/" || !path.ends_with('/'), "{path}");
                assert_eq!(path, build_path(root, child));
                assert!(validate_path(&path).is_ok(), "{path}");
            }
        }
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/config/app").is_ok());
        assert!(validate_path("config").is_err());
        assert!(validate_path("/config/").is_err());
        assert!(validate_path("/config//app").is_err());
        assert!(validate_path("/config/../app").is_err());
        assert!(validate_path("/config/./app").is_err());
        assert!(validate_path("/config/a\u{0}b").is_err());
    }

    #[test]
    fn test_validate_path_error_kind() {
        let err = validate_path("/config/..").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("/config/.."));
    }
}
