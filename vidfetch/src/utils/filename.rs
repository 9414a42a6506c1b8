//! Artifact name validation for the file-serving route.
//!
//! Artifact names are produced by the extraction engine with restricted
//! filenames enabled, so anything a client asks for that could escape the
//! storage directory is rejected outright rather than sanitized.

use std::path::Component;
use std::path::Path;

/// Returns `true` when `name` is a plain file name that stays inside the
/// storage directory: non-empty, no path separators, not `.` or `..`.
pub fn is_safe_artifact_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    let path = Path::new(name);
    let mut components = path.components();

    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(is_safe_artifact_name("a1b2c3d4_My_Video.mp4"));
        assert!(is_safe_artifact_name("clip.webm"));
        assert!(is_safe_artifact_name("no_extension"));
    }

    #[test]
    fn rejects_traversal_and_separators() {
        assert!(!is_safe_artifact_name(""));
        assert!(!is_safe_artifact_name("."));
        assert!(!is_safe_artifact_name(".."));
        assert!(!is_safe_artifact_name("../etc/passwd"));
        assert!(!is_safe_artifact_name("sub/dir.mp4"));
        assert!(!is_safe_artifact_name("/abs/path.mp4"));
    }

    #[cfg(windows)]
    #[test]
    fn rejects_backslash_separators() {
        assert!(!is_safe_artifact_name("..\\..\\boot.ini"));
        assert!(!is_safe_artifact_name("sub\\dir.mp4"));
    }
}
