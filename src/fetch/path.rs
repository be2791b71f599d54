//! Reference path normalization
//!
//! Dependency references come straight out of user-controlled file content,
//! so every one of them is resolved against its container directory and
//! checked against the storage root before it can reach the transport.

use super::FetchError;

/// Resolve a dependency reference against its container directory.
///
/// `container` is the directory of the main file, relative to the storage
/// root (empty string for the root itself). `reference` is the raw string
/// extracted from file content. `.` and `..` segments are resolved; a
/// result that would climb above the storage root is rejected as
/// `PathTraversalRejected`. Backslashes are treated as separators since
/// OBJ/MTL files authored on Windows commonly use them.
pub fn normalize_reference(container: &str, reference: &str) -> Result<String, FetchError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(FetchError::NotFound);
    }

    // Absolute references are interpreted from the storage root, not the
    // container. A leading separator never grants access outside the root.
    let (base, rel) = if let Some(stripped) = reference
        .strip_prefix('/')
        .or_else(|| reference.strip_prefix('\\'))
    {
        ("", stripped)
    } else {
        (container, reference)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split(['/', '\\']).chain(rel.split(['/', '\\'])) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    log::warn!(
                        "rejected path traversal: {reference:?} escapes the storage root \
                         (container {container:?})"
                    );
                    return Err(FetchError::PathTraversalRejected);
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(FetchError::NotFound);
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reference() {
        assert_eq!(
            normalize_reference("models", "texture.jpg").unwrap(),
            "models/texture.jpg"
        );
    }

    #[test]
    fn test_root_container() {
        assert_eq!(normalize_reference("", "model.mtl").unwrap(), "model.mtl");
    }

    #[test]
    fn test_dot_segments_resolve() {
        assert_eq!(
            normalize_reference("models/cars", "./textures/../paint.png").unwrap(),
            "models/cars/paint.png"
        );
    }

    #[test]
    fn test_parent_within_root() {
        assert_eq!(
            normalize_reference("models/cars", "../shared/common.mtl").unwrap(),
            "models/shared/common.mtl"
        );
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(matches!(
            normalize_reference("models", "../../secret.bin"),
            Err(FetchError::PathTraversalRejected)
        ));
        assert!(matches!(
            normalize_reference("", "../anything"),
            Err(FetchError::PathTraversalRejected)
        ));
    }

    #[test]
    fn test_absolute_reference_rooted() {
        assert_eq!(
            normalize_reference("models", "/shared/tex.png").unwrap(),
            "shared/tex.png"
        );
    }

    #[test]
    fn test_backslash_separators() {
        assert_eq!(
            normalize_reference("models", "textures\\wood.png").unwrap(),
            "models/textures/wood.png"
        );
    }

    #[test]
    fn test_empty_reference() {
        assert!(normalize_reference("models", "  ").is_err());
    }
}
