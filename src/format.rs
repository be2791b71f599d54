//! Model format detection
//!
//! Classifies a requested file by extension into a loader family and tells
//! the rest of the pipeline whether external dependency references are
//! possible for that family.

/// Supported 3D model formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// glTF 2.0 JSON document (.gltf), usually with external buffers/images
    Gltf,
    /// Binary glTF container (.glb)
    Glb,
    /// Wavefront OBJ (.obj), with material libraries and textures
    Obj,
    /// Stereolithography (.stl), ASCII or binary
    Stl,
    /// Polygon file format (.ply)
    Ply,
    /// Autodesk FBX (.fbx)
    Fbx,
    /// 3D Manufacturing Format (.3mf)
    ThreeMf,
}

impl ModelFormat {
    /// Detect the format from a file name or path, by extension.
    ///
    /// Matching is case-insensitive. Returns `None` for unknown extensions;
    /// the session controller turns that into a terminal failure without
    /// attempting a fetch.
    pub fn from_path(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?;
        if ext.len() == name.len() {
            // No '.' at all
            return None;
        }
        match ext.to_ascii_lowercase().as_str() {
            "gltf" => Some(Self::Gltf),
            "glb" => Some(Self::Glb),
            "obj" => Some(Self::Obj),
            "stl" => Some(Self::Stl),
            "ply" => Some(Self::Ply),
            "fbx" => Some(Self::Fbx),
            "3mf" => Some(Self::ThreeMf),
            _ => None,
        }
    }

    /// Whether files of this format may reference auxiliary files that have
    /// to be fetched separately.
    ///
    /// GLB counts as multi-file because the container format permits
    /// external buffer/image URIs even though most GLB files are
    /// self-contained.
    pub fn is_multi_file(&self) -> bool {
        matches!(self, Self::Gltf | Self::Glb | Self::Obj)
    }

    /// Canonical lowercase extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::Obj => "obj",
            Self::Stl => "stl",
            Self::Ply => "ply",
            Self::Fbx => "fbx",
            Self::ThreeMf => "3mf",
        }
    }

    /// Human-readable format name for diagnostics and notifications
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gltf => "glTF",
            Self::Glb => "Binary glTF",
            Self::Obj => "Wavefront OBJ",
            Self::Stl => "STL",
            Self::Ply => "PLY",
            Self::Fbx => "FBX",
            Self::ThreeMf => "3MF",
        }
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(ModelFormat::from_path("model.obj"), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_path("scene.gltf"), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path("scene.glb"), Some(ModelFormat::Glb));
        assert_eq!(ModelFormat::from_path("part.3mf"), Some(ModelFormat::ThreeMf));
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(ModelFormat::from_path("MODEL.OBJ"), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_path("Scene.GlTf"), Some(ModelFormat::Gltf));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(ModelFormat::from_path("notes.txt"), None);
        assert_eq!(ModelFormat::from_path("archive.zip"), None);
        assert_eq!(ModelFormat::from_path("no_extension"), None);
    }

    #[test]
    fn test_nested_path() {
        assert_eq!(
            ModelFormat::from_path("models/cars/model.stl"),
            Some(ModelFormat::Stl)
        );
    }

    #[test]
    fn test_multi_file_split() {
        assert!(ModelFormat::Obj.is_multi_file());
        assert!(ModelFormat::Gltf.is_multi_file());
        assert!(ModelFormat::Glb.is_multi_file());
        assert!(!ModelFormat::Stl.is_multi_file());
        assert!(!ModelFormat::Ply.is_multi_file());
        assert!(!ModelFormat::Fbx.is_multi_file());
        assert!(!ModelFormat::ThreeMf.is_multi_file());
    }
}
