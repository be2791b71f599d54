//! Core data model for load requests and resolved dependencies

use crate::fetch::{FetchError, FetchedFile};
use crate::format::ModelFormat;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifies the main file of a load session.
///
/// Immutable once a session starts; a new selection in the viewer produces
/// a new `ModelReference` and a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    /// Stable file identifier understood by the storage backend
    pub file_id: u64,
    /// Display name, e.g. `model.obj`
    pub name: String,
    /// Directory of the main file relative to the storage root; dependency
    /// references are resolved against this
    pub container: String,
    /// Detected format tag
    pub format: ModelFormat,
}

impl ModelReference {
    /// Build a reference, detecting the format from the file name.
    ///
    /// Returns `None` for unsupported extensions so callers can fail the
    /// session before any fetch happens.
    pub fn new(file_id: u64, name: impl Into<String>, container: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let format = ModelFormat::from_path(&name)?;
        Some(Self {
            file_id,
            name,
            container: container.into(),
            format,
        })
    }
}

/// What a dependency is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyRole {
    /// Material definition (e.g. an MTL library)
    Material,
    /// Texture image
    Texture,
    /// External geometry/binary buffer (e.g. a glTF .bin)
    BinaryBuffer,
}

/// Where in the main file a reference was found, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOrigin {
    /// 1-based line number in a text format
    Line(usize),
    /// Slot in a manifest array, e.g. `buffers[2]`
    ManifestEntry { array: &'static str, index: usize },
}

/// A name or relative path extracted from a main file's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReference {
    /// The exact reference string as it appeared in the content
    pub raw: String,
    pub role: DependencyRole,
    pub origin: ReferenceOrigin,
}

impl DependencyReference {
    pub fn new(raw: impl Into<String>, role: DependencyRole, origin: ReferenceOrigin) -> Self {
        Self {
            raw: raw.into(),
            role,
            origin,
        }
    }
}

/// Outcome of fetching one dependency
#[derive(Debug, Clone)]
pub enum AssetOutcome {
    Fetched(FetchedFile),
    Failed(FetchError),
}

/// A dependency reference paired with its fetch outcome
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub reference: DependencyReference,
    pub outcome: AssetOutcome,
}

impl ResolvedAsset {
    pub fn fetched(reference: DependencyReference, file: FetchedFile) -> Self {
        Self {
            reference,
            outcome: AssetOutcome::Fetched(file),
        }
    }

    pub fn failed(reference: DependencyReference, error: FetchError) -> Self {
        Self {
            reference,
            outcome: AssetOutcome::Failed(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, AssetOutcome::Failed(_))
    }

    pub fn bytes(&self) -> Option<&Arc<[u8]>> {
        match &self.outcome {
            AssetOutcome::Fetched(file) => Some(&file.bytes),
            AssetOutcome::Failed(_) => None,
        }
    }
}

/// Resolved assets keyed by raw reference string.
///
/// Duplicate references collapse to one entry; first-appearance order is
/// preserved so diagnostics and degraded-asset lists are deterministic.
#[derive(Debug, Default, Clone)]
pub struct AssetSet {
    assets: Vec<ResolvedAsset>,
    index: HashMap<String, usize>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolved asset; a later duplicate of the same raw reference
    /// is ignored.
    pub fn insert(&mut self, asset: ResolvedAsset) {
        if self.index.contains_key(&asset.reference.raw) {
            return;
        }
        self.index
            .insert(asset.reference.raw.clone(), self.assets.len());
        self.assets.push(asset);
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.index.contains_key(raw)
    }

    pub fn get(&self, raw: &str) -> Option<&ResolvedAsset> {
        self.index.get(raw).map(|&i| &self.assets[i])
    }

    /// Fetched bytes for a raw reference, if the fetch succeeded
    pub fn bytes_for(&self, raw: &str) -> Option<&Arc<[u8]>> {
        self.get(raw).and_then(|a| a.bytes())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// References whose fetch failed, in first-appearance order
    pub fn degraded(&self) -> Vec<&ResolvedAsset> {
        self.assets.iter().filter(|a| a.is_failed()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture_ref(raw: &str) -> DependencyReference {
        DependencyReference::new(raw, DependencyRole::Texture, ReferenceOrigin::Line(1))
    }

    #[test]
    fn test_model_reference_detects_format() {
        let model = ModelReference::new(1, "model.obj", "models").unwrap();
        assert_eq!(model.format, ModelFormat::Obj);
        assert!(ModelReference::new(2, "readme.txt", "").is_none());
    }

    #[test]
    fn test_asset_set_dedup_keeps_first() {
        let mut set = AssetSet::new();
        set.insert(ResolvedAsset::fetched(
            texture_ref("a.png"),
            FetchedFile::new(b"first".to_vec(), "v1"),
        ));
        set.insert(ResolvedAsset::fetched(
            texture_ref("a.png"),
            FetchedFile::new(b"second".to_vec(), "v2"),
        ));

        assert_eq!(set.len(), 1);
        assert_eq!(&**set.bytes_for("a.png").unwrap(), b"first");
    }

    #[test]
    fn test_asset_set_degraded_order() {
        let mut set = AssetSet::new();
        set.insert(ResolvedAsset::failed(
            texture_ref("b.png"),
            FetchError::NotFound,
        ));
        set.insert(ResolvedAsset::fetched(
            texture_ref("c.png"),
            FetchedFile::new(b"ok".to_vec(), "v1"),
        ));
        set.insert(ResolvedAsset::failed(
            texture_ref("a.png"),
            FetchError::PermissionDenied,
        ));

        let degraded: Vec<_> = set
            .degraded()
            .iter()
            .map(|a| a.reference.raw.clone())
            .collect();
        assert_eq!(degraded, vec!["b.png", "a.png"]);
    }
}
