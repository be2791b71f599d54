//! Dependency parsing
//!
//! Format-specific scanners that extract auxiliary file references from a
//! main file's content. Parsing is pure and total: malformed directives or
//! manifest entries are skipped with a recorded diagnostic, never an error.

pub mod gltf;
pub mod obj;

use crate::format::ModelFormat;
use crate::model::DependencyReference;

/// A skipped directive or manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// Where the problem was found (line number or manifest slot)
    pub location: String,
    pub message: String,
}

impl ParseDiagnostic {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// References extracted from one file, plus anything skipped along the way
#[derive(Debug, Default, Clone)]
pub struct ParseOutcome {
    /// Deduplicated by raw string, first-appearance order preserved
    pub references: Vec<DependencyReference>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Record a reference unless the same raw string was already seen
    fn push_unique(&mut self, reference: DependencyReference) {
        if self.references.iter().any(|r| r.raw == reference.raw) {
            log::debug!("duplicate reference {:?} collapsed", reference.raw);
            return;
        }
        self.references.push(reference);
    }
}

/// Extract first-level dependency references from a main file.
///
/// Single-file formats yield no references. Second-level references (the
/// textures named inside a fetched material library) are extracted by the
/// resolver via [`obj::parse_mtl`] once the material content is available.
pub fn parse_dependencies(bytes: &[u8], format: ModelFormat) -> ParseOutcome {
    match format {
        ModelFormat::Obj => obj::parse_obj(bytes),
        ModelFormat::Gltf | ModelFormat::Glb => gltf::parse_manifest(bytes),
        ModelFormat::Stl | ModelFormat::Ply | ModelFormat::Fbx | ModelFormat::ThreeMf => {
            ParseOutcome::default()
        }
    }
}
