//! glTF/GLB manifest scanning
//!
//! A glTF document declares its external resources up front: `buffers[]`
//! and `images[]` entries carry either a URI or embedded data. Only the
//! external URIs become dependency references; `data:` URIs and
//! buffer-view images need no fetch.

use super::{ParseDiagnostic, ParseOutcome};
use crate::model::{DependencyReference, DependencyRole, ReferenceOrigin};
use gltf::Gltf;

/// Extract external buffer and image references from a glTF or GLB file.
///
/// A document that fails to parse yields zero references plus a diagnostic;
/// the assembler reports the underlying error as a session failure later,
/// with nothing fetched in the meantime.
pub fn parse_manifest(bytes: &[u8]) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let gltf = match Gltf::from_slice(bytes) {
        Ok(gltf) => gltf,
        Err(err) => {
            log::warn!("glTF manifest unreadable, no dependencies extracted: {err}");
            outcome.diagnostics.push(ParseDiagnostic::new(
                "document",
                format!("unreadable glTF document: {err}"),
            ));
            return outcome;
        }
    };

    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {}
            gltf::buffer::Source::Uri(uri) => {
                let origin = ReferenceOrigin::ManifestEntry {
                    array: "buffers",
                    index: buffer.index(),
                };
                if let Some(raw) = external_uri(uri, &origin, &mut outcome) {
                    outcome.push_unique(DependencyReference::new(
                        raw,
                        DependencyRole::BinaryBuffer,
                        origin,
                    ));
                }
            }
        }
    }

    for image in gltf.images() {
        match image.source() {
            gltf::image::Source::View { .. } => {}
            gltf::image::Source::Uri { uri, .. } => {
                let origin = ReferenceOrigin::ManifestEntry {
                    array: "images",
                    index: image.index(),
                };
                if let Some(raw) = external_uri(uri, &origin, &mut outcome) {
                    outcome.push_unique(DependencyReference::new(
                        raw,
                        DependencyRole::Texture,
                        origin,
                    ));
                }
            }
        }
    }

    outcome
}

/// Percent-decode an external URI; `data:` URIs are embedded content and
/// produce no reference.
fn external_uri(uri: &str, origin: &ReferenceOrigin, outcome: &mut ParseOutcome) -> Option<String> {
    if uri.starts_with("data:") {
        return None;
    }
    match urlencoding::decode(uri) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(err) => {
            outcome.diagnostics.push(ParseDiagnostic::new(
                format!("{origin:?}"),
                format!("URI is not valid percent-encoded UTF-8: {err}"),
            ));
            None
        }
    }
}
