//! Wavefront OBJ and MTL directive scanning
//!
//! OBJ files name their material libraries with `mtllib`; the libraries in
//! turn name texture images in `map_*` and related directives. The scanners
//! here only extract those references; geometry and material decoding stay
//! in the assembler.

use super::{ParseDiagnostic, ParseOutcome};
use crate::model::{DependencyReference, DependencyRole, ReferenceOrigin};

/// MTL directives whose argument is a texture file.
///
/// `refl` and the bump/displacement family accept option flags (`-bm`,
/// `-o`, ...) before the filename, so the filename is taken as the last
/// whitespace token of the line.
const TEXTURE_DIRECTIVES: &[&str] = &[
    "map_ka", "map_kd", "map_ks", "map_ns", "map_d", "map_bump", "bump", "disp", "decal", "refl",
    "norm",
];

/// Scan OBJ content for `mtllib` directives.
///
/// The remainder of the line after `mtllib` is taken as one library name;
/// material library names with spaces are common in user uploads and the
/// multi-library variant of the directive is rare by comparison.
pub fn parse_obj(bytes: &[u8]) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let text = String::from_utf8_lossy(bytes);

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((keyword, rest)) = split_directive(line) else {
            continue;
        };
        if !keyword.eq_ignore_ascii_case("mtllib") {
            continue;
        }

        let name = rest.trim();
        if name.is_empty() {
            outcome.diagnostics.push(ParseDiagnostic::new(
                format!("line {line_no}"),
                "mtllib directive without a library name",
            ));
            continue;
        }

        outcome.push_unique(DependencyReference::new(
            name,
            DependencyRole::Material,
            ReferenceOrigin::Line(line_no),
        ));
    }

    outcome
}

/// Scan MTL content for texture references.
///
/// Called by the resolver on each successfully fetched material library;
/// this is the second hop of the dependency graph.
pub fn parse_mtl(bytes: &[u8]) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let text = String::from_utf8_lossy(bytes);

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((keyword, rest)) = split_directive(line) else {
            continue;
        };
        let keyword = keyword.to_ascii_lowercase();
        if !TEXTURE_DIRECTIVES.contains(&keyword.as_str()) {
            continue;
        }

        // Option flags precede the filename; the filename is the last token.
        let Some(name) = rest.split_whitespace().last() else {
            outcome.diagnostics.push(ParseDiagnostic::new(
                format!("line {line_no}"),
                format!("{keyword} directive without a file name"),
            ));
            continue;
        };

        outcome.push_unique(DependencyReference::new(
            name,
            DependencyRole::Texture,
            ReferenceOrigin::Line(line_no),
        ));
    }

    outcome
}

fn split_directive(line: &str) -> Option<(&str, &str)> {
    let keyword = line.split_whitespace().next()?;
    let rest = &line[keyword.len()..];
    Some((keyword, rest))
}
