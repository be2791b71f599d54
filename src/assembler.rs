//! Model assembly
//!
//! Turns main-file bytes plus the resolved dependency set into a renderable
//! [`SceneHandle`]. Geometry and material decoding are delegated to format
//! crates (`gltf`, `tobj`); this module's job is matching dependency bytes
//! to the reference strings the parser extracted and substituting
//! placeholders where a dependency is missing.

use crate::format::ModelFormat;
use crate::model::{AssetOutcome, AssetSet, DependencyRole, ModelReference};
use crate::scene::{
    AlphaMode, PrimitiveType, SceneHandle, SceneMaterial, SceneMesh, SceneNode, SceneTexture,
    Transform, Vertex,
};
use base64::Engine as _;
use glam::Vec3;
use gltf::Gltf;
use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use thiserror::Error;

/// Error type for assembly failures
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The main file's structure could not be parsed
    #[error("{format} parse error in {stage}: {message}")]
    Parse {
        format: ModelFormat,
        stage: &'static str,
        message: String,
    },

    /// The file parsed but its geometry is unusable
    #[error("{format} geometry error in {stage}: {message}")]
    Geometry {
        format: ModelFormat,
        stage: &'static str,
        message: String,
    },

    /// The format is recognized but its decoder is not wired in
    #[error("{format} preview requires {feature}")]
    MissingFeature {
        format: ModelFormat,
        feature: &'static str,
    },
}

/// A dependency that was substituted with a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedAsset {
    /// Raw reference string from the main file
    pub reference: String,
    pub role: DependencyRole,
    pub reason: String,
}

/// Assembly output: the scene plus everything that had to be substituted
#[derive(Debug, Clone)]
pub struct AssembledScene {
    pub scene: SceneHandle,
    pub degraded: Vec<DegradedAsset>,
}

impl AssembledScene {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Builds scenes from main-file bytes and resolved dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelAssembler;

impl ModelAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble a scene for the given model.
    ///
    /// Per-dependency failures degrade to placeholders; only a main file
    /// whose own structure or geometry is unusable fails assembly.
    pub fn assemble(
        &self,
        model: &ModelReference,
        main: &[u8],
        assets: &AssetSet,
    ) -> Result<AssembledScene, AssemblyError> {
        log::debug!(
            "assembling {} ({}) with {} resolved dependencies",
            model.name,
            model.format,
            assets.len()
        );
        match model.format {
            ModelFormat::Obj => self.assemble_obj(model, main, assets),
            ModelFormat::Gltf | ModelFormat::Glb => self.assemble_gltf(model, main, assets),
            ModelFormat::Stl => self.assemble_stl(model, main),
            ModelFormat::Ply | ModelFormat::Fbx | ModelFormat::ThreeMf => {
                Err(AssemblyError::MissingFeature {
                    format: model.format,
                    feature: "an external geometry decoder",
                })
            }
        }
    }

    // ---- OBJ -------------------------------------------------------------

    fn assemble_obj(
        &self,
        model: &ModelReference,
        main: &[u8],
        assets: &AssetSet,
    ) -> Result<AssembledScene, AssemblyError> {
        let mut degraded = fetch_failures(assets);

        let load_options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let mut reader = BufReader::new(Cursor::new(main));
        let (obj_models, material_result) =
            tobj::load_obj_buf(&mut reader, &load_options, |path| {
                let key = path.to_string_lossy();
                match assets.bytes_for(key.as_ref()) {
                    Some(bytes) => {
                        tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(&bytes[..])))
                    }
                    // Missing library: the fetch failure is already in the
                    // degraded list; give tobj an empty library so geometry
                    // still loads.
                    None => Ok((Vec::new(), Default::default())),
                }
            })
            .map_err(|err| AssemblyError::Parse {
                format: model.format,
                stage: "geometry",
                message: err.to_string(),
            })?;

        let obj_materials = material_result.unwrap_or_else(|err| {
            log::warn!("material libraries for {} unusable: {err}", model.name);
            Vec::new()
        });

        let mut scene = SceneHandle::default();
        let mut texture_slots: HashMap<String, usize> = HashMap::new();

        for mat in &obj_materials {
            let diffuse = mat.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            let alpha = mat.dissolve.unwrap_or(1.0);
            let base_color_texture = mat.diffuse_texture.as_deref().map(|name| {
                texture_slot(
                    name,
                    assets,
                    &mut scene.textures,
                    &mut texture_slots,
                    &mut degraded,
                )
            });
            scene.materials.push(SceneMaterial {
                name: Some(mat.name.clone()),
                base_color_factor: [diffuse[0], diffuse[1], diffuse[2], alpha],
                base_color_texture,
                alpha_mode: if alpha < 1.0 {
                    AlphaMode::Blend
                } else {
                    AlphaMode::Opaque
                },
                ..Default::default()
            });
        }
        if scene.materials.is_empty() {
            scene.materials.push(SceneMaterial {
                name: Some("default".to_string()),
                ..Default::default()
            });
        }

        for obj in &obj_models {
            let mesh = &obj.mesh;
            let vertex_count = mesh.positions.len() / 3;
            if vertex_count == 0 {
                log::warn!("object {:?} has no vertices, skipped", obj.name);
                continue;
            }

            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect();
            let normals: Vec<[f32; 3]> = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
            } else {
                generate_smooth_normals(&positions, &mesh.indices)
            };
            let uvs: Vec<[f32; 2]> = if mesh.texcoords.len() == vertex_count * 2 {
                mesh.texcoords.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
            } else {
                vec![[0.0, 0.0]; vertex_count]
            };

            let vertices = positions
                .iter()
                .zip(&normals)
                .zip(&uvs)
                .map(|((&position, &normal), &uv)| Vertex {
                    position,
                    normal,
                    uv,
                })
                .collect();

            let material_index = mesh
                .material_id
                .filter(|&id| id < scene.materials.len())
                .or(Some(0));
            scene.meshes.push(SceneMesh {
                name: Some(obj.name.clone()),
                primitive_type: PrimitiveType::Triangles,
                vertices,
                indices: mesh.indices.clone(),
                material_index,
            });
        }

        if scene.meshes.is_empty() {
            return Err(AssemblyError::Geometry {
                format: model.format,
                stage: "geometry",
                message: "file contains no renderable geometry".to_string(),
            });
        }

        push_root_node(&mut scene, &model.name);
        Ok(AssembledScene { scene, degraded })
    }

    // ---- glTF / GLB ------------------------------------------------------

    fn assemble_gltf(
        &self,
        model: &ModelReference,
        main: &[u8],
        assets: &AssetSet,
    ) -> Result<AssembledScene, AssemblyError> {
        let mut degraded = fetch_failures(assets);

        let gltf = Gltf::from_slice(main).map_err(|err| AssemblyError::Parse {
            format: model.format,
            stage: "document",
            message: err.to_string(),
        })?;
        let blob = gltf.blob.clone();

        // External buffers are required geometry; a missing one is a hard
        // assembly failure, unlike images.
        let mut buffers: Vec<Vec<u8>> = Vec::with_capacity(gltf.buffers().len());
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => {
                    blob.clone().ok_or_else(|| AssemblyError::Geometry {
                        format: model.format,
                        stage: "buffers",
                        message: "GLB is missing its binary chunk".to_string(),
                    })?
                }
                gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri, model.format)? {
                    Some(embedded) => embedded,
                    None => {
                        let raw = decoded_uri(uri);
                        match assets.bytes_for(&raw) {
                            Some(bytes) => bytes.to_vec(),
                            None => {
                                return Err(AssemblyError::Geometry {
                                    format: model.format,
                                    stage: "buffers",
                                    message: format!("external buffer {raw:?} is unavailable"),
                                })
                            }
                        }
                    }
                },
            };
            if data.len() < buffer.length() {
                return Err(AssemblyError::Geometry {
                    format: model.format,
                    stage: "buffers",
                    message: format!(
                        "buffer {} is {} bytes, expected at least {}",
                        buffer.index(),
                        data.len(),
                        buffer.length()
                    ),
                });
            }
            buffers.push(data);
        }

        let mut scene = SceneHandle::default();

        // One scene texture per glTF texture, decoded or placeholder, so
        // material indices carry over unchanged.
        for texture in gltf.textures() {
            let name = texture.name().map(|s| s.to_string());
            let image = texture.source();
            let tex = match image.source() {
                gltf::image::Source::View { view, .. } => {
                    let start = view.offset();
                    let end = start + view.length();
                    match buffers
                        .get(view.buffer().index())
                        .and_then(|b| b.get(start..end))
                    {
                        Some(slice) => decode_or_placeholder(
                            slice,
                            name.clone(),
                            &format!("images[{}]", image.index()),
                            DependencyRole::Texture,
                            &mut degraded,
                        ),
                        None => {
                            degrade(
                                &mut degraded,
                                format!("images[{}]", image.index()),
                                DependencyRole::Texture,
                                "image buffer view is out of bounds",
                            );
                            SceneTexture::placeholder(name.clone())
                        }
                    }
                }
                gltf::image::Source::Uri { uri, .. } => {
                    // A corrupt embedded image degrades; only buffers are
                    // load-bearing enough to fail assembly.
                    match decode_data_uri(uri, model.format).unwrap_or_default() {
                        Some(embedded) => decode_or_placeholder(
                            &embedded,
                            name.clone(),
                            &format!("images[{}]", image.index()),
                            DependencyRole::Texture,
                            &mut degraded,
                        ),
                        None if uri.starts_with("data:") => {
                            degrade(
                                &mut degraded,
                                format!("images[{}]", image.index()),
                                DependencyRole::Texture,
                                "embedded image data is unreadable",
                            );
                            SceneTexture::placeholder(name.clone())
                        }
                        None => {
                            let raw = decoded_uri(uri);
                            match assets.bytes_for(&raw) {
                                Some(bytes) => decode_or_placeholder(
                                    bytes,
                                    name.clone(),
                                    &raw,
                                    DependencyRole::Texture,
                                    &mut degraded,
                                ),
                                // Fetch failure already recorded
                                None => SceneTexture::placeholder(name.clone()),
                            }
                        }
                    }
                }
            };
            scene.textures.push(tex);
        }

        for material in gltf.materials() {
            let pbr = material.pbr_metallic_roughness();
            scene.materials.push(SceneMaterial {
                name: material.name().map(|s| s.to_string()),
                base_color_factor: pbr.base_color_factor(),
                base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
                metallic_factor: pbr.metallic_factor(),
                roughness_factor: pbr.roughness_factor(),
                emissive_factor: material.emissive_factor(),
                alpha_mode: match material.alpha_mode() {
                    gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
                    gltf::material::AlphaMode::Mask => AlphaMode::Mask,
                    gltf::material::AlphaMode::Blend => AlphaMode::Blend,
                },
                double_sided: material.double_sided(),
            });
        }

        let mut mesh_slots: Vec<Vec<usize>> = Vec::with_capacity(gltf.meshes().len());
        for mesh in gltf.meshes() {
            let mut slots = Vec::new();
            for primitive in mesh.primitives() {
                let primitive_type = match primitive.mode() {
                    gltf::mesh::Mode::Points => PrimitiveType::Points,
                    gltf::mesh::Mode::Lines => PrimitiveType::Lines,
                    gltf::mesh::Mode::LineLoop | gltf::mesh::Mode::LineStrip => {
                        PrimitiveType::LineStrip
                    }
                    gltf::mesh::Mode::Triangles => PrimitiveType::Triangles,
                    gltf::mesh::Mode::TriangleStrip => PrimitiveType::TriangleStrip,
                    gltf::mesh::Mode::TriangleFan => PrimitiveType::TriangleFan,
                };

                let reader = primitive
                    .reader(|buffer| buffers.get(buffer.index()).map(|data| data.as_slice()));

                let positions: Vec<[f32; 3]> = match reader.read_positions() {
                    Some(iter) => iter.collect(),
                    None => {
                        return Err(AssemblyError::Geometry {
                            format: model.format,
                            stage: "primitives",
                            message: format!(
                                "mesh {} primitive {} has no positions",
                                mesh.index(),
                                primitive.index()
                            ),
                        })
                    }
                };

                let indices: Vec<u32> = match reader.read_indices() {
                    Some(iter) => iter.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                };

                let normals: Vec<[f32; 3]> = match reader.read_normals() {
                    Some(iter) => iter.collect(),
                    None => generate_smooth_normals(&positions, &indices),
                };

                let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                    Some(iter) => iter.into_f32().collect(),
                    None => vec![[0.0, 0.0]; positions.len()],
                };

                let vertices = positions
                    .iter()
                    .enumerate()
                    .map(|(i, &position)| Vertex {
                        position,
                        normal: normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
                        uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    })
                    .collect();

                slots.push(scene.meshes.len());
                scene.meshes.push(SceneMesh {
                    name: mesh.name().map(|s| s.to_string()),
                    primitive_type,
                    vertices,
                    indices,
                    material_index: primitive.material().index(),
                });
            }
            mesh_slots.push(slots);
        }

        for node in gltf.nodes() {
            let (translation, rotation, scale) = node.transform().decomposed();
            scene.nodes.push(SceneNode {
                name: node.name().map(|s| s.to_string()),
                transform: Transform {
                    translation,
                    rotation,
                    scale,
                },
                mesh_indices: node
                    .mesh()
                    .map(|m| mesh_slots[m.index()].clone())
                    .unwrap_or_default(),
                children: node.children().map(|c| c.index()).collect(),
            });
        }

        scene.roots = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .map(|s| s.nodes().map(|n| n.index()).collect())
            .unwrap_or_default();

        Ok(AssembledScene { scene, degraded })
    }

    // ---- STL -------------------------------------------------------------

    fn assemble_stl(
        &self,
        model: &ModelReference,
        main: &[u8],
    ) -> Result<AssembledScene, AssemblyError> {
        let triangles = if is_ascii_stl(main) {
            parse_ascii_stl(main)
        } else {
            parse_binary_stl(main, model.format)?
        };

        if triangles.is_empty() {
            return Err(AssemblyError::Geometry {
                format: model.format,
                stage: "facets",
                message: "file contains no triangles".to_string(),
            });
        }

        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        for tri in &triangles {
            let normal = facet_normal(tri);
            for &position in &tri.vertices {
                vertices.push(Vertex {
                    position,
                    normal,
                    uv: [0.0, 0.0],
                });
            }
        }
        let indices = (0..vertices.len() as u32).collect();

        let mut scene = SceneHandle {
            materials: vec![SceneMaterial {
                name: Some("default".to_string()),
                base_color_factor: [0.8, 0.8, 0.8, 1.0],
                ..Default::default()
            }],
            ..Default::default()
        };
        scene.meshes.push(SceneMesh {
            name: Some(model.name.clone()),
            primitive_type: PrimitiveType::Triangles,
            vertices,
            indices,
            material_index: Some(0),
        });
        push_root_node(&mut scene, &model.name);

        Ok(AssembledScene {
            scene,
            degraded: Vec::new(),
        })
    }
}

struct StlTriangle {
    normal: [f32; 3],
    vertices: [[f32; 3]; 3],
}

fn is_ascii_stl(bytes: &[u8]) -> bool {
    // Binary STL files are allowed to start with "solid" too, so check for
    // an actual facet directive in the body.
    bytes.starts_with(b"solid")
        && String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).contains("facet")
}

fn parse_ascii_stl(bytes: &[u8]) -> Vec<StlTriangle> {
    let text = String::from_utf8_lossy(bytes);
    let mut triangles = Vec::new();
    let mut normal = [0.0f32; 3];
    let mut vertices: Vec<[f32; 3]> = Vec::with_capacity(3);

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                // "facet normal nx ny nz"
                let rest: Vec<f32> = tokens.skip(1).filter_map(|t| t.parse().ok()).collect();
                normal = match rest.as_slice() {
                    [x, y, z] => [*x, *y, *z],
                    _ => [0.0; 3],
                };
                vertices.clear();
            }
            Some("vertex") => {
                let coords: Vec<f32> = tokens.filter_map(|t| t.parse().ok()).collect();
                if let [x, y, z] = coords.as_slice() {
                    vertices.push([*x, *y, *z]);
                } else {
                    log::warn!("skipping malformed STL vertex line: {line:?}");
                }
            }
            Some("endfacet") => {
                if vertices.len() == 3 {
                    triangles.push(StlTriangle {
                        normal,
                        vertices: [vertices[0], vertices[1], vertices[2]],
                    });
                } else {
                    log::warn!("skipping STL facet with {} vertices", vertices.len());
                }
            }
            _ => {}
        }
    }
    triangles
}

fn parse_binary_stl(bytes: &[u8], format: ModelFormat) -> Result<Vec<StlTriangle>, AssemblyError> {
    if bytes.len() < 84 {
        return Err(AssemblyError::Parse {
            format,
            stage: "header",
            message: format!("{} bytes is too short for a binary STL", bytes.len()),
        });
    }
    let declared = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let available = (bytes.len() - 84) / 50;
    if declared > available {
        log::warn!("STL declares {declared} triangles but only {available} fit, truncating");
    }
    let count = declared.min(available);

    let mut triangles = Vec::with_capacity(count);
    for i in 0..count {
        let base = 84 + i * 50;
        let f = |offset: usize| {
            f32::from_le_bytes([
                bytes[base + offset],
                bytes[base + offset + 1],
                bytes[base + offset + 2],
                bytes[base + offset + 3],
            ])
        };
        triangles.push(StlTriangle {
            normal: [f(0), f(4), f(8)],
            vertices: [
                [f(12), f(16), f(20)],
                [f(24), f(28), f(32)],
                [f(36), f(40), f(44)],
            ],
        });
    }
    Ok(triangles)
}

/// Use the stored facet normal when it is usable, otherwise compute one
fn facet_normal(tri: &StlTriangle) -> [f32; 3] {
    let stored = Vec3::from_array(tri.normal);
    if stored.length_squared() > 1e-6 {
        return stored.normalize().to_array();
    }
    let v0 = Vec3::from_array(tri.vertices[0]);
    let v1 = Vec3::from_array(tri.vertices[1]);
    let v2 = Vec3::from_array(tri.vertices[2]);
    let normal = (v1 - v0).cross(v2 - v0);
    if normal.length_squared() > 1e-6 {
        normal.normalize().to_array()
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Accumulate face normals per vertex, then normalize
fn generate_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for chunk in indices.chunks_exact(3) {
        let (i0, i1, i2) = (chunk[0] as usize, chunk[1] as usize, chunk[2] as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            log::warn!("index out of bounds while generating normals, skipped");
            continue;
        }
        let v0 = Vec3::from_array(positions[i0]);
        let v1 = Vec3::from_array(positions[i1]);
        let v2 = Vec3::from_array(positions[i2]);
        let normal = (v1 - v0).cross(v2 - v0);
        if normal.length_squared() > 1e-6 {
            let normal = normal.normalize();
            for &i in &[i0, i1, i2] {
                normals[i][0] += normal.x;
                normals[i][1] += normal.y;
                normals[i][2] += normal.z;
            }
        }
    }

    for normal in &mut normals {
        let n = Vec3::from_array(*normal);
        *normal = if n.length_squared() > 1e-6 {
            n.normalize().to_array()
        } else {
            [0.0, 0.0, 1.0]
        };
    }
    normals
}

/// All fetch failures from the resolved set, in first-appearance order
fn fetch_failures(assets: &AssetSet) -> Vec<DegradedAsset> {
    assets
        .iter()
        .filter_map(|asset| match &asset.outcome {
            AssetOutcome::Failed(err) => Some(DegradedAsset {
                reference: asset.reference.raw.clone(),
                role: asset.reference.role,
                reason: err.to_string(),
            }),
            AssetOutcome::Fetched(_) => None,
        })
        .collect()
}

fn degrade(
    degraded: &mut Vec<DegradedAsset>,
    reference: String,
    role: DependencyRole,
    reason: &str,
) {
    log::warn!("degrading {reference:?}: {reason}");
    degraded.push(DegradedAsset {
        reference,
        role,
        reason: reason.to_string(),
    });
}

/// Slot index for a named OBJ texture, decoding it on first use
fn texture_slot(
    name: &str,
    assets: &AssetSet,
    textures: &mut Vec<SceneTexture>,
    slots: &mut HashMap<String, usize>,
    degraded: &mut Vec<DegradedAsset>,
) -> usize {
    if let Some(&slot) = slots.get(name) {
        return slot;
    }

    // tobj keeps any option flags in the texture name; the parser's raw
    // reference is the last token.
    let bytes = assets
        .bytes_for(name)
        .or_else(|| name.split_whitespace().last().and_then(|t| assets.bytes_for(t)));

    let texture = match bytes {
        Some(bytes) => decode_or_placeholder(
            bytes,
            Some(name.to_string()),
            name,
            DependencyRole::Texture,
            degraded,
        ),
        // Fetch failure already recorded by fetch_failures()
        None => SceneTexture::placeholder(Some(name.to_string())),
    };

    let slot = textures.len();
    textures.push(texture);
    slots.insert(name.to_string(), slot);
    slot
}

/// Decode image bytes to RGBA8, falling back to the placeholder
fn decode_or_placeholder(
    bytes: &[u8],
    name: Option<String>,
    reference: &str,
    role: DependencyRole,
    degraded: &mut Vec<DegradedAsset>,
) -> SceneTexture {
    match decode_texture(bytes, name.clone()) {
        Ok(texture) => texture,
        Err(reason) => {
            degrade(degraded, reference.to_string(), role, &reason);
            SceneTexture::placeholder(name)
        }
    }
}

fn decode_texture(bytes: &[u8], name: Option<String>) -> Result<SceneTexture, String> {
    let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
    match format {
        image::ImageFormat::Jpeg | image::ImageFormat::Png => {}
        other => {
            return Err(format!(
                "unsupported image format {:?}",
                other.extensions_str()
            ))
        }
    }

    let img = image::io::Reader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| e.to_string())?;
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(SceneTexture {
        name,
        width,
        height,
        data: rgba.into_raw(),
        placeholder: false,
    })
}

/// Decode a `data:` URI payload; `Ok(None)` when the URI is external
fn decode_data_uri(uri: &str, format: ModelFormat) -> Result<Option<Vec<u8>>, AssemblyError> {
    if !uri.starts_with("data:") {
        return Ok(None);
    }
    let payload = uri
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| AssemblyError::Parse {
            format,
            stage: "data-uri",
            message: "data URI without base64 payload".to_string(),
        })?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map(Some)
        .map_err(|err| AssemblyError::Parse {
            format,
            stage: "data-uri",
            message: err.to_string(),
        })
}

fn decoded_uri(uri: &str) -> String {
    urlencoding::decode(uri)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| uri.to_string())
}

/// Single root node referencing every mesh, for formats without a hierarchy
fn push_root_node(scene: &mut SceneHandle, name: &str) {
    scene.nodes.push(SceneNode {
        name: Some(name.to_string()),
        mesh_indices: (0..scene.meshes.len()).collect(),
        ..Default::default()
    });
    scene.roots = vec![scene.nodes.len() - 1];
}
