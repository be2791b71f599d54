//! Renderable scene graph produced by assembly
//!
//! A format-agnostic node graph: meshes with interleaved vertices,
//! materials, decoded RGBA8 textures, and a node hierarchy. The rendering
//! layer consumes this handle; nothing here knows about any particular
//! model format.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex attributes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Type of primitive to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// How to handle transparency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    Opaque,
    Mask,
    Blend,
}

/// Material properties for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMaterial {
    pub name: Option<String>,
    /// Base color factor (RGBA)
    pub base_color_factor: [f32; 4],
    /// Index into [`SceneHandle::textures`]
    pub base_color_texture: Option<usize>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
}

impl Default for SceneMaterial {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 0.0,
            roughness_factor: 0.8,
            emissive_factor: [0.0, 0.0, 0.0],
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
        }
    }
}

/// A decoded RGBA8 texture
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTexture {
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels
    pub data: Vec<u8>,
    /// True when this texture stands in for one that could not be loaded
    pub placeholder: bool,
}

impl SceneTexture {
    /// 1x1 white stand-in for a texture that failed to fetch or decode
    pub fn placeholder(name: Option<String>) -> Self {
        Self {
            name,
            width: 1,
            height: 1,
            data: vec![255, 255, 255, 255],
            placeholder: true,
        }
    }
}

/// A mesh with interleaved vertex data and a material index
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMesh {
    pub name: Option<String>,
    pub primitive_type: PrimitiveType,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Index into [`SceneHandle::materials`]
    pub material_index: Option<usize>,
}

impl SceneMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        match self.primitive_type {
            PrimitiveType::Triangles => self.indices.len() / 3,
            _ => 0,
        }
    }

    /// Vertex data as bytes, for upload by the rendering layer
    pub fn vertex_buffer(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as bytes
    pub fn index_buffer(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds of the mesh, `None` when it has no vertices
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut vertices = self.vertices.iter();
        let first = Vec3::from_array(vertices.next()?.position);
        let mut min = first;
        let mut max = first;
        for v in vertices {
            let p = Vec3::from_array(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        Some((min, max))
    }
}

/// Spatial transform (translation, rotation, scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Indices into [`SceneHandle::meshes`]
    pub mesh_indices: Vec<usize>,
    /// Indices of child nodes
    pub children: Vec<usize>,
}

/// The assembled, renderable scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneHandle {
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
    pub textures: Vec<SceneTexture>,
    pub nodes: Vec<SceneNode>,
    /// Indices of root nodes
    pub roots: Vec<usize>,
}

impl SceneHandle {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }

    /// Union of all mesh bounds, ignoring node transforms
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut acc: Option<(Vec3, Vec3)> = None;
        for mesh in &self.meshes {
            if let Some((min, max)) = mesh.bounds() {
                acc = Some(match acc {
                    Some((amin, amax)) => (amin.min(min), amax.max(max)),
                    None => (min, max),
                });
            }
        }
        acc
    }
}
