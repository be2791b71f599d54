//! End-to-end pipeline tests: activation through assembly

use futures::executor::block_on;
use std::io::Cursor;
use std::sync::Arc;
use viewer_asset::{
    DependencyCache, FetchError, LoadController, LoadRequest, MockFetcher, SessionError,
    SessionState, ViewerContext,
};

const MODEL_OBJ: &[u8] = b"mtllib model.mtl\n\
    v 0 0 0\nv 1 0 0\nv 0 1 0\n\
    vt 0 0\nvt 1 0\nvt 0 1\n\
    usemtl painted\n\
    f 1/1 2/2 3/3\n";

const MODEL_MTL: &[u8] = b"newmtl painted\nKd 0.9 0.2 0.2\nmap_Kd texture.jpg\n";

fn jpeg_1x1() -> Vec<u8> {
    let mut img = image::RgbImage::new(1, 1);
    img.put_pixel(0, 0, image::Rgb([255, 255, 255]));
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Jpeg)
        .expect("encode test jpeg");
    data
}

fn controller(storage: &MockFetcher) -> LoadController<MockFetcher> {
    LoadController::new(
        storage.clone(),
        Arc::new(DependencyCache::new(16 * 1024 * 1024)),
        ViewerContext::default(),
    )
}

#[test]
fn test_obj_two_hop_all_dependencies_succeed() {
    let storage = MockFetcher::new();
    storage.insert_id(1, MODEL_OBJ.to_vec());
    storage.insert_path("gallery/model.mtl", MODEL_MTL.to_vec());
    storage.insert_path("gallery/texture.jpg", jpeg_1x1());

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(1, "model.obj", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    let scene = handle.scene().unwrap();
    assert!(scene.degraded.is_empty());
    assert_eq!(scene.scene.meshes.len(), 1);
    assert_eq!(scene.scene.materials[0].name.as_deref(), Some("painted"));
    assert!(!scene.scene.textures[0].placeholder);
}

#[test]
fn test_missing_texture_completes_degraded() {
    let storage = MockFetcher::new();
    storage.insert_id(1, MODEL_OBJ.to_vec());
    storage.insert_path("gallery/model.mtl", MODEL_MTL.to_vec());
    // texture.jpg is not registered -> NotFound

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(1, "model.obj", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    let scene = handle.scene().unwrap();
    let degraded: Vec<_> = scene
        .degraded
        .iter()
        .map(|d| d.reference.as_str())
        .collect();
    assert_eq!(degraded, vec!["texture.jpg"]);
    // Placeholder substituted, scene still renders
    assert!(scene.scene.textures[0].placeholder);
    assert_eq!(scene.scene.meshes[0].triangle_count(), 1);
}

#[test]
fn test_main_file_permission_denied_fails_session() {
    let storage = MockFetcher::new();
    storage.fail_id(1, FetchError::PermissionDenied);

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(1, "model.obj", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Failed);
    assert!(matches!(
        *handle.error().unwrap(),
        SessionError::MainFileFetch(FetchError::PermissionDenied)
    ));
    // No dependency parsing or fetching was attempted
    assert_eq!(storage.total_path_fetches(), 0);
}

#[test]
fn test_duplicate_material_reference_fetches_once() {
    let storage = MockFetcher::new();
    storage.insert_id(
        1,
        b"mtllib model.mtl\nmtllib model.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec(),
    );
    storage.insert_path("gallery/model.mtl", b"newmtl plain\nKd 0.5 0.5 0.5\n".to_vec());

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(1, "model.obj", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    assert_eq!(storage.path_fetch_count("gallery/model.mtl"), 1);
}

#[test]
fn test_traversal_reference_rejected_without_transport() {
    let storage = MockFetcher::new();
    storage.insert_id(1, b"mtllib ../../secret.bin\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(1, "model.obj", "gallery"));
    block_on(controller.load(&handle));

    // The offending reference degrades; the model still loads
    assert_eq!(handle.state(), SessionState::Completed);
    let scene = handle.scene().unwrap();
    assert_eq!(scene.degraded.len(), 1);
    assert_eq!(scene.degraded[0].reference, "../../secret.bin");
    assert!(scene.degraded[0].reason.contains("storage root"));
    assert_eq!(storage.total_path_fetches(), 0);
}

#[test]
fn test_malformed_directives_do_not_block_valid_ones() {
    let storage = MockFetcher::new();
    storage.insert_id(
        1,
        b"mtllib\ngarbage !!\nmtllib model.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec(),
    );
    storage.insert_path("gallery/model.mtl", b"newmtl plain\n".to_vec());

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(1, "model.obj", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    assert_eq!(storage.path_fetch_count("gallery/model.mtl"), 1);
}

#[test]
fn test_glb_with_embedded_buffer_needs_no_dependency_fetch() {
    // Minimal GLB: JSON chunk + binary chunk holding one triangle
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut bin: Vec<u8> = bytemuck::cast_slice(&positions).to_vec();
    let indices: [u16; 3] = [0, 1, 2];
    bin.extend_from_slice(bytemuck::cast_slice(&indices));
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let json = br#"{"asset":{"version":"2.0"},
        "buffers":[{"byteLength":42}],
        "bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":36},
                       {"buffer":0,"byteOffset":36,"byteLength":6}],
        "accessors":[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]},
                     {"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}],
        "meshes":[{"primitives":[{"attributes":{"POSITION":0},"indices":1}]}],
        "nodes":[{"mesh":0}],"scenes":[{"nodes":[0]}],"scene":0}"#;
    let mut json = json.to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }

    let mut glb = Vec::new();
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    let total = 12 + 8 + json.len() + 8 + bin.len();
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);

    let storage = MockFetcher::new();
    storage.insert_id(7, glb);

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(7, "tri.glb", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    assert_eq!(storage.total_path_fetches(), 0);
    let scene = handle.scene().unwrap();
    assert_eq!(scene.scene.triangle_count(), 1);
}

#[test]
fn test_gltf_external_buffer_and_image() {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut bin: Vec<u8> = bytemuck::cast_slice(&positions).to_vec();
    let indices: [u16; 3] = [0, 1, 2];
    bin.extend_from_slice(bytemuck::cast_slice(&indices));

    let json = br#"{"asset":{"version":"2.0"},
        "buffers":[{"uri":"tri.bin","byteLength":42}],
        "bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":36},
                       {"buffer":0,"byteOffset":36,"byteLength":6}],
        "accessors":[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]},
                     {"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}],
        "images":[{"uri":"skin.jpg"}],
        "samplers":[{}],
        "textures":[{"source":0,"sampler":0}],
        "materials":[{"pbrMetallicRoughness":{"baseColorTexture":{"index":0}}}],
        "meshes":[{"primitives":[{"attributes":{"POSITION":0},"indices":1,"material":0}]}],
        "nodes":[{"mesh":0}],"scenes":[{"nodes":[0]}],"scene":0}"#;

    let storage = MockFetcher::new();
    storage.insert_id(8, json.to_vec());
    storage.insert_path("gallery/tri.bin", bin);
    storage.insert_path("gallery/skin.jpg", jpeg_1x1());

    let controller = controller(&storage);
    let handle = controller.activate(LoadRequest::new(8, "scene.gltf", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    let scene = handle.scene().unwrap();
    assert!(scene.degraded.is_empty());
    assert_eq!(scene.scene.materials[0].base_color_texture, Some(0));
    assert!(!scene.scene.textures[0].placeholder);
}

#[test]
fn test_load_model_convenience() {
    let storage = MockFetcher::new();
    storage.fail_id(2, FetchError::NotFound);

    let controller = controller(&storage);
    let result = block_on(controller.load_model(LoadRequest::new(2, "model.obj", "")));
    assert!(matches!(result, Err(viewer_asset::AssetError::Session(_))));
}
