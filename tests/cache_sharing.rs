//! Dependency-cache behavior across sibling viewer instances

use futures::executor::block_on;
use std::io::Cursor;
use std::sync::Arc;
use viewer_asset::{
    DependencyCache, LoadController, LoadRequest, MockFetcher, SessionState, ViewerContext,
};

fn png_1x1() -> Vec<u8> {
    let mut img = image::RgbaImage::new(1, 1);
    img.put_pixel(0, 0, image::Rgba([200, 180, 120, 255]));
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
        .expect("encode test png");
    data
}

#[test]
fn test_sibling_sessions_share_texture_fetch() {
    let storage = MockFetcher::new();
    storage.insert_id(1, b"mtllib chair.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
    storage.insert_id(2, b"mtllib table.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
    storage.insert_path("gallery/chair.mtl", b"newmtl wood\nmap_Kd wood.png\n".to_vec());
    storage.insert_path("gallery/table.mtl", b"newmtl wood\nmap_Kd wood.png\n".to_vec());
    storage.insert_path("gallery/wood.png", png_1x1());

    let cache = Arc::new(DependencyCache::new(16 * 1024 * 1024));
    let left = LoadController::new(storage.clone(), cache.clone(), ViewerContext::default());
    let right = LoadController::new(storage.clone(), cache.clone(), ViewerContext::default());

    let chair = left.activate(LoadRequest::new(1, "chair.obj", "gallery"));
    block_on(left.load(&chair));
    let table = right.activate(LoadRequest::new(2, "table.obj", "gallery"));
    block_on(right.load(&table));

    assert_eq!(chair.state(), SessionState::Completed);
    assert_eq!(table.state(), SessionState::Completed);
    // The shared texture hit the transport exactly once
    assert_eq!(storage.path_fetch_count("gallery/wood.png"), 1);
    assert!(cache.metrics().hits() >= 1);
}

#[test]
fn test_invalidated_entry_is_refetched() {
    let storage = MockFetcher::new();
    storage.insert_id(1, b"mtllib a.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
    storage.insert_path("gallery/a.mtl", b"newmtl plain\n".to_vec());

    let cache = Arc::new(DependencyCache::new(16 * 1024 * 1024));
    let controller = LoadController::new(storage.clone(), cache.clone(), ViewerContext::default());

    let first = controller.activate(LoadRequest::new(1, "a.obj", "gallery"));
    block_on(controller.load(&first));
    assert_eq!(storage.path_fetch_count("gallery/a.mtl"), 1);

    // Host reports the file changed; next load goes back to the transport
    cache.invalidate("gallery/a.mtl");
    let second = controller.activate(LoadRequest::new(1, "a.obj", "gallery"));
    block_on(controller.load(&second));
    assert_eq!(storage.path_fetch_count("gallery/a.mtl"), 2);
}

#[test]
fn test_cache_eviction_under_pressure_still_loads() {
    let storage = MockFetcher::new();
    storage.insert_id(1, b"mtllib a.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
    storage.insert_path("gallery/a.mtl", b"newmtl plain\nKd 0.2 0.2 0.2\n".to_vec());

    // Budget too small to hold anything useful
    let cache = Arc::new(DependencyCache::new(8));
    let controller = LoadController::new(storage.clone(), cache.clone(), ViewerContext::default());

    let handle = controller.activate(LoadRequest::new(1, "a.obj", "gallery"));
    block_on(controller.load(&handle));

    assert_eq!(handle.state(), SessionState::Completed);
    assert!(cache.memory_usage() <= 8);
}
