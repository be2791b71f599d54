//! viewer_asset - Loading core for previewing 3D models
//!
//! Given a main model file selected in a file browser, this crate
//! classifies its format, fetches it through an authorization-scoped
//! storage boundary, discovers and fetches the auxiliary files it
//! references (material libraries, textures, binary buffers), and
//! assembles a renderable scene graph.
//!
//! # Design
//! - Multi-file dependency resolution is two-hop: an OBJ names its
//!   material libraries, which in turn name textures; glTF documents
//!   declare buffers and images up front. Each round of fetches runs
//!   concurrently and failures are isolated per dependency.
//! - Missing dependencies degrade to placeholders instead of failing the
//!   load; only the main file and its core geometry are load-bearing.
//! - Every load runs inside a cancellable session; activating a new file
//!   in the same viewer instance cancels the previous session.
//! - Fetched dependency bytes are shared across sessions through a
//!   byte-budgeted LRU cache keyed by normalized path.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use viewer_asset::{
//!     DependencyCache, LoadController, LoadRequest, MockFetcher, ViewerContext,
//! };
//!
//! let storage = MockFetcher::new();
//! storage.insert_id(1, b"solid tri\n facet normal 0 0 1\n outer loop\n \
//!     vertex 0 0 0\n vertex 1 0 0\n vertex 0 1 0\n endloop\n endfacet\n\
//!     endsolid tri\n".to_vec());
//!
//! let controller = LoadController::new(
//!     storage,
//!     Arc::new(DependencyCache::new(64 * 1024 * 1024)),
//!     ViewerContext::default(),
//! );
//! let scene = futures::executor::block_on(
//!     controller.load_model(LoadRequest::new(1, "part.stl", "")),
//! )
//! .unwrap();
//! assert_eq!(scene.scene.triangle_count(), 1);
//! ```
//!
//! # Feature Flags
//!
//! - `runtime-tokio`: Tokio integration (per-fetch timeouts, `TokioSpawner`)

// Core modules
pub mod assembler;
pub mod cache;
pub mod fetch;
pub mod format;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod scene;
pub mod session;

// Host-facing modules
pub mod context;
pub mod controller;
pub mod runtime;

// Error types
mod error;
pub use error::{AssetError, Result};

// Re-export the main pipeline types
pub use assembler::{AssembledScene, AssemblyError, DegradedAsset, ModelAssembler};
pub use cache::{CacheMetrics, CacheMetricsHandle, DependencyCache};
pub use controller::LoadController;
pub use format::ModelFormat;
pub use model::{
    AssetOutcome, AssetSet, DependencyReference, DependencyRole, ModelReference, ReferenceOrigin,
    ResolvedAsset,
};
pub use resolver::{DependencyResolver, ResolutionReport, ResolveError};
pub use scene::{SceneHandle, SceneMaterial, SceneMesh, SceneNode, SceneTexture, Vertex};
pub use session::{
    CancelToken, LoadPhase, LoadRequest, SessionError, SessionEvent, SessionHandle, SessionState,
};

// Re-export fetch types
pub use fetch::{
    normalize_reference, FetchError, FetchedFile, FileFetcher, MockFetcher, SecureFetcher,
    StorageBackend,
};

// Re-export host capabilities
pub use context::{IdentityTranslator, Translator, ViewerContext};
pub use runtime::{AsyncSpawner, MockSpawner, SpawnHandle};
#[cfg(feature = "runtime-tokio")]
pub use runtime::TokioSpawner;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_mock_fetcher_available() {
        let _storage = MockFetcher::new();
    }
}
