//! Secure file fetching
//!
//! The fetch layer is the boundary between the loading pipeline and the
//! hosting platform's storage. All path safety is enforced here: dependency
//! references are normalized against their container and traversal outside
//! the storage root is rejected before anything reaches the transport.
//! Authorization itself is delegated to the [`StorageBackend`].

pub mod mock;
mod path;

pub use mock::MockFetcher;
pub use path::normalize_reference;

use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "runtime-tokio")]
use std::time::Duration;

/// Error type for fetch operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("file not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("reference escapes the permitted storage root")]
    PathTraversalRejected,

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Transport failures are the only class worth retrying; everything
    /// else is a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Raw bytes plus the backend's content version tag
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub bytes: Arc<[u8]>,
    /// Etag-like version, used by the dependency cache to drop stale entries
    pub version: String,
}

impl FetchedFile {
    pub fn new(bytes: impl Into<Arc<[u8]>>, version: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            version: version.into(),
        }
    }
}

/// Raw retrieval operations provided by the hosting platform.
///
/// Implementations receive already-normalized paths and are responsible for
/// the read-authorization check. The pipeline never hands a backend an
/// unnormalized reference.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch a file by its stable identifier (used for main files)
    async fn read_by_id(&self, file_id: u64) -> Result<FetchedFile, FetchError>;

    /// Fetch a file by normalized path within the storage root
    async fn read_by_path(&self, normalized: &str) -> Result<FetchedFile, FetchError>;
}

/// Fetch operations as the resolution pipeline sees them
#[async_trait::async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetch the main model file by stable identifier
    async fn fetch_by_id(&self, file_id: u64) -> Result<FetchedFile, FetchError>;

    /// Fetch a dependency referenced from a main file's content.
    ///
    /// `container` is the main file's directory; `reference` is the raw
    /// string extracted by the dependency parser.
    async fn fetch_dependency(
        &self,
        container: &str,
        reference: &str,
    ) -> Result<FetchedFile, FetchError>;
}

/// Path-safe fetcher wrapping a [`StorageBackend`].
///
/// This is the only place in the crate where references are turned into
/// storage paths. With the `runtime-tokio` feature a per-fetch timeout can
/// be applied; on expiry the fetch resolves as a retryable transport error.
pub struct SecureFetcher<B: StorageBackend> {
    backend: B,
    #[cfg(feature = "runtime-tokio")]
    timeout: Option<Duration>,
}

impl<B: StorageBackend> SecureFetcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            #[cfg(feature = "runtime-tokio")]
            timeout: None,
        }
    }

    /// Set a bound on how long a single fetch may take
    #[cfg(feature = "runtime-tokio")]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(feature = "runtime-tokio")]
    async fn bounded(
        &self,
        fut: impl std::future::Future<Output = Result<FetchedFile, FetchError>>,
    ) -> Result<FetchedFile, FetchError> {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Transport(format!(
                    "fetch timed out after {}ms",
                    limit.as_millis()
                ))),
            },
            None => fut.await,
        }
    }

    #[cfg(not(feature = "runtime-tokio"))]
    async fn bounded(
        &self,
        fut: impl std::future::Future<Output = Result<FetchedFile, FetchError>>,
    ) -> Result<FetchedFile, FetchError> {
        fut.await
    }
}

#[async_trait::async_trait]
impl<B: StorageBackend> FileFetcher for SecureFetcher<B> {
    async fn fetch_by_id(&self, file_id: u64) -> Result<FetchedFile, FetchError> {
        log::debug!("fetching main file id {file_id}");
        self.bounded(self.backend.read_by_id(file_id)).await
    }

    async fn fetch_dependency(
        &self,
        container: &str,
        reference: &str,
    ) -> Result<FetchedFile, FetchError> {
        let normalized = normalize_reference(container, reference)?;
        log::debug!("fetching dependency {reference:?} -> {normalized:?}");
        self.bounded(self.backend.read_by_path(&normalized)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_secure_fetcher_delegates() {
        let backend = MockFetcher::new();
        backend.insert_path("models/tex.png", b"png".to_vec());
        let fetcher = SecureFetcher::new(backend);

        let file = block_on(fetcher.fetch_dependency("models", "tex.png")).unwrap();
        assert_eq!(&*file.bytes, b"png");
    }

    #[test]
    fn test_secure_fetcher_rejects_traversal_before_backend() {
        let backend = MockFetcher::new();
        let fetcher = SecureFetcher::new(backend);

        let err = block_on(fetcher.fetch_dependency("models", "../../secret.bin")).unwrap_err();
        assert_eq!(err, FetchError::PathTraversalRejected);
        // The transport was never consulted
        assert_eq!(fetcher.backend().total_path_fetches(), 0);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Transport("timeout".into()).is_retryable());
        assert!(!FetchError::NotFound.is_retryable());
        assert!(!FetchError::PermissionDenied.is_retryable());
        assert!(!FetchError::PathTraversalRejected.is_retryable());
    }
}
