//! In-memory storage backend for tests
//!
//! Holds an id-keyed and a path-keyed file table, supports scripted
//! failures per entry, and counts every transport call so tests can assert
//! on fetch dedup and traversal short-circuiting.

use super::{FetchError, FetchedFile, StorageBackend};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
enum Entry {
    File { bytes: Arc<[u8]>, version: String },
    Fail(FetchError),
}

#[derive(Default)]
struct State {
    by_id: HashMap<u64, Entry>,
    by_path: HashMap<String, Entry>,
    id_fetches: HashMap<u64, u64>,
    path_fetches: HashMap<String, u64>,
}

/// Scriptable in-memory [`StorageBackend`]
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<State>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a main file under a stable identifier
    pub fn insert_id(&self, file_id: u64, bytes: Vec<u8>) {
        self.state.lock().by_id.insert(
            file_id,
            Entry::File {
                bytes: bytes.into(),
                version: "v1".to_string(),
            },
        );
    }

    /// Register a dependency file under its normalized path
    pub fn insert_path(&self, path: &str, bytes: Vec<u8>) {
        self.insert_path_versioned(path, bytes, "v1");
    }

    /// Register a dependency file with an explicit version tag
    pub fn insert_path_versioned(&self, path: &str, bytes: Vec<u8>, version: &str) {
        self.state.lock().by_path.insert(
            path.to_string(),
            Entry::File {
                bytes: bytes.into(),
                version: version.to_string(),
            },
        );
    }

    /// Script a failure for a main-file fetch
    pub fn fail_id(&self, file_id: u64, error: FetchError) {
        self.state.lock().by_id.insert(file_id, Entry::Fail(error));
    }

    /// Script a failure for a dependency fetch
    pub fn fail_path(&self, path: &str, error: FetchError) {
        self.state
            .lock()
            .by_path
            .insert(path.to_string(), Entry::Fail(error));
    }

    /// How many times a given path reached the transport
    pub fn path_fetch_count(&self, path: &str) -> u64 {
        *self.state.lock().path_fetches.get(path).unwrap_or(&0)
    }

    /// Total dependency fetches that reached the transport
    pub fn total_path_fetches(&self) -> u64 {
        self.state.lock().path_fetches.values().sum()
    }

    /// How many times a given id reached the transport
    pub fn id_fetch_count(&self, file_id: u64) -> u64 {
        *self.state.lock().id_fetches.get(&file_id).unwrap_or(&0)
    }
}

#[async_trait::async_trait]
impl StorageBackend for MockFetcher {
    async fn read_by_id(&self, file_id: u64) -> Result<FetchedFile, FetchError> {
        let mut state = self.state.lock();
        *state.id_fetches.entry(file_id).or_insert(0) += 1;
        match state.by_id.get(&file_id) {
            Some(Entry::File { bytes, version }) => Ok(FetchedFile {
                bytes: bytes.clone(),
                version: version.clone(),
            }),
            Some(Entry::Fail(err)) => Err(err.clone()),
            None => Err(FetchError::NotFound),
        }
    }

    async fn read_by_path(&self, normalized: &str) -> Result<FetchedFile, FetchError> {
        let mut state = self.state.lock();
        *state
            .path_fetches
            .entry(normalized.to_string())
            .or_insert(0) += 1;
        match state.by_path.get(normalized) {
            Some(Entry::File { bytes, version }) => Ok(FetchedFile {
                bytes: bytes.clone(),
                version: version.clone(),
            }),
            Some(Entry::Fail(err)) => Err(err.clone()),
            None => Err(FetchError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_mock_serves_registered_files() {
        let mock = MockFetcher::new();
        mock.insert_id(7, b"main".to_vec());
        mock.insert_path("dir/a.mtl", b"mtl".to_vec());

        let main = block_on(mock.read_by_id(7)).unwrap();
        assert_eq!(&*main.bytes, b"main");
        let dep = block_on(mock.read_by_path("dir/a.mtl")).unwrap();
        assert_eq!(dep.version, "v1");
    }

    #[test]
    fn test_mock_scripted_failure() {
        let mock = MockFetcher::new();
        mock.fail_path("dir/missing.png", FetchError::PermissionDenied);

        let err = block_on(mock.read_by_path("dir/missing.png")).unwrap_err();
        assert_eq!(err, FetchError::PermissionDenied);
    }

    #[test]
    fn test_mock_counts_fetches() {
        let mock = MockFetcher::new();
        mock.insert_path("x", b"1".to_vec());
        let _ = block_on(mock.read_by_path("x"));
        let _ = block_on(mock.read_by_path("x"));
        let _ = block_on(mock.read_by_path("unknown"));

        assert_eq!(mock.path_fetch_count("x"), 2);
        assert_eq!(mock.total_path_fetches(), 3);
    }
}
