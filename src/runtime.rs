//! Async runtime abstraction
//!
//! The core never owns a runtime: the host decides where background loads
//! run. `MockSpawner` keeps the whole pipeline testable (and usable from
//! synchronous hosts) without Tokio; `TokioSpawner` is available behind the
//! `runtime-tokio` feature.

use std::fmt::Debug;
use std::future::Future;

/// Type-erased handle to a spawned task
#[derive(Debug)]
pub struct SpawnHandle {
    inner: Box<dyn std::any::Any + Send>,
}

impl SpawnHandle {
    pub fn new<T: Send + 'static>(handle: T) -> Self {
        Self {
            inner: Box::new(handle),
        }
    }

    /// Recover the runtime-specific handle
    pub fn downcast<T: 'static>(self) -> Option<T> {
        self.inner.downcast::<T>().ok().map(|b| *b)
    }
}

/// Spawns background load tasks on the host's runtime
pub trait AsyncSpawner: Send + Sync + Clone + Debug {
    fn spawn<F>(&self, task: F) -> SpawnHandle
    where
        F: Future<Output = ()> + Send + 'static;

    /// Runtime name, for diagnostics
    fn runtime_name(&self) -> &'static str;
}

/// Behavior of [`MockSpawner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSpawnBehavior {
    /// Drop the task without running it
    Drop,
    /// Run the task to completion on the calling thread
    BlockSync,
}

/// Runtime-free spawner for tests and synchronous hosts
#[derive(Debug, Clone)]
pub struct MockSpawner {
    behavior: MockSpawnBehavior,
}

impl Default for MockSpawner {
    fn default() -> Self {
        Self::blocking()
    }
}

impl MockSpawner {
    /// Spawner that runs tasks synchronously on the calling thread
    pub fn blocking() -> Self {
        Self {
            behavior: MockSpawnBehavior::BlockSync,
        }
    }

    /// Spawner that silently drops tasks
    pub fn dropping() -> Self {
        Self {
            behavior: MockSpawnBehavior::Drop,
        }
    }
}

impl AsyncSpawner for MockSpawner {
    fn spawn<F>(&self, task: F) -> SpawnHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.behavior {
            MockSpawnBehavior::Drop => {
                drop(task);
            }
            MockSpawnBehavior::BlockSync => {
                futures::executor::block_on(task);
            }
        }
        SpawnHandle::new(())
    }

    fn runtime_name(&self) -> &'static str {
        "mock"
    }
}

/// Tokio-backed spawner
#[cfg(feature = "runtime-tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

#[cfg(feature = "runtime-tokio")]
impl TokioSpawner {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "runtime-tokio")]
impl AsyncSpawner for TokioSpawner {
    fn spawn<F>(&self, task: F) -> SpawnHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        SpawnHandle::new(tokio::spawn(task))
    }

    fn runtime_name(&self) -> &'static str {
        "tokio"
    }
}
