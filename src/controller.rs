//! Load-session controller
//!
//! One `LoadController` per viewer instance. The host signals activation
//! when its instance should show a file and cancellation when the user
//! moves on; the controller enforces that at most one session per instance
//! is ever active or loading, drives the pipeline, and emits session
//! events. It never initiates navigation itself.

use crate::assembler::ModelAssembler;
use crate::cache::DependencyCache;
use crate::context::ViewerContext;
use crate::fetch::{FetchError, FileFetcher, SecureFetcher, StorageBackend};
use crate::model::ModelReference;
use crate::resolver::{DependencyResolver, ResolveError};
use crate::runtime::{AsyncSpawner, SpawnHandle};
use crate::session::{
    LoadPhase, LoadRequest, SessionError, SessionHandle, SessionState,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Per-viewer-instance load orchestration
pub struct LoadController<B: StorageBackend> {
    fetcher: Arc<SecureFetcher<B>>,
    cache: Arc<DependencyCache>,
    assembler: ModelAssembler,
    context: ViewerContext,
    current: Mutex<Option<SessionHandle>>,
}

impl<B: StorageBackend> LoadController<B> {
    pub fn new(backend: B, cache: Arc<DependencyCache>, context: ViewerContext) -> Self {
        Self {
            fetcher: Arc::new(SecureFetcher::new(backend)),
            cache,
            assembler: ModelAssembler::new(),
            context,
            current: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<DependencyCache> {
        &self.cache
    }

    /// Activate a new session for this instance.
    ///
    /// Any previous non-terminal session is cancelled first, so at most one
    /// session per instance is active or loading at a time. The returned
    /// handle is in `Active` state; drive it with [`load`](Self::load) or
    /// [`spawn_load`](Self::spawn_load).
    pub fn activate(&self, request: LoadRequest) -> SessionHandle {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            if !previous.state().is_terminal() {
                log::debug!("session {} superseded by a new activation", previous.id());
                previous.cancel();
            }
        }
        let handle = SessionHandle::new(request);
        handle.transition(SessionState::Active);
        *current = Some(handle.clone());
        handle
    }

    /// Cancel the instance's current session, e.g. on teardown
    pub fn deactivate(&self) {
        if let Some(handle) = self.current.lock().take() {
            handle.cancel();
        }
    }

    /// The session currently owned by this instance
    pub fn current(&self) -> Option<SessionHandle> {
        self.current.lock().clone()
    }

    /// Drive a session's pipeline to a terminal state.
    ///
    /// Cancellation is polled before parsing, before each fetch round,
    /// before assembly, and before the final emit; a cancelled session
    /// produces no further events.
    pub async fn load(&self, handle: &SessionHandle) {
        drive(
            self.fetcher.clone(),
            self.cache.clone(),
            self.assembler,
            self.context.clone(),
            handle.clone(),
        )
        .await;
    }

    /// Hand the drive future to the host's runtime
    pub fn spawn_load<S: AsyncSpawner>(&self, spawner: &S, handle: &SessionHandle) -> SpawnHandle
    where
        B: 'static,
    {
        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let assembler = self.assembler;
        let context = self.context.clone();
        let handle = handle.clone();
        log::debug!("spawning load on {} runtime", spawner.runtime_name());
        spawner.spawn(async move {
            drive(fetcher, cache, assembler, context, handle).await;
        })
    }

    /// One-shot convenience: activate, load, and return the scene.
    ///
    /// Dependency failures still complete with a degraded scene; only
    /// terminal session failures (or cancellation from another task) map to
    /// an error.
    pub async fn load_model(
        &self,
        request: LoadRequest,
    ) -> Result<Arc<crate::assembler::AssembledScene>, crate::error::AssetError> {
        let handle = self.activate(request);
        self.load(&handle).await;
        match handle.state() {
            SessionState::Completed => Ok(handle
                .scene()
                .ok_or(crate::error::AssetError::Cancelled)?),
            SessionState::Cancelled => Err(crate::error::AssetError::Cancelled),
            _ => match handle.error() {
                Some(error) => Err(crate::error::AssetError::Session(error)),
                None => Err(crate::error::AssetError::Cancelled),
            },
        }
    }
}

async fn drive<B: StorageBackend>(
    fetcher: Arc<SecureFetcher<B>>,
    cache: Arc<DependencyCache>,
    assembler: ModelAssembler,
    context: ViewerContext,
    handle: SessionHandle,
) {
    if !handle.transition(SessionState::Loading) {
        // Cancelled before loading began
        return;
    }

    let request = handle.request().clone();
    let Some(format) = request.format else {
        let message = format!(
            "{}: {}",
            context.translate("viewer.error.unsupported_format"),
            request.name
        );
        handle.fail(SessionError::UnsupportedFormat(request.name), message);
        return;
    };
    let model = ModelReference {
        file_id: request.file_id,
        name: request.name,
        container: request.container,
        format,
    };

    handle.emit_progress(LoadPhase::FetchingMain, 0.1);
    let main = match fetcher.fetch_by_id(model.file_id).await {
        Ok(file) => file,
        Err(err) => {
            let message = format!("{}: {err}", context.translate(fetch_error_key(&err)));
            handle.fail(SessionError::MainFileFetch(err), message);
            return;
        }
    };

    // Checkpoint: don't parse for a viewer that moved on
    if handle.cancel_token().is_cancelled() {
        return;
    }

    handle.emit_progress(LoadPhase::ResolvingDependencies, 0.3);
    let resolver = DependencyResolver::new(fetcher, cache);
    let report = match resolver
        .resolve(&model, &main.bytes, handle.cancel_token())
        .await
    {
        Ok(report) => report,
        Err(ResolveError::Cancelled) => return,
    };
    for diagnostic in &report.diagnostics {
        log::debug!(
            "{}: skipped {} ({})",
            model.name,
            diagnostic.location,
            diagnostic.message
        );
    }

    // Checkpoint: assembly is pure CPU work, skip it when cancelled
    if handle.cancel_token().is_cancelled() {
        return;
    }

    handle.emit_progress(LoadPhase::Assembling, 0.8);
    let assembled = match assembler.assemble(&model, &main.bytes, &report.assets) {
        Ok(assembled) => assembled,
        Err(err) => {
            let message = format!(
                "{}: {err}",
                context.translate("viewer.error.corrupt_file")
            );
            handle.fail(SessionError::Assembly(err), message);
            return;
        }
    };

    // Checkpoint: final emit
    if handle.cancel_token().is_cancelled() {
        return;
    }
    if assembled.is_degraded() {
        log::warn!(
            "{} completed with {} degraded dependencies",
            model.name,
            assembled.degraded.len()
        );
    }
    handle.complete(assembled);
}

fn fetch_error_key(err: &FetchError) -> &'static str {
    match err {
        FetchError::NotFound => "viewer.error.not_found",
        FetchError::PermissionDenied => "viewer.error.permission_denied",
        FetchError::PathTraversalRejected => "viewer.error.invalid_path",
        FetchError::Transport(_) => "viewer.error.transport",
    }
}
