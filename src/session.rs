//! Load sessions
//!
//! One `LoadSession` per load attempt, owned by a cloneable
//! [`SessionHandle`]. The state machine is explicit and framework-agnostic:
//! the hosting UI subscribes to transitions through callbacks instead of
//! observing any reactive wrapper. Cancellation is a cooperative flag
//! checked at every suspension checkpoint of the pipeline.

use crate::assembler::{AssembledScene, AssemblyError};
use crate::fetch::FetchError;
use crate::format::ModelFormat;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of one load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Viewer instance mounted, not yet told to load
    Pending,
    /// Activation signal received
    Active,
    /// Fetch/resolution/assembly in progress
    Loading,
    /// Terminal: scene is available
    Completed,
    /// Terminal: superseded or torn down; not an error
    Cancelled,
    /// Terminal: unrecoverable error
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Terminal failure causes for a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to fetch main file: {0}")]
    MainFileFetch(#[from] FetchError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Pipeline phase, for progress reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    FetchingMain,
    ResolvingDependencies,
    Assembling,
}

/// Events emitted to session subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionState),
    Progress { phase: LoadPhase, fraction: f32 },
    /// The scene is ready; its `degraded` list names substituted dependencies
    Completed { scene: Arc<AssembledScene> },
    /// Terminal failure with a user-presentable message
    Failed { message: String },
}

/// What a session was asked to load.
///
/// Format detection happens here; `format` is `None` for unsupported
/// extensions and the controller fails such sessions before any fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub file_id: u64,
    pub name: String,
    pub container: String,
    pub format: Option<ModelFormat>,
}

impl LoadRequest {
    pub fn new(file_id: u64, name: impl Into<String>, container: impl Into<String>) -> Self {
        let name = name.into();
        let format = ModelFormat::from_path(&name);
        Self {
            file_id,
            name,
            container: container.into(),
            format,
        }
    }
}

/// Cooperative cancellation flag, checked at suspension checkpoints
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type Subscriber = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

struct SessionInner {
    id: Uuid,
    request: LoadRequest,
    state: RwLock<SessionState>,
    progress: RwLock<f32>,
    cancel: CancelToken,
    scene: RwLock<Option<Arc<AssembledScene>>>,
    error: RwLock<Option<Arc<SessionError>>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

/// Cloneable handle to a load session
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("request", &self.inner.request)
            .field("state", &self.state())
            .finish()
    }
}

impl SessionHandle {
    pub fn new(request: LoadRequest) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                request,
                state: RwLock::new(SessionState::Pending),
                progress: RwLock::new(0.0),
                cancel: CancelToken::new(),
                scene: RwLock::new(None),
                error: RwLock::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn request(&self) -> &LoadRequest {
        &self.inner.request
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.state(),
            SessionState::Pending | SessionState::Active | SessionState::Loading
        )
    }

    /// Loading progress in `0.0..=1.0`
    pub fn progress(&self) -> f32 {
        if self.state() == SessionState::Completed {
            1.0
        } else {
            *self.inner.progress.read()
        }
    }

    /// The assembled scene, once the session completed
    pub fn scene(&self) -> Option<Arc<AssembledScene>> {
        self.inner.scene.read().clone()
    }

    /// The terminal error, if the session failed
    pub fn error(&self) -> Option<Arc<SessionError>> {
        self.inner.error.read().clone()
    }

    /// Register a callback for session events.
    ///
    /// Events are delivered on whatever task drives the load; no events are
    /// delivered after a terminal state has been observed.
    pub fn subscribe(&self, subscriber: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        self.inner.subscribers.lock().push(Arc::new(subscriber));
    }

    /// Cancel this session.
    ///
    /// Safe to call from any state; terminal states are left untouched.
    /// In-flight fetches are allowed to settle but their results are
    /// discarded at the pipeline's next checkpoint.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
        if self.transition(SessionState::Cancelled) {
            log::debug!("session {} cancelled", self.inner.id);
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.inner.cancel
    }

    /// Move to a new state unless already terminal. Emits `StateChanged`.
    pub(crate) fn transition(&self, new: SessionState) -> bool {
        {
            let mut state = self.inner.state.write();
            if state.is_terminal() {
                return false;
            }
            *state = new;
        }
        self.emit(&SessionEvent::StateChanged(new));
        true
    }

    pub(crate) fn emit_progress(&self, phase: LoadPhase, fraction: f32) {
        if self.state().is_terminal() {
            return;
        }
        *self.inner.progress.write() = fraction;
        self.emit(&SessionEvent::Progress { phase, fraction });
    }

    /// Terminal success: store the scene and notify subscribers
    pub(crate) fn complete(&self, scene: AssembledScene) {
        let scene = Arc::new(scene);
        *self.inner.scene.write() = Some(scene.clone());
        if self.transition(SessionState::Completed) {
            *self.inner.progress.write() = 1.0;
            self.emit(&SessionEvent::Completed { scene });
        } else {
            // Cancelled while assembling: discard the result
            *self.inner.scene.write() = None;
        }
    }

    /// Terminal failure with a user-presentable message
    pub(crate) fn fail(&self, error: SessionError, message: String) {
        *self.inner.error.write() = Some(Arc::new(error));
        if self.transition(SessionState::Failed) {
            log::error!("session {} failed: {message}", self.inner.id);
            self.emit(&SessionEvent::Failed { message });
        } else {
            *self.inner.error.write() = None;
        }
    }

    fn emit(&self, event: &SessionEvent) {
        // Snapshot so subscribers can call back into this handle (e.g. a
        // host cancelling from an event) without deadlocking.
        let subscribers: Vec<Subscriber> = self.inner.subscribers.lock().clone();
        for subscriber in &subscribers {
            subscriber(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneHandle;
    use std::sync::atomic::AtomicUsize;

    fn request() -> LoadRequest {
        LoadRequest::new(1, "model.obj", "models")
    }

    fn empty_scene() -> AssembledScene {
        AssembledScene {
            scene: SceneHandle::default(),
            degraded: Vec::new(),
        }
    }

    #[test]
    fn test_request_detects_format() {
        assert_eq!(request().format, Some(ModelFormat::Obj));
        assert_eq!(LoadRequest::new(2, "notes.txt", "").format, None);
    }

    #[test]
    fn test_state_machine_happy_path() {
        let handle = SessionHandle::new(request());
        assert_eq!(handle.state(), SessionState::Pending);
        assert!(handle.is_loading());

        assert!(handle.transition(SessionState::Active));
        assert!(handle.transition(SessionState::Loading));
        handle.complete(empty_scene());

        assert_eq!(handle.state(), SessionState::Completed);
        assert_eq!(handle.progress(), 1.0);
        assert!(handle.scene().is_some());
        assert!(!handle.is_loading());
    }

    #[test]
    fn test_cancel_is_terminal_and_sticky() {
        let handle = SessionHandle::new(request());
        handle.transition(SessionState::Active);
        handle.cancel();

        assert_eq!(handle.state(), SessionState::Cancelled);
        assert!(handle.cancel_token().is_cancelled());
        // Late completion is discarded
        handle.complete(empty_scene());
        assert_eq!(handle.state(), SessionState::Cancelled);
        assert!(handle.scene().is_none());
    }

    #[test]
    fn test_no_events_after_terminal() {
        let handle = SessionHandle::new(request());
        let events = Arc::new(AtomicUsize::new(0));
        let seen = events.clone();
        handle.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        handle.cancel();
        let after_cancel = events.load(Ordering::SeqCst);

        handle.complete(empty_scene());
        handle.fail(
            SessionError::UnsupportedFormat("x".to_string()),
            "nope".to_string(),
        );
        handle.emit_progress(LoadPhase::Assembling, 0.9);

        assert_eq!(events.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_failed_session_keeps_error() {
        let handle = SessionHandle::new(request());
        handle.transition(SessionState::Loading);
        handle.fail(
            SessionError::MainFileFetch(FetchError::PermissionDenied),
            "permission denied".to_string(),
        );

        assert_eq!(handle.state(), SessionState::Failed);
        assert!(matches!(
            *handle.error().unwrap(),
            SessionError::MainFileFetch(FetchError::PermissionDenied)
        ));
    }

    #[test]
    fn test_subscriber_sees_completed_event() {
        let handle = SessionHandle::new(request());
        let completed = Arc::new(AtomicBool::new(false));
        let seen = completed.clone();
        handle.subscribe(move |event| {
            if matches!(event, SessionEvent::Completed { .. }) {
                seen.store(true, Ordering::SeqCst);
            }
        });

        handle.transition(SessionState::Loading);
        handle.complete(empty_scene());
        assert!(completed.load(Ordering::SeqCst));
    }
}
