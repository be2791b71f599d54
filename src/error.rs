//! Error types for viewer-asset

use crate::assembler::AssemblyError;
use crate::fetch::FetchError;
use crate::session::SessionError;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for loading operations
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("session failed: {0}")]
    Session(Arc<SessionError>),

    /// A normal outcome, not a failure: the viewer moved on
    #[error("load was cancelled")]
    Cancelled,
}

/// Result type alias for loading operations
pub type Result<T> = std::result::Result<T, AssetError>;
