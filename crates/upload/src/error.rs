//! Upload error taxonomy.

use std::path::PathBuf;

use skylift_onboarding::OnboardingError;
use skylift_transfer::TransferError;

use crate::transport::TransportError;

/// Errors produced by the upload engine.
///
/// Transient network failures are retried inside the engine up to the
/// configured policy; everything surfaced here is terminal and identifies
/// the failing stage, so callers can tell a trust problem from a
/// network/file problem.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The source does not exist or is not a readable regular file.
    /// Raised pre-flight, before any network activity.
    #[error("source not found or unreadable: {0}")]
    SourceNotFound(PathBuf),

    /// Configuration rejected at construction, never mid-upload.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    /// A chunk exhausted its retry budget; sibling chunks were cancelled.
    #[error("upload of chunk {index} failed")]
    ChunkFailed { index: u32 },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Caller-initiated cancellation through the session token.
    #[error("upload cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
