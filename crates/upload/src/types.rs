//! Data types for the upload flow.

use std::time::Duration;

use skylift_retry::RetryPolicy;
use skylift_transfer::DEFAULT_CHUNK_SIZE;

use crate::error::UploadError;

/// Destination descriptor on the platform file service. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Platform asset receiving the file. Defaults to the agent's own
    /// client id when uploading to self.
    pub asset_id: String,
    /// Logical path of the file on the platform.
    pub file_path: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

/// Terminal status of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Success,
    Failed,
}

/// Outcome of one chunk upload. Produced exactly once per chunk and
/// consumed by the coordinator.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub index: u32,
    pub status: ChunkStatus,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
    /// SHA-256 of this chunk's payload. `None` when every attempt failed
    /// before the payload could be read.
    pub partial_hash: Option<String>,
}

/// Returned to the caller after a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Hex-encoded SHA-256 of the complete file.
    ///
    /// Chunked uploads compute this locally from the source, proving
    /// client-side read integrity; single-shot uploads prefer the
    /// platform-computed digest from the ack when present, proving
    /// server-side integrity.
    pub content_hash: String,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

/// Upload configuration with documented defaults and validated ranges.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Split the file into chunks and upload them in parallel.
    /// Default: `false` (single-shot).
    pub chunked: bool,
    /// Maximum concurrent chunk uploads. Must be at least 1. Default: 3.
    pub parallelism: usize,
    /// Chunk size in bytes. Must be greater than zero.
    /// Default: [`DEFAULT_CHUNK_SIZE`] (4 MiB).
    pub chunk_size: u64,
    /// Retry policy shared by onboarding and every chunk (each chunk gets
    /// its own independent budget). Default: 3 attempts, 500 ms base delay.
    pub retry: RetryPolicy,
    /// Target asset. `None` means upload to the agent's own client id.
    pub asset_id: Option<String>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunked: false,
            parallelism: 3,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            asset_id: None,
            mime_type: None,
            description: None,
        }
    }
}

impl UploadOptions {
    /// Validates ranges. Called by `UploadSession::new` so invalid
    /// configuration is rejected at construction, not mid-upload.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.parallelism == 0 {
            return Err(UploadError::InvalidOptions(
                "parallelism must be at least 1".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(UploadError::InvalidOptions(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(UploadError::InvalidOptions(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let options = UploadOptions::default();
        assert!(!options.chunked);
        assert_eq!(options.parallelism, 3);
        assert_eq!(options.chunk_size, 4 * 1024 * 1024);
        assert_eq!(options.retry.max_attempts, 3);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn zero_parallelism_rejected() {
        let options = UploadOptions {
            parallelism: 0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(UploadError::InvalidOptions(_))
        ));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let options = UploadOptions {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn zero_retry_attempts_rejected() {
        let options = UploadOptions {
            retry: RetryPolicy {
                max_attempts: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
