//! Single-chunk upload worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use skylift_retry::{RetryError, RetryPolicy, retry};
use skylift_transfer::{TransferError, checksum_bytes, read_range};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::progress::ProgressSink;
use crate::transport::{ChunkMeta, Transport, TransportError};
use crate::types::{ChunkResult, ChunkStatus, UploadTarget};

/// Fixed label reported on upload retries, so operators can tell them apart
/// from onboarding retries.
pub const UPLOAD_LABEL: &str = "upload";

/// Everything a worker task needs, shared across the pool.
/// Avoids threading eight separate parameters through every call.
pub(crate) struct WorkerContext {
    pub transport: Arc<dyn Transport>,
    pub target: UploadTarget,
    pub source: PathBuf,
    pub upload_id: String,
    pub total_size: u64,
    pub policy: RetryPolicy,
    pub cancel: CancellationToken,
    pub progress: Arc<dyn ProgressSink>,
}

/// Worker result: the caller-visible [`ChunkResult`] plus transport details
/// the coordinator and the single-shot path care about.
pub(crate) struct ChunkUpload {
    pub result: ChunkResult,
    /// Platform-computed whole-file digest from the ack, when present.
    /// Only meaningful when the chunk covers the whole file.
    pub server_hash: Option<String>,
    /// True when the chunk failed because cancellation was signalled, not
    /// because its retry budget ran out.
    pub cancelled: bool,
}

/// One attempt can fail reading the source or talking to the platform.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Uploads one chunk with its own independent retry budget.
///
/// Each attempt opens a fresh, scoped read handle and reads exactly
/// `chunk.len` bytes at `chunk.offset`, so a retried chunk re-reads the
/// source instead of trusting a stale buffer. Reads run on the blocking
/// pool. Exhaustion is reported as `ChunkResult { status: Failed }` rather
/// than an error, so the coordinator decides whether the session aborts.
/// On success `result.partial_hash` is always `Some`.
pub(crate) async fn upload_chunk(
    ctx: &WorkerContext,
    chunk: skylift_transfer::Chunk,
) -> ChunkUpload {
    let failures = AtomicU32::new(0);

    let on_failure = |label: &str, attempt: u32, err: &str| {
        failures.fetch_add(1, Ordering::SeqCst);
        ctx.progress.report(
            label,
            &format!("chunk {} attempt {attempt} failed: {err}", chunk.index),
        );
    };

    let op = || async move {
        let data = tokio::task::spawn_blocking({
            let source = ctx.source.clone();
            move || read_range(&source, chunk.offset, chunk.len)
        })
        .await
        .map_err(|e| AttemptError::Transfer(TransferError::Io(std::io::Error::other(e))))??;

        let checksum = checksum_bytes(&data);
        let meta = ChunkMeta {
            upload_id: ctx.upload_id.clone(),
            asset_id: ctx.target.asset_id.clone(),
            file_path: ctx.target.file_path.clone(),
            index: chunk.index,
            offset: chunk.offset,
            total_size: ctx.total_size,
            checksum: checksum.clone(),
            mime_type: ctx.target.mime_type.clone(),
            description: ctx.target.description.clone(),
        };
        let ack = ctx.transport.send(&meta, &data).await?;
        Ok::<_, AttemptError>((checksum, ack.server_hash))
    };

    match retry(&ctx.policy, &ctx.cancel, UPLOAD_LABEL, &on_failure, op).await {
        Ok((checksum, server_hash)) => {
            ctx.progress.report(
                UPLOAD_LABEL,
                &format!("chunk {} acknowledged ({} bytes)", chunk.index, chunk.len),
            );
            ChunkUpload {
                result: ChunkResult {
                    index: chunk.index,
                    status: ChunkStatus::Success,
                    attempts: failures.load(Ordering::SeqCst) + 1,
                    partial_hash: Some(checksum),
                },
                server_hash,
                cancelled: false,
            }
        }
        Err(err) => {
            let cancelled = matches!(err, RetryError::Cancelled);
            let attempts = match &err {
                RetryError::Exhausted { attempts, .. } => *attempts,
                RetryError::Cancelled => failures.load(Ordering::SeqCst),
            };
            warn!(chunk = chunk.index, error = %err, "chunk upload failed");
            ChunkUpload {
                result: ChunkResult {
                    index: chunk.index,
                    status: ChunkStatus::Failed,
                    attempts,
                    partial_hash: None,
                },
                server_hash: None,
                cancelled,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportAck;
    use skylift_transfer::Chunk;
    use std::future::Future;
    use std::io::Write;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockTransport {
        sends: Mutex<Vec<(ChunkMeta, Vec<u8>)>>,
        fail_first: AtomicU32,
    }

    impl MockTransport {
        fn new(fail_first: u32) -> Self {
            Self {
                sends: Mutex::new(Vec::new()),
                fail_first: AtomicU32::new(fail_first),
            }
        }

        fn send_count(&self) -> usize {
            self.sends.lock().unwrap().len()
        }
    }

    impl Transport for MockTransport {
        fn send(
            &self,
            meta: &ChunkMeta,
            data: &[u8],
        ) -> Pin<Box<dyn Future<Output = Result<TransportAck, TransportError>> + Send + '_>>
        {
            let meta = meta.clone();
            let data = data.to_vec();
            Box::pin(async move {
                self.sends.lock().unwrap().push((meta, data));
                if self.fail_first.load(Ordering::SeqCst) > 0 {
                    self.fail_first.fetch_sub(1, Ordering::SeqCst);
                    Err(TransportError("mock network failure".into()))
                } else {
                    Ok(TransportAck::default())
                }
            })
        }
    }

    fn create_test_file(dir: &Path, data: &[u8]) -> PathBuf {
        let path = dir.join("source.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    fn context(transport: Arc<MockTransport>, source: PathBuf, total_size: u64) -> WorkerContext {
        WorkerContext {
            transport,
            target: UploadTarget {
                asset_id: "asset-1".into(),
                file_path: "logs/app.log".into(),
                mime_type: Some("application/octet-stream".into()),
                description: None,
            },
            source,
            upload_id: "upload-1".into(),
            total_size,
            policy: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
            cancel: CancellationToken::new(),
            progress: Arc::new(crate::progress::NullProgress),
        }
    }

    #[tokio::test]
    async fn sends_exact_byte_range_with_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), b"0123456789");
        let transport = Arc::new(MockTransport::new(0));
        let ctx = context(Arc::clone(&transport), path, 10);

        let upload = upload_chunk(
            &ctx,
            Chunk {
                index: 1,
                offset: 4,
                len: 4,
            },
        )
        .await;

        assert_eq!(upload.result.status, ChunkStatus::Success);
        assert_eq!(upload.result.attempts, 1);

        let sends = transport.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        let (meta, data) = &sends[0];
        assert_eq!(data.as_slice(), b"4567");
        assert_eq!(meta.index, 1);
        assert_eq!(meta.offset, 4);
        assert_eq!(meta.total_size, 10);
        assert_eq!(meta.checksum, checksum_bytes(b"4567"));
        assert_eq!(upload.result.partial_hash.as_deref(), Some(meta.checksum.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_with_own_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), b"abcdef");
        let transport = Arc::new(MockTransport::new(2));
        let ctx = context(Arc::clone(&transport), path, 6);

        let upload = upload_chunk(
            &ctx,
            Chunk {
                index: 0,
                offset: 0,
                len: 6,
            },
        )
        .await;

        assert_eq!(upload.result.status, ChunkStatus::Success);
        assert_eq!(upload.result.attempts, 3);
        assert_eq!(transport.send_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_failed_result_instead_of_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), b"abcdef");
        let transport = Arc::new(MockTransport::new(u32::MAX));
        let ctx = context(Arc::clone(&transport), path, 6);

        let upload = upload_chunk(
            &ctx,
            Chunk {
                index: 2,
                offset: 0,
                len: 6,
            },
        )
        .await;

        assert_eq!(upload.result.status, ChunkStatus::Failed);
        assert_eq!(upload.result.attempts, 3);
        assert!(upload.result.partial_hash.is_none());
        assert!(!upload.cancelled);
        assert_eq!(transport.send_count(), 3);
    }

    #[tokio::test]
    async fn cancellation_marks_result_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), b"abcdef");
        let transport = Arc::new(MockTransport::new(0));
        let mut ctx = context(Arc::clone(&transport), path, 6);
        ctx.cancel = CancellationToken::new();
        ctx.cancel.cancel();

        let upload = upload_chunk(
            &ctx,
            Chunk {
                index: 0,
                offset: 0,
                len: 6,
            },
        )
        .await;

        assert_eq!(upload.result.status, ChunkStatus::Failed);
        assert!(upload.cancelled);
        assert_eq!(transport.send_count(), 0);
    }

    #[tokio::test]
    async fn zero_length_chunk_uploads_empty_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), b"");
        let transport = Arc::new(MockTransport::new(0));
        let ctx = context(Arc::clone(&transport), path, 0);

        let upload = upload_chunk(
            &ctx,
            Chunk {
                index: 0,
                offset: 0,
                len: 0,
            },
        )
        .await;

        assert_eq!(upload.result.status, ChunkStatus::Success);
        let sends = transport.sends.lock().unwrap();
        assert!(sends[0].1.is_empty());
        // SHA-256 of the empty input.
        assert_eq!(
            sends[0].0.checksum,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
