//! Bounded-parallel chunk upload coordination.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use skylift_transfer::{ChunkPlan, calculate_file_checksum};
use tracing::debug;

use crate::error::UploadError;
use crate::types::ChunkStatus;
use crate::worker::{WorkerContext, upload_chunk};

/// Runs at most `parallelism` workers over the plan and returns the
/// whole-file content hash.
///
/// Workers pull the next unstarted chunk from a shared cursor, so completion
/// order does not matter — every transmitted chunk carries its index and the
/// platform reassembles. The first chunk to exhaust its retries cancels the
/// session-scoped token (fail-fast); in-flight siblings may finish their
/// current attempt, but nothing new starts once cancellation is signalled.
///
/// On full success the content hash is computed locally from the source,
/// since the platform cannot derive a whole-file digest from independently
/// acked parts.
pub(crate) async fn upload_chunked(
    ctx: Arc<WorkerContext>,
    plan: ChunkPlan,
    parallelism: usize,
) -> Result<String, UploadError> {
    let chunk_count = plan.len();
    let chunks = Arc::new(plan.into_chunks());
    let cursor = Arc::new(AtomicUsize::new(0));
    let first_failed: Arc<Mutex<Option<u32>>> = Arc::new(Mutex::new(None));

    let workers = parallelism.max(1).min(chunk_count);
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let ctx = Arc::clone(&ctx);
        let chunks = Arc::clone(&chunks);
        let cursor = Arc::clone(&cursor);
        let first_failed = Arc::clone(&first_failed);

        handles.push(tokio::spawn(async move {
            loop {
                // Fail-fast: nothing new starts once cancellation is signalled.
                if ctx.cancel.is_cancelled() {
                    break;
                }
                let i = cursor.fetch_add(1, Ordering::SeqCst);
                if i >= chunks.len() {
                    break;
                }

                let upload = upload_chunk(&ctx, chunks[i]).await;
                if upload.result.status == ChunkStatus::Failed {
                    if !upload.cancelled {
                        let mut guard = first_failed.lock().unwrap();
                        if guard.is_none() {
                            *guard = Some(upload.result.index);
                        }
                    }
                    ctx.cancel.cancel();
                    break;
                }
            }
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))?;
    }

    if let Some(index) = *first_failed.lock().unwrap() {
        return Err(UploadError::ChunkFailed { index });
    }
    if ctx.cancel.is_cancelled() {
        return Err(UploadError::Cancelled);
    }

    debug!(chunks = chunk_count, "all chunks acknowledged");

    let content_hash = tokio::task::spawn_blocking({
        let source = ctx.source.clone();
        move || calculate_file_checksum(&source)
    })
    .await
    .map_err(|e| UploadError::Io(std::io::Error::other(e)))??;

    Ok(content_hash)
}
