//! Top-level upload façade.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use skylift_onboarding::{Agent, OnboardingClient, OnboardingManager};
use skylift_transfer::{Chunk, ChunkPlan};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::coordinator::upload_chunked;
use crate::error::UploadError;
use crate::progress::{NullProgress, ProgressSink};
use crate::transport::Transport;
use crate::types::{ChunkStatus, UploadOptions, UploadOutcome, UploadTarget};
use crate::worker::{UPLOAD_LABEL, WorkerContext, upload_chunk};

/// Agent-mode state: the identity plus the client used to onboard it.
struct OnboardingHandle {
    agent: tokio::sync::Mutex<Agent>,
    client: Arc<dyn OnboardingClient>,
    manager: OnboardingManager,
}

/// Drives one or more uploads against a single transport.
///
/// Side effects are limited to network calls and the one-time onboarding
/// state mutation; the source file is never modified.
pub struct UploadSession {
    transport: Arc<dyn Transport>,
    progress: Arc<dyn ProgressSink>,
    options: UploadOptions,
    cancel: CancellationToken,
    onboarding: Option<OnboardingHandle>,
}

impl UploadSession {
    /// Creates a session. Invalid options are rejected here, at
    /// construction, never mid-upload.
    pub fn new(transport: Arc<dyn Transport>, options: UploadOptions) -> Result<Self, UploadError> {
        options.validate()?;
        Ok(Self {
            transport,
            progress: Arc::new(NullProgress),
            options,
            cancel: CancellationToken::new(),
            onboarding: None,
        })
    }

    /// Injects a progress sink. Defaults to [`NullProgress`].
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Enables agent mode: the session onboards `agent` through `client`
    /// before the first upload activity. Already-onboarded agents cost
    /// zero network calls.
    pub fn with_agent(mut self, agent: Agent, client: Arc<dyn OnboardingClient>) -> Self {
        let manager = OnboardingManager::new(self.options.retry.clone(), self.cancel.clone());
        self.onboarding = Some(OnboardingHandle {
            agent: tokio::sync::Mutex::new(agent),
            client,
            manager,
        });
        self
    }

    /// Token for caller-initiated cancellation (e.g. an overall timeout).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The agent's platform identity, once onboarded.
    pub async fn client_id(&self) -> Option<String> {
        match &self.onboarding {
            Some(handle) => handle.agent.lock().await.client_id().map(str::to_string),
            None => None,
        }
    }

    /// Uploads `source` to `platform_path` on the target asset.
    ///
    /// Validates the source before any network activity, onboards the agent
    /// if needed, then dispatches to the chunked or single-shot path per
    /// the options.
    pub async fn upload(
        &self,
        source: &Path,
        platform_path: &str,
    ) -> Result<UploadOutcome, UploadError> {
        let started = Instant::now();

        // Pre-flight: the source must be a readable regular file. Fails
        // before any network call is made.
        let metadata = std::fs::metadata(source)
            .map_err(|_| UploadError::SourceNotFound(source.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(UploadError::SourceNotFound(source.to_path_buf()));
        }
        std::fs::File::open(source)
            .map_err(|_| UploadError::SourceNotFound(source.to_path_buf()))?;
        let total_size = metadata.len();

        // Agent mode: trust is established before all upload activity.
        if let Some(handle) = &self.onboarding {
            let progress = Arc::clone(&self.progress);
            let on_failure = move |label: &str, attempt: u32, err: &str| {
                progress.report(label, &format!("attempt {attempt} failed: {err}"));
            };
            let mut agent = handle.agent.lock().await;
            handle
                .manager
                .ensure_onboarded(&mut agent, handle.client.as_ref(), &on_failure)
                .await?;
        }

        let asset_id = self.resolve_asset_id().await?;
        let target = UploadTarget {
            asset_id,
            file_path: platform_path.to_string(),
            mime_type: self.options.mime_type.clone(),
            description: self.options.description.clone(),
        };

        let ctx = Arc::new(WorkerContext {
            transport: Arc::clone(&self.transport),
            target,
            source: source.to_path_buf(),
            upload_id: Uuid::new_v4().to_string(),
            total_size,
            policy: self.options.retry.clone(),
            cancel: self.cancel.child_token(),
            progress: Arc::clone(&self.progress),
        });

        let content_hash = if self.options.chunked {
            let plan = ChunkPlan::build(total_size, self.options.chunk_size)?;
            debug!(
                chunks = plan.len(),
                total_bytes = total_size,
                parallelism = self.options.parallelism,
                "starting chunked upload"
            );
            upload_chunked(Arc::clone(&ctx), plan, self.options.parallelism).await?
        } else {
            debug!(total_bytes = total_size, "starting single-shot upload");
            self.upload_single_shot(&ctx, total_size).await?
        };

        let outcome = UploadOutcome {
            content_hash,
            total_bytes: total_size,
            elapsed: started.elapsed(),
        };
        self.progress.report(
            UPLOAD_LABEL,
            &format!("complete: {} bytes in {:.1?}", outcome.total_bytes, outcome.elapsed),
        );
        info!(
            bytes = outcome.total_bytes,
            hash = %outcome.content_hash,
            "upload complete"
        );
        Ok(outcome)
    }

    /// The whole file as one chunk, through the same worker/retry contract
    /// as the chunked path.
    async fn upload_single_shot(
        &self,
        ctx: &WorkerContext,
        total_size: u64,
    ) -> Result<String, UploadError> {
        let chunk = Chunk {
            index: 0,
            offset: 0,
            len: total_size,
        };
        let upload = upload_chunk(ctx, chunk).await;
        match upload.result.status {
            ChunkStatus::Success => {
                // Prefer the platform-computed digest when the ack carries
                // one; the single chunk covers the whole file, so the
                // partial hash is already the full-file digest.
                Ok(upload
                    .server_hash
                    .or(upload.result.partial_hash)
                    .unwrap_or_default())
            }
            ChunkStatus::Failed if upload.cancelled => Err(UploadError::Cancelled),
            ChunkStatus::Failed => Err(UploadError::ChunkFailed { index: 0 }),
        }
    }

    async fn resolve_asset_id(&self) -> Result<String, UploadError> {
        if let Some(id) = &self.options.asset_id {
            return Ok(id.clone());
        }
        if let Some(handle) = &self.onboarding {
            let agent = handle.agent.lock().await;
            if let Some(id) = agent.client_id() {
                return Ok(id.to_string());
            }
        }
        Err(UploadError::InvalidOptions(
            "asset_id is required when no onboarded agent is attached".into(),
        ))
    }
}
