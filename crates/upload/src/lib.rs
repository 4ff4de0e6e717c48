//! Reliable file upload to the platform file service.
//!
//! This crate implements the **business logic** of the upload engine. It is
//! a library crate with no transport dependencies: the embedding application
//! provides a [`Transport`] implementation that bridges to its actual HTTP
//! client, and optionally an [`OnboardingClient`](skylift_onboarding::OnboardingClient)
//! for agent mode.
//!
//! # Pipeline
//!
//! 1. **Pre-flight** — validate the source file before any network call
//! 2. **Onboard** — establish platform trust (agent mode only, idempotent)
//! 3. **Plan** — split the file into byte-range chunks (chunked mode)
//! 4. **Upload** — bounded pool of workers, independent retry budgets,
//!    fail-fast on the first exhausted chunk
//! 5. **Verify** — return the whole-file content hash to the caller

mod coordinator;
mod error;
mod progress;
mod session;
mod transport;
mod types;
mod worker;

pub use error::UploadError;
pub use progress::{NullProgress, ProgressSink};
pub use session::UploadSession;
pub use transport::{ChunkMeta, Transport, TransportAck, TransportError};
pub use types::{ChunkResult, ChunkStatus, UploadOptions, UploadOutcome, UploadTarget};
pub use worker::UPLOAD_LABEL;

// Callers configure retries through the same policy type the executor uses.
pub use skylift_retry::RetryPolicy;
