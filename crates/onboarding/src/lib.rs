//! Agent identity and platform onboarding.
//!
//! An agent establishes a trusted identity (`client_id`) with the remote
//! platform exactly once. Trust is backed either by a shared secret or by
//! RSA certificate material installed before the first onboarding call.
//! Onboarding happens-before any upload activity, so the identity record is
//! effectively immutable for the rest of the process.

mod agent;
mod certificate;
mod client;
mod manager;
mod store;

pub use agent::{Agent, CertificateProfile, Credentials, OnboardingState};
pub use client::{OnboardRequest, OnboardResponse, OnboardingClient, OnboardingClientError};
pub use manager::{ONBOARDING_LABEL, OnboardingManager};
pub use store::{IdentityStore, StoreError};

use skylift_retry::RetryError;

/// Errors from the onboarding flow.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// Installing certificate material failed. Fatal: a malformed key fails
    /// identically on every attempt, so this is never retried.
    #[error("certificate setup failed: {0}")]
    CertificateSetup(String),

    /// The platform rejected the agent's credentials. Fatal, not retried.
    #[error("credentials rejected: {0}")]
    CredentialsRejected(String),

    /// Onboarding still failing after the retry budget was spent.
    #[error("onboarding failed: {0}")]
    Failed(#[source] RetryError),

    #[error("onboarding cancelled")]
    Cancelled,
}
