//! Platform onboarding client trait.
//!
//! The embedding application implements [`OnboardingClient`] on top of its
//! HTTP stack. A trait keeps the onboarding state machine decoupled from
//! transport and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::agent::Credentials;

/// Errors from the onboarding collaborator.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingClientError {
    /// The platform rejected the supplied credentials. Fatal: the same
    /// credentials fail identically on every attempt.
    #[error("credentials rejected: {0}")]
    CredentialsRejected(String),

    /// Transient network or server failure, retryable up to the policy.
    #[error("transient onboarding failure: {0}")]
    Transient(String),
}

/// Request sent to the platform onboarding endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub device_name: String,
    /// Present when RSA-based trust is configured; the platform matches it
    /// against the installed certificate material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_fingerprint: Option<String>,
}

/// Response from the platform onboarding endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardResponse {
    /// Stable identity assigned to the agent.
    pub client_id: String,
}

/// Abstract client for the platform onboarding operation.
pub trait OnboardingClient: Send + Sync {
    /// Registers the agent with the platform and returns its identity.
    ///
    /// Credentials are passed by reference and must not be captured beyond
    /// the call.
    fn onboard(
        &self,
        request: &OnboardRequest,
        credentials: &Credentials,
    ) -> Pin<Box<dyn Future<Output = Result<OnboardResponse, OnboardingClientError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_is_camel_case() {
        let req = OnboardRequest {
            device_name: "device-1".into(),
            certificate_fingerprint: Some("abcd".into()),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("deviceName"));
        assert!(json.contains("certificateFingerprint"));
    }

    #[test]
    fn request_omits_missing_fingerprint() {
        let req = OnboardRequest {
            device_name: "device-1".into(),
            certificate_fingerprint: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("certificateFingerprint"));
    }

    #[test]
    fn response_json_roundtrip() {
        let resp = OnboardResponse {
            client_id: "client-9".into(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("clientId"));
        let parsed: OnboardResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }
}
