//! Transport collaborator trait.
//!
//! The HTTP transport and its authentication primitives live in the
//! embedding application; the engine only needs a way to send one unit of
//! data and receive an acknowledgement. A trait keeps the upload logic
//! decoupled from any HTTP stack and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Error from the transport collaborator (network or HTTP failure).
#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Metadata accompanying each transmitted unit.
///
/// The chunk index travels with the payload so the platform can reassemble
/// out-of-order completions; single-shot uploads are a degenerate plan with
/// one chunk at index 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMeta {
    /// Correlates parallel chunk requests belonging to one upload.
    pub upload_id: String,
    /// Platform asset receiving the file.
    pub asset_id: String,
    /// Logical path of the file on the platform.
    pub file_path: String,
    pub index: u32,
    pub offset: u64,
    /// Size of the complete file, not of this chunk.
    pub total_size: u64,
    /// SHA-256 hex digest of this chunk's payload.
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Platform acknowledgement for one transmitted unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportAck {
    /// Whole-file digest computed by the platform, when it can. Only
    /// meaningful for single-shot uploads; the platform cannot derive it
    /// from independently acked parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_hash: Option<String>,
}

/// Abstract connection to the platform file service.
///
/// Implementations must be safe to call concurrently from independent
/// workers; the engine never serializes sends.
pub trait Transport: Send + Sync {
    /// Sends one chunk (or the whole file) and waits for the platform ack.
    fn send(
        &self,
        meta: &ChunkMeta,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<TransportAck, TransportError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_json_is_camel_case() {
        let meta = ChunkMeta {
            upload_id: "u1".into(),
            asset_id: "a1".into(),
            file_path: "logs/app.log".into(),
            index: 2,
            offset: 8192,
            total_size: 10_000,
            checksum: "abcd".into(),
            mime_type: Some("text/plain".into()),
            description: None,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("uploadId"));
        assert!(json.contains("assetId"));
        assert!(json.contains("filePath"));
        assert!(json.contains("totalSize"));
        assert!(json.contains("mimeType"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn meta_json_roundtrip() {
        let meta = ChunkMeta {
            upload_id: "u1".into(),
            asset_id: "a1".into(),
            file_path: "f".into(),
            index: 0,
            offset: 0,
            total_size: 1,
            checksum: "00".into(),
            mime_type: None,
            description: Some("nightly log".into()),
        };
        let parsed: ChunkMeta = serde_json::from_str(&serde_json::to_string(&meta).unwrap()).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn ack_defaults_to_no_server_hash() {
        let ack: TransportAck = serde_json::from_str("{}").unwrap();
        assert!(ack.server_hash.is_none());
    }
}
