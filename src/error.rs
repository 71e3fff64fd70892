//! Error types for the export pipeline and the remote APIs.
//!
//! `ExportError` covers problems with individual photo records. These are
//! recoverable: the offending photo is reported and skipped, the rest of the
//! export carries on. `ApiError` covers error envelopes and unexpected
//! statuses returned by VK or Yandex.Disk.

use thiserror::Error;

/// Per-photo errors raised while building the export set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// The photo at `position` in the input collection offered no size variants
    #[error("photo #{position} has no size variants")]
    InvalidInput { position: usize },
}

/// Errors reported by the remote services
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("VK API error {code}: {message}")]
    Vk { code: i64, message: String },

    #[error("Yandex.Disk returned HTTP {status} while trying to {action}: {body}")]
    Disk {
        action: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
}

impl ApiError {
    /// Whether the remote service rejected our credentials
    pub fn is_auth_failure(&self) -> bool {
        match self {
            // 5 = user authorization failed, 15 = access denied
            ApiError::Vk { code, .. } => *code == 5 || *code == 15,
            ApiError::Disk { status, .. } => *status == 401 || *status == 403,
            ApiError::Malformed { .. } => false,
        }
    }
}
