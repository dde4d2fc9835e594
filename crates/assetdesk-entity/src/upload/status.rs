//! Upload status and its transition table.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a queued upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Waiting for a transfer slot.
    Pending,
    /// Transfer in progress.
    Uploading,
    /// Content stored and file record created.
    Completed,
    /// Cancelled while uploading.
    Cancelled,
    /// Rejected by validation or failed mid-transfer.
    Error,
}

impl UploadStatus {
    /// Return the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// ```text
    /// Pending   -> Uploading
    /// Uploading -> Completed | Error | Cancelled
    /// Error     -> Pending
    /// ```
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Uploading)
                | (Self::Uploading, Self::Completed)
                | (Self::Uploading, Self::Error)
                | (Self::Uploading, Self::Cancelled)
                | (Self::Error, Self::Pending)
        )
    }

    /// Completed and Cancelled items only leave the queue by removal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Pending or Uploading.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Uploading)
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
