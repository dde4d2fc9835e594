//! Upload queue item.

use assetdesk_core::types::{DirectoryId, UploadId};
use assetdesk_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::UploadStatus;
use crate::file::FileRecord;

/// A queued, in-flight, or finished upload.
///
/// Status changes only through the transition methods, each of which
/// rejects moves the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadItem {
    /// Queue identifier.
    pub id: UploadId,
    /// Name of the source file.
    pub name: String,
    /// Declared size of the source in bytes.
    pub size: u64,
    /// Current status.
    pub status: UploadStatus,
    /// Percentage of bytes written, 0..=100.
    pub progress: u8,
    /// Directory the file is uploaded into.
    pub target_directory_id: DirectoryId,
    /// The created record once Completed.
    pub result: Option<FileRecord>,
    /// Failure or rejection reason when in Error.
    pub error: Option<String>,
    /// When the item entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl UploadItem {
    /// Create a Pending item.
    pub fn pending(name: impl Into<String>, size: u64, target_directory_id: DirectoryId) -> Self {
        Self {
            id: UploadId::new(),
            name: name.into(),
            size,
            status: UploadStatus::Pending,
            progress: 0,
            target_directory_id,
            result: None,
            error: None,
            enqueued_at: Utc::now(),
        }
    }

    /// Create an item that failed validation and never enters a slot.
    pub fn rejected(
        name: impl Into<String>,
        size: u64,
        target_directory_id: DirectoryId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: UploadStatus::Error,
            error: Some(reason.into()),
            ..Self::pending(name, size, target_directory_id)
        }
    }

    fn transition(&mut self, next: UploadStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_state(format!(
                "upload {} ({}): cannot move from {} to {}",
                self.id, self.name, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Pending -> Uploading.
    pub fn start(&mut self) -> AppResult<()> {
        self.transition(UploadStatus::Uploading)?;
        self.progress = 0;
        self.error = None;
        Ok(())
    }

    /// Record bytes written. Ignored unless Uploading; never moves backwards.
    pub fn record_progress(&mut self, written: u64) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }
        let pct = if self.size == 0 {
            0
        } else {
            (written.saturating_mul(100) / self.size).min(99) as u8
        };
        if pct > self.progress {
            self.progress = pct;
            return true;
        }
        false
    }

    /// Uploading -> Completed.
    pub fn complete(&mut self, record: FileRecord) -> AppResult<()> {
        self.transition(UploadStatus::Completed)?;
        self.progress = 100;
        self.result = Some(record);
        Ok(())
    }

    /// Uploading -> Error.
    pub fn fail(&mut self, reason: impl Into<String>) -> AppResult<()> {
        self.transition(UploadStatus::Error)?;
        self.error = Some(reason.into());
        Ok(())
    }

    /// Uploading -> Cancelled.
    pub fn cancel(&mut self) -> AppResult<()> {
        self.transition(UploadStatus::Cancelled)
    }

    /// Error -> Pending.
    pub fn retry(&mut self) -> AppResult<()> {
        self.transition(UploadStatus::Pending)?;
        self.progress = 0;
        self.error = None;
        Ok(())
    }

    /// Refresh the rejection reason of an item that stays in Error.
    pub fn reject_again(&mut self, reason: impl Into<String>) {
        if self.status == UploadStatus::Error {
            self.error = Some(reason.into());
        }
    }
}
