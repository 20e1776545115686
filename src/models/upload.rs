// src/models/upload.rs
// DOCUMENTATION: Ephemeral upload data
// PURPOSE: Dropped file handles, upload sessions and the status text shown in the drop zone

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// A file handed over by a drop: name, MIME type and size if known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DroppedFile {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 127))]
    pub content_type: String,

    pub size: Option<u64>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size,
        }
    }

    /// Only `image/*` MIME types are accepted
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Text displayed in the drop zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum DropStatus {
    Idle,
    Uploading,
    Progress(u8),
    Success,
    Error,
}

impl fmt::Display for DropStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropStatus::Idle => write!(f, "Drag and drop an image here"),
            DropStatus::Uploading => write!(f, "Uploading... please wait."),
            DropStatus::Progress(percent) => write!(f, "Uploading: {}%", percent),
            DropStatus::Success => write!(f, "Upload successful! Drop another photo."),
            DropStatus::Error => write!(f, "Upload failed. Check the storage permissions."),
        }
    }
}

/// Upload state machine; Idle is reached again after either terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Succeeded | UploadState::Failed)
    }
}

/// One upload in flight
/// DOCUMENTATION: `percent` never decreases and only reaches 100 in `complete`
#[derive(Debug, Clone, Serialize)]
pub struct UploadSession {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub total_bytes: Option<u64>,
    pub bytes_transferred: u64,
    pub percent: u8,
    pub state: UploadState,
    pub url: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    pub fn new(id: Uuid, file: &DroppedFile) -> Self {
        Self {
            id,
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            total_bytes: file.size,
            bytes_transferred: 0,
            percent: 0,
            state: UploadState::Idle,
            url: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.state = UploadState::Uploading;
    }

    /// Record transferred bytes, returns the new percentage when it moved
    pub fn record_transfer(&mut self, bytes_transferred: u64) -> Option<u8> {
        if self.state != UploadState::Uploading {
            return None;
        }
        self.bytes_transferred = self.bytes_transferred.max(bytes_transferred);

        let raw = match self.total_bytes {
            Some(total) if total > 0 => {
                ((self.bytes_transferred as f64 / total as f64) * 100.0).round()
            }
            _ => 0.0,
        };
        let next = (raw.min(99.0) as u8).max(self.percent);

        if next != self.percent {
            self.percent = next;
            Some(next)
        } else {
            None
        }
    }

    pub fn complete(&mut self, url: String) {
        self.state = UploadState::Succeeded;
        self.percent = 100;
        self.url = Some(url);
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.state = UploadState::Failed;
        self.finished_at = Some(Utc::now());
    }

    /// Drop-zone status for the current state
    pub fn status(&self) -> DropStatus {
        match self.state {
            UploadState::Idle => DropStatus::Idle,
            UploadState::Uploading if self.bytes_transferred == 0 => DropStatus::Uploading,
            UploadState::Uploading => DropStatus::Progress(self.percent),
            UploadState::Succeeded => DropStatus::Success,
            UploadState::Failed => DropStatus::Error,
        }
    }

    pub fn to_progress(&self) -> UploadProgress {
        UploadProgress {
            id: self.id,
            state: self.state,
            percent: self.percent,
            bytes_transferred: self.bytes_transferred,
            total_bytes: self.total_bytes,
            status: self.status().to_string(),
        }
    }
}

/// Progress DTO for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadProgress {
    pub id: Uuid,
    pub state: UploadState,
    pub percent: u8,
    pub bytes_transferred: u64,
    pub total_bytes: Option<u64>,
    pub status: String,
}
