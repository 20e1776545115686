// src/services/drop_zone.rs
// DOCUMENTATION: Drop handling
// PURPOSE: Pick the file a drop forwards and hold the status text the drop zone shows

use crate::models::{DropStatus, DroppedFile};

/// Alert shown when a drop does not carry an image
pub const REJECTION_ALERT: &str = "Please drop image files only (JPG, PNG, etc.).";

/// What a drop leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// First dropped file goes to the upload stage
    Forward(DroppedFile),
    /// Blocking alert, nothing forwarded
    Rejected(&'static str),
}

/// Status text of one drop, updated by the upload callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropZone {
    status: DropStatus,
}

impl Default for DropZone {
    fn default() -> Self {
        Self {
            status: DropStatus::Idle,
        }
    }
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> DropStatus {
        self.status
    }

    pub fn status_text(&self) -> String {
        self.status().to_string()
    }

    pub fn set_status(&mut self, status: DropStatus) {
        self.status = status;
    }

    /// A rejected drop leaves the status untouched
    pub fn drop_files(&mut self, files: Vec<DroppedFile>) -> DropOutcome {
        match select_upload(files) {
            Ok(file) => {
                self.status = DropStatus::Uploading;
                DropOutcome::Forward(file)
            }
            Err(alert) => DropOutcome::Rejected(alert),
        }
    }
}

/// Only the first dropped entry counts, and only if it is an image
pub fn select_upload(files: Vec<DroppedFile>) -> Result<DroppedFile, &'static str> {
    match files.into_iter().next() {
        Some(file) if file.is_image() => Ok(file),
        _ => Err(REJECTION_ALERT),
    }
}
