// src/models/photo.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Gallery photo record
/// DOCUMENTATION: Maps directly to the photos table; written once per successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Photo {
    pub id: Uuid,
    /// Public download URL returned by the object store
    pub url: String,
    /// Original filename of the dropped file
    pub name: String,
    /// Creation time assigned by the record store
    pub timestamp: DateTime<Utc>,
}

/// Record to add; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub url: String,
    pub name: String,
}

impl NewPhoto {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }
}

/// Response of a successful upload: the new record and the reloaded gallery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub photo: Photo,
    pub gallery: Vec<Photo>,
    pub status: String,
}
