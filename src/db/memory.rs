// src/db/memory.rs
// DOCUMENTATION: In-process photo collection
// PURPOSE: Development backend (PHOTO_STORE=memory) and test double

use crate::db::PhotoStore;
use crate::errors::GalleryError;
use crate::models::{NewPhoto, Photo};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Photo records kept in insertion order
#[derive(Default)]
pub struct MemoryPhotoStore {
    photos: RwLock<Vec<Photo>>,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn add(&self, photo: &NewPhoto) -> Result<Photo, GalleryError> {
        let mut photos = self.photos.write().await;

        // Timestamps never go backwards even if the wall clock does
        let now = Utc::now();
        let timestamp = photos
            .last()
            .map(|last| last.timestamp.max(now))
            .unwrap_or(now);

        let record = Photo {
            id: Uuid::new_v4(),
            url: photo.url.clone(),
            name: photo.name.clone(),
            timestamp,
        };
        photos.push(record.clone());
        log::debug!("Added photo record {} ({} total)", record.id, photos.len());

        Ok(record)
    }

    async fn list_newest_first(&self) -> Result<Vec<Photo>, GalleryError> {
        let photos = self.photos.read().await;
        // Reverse first so equal timestamps keep the later insert in front
        let mut newest_first: Vec<Photo> = photos.iter().rev().cloned().collect();
        newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(newest_first)
    }
}
