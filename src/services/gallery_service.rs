// src/services/gallery_service.rs
// DOCUMENTATION: Drop → upload → record → reload pipeline
// PURPOSE: Chain the upload stage, the record write and the gallery reload in order

use crate::db::PhotoStore;
use crate::errors::GalleryError;
use crate::models::{DropStatus, DroppedFile, NewPhoto, Photo, UploadResponse};
use crate::services::drop_zone::DropZone;
use crate::services::storage::ByteStream;
use crate::services::upload_service::UploadService;
use crate::services::upload_tracker::SessionHandle;
use std::sync::Arc;

pub struct GalleryService {
    photos: Arc<dyn PhotoStore>,
    uploads: UploadService,
}

impl GalleryService {
    pub fn new(photos: Arc<dyn PhotoStore>, uploads: UploadService) -> Self {
        Self { photos, uploads }
    }

    pub fn uploads(&self) -> &UploadService {
        &self.uploads
    }

    /// All records, newest first
    /// DOCUMENTATION: A failed query is logged and yields an empty gallery
    pub async fn load_gallery(&self) -> Vec<Photo> {
        match self.photos.list_newest_first().await {
            Ok(photos) => photos,
            Err(e) => {
                log::error!("Error loading gallery images: {}", e);
                Vec::new()
            }
        }
    }

    /// Write one record, then reload the gallery
    /// DOCUMENTATION: On write failure nothing is reloaded and the stored object stays orphaned
    pub async fn record_and_refresh(
        &self,
        url: &str,
        name: &str,
    ) -> Result<(Photo, Vec<Photo>), GalleryError> {
        let photo = self
            .photos
            .add(&NewPhoto::new(url, name))
            .await
            .map_err(|e| {
                log::error!("Error adding photo record for {} (object left at {}): {}", name, url, e);
                e
            })?;

        let gallery = self.load_gallery().await;
        Ok((photo, gallery))
    }

    /// Run one forwarded drop through upload, record write and reload
    /// DOCUMENTATION: `zone` receives the status text the user would see
    pub async fn process_drop(
        &self,
        file: &DroppedFile,
        body: ByteStream,
        session: &SessionHandle,
        zone: &mut DropZone,
    ) -> Result<UploadResponse, GalleryError> {
        let url = match self.uploads.upload(file, body, session).await {
            Ok(url) => url,
            Err(e) => {
                zone.set_status(DropStatus::Error);
                return Err(e);
            }
        };
        zone.set_status(DropStatus::Success);

        let (photo, gallery) = self.record_and_refresh(&url, &file.name).await?;

        Ok(UploadResponse {
            photo,
            gallery,
            status: zone.status_text(),
        })
    }
}
