// src/services/upload_service.rs
// DOCUMENTATION: Upload stage
// PURPOSE: Stream one image into a uniquely named object and resolve its download URL

use crate::errors::GalleryError;
use crate::models::DroppedFile;
use crate::services::storage::{ByteStream, ObjectStorage};
use crate::services::upload_tracker::SessionHandle;
use chrono::Utc;
use futures_util::StreamExt;
use std::sync::Arc;
use validator::Validate;

/// Longest object file name; leaves room for the temporary suffix under NAME_MAX
const MAX_OBJECT_NAME_BYTES: usize = 200;

/// Longest extension kept when a name is shortened, dot included
const MAX_EXTENSION_BYTES: usize = 16;

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    prefix: String,
    max_upload_bytes: u64,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>, prefix: &str, max_upload_bytes: u64) -> Self {
        Self {
            storage,
            prefix: prefix.trim_matches('/').to_string(),
            max_upload_bytes,
        }
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }

    /// `<prefix>/<unix millis>_<filename>`, only the last path component of the name is kept
    pub fn storage_path(&self, file_name: &str, now_millis: i64) -> Result<String, GalleryError> {
        let base_name = file_name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .trim();

        if base_name.is_empty() || base_name == "." || base_name == ".." {
            return Err(GalleryError::InvalidInput(format!(
                "Invalid file name: {:?}",
                file_name
            )));
        }

        let stamp = format!("{}_", now_millis);
        let budget = MAX_OBJECT_NAME_BYTES.saturating_sub(stamp.len());
        Ok(format!(
            "{}/{}{}",
            self.prefix,
            stamp,
            truncate_name(base_name, budget)
        ))
    }

    /// Upload `body` for `file`, reporting progress through `session`
    /// DOCUMENTATION: Failure is terminal: the session is marked failed and nothing is retried
    pub async fn upload(
        &self,
        file: &DroppedFile,
        body: ByteStream,
        session: &SessionHandle,
    ) -> Result<String, GalleryError> {
        if let Err(e) = file.validate() {
            return Err(GalleryError::ValidationError(e.to_string()));
        }
        let path = self.storage_path(&file.name, Utc::now().timestamp_millis())?;

        session.start();
        log::info!("Upload {} started: {} -> {}", session.id(), file.name, path);

        let body = self.limit(body);
        let upload_id = session.id();
        let mut on_progress = |bytes: u64| {
            if let Some(percent) = session.record_transfer(bytes) {
                log::debug!("Upload {}: {}%", upload_id, percent);
            }
        };

        match self.storage.put(&path, body, &mut on_progress).await {
            Ok(bytes) => {
                let url = self.storage.download_url(&path);
                session.complete(url.clone());
                log::info!("Upload {} finished ({} bytes): {}", upload_id, bytes, url);
                Ok(url)
            }
            Err(e) => {
                log::error!("Error uploading {}: {}", file.name, e);
                session.fail();
                if matches!(e, GalleryError::UploadFailed(_)) {
                    Err(e)
                } else {
                    Err(GalleryError::UploadFailed(e.to_string()))
                }
            }
        }
    }

    fn limit(&self, body: ByteStream) -> ByteStream {
        let max = self.max_upload_bytes;
        if max == 0 {
            return body;
        }

        let mut seen: u64 = 0;
        body.map(move |chunk| {
            let chunk = chunk?;
            seen += chunk.len() as u64;
            if seen > max {
                Err(GalleryError::UploadFailed(format!(
                    "File exceeds the {} byte limit",
                    max
                )))
            } else {
                Ok(chunk)
            }
        })
        .boxed_local()
    }
}

/// Shorten `name` to at most `max_bytes`, cutting on a char boundary and keeping a short extension
fn truncate_name(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let extension_start = name.rfind('.').filter(|&i| {
        let extension_len = name.len() - i;
        i > 0 && extension_len <= MAX_EXTENSION_BYTES && extension_len < max_bytes
    });

    match extension_start {
        Some(i) => {
            let (stem, extension) = name.split_at(i);
            let stem = floor_char_boundary(stem, max_bytes - extension.len());
            format!("{}{}", stem, extension)
        }
        None => floor_char_boundary(name, max_bytes).to_string(),
    }
}

fn floor_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadState;
    use crate::services::storage::LocalObjectStorage;
    use actix_web::web::Bytes;
    use futures_util::stream;
    use uuid::Uuid;

    fn service(dir: &std::path::Path, max: u64) -> UploadService {
        let storage = Arc::new(LocalObjectStorage::new(dir, "http://localhost:8080"));
        UploadService::new(storage, "gallery", max)
    }

    fn chunks(n: usize, size: usize) -> ByteStream {
        let chunks: Vec<Result<Bytes, GalleryError>> =
            (0..n).map(|_| Ok(Bytes::from(vec![7u8; size]))).collect();
        stream::iter(chunks).boxed_local()
    }

    #[test]
    fn test_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), 0);

        assert_eq!(
            service.storage_path("cat.png", 1700000000000).unwrap(),
            "gallery/1700000000000_cat.png"
        );
        assert_eq!(
            service.storage_path("C:\\Users\\me\\cat.png", 1).unwrap(),
            "gallery/1_cat.png"
        );
        assert!(service.storage_path("../", 1).is_err());
        assert!(service.storage_path("  ", 1).is_err());
    }

    #[test]
    fn test_storage_path_shortens_long_names() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), 0);
        let long_name = format!("{}.png", "x".repeat(246));

        let path = service.storage_path(&long_name, 1700000000000).unwrap();
        let object_name = path.trim_start_matches("gallery/");

        assert!(object_name.len() <= MAX_OBJECT_NAME_BYTES);
        assert!(object_name.starts_with("1700000000000_xxx"));
        assert!(object_name.ends_with(".png"));
    }

    #[test]
    fn test_truncate_name_respects_char_boundaries() {
        let name = format!("{}.jpeg", "ñ".repeat(150));

        let short = truncate_name(&name, 100);

        assert!(short.len() <= 100);
        assert!(short.ends_with(".jpeg"));
        assert!(short.trim_end_matches(".jpeg").chars().all(|c| c == 'ñ'));
        assert_eq!(truncate_name("cat.png", 101), "cat.png");
        assert_eq!(truncate_name("abcdef", 4), "abcd");
    }

    #[tokio::test]
    async fn test_upload_long_name_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), 0);
        let long_name = format!("{}.png", "x".repeat(246));
        let file = DroppedFile::new(long_name.clone(), "image/png", Some(1024));
        let session = SessionHandle::detached(Uuid::new_v4(), &file);

        let url = service.upload(&file, chunks(1, 1024), &session).await.unwrap();

        assert!(url.ends_with(".png"));
        assert_eq!(session.snapshot().state, UploadState::Succeeded);
    }

    #[tokio::test]
    async fn test_upload_resolves_download_url() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), 0);
        let file = DroppedFile::new("cat.png", "image/png", Some(4096));
        let session = SessionHandle::detached(Uuid::new_v4(), &file);

        let url = service.upload(&file, chunks(4, 1024), &session).await.unwrap();

        assert!(url.starts_with("http://localhost:8080/objects/gallery/"));
        assert!(url.ends_with("_cat.png"));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, UploadState::Succeeded);
        assert_eq!(snapshot.percent, 100);
        assert_eq!(snapshot.bytes_transferred, 4096);
        assert_eq!(snapshot.url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_upload_over_limit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), 2048);
        let file = DroppedFile::new("big.png", "image/png", Some(4096));
        let session = SessionHandle::detached(Uuid::new_v4(), &file);

        let result = service.upload(&file, chunks(4, 1024), &session).await;

        tokio_test::assert_err!(&result);
        assert!(matches!(result, Err(GalleryError::UploadFailed(_))));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, UploadState::Failed);
        assert!(snapshot.percent < 100);
    }
}
