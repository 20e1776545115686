// src/services/storage.rs
// DOCUMENTATION: Object storage for uploaded images
// PURPOSE: Stream an upload into a named object and hand out its public download URL

use crate::errors::GalleryError;
use actix_web::web::Bytes;
use async_trait::async_trait;
use futures_util::stream::LocalBoxStream;
use futures_util::StreamExt;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Upload body as a stream of chunks
pub type ByteStream = LocalBoxStream<'static, Result<Bytes, GalleryError>>;

/// Object store addressed by slash-separated paths
/// DOCUMENTATION: `put` calls `progress` with the running byte count after every chunk
#[async_trait(?Send)]
pub trait ObjectStorage: Send + Sync {
    /// Stream `body` into `path`, returns the number of bytes stored
    async fn put(
        &self,
        path: &str,
        body: ByteStream,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, GalleryError>;

    /// Read a stored object
    async fn get(&self, path: &str) -> Result<Vec<u8>, GalleryError>;

    /// Public download URL of a stored object
    fn download_url(&self, path: &str) -> String;
}

/// Objects stored as files below a root directory
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Map an object path to a file under the root, refusing anything that escapes it
    fn resolve(&self, path: &str) -> Result<PathBuf, GalleryError> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        let mut segments = 0;

        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    segments += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(GalleryError::InvalidInput(format!(
                        "Invalid object path: {}",
                        path
                    )))
                }
            }
        }

        if segments == 0 {
            return Err(GalleryError::InvalidInput("Empty object path".to_string()));
        }
        Ok(resolved)
    }

    async fn write_stream(
        file_path: &Path,
        mut body: ByteStream,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, GalleryError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(file_path)
            .await?;
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress(written);
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait(?Send)]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        path: &str,
        body: ByteStream,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, GalleryError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Each transfer gets its own temporary file; the rename publishes it whole
        let mut partial = target.clone().into_os_string();
        partial.push(format!(".{}.part", Uuid::new_v4().simple()));
        let partial = PathBuf::from(partial);

        match Self::write_stream(&partial, body, progress).await {
            Ok(written) => {
                fs::rename(&partial, &target).await?;
                log::debug!("Stored object {} ({} bytes)", path, written);
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&partial).await {
                    log::warn!("Failed to remove partial object {}: {}", path, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, GalleryError> {
        let target = self.resolve(path)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GalleryError::NotFound(format!("Object {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn download_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/objects/{}", self.public_base_url, encoded.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body(chunks: Vec<Result<Bytes, GalleryError>>) -> ByteStream {
        stream::iter(chunks).boxed_local()
    }

    fn leftover_parts(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "part"))
            .collect()
    }

    #[tokio::test]
    async fn test_put_reports_running_byte_count() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost:8080");

        let mut reports = Vec::new();
        let written = storage
            .put(
                "gallery/1_cat.png",
                body(vec![
                    Ok(Bytes::from_static(b"abcd")),
                    Ok(Bytes::from_static(b"efgh")),
                ]),
                &mut |n| reports.push(n),
            )
            .await
            .unwrap();

        assert_eq!(written, 8);
        assert_eq!(reports, vec![4, 8]);
        assert_eq!(storage.get("gallery/1_cat.png").await.unwrap(), b"abcdefgh");
    }

    #[tokio::test]
    async fn test_failed_put_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost:8080");

        let result = storage
            .put(
                "gallery/2_dog.png",
                body(vec![
                    Ok(Bytes::from_static(b"abcd")),
                    Err(GalleryError::UploadFailed("connection reset".to_string())),
                ]),
                &mut |_| {},
            )
            .await;

        assert!(matches!(result, Err(GalleryError::UploadFailed(_))));
        assert!(matches!(
            storage.get("gallery/2_dog.png").await,
            Err(GalleryError::NotFound(_))
        ));
        assert!(leftover_parts(&dir.path().join("gallery")).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_puts_to_same_path_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost:8080");
        let first: Vec<Result<Bytes, GalleryError>> =
            (0..8).map(|_| Ok(Bytes::from(vec![b'a'; 512]))).collect();
        let second: Vec<Result<Bytes, GalleryError>> =
            (0..8).map(|_| Ok(Bytes::from(vec![b'b'; 512]))).collect();

        let mut ignore_left = |_: u64| {};
        let mut ignore_right = |_: u64| {};
        let (left, right) = tokio::join!(
            storage.put("gallery/3_same.png", body(first), &mut ignore_left),
            storage.put("gallery/3_same.png", body(second), &mut ignore_right),
        );

        assert_eq!(left.unwrap(), 4096);
        assert_eq!(right.unwrap(), 4096);
        let stored = storage.get("gallery/3_same.png").await.unwrap();
        assert_eq!(stored.len(), 4096);
        assert!(stored.iter().all(|&b| b == stored[0]));
        assert!(leftover_parts(&dir.path().join("gallery")).is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost:8080");

        assert!(storage.get("../secret").await.is_err());
        assert!(storage.get("/etc/passwd").await.is_err());
        assert!(storage.get("").await.is_err());
    }

    #[test]
    fn test_download_url_encodes_segments() {
        let storage = LocalObjectStorage::new("/tmp", "http://localhost:8080/");
        assert_eq!(
            storage.download_url("gallery/1700000000000_my cat.png"),
            "http://localhost:8080/objects/gallery/1700000000000_my%20cat.png"
        );
    }
}
