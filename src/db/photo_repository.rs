// src/db/photo_repository.rs
// DOCUMENTATION: Photo record persistence
// PURPOSE: Add photo records and read the whole collection newest first

use crate::errors::GalleryError;
use crate::models::{NewPhoto, Photo};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Newest first; `seq` keeps inserts sharing a timestamp in reverse insertion order
const LIST_NEWEST_FIRST_SQL: &str = r#"
    SELECT id, url, name, timestamp FROM photos
    ORDER BY timestamp DESC, seq DESC
"#;

/// Document collection holding the photo records
/// DOCUMENTATION: Records are only ever added; the store assigns id and timestamp
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Add one record with a server-assigned timestamp
    async fn add(&self, photo: &NewPhoto) -> Result<Photo, GalleryError>;

    /// All records ordered by descending timestamp
    async fn list_newest_first(&self) -> Result<Vec<Photo>, GalleryError>;
}

/// PostgreSQL-backed photo collection
pub struct PgPhotoStore {
    pool: PgPool,
}

impl PgPhotoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoStore for PgPhotoStore {
    async fn add(&self, photo: &NewPhoto) -> Result<Photo, GalleryError> {
        let photo = sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (id, url, name, timestamp)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, url, name, timestamp
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&photo.url)
        .bind(&photo.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to add photo record: {}", e);
            GalleryError::DatabaseError(format!("Add photo failed: {}", e))
        })?;

        Ok(photo)
    }

    async fn list_newest_first(&self) -> Result<Vec<Photo>, GalleryError> {
        let photos = sqlx::query_as::<_, Photo>(LIST_NEWEST_FIRST_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch photo records: {}", e);
                GalleryError::DatabaseError(format!("Fetch photos failed: {}", e))
            })?;

        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_breaks_timestamp_ties_by_insert_order() {
        let order_by = LIST_NEWEST_FIRST_SQL
            .split("ORDER BY")
            .nth(1)
            .map(str::trim)
            .unwrap();
        assert_eq!(order_by, "timestamp DESC, seq DESC");
    }
}
