// src/handlers/photos.rs
// DOCUMENTATION: HTTP handlers for photo uploads and the gallery collection
// PURPOSE: Turn requests into drops, run the pipeline, return records and progress

use crate::errors::GalleryError;
use crate::models::DroppedFile;
use crate::services::{DropOutcome, DropZone, GalleryService, UploadTracker};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

pub const FILE_NAME_HEADER: &str = "X-File-Name";
pub const UPLOAD_ID_HEADER: &str = "X-Upload-Id";

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Build the dropped file from the request headers
fn dropped_file(req: &HttpRequest) -> Result<DroppedFile, GalleryError> {
    let raw_name = header_str(req, FILE_NAME_HEADER)
        .ok_or_else(|| GalleryError::InvalidInput(format!("Missing {} header", FILE_NAME_HEADER)))?;
    let name = urlencoding::decode(raw_name)
        .map_err(|e| GalleryError::InvalidInput(format!("Bad file name: {}", e)))?
        .into_owned();

    let content_type = header_str(req, header::CONTENT_TYPE.as_str())
        .unwrap_or_default()
        .to_string();

    let size = header_str(req, header::CONTENT_LENGTH.as_str()).and_then(|v| v.parse().ok());

    Ok(DroppedFile::new(name, content_type, size))
}

fn upload_id(req: &HttpRequest) -> Result<Uuid, GalleryError> {
    match header_str(req, UPLOAD_ID_HEADER) {
        Some(raw) => Uuid::parse_str(raw)
            .map_err(|_| GalleryError::InvalidInput(format!("Invalid {} header", UPLOAD_ID_HEADER))),
        None => Ok(Uuid::new_v4()),
    }
}

/// POST /photos
/// Upload one image, record it and return the reloaded gallery
pub async fn upload_photo(
    gallery: web::Data<GalleryService>,
    tracker: web::Data<Arc<UploadTracker>>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<impl Responder, GalleryError> {
    let dropped = dropped_file(&req)?;

    let mut zone = DropZone::new();
    let file = match zone.drop_files(vec![dropped]) {
        DropOutcome::Forward(file) => file,
        DropOutcome::Rejected(alert) => {
            log::warn!("Rejected drop: {}", alert);
            return Err(GalleryError::UnsupportedMediaType(alert.to_string()));
        }
    };

    let session = tracker.begin(upload_id(&req)?, &file).await;
    let body = payload
        .map(|chunk| chunk.map_err(|e| GalleryError::UploadFailed(e.to_string())))
        .boxed_local();

    let response = gallery
        .process_drop(&file, body, &session, &mut zone)
        .await?;

    Ok(HttpResponse::Created().json(response))
}

/// GET /photos
/// All photo records, newest first
pub async fn list_photos(gallery: web::Data<GalleryService>) -> impl Responder {
    HttpResponse::Ok().json(gallery.load_gallery().await)
}

/// GET /uploads/{id}
/// Progress of an upload session
pub async fn upload_progress(
    tracker: web::Data<Arc<UploadTracker>>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, GalleryError> {
    let id = path.into_inner();
    let progress = tracker
        .get(&id)
        .await
        .ok_or_else(|| GalleryError::NotFound(format!("Upload session {}", id)))?;
    Ok(HttpResponse::Ok().json(progress))
}

/// Configuration for photo routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/photos")
            .route("", web::get().to(list_photos))
            .route("", web::post().to(upload_photo)),
    )
    .route("/uploads/{id}", web::get().to(upload_progress));
}
