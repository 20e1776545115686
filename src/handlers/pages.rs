// src/handlers/pages.rs
// DOCUMENTATION: Browser-facing handlers
// PURPOSE: Serve the drop zone page with the gallery and the stored image objects

use crate::errors::GalleryError;
use crate::services::{render_page, GalleryService};
use actix_web::{web, HttpResponse, Responder};

/// Content type of a stored object, by file extension
fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// GET /
/// Drop zone page; the gallery is loaded fresh on every request
pub async fn index(gallery: web::Data<GalleryService>) -> impl Responder {
    let photos = gallery.load_gallery().await;
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_page(&photos))
}

/// GET /objects/{path}
/// Public download URL of an uploaded image
pub async fn get_object(
    gallery: web::Data<GalleryService>,
    path: web::Path<String>,
) -> Result<impl Responder, GalleryError> {
    let path = path.into_inner();
    let bytes = gallery.uploads().storage().get(&path).await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&path))
        // Uploaded content never runs script in this origin
        .insert_header(("Content-Security-Policy", "default-src 'none'; style-src 'unsafe-inline'"))
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .body(bytes))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/objects/{path:.*}", web::get().to(get_object));
}
