// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, backends and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::{Config, PhotoStoreKind};
use db::{MemoryPhotoStore, PgPhotoStore, PhotoStore};
use dotenv::dotenv;
use services::{start_cleanup_task, GalleryService, LocalObjectStorage, UploadService, UploadTracker};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting drop-gallery...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Photo record store
    let photos: Arc<dyn PhotoStore> = match config.photo_store {
        PhotoStoreKind::Postgres => match config::init_db_pool(&config).await {
            Ok(pool) => Arc::new(PgPhotoStore::new(pool)),
            Err(e) => {
                log::error!("Failed to connect to database: {}", e);
                std::process::exit(1);
            }
        },
        PhotoStoreKind::Memory => Arc::new(MemoryPhotoStore::new()),
    };

    // 5. Object storage
    std::fs::create_dir_all(&config.storage_dir)?;
    log::info!("Object storage: {}", config.storage_dir.display());
    let storage = Arc::new(LocalObjectStorage::new(
        config.storage_dir.clone(),
        &config.public_base_url,
    ));

    let gallery = web::Data::new(GalleryService::new(
        photos,
        UploadService::new(storage, &config.storage_prefix, config.max_upload_bytes),
    ));

    // 6. Upload progress sessions
    let tracker = Arc::new(UploadTracker::new(config.upload_session_ttl));
    start_cleanup_task(tracker.clone(), 60);
    log::info!(
        "Started upload session cleanup task (ttl: {}s)",
        config.upload_session_ttl
    );

    // 7. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);

    HttpServer::new(move || {
        App::new()
            // Application state (pipeline and upload sessions)
            .app_data(gallery.clone())
            .app_data(web::Data::new(tracker.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::pages_config)
            .configure(handlers::photos_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
