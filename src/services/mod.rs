// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod drop_zone;
pub mod gallery_service;
pub mod render;
pub mod storage;
pub mod upload_service;
pub mod upload_tracker;

pub use drop_zone::*;
pub use gallery_service::*;
pub use render::*;
pub use storage::*;
pub use upload_service::*;
pub use upload_tracker::*;
