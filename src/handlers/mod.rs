// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod health;
pub mod pages;
pub mod photos;

pub use health::config as health_config;
pub use pages::config as pages_config;
pub use photos::config as photos_config;
