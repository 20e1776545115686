// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod memory;
pub mod photo_repository;

pub use memory::*;
pub use photo_repository::*;
