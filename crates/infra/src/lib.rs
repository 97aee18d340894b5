//! Infrastructure layer: hash stores, the resident repository, and configuration.

pub mod config;
pub mod residents;
pub mod store;
