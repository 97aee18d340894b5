//! Resident persistence on top of a [`HashStore`](crate::store::HashStore).

pub mod repository;

pub use repository::{RepositoryError, RepositoryResult, ResidentRepository, StoredResident};
