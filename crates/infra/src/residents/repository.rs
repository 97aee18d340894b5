//! Maps resident operations onto hash-store calls.
//!
//! Every resident lives in one hash at `resident:<id>`. A resident exists iff
//! that hash has at least one field.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use registry_core::{
    DomainError, FieldMap, KEY_PATTERN, Resident, ResidentId, ResidentPatch,
};

use crate::store::{HashStore, StoreError};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A resident as enumerated from the store: id recovered from the key plus its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResident {
    pub id: ResidentId,
    pub fields: FieldMap,
}

#[derive(Debug, Clone)]
pub struct ResidentRepository<S> {
    store: S,
}

impl<S: HashStore> ResidentRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write all eight attributes of `resident`.
    ///
    /// There is no uniqueness check: an existing record with the same id has
    /// those fields overwritten, and any other fields it carries stay as they are.
    #[instrument(skip(self, resident), fields(resident_id = %resident.id()))]
    pub async fn create(&self, resident: &Resident) -> RepositoryResult<()> {
        self.store
            .set_fields(&resident.id().key(), &resident.field_pairs())
            .await?;
        debug!("resident saved");
        Ok(())
    }

    /// Write each record in order, one at a time.
    ///
    /// The first store error stops the loop; records already written stay.
    #[instrument(skip(self, residents), fields(total = residents.len()))]
    pub async fn create_bulk(&self, residents: &[Resident]) -> RepositoryResult<()> {
        for (written, resident) in residents.iter().enumerate() {
            if let Err(e) = self
                .store
                .set_fields(&resident.id().key(), &resident.field_pairs())
                .await
            {
                warn!(written, failed_id = %resident.id(), "bulk write aborted");
                return Err(e.into());
            }
        }
        debug!("bulk residents saved");
        Ok(())
    }

    /// Full field map of one resident.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &ResidentId) -> RepositoryResult<FieldMap> {
        let fields = self.store.get_all(&id.key()).await?;
        if fields.is_empty() {
            return Err(DomainError::not_found().into());
        }
        Ok(fields)
    }

    /// Every stored resident, in store enumeration order.
    ///
    /// Keys that turn out empty by the time they are fetched are skipped.
    #[instrument(skip(self))]
    pub async fn list(&self) -> RepositoryResult<Vec<StoredResident>> {
        let keys = self.store.keys(KEY_PATTERN).await?;
        let maps = self.store.get_all_many(&keys).await?;

        Ok(keys
            .iter()
            .zip(maps)
            .filter(|(_, fields)| !fields.is_empty())
            .filter_map(|(key, fields)| {
                ResidentId::from_key(key).map(|id| StoredResident { id, fields })
            })
            .collect())
    }

    /// Apply the supplied fields of `patch` to an existing resident.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &ResidentId, patch: &ResidentPatch) -> RepositoryResult<()> {
        if patch.is_empty() {
            return Err(DomainError::validation("at least one field is required to update").into());
        }

        let key = id.key();
        let existing = self.store.get_all(&key).await?;
        if existing.is_empty() {
            return Err(DomainError::not_found().into());
        }

        self.store.set_fields(&key, &patch.field_pairs()).await?;
        debug!("resident updated");
        Ok(())
    }

    /// Remove the resident. Deleting an absent resident is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &ResidentId) -> RepositoryResult<()> {
        self.store.delete(&id.key()).await?;
        Ok(())
    }

    pub async fn ping(&self) -> RepositoryResult<()> {
        self.store.ping().await?;
        Ok(())
    }
}
