use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A metadata row as persisted: identity plus text columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub columns: BTreeMap<String, Option<String>>,
}

/// Abstract interface for raw row I/O.
/// This trait handles the "how" of storage, while `MetadataStore` handles
/// the "what" (pre-save serialization, original tracking).
pub trait RowBackend {
    /// Load every row owned by `owner_id`, in insertion order.
    fn load_rows(&self, owner_id: &Uuid) -> Result<Vec<StoredRow>>;

    /// Insert or replace a row by id. Replacing keeps the row's position.
    fn write_row(&self, row: &StoredRow) -> Result<()>;

    /// Delete a row. Returns `RowNotFound` if there is no such row.
    fn delete_row(&self, id: &Uuid) -> Result<()>;
}
