use super::backend::{RowBackend, StoredRow};
use crate::error::{MetadataError, Result};
use crate::host::MetadataProvider;
use crate::record::Record;
use crate::row::{MetadataRow, RowSchema};
use crate::value::MetaValue;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Row lifecycle on top of a raw [`RowBackend`].
pub struct MetadataStore<B: RowBackend> {
    backend: B,
    schema: Arc<RowSchema>,
}

impl<B: RowBackend> MetadataStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self::with_schema(backend, Arc::new(RowSchema::default()))
    }

    /// Rows loaded from this store are built with `schema`.
    pub fn with_schema(backend: B, schema: Arc<RowSchema>) -> Self {
        Self { backend, schema }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    pub fn load_rows(&self, owner_id: &Uuid) -> Result<Vec<MetadataRow>> {
        let stored = self.backend.load_rows(owner_id)?;
        Ok(stored.into_iter().map(|row| self.hydrate(row)).collect())
    }

    fn hydrate(&self, stored: StoredRow) -> MetadataRow {
        let record = Record::from_stored(
            stored
                .columns
                .into_iter()
                .map(|(column, text)| (column, MetaValue::from(text))),
        );
        MetadataRow::from_record(
            stored.id,
            Some(stored.owner_id),
            record,
            Arc::clone(&self.schema),
        )
    }

    /// Serialize, write and mark the row as persisted.
    ///
    /// The pre-save hook always runs; it leaves unchanged stored text alone.
    pub fn save_row(&self, row: &mut MetadataRow) -> Result<()> {
        let owner_id = row
            .owner_id()
            .ok_or_else(|| MetadataError::Store(format!("Row {} has no owner", row.id())))?;

        row.cast_value_column_attribute()?;

        let columns = row
            .record()
            .attributes()
            .iter()
            .map(|(column, value)| (column.clone(), value.to_text()))
            .collect();
        self.backend.write_row(&StoredRow {
            id: row.id(),
            owner_id,
            columns,
        })?;

        row.record_mut().sync_original();
        debug!(row = %row.id(), owner = %owner_id, "saved metadata row");
        Ok(())
    }

    pub fn delete_row(&self, id: &Uuid) -> Result<()> {
        self.backend.delete_row(id)?;
        debug!(row = %id, "deleted metadata row");
        Ok(())
    }

    /// Provider for the rows of a single owner.
    pub fn rows_for(&self, owner_id: Uuid) -> OwnedRows<'_, B> {
        OwnedRows {
            store: self,
            owner_id,
        }
    }
}

/// The metadata relationship of one host, backed by a store.
pub struct OwnedRows<'s, B: RowBackend> {
    store: &'s MetadataStore<B>,
    owner_id: Uuid,
}

impl<B: RowBackend> OwnedRows<'_, B> {
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl<B: RowBackend> MetadataProvider for OwnedRows<'_, B> {
    fn load_metadata_rows(&self) -> Result<Vec<MetadataRow>> {
        self.store.load_rows(&self.owner_id)
    }
}
