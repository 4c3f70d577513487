use super::mem_backend::MemBackend;
use super::metadata_store::MetadataStore;

pub type InMemoryMetadataStore = MetadataStore<MemBackend>;

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        MetadataStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::cast::CastType;
    use crate::host::MetadataHost;
    use crate::record::Record;
    use crate::row::MetadataRow;
    use crate::value::MetaValue;
    use std::sync::Arc;
    use uuid::Uuid;

    /// A store with rows for a single owner.
    pub struct StoreFixture {
        pub store: InMemoryMetadataStore,
        pub owner: Uuid,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryMetadataStore::new(),
                owner: Uuid::new_v4(),
            }
        }

        /// Save a row for the fixture owner through the regular save path.
        pub fn with_row(self, key: &str, value: impl Into<MetaValue>, cast: &str) -> Self {
            let cast = CastType::from_tag(Some(cast));
            let mut row = MetadataRow::build(Arc::clone(self.store.schema()), key, value, &cast);
            row.set_owner(self.owner);
            self.store.save_row(&mut row).unwrap();
            self
        }

        /// A host for the fixture owner whose metadata comes from the store.
        pub fn host(&self, record: Record) -> MetadataHost<'_> {
            MetadataHost::new(record)
                .with_id(self.owner)
                .with_provider(self.store.rows_for(self.owner))
        }
    }
}
