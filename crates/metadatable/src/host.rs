//! Records that expose their metadata rows as attributes.
//!
//! A [`MetadataHost`] wraps a plain [`Record`] together with a named
//! relationship to [`MetadataRow`]s. Attribute reads go to the record first;
//! when that comes back empty, the host looks the key up in its metadata
//! rows and returns the coerced value instead.
//!
//! ```ignore
//! let store = InMemoryMetadataStore::new();
//! let host = MetadataHost::new(record).with_provider(store.rows_for(user_id));
//!
//! // Not a column on the record, resolved through the "metadata" relation
//! let nickname = host.get_attribute("nickname")?;
//! ```
//!
//! The relationship is loaded at most once per host; every lookup scans the
//! loaded rows again and re-coerces the match.

use crate::cast::CastType;
use crate::error::Result;
use crate::record::Record;
use crate::row::{MetadataRow, RowSchema};
use crate::store::{MetadataStore, RowBackend};
use crate::value::MetaValue;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Supplies the metadata rows owned by a host.
pub trait MetadataProvider {
    fn load_metadata_rows(&self) -> Result<Vec<MetadataRow>>;
}

impl<F> MetadataProvider for F
where
    F: Fn() -> Result<Vec<MetadataRow>>,
{
    fn load_metadata_rows(&self) -> Result<Vec<MetadataRow>> {
        self()
    }
}

/// When a base attribute read falls through to metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// The base result is empty (null, zero, blank, false) and the key is
    /// not a stored field.
    #[default]
    WhenEmpty,
    /// The base accessor produced nothing at all.
    WhenAbsent,
}

/// Computed attribute on the host record.
pub type HostAccessor = fn(&Record) -> Option<MetaValue>;

/// Relationship name, fallback policy and accessors for a kind of host.
#[derive(Debug, Clone)]
pub struct HostSchema {
    metadata_relation: String,
    fallback: FallbackPolicy,
    row_schema: Arc<RowSchema>,
    accessors: HashMap<String, HostAccessor>,
}

impl Default for HostSchema {
    fn default() -> Self {
        Self {
            metadata_relation: "metadata".to_string(),
            fallback: FallbackPolicy::default(),
            row_schema: Arc::new(RowSchema::default()),
            accessors: HashMap::new(),
        }
    }
}

impl HostSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relation(mut self, name: impl Into<String>) -> Self {
        self.metadata_relation = name.into();
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Schema for rows this host creates through [`MetadataHost::set_metadata`].
    pub fn with_row_schema(mut self, row_schema: Arc<RowSchema>) -> Self {
        self.row_schema = row_schema;
        self
    }

    pub fn with_accessor(mut self, key: impl Into<String>, accessor: HostAccessor) -> Self {
        self.accessors.insert(key.into(), accessor);
        self
    }

    pub fn metadata_relation(&self) -> &str {
        &self.metadata_relation
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn row_schema(&self) -> &Arc<RowSchema> {
        &self.row_schema
    }

    pub fn into_shared(self) -> Arc<HostSchema> {
        Arc::new(self)
    }
}

pub struct MetadataHost<'a> {
    id: Uuid,
    record: Record,
    schema: Arc<HostSchema>,
    provider: Option<Box<dyn MetadataProvider + 'a>>,
    relation: OnceCell<Vec<MetadataRow>>,
}

impl fmt::Debug for MetadataHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataHost")
            .field("id", &self.id)
            .field("record", &self.record)
            .field("relation", &self.schema.metadata_relation)
            .field("has_provider", &self.provider.is_some())
            .field("loaded", &self.relation.get().map(Vec::len))
            .finish()
    }
}

impl<'a> MetadataHost<'a> {
    pub fn new(record: Record) -> Self {
        Self::with_schema(record, Arc::new(HostSchema::default()))
    }

    pub fn with_schema(record: Record, schema: Arc<HostSchema>) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            schema,
            provider: None,
            relation: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Attach a lazily loaded metadata relationship.
    pub fn with_provider(mut self, provider: impl MetadataProvider + 'a) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Attach already loaded metadata rows.
    pub fn with_metadata(mut self, rows: Vec<MetadataRow>) -> Self {
        self.relation = OnceCell::from(rows);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn schema(&self) -> &Arc<HostSchema> {
        &self.schema
    }

    pub fn get_metadata_relationship_name(&self) -> &str {
        self.schema.metadata_relation()
    }

    /// Whether this host has a metadata relationship at all.
    pub fn has_metadata(&self) -> bool {
        self.provider.is_some() || self.relation.get().is_some()
    }

    /// The materialized metadata collection, loading it on first use.
    pub fn metadata_rows(&self) -> Result<&[MetadataRow]> {
        if let Some(rows) = self.relation.get() {
            return Ok(rows);
        }
        let Some(provider) = &self.provider else {
            return Ok(&[]);
        };

        let rows = provider.load_metadata_rows()?;
        debug!(
            host = %self.id,
            relation = %self.schema.metadata_relation,
            count = rows.len(),
            "loaded metadata relation"
        );
        Ok(self.relation.get_or_init(|| rows))
    }

    /// First row whose key column loosely equals `key`.
    pub fn get_metadata_object(&self, key: &str) -> Result<Option<&MetadataRow>> {
        Ok(self.metadata_rows()?.iter().find(|row| row.key_matches(key)))
    }

    /// Value of the metadata row for `key`, or `None` if there is no such row.
    pub fn get_metadata(&self, key: &str) -> Result<Option<MetaValue>> {
        let Some(row) = self.get_metadata_object(key)? else {
            return Ok(None);
        };

        if let Some(value) = row.call_accessor(key) {
            return value.map(Some);
        }
        row.value().map(Some)
    }

    /// Read from the host record only: registered accessor, then stored field.
    pub fn base_attribute(&self, key: &str) -> Option<MetaValue> {
        if let Some(accessor) = self.schema.accessors.get(key) {
            return accessor(&self.record);
        }
        self.record.get(key).cloned()
    }

    /// Read an attribute, falling back to metadata rows.
    ///
    /// Never falls back for the relationship's own name or for a key that is
    /// stored on the record, even when its stored value is empty.
    pub fn get_attribute(&self, key: &str) -> Result<Option<MetaValue>> {
        let value = self.base_attribute(key);

        let missing = match self.schema.fallback {
            FallbackPolicy::WhenEmpty => value.as_ref().map_or(true, MetaValue::is_empty),
            FallbackPolicy::WhenAbsent => value.is_none(),
        };

        if missing
            && self.has_metadata()
            && key != self.schema.metadata_relation
            && !self.record.contains(key)
        {
            trace!(host = %self.id, key, "attribute falls back to metadata");
            return self.get_metadata(key);
        }

        Ok(value)
    }

    /// Every metadata key with its coerced value. Duplicate keys keep the
    /// first row, matching lookup order.
    pub fn metadata_map(&self) -> Result<BTreeMap<String, MetaValue>> {
        let mut map = BTreeMap::new();
        for row in self.metadata_rows()? {
            let Some(key) = row.key().and_then(MetaValue::to_text) else {
                continue;
            };
            if !map.contains_key(&key) {
                map.insert(key, row.value()?);
            }
        }
        Ok(map)
    }

    /// Set a metadata value in memory, updating the row for `key` or adding a
    /// new one owned by this host. Nothing is persisted until
    /// [`save_metadata`](Self::save_metadata).
    pub fn set_metadata(
        &mut self,
        key: &str,
        value: impl Into<MetaValue>,
        cast: &CastType,
    ) -> Result<()> {
        self.metadata_rows()?;
        let mut rows = self.relation.take().unwrap_or_default();

        match rows.iter_mut().find(|row| row.key_matches(key)) {
            Some(row) => {
                row.set_type(cast);
                row.set_value(value);
            }
            None => {
                let schema = Arc::clone(&self.schema.row_schema);
                let mut row = MetadataRow::build(schema, key, value, cast);
                row.set_owner(self.id);
                rows.push(row);
            }
        }
        self.relation = OnceCell::from(rows);
        Ok(())
    }

    /// Persist every loaded metadata row.
    pub fn save_metadata<B: RowBackend>(&mut self, store: &MetadataStore<B>) -> Result<()> {
        let owner = self.id;
        let Some(rows) = self.relation.get_mut() else {
            return Ok(());
        };
        for row in rows.iter_mut() {
            if row.owner_id().is_none() {
                row.set_owner(owner);
            }
            store.save_row(row)?;
        }
        Ok(())
    }
}
