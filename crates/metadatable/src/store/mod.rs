//! # Storage Layer
//!
//! Metadata rows are persisted through a [`RowBackend`], which only knows how
//! to move [`StoredRow`]s in and out of storage. [`MetadataStore`] sits on top
//! and owns the row lifecycle:
//!
//! 1. **Pre-save**: every save runs the row's value serialization hook first.
//! 2. **Write**: the serialized row is flattened to text columns and written.
//! 3. **Sync**: the row's original attributes are refreshed, so reads coerce
//!    with the type that was just stored.
//!
//! ## Persisted Layout
//!
//! ```text
//! id        uuid   row identity
//! owner_id  uuid   host the row belongs to
//! <key>     text   metadata key       (column name per RowSchema)
//! <type>    text   type tag
//! <value>   text   serialized value
//! ```
//!
//! ## Implementations
//!
//! - [`mem_backend::MemBackend`]: in-memory rows, used as the reference
//!   provider and in tests.
//!
//! Hosts consume a store through [`OwnedRows`], a [`MetadataProvider`]
//! scoped to one owner.
//!
//! [`MetadataProvider`]: crate::host::MetadataProvider

pub mod backend;
pub mod mem_backend;
pub mod memory;
pub mod metadata_store;

pub use backend::{RowBackend, StoredRow};
pub use memory::InMemoryMetadataStore;
pub use metadata_store::{MetadataStore, OwnedRows};
