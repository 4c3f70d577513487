//! # Metadatable Architecture
//!
//! Metadatable adds a **key/type/value metadata table** to any record type.
//! One kind of record stores arbitrary typed attribute rows, and the record
//! that owns them reads those rows as if they were its own columns.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host Layer (host.rs)                                       │
//! │  - MetadataHost wraps a Record plus a metadata relationship │
//! │  - get_attribute falls back to metadata rows by key         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Row Layer (row.rs)                                         │
//! │  - MetadataRow wraps a Record with key/type/value columns   │
//! │  - Coerces on read, serializes in the pre-save hook         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Cast Table (cast.rs, value.rs)                             │
//! │  - Type tags, aliases, coercion and serialization           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - RowBackend trait, MetadataStore lifecycle                │
//! │  - MemBackend (in memory)                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Path
//!
//! `host.get_attribute(key)` → record miss → scan the metadata rows for
//! `row.key == key` → coerce the row's stored text to its declared type.
//!
//! ## Write Path
//!
//! `host.set_metadata(key, value, type)` keeps the typed value in memory,
//! where it already reads back as it will after saving;
//! `store.save_row(row)` serializes it to text, writes it, and marks the
//! row as persisted.
//!
//! ## Errors
//!
//! Unknown type tags are not errors: the stored text is returned as is.
//! Malformed payloads are, see [`error::CoercionError`].
//!
//! ## Module Overview
//!
//! - [`host`]: Metadata hosts, providers and fallback policy
//! - [`row`]: Metadata rows and their schema
//! - [`cast`]: Type tags, coercion and serialization
//! - [`value`]: Runtime values and collections
//! - [`record`]: Plain attribute storage
//! - [`store`]: Row persistence
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod cast;
pub mod config;
pub mod error;
pub mod host;
pub mod record;
pub mod row;
pub mod store;
pub mod value;

pub use cast::CastType;
pub use error::{CoercionError, MetadataError, Result, SerializationError};
pub use host::{FallbackPolicy, HostSchema, MetadataHost, MetadataProvider};
pub use record::Record;
pub use row::{MetadataRow, RowSchema};
pub use value::{Collection, MetaValue};
