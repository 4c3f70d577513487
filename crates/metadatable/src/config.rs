//! # Configuration
//!
//! Column names, the relationship name and the fallback policy are managed
//! by [`confique`], which layers a TOML file, environment variables and
//! compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `METADATABLE_KEY_COLUMN`, `METADATABLE_CASTABLE`, etc.
//! 2. **Config file**: the TOML file passed to [`MetadataConfig::load`].
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `key_column` | `key` | Column holding the metadata key |
//! | `value_column` | `value` | Column holding the serialized value |
//! | `type_column` | `type` | Column holding the type tag |
//! | `castable` | `true` | Coerce the value column on read |
//! | `metadata_relation` | `metadata` | Name of the host's metadata relationship |
//! | `fallback` | `when_empty` | `when_empty` or `when_absent` |

use crate::error::Result;
use crate::host::{FallbackPolicy, HostSchema};
use crate::row::RowSchema;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    #[config(default = "key", env = "METADATABLE_KEY_COLUMN")]
    pub key_column: String,

    #[config(default = "value", env = "METADATABLE_VALUE_COLUMN")]
    pub value_column: String,

    #[config(default = "type", env = "METADATABLE_TYPE_COLUMN")]
    pub type_column: String,

    /// When false, the value column is returned as stored text.
    #[config(default = true, env = "METADATABLE_CASTABLE")]
    pub castable: bool,

    #[config(default = "metadata", env = "METADATABLE_RELATION")]
    pub metadata_relation: String,

    /// When absent, defaults to `when_empty`.
    pub fallback: Option<FallbackPolicy>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            key_column: "key".to_string(),
            value_column: "value".to_string(),
            type_column: "type".to_string(),
            castable: true,
            metadata_relation: "metadata".to_string(),
            fallback: None,
        }
    }
}

impl MetadataConfig {
    /// Load from environment and `path`. A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }

    /// Get the fallback policy, using the default if not configured.
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback.unwrap_or_default()
    }

    pub fn row_schema(&self) -> RowSchema {
        RowSchema::new()
            .with_key_column(&self.key_column)
            .with_value_column(&self.value_column)
            .with_type_column(&self.type_column)
            .castable(self.castable)
    }

    /// Host schema whose new rows use [`row_schema`](Self::row_schema).
    pub fn host_schema(&self) -> HostSchema {
        HostSchema::new()
            .with_relation(&self.metadata_relation)
            .with_fallback(self.fallback())
            .with_row_schema(Arc::new(self.row_schema()))
    }
}
