//! Typed metadata rows.
//!
//! A [`MetadataRow`] wraps a plain [`Record`] holding a key column, a type
//! column and a text value column. Reading the value column coerces the
//! text to the declared type; [`MetadataRow::cast_value_column_attribute`]
//! is the pre-save hook that turns whatever is in memory back into text.
//!
//! Column names and read accessors live in a [`RowSchema`], shared by every
//! row of the same kind.

use crate::cast::{coerce, serialize, CastType};
use crate::error::Result;
use crate::record::Record;
use crate::value::MetaValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Custom read handler for a single attribute name.
///
/// Registered handlers take precedence over value coercion for their key.
pub type Accessor = fn(&Record) -> Result<MetaValue>;

/// Column layout and read accessors for a kind of metadata row.
#[derive(Debug, Clone)]
pub struct RowSchema {
    key_column: String,
    value_column: String,
    type_column: String,
    castable: bool,
    accessors: HashMap<String, Accessor>,
}

impl Default for RowSchema {
    fn default() -> Self {
        Self {
            key_column: "key".to_string(),
            value_column: "value".to_string(),
            type_column: "type".to_string(),
            castable: true,
            accessors: HashMap::new(),
        }
    }
}

impl RowSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_column(mut self, name: impl Into<String>) -> Self {
        self.key_column = name.into();
        self
    }

    pub fn with_value_column(mut self, name: impl Into<String>) -> Self {
        self.value_column = name.into();
        self
    }

    pub fn with_type_column(mut self, name: impl Into<String>) -> Self {
        self.type_column = name.into();
        self
    }

    pub fn castable(mut self, castable: bool) -> Self {
        self.castable = castable;
        self
    }

    /// Register a read accessor for `key`.
    pub fn with_accessor(mut self, key: impl Into<String>, accessor: Accessor) -> Self {
        self.accessors.insert(key.into(), accessor);
        self
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn type_column(&self) -> &str {
        &self.type_column
    }

    pub fn is_castable(&self) -> bool {
        self.castable
    }

    pub fn accessor(&self, key: &str) -> Option<Accessor> {
        self.accessors.get(key).copied()
    }

    pub fn has_accessor(&self, key: &str) -> bool {
        self.accessors.contains_key(key)
    }

    pub fn into_shared(self) -> Arc<RowSchema> {
        Arc::new(self)
    }
}

/// One key/type/value metadata record.
#[derive(Debug, Clone)]
pub struct MetadataRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    record: Record,
    schema: Arc<RowSchema>,
    /// The value column holds text written by the pre-save hook.
    staged: bool,
}

impl MetadataRow {
    /// An empty, never persisted row.
    pub fn new(schema: Arc<RowSchema>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: None,
            record: Record::new(),
            schema,
            staged: false,
        }
    }

    /// A new row with its key, type and value columns filled in.
    pub fn build(
        schema: Arc<RowSchema>,
        key: &str,
        value: impl Into<MetaValue>,
        cast: &CastType,
    ) -> Self {
        let mut row = Self::new(schema);
        row.set_key(key);
        row.set_type(cast);
        row.set_value(value);
        row
    }

    /// Wrap a record that came out of storage.
    pub fn from_record(
        id: Uuid,
        owner_id: Option<Uuid>,
        record: Record,
        schema: Arc<RowSchema>,
    ) -> Self {
        Self {
            id,
            owner_id,
            record,
            schema,
            staged: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn set_owner(&mut self, owner_id: Uuid) {
        self.owner_id = Some(owner_id);
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        self.staged = false;
        &mut self.record
    }

    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    pub fn key_column(&self) -> &str {
        self.schema.key_column()
    }

    pub fn value_column(&self) -> &str {
        self.schema.value_column()
    }

    pub fn type_column(&self) -> &str {
        self.schema.type_column()
    }

    pub fn is_castable(&self) -> bool {
        self.schema.is_castable()
    }

    /// Raw content of the key column.
    pub fn key(&self) -> Option<&MetaValue> {
        self.record.get(self.schema.key_column())
    }

    /// Loose comparison of the key column against `key`.
    pub fn key_matches(&self, key: &str) -> bool {
        self.key().is_some_and(|k| k.loosely_equals(key))
    }

    pub fn set_key(&mut self, key: &str) {
        let column = self.schema.key_column().to_string();
        self.record.set(column, key);
    }

    pub fn set_type(&mut self, cast: &CastType) {
        let column = self.schema.type_column().to_string();
        self.record.set(column, cast.tag());
        self.staged = false;
    }

    /// Put an in-memory value in the value column. It stays typed until the
    /// row is saved.
    pub fn set_value(&mut self, value: impl Into<MetaValue>) {
        let column = self.schema.value_column().to_string();
        self.record.set(column, value);
        self.staged = false;
    }

    /// The type stored text is coerced with: the persisted tag, or the
    /// current one for a row that was never persisted.
    pub fn cast_type(&self) -> CastType {
        let column = self.schema.type_column();
        let tag = if self.record.has_original() {
            self.record.get_original(column)
        } else {
            self.record.get(column)
        };
        CastType::from_tag(tag.and_then(MetaValue::to_text).as_deref())
    }

    /// The type the pre-save hook serializes with: always the current one.
    fn pending_cast_type(&self) -> CastType {
        let tag = self.record.get(self.schema.type_column());
        CastType::from_tag(tag.and_then(MetaValue::to_text).as_deref())
    }

    /// Read an attribute, coercing it when it is the value column.
    pub fn get_attribute_value(&self, key: &str) -> Result<MetaValue> {
        if self.is_castable() && !self.schema.has_accessor(key) && key == self.value_column() {
            return self.coerced_value();
        }

        if let Some(accessor) = self.schema.accessor(key) {
            return accessor(&self.record);
        }

        Ok(self.record.get(key).cloned().unwrap_or(MetaValue::Null))
    }

    /// Shorthand for reading the value column.
    pub fn value(&self) -> Result<MetaValue> {
        self.get_attribute_value(self.schema.value_column())
    }

    /// Run the registered accessor for `key`, if there is one.
    pub fn call_accessor(&self, key: &str) -> Option<Result<MetaValue>> {
        self.schema
            .accessor(key)
            .map(|accessor| accessor(&self.record))
    }

    /// True while the value or type column holds something set in memory
    /// that the pre-save hook has not turned into stored text yet.
    pub fn has_pending_value(&self) -> bool {
        if self.staged {
            return false;
        }
        !self.record.has_original()
            || self.record.is_dirty(self.schema.value_column())
            || self.record.is_dirty(self.schema.type_column())
    }

    fn coerced_value(&self) -> Result<MetaValue> {
        let value = self.record.get(self.schema.value_column());
        if self.has_pending_value() {
            // Read back what saving would store.
            let cast = self.pending_cast_type();
            let value = value.cloned().unwrap_or(MetaValue::Null);
            return match serialize(&cast, &value)? {
                Some(text) => Ok(coerce(&cast, &text)?),
                None => Ok(MetaValue::Null),
            };
        }

        let cast = if self.staged {
            self.pending_cast_type()
        } else {
            self.cast_type()
        };
        match value {
            None | Some(MetaValue::Null) => Ok(MetaValue::Null),
            Some(MetaValue::String(raw)) => Ok(coerce(&cast, raw)?),
            Some(typed) => Ok(typed.clone()),
        }
    }

    /// Pre-save hook: serialize the value column to its stored text form.
    ///
    /// Stored text that was neither changed nor re-typed is left alone.
    pub fn cast_value_column_attribute(&mut self) -> Result<()> {
        if !self.has_pending_value() {
            trace!(row = %self.id, "metadata value unchanged");
            return Ok(());
        }

        let cast = self.pending_cast_type();
        let column = self.schema.value_column().to_string();
        let value = self.record.get(&column).cloned().unwrap_or(MetaValue::Null);

        let stored = serialize(&cast, &value)?;
        trace!(row = %self.id, cast = %cast, "serialized metadata value");
        self.record.set(column, stored);
        self.staged = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::value::DATETIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn stored_row(key: &str, cast: &str, raw: &str) -> MetadataRow {
        let record = Record::from_stored([("key", key), ("type", cast), ("value", raw)]);
        MetadataRow::from_record(Uuid::new_v4(), None, record, RowSchema::default().into_shared())
    }

    fn shout(record: &Record) -> Result<MetaValue> {
        let text = record
            .get("value")
            .and_then(MetaValue::to_text)
            .unwrap_or_default();
        Ok(MetaValue::String(text.to_uppercase()))
    }

    #[test]
    fn default_schema_columns() {
        let schema = RowSchema::default();
        assert_eq!(schema.key_column(), "key");
        assert_eq!(schema.value_column(), "value");
        assert_eq!(schema.type_column(), "type");
        assert!(schema.is_castable());
    }

    #[test]
    fn integer_row_reads_as_integer() {
        let row = stored_row("age", "integer", "42");
        assert_eq!(row.value().unwrap(), MetaValue::Int(42));
    }

    #[test]
    fn json_row_reads_as_map() {
        let row = stored_row("prefs", "json", r#"{"a":1}"#);
        assert_eq!(row.value().unwrap(), MetaValue::Json(json!({"a": 1})));
    }

    #[test]
    fn datetime_row_reads_exact_moment() {
        let row = stored_row("seen", "datetime", "2024-01-02 03:04:05");
        let expected = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", DATETIME_FORMAT).unwrap();
        assert_eq!(row.value().unwrap(), MetaValue::DateTime(expected));
    }

    #[test]
    fn unknown_type_reads_raw_value() {
        let row = stored_row("odd", "weird", "as stored");
        assert_eq!(row.value().unwrap(), MetaValue::from("as stored"));
    }

    #[test]
    fn malformed_value_surfaces_error() {
        let row = stored_row("age", "int", "old");
        assert!(matches!(row.value(), Err(MetadataError::Coercion(_))));
    }

    #[test]
    fn other_columns_are_not_coerced() {
        let row = stored_row("42", "integer", "42");
        assert_eq!(row.get_attribute_value("key").unwrap(), MetaValue::from("42"));
        assert_eq!(row.get_attribute_value("missing").unwrap(), MetaValue::Null);
    }

    #[test]
    fn non_castable_rows_return_raw_text() {
        let schema = RowSchema::default().castable(false).into_shared();
        let record = Record::from_stored([("key", "age"), ("type", "int"), ("value", "42")]);
        let row = MetadataRow::from_record(Uuid::new_v4(), None, record, schema);
        assert_eq!(row.value().unwrap(), MetaValue::from("42"));
    }

    #[test]
    fn accessor_overrides_coercion() {
        let schema = RowSchema::default().with_accessor("value", shout).into_shared();
        let record = Record::from_stored([("key", "name"), ("type", "string"), ("value", "mo")]);
        let row = MetadataRow::from_record(Uuid::new_v4(), None, record, schema);
        assert_eq!(row.value().unwrap(), MetaValue::from("MO"));
        assert!(row.call_accessor("value").is_some());
        assert!(row.call_accessor("other").is_none());
    }

    #[test]
    fn custom_columns_are_respected() {
        let schema = RowSchema::default()
            .with_key_column("name")
            .with_value_column("payload")
            .with_type_column("kind")
            .into_shared();
        let record = Record::from_stored([("name", "limit"), ("kind", "float"), ("payload", "0.5")]);
        let row = MetadataRow::from_record(Uuid::new_v4(), None, record, schema);
        assert!(row.key_matches("limit"));
        assert_eq!(row.get_attribute_value("payload").unwrap(), MetaValue::Float(0.5));
        assert_eq!(row.get_attribute_value("value").unwrap(), MetaValue::Null);
    }

    #[test]
    fn unsaved_row_returns_in_memory_value() {
        let row = MetadataRow::build(
            RowSchema::default().into_shared(),
            "tags",
            json!(["a", "b"]),
            &CastType::Json,
        );
        assert_eq!(row.value().unwrap(), MetaValue::Json(json!(["a", "b"])));
    }

    #[test]
    fn pre_save_serializes_containers() {
        let mut row = MetadataRow::build(
            RowSchema::default().into_shared(),
            "prefs",
            json!({"dark": true}),
            &CastType::Json,
        );
        row.cast_value_column_attribute().unwrap();
        assert_eq!(
            row.record().get("value"),
            Some(&MetaValue::from(r#"{"dark":true}"#))
        );
        assert_eq!(row.value().unwrap(), MetaValue::Json(json!({"dark": true})));
    }

    #[test]
    fn pre_save_stores_formatted_datetime() {
        let moment = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", DATETIME_FORMAT).unwrap();
        let mut row = MetadataRow::build(
            RowSchema::default().into_shared(),
            "seen",
            moment,
            &CastType::DateTime,
        );
        row.cast_value_column_attribute().unwrap();
        assert_eq!(
            row.record().get("value"),
            Some(&MetaValue::from("2024-01-02 03:04:05"))
        );
    }

    #[test]
    fn pre_save_defaults_to_string_type() {
        let mut row = MetadataRow::new(RowSchema::default().into_shared());
        row.set_key("count");
        row.set_value(7i64);
        row.cast_value_column_attribute().unwrap();
        assert_eq!(row.record().get("value"), Some(&MetaValue::from("7")));
        assert_eq!(row.cast_type(), CastType::String);
    }

    #[test]
    fn pre_save_rejects_uncastable_datetime() {
        let mut row = MetadataRow::build(
            RowSchema::default().into_shared(),
            "seen",
            "not a date",
            &CastType::DateTime,
        );
        assert!(matches!(
            row.cast_value_column_attribute(),
            Err(MetadataError::Serialization(_))
        ));
    }

    #[test]
    fn type_change_reads_the_same_before_and_after_saving() {
        let mut row = stored_row("limit", "string", "10");
        row.set_type(&CastType::Int);
        assert_eq!(row.value().unwrap(), MetaValue::Int(10));

        row.cast_value_column_attribute().unwrap();
        assert_eq!(row.value().unwrap(), MetaValue::Int(10));
        row.record_mut().sync_original();
        assert_eq!(row.value().unwrap(), MetaValue::Int(10));
    }

    #[test]
    fn text_set_under_json_reads_as_json_string() {
        let mut row = MetadataRow::build(
            RowSchema::default().into_shared(),
            "greeting",
            "hello",
            &CastType::Json,
        );
        assert_eq!(row.value().unwrap(), MetaValue::Json(json!("hello")));

        row.cast_value_column_attribute().unwrap();
        assert_eq!(row.record().get("value"), Some(&MetaValue::from(r#""hello""#)));
        row.record_mut().sync_original();
        assert_eq!(row.value().unwrap(), MetaValue::Json(json!("hello")));
    }

    #[test]
    fn numeric_looking_text_under_json_stays_a_string() {
        for text in ["123", "true"] {
            let mut row = MetadataRow::build(
                RowSchema::default().into_shared(),
                "code",
                text,
                &CastType::Json,
            );
            row.cast_value_column_attribute().unwrap();
            row.record_mut().sync_original();
            assert_eq!(row.value().unwrap(), MetaValue::Json(json!(text)));
        }
    }

    #[test]
    fn retyped_text_on_integer_row_is_read_as_set() {
        let mut row = stored_row("age", "integer", "42");
        row.set_type(&CastType::String);
        row.set_value("unknown");
        assert_eq!(row.value().unwrap(), MetaValue::from("unknown"));

        row.cast_value_column_attribute().unwrap();
        row.record_mut().sync_original();
        assert_eq!(row.value().unwrap(), MetaValue::from("unknown"));
    }

    #[test]
    fn unchanged_stored_text_is_not_reencoded() {
        let mut row = stored_row("prefs", "json", r#"{"a":1}"#);
        assert!(!row.has_pending_value());
        row.cast_value_column_attribute().unwrap();
        assert_eq!(row.record().get("value"), Some(&MetaValue::from(r#"{"a":1}"#)));
        assert_eq!(row.value().unwrap(), MetaValue::Json(json!({"a": 1})));
    }
}
