//! Plain attribute storage shared by rows and hosts.
//!
//! A [`Record`] is the untyped half of a model: a map of column name to
//! value, plus a snapshot of the values as they were last persisted.

use crate::value::MetaValue;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    attributes: BTreeMap<String, MetaValue>,
    original: BTreeMap<String, MetaValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record that looks freshly loaded: current and original agree.
    pub fn from_stored<K, V, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetaValue>,
    {
        let mut record = Self::default();
        for (key, value) in attributes {
            record.set(key, value);
        }
        record.sync_original();
        record
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        self.attributes.remove(key)
    }

    /// Whether the key is a stored field, regardless of its value.
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Value as of the last [`sync_original`](Self::sync_original).
    pub fn get_original(&self, key: &str) -> Option<&MetaValue> {
        self.original.get(key)
    }

    pub fn has_original(&self) -> bool {
        !self.original.is_empty()
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.attributes.get(key) != self.original.get(key)
    }

    /// Mark the current attributes as persisted.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, MetaValue> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_record_is_clean() {
        let record = Record::from_stored([("name", "Ada"), ("role", "admin")]);
        assert!(record.has_original());
        assert!(!record.is_dirty("name"));
        assert_eq!(record.get_original("role"), Some(&MetaValue::from("admin")));
    }

    #[test]
    fn set_marks_field_dirty_until_synced() {
        let mut record = Record::from_stored([("name", "Ada")]);
        record.set("name", "Grace");
        assert!(record.is_dirty("name"));
        assert_eq!(record.get_original("name"), Some(&MetaValue::from("Ada")));

        record.sync_original();
        assert!(!record.is_dirty("name"));
    }

    #[test]
    fn stored_falsy_value_still_counts_as_present() {
        let record = Record::from_stored([("score", MetaValue::Int(0))]);
        assert!(record.contains("score"));
        assert!(!record.contains("nickname"));
    }

    #[test]
    fn remove_drops_field() {
        let mut record = Record::new();
        record.set("a", 1i64);
        assert_eq!(record.remove("a"), Some(MetaValue::Int(1)));
        assert!(!record.contains("a"));
        assert_eq!(record.keys().count(), 0);
    }
}
