//! Records decoded from a result set.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::value::{FieldValue, Value};

/// Permanent row identifier assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a raw record identifier.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modification token used for optimistic concurrency.
///
/// The server advances it on every change; a mutation carrying a stale token
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModId(u64);

impl ModId {
    /// Wrap a raw modification token.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw token value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row returned by the server.
///
/// ## Invariants
/// - Field names are local: fields of related-set records have their
///   `table::` prefix removed.
/// - A record is never mutated after it has been built.
///
/// # Examples
/// ```
/// use fmclient::domain::{ModId, Record, RecordId, Value};
///
/// let record = Record::builder(RecordId::new(7), ModId::new(2))
///     .field("name", Value::from("Ada"))
///     .build();
/// assert_eq!(record.record_id(), RecordId::new(7));
/// assert_eq!(record.value("name").and_then(Value::as_text), Some("Ada"));
/// assert!(record.related_set("orders").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    record_id: RecordId,
    mod_id: ModId,
    fields: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    related_sets: BTreeMap<String, Vec<Record>>,
}

impl Record {
    /// Start building a record with the given identity.
    #[must_use]
    pub const fn builder(record_id: RecordId, mod_id: ModId) -> RecordBuilder {
        RecordBuilder {
            record: Self {
                record_id,
                mod_id,
                fields: BTreeMap::new(),
                related_sets: BTreeMap::new(),
            },
        }
    }

    /// Server record identifier.
    #[must_use]
    pub const fn record_id(&self) -> RecordId {
        self.record_id
    }

    /// Modification token at the time the record was read.
    #[must_use]
    pub const fn mod_id(&self) -> ModId {
        self.mod_id
    }

    /// Decoded value of a field, single or repeating.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Value of a non-repeating field.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(FieldValue::as_single)
    }

    /// Every decoded field keyed by local name.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Child records of a related set; empty when the set is absent.
    #[must_use]
    pub fn related_set(&self, table: &str) -> &[Record] {
        self.related_sets.get(table).map_or(&[], Vec::as_slice)
    }

    /// Every related set keyed by table name.
    #[must_use]
    pub const fn related_sets(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.related_sets
    }
}

/// Builder producing an immutable [`Record`].
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Set a field value; a later call for the same name replaces it.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.record.fields.insert(name.into(), value.into());
        self
    }

    /// Attach the child records of a related set.
    #[must_use]
    pub fn related_set(mut self, table: impl Into<String>, records: Vec<Record>) -> Self {
        self.record.related_sets.insert(table.into(), records);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn related_sets_hold_child_records() {
        let child = Record::builder(RecordId::new(10), ModId::new(1))
            .field("sku", Value::from("A-1"))
            .build();
        let parent = Record::builder(RecordId::new(1), ModId::new(4))
            .related_set("Orders", vec![child.clone()])
            .build();

        assert_eq!(parent.related_set("Orders"), &[child]);
        assert_eq!(parent.mod_id(), ModId::new(4));
    }

    #[test]
    fn repeated_fields_are_not_single_values() {
        let record = Record::builder(RecordId::new(1), ModId::new(1))
            .field("tags", vec![Value::from("a"), Value::from("b")])
            .build();

        assert!(record.value("tags").is_none());
        assert_eq!(
            record.field("tags").and_then(FieldValue::as_repeated).map(<[Value]>::len),
            Some(2)
        );
    }
}
