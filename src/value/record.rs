//! Record containers
//!
//! Insertion-ordered records, record sets, and the payload union stored in
//! a cache entry.

use crate::value::TypedValue;

// == Record ==
/// An insertion-ordered mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, TypedValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a field, replacing the value in place if the name exists.
    ///
    /// Returns the previous value for that name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<TypedValue>,
    ) -> Option<TypedValue> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<TypedValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

// == Record Set ==
/// An ordered sequence of records, normally sharing one schema.
///
/// Heterogeneous records are allowed since every value carries its own tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names of the first record, empty for an empty set.
    pub fn columns(&self) -> Vec<&str> {
        self.records
            .first()
            .map(|record| record.names().collect())
            .unwrap_or_default()
    }

    /// True when every record has the same field names in the same order.
    pub fn is_uniform(&self) -> bool {
        let Some(first) = self.records.first() else {
            return true;
        };
        self.records[1..]
            .iter()
            .all(|record| record.names().eq(first.names()))
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

// == Payload ==
/// What a cache entry holds: one record or a record set.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(Record),
    Records(RecordSet),
}

impl From<Record> for Payload {
    fn from(record: Record) -> Self {
        Payload::Record(record)
    }
}

impl From<RecordSet> for Payload {
    fn from(records: RecordSet) -> Self {
        Payload::Records(records)
    }
}
