use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A company returned by the lead API.
///
/// Records are produced by the backend and never modified on the client.
/// `validated` is `true` when the contact data passed server-side checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub validated: bool,
}

/// Ordered set of [`CompanyRecord`]s keyed by id.
///
/// Display order is the order records were first seen; a later record with an
/// id already present is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyCollection {
    records: Vec<CompanyRecord>,
    index: HashMap<String, usize>,
}

impl CompanyCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` unless its id is already present.
    ///
    /// Returns `true` when the record was inserted.
    pub fn insert(&mut self, record: CompanyRecord) -> bool {
        if self.index.contains_key(&record.id) {
            return false;
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CompanyRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompanyRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CompanyRecord] {
        &self.records
    }

    /// Number of records whose contact data passed validation.
    #[must_use]
    pub fn validated_count(&self) -> usize {
        self.records.iter().filter(|r| r.validated).count()
    }
}

impl FromIterator<CompanyRecord> for CompanyCollection {
    fn from_iter<I: IntoIterator<Item = CompanyRecord>>(iter: I) -> Self {
        let mut collection = Self::new();
        for record in iter {
            collection.insert(record);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a CompanyCollection {
    type Item = &'a CompanyRecord;
    type IntoIter = std::slice::Iter<'a, CompanyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for CompanyCollection {
    type Item = CompanyRecord;
    type IntoIter = std::vec::IntoIter<CompanyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
