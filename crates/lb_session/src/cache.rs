//! Ordered in-memory cache of decrypted records.
//!
//! Order follows the remote store's listing order, with records added during
//! the session appended at the end. Ids are unique.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::record::{CredentialData, DecryptedRecord};

#[derive(Debug, Default)]
pub struct DecryptedCache {
    entries: Vec<DecryptedRecord>,
}

impl DecryptedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache with a freshly decrypted listing.
    /// A duplicated id keeps its first occurrence.
    pub fn replace_all(&mut self, records: Vec<DecryptedRecord>) {
        let mut seen = BTreeSet::new();
        self.entries = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    warn!(record_id = %record.id, "duplicate record id in listing; keeping first");
                }
                fresh
            })
            .collect();
    }

    /// Append a record. If the id is already cached the entry is replaced in place.
    pub fn append(&mut self, record: DecryptedRecord) {
        match self.entries.iter_mut().find(|e| e.id == record.id) {
            Some(existing) => *existing = record,
            None => self.entries.push(record),
        }
    }

    /// Overwrite the fields of the entry with `id`, keeping its position and
    /// `created_at`. Returns false if no entry matched.
    pub fn replace_fields(
        &mut self,
        id: &str,
        data: CredentialData,
        tags: BTreeSet<String>,
        updated_at: DateTime<Utc>,
    ) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.data = data;
                entry.tags = tags;
                entry.updated_at = updated_at.max(entry.created_at);
                true
            }
            None => false,
        }
    }

    /// Remove the entry with `id`. Returns false if it was not cached.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&DecryptedRecord> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecryptedRecord> {
        self.entries.iter()
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DecryptedRecord> {
        self.entries.iter().filter(move |e| e.tags.contains(tag))
    }

    /// Owned copy of the entries, in order.
    pub fn snapshot(&self) -> Vec<DecryptedRecord> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, title: &str) -> DecryptedRecord {
        let now = Utc::now();
        DecryptedRecord {
            id: id.to_string(),
            data: CredentialData::new(title, "user", "pw"),
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(cache: &DecryptedCache) -> Vec<String> {
        cache.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn replace_all_keeps_order_and_drops_duplicates() {
        let mut cache = DecryptedCache::new();
        cache.replace_all(vec![
            record("b", "first b"),
            record("a", "a"),
            record("b", "second b"),
        ]);
        assert_eq!(ids(&cache), vec!["b", "a"]);
        assert_eq!(cache.get("b").unwrap().data.title, "first b");
    }

    #[test]
    fn replace_fields_keeps_position_and_created_at() {
        let mut cache = DecryptedCache::new();
        cache.replace_all(vec![record("a", "a"), record("b", "b"), record("c", "c")]);
        let created_at = cache.get("b").unwrap().created_at;
        let later = created_at + Duration::minutes(5);

        let tags = BTreeSet::from(["work".to_string()]);
        assert!(cache.replace_fields("b", CredentialData::new("B2", "u2", "p2"), tags.clone(), later));

        assert_eq!(ids(&cache), vec!["a", "b", "c"]);
        let b = cache.get("b").unwrap();
        assert_eq!(b.data.title, "B2");
        assert_eq!(b.tags, tags);
        assert_eq!(b.created_at, created_at);
        assert_eq!(b.updated_at, later);
        assert_eq!(cache.get("a").unwrap().data.title, "a");
    }

    #[test]
    fn replace_fields_on_unknown_id_is_a_no_op() {
        let mut cache = DecryptedCache::new();
        cache.replace_all(vec![record("a", "a")]);
        assert!(!cache.replace_fields(
            "zzz",
            CredentialData::new("x", "y", "z"),
            BTreeSet::new(),
            Utc::now()
        ));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().data.title, "a");
    }

    #[test]
    fn remove_only_touches_matching_id() {
        let mut cache = DecryptedCache::new();
        cache.replace_all(vec![record("a", "a"), record("b", "b")]);
        assert!(!cache.remove("missing"));
        assert!(cache.remove("a"));
        assert_eq!(ids(&cache), vec!["b"]);
    }

    #[test]
    fn append_never_duplicates_an_id() {
        let mut cache = DecryptedCache::new();
        cache.append(record("a", "a"));
        cache.append(record("b", "b"));
        cache.append(record("a", "a again"));
        assert_eq!(ids(&cache), vec!["a", "b"]);
        assert_eq!(cache.get("a").unwrap().data.title, "a again");
    }

    #[test]
    fn with_tag_filters() {
        let mut cache = DecryptedCache::new();
        let mut tagged = record("a", "a");
        tagged.tags.insert("bank".to_string());
        cache.replace_all(vec![tagged, record("b", "b")]);
        let hits: Vec<_> = cache.with_tag("bank").map(|r| r.id.as_str()).collect();
        assert_eq!(hits, vec!["a"]);
    }
}
