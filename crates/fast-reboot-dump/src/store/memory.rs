//! In-process store with redis key/pattern semantics

use super::{Connector, FieldMap, Namespace, StateStore};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;

/// In-memory [`StateStore`] holding hash keys for one namespace.
///
/// Public so `tests/` can drive [`crate::pipeline::run`] without a redis
/// server through [`MemoryConnector`]. Glob patterns support `*`, `?` and
/// `\` escapes. Every trait call counts as one round trip, which lets callers
/// check that bulk reads stay batched.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    namespace: Namespace,
    data: BTreeMap<String, FieldMap>,
    scan_overlap: usize,
    round_trips: usize,
}

impl MemoryStore {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            data: BTreeMap::new(),
            scan_overlap: 0,
            round_trips: 0,
        }
    }

    /// Re-return the last `overlap` keys of the previous page at the start of
    /// every scan page, the way redis may during a rehash.
    pub fn with_scan_overlap(mut self, overlap: usize) -> Self {
        self.scan_overlap = overlap;
        self
    }

    /// Adds or replaces a hash key
    pub fn insert<K, F, V>(&mut self, key: K, fields: impl IntoIterator<Item = (F, V)>)
    where
        K: Into<String>,
        F: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(f, v)| (f.into(), v.into()))
            .collect();
        self.data.insert(key.into(), fields);
    }

    /// Removes a key, returning whether it existed
    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of store calls served so far
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    fn matching(&self, pattern: &str) -> Vec<String> {
        let Some(re) = glob_to_regex(pattern) else {
            return Vec::new();
        };
        self.data
            .keys()
            .filter(|key| re.is_match(key))
            .cloned()
            .collect()
    }
}

fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    expr.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

#[async_trait]
impl StateStore for MemoryStore {
    fn namespace(&self) -> Namespace {
        self.namespace
    }

    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        self.round_trips += 1;
        Ok(self.matching(pattern))
    }

    async fn scan_page(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>)> {
        self.round_trips += 1;
        let keys = self.matching(pattern);
        let cursor = cursor as usize;

        let start = cursor.saturating_sub(self.scan_overlap).min(keys.len());
        let end = (cursor + count.max(1)).min(keys.len());
        let next = if end >= keys.len() { 0 } else { end as u64 };

        Ok((next, keys[start..end].to_vec()))
    }

    async fn get_all(&mut self, key: &str) -> Result<FieldMap> {
        self.round_trips += 1;
        Ok(self.data.get(key).cloned().unwrap_or_default())
    }

    async fn get_all_batch(&mut self, keys: &[String]) -> Result<Vec<FieldMap>> {
        self.round_trips += 1;
        Ok(keys
            .iter()
            .map(|key| self.data.get(key).cloned().unwrap_or_default())
            .collect())
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        self.round_trips += 1;
        Ok(self.data.contains_key(key))
    }
}

/// [`Connector`] handing out copies of two pre-populated stores
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    asic_db: MemoryStore,
    appl_db: MemoryStore,
    unreachable: Option<Namespace>,
}

impl MemoryConnector {
    pub fn new(asic_db: MemoryStore, appl_db: MemoryStore) -> Self {
        Self {
            asic_db,
            appl_db,
            unreachable: None,
        }
    }

    /// Make connection attempts to `namespace` fail
    pub fn with_unreachable(mut self, namespace: Namespace) -> Self {
        self.unreachable = Some(namespace);
        self
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Store = MemoryStore;

    async fn connect(&self, namespace: Namespace) -> Result<MemoryStore> {
        if self.unreachable == Some(namespace) {
            return Err(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Connection refused",
            ))
            .into());
        }
        Ok(match namespace {
            Namespace::AsicDb => self.asic_db.clone(),
            Namespace::ApplDb => self.appl_db.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_glob_matching() {
        let re = glob_to_regex("ASIC_STATE:SAI_OBJECT_TYPE_VLAN:oid:*").unwrap();
        assert!(re.is_match("ASIC_STATE:SAI_OBJECT_TYPE_VLAN:oid:0x26000000000001"));
        assert!(!re.is_match("ASIC_STATE:SAI_OBJECT_TYPE_VLAN_MEMBER:oid:0x1"));

        let re = glob_to_regex("ROUTE_TABLE:0.0.0.0/0").unwrap();
        assert!(re.is_match("ROUTE_TABLE:0.0.0.0/0"));
        assert!(!re.is_match("ROUTE_TABLE:010.0.0/0"));

        let re = glob_to_regex("NEIGH_TABLE:Vlan?:*").unwrap();
        assert!(re.is_match("NEIGH_TABLE:Vlan2:10.0.0.1"));
        assert!(!re.is_match("NEIGH_TABLE:Vlan20:10.0.0.1"));

        let re = glob_to_regex(r"KEY:\*").unwrap();
        assert!(re.is_match("KEY:*"));
        assert!(!re.is_match("KEY:1"));
    }

    #[tokio::test]
    async fn test_memory_store_reads() {
        let mut store = MemoryStore::new(Namespace::ApplDb);
        store.insert("ROUTE_TABLE:0.0.0.0/0", [("nexthop", "10.0.0.1")]);

        assert!(store.exists("ROUTE_TABLE:0.0.0.0/0").await.unwrap());
        assert!(!store.exists("ROUTE_TABLE:::/0").await.unwrap());

        let fields = store.get_all("ROUTE_TABLE:0.0.0.0/0").await.unwrap();
        assert_eq!(fields.get("nexthop").map(String::as_str), Some("10.0.0.1"));
        assert!(store.get_all("missing").await.unwrap().is_empty());
        assert_eq!(store.round_trips(), 4);
    }

    #[tokio::test]
    async fn test_connector_unreachable() {
        let connector = MemoryConnector::new(
            MemoryStore::new(Namespace::AsicDb),
            MemoryStore::new(Namespace::ApplDb),
        )
        .with_unreachable(Namespace::ApplDb);

        assert!(connector.connect(Namespace::AsicDb).await.is_ok());
        assert!(connector.connect(Namespace::ApplDb).await.is_err());
    }
}
