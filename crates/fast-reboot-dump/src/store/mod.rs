//! State store access for ASIC_DB and APPL_DB
//!
//! [`StateStore`] is the narrow read-only contract the snapshot builders rely
//! on: pattern enumeration, cursor scanning and (pipelined) field-map reads.
//! [`RedisStore`] talks to the SONiC redis instance; [`MemoryStore`] holds the
//! same data in-process.

mod memory;
mod redis_store;

pub use self::memory::{MemoryConnector, MemoryStore};
pub use self::redis_store::{RedisConnector, RedisStore};

use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::debug;

/// Field/value pairs of one hash key, ordered by field name
pub type FieldMap = BTreeMap<String, String>;

/// Logical database a store connection is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// APPL_DB - application state (NEIGH_TABLE, ROUTE_TABLE)
    ApplDb,
    /// ASIC_DB - hardware state (SAI objects)
    AsicDb,
}

impl Namespace {
    pub fn name(&self) -> &'static str {
        match self {
            Namespace::ApplDb => "APPL_DB",
            Namespace::AsicDb => "ASIC_DB",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only key/value store bound to one namespace
#[async_trait]
pub trait StateStore: Send {
    /// Namespace this connection reads from
    fn namespace(&self) -> Namespace;

    /// All keys matching a glob pattern (`KEYS`)
    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>>;

    /// One page of a cursor scan (`SCAN cursor MATCH pattern COUNT count`).
    ///
    /// Returns the next cursor, which is 0 once the scan is complete.
    async fn scan_page(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>)>;

    /// All fields of one key (`HGETALL`); empty when the key is gone
    async fn get_all(&mut self, key: &str) -> Result<FieldMap>;

    /// Field maps for many keys in one pipelined round trip, in key order
    async fn get_all_batch(&mut self, keys: &[String]) -> Result<Vec<FieldMap>>;

    /// Whether a key exists (`EXISTS`)
    async fn exists(&mut self, key: &str) -> Result<bool>;
}

/// Opens store connections, one per namespace and phase
#[async_trait]
pub trait Connector: Send + Sync {
    type Store: StateStore;

    /// Makes a single connection attempt to `namespace`
    async fn connect(&self, namespace: Namespace) -> Result<Self::Store>;
}

/// Scans every key matching `pattern`, following the cursor until the store
/// reports completion.
///
/// A scan may return the same key on more than one page; each key appears
/// once in the result. The result is sorted so repeated runs over the same
/// data enumerate in the same order.
pub async fn scan_all<S>(store: &mut S, pattern: &str, count: usize) -> Result<Vec<String>>
where
    S: StateStore + ?Sized,
{
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut cursor = 0;
    let mut pages = 0usize;

    loop {
        let (next, page) = store.scan_page(cursor, pattern, count).await?;
        pages += 1;
        for key in page {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        if next == 0 {
            break;
        }
        cursor = next;
    }

    keys.sort();
    debug!(
        db = %store.namespace(),
        pattern,
        pages,
        count = keys.len(),
        "Scan complete"
    );
    Ok(keys)
}

/// Enumerates `pattern` with `KEYS` and fetches every match in one pipeline.
///
/// Pairs are returned sorted by key.
pub async fn load_objects<S>(store: &mut S, pattern: &str) -> Result<Vec<(String, FieldMap)>>
where
    S: StateStore + ?Sized,
{
    let mut keys = store.keys(pattern).await?;
    keys.sort();
    let values = store.get_all_batch(&keys).await?;

    debug!(db = %store.namespace(), pattern, count = keys.len(), "Loaded objects");
    Ok(keys.into_iter().zip(values).collect())
}
