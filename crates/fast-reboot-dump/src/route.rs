//! Default route snapshot

use crate::dump::DumpRecord;
use crate::error::Result;
use crate::store::{FieldMap, StateStore};
use crate::tables::{TableKey, IPV4_DEFAULT_PREFIX, IPV6_DEFAULT_PREFIX};
use tracing::{debug, info, instrument};

/// A default route and its ROUTE_TABLE attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub prefix: String,
    pub fields: FieldMap,
}

impl RouteEntry {
    pub fn key(&self) -> TableKey {
        TableKey::Route {
            prefix: self.prefix.clone(),
        }
    }

    pub fn to_record(&self) -> DumpRecord {
        DumpRecord::new(self.key().to_string(), self.fields.clone())
    }
}

/// Looks up the IPv4 and IPv6 default routes; absent routes are omitted.
#[instrument(skip_all, fields(db = %store.namespace()))]
pub async fn load_default_routes<S>(store: &mut S) -> Result<Vec<RouteEntry>>
where
    S: StateStore + ?Sized,
{
    let mut routes = Vec::with_capacity(2);

    for prefix in [IPV4_DEFAULT_PREFIX, IPV6_DEFAULT_PREFIX] {
        let key = TableKey::Route {
            prefix: prefix.to_string(),
        }
        .to_string();

        if !store.exists(&key).await? {
            debug!(key = %key, "No default route");
            continue;
        }
        let fields = store.get_all(&key).await?;
        routes.push(RouteEntry {
            prefix: prefix.to_string(),
            fields,
        });
    }

    info!(count = routes.len(), "Default routes read");
    Ok(routes)
}
