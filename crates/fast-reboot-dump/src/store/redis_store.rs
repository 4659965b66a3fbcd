//! Redis-backed store for the SONiC databases

use super::{Connector, FieldMap, Namespace, StateStore};
use crate::config::DatabaseConfig;
use crate::error::{DumpError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, instrument};

/// Read-only connection to one SONiC redis database.
///
/// Built on a plain multiplexed connection: a dropped connection is not
/// re-established, so every command is attempted exactly once.
pub struct RedisStore {
    namespace: Namespace,
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to the database backing `namespace`, making a single attempt
    /// bounded by the configured connect timeout.
    #[instrument(skip(config), fields(host = %config.redis_host, port = config.redis_port))]
    pub async fn connect(config: &DatabaseConfig, namespace: Namespace) -> Result<Self> {
        let url = config.url(namespace);
        debug!(db = %namespace, url, "Connecting to redis");

        let client = Client::open(url)?;
        let secs = config.connect_timeout_secs;
        let conn = tokio::time::timeout(
            Duration::from_secs(secs),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| DumpError::ConnectTimeout {
            db: namespace.name(),
            secs,
        })??;

        debug!(db = %namespace, "Connected");
        Ok(Self { namespace, conn })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[async_trait]
impl StateStore for RedisStore {
    fn namespace(&self) -> Namespace {
        self.namespace
    }

    async fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        let keys: Vec<String> = self.conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn scan_page(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>)> {
        let page: (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut self.conn)
            .await?;
        Ok(page)
    }

    async fn get_all(&mut self, key: &str) -> Result<FieldMap> {
        let fields: FieldMap = self.conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn get_all_batch(&mut self, keys: &[String]) -> Result<Vec<FieldMap>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hgetall(key);
        }

        let values: Vec<FieldMap> = pipe.query_async(&mut self.conn).await?;
        debug!(db = %self.namespace, count = keys.len(), "Pipelined HGETALL");
        Ok(values)
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        let found: bool = self.conn.exists(key).await?;
        Ok(found)
    }
}

/// [`Connector`] opening [`RedisStore`] connections from the database config
#[derive(Debug, Clone)]
pub struct RedisConnector {
    config: DatabaseConfig,
}

impl RedisConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for RedisConnector {
    type Store = RedisStore;

    async fn connect(&self, namespace: Namespace) -> Result<RedisStore> {
        RedisStore::connect(&self.config, namespace).await
    }
}
