use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use once_cell::sync::Lazy;
use redis::Script;
use redis::aio::MultiplexedConnection;

use crate::error::StoreError;
use crate::schema::{NormalizedPosting, StoredPosting};

use super::{InsertOutcome, PostingStore};

/// Document write and index update in one server-side step.
///
/// KEYS[1] document key, KEYS[2] index key
/// ARGV[1] JSON, ARGV[2] score (ms), ARGV[3] dedup key
///
/// Returns 1 when written, 0 when the key was already taken.
const INSERT_LUA: &str = r"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    redis.call('ZADD', KEYS[2], ARGV[2], ARGV[3])
    return 1
end
return 0
";

static INSERT_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(INSERT_LUA));

/// Redis-backed posting store.
///
/// Layout (all keys under the configured prefix):
/// - `<prefix>:posting:<dedup_key>` -> StoredPosting as JSON
/// - `<prefix>:postings`            -> sorted set of dedup keys,
///                                     scored by created_at (ms)
///
/// Both keys are written by one Lua script: `SET NX` on the document
/// is the uniqueness guarantee for dedup keys, and the index entry
/// exists exactly when the document does.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisStore {
    /// Connect and verify the server answers.
    ///
    /// Any failure here is fatal for the process: without a store
    /// nothing can be persisted.
    pub async fn connect(url: &str, prefix: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("invalid redis url")?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .context("redis connection failed")?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("redis did not answer PING")?;

        info!("Connected to redis (prefix '{}')", prefix);

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    fn posting_key(&self, dedup_key: &str) -> String {
        format!("{}:posting:{}", self.prefix, dedup_key)
    }

    fn index_key(&self) -> String {
        format!("{}:postings", self.prefix)
    }
}

#[async_trait]
impl PostingStore for RedisStore {
    async fn exists(&self, dedup_key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();

        let found: bool = redis::cmd("EXISTS")
            .arg(self.posting_key(dedup_key))
            .query_async(&mut conn)
            .await?;

        Ok(found)
    }

    async fn insert(&self, posting: &NormalizedPosting) -> Result<InsertOutcome, StoreError> {
        let stored = StoredPosting {
            posting: posting.clone(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&stored)?;

        let mut conn = self.conn.clone();

        let reply: i64 = INSERT_SCRIPT
            .key(self.posting_key(&posting.dedup_key))
            .key(self.index_key())
            .arg(json)
            .arg(stored.created_at.timestamp_millis())
            .arg(&posting.dedup_key)
            .invoke_async(&mut conn)
            .await?;

        insert_outcome(reply)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();

        let count: usize = redis::cmd("ZCARD")
            .arg(self.index_key())
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }
}

/// Map the insert script's reply.
fn insert_outcome(reply: i64) -> Result<InsertOutcome, StoreError> {
    match reply {
        1 => Ok(InsertOutcome::Inserted),
        0 => Ok(InsertOutcome::Duplicate),
        other => Err(StoreError::Backend(format!(
            "unexpected insert script reply {other}"
        ))),
    }
}
