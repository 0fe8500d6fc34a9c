//! Two-tier request/result cache: an in-memory front layer over a durable
//! libSQL key→record store.
//!
//! [`CacheStore`] is the only interface the rest of pathscout sees. Lookups
//! check the in-memory map first, then the durable layer (keyed by a SHA-256
//! digest of the logical key, scoped to a category); a durable hit is promoted
//! into the memory layer before returning. Writes go to both layers.
//!
//! Durable-layer failures are swallowed: `get` degrades to a miss and `put`
//! to a no-op, so the cache can never cause a request to fail. There is no
//! eviction, no TTL, and no invalidation.

mod migrations;

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use pathscout_shared::{CACHE_SCHEMA_VERSION, PathscoutError, Result};

// ---------------------------------------------------------------------------
// CacheRecord
// ---------------------------------------------------------------------------

/// Versioned envelope written for every durable cache value.
///
/// The category and key hash are repeated inside the record so a row that was
/// written under a different schema, or landed under the wrong key, reads as
/// a miss instead of silently-corrupt data.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CacheRecord {
    schema_version: u32,
    category: String,
    key_hash: String,
    payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// DurableStore
// ---------------------------------------------------------------------------

/// The durable layer: a libSQL database holding one row per (category, key).
pub struct DurableStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl DurableStore {
    /// Open or create a cache database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PathscoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PathscoutError::Cache(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PathscoutError::Cache(e.to_string()))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    PathscoutError::Cache(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Fetch the record JSON stored for `(category, key_hash)`, if any.
    pub async fn get(&self, category: &str, key_hash: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT record_json FROM cache_entries WHERE category = ?1 AND key_hash = ?2",
                params![category, key_hash],
            )
            .await
            .map_err(|e| PathscoutError::Cache(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let record: String = row
                    .get(0)
                    .map_err(|e| PathscoutError::Cache(e.to_string()))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(PathscoutError::Cache(e.to_string())),
        }
    }

    /// Store a record for `(category, key_hash)` (upserts).
    ///
    /// Two operations racing on the same key write value-equal records, so
    /// either winner leaves the row correct.
    pub async fn put(&self, category: &str, key_hash: &str, record_json: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO cache_entries (category, key_hash, record_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(category, key_hash) DO UPDATE SET
                   record_json = excluded.record_json",
                params![category, key_hash, record_json, now.as_str()],
            )
            .await
            .map_err(|e| PathscoutError::Cache(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CacheStore
// ---------------------------------------------------------------------------

/// Process-wide two-tier cache handed to every component as `Arc<CacheStore>`.
pub struct CacheStore {
    mem: Mutex<HashMap<(String, String), serde_json::Value>>,
    durable: Option<DurableStore>,
}

impl CacheStore {
    /// Open a cache backed by a durable database at `path`.
    ///
    /// An unopenable database degrades to a memory-only cache; it never
    /// fails the caller.
    pub async fn open(path: &Path) -> Self {
        match DurableStore::open(path).await {
            Ok(store) => Self {
                mem: Mutex::new(HashMap::new()),
                durable: Some(store),
            },
            Err(e) => {
                tracing::debug!(?path, error = %e, "durable cache unavailable, memory-only");
                Self::memory_only()
            }
        }
    }

    /// A cache with no durable layer (used in tests and as the degraded mode).
    pub fn memory_only() -> Self {
        Self {
            mem: Mutex::new(HashMap::new()),
            durable: None,
        }
    }

    /// SHA-256 hex digest of a logical cache key.
    pub fn key_hash(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a typed value. Memory layer first, then durable; a durable hit
    /// is promoted into memory. Any durable failure reads as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, category: &str, key: &str) -> Option<T> {
        let mem_key = (category.to_string(), key.to_string());

        let cached = {
            let mem = self.mem.lock().await;
            mem.get(&mem_key).cloned()
        };
        if let Some(value) = cached {
            return serde_json::from_value(value).ok();
        }

        let durable = self.durable.as_ref()?;
        let key_hash = Self::key_hash(key);

        let record_json = match durable.get(category, &key_hash).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(category, error = %e, "durable cache read failed");
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&record_json) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(category, error = %e, "unreadable cache record, treating as miss");
                return None;
            }
        };

        if record.schema_version != CACHE_SCHEMA_VERSION
            || record.category != category
            || record.key_hash != key_hash
        {
            tracing::debug!(
                category,
                record_version = record.schema_version,
                "stale or mismatched cache record, treating as miss"
            );
            return None;
        }

        // Promote into the memory layer before returning.
        {
            let mut mem = self.mem.lock().await;
            mem.insert(mem_key, record.payload.clone());
        }

        serde_json::from_value(record.payload).ok()
    }

    /// Store a typed value in both layers. Durable failures degrade to
    /// memory-only silently.
    pub async fn put_json<T: Serialize>(&self, category: &str, key: &str, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(category, error = %e, "unserializable cache value, skipping");
                return;
            }
        };

        {
            let mut mem = self.mem.lock().await;
            mem.insert((category.to_string(), key.to_string()), payload.clone());
        }

        let Some(durable) = self.durable.as_ref() else {
            return;
        };

        let key_hash = Self::key_hash(key);
        let record = CacheRecord {
            schema_version: CACHE_SCHEMA_VERSION,
            category: category.to_string(),
            key_hash: key_hash.clone(),
            payload,
        };

        let record_json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!(category, error = %e, "cache record serialization failed");
                return;
            }
        };

        if let Err(e) = durable.put(category, &key_hash, &record_json).await {
            tracing::debug!(category, error = %e, "durable cache write failed");
        }
    }

    /// Text convenience wrapper over [`CacheStore::get_json`].
    pub async fn get_text(&self, category: &str, key: &str) -> Option<String> {
        self.get_json(category, key).await
    }

    /// Text convenience wrapper over [`CacheStore::put_json`].
    pub async fn put_text(&self, category: &str, key: &str, value: &str) {
        self.put_json(category, key, &value).await;
    }
}
