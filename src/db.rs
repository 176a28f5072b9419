use crate::engine::ChargerId;
use crate::error::StoreError;
use crate::favorites::FavoriteSet;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Idle connections kept for reuse; extra ones are closed after use.
const MAX_IDLE_CONNECTIONS: usize = 8;
/// Commit attempts before giving up on a row another process keeps rewriting.
const MAX_WRITE_ATTEMPTS: usize = 8;

const SELECT_FAVORITES: &str = "SELECT charger_ids FROM favorites WHERE identity = ?1";

/// SQLite access for the favorites table.
///
/// One row per identity holding its id set as a JSON array. Connections come
/// from a small pool, so readers never wait on writers (WAL) and writers for
/// different identities only meet for the duration of one upsert. Writers
/// for the same identity take that identity's lock for the whole
/// read-modify-write. The write itself is an `IMMEDIATE` transaction that
/// re-reads the row and commits only if it still matches what `update` saw,
/// so a failed or raced write leaves the previous row intact.
pub struct DbClient {
    db_path: String,
    idle: Mutex<Vec<Connection>>,
    writers: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl DbClient {
    pub fn new(db_path: impl Into<String>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        let conn = open_connection(&db_path)?;
        // Persistent on the database file; later connections inherit it.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            db_path,
            idle: Mutex::new(vec![conn]),
            writers: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS favorites (
                    identity TEXT PRIMARY KEY NOT NULL,
                    charger_ids TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                [],
            )?;
            Ok(())
        })?;

        info!("SQLite favorites store initialized at {}", self.db_path);
        Ok(())
    }

    /// Reads the committed set. Never waits on an in-flight update.
    pub fn get_favorites(&self, identity: &str) -> Result<FavoriteSet, StoreError> {
        self.with_connection(|conn| {
            let stored = read_row(conn, identity)?;
            decode_row(identity, stored.as_deref())
        })
    }

    /// Applies `update` to the stored set and persists the result when it
    /// reports a change. Returns the post-mutation set.
    ///
    /// `update` may run more than once if another process rewrites the row
    /// between the read and the commit.
    pub fn update_favorites<F>(&self, identity: &str, update: F) -> Result<FavoriteSet, StoreError>
    where
        F: Fn(&mut FavoriteSet) -> bool,
    {
        let writer = self.writer_lock(identity)?;
        let _serialized = writer.lock().map_err(|_| StoreError::Poisoned)?;

        self.with_connection(|conn| {
            for attempt in 1..=MAX_WRITE_ATTEMPTS {
                let seen = read_row(conn, identity)?;
                let mut set = decode_row(identity, seen.as_deref())?;

                if !update(&mut set) {
                    debug!("Favorites for {} unchanged, skipping write", identity);
                    return Ok(set);
                }

                let encoded =
                    serde_json::to_string(&set).map_err(|source| StoreError::Corrupt {
                        identity: identity.to_string(),
                        source,
                    })?;

                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                if read_row(&tx, identity)? != seen {
                    warn!(
                        "Favorites for {} changed underneath update (attempt {}), retrying",
                        identity, attempt
                    );
                    continue;
                }

                tx.prepare_cached(
                    "INSERT INTO favorites (identity, charger_ids, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(identity) DO UPDATE SET
                        charger_ids = excluded.charger_ids,
                        updated_at = excluded.updated_at",
                )?
                .execute(params![identity, encoded, unix_now()])?;
                tx.commit()?;
                return Ok(set);
            }

            Err(StoreError::Contended(identity.to_string()))
        })
    }

    pub fn set_favorite(
        &self,
        identity: &str,
        charger_id: ChargerId,
        is_favorite: bool,
    ) -> Result<FavoriteSet, StoreError> {
        self.update_favorites(identity, |set| {
            crate::favorites::apply(set, charger_id, is_favorite)
        })
    }

    fn writer_lock(&self, identity: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut writers = self.writers.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(lock) = writers.get(identity) {
            return Ok(lock.clone());
        }
        Ok(writers.entry(identity.to_string()).or_default().clone())
    }

    /// Runs `f` on a pooled connection, opening one when none is idle.
    fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let pooled = self.idle.lock().map_err(|_| StoreError::Poisoned)?.pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => open_connection(&self.db_path)?,
        };

        let result = f(&mut conn);

        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_CONNECTIONS {
                idle.push(conn);
            }
        }
        result
    }
}

fn open_connection(db_path: &str) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

fn read_row(conn: &Connection, identity: &str) -> Result<Option<String>, StoreError> {
    Ok(conn
        .prepare_cached(SELECT_FAVORITES)?
        .query_row(params![identity], |row| row.get(0))
        .optional()?)
}

fn decode_row(identity: &str, stored: Option<&str>) -> Result<FavoriteSet, StoreError> {
    match stored {
        Some(text) => decode(identity, text),
        None => Ok(FavoriteSet::new()),
    }
}

fn decode(identity: &str, text: &str) -> Result<FavoriteSet, StoreError> {
    serde_json::from_str(text).map_err(|source| StoreError::Corrupt {
        identity: identity.to_string(),
        source,
    })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
