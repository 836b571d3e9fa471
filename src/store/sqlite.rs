use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::schema::SCHEMA;
use super::transaction::{Transaction, Write};
use super::watch::{Snapshot, Subscription, Watchers};
use super::{DocPath, Document, DocumentStore, Fields};
use crate::error::{Error, Result};

/// Attempts an atomic body gets before contention is reported.
const MAX_ATTEMPTS: u32 = 5;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    watchers: Watchers,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_connection(Connection::open_in_memory()?))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            watchers: Watchers::default(),
        }
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Validates the read set and applies the write set in one SQLite
    /// transaction, then publishes the new snapshots. Returns `false` if any
    /// document read has since changed.
    ///
    /// Publishing happens before the connection lock is released so that
    /// subscribers observe commits in commit order.
    fn commit(
        &self,
        reads: &BTreeMap<DocPath, Option<i64>>,
        scans: &BTreeMap<String, Vec<(String, i64)>>,
        writes: &[(DocPath, Write)],
    ) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for (path, observed) in reads {
            let current: Option<i64> = tx
                .query_row(
                    "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
                    params![path.collection, path.id],
                    |row| row.get(0),
                )
                .optional()?;
            if current != *observed {
                tracing::debug!("{} changed from {:?} to {:?}", path, observed, current);
                return Ok(false);
            }
        }

        for (collection, observed) in scans {
            let mut stmt = tx.prepare(
                "SELECT id, version FROM documents WHERE collection = ?1 ORDER BY id",
            )?;
            let current = stmt
                .query_map(params![collection], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;
            if current != *observed {
                tracing::debug!("collection {} changed since it was listed", collection);
                return Ok(false);
            }
        }

        if writes.is_empty() {
            return Ok(true);
        }

        tx.execute(
            "UPDATE commit_sequence SET value = value + 1 WHERE id = 1",
            [],
        )?;
        let version: i64 = tx.query_row(
            "SELECT value FROM commit_sequence WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        let now = format_datetime(&Utc::now());

        let mut touched: Vec<DocPath> = Vec::new();
        for (path, write) in writes {
            match write {
                Write::Set { fields, merge } => {
                    let mut stored = if *merge {
                        read_document(&tx, path)?
                            .map(|doc| doc.fields)
                            .unwrap_or_default()
                    } else {
                        Fields::new()
                    };
                    for (name, value) in fields {
                        stored.insert(name.clone(), value.clone());
                    }
                    tx.execute(
                        "INSERT INTO documents (collection, id, fields, version, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)
                         ON CONFLICT(collection, id) DO UPDATE SET
                            fields = excluded.fields,
                            version = excluded.version,
                            updated_at = excluded.updated_at",
                        params![
                            path.collection,
                            path.id,
                            serde_json::to_string(&stored)?,
                            version,
                            now,
                        ],
                    )?;
                }
                Write::Delete => {
                    tx.execute(
                        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                        params![path.collection, path.id],
                    )?;
                }
            }
            if !touched.contains(path) {
                touched.push(path.clone());
            }
        }

        let changes = touched
            .into_iter()
            .map(|path| -> Result<(DocPath, Snapshot)> {
                let snapshot = read_document(&tx, &path)?;
                Ok((path, snapshot))
            })
            .collect::<Result<Vec<_>>>()?;

        tx.commit()?;
        self.watchers.publish(changes);
        Ok(true)
    }

    /// Re-reads every watched document and publishes the ones changed by
    /// another connection to the same database file. Returns how many
    /// changes were published.
    pub fn refresh_watches(&self) -> Result<usize> {
        let conn = self.conn();
        self.watchers.refresh(|path| read_document(&conn, path))
    }
}

fn read_document(conn: &Connection, path: &DocPath) -> Result<Option<Document>> {
    conn.query_row(
        "SELECT fields, version, updated_at FROM documents WHERE collection = ?1 AND id = ?2",
        params![path.collection, path.id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    )
    .optional()?
    .map(|(fields, version, updated_at)| -> Result<Document> {
        Ok(Document {
            path: path.clone(),
            fields: serde_json::from_str(&fields)?,
            version,
            updated_at: parse_datetime(&updated_at),
        })
    })
    .transpose()
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl DocumentStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        read_document(&self.conn(), path)
    }

    fn set(&self, path: &DocPath, fields: Fields, merge: bool) -> Result<()> {
        let writes = [(path.clone(), Write::Set { fields, merge })];
        // a blind write has no read set and cannot conflict
        if self.commit(&BTreeMap::new(), &BTreeMap::new(), &writes)? {
            Ok(())
        } else {
            Err(Error::Contention(1))
        }
    }

    fn delete(&self, path: &DocPath) -> Result<bool> {
        super::atomically(self, |tx| {
            let existed = tx.get(path)?.is_some();
            if existed {
                tx.delete(path);
            }
            Ok(existed)
        })
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, fields, version, updated_at FROM documents
             WHERE collection = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, fields, version, updated_at) = row?;
            docs.push(Document {
                path: DocPath::new(collection, id),
                fields: serde_json::from_str(&fields)?,
                version,
                updated_at: parse_datetime(&updated_at),
            });
        }
        Ok(docs)
    }

    fn run_atomic(&self, body: &mut dyn FnMut(&mut Transaction<'_>) -> Result<()>) -> Result<()> {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut tx = Transaction::new(self);
            body(&mut tx)?;

            if self.commit(tx.reads(), tx.scans(), tx.writes())? {
                tracing::debug!(
                    "committed {} write(s) on attempt {}",
                    tx.writes().len(),
                    attempt
                );
                return Ok(());
            }
            tracing::warn!(
                "transaction conflict on attempt {}/{}, retrying",
                attempt,
                MAX_ATTEMPTS
            );
        }

        Err(Error::Contention(MAX_ATTEMPTS))
    }

    fn subscribe(&self, path: &DocPath) -> Result<Subscription> {
        let conn = self.conn();
        self.watchers.subscribe(path, || read_document(&conn, path))
    }
}
