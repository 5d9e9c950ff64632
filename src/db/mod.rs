mod aggregate;
pub mod schema;
mod store;

use crate::config::Config;
use crate::error::IndexError;
use crate::model::Stats;
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Shared handle to the SQLite store.
///
/// All access goes through one connection behind a mutex, so every unit of
/// work (one message upsert, one aggregate query) runs alone.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(&config.database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::open(&config.database_url)?)
    }

    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self::from_connection(Connection::open_in_memory()?);
        db.execute_init()?;
        Ok(db)
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// A panic while holding the lock leaves SQLite itself consistent, so a
    /// poisoned mutex is recovered rather than propagated.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn execute_init(&self) -> Result<()> {
        info!("Database: Initializing schema...");
        self.conn().execute_batch(schema::SCHEMA)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    /// Runs a synchronous store operation on the blocking thread pool.
    pub async fn run_blocking<T, F>(&self, f: F) -> std::result::Result<T, IndexError>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        Ok(tokio::task::spawn_blocking(move || f(&db)).await??)
    }

    /// Deletes every channel, message and reaction.
    pub fn clear_all(&self) -> Result<()> {
        info!("Database: Clearing all indexed data");
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM reactions", [])?;
        tx.execute("DELETE FROM messages", [])?;
        tx.execute("DELETE FROM channels", [])?;
        tx.commit()
    }

    pub fn stats(&self) -> Result<Stats> {
        let conn = self.conn();
        let count = |table: &str| -> Result<u64> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n as u64)
        };
        Ok(Stats {
            channels: count("channels")?,
            messages: count("messages")?,
            reactions: count("reactions")?,
        })
    }
}
