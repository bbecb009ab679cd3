//! # Connection Pool
//!
//! A fixed set of SQLite connections opened once at startup and shared through
//! `Arc`. Work is handed to `spawn_blocking` together with a checked-out
//! connection, so async worker threads never block on SQLite.
//!
//! The checked-out connection and its permit travel into the blocking task and
//! go back to the pool when that task ends, even if the caller's future was
//! dropped while waiting for it.
//!
//! Lifecycle: `open` → `run`* → `close`. After `close` every `run` fails with
//! `DbError::PoolClosed`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::config::DatabaseConfig;
use super::errors::{DbError, DbResult};
use super::schema::run_migrations;

/// Shared pool handle; cloning is cheap
#[derive(Clone)]
pub struct DbPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
    size: usize,
}

impl std::fmt::Debug for DbPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbPool")
            .field("size", &self.inner.size)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl DbPool {
    /// Open every connection, configure it, and bring the schema up to date
    pub fn open(config: &DatabaseConfig) -> DbResult<Self> {
        let size = config.effective_pool_size();
        let mut connections = Vec::with_capacity(size);

        for i in 0..size {
            let mut conn = open_connection(config)?;
            if i == 0 {
                run_migrations(&mut conn)?;
            }
            connections.push(conn);
        }

        tracing::info!(path = %config.path, size, "database pool opened");

        Ok(Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(connections),
                permits: Arc::new(Semaphore::new(size)),
                acquire_timeout: config.acquire_timeout(),
                size,
            }),
        })
    }

    /// Single-connection in-memory pool
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(&DatabaseConfig::in_memory())
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }

    /// Run `f` with exclusive use of one connection.
    ///
    /// Waits at most `acquire_timeout` for a free connection.
    pub async fn run<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = tokio::time::timeout(
            self.inner.acquire_timeout,
            Arc::clone(&self.inner.permits).acquire_owned(),
        )
        .await
        .map_err(|_| DbError::AcquireTimeout(self.inner.acquire_timeout))?
        .map_err(|_| DbError::PoolClosed)?;

        let mut conn = PooledConnection::checkout(Arc::clone(&self.inner), permit)?;

        let joined = tokio::task::spawn_blocking(move || {
            let result = match conn.connection() {
                Some(c) => f(c),
                None => Err(DbError::NoIdleConnection),
            };
            // Hand the connection back before the result leaves the task
            drop(conn);
            result
        })
        .await;

        joined.map_err(|e| {
            tracing::error!(error = %e, "database task failed");
            DbError::Worker(e.to_string())
        })?
    }

    /// Close the pool. In-flight work finishes; its connections are dropped on
    /// return instead of being reused.
    pub fn close(&self) {
        self.inner.permits.close();
        let drained = match self.inner.idle.lock() {
            Ok(mut idle) => std::mem::take(&mut *idle),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        tracing::info!(connections = drained.len(), "database pool closed");
    }
}

/// A connection on loan from the pool.
///
/// Dropping it returns the connection to `idle` first and then releases the
/// permit, so a permit is never free while its connection is missing.
struct PooledConnection {
    conn: Option<Connection>,
    inner: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    fn checkout(inner: Arc<PoolInner>, permit: OwnedSemaphorePermit) -> DbResult<Self> {
        let conn = {
            let mut idle = match inner.idle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            idle.pop()
        };

        match conn {
            Some(conn) => Ok(Self {
                conn: Some(conn),
                inner,
                _permit: permit,
            }),
            None if inner.permits.is_closed() => Err(DbError::PoolClosed),
            None => {
                tracing::error!(size = inner.size, "permit granted but no idle connection");
                Err(DbError::NoIdleConnection)
            }
        }
    }

    /// `None` only once the connection has been handed back
    fn connection(&mut self) -> Option<&mut Connection> {
        self.conn.as_mut()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.inner.permits.is_closed() {
            return;
        }
        // A panicking task may have left an open transaction behind
        if !conn.is_autocommit() {
            let _ = conn.execute_batch("ROLLBACK");
        }
        match self.inner.idle.lock() {
            Ok(mut idle) => idle.push(conn),
            Err(poisoned) => poisoned.into_inner().push(conn),
        }
    }
}

fn open_connection(config: &DatabaseConfig) -> DbResult<Connection> {
    let conn = if config.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.path)?
    };

    conn.busy_timeout(config.busy_timeout())?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    if !config.is_in_memory() {
        // Readers proceed while one writer holds the reserved lock
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
    }
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_returns_value() {
        let pool = DbPool::open_in_memory().unwrap();
        let n: i64 = pool
            .run(|conn| Ok(conn.query_row("SELECT 40 + 2", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(n, 42);
        assert_eq!(pool.size(), 1);
    }

    #[tokio::test]
    async fn test_run_after_close_fails() {
        let pool = DbPool::open_in_memory().unwrap();
        pool.close();
        assert!(pool.is_closed());

        let result = pool.run(|_| Ok(())).await;
        assert!(matches!(result, Err(DbError::PoolClosed)));
    }

    #[tokio::test]
    async fn test_file_pool_shares_data() {
        let temp = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: temp.path().join("test.db").to_string_lossy().into_owned(),
            pool_size: 3,
            ..Default::default()
        };
        let pool = DbPool::open(&config).unwrap();
        assert_eq!(pool.size(), 3);

        pool.run(|conn| {
            conn.execute(
                "INSERT INTO audits (audit_id, audit_name) VALUES ('A-1', 'Yearly')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.run(|conn| {
                    Ok(conn.query_row("SELECT COUNT(*) FROM audits", [], |row| {
                        row.get::<_, i64>(0)
                    })?)
                })
                .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_acquire_timeout() {
        let config = DatabaseConfig {
            acquire_timeout_ms: 50,
            ..DatabaseConfig::in_memory()
        };
        let pool = DbPool::open(&config).unwrap();

        let busy = pool.clone();
        let blocker = tokio::spawn(async move {
            busy.run(|_| {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = pool.run(|_| Ok(())).await;
        assert!(matches!(result, Err(DbError::AcquireTimeout(_))));

        blocker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_dropped_run_returns_connection() {
        let pool = DbPool::open_in_memory().unwrap();
        pool.run(|conn| {
            conn.execute(
                "INSERT INTO audits (audit_id, audit_name) VALUES ('A-1', 'Yearly')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        // Caller gives up while the query is still running
        let slow = pool.run(|_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        });
        assert!(tokio::time::timeout(Duration::from_millis(20), slow)
            .await
            .is_err());

        // The single connection, and with it the in-memory database, is back
        let count: i64 = pool
            .run(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM audits", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_panicking_task_returns_connection() {
        let pool = DbPool::open_in_memory().unwrap();

        let result: DbResult<()> = pool
            .run(|conn| {
                conn.execute_batch(
                    "BEGIN; INSERT INTO audits (audit_id, audit_name) VALUES ('A-1', 'Lost');",
                )?;
                panic!("task failed mid-transaction");
            })
            .await;
        assert!(matches!(result, Err(DbError::Worker(_))));

        let count: i64 = pool
            .run(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM audits", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_missing_idle_connection_is_reported() {
        let pool = DbPool::open_in_memory().unwrap();
        pool.inner.idle.lock().unwrap().clear();

        let result = pool.run(|_| Ok(())).await;
        assert!(matches!(result, Err(DbError::NoIdleConnection)));
    }
}
