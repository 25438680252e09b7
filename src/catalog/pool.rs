//! Bounded pool of catalog connections.
//!
//! Idle connections are reused last-in first-out. At most `max_size`
//! connections are handed out at once; further callers wait. Opening a
//! connection is retried with capped exponential backoff, and running out
//! of attempts is the one error that aborts a whole run.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::{AppError, Result};
use crate::models::CatalogConfig;

/// Opens new connections for a [`ConnectionPool`].
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Send;

    async fn connect(&self) -> Result<Self::Connection>;
}

/// Pool size and connection retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_size: usize,

    /// Connection attempts before giving up
    pub connect_attempts: u32,

    /// Delay after the first failed attempt, doubled after each failure
    pub backoff: Duration,
    pub backoff_cap: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

impl From<&CatalogConfig> for PoolConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            max_size: config.pool_size.max(1),
            connect_attempts: config.connect_attempts.max(1),
            backoff: config.connect_backoff(),
            backoff_cap: config.connect_backoff_cap(),
        }
    }
}

/// A bounded, LIFO connection pool.
pub struct ConnectionPool<C: Connector> {
    connector: C,
    config: PoolConfig,
    idle: Mutex<Vec<C::Connection>>,
    permits: Semaphore,
}

impl<C: Connector> ConnectionPool<C> {
    /// Create an empty pool. No connection is opened until the first acquire.
    pub fn new(connector: C, config: PoolConfig) -> Self {
        Self {
            connector,
            permits: Semaphore::new(config.max_size),
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    /// Number of idle connections ready for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Take a connection, waiting while `max_size` are in use.
    ///
    /// Reuses the most recently returned idle connection, otherwise opens a
    /// new one. Fails with [`AppError::CatalogUnavailable`] when no
    /// connection could be opened within the retry budget.
    pub async fn acquire(&self) -> Result<PooledConnection<'_, C>> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::catalog("connection pool closed"))?;

        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let conn = match reused {
            Some(conn) => conn,
            None => self.connect_with_retry().await?,
        };

        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
            _permit: permit,
        })
    }

    async fn connect_with_retry(&self) -> Result<C::Connection> {
        let attempts = self.config.connect_attempts;
        let mut delay = self.config.backoff;
        let mut attempt = 1;

        loop {
            match self.connector.connect().await {
                Ok(conn) => return Ok(conn),
                Err(e) if attempt < attempts => {
                    log::debug!(
                        "Catalog connect attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2).min(self.config.backoff_cap);
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Catalog unavailable after {} attempts: {}", attempt, e);
                    return Err(AppError::CatalogUnavailable {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    fn release(&self, conn: C::Connection) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conn);
    }
}

/// A connection on loan from a [`ConnectionPool`].
///
/// Returned to the pool when dropped, including on error paths.
pub struct PooledConnection<'a, C: Connector> {
    pool: &'a ConnectionPool<C>,
    conn: Option<C::Connection>,
    _permit: SemaphorePermit<'a>,
}

impl<C: Connector> Deref for PooledConnection<'_, C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        // Only taken in drop
        self.conn.as_ref().expect("pooled connection present")
    }
}

impl<C: Connector> DerefMut for PooledConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("pooled connection present")
    }
}

impl<C: Connector> Drop for PooledConnection<'_, C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
