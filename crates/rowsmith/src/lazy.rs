//! A connection handle that is created on first use.

use crate::client::{Connection, RunResult};
use crate::error::{Error, Result};
use crate::row::Record;
use crate::sql::Placeholder;
use crate::value::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::OnceCell;

type InitFuture<C> = Pin<Box<dyn Future<Output = Result<C>> + Send>>;
type InitFn<C> = Box<dyn Fn() -> InitFuture<C> + Send + Sync>;

/// Wraps an initializer and runs it at most once successfully.
///
/// Every operation first makes a best-effort initialization attempt; its
/// failure is swallowed so a handle that is already up is reused silently,
/// and only the use of a handle that never came up fails, with
/// [`Error::Uninitialized`]. Concurrent first calls are serialized, so the
/// initializer is never raced.
///
/// Hosts that prefer to fail fast call [`LazyConnection::initialize`] once at
/// startup.
///
/// # Example
/// ```ignore
/// let config = ConnectionConfig::from_env()?;
/// let conn = Arc::new(LazyConnection::new(move || {
///     let config = config.clone();
///     async move { config.connect().await }
/// }));
/// let users: Table<Users, _> = Table::new(conn.clone());
/// ```
pub struct LazyConnection<C> {
    cell: OnceCell<C>,
    init: InitFn<C>,
}

impl<C: Connection> LazyConnection<C> {
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Box::new(move || Box::pin(init())),
        }
    }

    /// Initialize now, returning the error instead of swallowing it.
    pub async fn initialize(&self) -> Result<&C> {
        self.cell.get_or_try_init(|| (self.init)()).await
    }

    /// The handle, if initialization has already succeeded.
    pub fn get(&self) -> Result<&C> {
        self.cell.get().ok_or(Error::Uninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn attempt(&self) {
        if self.cell.initialized() {
            return;
        }
        if let Err(err) = self.initialize().await {
            tracing::debug!(
                target: "rowsmith.connection",
                error = %err,
                "lazy connection initialization failed"
            );
        }
    }
}

impl<C> fmt::Debug for LazyConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyConnection")
            .field("initialized", &self.cell.initialized())
            .finish_non_exhaustive()
    }
}

impl<C: Connection> Connection for LazyConnection<C> {
    async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        self.get()?.run(sql, params).await
    }

    async fn all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.get()?.all(sql, params).await
    }

    fn placeholder(&self) -> Placeholder {
        self.cell
            .get()
            .map_or(Placeholder::default(), |conn| conn.placeholder())
    }

    async fn ensure_ready(&self) {
        self.attempt().await
    }
}
