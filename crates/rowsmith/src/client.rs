//! Connection trait: the execution surface accessors talk to.

use crate::error::{Error, Result};
use crate::row::{Record, record_from_pg_row};
use crate::sql::Placeholder;
use crate::value::Value;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Outcome of a statement executed with [`Connection::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Rows changed by the statement.
    pub changes: u64,
}

/// A storage-engine handle.
///
/// Accessors receive one at construction time, so tests can substitute a
/// double and several accessors can share a handle (`Arc<_>` and `&_`
/// implement this trait too).
pub trait Connection: Send + Sync {
    /// Execute a statement and report how many rows it changed.
    fn run(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Result<RunResult>> + Send;

    /// Execute a query and return every row.
    fn all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Result<Vec<Record>>> + Send;

    /// Placeholder syntax this engine expects.
    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    /// Best-effort preparation before an operation.
    ///
    /// Never fails; a handle that is still unusable afterwards reports that
    /// from `run`/`all`. The default does nothing.
    fn ensure_ready(&self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}

impl<C: Connection> Connection for Arc<C> {
    fn run(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Result<RunResult>> + Send {
        (**self).run(sql, params)
    }

    fn all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Result<Vec<Record>>> + Send {
        (**self).all(sql, params)
    }

    fn placeholder(&self) -> Placeholder {
        (**self).placeholder()
    }

    fn ensure_ready(&self) -> impl std::future::Future<Output = ()> + Send {
        (**self).ensure_ready()
    }
}

impl<C: Connection> Connection for &C {
    fn run(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Result<RunResult>> + Send {
        (**self).run(sql, params)
    }

    fn all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Result<Vec<Record>>> + Send {
        (**self).all(sql, params)
    }

    fn placeholder(&self) -> Placeholder {
        (**self).placeholder()
    }

    fn ensure_ready(&self) -> impl std::future::Future<Output = ()> + Send {
        (**self).ensure_ready()
    }
}

fn pg_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection for tokio_postgres::Client {
    async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        let changes = tokio_postgres::Client::execute(self, sql, &pg_params(params))
            .await
            .map_err(Error::from_db_error)?;
        Ok(RunResult { changes })
    }

    async fn all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        let rows = tokio_postgres::Client::query(self, sql, &pg_params(params))
            .await
            .map_err(Error::from_db_error)?;
        rows.iter().map(record_from_pg_row).collect()
    }

    fn placeholder(&self) -> Placeholder {
        Placeholder::Numbered
    }
}
