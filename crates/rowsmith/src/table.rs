//! Generic per-table accessor.
//!
//! [`Table`] binds an [`Entity`] to a [`Connection`] and offers the usual
//! select/count/insert/update/delete surface. Every operation compiles its
//! descriptors first, so malformed input is rejected before any I/O; then it
//! gives the connection a chance to get ready, renders the statement with
//! the connection's placeholder style and executes it.
//!
//! Returned rows have every date-shaped text field decoded to a timestamp.

use crate::client::Connection;
use crate::config::TableConfig;
use crate::entity::{Column, Entity};
use crate::error::{Error, Result};
use crate::mutation::{self, Mutation};
use crate::options::{Projection, QueryOptions};
use crate::predicate::{self, Predicate};
use crate::row::{FromRecord, IntoRecord, Record};
use crate::sql::Sql;
use crate::temporal;
use std::fmt;
use std::marker::PhantomData;
use tracing::Level;

/// Accessor for one table.
///
/// # Example
/// ```ignore
/// let users: Table<Users, _> = Table::new(client.clone());
///
/// let active = users
///     .select(Filter::new().eq(UserCol::Status, "active"), QueryOptions::new().limit(20))
///     .await?;
/// let renamed = users
///     .update(
///         Mutation::new().set(UserCol::Name, "bob"),
///         Filter::new().eq(UserCol::Id, 7),
///     )
///     .await?;
/// ```
pub struct Table<E, C> {
    conn: C,
    config: TableConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E, C: Clone> Clone for Table<E, C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity, C> fmt::Debug for Table<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("table", &E::TABLE)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: Entity, C: Connection> Table<E, C> {
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, TableConfig::default())
    }

    pub fn with_config(conn: C, config: TableConfig) -> Self {
        Self {
            conn,
            config,
            _entity: PhantomData,
        }
    }

    /// Table name as written in SQL.
    pub fn name(&self) -> &'static str {
        E::TABLE
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Rows matching `predicate`; an empty Vec when nothing matches.
    pub async fn select(
        &self,
        predicate: impl Into<Predicate<E::Column>>,
        options: QueryOptions<E::Column>,
    ) -> Result<Vec<E::Row>> {
        self.fetch(&predicate.into(), &options).await
    }

    /// Like [`Table::select`], decoding into `R` (useful with projections).
    pub async fn select_as<R: FromRecord>(
        &self,
        predicate: impl Into<Predicate<E::Column>>,
        options: QueryOptions<E::Column>,
    ) -> Result<Vec<R>> {
        self.fetch(&predicate.into(), &options).await
    }

    /// First matching row.
    ///
    /// The limit is forced to 1; asking for any other limit is an error.
    pub async fn select_one(
        &self,
        predicate: impl Into<Predicate<E::Column>>,
        options: QueryOptions<E::Column>,
    ) -> Result<Option<E::Row>> {
        self.fetch_one(&predicate.into(), options).await
    }

    pub async fn select_one_as<R: FromRecord>(
        &self,
        predicate: impl Into<Predicate<E::Column>>,
        options: QueryOptions<E::Column>,
    ) -> Result<Option<R>> {
        self.fetch_one(&predicate.into(), options).await
    }

    /// Number of matching rows. Projection, order and limit are ignored.
    pub async fn count(
        &self,
        predicate: impl Into<Predicate<E::Column>>,
        options: QueryOptions<E::Column>,
    ) -> Result<i64> {
        let mut stmt = Sql::new(format!("SELECT COUNT(*) AS count FROM {} WHERE ", E::TABLE));
        stmt.push_sql(predicate::compile(&predicate.into()));

        let records = self.query(stmt, options.debug).await?;
        match records.first() {
            Some(record) => record.get_as("count"),
            None => Ok(0),
        }
    }

    /// Insert one row and return it as stored.
    pub async fn insert(&self, row: E::Insert) -> Result<E::Row> {
        let stmt = insert_sql(E::TABLE, row.into_record());
        let mut records = self.query(stmt, false).await?;
        match records.pop() {
            Some(record) => <E::Row as FromRecord>::from_record(record),
            None => Err(Error::storage(format!(
                "insert into {} returned no row",
                E::TABLE
            ))),
        }
    }

    /// Insert rows one statement at a time.
    ///
    /// Batches above the configured limit are rejected before anything is
    /// sent. Not atomic: on failure, rows inserted before it stay.
    pub async fn insert_many(&self, rows: Vec<E::Insert>) -> Result<Vec<E::Row>> {
        let limit = self.config.insert_many_limit;
        if rows.len() > limit {
            return Err(Error::configuration(format!(
                "insert_many accepts at most {limit} rows, got {}",
                rows.len()
            )));
        }

        let total = rows.len();
        let mut inserted = Vec::with_capacity(total);
        for (index, row) in rows.into_iter().enumerate() {
            match self.insert(row).await {
                Ok(stored) => inserted.push(stored),
                Err(err) => {
                    tracing::warn!(
                        target: "rowsmith.sql",
                        table = E::TABLE,
                        index,
                        total,
                        error = %err,
                        "insert_many stopped"
                    );
                    return Err(err);
                }
            }
        }
        Ok(inserted)
    }

    /// Apply `mutation` to matching rows; returns the changed-row count.
    ///
    /// Pass [`Predicate::all`] to update every row.
    pub async fn update(
        &self,
        mutation: Mutation<E::Column>,
        predicate: impl Into<Predicate<E::Column>>,
    ) -> Result<u64> {
        let set = mutation::compile(&mutation)?;
        let mut stmt = Sql::new(format!("UPDATE {} SET ", E::TABLE));
        stmt.push_sql(set)
            .push(" WHERE ")
            .push_sql(predicate::compile(&predicate.into()));
        self.execute(stmt, false).await
    }

    pub async fn delete(&self, predicate: impl Into<Predicate<E::Column>>) -> Result<()> {
        let mut stmt = Sql::new(format!("DELETE FROM {} WHERE ", E::TABLE));
        stmt.push_sql(predicate::compile(&predicate.into()));
        self.execute(stmt, false).await?;
        Ok(())
    }

    pub(crate) async fn fetch<K: Column, R: FromRecord>(
        &self,
        predicate: &Predicate<K>,
        options: &QueryOptions<K>,
    ) -> Result<Vec<R>> {
        let stmt = select_sql(E::TABLE, predicate, options);
        let records = self.query(stmt, options.debug).await?;
        records.into_iter().map(R::from_record).collect()
    }

    pub(crate) async fn fetch_one<K: Column, R: FromRecord>(
        &self,
        predicate: &Predicate<K>,
        mut options: QueryOptions<K>,
    ) -> Result<Option<R>> {
        match options.limit {
            None | Some(1) => options.limit = Some(1),
            Some(other) => {
                return Err(Error::configuration(format!(
                    "select_one requires limit 1, got {other}"
                )));
            }
        }
        Ok(self.fetch(predicate, &options).await?.into_iter().next())
    }

    async fn query(&self, stmt: Sql, debug: bool) -> Result<Vec<Record>> {
        self.conn.ensure_ready().await;
        let sql = stmt.render(self.conn.placeholder());
        self.log_sql(&sql, stmt.params().len(), debug);
        let records = self.conn.all(&sql, stmt.params()).await?;
        records
            .into_iter()
            .map(|record| record.try_map_values(temporal::decode_value))
            .collect()
    }

    async fn execute(&self, stmt: Sql, debug: bool) -> Result<u64> {
        self.conn.ensure_ready().await;
        let sql = stmt.render(self.conn.placeholder());
        self.log_sql(&sql, stmt.params().len(), debug);
        Ok(self.conn.run(&sql, stmt.params()).await?.changes)
    }

    /// Emit statement text (never parameter values).
    fn log_sql(&self, sql: &str, param_count: usize, debug: bool) {
        if !debug && !self.config.log_sql {
            return;
        }

        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.config.truncate_sql(sql);
        emit_at_level!(
            self.config.level,
            target: "rowsmith.sql",
            table = E::TABLE,
            param_count,
            sql = %sql,
        );
    }
}

fn select_sql<K: Column>(
    table: &str,
    predicate: &Predicate<K>,
    options: &QueryOptions<K>,
) -> Sql {
    let mut stmt = Sql::new("SELECT ");
    stmt.push(&projection(table, options));
    stmt.push(" FROM ").push(table);
    if let Some(join) = &options.join {
        stmt.push(" ").push(&join.clause);
    }
    stmt.push(" WHERE ").push_sql(predicate::compile(predicate));

    if let Some(order) = &options.order {
        stmt.push(&format!(
            " ORDER BY {} {}",
            order.column.name(),
            order.direction.as_sql()
        ));
    }
    if let Some(limit) = options.limit {
        stmt.push(&format!(" LIMIT {limit}"));
    }
    stmt
}

fn projection<K: Column>(table: &str, options: &QueryOptions<K>) -> String {
    match &options.projection {
        Projection::Columns(columns) if !columns.is_empty() => columns
            .iter()
            .map(|c| {
                let name = c.name();
                if name.contains('.') {
                    format!("{name} AS \"{name}\"")
                } else {
                    name.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => match &options.join {
            Some(join) => format!("{table}.*, {}", join.select),
            None => format!("{table}.*"),
        },
    }
}

fn insert_sql(table: &str, record: Record) -> Sql {
    if record.is_empty() {
        return Sql::new(format!("INSERT INTO {table} DEFAULT VALUES RETURNING *"));
    }

    let columns = record.keys().collect::<Vec<_>>().join(", ");
    let mut stmt = Sql::new(format!("INSERT INTO {table} ({columns}) VALUES ("));
    for (i, (_, value)) in record.into_iter().enumerate() {
        if i > 0 {
            stmt.push(", ");
        }
        stmt.push_bind(value);
    }
    stmt.push(") RETURNING *");
    stmt
}
