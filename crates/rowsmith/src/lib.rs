//! # rowsmith
//!
//! Typed filters and updates compiled to parameterized SQL, with generic
//! per-table accessors on top.
//!
//! ## Features
//!
//! - **Structured predicates**: field maps, OR-groups, list membership and
//!   comparison operators compile to a WHERE fragment whose parameters always
//!   follow placeholder order
//! - **Structured updates**: literal assignments plus numeric
//!   `increment`/`decrement`/`multiply`/`divide`
//! - **Table accessors**: `select`, `select_one`, `count`, `insert`,
//!   `insert_many`, `update` and `delete` over any [`Entity`]
//! - **Single joins**: a `LEFT JOIN` of two accessors with flattened rows
//! - **Temporal normalization**: timestamps are bound as
//!   `YYYY-MM-DD HH:MM:SS` text and date-shaped text is decoded on read
//! - **Pluggable connections**: anything implementing [`Connection`];
//!   `tokio_postgres::Client` works out of the box
//!
//! ## Example
//!
//! ```ignore
//! use rowsmith::{Filter, Mutation, QueryOptions, Table};
//!
//! let client = ConnectionConfig::from_env()?.connect().await?;
//! let users: Table<Users, _> = Table::new(&client);
//!
//! let admins = users
//!     .select(Filter::new().eq(UserCol::Role, "admin"), QueryOptions::new().desc(UserCol::Id))
//!     .await?;
//!
//! users
//!     .update(Mutation::new().increment(UserCol::Logins, 1), Filter::new().eq(UserCol::Id, 7))
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod join;
pub mod lazy;
pub mod mutation;
pub mod options;
pub mod predicate;
pub mod row;
pub mod sql;
pub mod table;
pub mod temporal;
pub mod value;

pub use client::{Connection, RunResult};
pub use config::{ConnectionConfig, TableConfig};
pub use entity::{Column, Entity};
pub use error::{Error, Result};
pub use join::{Join, JoinColumn, JoinKind};
pub use lazy::LazyConnection;
pub use mutation::{Mutation, UpdateOps};
pub use options::{Direction, Projection, QueryOptions};
pub use predicate::{Cmp, Comparisons, Filter, Predicate};
pub use row::{FromRecord, FromValue, IntoRecord, Record};
pub use sql::{Placeholder, Sql};
pub use table::Table;
pub use value::{Number, Value};
