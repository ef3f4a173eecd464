//! Per-table schema descriptors.
//!
//! These traits are the seam to whatever produces table descriptions
//! (usually generated code): a table name, a column type, the full row type
//! and the insertable row type.
//!
//! # Example
//!
//! ```
//! use rowsmith::{Column, Entity, FromRecord, IntoRecord, Record};
//! use std::borrow::Cow;
//!
//! #[derive(Debug, Clone, Copy)]
//! enum UserCol { Id, Name }
//!
//! impl Column for UserCol {
//!     fn name(&self) -> Cow<'static, str> {
//!         match self {
//!             UserCol::Id => "id".into(),
//!             UserCol::Name => "name".into(),
//!         }
//!     }
//! }
//!
//! struct User { id: i64, name: String }
//!
//! impl FromRecord for User {
//!     fn from_record(r: Record) -> rowsmith::Result<Self> {
//!         Ok(Self { id: r.get_as("id")?, name: r.get_as("name")? })
//!     }
//! }
//!
//! struct NewUser { name: String }
//!
//! impl IntoRecord for NewUser {
//!     fn into_record(self) -> Record {
//!         Record::new().with("name", self.name)
//!     }
//! }
//!
//! struct Users;
//!
//! impl Entity for Users {
//!     const TABLE: &'static str = "users";
//!     type Column = UserCol;
//!     type Row = User;
//!     type Insert = NewUser;
//! }
//! ```

use crate::row::{FromRecord, IntoRecord};
use std::borrow::Cow;

/// A column name usable in predicates, mutations and projections.
///
/// Implement it on a per-table enum to get compile-time checking of column
/// names. `&'static str` implements it for ad-hoc use.
pub trait Column {
    fn name(&self) -> Cow<'static, str>;
}

impl Column for &'static str {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(*self)
    }
}

impl Column for String {
    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(self.clone())
    }
}

/// Schema description of one table.
pub trait Entity {
    /// Table name as written in SQL.
    const TABLE: &'static str;
    /// Column names of this table.
    type Column: Column;
    /// Full row, as returned by selects and `RETURNING *`.
    type Row: FromRecord;
    /// Row as supplied at insert time (defaulted columns may be absent).
    type Insert: IntoRecord;
}

/// A column qualified with its table name: `table.column`.
pub fn qualified<E: Entity>(column: &E::Column) -> String {
    format!("{}.{}", E::TABLE, column.name())
}
