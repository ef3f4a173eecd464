//! One-level join over two table accessors.
//!
//! A [`Join`] runs its selects through the primary accessor with a single
//! `LEFT JOIN` injected, and widens the wildcard projection with every column
//! of the secondary table. Columns of both tables are addressed through
//! [`JoinColumn`], which always renders `table.column`.
//!
//! Rows are flattened into one [`Record`]. When both tables have a column of
//! the same name, the secondary table's value wins.

use crate::client::Connection;
use crate::entity::{Column, Entity, qualified};
use crate::error::Result;
use crate::options::{JoinFragment, QueryOptions};
use crate::predicate::Predicate;
use crate::row::{FromRecord, Record};
use crate::table::Table;
use std::borrow::Cow;
use std::fmt;

/// Join flavor. Only left joins are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Left,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// A column of either side of a join.
pub enum JoinColumn<P: Entity, S: Entity> {
    Primary(P::Column),
    Secondary(S::Column),
}

impl<P: Entity, S: Entity> JoinColumn<P, S> {
    pub fn primary(column: P::Column) -> Self {
        JoinColumn::Primary(column)
    }

    pub fn secondary(column: S::Column) -> Self {
        JoinColumn::Secondary(column)
    }
}

impl<P: Entity, S: Entity> Column for JoinColumn<P, S> {
    fn name(&self) -> Cow<'static, str> {
        match self {
            JoinColumn::Primary(c) => qualified::<P>(c).into(),
            JoinColumn::Secondary(c) => qualified::<S>(c).into(),
        }
    }
}

impl<P: Entity, S: Entity> Clone for JoinColumn<P, S>
where
    P::Column: Clone,
    S::Column: Clone,
{
    fn clone(&self) -> Self {
        match self {
            JoinColumn::Primary(c) => JoinColumn::Primary(c.clone()),
            JoinColumn::Secondary(c) => JoinColumn::Secondary(c.clone()),
        }
    }
}

impl<P: Entity, S: Entity> fmt::Debug for JoinColumn<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl<P: Entity, S: Entity> PartialEq for JoinColumn<P, S> {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

/// Two accessors joined on `primary.column = secondary.column`.
///
/// # Example
/// ```ignore
/// let owned = Join::new(
///     Table::<Ownership, _>::new(conn.clone()),
///     Table::<Games, _>::new(conn.clone()),
///     OwnershipCol::AppId,
///     GameCol::AppId,
/// );
/// let rows = owned
///     .select(
///         Filter::new().eq(JoinColumn::primary(OwnershipCol::SteamId), "76561198"),
///         QueryOptions::new(),
///     )
///     .await?;
/// ```
pub struct Join<P: Entity, S: Entity, C> {
    primary: Table<P, C>,
    secondary: Table<S, C>,
    on: (P::Column, S::Column),
    kind: JoinKind,
}

impl<P: Entity, S: Entity, C: Connection> Join<P, S, C> {
    pub fn new(
        primary: Table<P, C>,
        secondary: Table<S, C>,
        primary_column: P::Column,
        secondary_column: S::Column,
    ) -> Self {
        Self {
            primary,
            secondary,
            on: (primary_column, secondary_column),
            kind: JoinKind::Left,
        }
    }

    pub fn primary(&self) -> &Table<P, C> {
        &self.primary
    }

    pub fn secondary(&self) -> &Table<S, C> {
        &self.secondary
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Flattened rows of both tables.
    pub async fn select(
        &self,
        predicate: impl Into<Predicate<JoinColumn<P, S>>>,
        options: QueryOptions<JoinColumn<P, S>>,
    ) -> Result<Vec<Record>> {
        self.select_as(predicate, options).await
    }

    pub async fn select_as<R: FromRecord>(
        &self,
        predicate: impl Into<Predicate<JoinColumn<P, S>>>,
        options: QueryOptions<JoinColumn<P, S>>,
    ) -> Result<Vec<R>> {
        let options = self.joined(options);
        self.primary.fetch(&predicate.into(), &options).await
    }

    pub async fn select_one(
        &self,
        predicate: impl Into<Predicate<JoinColumn<P, S>>>,
        options: QueryOptions<JoinColumn<P, S>>,
    ) -> Result<Option<Record>> {
        self.select_one_as(predicate, options).await
    }

    pub async fn select_one_as<R: FromRecord>(
        &self,
        predicate: impl Into<Predicate<JoinColumn<P, S>>>,
        options: QueryOptions<JoinColumn<P, S>>,
    ) -> Result<Option<R>> {
        let options = self.joined(options);
        self.primary.fetch_one(&predicate.into(), options).await
    }

    fn joined(
        &self,
        mut options: QueryOptions<JoinColumn<P, S>>,
    ) -> QueryOptions<JoinColumn<P, S>> {
        options.join = Some(self.fragment());
        options
    }

    fn fragment(&self) -> JoinFragment {
        let (primary, secondary) = &self.on;
        JoinFragment {
            clause: format!(
                "{} {} ON {} = {}",
                self.kind.as_sql(),
                S::TABLE,
                qualified::<P>(primary),
                qualified::<S>(secondary)
            ),
            select: format!("{}.*", S::TABLE),
        }
    }
}

impl<P: Entity, S: Entity, C> fmt::Debug for Join<P, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join")
            .field("primary", &P::TABLE)
            .field("secondary", &S::TABLE)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
