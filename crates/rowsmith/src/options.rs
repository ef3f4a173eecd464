//! Per-call query options: projection, order, limit and logging.

use crate::entity::Column;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// `ORDER BY column direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Order<C> {
    pub column: C,
    pub direction: Direction,
}

/// Which columns a select returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection<C> {
    /// Every column of the table, plus any join-supplied columns.
    #[default]
    All,
    Columns(Vec<C>),
}

/// Raw clause injected by a join; callers cannot set it directly.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JoinFragment {
    pub(crate) clause: String,
    pub(crate) select: String,
}

/// Options for `select`, `select_one` and `count`.
///
/// `count` only honors `debug`.
///
/// # Example
/// ```
/// use rowsmith::QueryOptions;
///
/// let opts = QueryOptions::new().columns(["id", "name"]).desc("id").limit(10);
/// assert_eq!(opts.limit, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions<C> {
    pub projection: Projection<C>,
    pub limit: Option<u64>,
    pub order: Option<Order<C>>,
    /// Log the statement text before executing it.
    pub debug: bool,
    pub(crate) join: Option<JoinFragment>,
}

impl<C> Default for QueryOptions<C> {
    fn default() -> Self {
        Self {
            projection: Projection::All,
            limit: None,
            order: None,
            debug: false,
            join: None,
        }
    }
}

impl<C: Column> QueryOptions<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the projection. An empty list selects every column.
    pub fn columns(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        let columns: Vec<C> = columns.into_iter().collect();
        self.projection = if columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(columns)
        };
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_by(mut self, column: C, direction: Direction) -> Self {
        self.order = Some(Order { column, direction });
        self
    }

    pub fn asc(self, column: C) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn desc(self, column: C) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }
}
