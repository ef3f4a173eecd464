//! Structured filters and their compilation into WHERE fragments.
//!
//! A [`Predicate`] is either one [`Filter`] (fields ANDed together) or an
//! ordered list of filters (ORed together). Each field of a filter carries a
//! [`Condition`]:
//!
//! - a literal value: `field = ?`
//! - a list of values: `(field = ? OR field = ?)`
//! - a set of comparisons: `field > ? AND field < ?`
//!
//! # Example
//! ```
//! use rowsmith::predicate::{self, Comparisons, Filter, Predicate};
//!
//! let filter = Filter::new()
//!     .eq("status", "active")
//!     .any_of("steam_id", ["a", "b"])
//!     .compare("count", Comparisons::new().ne_all([1, 2]));
//!
//! let sql = predicate::compile(&Predicate::from(filter));
//! assert_eq!(
//!     sql.to_sql(),
//!     "status = ? AND (steam_id = ? OR steam_id = ?) AND (count <> ? AND count <> ?)"
//! );
//! assert_eq!(sql.params().len(), 5);
//! ```

use crate::entity::Column;
use crate::sql::Sql;
use crate::value::Value;
use std::collections::BTreeMap;

/// Clause that matches every row.
pub const ALWAYS_TRUE: &str = "1=1";
/// Clause that matches no row.
pub const ALWAYS_FALSE: &str = "1=0";

/// Comparison operator.
///
/// Declaration order is the order operators are compiled in when several are
/// present on one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cmp {
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    Eq,
}

impl Cmp {
    pub fn as_sql(self) -> &'static str {
        match self {
            Cmp::Gt => ">",
            Cmp::Gte => ">=",
            Cmp::Lt => "<",
            Cmp::Lte => "<=",
            Cmp::Ne => "<>",
            Cmp::Eq => "=",
        }
    }

    /// Separator for a list operand: excluding several values requires all
    /// exclusions to hold at once.
    fn group_separator(self) -> &'static str {
        match self {
            Cmp::Ne => " AND ",
            _ => " OR ",
        }
    }
}

/// Operand of a comparison: one value or a list of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    One(Value),
    Many(Vec<Value>),
}

impl Operand {
    pub fn one(value: impl Into<Value>) -> Self {
        Operand::One(value.into())
    }

    pub fn many<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Operand::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Operator map for a single field; at most one operand per operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparisons {
    ops: BTreeMap<Cmp, Operand>,
}

impl Comparisons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operand for `op`, replacing any previous one.
    pub fn with(mut self, op: Cmp, operand: Operand) -> Self {
        self.ops.insert(op, operand);
        self
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.with(Cmp::Gt, Operand::one(value))
    }

    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.with(Cmp::Gte, Operand::one(value))
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.with(Cmp::Lt, Operand::one(value))
    }

    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.with(Cmp::Lte, Operand::one(value))
    }

    pub fn ne(self, value: impl Into<Value>) -> Self {
        self.with(Cmp::Ne, Operand::one(value))
    }

    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.with(Cmp::Eq, Operand::one(value))
    }

    /// `field <> ? AND field <> ? ...`
    pub fn ne_all<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Self {
        self.with(Cmp::Ne, Operand::many(values))
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn merge(&mut self, other: Comparisons) {
        self.ops.extend(other.ops);
    }
}

/// Condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field = ?`
    Eq(Value),
    /// `(field = ? OR field = ? ...)`
    AnyOf(Vec<Value>),
    /// One fragment per operator, ANDed.
    Compare(Comparisons),
}

/// A field map: conditions on distinct fields, ANDed in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<C> {
    fields: Vec<(C, Condition)>,
}

impl<C> Default for Filter<C> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<C: Column> Filter<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the condition for `column`.
    ///
    /// A column that is already present keeps its position and gets the new
    /// condition, the same way re-assigning a map key would.
    pub fn set(mut self, column: C, condition: Condition) -> Self {
        let name = column.name();
        match self.fields.iter_mut().find(|(c, _)| c.name() == name) {
            Some((_, slot)) => *slot = condition,
            None => self.fields.push((column, condition)),
        }
        self
    }

    pub fn eq(self, column: C, value: impl Into<Value>) -> Self {
        self.set(column, Condition::Eq(value.into()))
    }

    pub fn any_of<T: Into<Value>>(self, column: C, values: impl IntoIterator<Item = T>) -> Self {
        self.set(
            column,
            Condition::AnyOf(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Add comparisons for `column`.
    ///
    /// Comparisons accumulate: calling this twice for the same column merges
    /// the operator maps (a repeated operator takes the newer operand).
    pub fn compare(mut self, column: C, comparisons: Comparisons) -> Self {
        let name = column.name();
        if let Some((_, Condition::Compare(existing))) =
            self.fields.iter_mut().find(|(c, _)| c.name() == name)
        {
            existing.merge(comparisons);
            return self;
        }
        self.set(column, Condition::Compare(comparisons))
    }

    pub fn gt(self, column: C, value: impl Into<Value>) -> Self {
        self.compare(column, Comparisons::new().gt(value))
    }

    pub fn gte(self, column: C, value: impl Into<Value>) -> Self {
        self.compare(column, Comparisons::new().gte(value))
    }

    pub fn lt(self, column: C, value: impl Into<Value>) -> Self {
        self.compare(column, Comparisons::new().lt(value))
    }

    pub fn lte(self, column: C, value: impl Into<Value>) -> Self {
        self.compare(column, Comparisons::new().lte(value))
    }

    pub fn ne(self, column: C, value: impl Into<Value>) -> Self {
        self.compare(column, Comparisons::new().ne(value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Combine with another filter into an OR-group.
    pub fn or(self, other: Filter<C>) -> Predicate<C> {
        Predicate::Any(vec![self, other])
    }
}

/// A filter, or an OR-group of filters.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<C> {
    All(Filter<C>),
    Any(Vec<Filter<C>>),
}

impl<C: Column> Predicate<C> {
    /// A predicate that matches every row.
    pub fn all() -> Self {
        Predicate::All(Filter::new())
    }

    pub fn any(filters: impl IntoIterator<Item = Filter<C>>) -> Self {
        Predicate::Any(filters.into_iter().collect())
    }

    /// Extend an OR-group with another alternative.
    pub fn or(self, other: Filter<C>) -> Self {
        match self {
            Predicate::All(f) => Predicate::Any(vec![f, other]),
            Predicate::Any(mut fs) => {
                fs.push(other);
                Predicate::Any(fs)
            }
        }
    }
}

impl<C> From<Filter<C>> for Predicate<C> {
    fn from(filter: Filter<C>) -> Self {
        Predicate::All(filter)
    }
}

impl<C> From<Vec<Filter<C>>> for Predicate<C> {
    fn from(filters: Vec<Filter<C>>) -> Self {
        Predicate::Any(filters)
    }
}

/// Compile a predicate into WHERE text (without the keyword) and parameters.
pub fn compile<C: Column>(predicate: &Predicate<C>) -> Sql {
    match predicate {
        Predicate::All(filter) => compile_filter(filter),
        Predicate::Any(filters) if filters.is_empty() => Sql::new(ALWAYS_FALSE),
        Predicate::Any(filters) => Sql::join(
            filters.iter().map(|f| compile_filter(f).parenthesized()),
            " OR ",
        ),
    }
}

fn compile_filter<C: Column>(filter: &Filter<C>) -> Sql {
    let clause = Sql::join(
        filter
            .fields
            .iter()
            .map(|(column, condition)| compile_condition(&column.name(), condition)),
        " AND ",
    );
    if clause.is_empty() {
        Sql::new(ALWAYS_TRUE)
    } else {
        clause
    }
}

fn compile_condition(field: &str, condition: &Condition) -> Sql {
    match condition {
        Condition::Eq(value) => comparison(field, Cmp::Eq, value),
        Condition::AnyOf(values) => group(field, Cmp::Eq, values, " OR "),
        Condition::Compare(comparisons) => Sql::join(
            comparisons.ops.iter().map(|(op, operand)| match operand {
                Operand::One(value) => comparison(field, *op, value),
                Operand::Many(values) => group(field, *op, values, op.group_separator()),
            }),
            " AND ",
        ),
    }
}

fn comparison(field: &str, op: Cmp, value: &Value) -> Sql {
    let mut sql = Sql::new(format!("{field} {} ", op.as_sql()));
    sql.push_bind(value.clone());
    sql
}

/// A single value needs no parentheses. An empty list matches nothing,
/// except under `<>` where it excludes nothing.
fn group(field: &str, op: Cmp, values: &[Value], separator: &str) -> Sql {
    match values {
        [] if op == Cmp::Ne => Sql::new(ALWAYS_TRUE),
        [] => Sql::new(ALWAYS_FALSE),
        [value] => comparison(field, op, value),
        _ => Sql::join(
            values.iter().map(|v| comparison(field, op, v)),
            separator,
        )
        .parenthesized(),
    }
}
