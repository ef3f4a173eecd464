//! Update descriptors and their compilation into SET fragments.
//!
//! # Example
//! ```
//! use rowsmith::mutation::{self, Mutation};
//!
//! let m = Mutation::new().set("username", "alice").increment("visits", 1);
//! let sql = mutation::compile(&m).unwrap();
//! assert_eq!(sql.to_sql(), "username = ?, visits = visits + ?");
//! ```

use crate::entity::Column;
use crate::error::{Error, Result};
use crate::sql::Sql;
use crate::value::{Number, Value};
use std::collections::BTreeMap;

/// Numeric update operator, declared in compile order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdateOp {
    /// `field = ?`
    Set,
    /// `field = field + ?`
    Increment,
    /// `field = field - ?`
    Decrement,
    /// `field = field * ?`
    Multiply,
    /// `field = field / ?`
    Divide,
}

impl UpdateOp {
    fn arithmetic(self) -> Option<&'static str> {
        match self {
            UpdateOp::Set => None,
            UpdateOp::Increment => Some("+"),
            UpdateOp::Decrement => Some("-"),
            UpdateOp::Multiply => Some("*"),
            UpdateOp::Divide => Some("/"),
        }
    }
}

/// Operator map for one numeric field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOps {
    ops: BTreeMap<UpdateOp, Number>,
}

impl UpdateOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, op: UpdateOp, operand: impl Into<Number>) -> Self {
        self.ops.insert(op, operand.into());
        self
    }

    pub fn set(self, operand: impl Into<Number>) -> Self {
        self.with(UpdateOp::Set, operand)
    }

    pub fn increment(self, operand: impl Into<Number>) -> Self {
        self.with(UpdateOp::Increment, operand)
    }

    pub fn decrement(self, operand: impl Into<Number>) -> Self {
        self.with(UpdateOp::Decrement, operand)
    }

    pub fn multiply(self, operand: impl Into<Number>) -> Self {
        self.with(UpdateOp::Multiply, operand)
    }

    pub fn divide(self, operand: impl Into<Number>) -> Self {
        self.with(UpdateOp::Divide, operand)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// New content for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// Literal replacement.
    Value(Value),
    /// Numeric operators applied to the current value.
    Ops(UpdateOps),
}

/// A field → assignment map.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<C> {
    fields: Vec<(C, Assignment)>,
}

impl<C> Default for Mutation<C> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<C: Column> Mutation<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the assignment for `column`, replacing a previous one in place.
    pub fn assign(mut self, column: C, assignment: Assignment) -> Self {
        let name = column.name();
        match self.fields.iter_mut().find(|(c, _)| c.name() == name) {
            Some((_, slot)) => *slot = assignment,
            None => self.fields.push((column, assignment)),
        }
        self
    }

    /// Replace the value of `column`.
    pub fn set(self, column: C, value: impl Into<Value>) -> Self {
        self.assign(column, Assignment::Value(value.into()))
    }

    /// Apply numeric operators to `column`, merging with operators already
    /// given for it.
    pub fn apply(mut self, column: C, ops: UpdateOps) -> Self {
        let name = column.name();
        if let Some((_, Assignment::Ops(existing))) =
            self.fields.iter_mut().find(|(c, _)| c.name() == name)
        {
            existing.ops.extend(ops.ops);
            return self;
        }
        self.assign(column, Assignment::Ops(ops))
    }

    pub fn increment(self, column: C, by: impl Into<Number>) -> Self {
        self.apply(column, UpdateOps::new().increment(by))
    }

    pub fn decrement(self, column: C, by: impl Into<Number>) -> Self {
        self.apply(column, UpdateOps::new().decrement(by))
    }

    pub fn multiply(self, column: C, by: impl Into<Number>) -> Self {
        self.apply(column, UpdateOps::new().multiply(by))
    }

    pub fn divide(self, column: C, by: impl Into<Number>) -> Self {
        self.apply(column, UpdateOps::new().divide(by))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Compile a mutation into SET text (without the keyword) and parameters.
///
/// Fields with an empty operator map are left out; if nothing remains the
/// mutation is rejected before it can reach the storage engine.
pub fn compile<C: Column>(mutation: &Mutation<C>) -> Result<Sql> {
    let set = Sql::join(
        mutation
            .fields
            .iter()
            .map(|(column, assignment)| compile_assignment(&column.name(), assignment)),
        ", ",
    );
    if set.is_empty() {
        return Err(Error::configuration(
            "update requires at least one assignment",
        ));
    }
    Ok(set)
}

fn compile_assignment(field: &str, assignment: &Assignment) -> Sql {
    match assignment {
        Assignment::Value(value) => {
            let mut sql = Sql::new(format!("{field} = "));
            sql.push_bind(value.clone());
            sql
        }
        Assignment::Ops(ops) => Sql::join(
            ops.ops.iter().map(|(op, operand)| {
                let mut sql = match op.arithmetic() {
                    None => Sql::new(format!("{field} = ")),
                    Some(symbol) => Sql::new(format!("{field} = {field} {symbol} ")),
                };
                sql.push_bind(*operand);
                sql
            }),
            ", ",
        ),
    }
}
