//! Parameter-safe SQL fragment builder.
//!
//! [`Sql`] keeps SQL text and bound values side by side so the parameter list
//! always mirrors the left-to-right order of placeholders. Fragments are
//! composed with [`Sql::join`], which only places separators *between*
//! fragments that already exist.
//!
//! # Example
//!
//! ```
//! use rowsmith::sql::{Placeholder, Sql};
//!
//! let mut a = Sql::new("a = ");
//! a.push_bind(1);
//! let mut b = Sql::new("b = ");
//! b.push_bind("x");
//!
//! let clause = Sql::join([a, b], " AND ");
//! assert_eq!(clause.to_sql(), "a = ? AND b = ?");
//! assert_eq!(clause.render(Placeholder::Numbered), "a = $1 AND b = $2");
//! assert_eq!(clause.params().len(), 2);
//! ```

use crate::temporal;
use crate::value::Value;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Param,
}

/// Placeholder syntax understood by a storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// Positional `?` (SQLite, MySQL).
    #[default]
    Question,
    /// Numbered `$1, $2, ...` (PostgreSQL).
    Numbered,
}

/// A SQL fragment with its bound parameters.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

impl Sql {
    /// Create a new fragment with initial raw SQL.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let mut sql = Self::empty();
        sql.push(&initial_sql.into());
        sql
    }

    /// Create an empty fragment.
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    ///
    /// Timestamps are bound as canonical temporal text.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(temporal::encode_value(value.into()));
        self
    }

    /// Append another fragment, consuming it.
    pub fn push_sql(&mut self, mut other: Sql) -> &mut Self {
        for part in other.parts.drain(..) {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.append(&mut other.params);
        self
    }

    /// Join fragments with `separator`, skipping empty fragments.
    pub fn join(fragments: impl IntoIterator<Item = Sql>, separator: &str) -> Sql {
        let mut out = Sql::empty();
        for fragment in fragments.into_iter().filter(|f| !f.is_empty()) {
            if !out.is_empty() {
                out.push(separator);
            }
            out.push_sql(fragment);
        }
        out
    }

    /// Wrap the fragment in parentheses.
    pub fn parenthesized(self) -> Sql {
        let mut out = Sql::new("(");
        out.push_sql(self);
        out.push(")");
        out
    }

    /// `true` when no text and no placeholders have been added.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Consume the fragment, returning its parameters.
    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Render with `?` placeholders.
    pub fn to_sql(&self) -> String {
        self.render(Placeholder::Question)
    }

    /// Render with the given placeholder style.
    pub fn render(&self, placeholder: Placeholder) -> String {
        let mut out = String::new();
        let mut idx = 0usize;
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    match placeholder {
                        Placeholder::Question => out.push('?'),
                        Placeholder::Numbered => {
                            let _ = write!(out, "${idx}");
                        }
                    }
                }
            }
        }
        out
    }
}
