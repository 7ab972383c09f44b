//! Default query visitor.
//!
//! [`IdQueryBuilder`] renders a command into a statement that selects the
//! identifier column of every matching record:
//!
//! ```text
//! SELECT Id FROM Account WHERE (Industry = 'Energy' AND Rating = 'Cold')
//! ```
//!
//! It also decides whether the command qualifies for the ID-only fast path.

use crate::core::identifier::validate_identifier;
use crate::core::language::{Command, CompareOp, Condition};
use crate::core::traits::QueryVisitor;
use crate::error::Result;

/// Default identifier column name.
pub const DEFAULT_ID_COLUMN: &str = "Id";

/// Builds the identifier-selecting query for a command.
#[derive(Debug, Clone)]
pub struct IdQueryBuilder<'a> {
    command: &'a Command,
    id_column: &'a str,
}

impl<'a> IdQueryBuilder<'a> {
    pub fn new(command: &'a Command, id_column: &'a str) -> Self {
        Self { command, id_column }
    }
}

/// Whether `condition` is an equality test whose left side is `id_column`.
///
/// The right side is not inspected here; extracting a usable value from it
/// is the batcher's job and fails loudly for non-literal operands.
pub fn is_id_equality(condition: &Condition, id_column: &str) -> bool {
    match condition {
        Condition::Comparison {
            left,
            operator: CompareOp::Eq,
            ..
        } => left
            .as_column()
            .is_some_and(|name| name.eq_ignore_ascii_case(id_column)),
        _ => false,
    }
}

impl QueryVisitor for IdQueryBuilder<'_> {
    fn has_only_id_criteria(&self) -> bool {
        self.command
            .condition
            .as_ref()
            .is_some_and(|c| is_id_equality(c, self.id_column))
    }

    fn statement(&self) -> Result<String> {
        validate_identifier(&self.command.table)?;
        validate_identifier(self.id_column)?;

        let mut sql = format!("SELECT {} FROM {}", self.id_column, self.command.table);
        if let Some(ref condition) = self.command.condition {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.to_string());
        }
        Ok(sql)
    }
}
