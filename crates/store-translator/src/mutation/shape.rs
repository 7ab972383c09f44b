//! The field/value set a batch mutate call applies to each identifier.

use crate::core::language::{Command, CommandKind, SetClause};
use crate::error::{Result, TranslateError};

/// What a batch mutate call does to each record it names.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationShape {
    Update {
        table: String,
        values: Vec<SetClause>,
    },
    Delete { table: String },
}

impl MutationShape {
    /// Derive the shape from a logical command.
    ///
    /// # Errors
    ///
    /// Inserts do not resolve existing identifiers and are rejected with
    /// `TranslateError::Translation`, as are updates with no assignments.
    pub fn from_command(command: &Command) -> Result<Self> {
        match &command.kind {
            CommandKind::Update { values } if values.is_empty() => Err(
                TranslateError::translation(format!(
                    "Update of {} has no SET values",
                    command.table
                )),
            ),
            CommandKind::Update { values } => Ok(MutationShape::Update {
                table: command.table.clone(),
                values: values.clone(),
            }),
            CommandKind::Delete => Ok(MutationShape::Delete {
                table: command.table.clone(),
            }),
            CommandKind::Insert { .. } => Err(TranslateError::translation(format!(
                "Insert into {} cannot be executed as an identifier-batched mutation",
                command.table
            ))),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            MutationShape::Update { table, .. } | MutationShape::Delete { table } => table,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            MutationShape::Update { .. } => "update",
            MutationShape::Delete { .. } => "delete",
        }
    }
}
