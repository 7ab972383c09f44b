//! Logical command and predicate model.
//!
//! A [`Command`] names a target table, an operation ([`CommandKind`]) and an
//! optional [`Condition`] tree. The batcher only inspects the tree to decide
//! whether it is a single identifier equality test; everything else is
//! rendered into a query statement by a [`QueryVisitor`](crate::core::QueryVisitor).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant value appearing in a condition, a SET clause or a DDL option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    /// Render as a SQL literal constant.
    ///
    /// Strings are single-quoted with embedded quotes doubled.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Boolean(true) => "TRUE".to_string(),
            Literal::Boolean(false) => "FALSE".to_string(),
            Literal::Integer(v) => v.to_string(),
            Literal::Float(v) => v.to_string(),
            Literal::String(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Integer(v as i64)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Boolean(v)
    }
}

/// Operand of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Column { name: String },
    Literal { value: Literal },
}

impl Expression {
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column { name: name.into() }
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Expression::Literal {
            value: value.into(),
        }
    }

    /// Column name if this expression is a column reference.
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Expression::Column { name } => Some(name),
            Expression::Literal { .. } => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column { name } => f.write_str(name),
            Expression::Literal { value } => write!(f, "{}", value),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Predicate tree of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Comparison {
        left: Expression,
        operator: CompareOp,
        right: Expression,
    },
    And {
        conditions: Vec<Condition>,
    },
    Or {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
    In {
        expression: Expression,
        values: Vec<Literal>,
        #[serde(default)]
        negated: bool,
    },
    IsNull {
        expression: Expression,
        #[serde(default)]
        negated: bool,
    },
    Like {
        expression: Expression,
        pattern: String,
        #[serde(default)]
        negated: bool,
    },
}

impl Condition {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Condition::compare(column, CompareOp::Eq, value)
    }

    /// `column <op> value`
    pub fn compare(
        column: impl Into<String>,
        operator: CompareOp,
        value: impl Into<Literal>,
    ) -> Self {
        Condition::Comparison {
            left: Expression::column(column),
            operator,
            right: Expression::literal(value),
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And { conditions }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or { conditions }
    }

    /// Short name of the predicate kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Condition::Comparison { .. } => "comparison",
            Condition::And { .. } => "and",
            Condition::Or { .. } => "or",
            Condition::Not { .. } => "not",
            Condition::In { .. } => "in",
            Condition::IsNull { .. } => "is-null",
            Condition::Like { .. } => "like",
        }
    }
}

fn join_conditions(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str(")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison {
                left,
                operator,
                right,
            } => write!(f, "{} {} {}", left, operator.as_str(), right),
            Condition::And { conditions } => join_conditions(f, conditions, "AND"),
            Condition::Or { conditions } => join_conditions(f, conditions, "OR"),
            Condition::Not { condition } => write!(f, "NOT ({})", condition),
            Condition::In {
                expression,
                values,
                negated,
            } => {
                let list = values
                    .iter()
                    .map(Literal::to_sql_literal)
                    .collect::<Vec<_>>()
                    .join(", ");
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}IN ({})", expression, not, list)
            }
            Condition::IsNull {
                expression,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} IS {}NULL", expression, not)
            }
            Condition::Like {
                expression,
                pattern,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(
                    f,
                    "{} {}LIKE {}",
                    expression,
                    not,
                    Literal::String(pattern.clone())
                )
            }
        }
    }
}

/// One `column = value` assignment of an update or insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
    pub column: String,
    pub value: Literal,
}

impl SetClause {
    pub fn new(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Operation carried by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandKind {
    Update { values: Vec<SetClause> },
    Delete,
    Insert { values: Vec<SetClause> },
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Update { .. } => "update",
            CommandKind::Delete => "delete",
            CommandKind::Insert { .. } => "insert",
        }
    }
}

/// A logical update/delete/insert against one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub table: String,
    #[serde(flatten)]
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Command {
    pub fn update(
        table: impl Into<String>,
        values: Vec<SetClause>,
        condition: Option<Condition>,
    ) -> Self {
        Self {
            table: table.into(),
            kind: CommandKind::Update { values },
            condition,
        }
    }

    pub fn delete(table: impl Into<String>, condition: Option<Condition>) -> Self {
        Self {
            table: table.into(),
            kind: CommandKind::Delete,
            condition,
        }
    }
}
