//! Condition evaluation against stored records.
//!
//! Comparisons follow SQL three-valued logic collapsed to `false`: any test
//! involving `NULL` (other than `IS NULL`) does not match.

use std::cmp::Ordering;

use crate::core::language::{CompareOp, Condition, Expression, Literal};
use crate::error::{Result, TranslateError};

use super::Record;

/// Whether `record` satisfies `condition`. `id_column` names the column that
/// resolves to the record identifier.
pub fn evaluate(condition: &Condition, record: &Record, id_column: &str) -> Result<bool> {
    Ok(match condition {
        Condition::Comparison {
            left,
            operator,
            right,
        } => {
            let l = resolve(left, record, id_column);
            let r = resolve(right, record, id_column);
            compare(&l, &r).is_some_and(|ord| matches_op(*operator, ord))
        }
        Condition::And { conditions } => {
            for c in conditions {
                if !evaluate(c, record, id_column)? {
                    return Ok(false);
                }
            }
            true
        }
        Condition::Or { conditions } => {
            for c in conditions {
                if evaluate(c, record, id_column)? {
                    return Ok(true);
                }
            }
            false
        }
        Condition::Not { condition } => !evaluate(condition, record, id_column)?,
        Condition::In {
            expression,
            values,
            negated,
        } => {
            let v = resolve(expression, record, id_column);
            if v == Literal::Null {
                return Ok(false);
            }
            let found = values
                .iter()
                .any(|candidate| compare(&v, candidate) == Some(Ordering::Equal));
            found != *negated
        }
        Condition::IsNull {
            expression,
            negated,
        } => (resolve(expression, record, id_column) == Literal::Null) != *negated,
        Condition::Like {
            expression,
            pattern,
            negated,
        } => match resolve(expression, record, id_column) {
            Literal::String(s) => like(&s, pattern) != *negated,
            Literal::Null => false,
            other => {
                return Err(TranslateError::remote(
                    "query",
                    format!("LIKE requires a string operand, found {}", other),
                ))
            }
        },
    })
}

fn resolve(expression: &Expression, record: &Record, id_column: &str) -> Literal {
    match expression {
        Expression::Literal { value } => value.clone(),
        Expression::Column { name } if name.eq_ignore_ascii_case(id_column) => {
            Literal::String(record.id.clone())
        }
        Expression::Column { name } => record.field(name).cloned().unwrap_or(Literal::Null),
    }
}

fn compare(left: &Literal, right: &Literal) -> Option<Ordering> {
    match (left, right) {
        (Literal::Integer(a), Literal::Integer(b)) => Some(a.cmp(b)),
        (Literal::Float(a), Literal::Float(b)) => a.partial_cmp(b),
        (Literal::Integer(a), Literal::Float(b)) => (*a as f64).partial_cmp(b),
        (Literal::Float(a), Literal::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Literal::String(a), Literal::String(b)) => Some(a.cmp(b)),
        (Literal::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches_op(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
    }
}

/// SQL LIKE with `%` (any run) and `_` (one character).
///
/// Greedy match that backtracks only to the most recent `%`, so the cost is
/// bounded by `value.len() * pattern.len()`.
fn like(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();

    let (mut vi, mut pi) = (0, 0);
    // Pattern index just past the last `%`, and the value index it resumes from.
    let mut star: Option<(usize, usize)> = None;

    while vi < v.len() {
        match p.get(pi) {
            Some('%') => {
                pi += 1;
                star = Some((pi, vi));
            }
            Some('_') => {
                vi += 1;
                pi += 1;
            }
            Some(c) if *c == v[vi] => {
                vi += 1;
                pi += 1;
            }
            _ => match star {
                Some((sp, sv)) => {
                    pi = sp;
                    vi = sv + 1;
                    star = Some((sp, sv + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}
