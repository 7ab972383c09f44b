//! Capability seams between the core algorithms and their collaborators.
//!
//! - [`RemoteStore`]: query / fetch-next-page / batch-mutate against a record store
//! - [`QueryVisitor`]: renders a command's condition into a query statement
//! - [`DdlExtensions`]: optional hooks for table options, column options and constraints
//!
//! # Design Patterns
//!
//! - **Strategy**: stores, visitors and DDL hooks are interchangeable
//! - **Template Method**: `DdlExtensions` defaults are no-ops that backends override

use async_trait::async_trait;

use crate::error::Result;

use super::language::Literal;
use super::schema::{Column, Table};
use crate::mutation::MutationShape;

/// One page of identifiers returned by a paginated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPage {
    /// Record identifiers on this page, in store order.
    pub records: Vec<String>,
    /// Total number of records the query matches (hint).
    pub total_size: u64,
    /// True when no further pages exist.
    pub done: bool,
    /// Continuation token for the next page; `None` once done.
    pub cursor: Option<String>,
}

impl QueryPage {
    /// A terminal page.
    pub fn last(records: Vec<String>, total_size: u64) -> Self {
        Self {
            records,
            total_size,
            done: true,
            cursor: None,
        }
    }

    /// A page followed by more pages reachable through `cursor`.
    pub fn more(records: Vec<String>, total_size: u64, cursor: impl Into<String>) -> Self {
        Self {
            records,
            total_size,
            done: false,
            cursor: Some(cursor.into()),
        }
    }
}

/// Remote record store capability.
///
/// Each call is awaited to completion before the next one is issued; the
/// store never sees overlapping calls from a single command execution.
/// Transport failures are reported as `TranslateError::RemoteStore`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Issue a query and return its first page.
    async fn query(&self, statement: &str, page_size: usize) -> Result<QueryPage>;

    /// Fetch the page following the one that returned `cursor`.
    ///
    /// A cursor is bound to its originating query and is not valid after
    /// the page sequence reports `done`.
    async fn fetch_next_page(&self, cursor: &str, page_size: usize) -> Result<QueryPage>;

    /// Apply `shape` to every record in `ids`, returning the affected count.
    async fn batch_mutate(&self, shape: &MutationShape, ids: &[String]) -> Result<u64>;
}

/// Query-construction collaborator for a single command.
pub trait QueryVisitor: Send + Sync {
    /// Whether the command's condition is a single equality test against
    /// the identifier column.
    fn has_only_id_criteria(&self) -> bool;

    /// Query statement selecting the identifiers of all matching records.
    fn statement(&self) -> Result<String>;
}

/// A key/value option rendered inside an `OPTIONS (...)` clause.
///
/// Keys may use the `{uri}localName` form; a `None` value renders as `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct DdlOption {
    pub key: String,
    pub value: Option<Literal>,
}

impl DdlOption {
    pub fn new(key: impl Into<String>, value: Option<Literal>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Backend hooks called by the DDL emitter.
///
/// All methods default to emitting nothing.
pub trait DdlExtensions: Send + Sync {
    /// Options appended after the table body.
    fn table_options(&self, _table: &Table) -> Vec<DdlOption> {
        Vec::new()
    }

    /// Options appended after the common column options.
    fn column_options(&self, _table: &Table, _column: &Column) -> Vec<DdlOption> {
        Vec::new()
    }

    /// Rendered constraint clauses placed after the last column.
    fn constraints(&self, _table: &Table) -> Vec<String> {
        Vec::new()
    }
}

/// The default hook set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtensions;

impl DdlExtensions for NoExtensions {}
