//! Core abstractions shared by the mutation batcher and the DDL emitter.
//!
//! - [`language`]: command and predicate model
//! - [`schema`]: table, column and datatype metadata
//! - [`identifier`]: identifier validation and escaping
//! - [`traits`]: capability seams (remote store, query visitor, DDL hooks)
//!
//! # Architecture
//!
//! The core module defines collaborator-agnostic types. The remote store is
//! only ever seen through [`RemoteStore`]; query rendering through
//! [`QueryVisitor`]. This keeps the batching algorithm testable with mock
//! stores and lets a backend swap in its own query dialect.

pub mod identifier;
pub mod language;
pub mod schema;
pub mod traits;

pub use language::{Command, CommandKind, CompareOp, Condition, Expression, Literal, SetClause};
pub use schema::{Column, Constraint, ConstraintKind, Datatype, DatatypeKind, NullType, Table};
pub use traits::{DdlExtensions, DdlOption, NoExtensions, QueryPage, QueryVisitor, RemoteStore};
