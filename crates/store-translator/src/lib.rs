//! # store-translator
//!
//! Translation core for page-limited remote record stores.
//!
//! This library provides:
//!
//! - **Batched mutations**: update/delete commands resolved to record
//!   identifiers (directly, or by following a paginated query's cursors)
//!   and dispatched in mutate calls that respect the store's ceilings
//! - **Foreign-table DDL** rendered from a table model, with identifier
//!   escaping and option-key namespace prefixes
//! - **Value ciphers** selected by configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use store_translator::{Command, Condition, Config, InMemoryStore, MutationBatcher, SetClause};
//!
//! #[tokio::main]
//! async fn main() -> store_translator::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let limits = config.store.limits()?;
//!     let store = Arc::new(InMemoryStore::new(limits));
//!
//!     let command = Command::update(
//!         "Account",
//!         vec![SetClause::new("Rating", "Hot")],
//!         Some(Condition::eq("Industry", "Energy")),
//!     );
//!     store.register_command(&command).await?;
//!
//!     let batcher = MutationBatcher::new(store, limits);
//!     let affected = batcher.execute_command(&command).await?;
//!     println!("Updated {} records", affected);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod crypto;
pub mod ddl;
pub mod error;
pub mod mutation;
pub mod query;
pub mod store;

// Re-exports for convenient access
pub use config::{Config, CryptoConfig, CryptoMode, StoreConfig};
pub use crate::core::{
    Column, Command, CommandKind, CompareOp, Condition, DdlExtensions, DdlOption, Expression,
    Literal, NoExtensions, QueryPage, QueryVisitor, RemoteStore, SetClause, Table,
};
pub use crypto::{Cryptor, CryptorImpl};
pub use ddl::{ddl_string, DdlEmitter, DdlOptions, NamespacePrefixTable};
pub use error::{Result, TranslateError};
pub use mutation::{BatchLimits, MutationBatcher, MutationShape, MutationStats};
pub use query::IdQueryBuilder;
pub use store::{Dataset, InMemoryStore, Record};
