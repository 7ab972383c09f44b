//! In-memory reference implementation of [`RemoteStore`].
//!
//! [`InMemoryStore`] behaves like a page-limited record store:
//!
//! - query statements must be registered up front (the store does not parse
//!   query text); each registration records the table and condition the
//!   statement selects
//! - a query snapshots the matching identifiers and serves them at most
//!   `page_size` at a time, handing out a single-use cursor of the form
//!   `<query-token>-<offset>` while more remain; issuing a query closes
//!   every cursor left open by earlier queries
//! - mutate calls larger than the store's mutate ceiling are refused
//! - mutate call `n` can be made to fail for fault-injection tests
//!
//! Every call is appended to a history that tests can inspect.

mod eval;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::language::{Command, Condition, Literal};
use crate::core::traits::{QueryPage, QueryVisitor, RemoteStore};
use crate::error::{Result, TranslateError};
use crate::mutation::{BatchLimits, MutationShape};
use crate::query::{IdQueryBuilder, DEFAULT_ID_COLUMN};

pub use eval::evaluate;

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Literal>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Field lookup by name (case-insensitive).
    pub fn field(&self, name: &str) -> Option<&Literal> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

/// Seed data: records grouped by table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Record>>,
}

impl Dataset {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// A call observed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Query {
        statement: String,
        page_size: usize,
    },
    FetchNextPage {
        cursor: String,
        page_size: usize,
    },
    BatchMutate {
        kind: &'static str,
        table: String,
        ids: Vec<String>,
    },
}

#[derive(Debug, Clone)]
struct RegisteredQuery {
    table: String,
    condition: Option<Condition>,
}

#[derive(Debug)]
struct OpenCursor {
    ids: Arc<Vec<String>>,
    offset: usize,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, Vec<Record>>,
    statements: HashMap<String, RegisteredQuery>,
    cursors: HashMap<String, OpenCursor>,
    next_token: u64,
    mutate_calls: usize,
    fail_on_mutate_call: Option<usize>,
    calls: Vec<StoreCall>,
}

impl State {
    fn table_mut(&mut self, name: &str) -> Option<&mut Vec<Record>> {
        self.tables
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    fn table(&self, name: &str) -> Option<&Vec<Record>> {
        self.tables
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Serve the page starting at `offset`, opening a cursor if more remain.
    fn serve(
        &mut self,
        token: &str,
        ids: Arc<Vec<String>>,
        offset: usize,
        page_size: usize,
    ) -> QueryPage {
        let total = ids.len();
        let end = (offset + page_size).min(total);
        let records = ids[offset..end].to_vec();
        if end >= total {
            QueryPage::last(records, total as u64)
        } else {
            let cursor = format!("{}-{}", token, end);
            self.cursors.insert(
                cursor.clone(),
                OpenCursor {
                    ids,
                    offset: end,
                },
            );
            QueryPage::more(records, total as u64, cursor)
        }
    }
}

/// Reference record store held in memory.
pub struct InMemoryStore {
    limits: BatchLimits,
    id_column: String,
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Create an empty store enforcing `limits` as its ceilings.
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    /// Seed with every table of `dataset`.
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.state.get_mut().tables.extend(dataset.tables);
        self
    }

    /// Seed one table.
    pub fn with_table(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.state.get_mut().tables.insert(name.into(), records);
        self
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    /// Make the `n`th mutate call (1-based) fail with a remote error.
    pub fn fail_on_mutate_call(mut self, n: usize) -> Self {
        self.state.get_mut().fail_on_mutate_call = Some(n);
        self
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Register `statement` as selecting the ids of `table` rows matching
    /// `condition`.
    pub async fn register_query(
        &self,
        statement: impl Into<String>,
        table: impl Into<String>,
        condition: Option<Condition>,
    ) {
        let mut state = self.state.lock().await;
        state.statements.insert(
            statement.into(),
            RegisteredQuery {
                table: table.into(),
                condition,
            },
        );
    }

    /// Register the identifier query [`IdQueryBuilder`] renders for
    /// `command`, returning the statement text.
    pub async fn register_command(&self, command: &Command) -> Result<String> {
        let statement = IdQueryBuilder::new(command, &self.id_column).statement()?;
        self.register_query(
            statement.clone(),
            command.table.clone(),
            command.condition.clone(),
        )
        .await;
        Ok(statement)
    }

    /// Snapshot of the call history.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    /// Sizes of every mutate call issued so far, in order.
    pub async fn mutate_sizes(&self) -> Vec<usize> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|c| match c {
                StoreCall::BatchMutate { ids, .. } => Some(ids.len()),
                _ => None,
            })
            .collect()
    }

    /// Current records of `table` (empty if unknown).
    pub async fn records(&self, table: &str) -> Vec<Record> {
        self.state
            .lock()
            .await
            .table(table)
            .cloned()
            .unwrap_or_default()
    }

    fn effective_page_size(&self, operation: &'static str, requested: usize) -> Result<usize> {
        if requested == 0 {
            return Err(TranslateError::remote(operation, "page size must be at least 1"));
        }
        Ok(requested.min(self.limits.page_size))
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn query(&self, statement: &str, page_size: usize) -> Result<QueryPage> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Query {
            statement: statement.to_string(),
            page_size,
        });
        let page_size = self.effective_page_size("query", page_size)?;

        let registered = state.statements.get(statement).cloned().ok_or_else(|| {
            TranslateError::remote("query", format!("unrecognized statement: {}", statement))
        })?;
        let records = state.table(&registered.table).ok_or_else(|| {
            TranslateError::remote("query", format!("no such table: {}", registered.table))
        })?;

        let mut ids = Vec::new();
        for record in records {
            let matched = match &registered.condition {
                Some(condition) => evaluate(condition, record, &self.id_column)?,
                None => true,
            };
            if matched {
                ids.push(record.id.clone());
            }
        }
        debug!("Query on {} matched {} records", registered.table, ids.len());

        if !state.cursors.is_empty() {
            debug!("Closing {} abandoned cursors", state.cursors.len());
            state.cursors.clear();
        }
        state.next_token += 1;
        let token = format!("q{}", state.next_token);
        Ok(state.serve(&token, Arc::new(ids), 0, page_size))
    }

    async fn fetch_next_page(&self, cursor: &str, page_size: usize) -> Result<QueryPage> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::FetchNextPage {
            cursor: cursor.to_string(),
            page_size,
        });
        let page_size = self.effective_page_size("fetch-next-page", page_size)?;

        // Cursors are single use: a page is served at most once per cursor.
        let open = state.cursors.remove(cursor).ok_or_else(|| {
            TranslateError::remote(
                "fetch-next-page",
                format!("unknown or exhausted cursor: {}", cursor),
            )
        })?;
        let token = cursor
            .rsplit_once('-')
            .map(|(token, _)| token.to_string())
            .unwrap_or_default();
        Ok(state.serve(&token, open.ids, open.offset, page_size))
    }

    async fn batch_mutate(&self, shape: &MutationShape, ids: &[String]) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::BatchMutate {
            kind: shape.kind_name(),
            table: shape.table().to_string(),
            ids: ids.to_vec(),
        });
        state.mutate_calls += 1;

        if ids.len() > self.limits.mutate_batch_size {
            return Err(TranslateError::remote(
                "batch-mutate",
                format!(
                    "{} ids exceeds the mutate limit of {}",
                    ids.len(),
                    self.limits.mutate_batch_size
                ),
            ));
        }
        if state.fail_on_mutate_call == Some(state.mutate_calls) {
            return Err(TranslateError::remote(
                "batch-mutate",
                format!("injected failure on call {}", state.mutate_calls),
            ));
        }

        let table = state.table_mut(shape.table()).ok_or_else(|| {
            TranslateError::remote("batch-mutate", format!("no such table: {}", shape.table()))
        })?;

        let mut affected = 0u64;
        match shape {
            MutationShape::Update { values, .. } => {
                for record in table.iter_mut().filter(|r| ids.contains(&r.id)) {
                    for clause in values {
                        record
                            .fields
                            .insert(clause.column.clone(), clause.value.clone());
                    }
                    affected += 1;
                }
            }
            MutationShape::Delete { .. } => {
                let before = table.len();
                table.retain(|r| !ids.contains(&r.id));
                affected = (before - table.len()) as u64;
            }
        }
        debug!("{} of {} ids affected on {}", affected, ids.len(), shape.table());
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::{CompareOp, SetClause};
    use crate::mutation::MutationBatcher;

    fn accounts(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let industry = if i % 2 == 0 { "Energy" } else { "Retail" };
                Record::new(format!("acc{:04}", i))
                    .with_field("Industry", industry)
                    .with_field("Employees", i as i64)
            })
            .collect()
    }

    fn store(n: usize, page_size: usize, batch_size: usize) -> InMemoryStore {
        InMemoryStore::new(BatchLimits::new(page_size, batch_size).unwrap())
            .with_table("Account", accounts(n))
    }

    #[tokio::test]
    async fn test_unregistered_statement_is_remote_error() {
        let store = store(3, 10, 10);
        let err = store.query("SELECT Id FROM Account", 10).await.unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_pages_and_cursor_format() {
        let store = store(5, 2, 10);
        let cmd = Command::delete("Account", None);
        let statement = store.register_command(&cmd).await.unwrap();

        let first = store.query(&statement, 2).await.unwrap();
        assert_eq!(first.records, vec!["acc0000", "acc0001"]);
        assert_eq!(first.total_size, 5);
        assert_eq!(first.cursor.as_deref(), Some("q1-2"));

        let second = store.fetch_next_page("q1-2", 2).await.unwrap();
        assert_eq!(second.cursor.as_deref(), Some("q1-4"));
        let third = store.fetch_next_page("q1-4", 2).await.unwrap();
        assert!(third.done);
        assert_eq!(third.records, vec!["acc0004"]);
    }

    #[tokio::test]
    async fn test_cursor_is_single_use() {
        let store = store(5, 2, 10);
        let statement = store
            .register_command(&Command::delete("Account", None))
            .await
            .unwrap();
        let first = store.query(&statement, 2).await.unwrap();
        let cursor = first.cursor.unwrap();

        store.fetch_next_page(&cursor, 2).await.unwrap();
        let err = store.fetch_next_page(&cursor, 2).await.unwrap_err();
        assert!(err.is_remote());
        assert!(store.fetch_next_page("q9-1", 2).await.is_err());
    }

    #[tokio::test]
    async fn test_requested_page_size_clamped_to_ceiling() {
        let store = store(10, 3, 10);
        let statement = store
            .register_command(&Command::delete("Account", None))
            .await
            .unwrap();
        let page = store.query(&statement, 2000).await.unwrap();
        assert_eq!(page.records.len(), 3);
    }

    #[tokio::test]
    async fn test_oversize_mutate_refused() {
        let store = store(10, 10, 2);
        let shape = MutationShape::Delete {
            table: "Account".into(),
        };
        let ids: Vec<String> = vec!["acc0000".into(), "acc0001".into(), "acc0002".into()];
        assert!(store.batch_mutate(&shape, &ids).await.unwrap_err().is_remote());
        assert_eq!(store.records("Account").await.len(), 10);
    }

    #[tokio::test]
    async fn test_update_applies_values_and_counts_found_ids() {
        let store = store(3, 10, 10);
        let shape = MutationShape::Update {
            table: "Account".into(),
            values: vec![SetClause::new("Rating", "Hot")],
        };
        let ids = vec!["acc0001".to_string(), "missing".to_string()];
        assert_eq!(store.batch_mutate(&shape, &ids).await.unwrap(), 1);

        let records = store.records("Account").await;
        assert_eq!(records[1].field("rating"), Some(&Literal::from("Hot")));
        assert_eq!(records[0].field("Rating"), None);
    }

    #[tokio::test]
    async fn test_batcher_against_store_450_records() {
        let store = Arc::new(store(450, 2000, 200));
        let cmd = Command::update(
            "Account",
            vec![SetClause::new("Rating", "Warm")],
            Some(Condition::compare("Employees", CompareOp::Ge, 0)),
        );
        store.register_command(&cmd).await.unwrap();

        let batcher = MutationBatcher::new(store.clone(), store.limits());
        let affected = batcher.execute_command(&cmd).await.unwrap();

        assert_eq!(affected, 450);
        assert_eq!(store.mutate_sizes().await, vec![200, 200, 50]);
    }

    #[tokio::test]
    async fn test_batcher_deletes_across_pages() {
        let store = Arc::new(store(25, 4, 3));
        let cmd = Command::delete("Account", Some(Condition::eq("Industry", "Energy")));
        store.register_command(&cmd).await.unwrap();

        let batcher = MutationBatcher::new(store.clone(), store.limits());
        let affected = batcher.execute_command(&cmd).await.unwrap();

        assert_eq!(affected, 13);
        let remaining = store.records("Account").await;
        assert_eq!(remaining.len(), 12);
        assert!(remaining
            .iter()
            .all(|r| r.field("Industry") == Some(&Literal::from("Retail"))));
    }

    #[tokio::test]
    async fn test_injected_failure_keeps_earlier_batches() {
        let store = Arc::new(store(450, 2000, 200).fail_on_mutate_call(2));
        let cmd = Command::delete("Account", None);
        store.register_command(&cmd).await.unwrap();

        let batcher = MutationBatcher::new(store.clone(), store.limits());
        let err = batcher.execute_command(&cmd).await.unwrap_err();

        assert!(err.is_remote());
        // First batch was applied and is not rolled back.
        assert_eq!(store.records("Account").await.len(), 250);
        assert_eq!(store.mutate_sizes().await, vec![200, 200]);
    }

    #[tokio::test]
    async fn test_id_only_path_never_queries() {
        let store = Arc::new(store(3, 10, 10));
        let cmd = Command::update(
            "Account",
            vec![SetClause::new("Rating", "Cold")],
            Some(Condition::eq("Id", "'acc0002'")),
        );

        let batcher = MutationBatcher::new(store.clone(), store.limits());
        assert_eq!(batcher.execute_command(&cmd).await.unwrap(), 1);

        let calls = store.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            StoreCall::BatchMutate { ids, .. } if ids == &vec!["acc0002".to_string()]
        ));
    }

    #[tokio::test]
    async fn test_new_query_closes_abandoned_cursors() {
        let store = Arc::new(store(30, 10, 5).fail_on_mutate_call(1));
        let cmd = Command::delete("Account", None);
        let statement = store.register_command(&cmd).await.unwrap();

        let batcher = MutationBatcher::new(store.clone(), store.limits());
        assert!(batcher.execute_command(&cmd).await.is_err());
        assert_eq!(store.state.lock().await.cursors.len(), 1);

        let page = store.query(&statement, 10).await.unwrap();
        assert_eq!(page.cursor.as_deref(), Some("q2-10"));
        assert_eq!(store.state.lock().await.cursors.len(), 1);
        assert!(store.fetch_next_page("q1-10", 10).await.unwrap_err().is_remote());
    }

    #[test]
    fn test_dataset_from_yaml() {
        let yaml = r#"
tables:
  Account:
    - id: "001"
      fields:
        Industry: Energy
        Employees: 12
    - id: "002"
"#;
        let dataset = Dataset::from_yaml(yaml).unwrap();
        let records = &dataset.tables["Account"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field("employees"), Some(&Literal::Integer(12)));
        assert!(records[1].fields.is_empty());
    }
}
