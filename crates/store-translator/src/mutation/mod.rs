//! Identifier-batched update/delete execution.
//!
//! [`MutationBatcher`] turns a logical update or delete into calls against a
//! [`RemoteStore`] whose API caps both the records per query page and the
//! identifiers per mutate call:
//!
//! 1. If the query visitor reports ID-only criteria, the identifier literal is
//!    extracted from the condition and mutated with a single call.
//! 2. Otherwise the identifier query is paged through, identifiers are
//!    buffered, and every full buffer of `mutate_batch_size` ids is flushed
//!    as one mutate call. A short final batch flushes whatever remains.
//!
//! # Partial effects
//!
//! The store offers no atomicity across mutate calls. When a batch fails,
//! earlier batches have already been applied remotely, yet the operation as
//! a whole returns the error and no count. Callers that retry must tolerate
//! re-applying those batches.

mod pages;
mod shape;

pub use pages::pages;
pub use shape::MutationShape;

use std::sync::Arc;

use futures::{pin_mut, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::identifier::strip_quotes;
use crate::core::language::{Command, CompareOp, Condition, Expression, Literal};
use crate::core::traits::{QueryVisitor, RemoteStore};
use crate::error::{Result, TranslateError};
use crate::query::{IdQueryBuilder, DEFAULT_ID_COLUMN};

/// Records per query page accepted by the store.
pub const DEFAULT_PAGE_SIZE: usize = 2000;

/// Identifiers per mutate call accepted by the store.
pub const DEFAULT_MUTATE_BATCH_SIZE: usize = 200;

/// Store-imposed ceilings. The two are independent: the page size need not
/// be a multiple of the mutate batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub page_size: usize,
    pub mutate_batch_size: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            mutate_batch_size: DEFAULT_MUTATE_BATCH_SIZE,
        }
    }
}

impl BatchLimits {
    /// Create limits, rejecting zero ceilings.
    pub fn new(page_size: usize, mutate_batch_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(TranslateError::Config("page_size must be at least 1".into()));
        }
        if mutate_batch_size == 0 {
            return Err(TranslateError::Config("mutate_batch_size must be at least 1".into()));
        }
        Ok(Self {
            page_size,
            mutate_batch_size,
        })
    }
}

/// Counters for one command execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MutationStats {
    /// Sum of affected counts returned by every mutate call.
    pub affected: u64,
    /// Mutate calls issued.
    pub batches: usize,
    /// Query pages consumed (0 on the ID-only path).
    pub pages: usize,
    /// Identifiers dispatched across all batches.
    pub identifiers: usize,
}

/// Extract the identifier from an ID-only condition.
///
/// The condition must be `<id_column> = <literal>`. String literals lose one
/// pair of surrounding quotes; integer literals are rendered in decimal.
///
/// # Errors
///
/// Any other shape is a translation-layer fault and returns
/// `TranslateError::Translation`; it is never treated as a general query.
pub fn classify_id_only(condition: Option<&Condition>, id_column: &str) -> Result<String> {
    let condition = condition.ok_or_else(|| {
        TranslateError::translation("ID-only criteria requires a condition")
    })?;

    let Condition::Comparison {
        left,
        operator,
        right,
    } = condition
    else {
        return Err(TranslateError::translation(format!(
            "ID-only criteria must be a comparison, found {} condition: {}",
            condition.kind_name(),
            condition
        )));
    };

    if *operator != CompareOp::Eq {
        return Err(TranslateError::translation(format!(
            "ID-only criteria must be an equality test, found: {}",
            condition
        )));
    }

    match left.as_column() {
        Some(name) if name.eq_ignore_ascii_case(id_column) => {}
        _ => {
            return Err(TranslateError::translation(format!(
                "ID-only criteria must test the {} column, found: {}",
                id_column, condition
            )))
        }
    }

    match right {
        Expression::Literal {
            value: Literal::String(s),
        } => Ok(strip_quotes(s).to_string()),
        Expression::Literal {
            value: Literal::Integer(v),
        } => Ok(v.to_string()),
        other => Err(TranslateError::translation(format!(
            "ID-only criteria must compare {} against a string or integer literal, found: {}",
            id_column, other
        ))),
    }
}

/// Executes update/delete commands against a page-limited remote store.
///
/// Every remote call is awaited before the next one is issued. Each call to
/// [`execute`](Self::execute) owns its own buffer and running count.
pub struct MutationBatcher {
    store: Arc<dyn RemoteStore>,
    limits: BatchLimits,
    id_column: String,
}

impl MutationBatcher {
    pub fn new(store: Arc<dyn RemoteStore>, limits: BatchLimits) -> Self {
        Self {
            store,
            limits,
            id_column: DEFAULT_ID_COLUMN.to_string(),
        }
    }

    /// Use a different identifier column name.
    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Execute `command` with the default [`IdQueryBuilder`] visitor.
    pub async fn execute_command(&self, command: &Command) -> Result<u64> {
        let visitor = IdQueryBuilder::new(command, &self.id_column);
        self.execute(command, &visitor).await
    }

    /// Execute `command`, returning the total affected-record count.
    pub async fn execute(&self, command: &Command, visitor: &dyn QueryVisitor) -> Result<u64> {
        Ok(self.execute_with_stats(command, visitor).await?.affected)
    }

    /// Execute `command`, returning per-execution counters.
    #[instrument(skip_all, fields(table = %command.table, kind = command.kind.name()))]
    pub async fn execute_with_stats(
        &self,
        command: &Command,
        visitor: &dyn QueryVisitor,
    ) -> Result<MutationStats> {
        let shape = MutationShape::from_command(command)?;
        let mut stats = MutationStats::default();

        if visitor.has_only_id_criteria() {
            let id = classify_id_only(command.condition.as_ref(), &self.id_column)?;
            debug!("ID-only criteria, mutating {} directly", id);
            self.dispatch(&shape, &[id], &mut stats).await?;
        } else {
            let statement = visitor.statement()?;
            self.execute_paged(&shape, statement, &mut stats).await?;
        }

        info!(
            "{} on {} affected {} records in {} batches",
            shape.kind_name(),
            shape.table(),
            stats.affected,
            stats.batches
        );
        Ok(stats)
    }

    async fn execute_paged(
        &self,
        shape: &MutationShape,
        statement: String,
        stats: &mut MutationStats,
    ) -> Result<()> {
        let batch_size = self.limits.mutate_batch_size;
        let stream = pages(self.store.as_ref(), statement, self.limits.page_size);
        pin_mut!(stream);

        let mut pending: Vec<String> = Vec::with_capacity(batch_size);
        while let Some(page) = stream.try_next().await? {
            stats.pages += 1;
            debug!(
                "Page {}: {} records (total {}, done {})",
                stats.pages,
                page.records.len(),
                page.total_size,
                page.done
            );
            for id in page.records {
                pending.push(id);
                if pending.len() == batch_size {
                    let batch = std::mem::replace(&mut pending, Vec::with_capacity(batch_size));
                    self.dispatch(shape, &batch, stats).await?;
                }
            }
        }

        if !pending.is_empty() {
            self.dispatch(shape, &pending, stats).await?;
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        shape: &MutationShape,
        ids: &[String],
        stats: &mut MutationStats,
    ) -> Result<()> {
        debug!("Dispatching batch of {} ids", ids.len());
        let affected = self.store.batch_mutate(shape, ids).await?;
        stats.affected += affected;
        stats.batches += 1;
        stats.identifiers += ids.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::SetClause;
    use crate::core::traits::QueryPage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Query(String),
        More(String),
        Mutate(Vec<String>),
    }

    /// Paged mock: serves `total` ids in pages of at most `page_size`, with
    /// cursor `cur-<offset>`. Mutate call number `fail_on` (1-based) fails.
    /// When `script` is set, page n is served for cursor `cur-<n>` instead.
    struct MockStore {
        total: usize,
        script: Vec<QueryPage>,
        calls: Mutex<Vec<Call>>,
        fail_on: Option<usize>,
    }

    impl MockStore {
        fn new(total: usize) -> Self {
            Self {
                total,
                script: Vec::new(),
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn scripted(pages: Vec<QueryPage>) -> Self {
            Self {
                script: pages,
                ..Self::new(0)
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on = Some(call);
            self
        }

        fn page_from(&self, offset: usize, page_size: usize) -> QueryPage {
            if let Some(page) = self.script.get(offset) {
                return page.clone();
            }
            let end = (offset + page_size).min(self.total);
            let records = (offset..end).map(|i| format!("id{}", i)).collect();
            if end >= self.total {
                QueryPage::last(records, self.total as u64)
            } else {
                QueryPage::more(records, self.total as u64, format!("cur-{}", end))
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn mutate_sizes(&self) -> Vec<usize> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Mutate(ids) => Some(ids.len()),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl RemoteStore for MockStore {
        async fn query(&self, statement: &str, page_size: usize) -> Result<QueryPage> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Query(statement.to_string()));
            Ok(self.page_from(0, page_size))
        }

        async fn fetch_next_page(&self, cursor: &str, page_size: usize) -> Result<QueryPage> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::More(cursor.to_string()));
            let offset: usize = cursor
                .strip_prefix("cur-")
                .and_then(|o| o.parse().ok())
                .ok_or_else(|| TranslateError::remote("fetch-next-page", "bad cursor"))?;
            Ok(self.page_from(offset, page_size))
        }

        async fn batch_mutate(&self, _shape: &MutationShape, ids: &[String]) -> Result<u64> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(Call::Mutate(ids.to_vec()));
                calls.iter().filter(|c| matches!(c, Call::Mutate(_))).count()
            };
            if self.fail_on == Some(n) {
                return Err(TranslateError::remote("batch-mutate", "write limit exceeded"));
            }
            Ok(ids.len() as u64)
        }
    }

    /// Visitor that claims ID-only criteria regardless of the condition.
    struct AlwaysIdOnly;

    impl QueryVisitor for AlwaysIdOnly {
        fn has_only_id_criteria(&self) -> bool {
            true
        }

        fn statement(&self) -> Result<String> {
            unreachable!("ID-only path never builds a statement")
        }
    }

    fn update(condition: Option<Condition>) -> Command {
        Command::update("Account", vec![SetClause::new("Rating", "Hot")], condition)
    }

    fn batcher(store: Arc<MockStore>, page_size: usize, batch_size: usize) -> MutationBatcher {
        MutationBatcher::new(store, BatchLimits::new(page_size, batch_size).unwrap())
    }

    // =========================================================================
    // ID-only fast path
    // =========================================================================

    #[tokio::test]
    async fn test_id_only_single_mutate_no_query() {
        let store = Arc::new(MockStore::new(0));
        let b = batcher(store.clone(), 2000, 200);
        let cmd = update(Some(Condition::eq("Id", "'001A000001'")));

        let affected = b.execute_command(&cmd).await.unwrap();

        assert_eq!(affected, 1);
        assert_eq!(store.calls(), vec![Call::Mutate(vec!["001A000001".into()])]);
    }

    #[tokio::test]
    async fn test_id_only_integer_literal() {
        let store = Arc::new(MockStore::new(0));
        let b = batcher(store.clone(), 2000, 200);
        let cmd = Command::delete("Account", Some(Condition::eq("Id", 42)));
        b.execute_command(&cmd).await.unwrap();
        assert_eq!(store.calls(), vec![Call::Mutate(vec!["42".into()])]);
    }

    #[tokio::test]
    async fn test_id_only_mismatch_is_translation_error() {
        let store = Arc::new(MockStore::new(10));
        let b = batcher(store.clone(), 2000, 200);
        let cmd = update(Some(Condition::and(vec![Condition::eq("Id", "a")])));

        let err = b.execute(&cmd, &AlwaysIdOnly).await.unwrap_err();

        assert!(matches!(err, TranslateError::Translation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_id_compared_to_column_is_translation_error() {
        let store = Arc::new(MockStore::new(10));
        let b = batcher(store.clone(), 2000, 200);
        let cmd = update(Some(Condition::Comparison {
            left: Expression::column("Id"),
            operator: CompareOp::Eq,
            right: Expression::column("ParentId"),
        }));

        let err = b.execute_command(&cmd).await.unwrap_err();

        assert!(matches!(err, TranslateError::Translation(_)));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_classify_rejects_other_shapes() {
        assert!(classify_id_only(None, "Id").is_err());
        assert!(classify_id_only(Some(&Condition::eq("Name", "x")), "Id").is_err());
        assert!(
            classify_id_only(Some(&Condition::compare("Id", CompareOp::Gt, "x")), "Id").is_err()
        );
        assert!(classify_id_only(Some(&Condition::eq("Id", true)), "Id").is_err());
        assert_eq!(
            classify_id_only(Some(&Condition::eq("id", "\"abc\"")), "Id").unwrap(),
            "abc"
        );
    }

    // =========================================================================
    // Paginated path
    // =========================================================================

    #[tokio::test]
    async fn test_450_ids_batch_200_gives_three_batches() {
        let store = Arc::new(MockStore::new(450));
        let b = batcher(store.clone(), 2000, 200);
        let cmd = update(Some(Condition::eq("Industry", "Energy")));

        let affected = b.execute_command(&cmd).await.unwrap();

        assert_eq!(affected, 450);
        assert_eq!(store.mutate_sizes(), vec![200, 200, 50]);
    }

    #[tokio::test]
    async fn test_second_page_fetched_with_cursor_not_requery() {
        let store = Arc::new(MockStore::new(3));
        let b = batcher(store.clone(), 2, 200);
        let cmd = Command::delete("Account", Some(Condition::eq("Industry", "Energy")));

        b.execute_command(&cmd).await.unwrap();

        let calls = store.calls();
        assert_eq!(
            calls,
            vec![
                Call::Query("SELECT Id FROM Account WHERE Industry = 'Energy'".into()),
                Call::More("cur-2".into()),
                Call::Mutate(vec!["id0".into(), "id1".into(), "id2".into()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_page_size_not_multiple_of_batch_size() {
        let store = Arc::new(MockStore::new(23));
        let b = batcher(store.clone(), 7, 5);
        let cmd = update(None);

        let stats = b
            .execute_with_stats(&cmd, &IdQueryBuilder::new(&cmd, "Id"))
            .await
            .unwrap();

        assert_eq!(store.mutate_sizes(), vec![5, 5, 5, 5, 3]);
        assert_eq!(stats.pages, 4);
        assert_eq!(stats.identifiers, 23);
        assert_eq!(stats.affected, 23);

        let dispatched: Vec<String> = store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Mutate(ids) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect();
        let expected: Vec<String> = (0..23).map(|i| format!("id{}", i)).collect();
        assert_eq!(dispatched, expected);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_trailing_batch() {
        let store = Arc::new(MockStore::new(400));
        let b = batcher(store.clone(), 2000, 200);
        b.execute_command(&update(None)).await.unwrap();
        assert_eq!(store.mutate_sizes(), vec![200, 200]);
    }

    #[tokio::test]
    async fn test_empty_result_dispatches_nothing() {
        let store = Arc::new(MockStore::new(0));
        let b = batcher(store.clone(), 2000, 200);

        let affected = b.execute_command(&update(None)).await.unwrap();

        assert_eq!(affected, 0);
        assert_eq!(store.mutate_sizes(), Vec::<usize>::new());
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_mid_sequence_is_skipped() {
        let ids = |prefix: &str, n: usize| -> Vec<String> {
            (0..n).map(|i| format!("{}{}", prefix, i)).collect()
        };
        let store = Arc::new(MockStore::scripted(vec![
            QueryPage::more(ids("a", 3), 7, "cur-1"),
            QueryPage::more(vec![], 7, "cur-2"),
            QueryPage::last(ids("c", 4), 7),
        ]));
        let b = batcher(store.clone(), 2000, 5);
        let cmd = update(None);

        let stats = b
            .execute_with_stats(&cmd, &IdQueryBuilder::new(&cmd, "Id"))
            .await
            .unwrap();

        assert_eq!(stats.affected, 7);
        assert_eq!(stats.pages, 3);
        assert_eq!(store.mutate_sizes(), vec![5, 2]);
        let fetches: Vec<Call> = store
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::More(_)))
            .collect();
        assert_eq!(
            fetches,
            vec![Call::More("cur-1".into()), Call::More("cur-2".into())]
        );
    }

    #[tokio::test]
    async fn test_failure_on_second_of_three_batches_fails_operation() {
        let store = Arc::new(MockStore::new(450).failing_on(2));
        let b = batcher(store.clone(), 2000, 200);

        let err = b.execute_command(&update(None)).await.unwrap_err();

        assert!(err.is_remote());
        // The third batch is never attempted.
        assert_eq!(store.mutate_sizes(), vec![200, 200]);
    }

    #[tokio::test]
    async fn test_insert_rejected_before_any_remote_call() {
        let store = Arc::new(MockStore::new(5));
        let b = batcher(store.clone(), 2000, 200);
        let cmd = Command {
            table: "Account".into(),
            kind: crate::core::language::CommandKind::Insert { values: vec![] },
            condition: None,
        };
        assert!(b.execute_command(&cmd).await.is_err());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_batch_limits_validation() {
        assert!(BatchLimits::new(0, 200).is_err());
        assert!(BatchLimits::new(2000, 0).is_err());
        assert_eq!(BatchLimits::default(), BatchLimits::new(2000, 200).unwrap());
    }
}
