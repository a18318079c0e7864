use std::fmt;
use std::sync::Arc;

use crate::store::{StoreError, TodoStore};

pub mod api;

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct TodoItem {
    account_id: i64,
    number: i32,
    context: String,
    done: bool,
}

impl TodoItem {
    pub fn new(account_id: i64, number: i32, context: String, done: bool) -> Self {
        Self {
            account_id,
            number,
            context,
            done,
        }
    }

    /// Returns the ID of the owning account.
    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    /// Returns the per-account sequence number.
    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn done(&self) -> bool {
        self.done
    }
}

/// A todo to append; the store assigns its number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub context: String,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub number: i32,
    pub done: bool,
}

/// One batch mutation of an account's todo list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoBatch {
    pub add: Vec<NewTodo>,
    pub status_change: Vec<StatusChange>,
    pub delete: Vec<i32>,
}

/// The three sub-batches, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Add,
    StatusChange,
    Delete,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchPhase::Add => "add",
            BatchPhase::StatusChange => "status_change",
            BatchPhase::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// What a batch changed before it finished or stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Numbers assigned to the added todos, in request order.
    pub added: Vec<i32>,
    pub status_changed: usize,
    pub deleted: usize,
}

/// A batch stopped at `phase[index]`.
///
/// Everything recorded in `applied` stays applied.
#[derive(Debug, thiserror::Error)]
#[error("{phase}[{index}]: {source}")]
pub struct MutationError {
    pub phase: BatchPhase,
    pub index: usize,
    pub applied: BatchReport,
    #[source]
    pub source: StoreError,
}

/// Applies batch mutations to one account's todo list.
///
/// A batch runs additions, then status changes, then deletions, each item in
/// request order. It is not transactional: the first failing item stops the
/// batch, earlier items stay applied and later ones are skipped.
#[derive(Clone)]
pub struct TodoMutationEngine {
    store: Arc<dyn TodoStore>,
}

impl TodoMutationEngine {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, batch), fields(
        add = batch.add.len(),
        status_change = batch.status_change.len(),
        delete = batch.delete.len(),
    ))]
    pub async fn apply(&self, account_id: i64, batch: &TodoBatch) -> Result<BatchReport, MutationError> {
        let mut report = BatchReport::default();
        self.add_todos(account_id, &batch.add, &mut report).await?;
        self.set_statuses(account_id, &batch.status_change, &mut report)
            .await?;
        self.delete_todos(account_id, &batch.delete, &mut report)
            .await?;
        tracing::debug!("Applied batch to account {}: {:?}", account_id, report);
        Ok(report)
    }

    pub async fn add_todos(
        &self,
        account_id: i64,
        todos: &[NewTodo],
        report: &mut BatchReport,
    ) -> Result<(), MutationError> {
        for (index, todo) in todos.iter().enumerate() {
            match self.store.add_todo(account_id, todo).await {
                Ok(created) => report.added.push(created.number()),
                Err(source) => return Err(Self::stopped(BatchPhase::Add, index, report, source)),
            }
        }
        Ok(())
    }

    pub async fn set_statuses(
        &self,
        account_id: i64,
        changes: &[StatusChange],
        report: &mut BatchReport,
    ) -> Result<(), MutationError> {
        for (index, change) in changes.iter().enumerate() {
            if let Err(source) = self.store.set_status(account_id, change).await {
                return Err(Self::stopped(BatchPhase::StatusChange, index, report, source));
            }
            report.status_changed += 1;
        }
        Ok(())
    }

    pub async fn delete_todos(
        &self,
        account_id: i64,
        numbers: &[i32],
        report: &mut BatchReport,
    ) -> Result<(), MutationError> {
        for (index, &number) in numbers.iter().enumerate() {
            if let Err(source) = self.store.delete_todo(account_id, number).await {
                return Err(Self::stopped(BatchPhase::Delete, index, report, source));
            }
            report.deleted += 1;
        }
        Ok(())
    }

    fn stopped(
        phase: BatchPhase,
        index: usize,
        report: &BatchReport,
        source: StoreError,
    ) -> MutationError {
        tracing::warn!("Batch stopped at {}[{}]: {}", phase, index, source);
        MutationError {
            phase,
            index,
            applied: report.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockTodoStore;
    use mockall::Sequence;

    fn new_todo(context: &str) -> NewTodo {
        NewTodo {
            context: context.to_string(),
            done: false,
        }
    }

    #[tokio::test]
    async fn empty_batch_touches_nothing() {
        let engine = TodoMutationEngine::new(Arc::new(MockTodoStore::new()));

        let report = engine.apply(1, &TodoBatch::default()).await.unwrap();

        assert_eq!(report, BatchReport::default());
    }

    #[tokio::test]
    async fn applies_phases_in_order() {
        let mut store = MockTodoStore::new();
        let mut seq = Sequence::new();
        store
            .expect_add_todo()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|account_id, todo| {
                Ok(TodoItem::new(account_id, 1, todo.context.clone(), todo.done))
            });
        store
            .expect_set_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_delete_todo()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let engine = TodoMutationEngine::new(Arc::new(store));
        let batch = TodoBatch {
            add: vec![new_todo("x")],
            status_change: vec![StatusChange {
                number: 1,
                done: true,
            }],
            delete: vec![1],
        };

        let report = engine.apply(1, &batch).await.unwrap();

        assert_eq!(report.added, vec![1]);
        assert_eq!(report.status_changed, 1);
        assert_eq!(report.deleted, 1);
    }

    #[tokio::test]
    async fn stops_at_first_failure_and_skips_the_rest() {
        let mut store = MockTodoStore::new();
        store
            .expect_add_todo()
            .times(1)
            .returning(|account_id, todo| {
                Ok(TodoItem::new(account_id, 1, todo.context.clone(), todo.done))
            });
        store
            .expect_set_status()
            .times(1)
            .returning(|account_id, change| {
                Err(StoreError::TodoNotFound {
                    account_id,
                    number: change.number,
                })
            });
        store.expect_delete_todo().never();
        let engine = TodoMutationEngine::new(Arc::new(store));
        let batch = TodoBatch {
            add: vec![new_todo("x")],
            status_change: vec![
                StatusChange {
                    number: 999,
                    done: true,
                },
                StatusChange {
                    number: 1,
                    done: true,
                },
            ],
            delete: vec![1],
        };

        let err = engine.apply(1, &batch).await.unwrap_err();

        assert_eq!(err.phase, BatchPhase::StatusChange);
        assert_eq!(err.index, 0);
        assert_eq!(err.applied.added, vec![1]);
        assert_eq!(
            err.to_string(),
            "status_change[0]: todo 999 not found for account 1"
        );
    }
}
