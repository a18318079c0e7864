//! Persistence contracts for accounts and their todo lists.
//!
//! Handlers and services only talk to [`AccountStore`] and [`TodoStore`];
//! [`DbStore`] is the sea-orm implementation used by the server.

use async_trait::async_trait;

use crate::account::Account;
use crate::todo::{NewTodo, StatusChange, TodoItem};

mod db;

pub use db::DbStore;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No account row exists for the given id.
    #[error("account {0} not found")]
    AccountNotFound(i64),
    /// No todo with the given number exists for the account.
    #[error("todo {number} not found for account {account_id}")]
    TodoNotFound { account_id: i64, number: i32 },
    /// An account with this id already exists.
    #[error("account {0} already exists")]
    Conflict(i64),
    /// Represents a database error.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account. Fails with [`StoreError::Conflict`] if the id is taken.
    async fn create_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Returns every account, ordered by id.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Returns the stored password hash for an account.
    async fn get_password_hash(&self, id: i64) -> Result<String, StoreError>;

    /// Removes the account together with all of its todos in one transaction.
    async fn delete_account(&self, id: i64) -> Result<(), StoreError>;

    /// Highest account id currently persisted, if any.
    async fn max_account_id(&self) -> Result<Option<i64>, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Lists the todos of an account ordered by number. Empty when there are none.
    async fn list_todos(&self, account_id: i64) -> Result<Vec<TodoItem>, StoreError>;

    /// Appends a todo and returns it with its assigned number.
    async fn add_todo(&self, account_id: i64, todo: &NewTodo) -> Result<TodoItem, StoreError>;

    async fn set_status(&self, account_id: i64, change: &StatusChange) -> Result<(), StoreError>;

    async fn delete_todo(&self, account_id: i64, number: i32) -> Result<(), StoreError>;
}
