use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use super::{AccountStore, StoreError, TodoStore};
use crate::account::Account;
use crate::entities::*;
use crate::todo::{NewTodo, StatusChange, TodoItem};

/// sea-orm backed implementation of [`AccountStore`] and [`TodoStore`].
#[derive(Clone, Debug)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<account::Model> for Account {
    fn from(model: account::Model) -> Self {
        Account::new(
            model.id,
            model.first_name,
            model.last_name,
            model.encrypted_password,
        )
    }
}

impl From<todo::Model> for TodoItem {
    fn from(model: todo::Model) -> Self {
        TodoItem::new(model.account_id, model.number, model.context, model.done)
    }
}

#[async_trait]
impl AccountStore for DbStore {
    #[tracing::instrument(skip(self, record), fields(account_id = record.id()))]
    async fn create_account(&self, record: &Account) -> Result<(), StoreError> {
        let active_model = account::ActiveModel {
            id: ActiveValue::Set(record.id()),
            first_name: ActiveValue::Set(record.first_name().to_string()),
            last_name: ActiveValue::Set(record.last_name().to_string()),
            encrypted_password: ActiveValue::Set(record.password_hash().to_string()),
            next_todo_number: ActiveValue::Set(0),
        };
        match account::Entity::insert(active_model).exec(&self.db).await {
            Ok(_) => Ok(()),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(StoreError::Conflict(record.id()))
                }
                _ => Err(StoreError::Database(err)),
            },
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = account::Entity::find()
            .order_by_asc(account::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Account::from)
            .collect();
        Ok(accounts)
    }

    #[tracing::instrument(skip(self))]
    async fn get_password_hash(&self, id: i64) -> Result<String, StoreError> {
        let hash = account::Entity::find_by_id(id)
            .select_only()
            .column(account::Column::EncryptedPassword)
            .into_tuple::<String>()
            .one(&self.db)
            .await?
            .ok_or(StoreError::AccountNotFound(id))?;
        Ok(hash)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, id: i64) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let todos = todo::Entity::delete_many()
            .filter(todo::Column::AccountId.eq(id))
            .exec(&txn)
            .await?;
        let accounts = account::Entity::delete_by_id(id).exec(&txn).await?;

        if accounts.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::AccountNotFound(id));
        }

        txn.commit().await?;
        tracing::info!(
            "Deleted account {} and {} todo(s)",
            id,
            todos.rows_affected
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn max_account_id(&self) -> Result<Option<i64>, StoreError> {
        let max = account::Entity::find()
            .select_only()
            .column_as(account::Column::Id.max(), "max_id")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await?
            .flatten();
        Ok(max)
    }
}

#[async_trait]
impl TodoStore for DbStore {
    #[tracing::instrument(skip(self))]
    async fn list_todos(&self, account_id: i64) -> Result<Vec<TodoItem>, StoreError> {
        let todos = todo::Entity::find()
            .filter(todo::Column::AccountId.eq(account_id))
            .order_by_asc(todo::Column::Number)
            .all(&self.db)
            .await?
            .into_iter()
            .map(TodoItem::from)
            .collect();
        Ok(todos)
    }

    #[tracing::instrument(skip(self, new_todo))]
    async fn add_todo(&self, account_id: i64, new_todo: &NewTodo) -> Result<TodoItem, StoreError> {
        let txn = self.db.begin().await?;

        // Bumping the high-water mark locks the account row until commit.
        let bumped = account::Entity::update_many()
            .col_expr(
                account::Column::NextTodoNumber,
                Expr::col(account::Column::NextTodoNumber).add(1),
            )
            .filter(account::Column::Id.eq(account_id))
            .exec(&txn)
            .await?;
        if bumped.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::AccountNotFound(account_id));
        }

        let number = account::Entity::find_by_id(account_id)
            .select_only()
            .column(account::Column::NextTodoNumber)
            .into_tuple::<i32>()
            .one(&txn)
            .await?
            .ok_or(StoreError::AccountNotFound(account_id))?;

        let active_model = todo::ActiveModel {
            account_id: ActiveValue::Set(account_id),
            number: ActiveValue::Set(number),
            context: ActiveValue::Set(new_todo.context.clone()),
            done: ActiveValue::Set(new_todo.done),
        };
        let created = active_model.insert(&txn).await?;
        txn.commit().await?;

        Ok(TodoItem::from(created))
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(&self, account_id: i64, change: &StatusChange) -> Result<(), StoreError> {
        let result = todo::Entity::update_many()
            .col_expr(todo::Column::Done, Expr::value(change.done))
            .filter(todo::Column::AccountId.eq(account_id))
            .filter(todo::Column::Number.eq(change.number))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::TodoNotFound {
                account_id,
                number: change.number,
            });
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_todo(&self, account_id: i64, number: i32) -> Result<(), StoreError> {
        let result = todo::Entity::delete_by_id((account_id, number))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::TodoNotFound { account_id, number });
        }
        Ok(())
    }
}
