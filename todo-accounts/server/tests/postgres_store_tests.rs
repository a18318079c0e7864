mod common;

use std::collections::HashSet;

use todo_accounts_server::account::Account;
use todo_accounts_server::store::{AccountStore, DbStore, StoreError, TodoStore};
use todo_accounts_server::todo::NewTodo;

fn account(id: i64) -> Account {
    Account::new(id, "Ada".into(), "Lovelace".into(), "$argon2id$hash".into())
}

fn new_todo(context: &str) -> NewTodo {
    NewTodo {
        context: context.into(),
        done: false,
    }
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn test_postgres_store_round_trip() {
    let container = common::setup_container().await.unwrap();
    let db = common::setup_postgres_db(&container).await.unwrap();
    let store = DbStore::new(db);

    store.create_account(&account(1)).await.unwrap();
    assert!(matches!(
        store.create_account(&account(1)).await,
        Err(StoreError::Conflict(1))
    ));

    assert_eq!(store.add_todo(1, &new_todo("ship it")).await.unwrap().number(), 1);
    assert_eq!(store.add_todo(1, &new_todo("ship it")).await.unwrap().number(), 2);
    store.delete_todo(1, 2).await.unwrap();
    assert_eq!(store.add_todo(1, &new_todo("again")).await.unwrap().number(), 3);
    assert_eq!(store.max_account_id().await.unwrap(), Some(1));

    store.delete_account(1).await.unwrap();
    assert!(store.list_todos(1).await.unwrap().is_empty());
    assert!(store.list_accounts().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn test_postgres_concurrent_adds_get_distinct_numbers() {
    let container = common::setup_container().await.unwrap();
    let db = common::setup_postgres_db(&container).await.unwrap();
    let store = DbStore::new(db);
    store.create_account(&account(1)).await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .add_todo(1, &new_todo(&format!("todo {i}")))
                    .await
                    .unwrap()
                    .number()
            })
        })
        .collect();
    let mut numbers = HashSet::new();
    for handle in handles {
        numbers.insert(handle.await.unwrap());
    }

    assert_eq!(numbers, (1..=10).collect::<HashSet<i32>>());
    assert_eq!(store.list_todos(1).await.unwrap().len(), 10);
}
