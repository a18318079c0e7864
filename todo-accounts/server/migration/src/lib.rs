pub use sea_orm_migration::prelude::*;

mod m20250801_000001_create_account_table;
mod m20250801_000002_create_todo_table;
mod m20250802_000003_add_next_todo_number;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_account_table::Migration),
            Box::new(m20250801_000002_create_todo_table::Migration),
            Box::new(m20250802_000003_add_next_todo_number::Migration),
        ]
    }
}
