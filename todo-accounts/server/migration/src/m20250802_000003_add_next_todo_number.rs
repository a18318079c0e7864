use sea_orm_migration::prelude::*;

use crate::m20250801_000001_create_account_table::Account;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Account::Table)
                    .add_column(
                        ColumnDef::new(Account::NextTodoNumber)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Existing accounts continue after their highest todo number.
        manager
            .get_connection()
            .execute_unprepared(
                "UPDATE account SET next_todo_number = \
                 COALESCE((SELECT MAX(todo.number) FROM todo WHERE todo.account_id = account.id), 0)",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Account::Table)
                    .drop_column(Account::NextTodoNumber)
                    .to_owned(),
            )
            .await
    }
}
