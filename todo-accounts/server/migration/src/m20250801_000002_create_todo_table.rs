use sea_orm_migration::prelude::*;

use crate::m20250801_000001_create_account_table::Account;

#[derive(DeriveMigrationName)]
pub struct Migration;

const PK_TODO: &str = "pk-todo-account_id-number";
const FK_TODO_TO_ACCOUNT: &str = "fk-todo-account_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Todo::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Todo::Number).integer().not_null())
                    .col(ColumnDef::new(Todo::Context).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Todo::Done)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .name(PK_TODO)
                            .table(Todo::Table)
                            .col(Todo::AccountId)
                            .col(Todo::Number),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TODO_TO_ACCOUNT)
                            .from(Todo::Table, Todo::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Todo {
    Table,
    AccountId,
    Number,
    Context,
    Done,
}
