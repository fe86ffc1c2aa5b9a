//! Optional receipt on expenses: the public URL and the storage key used to
//! remove the file.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Expenses {
    Table,
    FileUrl,
    FileKey,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite takes one column per ALTER TABLE.
        for column in [Expenses::FileUrl, Expenses::FileKey] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Expenses::Table)
                        .add_column(ColumnDef::new(column).string())
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for column in [Expenses::FileKey, Expenses::FileUrl] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Expenses::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
