//! Initial schema.
//!
//! - `users`: registered users, unique username and email
//! - `categories`: expense categories, global (`user_id = 0`) or per user
//! - `accounts`: money holders, global (`user_id = 0`) or per user
//! - `expenses`: always owned by a user, reference a category
//!
//! `categories.user_id` and `accounts.user_id` carry no foreign key: `0` is
//! the "no owner" marker of global rows and never a real user.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    Password,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    UserId,
    IsGlobal,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    AccountType,
    Balance,
    Description,
    Icon,
    UserId,
    IsGlobal,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    Title,
    Description,
    Amount,
    Date,
    UserId,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

fn timestamps(table: &mut TableCreateStatement, created: impl IntoIden, updated: impl IntoIden) {
    table
        .col(
            ColumnDef::new(created)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(updated)
                .timestamp_with_time_zone()
                .not_null(),
        );
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        let mut users = Table::create();
        users
            .table(Users::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Users::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(Users::Username)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
            .col(ColumnDef::new(Users::Password).string().not_null());
        timestamps(&mut users, Users::CreatedAt, Users::UpdatedAt);
        manager.create_table(users.to_owned()).await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        let mut categories = Table::create();
        categories
            .table(Categories::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Categories::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(Categories::Name).string().not_null())
            .col(
                ColumnDef::new(Categories::UserId)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(Categories::IsGlobal)
                    .boolean()
                    .not_null()
                    .default(false),
            );
        timestamps(&mut categories, Categories::CreatedAt, Categories::UpdatedAt);
        manager.create_table(categories.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Accounts
        // ───────────────────────────────────────────────────────────────────
        let mut accounts = Table::create();
        accounts
            .table(Accounts::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Accounts::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(Accounts::Name).string().not_null())
            .col(ColumnDef::new(Accounts::AccountType).string().not_null())
            .col(
                ColumnDef::new(Accounts::Balance)
                    .double()
                    .not_null()
                    .default(0.0),
            )
            .col(ColumnDef::new(Accounts::Description).string())
            .col(ColumnDef::new(Accounts::Icon).string())
            .col(
                ColumnDef::new(Accounts::UserId)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(Accounts::IsGlobal)
                    .boolean()
                    .not_null()
                    .default(false),
            );
        timestamps(&mut accounts, Accounts::CreatedAt, Accounts::UpdatedAt);
        manager.create_table(accounts.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Expenses
        // ───────────────────────────────────────────────────────────────────
        let mut expenses = Table::create();
        expenses
            .table(Expenses::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Expenses::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(Expenses::Title).string().not_null())
            .col(ColumnDef::new(Expenses::Description).string())
            .col(ColumnDef::new(Expenses::Amount).double().not_null())
            .col(
                ColumnDef::new(Expenses::Date)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(ColumnDef::new(Expenses::UserId).integer().not_null())
            .col(ColumnDef::new(Expenses::CategoryId).integer().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk-expenses-user_id")
                    .from(Expenses::Table, Expenses::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-expenses-category_id")
                    .from(Expenses::Table, Expenses::CategoryId)
                    .to(Categories::Table, Categories::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            );
        timestamps(&mut expenses, Expenses::CreatedAt, Expenses::UpdatedAt);
        manager.create_table(expenses.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-user_id-created_at")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-category_id")
                    .table(Expenses::Table)
                    .col(Expenses::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
