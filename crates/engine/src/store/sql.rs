//! Relational storage adapter built on sea-orm.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseConnection, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};

use crate::{
    Account, AccountDraft, Category, CategoryDraft, EngineError, Expense, ExpenseDraft, NewUser,
    Owner, Page, Pagination, ReplacedExpense, ResultEngine, Scope, SortField, SortOrder, User,
    UserId, accounts, categories, expenses, users,
};

use super::{AccountStore, CategoryStore, ExpenseStore, UserStore};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Storage backed by a sea-orm connection (SQLite or PostgreSQL).
#[derive(Clone, Debug)]
pub struct SqlStore {
    database: DatabaseConnection,
}

impl SqlStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

/// Unique index violations on `users` become a domain conflict.
fn user_conflict(err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            let field = if detail.contains("email") {
                "email"
            } else if detail.contains("username") {
                "username"
            } else {
                "user"
            };
            EngineError::Conflict(field.to_string())
        }
        _ => EngineError::Database(err),
    }
}

#[async_trait]
impl UserStore for SqlStore {
    async fn insert_user(&self, user: NewUser) -> ResultEngine<User> {
        let now = Utc::now();
        let active = users::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(user.username),
            email: ActiveValue::Set(user.email),
            password: ActiveValue::Set(user.password_hash),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        let model = active.insert(&self.database).await.map_err(user_conflict)?;
        Ok(model.into())
    }

    async fn user_by_id(&self, id: UserId) -> ResultEngine<Option<User>> {
        let model = users::Entity::find_by_id(id).one(&self.database).await?;
        Ok(model.map(User::from))
    }

    async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?;
        Ok(model.map(User::from))
    }

    async fn user_by_username(&self, username: &str) -> ResultEngine<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        Ok(model.map(User::from))
    }
}

fn account_read(scope: Scope) -> Condition {
    scope.read_condition(accounts::Column::IsGlobal, accounts::Column::UserId)
}

fn account_write(scope: Scope) -> Condition {
    scope.write_condition(accounts::Column::IsGlobal, accounts::Column::UserId)
}

#[async_trait]
impl AccountStore for SqlStore {
    async fn insert_account(&self, owner: Owner, draft: &AccountDraft) -> ResultEngine<Account> {
        let now = Utc::now();
        let mut active = accounts::ActiveModel {
            user_id: ActiveValue::Set(owner.user_id()),
            is_global: ActiveValue::Set(owner.is_global()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        active.apply_draft(draft);
        Ok(active.insert(&self.database).await?.into())
    }

    async fn accounts(&self, scope: Scope) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(account_read(scope))
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    async fn account(&self, id: i32, scope: Scope) -> ResultEngine<Option<Account>> {
        let model = accounts::Entity::find_by_id(id)
            .filter(account_read(scope))
            .one(&self.database)
            .await?;
        Ok(model.map(Account::from))
    }

    async fn replace_account(
        &self,
        id: i32,
        scope: Scope,
        draft: &AccountDraft,
    ) -> ResultEngine<Option<Account>> {
        with_tx!(self, |db_tx| {
            let Some(model) = accounts::Entity::find_by_id(id)
                .filter(account_write(scope))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };

            let mut active: accounts::ActiveModel = model.into();
            active.apply_draft(draft);
            active.updated_at = ActiveValue::Set(Utc::now());
            let updated = active.update(&db_tx).await?;
            Ok::<_, EngineError>(Some(updated.into()))
        })
    }

    async fn delete_account(&self, id: i32, scope: Scope) -> ResultEngine<u64> {
        let res = accounts::Entity::delete_many()
            .filter(accounts::Column::Id.eq(id))
            .filter(account_write(scope))
            .exec(&self.database)
            .await?;
        Ok(res.rows_affected)
    }
}

/// Expenses keep a restricting foreign key on their category.
fn category_in_use(err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            EngineError::InUse("category".to_string())
        }
        _ => EngineError::Database(err),
    }
}

fn category_read(scope: Scope) -> Condition {
    scope.read_condition(categories::Column::IsGlobal, categories::Column::UserId)
}

fn category_write(scope: Scope) -> Condition {
    scope.write_condition(categories::Column::IsGlobal, categories::Column::UserId)
}

#[async_trait]
impl CategoryStore for SqlStore {
    async fn insert_category(
        &self,
        owner: Owner,
        draft: &CategoryDraft,
    ) -> ResultEngine<Category> {
        let now = Utc::now();
        let active = categories::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(draft.name.clone()),
            user_id: ActiveValue::Set(owner.user_id()),
            is_global: ActiveValue::Set(owner.is_global()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        Ok(active.insert(&self.database).await?.into())
    }

    async fn categories(&self, scope: Scope) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(category_read(scope))
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    async fn category(&self, id: i32, scope: Scope) -> ResultEngine<Option<Category>> {
        let model = categories::Entity::find_by_id(id)
            .filter(category_read(scope))
            .one(&self.database)
            .await?;
        Ok(model.map(Category::from))
    }

    async fn replace_category(
        &self,
        id: i32,
        scope: Scope,
        draft: &CategoryDraft,
    ) -> ResultEngine<Option<Category>> {
        with_tx!(self, |db_tx| {
            let Some(model) = categories::Entity::find_by_id(id)
                .filter(category_write(scope))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };

            let mut active: categories::ActiveModel = model.into();
            active.name = ActiveValue::Set(draft.name.clone());
            active.updated_at = ActiveValue::Set(Utc::now());
            let updated = active.update(&db_tx).await?;
            Ok::<_, EngineError>(Some(updated.into()))
        })
    }

    async fn delete_category(&self, id: i32, scope: Scope) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let Some(model) = categories::Entity::find_by_id(id)
                .filter(category_write(scope))
                .one(&db_tx)
                .await?
            else {
                return Ok(0);
            };

            let used_by = expenses::Entity::find()
                .filter(expenses::Column::CategoryId.eq(model.id))
                .count(&db_tx)
                .await?;
            if used_by > 0 {
                return Err(EngineError::InUse("category".to_string()));
            }

            let res = model.delete(&db_tx).await.map_err(category_in_use)?;
            Ok::<_, EngineError>(res.rows_affected)
        })
    }
}

fn sort_column(field: SortField) -> expenses::Column {
    match field {
        SortField::Id => expenses::Column::Id,
        SortField::Title => expenses::Column::Title,
        SortField::Amount => expenses::Column::Amount,
        SortField::Date => expenses::Column::Date,
        SortField::CreatedAt => expenses::Column::CreatedAt,
        SortField::UpdatedAt => expenses::Column::UpdatedAt,
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `LOWER(column) LIKE pattern ESCAPE '\'`
fn lower_like(column: expenses::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

#[async_trait]
impl ExpenseStore for SqlStore {
    async fn insert_expense(&self, owner: UserId, draft: &ExpenseDraft) -> ResultEngine<Expense> {
        let now = Utc::now();
        let mut active = expenses::ActiveModel {
            user_id: ActiveValue::Set(owner),
            file_url: ActiveValue::Set(None),
            file_key: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        active.apply_draft(draft);
        Ok(active.insert(&self.database).await?.into())
    }

    async fn expense_page(
        &self,
        owner: UserId,
        pagination: &Pagination,
    ) -> ResultEngine<Page<Expense>> {
        let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(owner));

        if let Some(search) = &pagination.search {
            let pattern = format!("%{}%", escape_like(&search.to_ascii_lowercase()));
            query = query.filter(
                Condition::any()
                    .add(lower_like(expenses::Column::Title, &pattern))
                    .add(lower_like(expenses::Column::Description, &pattern)),
            );
        }

        let total = query.clone().count(&self.database).await?;

        let order = match pagination.sort.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let models = query
            .order_by(sort_column(pagination.sort.field), order.clone())
            .order_by(expenses::Column::Id, order)
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(&self.database)
            .await?;

        Ok(Page {
            items: models.into_iter().map(Expense::from).collect(),
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn expense(&self, id: i32, owner: UserId) -> ResultEngine<Option<Expense>> {
        let model = expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(owner))
            .one(&self.database)
            .await?;
        Ok(model.map(Expense::from))
    }

    async fn replace_expense(
        &self,
        id: i32,
        owner: UserId,
        draft: &ExpenseDraft,
    ) -> ResultEngine<Option<ReplacedExpense>> {
        with_tx!(self, |db_tx| {
            let Some(model) = expenses::Entity::find_by_id(id)
                .filter(expenses::Column::UserId.eq(owner))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };

            let previous_receipt = Expense::from(model.clone())
                .receipt
                .filter(|_| draft.receipt.is_some());

            let mut active: expenses::ActiveModel = model.into();
            active.apply_draft(draft);
            active.updated_at = ActiveValue::Set(Utc::now());
            let updated = active.update(&db_tx).await?;
            Ok::<_, EngineError>(Some(ReplacedExpense {
                expense: updated.into(),
                previous_receipt,
            }))
        })
    }

    async fn delete_expense(&self, id: i32, owner: UserId) -> ResultEngine<Option<Expense>> {
        with_tx!(self, |db_tx| {
            let Some(model) = expenses::Entity::find_by_id(id)
                .filter(expenses::Column::UserId.eq(owner))
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };

            let expense = Expense::from(model.clone());
            model.delete(&db_tx).await?;
            Ok::<_, EngineError>(Some(expense))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("lunch"), "lunch");
    }
}
