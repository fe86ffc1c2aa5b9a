//! Storage seams of the engine.
//!
//! Each entity has its own trait so that the engine can run against the
//! relational adapter ([`SqlStore`]) in production and a fake in tests.
//! Reads take a [`Scope`] and apply the read predicate; replace and delete
//! apply the write predicate and report a miss instead of failing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Account, AccountDraft, Category, CategoryDraft, Expense, ExpenseDraft, NewUser, Owner, Page,
    Pagination, ReplacedExpense, ResultEngine, Scope, User, UserId,
};

pub use sql::SqlStore;

#[cfg(test)]
pub(crate) mod memory;
mod sql;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> ResultEngine<User>;

    async fn user_by_id(&self, id: UserId) -> ResultEngine<Option<User>>;

    async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>>;

    async fn user_by_username(&self, username: &str) -> ResultEngine<Option<User>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_account(&self, owner: Owner, draft: &AccountDraft) -> ResultEngine<Account>;

    /// Every account visible to `scope`, ordered by id.
    async fn accounts(&self, scope: Scope) -> ResultEngine<Vec<Account>>;

    async fn account(&self, id: i32, scope: Scope) -> ResultEngine<Option<Account>>;

    /// Replaces the caller controlled fields of an account `scope` may
    /// write. Returns `None` when there is no such row.
    async fn replace_account(
        &self,
        id: i32,
        scope: Scope,
        draft: &AccountDraft,
    ) -> ResultEngine<Option<Account>>;

    /// Returns the number of deleted rows.
    async fn delete_account(&self, id: i32, scope: Scope) -> ResultEngine<u64>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert_category(&self, owner: Owner, draft: &CategoryDraft)
    -> ResultEngine<Category>;

    async fn categories(&self, scope: Scope) -> ResultEngine<Vec<Category>>;

    async fn category(&self, id: i32, scope: Scope) -> ResultEngine<Option<Category>>;

    async fn replace_category(
        &self,
        id: i32,
        scope: Scope,
        draft: &CategoryDraft,
    ) -> ResultEngine<Option<Category>>;

    /// Fails with [`EngineError::InUse`] while expenses still reference the
    /// category.
    ///
    ///  [`EngineError::InUse`]: crate::EngineError::InUse
    async fn delete_category(&self, id: i32, scope: Scope) -> ResultEngine<u64>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert_expense(&self, owner: UserId, draft: &ExpenseDraft) -> ResultEngine<Expense>;

    async fn expense_page(
        &self,
        owner: UserId,
        pagination: &Pagination,
    ) -> ResultEngine<Page<Expense>>;

    async fn expense(&self, id: i32, owner: UserId) -> ResultEngine<Option<Expense>>;

    async fn replace_expense(
        &self,
        id: i32,
        owner: UserId,
        draft: &ExpenseDraft,
    ) -> ResultEngine<Option<ReplacedExpense>>;

    /// Returns the deleted row.
    async fn delete_expense(&self, id: i32, owner: UserId) -> ResultEngine<Option<Expense>>;
}

/// Everything the engine needs from a backend.
pub trait Store: UserStore + AccountStore + CategoryStore + ExpenseStore {}

impl<T> Store for T where T: UserStore + AccountStore + CategoryStore + ExpenseStore {}

pub type SharedStore = Arc<dyn Store>;
