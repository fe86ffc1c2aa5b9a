//! In-process store used by the engine unit tests.

use std::{cmp::Ordering, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    Account, AccountDraft, Category, CategoryDraft, EngineError, Expense, ExpenseDraft, NewUser,
    Owner, Page, Pagination, ReplacedExpense, ResultEngine, Scope, SortField, SortOrder, User,
    UserId,
};

use super::{AccountStore, CategoryStore, ExpenseStore, UserStore};

#[derive(Default)]
struct State {
    last_id: i32,
    users: Vec<User>,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> ResultEngine<User> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(EngineError::Conflict("email".to_string()));
        }
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(EngineError::Conflict("username".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: state.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> ResultEngine<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_username(&self, username: &str) -> ResultEngine<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, owner: Owner, draft: &AccountDraft) -> ResultEngine<Account> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let account = Account {
            id: state.next_id(),
            name: draft.name.clone(),
            account_type: draft.account_type.clone(),
            balance: draft.balance,
            description: draft.description.clone(),
            icon: draft.icon.clone(),
            owner,
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn accounts(&self, scope: Scope) -> ResultEngine<Vec<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.owner.visible_to(scope))
            .cloned()
            .collect())
    }

    async fn account(&self, id: i32, scope: Scope) -> ResultEngine<Option<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|a| a.id == id && a.owner.visible_to(scope))
            .cloned())
    }

    async fn replace_account(
        &self,
        id: i32,
        scope: Scope,
        draft: &AccountDraft,
    ) -> ResultEngine<Option<Account>> {
        let mut state = self.state.lock().unwrap();
        let Some(account) = state
            .accounts
            .iter_mut()
            .find(|a| a.id == id && a.owner.writable_by(scope))
        else {
            return Ok(None);
        };
        account.name = draft.name.clone();
        account.account_type = draft.account_type.clone();
        account.balance = draft.balance;
        account.description = draft.description.clone();
        account.icon = draft.icon.clone();
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn delete_account(&self, id: i32, scope: Scope) -> ResultEngine<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.accounts.len();
        state
            .accounts
            .retain(|a| !(a.id == id && a.owner.writable_by(scope)));
        Ok((before - state.accounts.len()) as u64)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(
        &self,
        owner: Owner,
        draft: &CategoryDraft,
    ) -> ResultEngine<Category> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let category = Category {
            id: state.next_id(),
            name: draft.name.clone(),
            owner,
            created_at: now,
            updated_at: now,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn categories(&self, scope: Scope) -> ResultEngine<Vec<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .filter(|c| c.owner.visible_to(scope))
            .cloned()
            .collect())
    }

    async fn category(&self, id: i32, scope: Scope) -> ResultEngine<Option<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|c| c.id == id && c.owner.visible_to(scope))
            .cloned())
    }

    async fn replace_category(
        &self,
        id: i32,
        scope: Scope,
        draft: &CategoryDraft,
    ) -> ResultEngine<Option<Category>> {
        let mut state = self.state.lock().unwrap();
        let Some(category) = state
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.owner.writable_by(scope))
        else {
            return Ok(None);
        };
        category.name = draft.name.clone();
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: i32, scope: Scope) -> ResultEngine<u64> {
        let mut state = self.state.lock().unwrap();
        let writable = state
            .categories
            .iter()
            .any(|c| c.id == id && c.owner.writable_by(scope));
        if writable && state.expenses.iter().any(|e| e.category_id == id) {
            return Err(EngineError::InUse("category".to_string()));
        }
        let before = state.categories.len();
        state
            .categories
            .retain(|c| !(c.id == id && c.owner.writable_by(scope)));
        Ok((before - state.categories.len()) as u64)
    }
}

fn compare(a: &Expense, b: &Expense, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Id => Ordering::Equal,
        SortField::Title => a.title.cmp(&b.title),
        SortField::Amount => a.amount.total_cmp(&b.amount),
        SortField::Date => a.date.cmp(&b.date),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    primary.then(a.id.cmp(&b.id))
}

fn matches_search(expense: &Expense, needle: &str) -> bool {
    expense.title.to_lowercase().contains(needle)
        || expense
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert_expense(&self, owner: UserId, draft: &ExpenseDraft) -> ResultEngine<Expense> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let expense = Expense {
            id: state.next_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            amount: draft.amount,
            date: draft.date,
            owner,
            category_id: draft.category_id,
            receipt: draft.receipt.clone(),
            created_at: now,
            updated_at: now,
        };
        state.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn expense_page(
        &self,
        owner: UserId,
        pagination: &Pagination,
    ) -> ResultEngine<Page<Expense>> {
        let state = self.state.lock().unwrap();
        let needle = pagination.search.as_deref().map(str::to_lowercase);
        let mut matched: Vec<Expense> = state
            .expenses
            .iter()
            .filter(|e| e.owner == owner)
            .filter(|e| needle.as_deref().is_none_or(|n| matches_search(e, n)))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare(a, b, pagination.sort.field);
            match pagination.sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn expense(&self, id: i32, owner: UserId) -> ResultEngine<Option<Expense>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .expenses
            .iter()
            .find(|e| e.id == id && e.owner == owner)
            .cloned())
    }

    async fn replace_expense(
        &self,
        id: i32,
        owner: UserId,
        draft: &ExpenseDraft,
    ) -> ResultEngine<Option<ReplacedExpense>> {
        let mut state = self.state.lock().unwrap();
        let Some(expense) = state
            .expenses
            .iter_mut()
            .find(|e| e.id == id && e.owner == owner)
        else {
            return Ok(None);
        };
        expense.title = draft.title.clone();
        expense.description = draft.description.clone();
        expense.amount = draft.amount;
        expense.date = draft.date;
        expense.category_id = draft.category_id;
        let previous_receipt = match &draft.receipt {
            Some(receipt) => expense.receipt.replace(receipt.clone()),
            None => None,
        };
        expense.updated_at = Utc::now();
        Ok(Some(ReplacedExpense {
            expense: expense.clone(),
            previous_receipt,
        }))
    }

    async fn delete_expense(&self, id: i32, owner: UserId) -> ResultEngine<Option<Expense>> {
        let mut state = self.state.lock().unwrap();
        let Some(index) = state
            .expenses
            .iter()
            .position(|e| e.id == id && e.owner == owner)
        else {
            return Ok(None);
        };
        Ok(Some(state.expenses.remove(index)))
    }
}
