pub use accounts::{Account, AccountDraft};
pub use categories::{Category, CategoryDraft};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseDraft, Receipt, ReplacedExpense};
pub use ops::{Engine, EngineBuilder};
pub use ownership::{GLOBAL_OWNER_ID, Owner, Scope, UserId};
pub use pagination::{
    DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT, Page, Pagination, Sort, SortField, SortOrder,
};
pub use store::{
    AccountStore, CategoryStore, ExpenseStore, SharedStore, SqlStore, Store, UserStore,
};
pub use users::{NewUser, User};

mod accounts;
mod categories;
mod error;
mod expenses;
mod ops;
mod ownership;
mod pagination;
mod store;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
