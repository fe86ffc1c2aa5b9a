//! The module contains `Expense` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::UserId;

/// A single expense.
///
/// Expenses are never global: `owner` is always a real user. The category
/// is referenced by id and not loaded alongside.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub owner: UserId,
    pub category_id: i32,
    pub receipt: Option<Receipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An uploaded receipt: the public `url` and the provider `key` used to
/// remove it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub url: String,
    pub key: String,
}

/// Result of replacing an expense.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplacedExpense {
    pub expense: Expense,
    /// The receipt a new upload took the place of. Nothing references it
    /// anymore.
    pub previous_receipt: Option<Receipt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category_id: i32,
    /// On replace, `None` keeps the stored receipt.
    pub receipt: Option<Receipt>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub date: DateTimeUtc,
    pub user_id: i32,
    pub category_id: i32,
    pub file_url: Option<String>,
    pub file_key: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            amount: model.amount,
            date: model.date,
            owner: model.user_id,
            category_id: model.category_id,
            receipt: model
                .file_url
                .zip(model.file_key)
                .map(|(url, key)| Receipt { url, key }),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl ActiveModel {
    /// Sets every caller controlled column from `draft`. The receipt columns
    /// are only touched when the draft carries one.
    pub(crate) fn apply_draft(&mut self, draft: &ExpenseDraft) {
        self.title = ActiveValue::Set(draft.title.clone());
        self.description = ActiveValue::Set(draft.description.clone());
        self.amount = ActiveValue::Set(draft.amount);
        self.date = ActiveValue::Set(draft.date);
        self.category_id = ActiveValue::Set(draft.category_id);
        if let Some(receipt) = &draft.receipt {
            self.file_url = ActiveValue::Set(Some(receipt.url.clone()));
            self.file_key = ActiveValue::Set(Some(receipt.key.clone()));
        }
    }
}
