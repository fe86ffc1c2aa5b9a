//! The module contains `Account` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::Owner;

/// An account.
///
/// A place where money is kept: a bank account, a wallet, a card. Global
/// accounts are templates shared by every user.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: i32,
    pub name: String,
    pub account_type: String,
    pub balance: f64,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller supplied part of an account, used for create and replace.
#[derive(Clone, Debug, PartialEq)]
pub struct AccountDraft {
    pub name: String,
    pub account_type: String,
    pub balance: f64,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub account_type: String,
    #[sea_orm(column_type = "Double")]
    pub balance: f64,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub user_id: i32,
    pub is_global: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            account_type: model.account_type,
            balance: model.balance,
            description: model.description,
            icon: model.icon,
            owner: Owner::from_columns(model.is_global, model.user_id),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl ActiveModel {
    /// Sets every caller controlled column from `draft`.
    pub(crate) fn apply_draft(&mut self, draft: &AccountDraft) {
        self.name = ActiveValue::Set(draft.name.clone());
        self.account_type = ActiveValue::Set(draft.account_type.clone());
        self.balance = ActiveValue::Set(draft.balance);
        self.description = ActiveValue::Set(draft.description.clone());
        self.icon = ActiveValue::Set(draft.icon.clone());
    }
}
