use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Common response envelope.
///
/// Every endpoint answers with this shape; `data` is set on success and
/// `errors` carries field level details on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct UserRegister {
        #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
        pub username: String,
        #[validate(email(message = "must be a valid email address"))]
        pub email: String,
        /// bcrypt only looks at the first 72 bytes.
        #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 characters"))]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct UserLogin {
        #[validate(email(message = "must be a valid email address"))]
        pub email: String,
        #[validate(length(min = 1, message = "is required"))]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
        pub token_type: String,
        pub expires_at: DateTime<Utc>,
    }

    /// Public view of a user. The password hash never leaves the server.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub username: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct AccountRequest {
        #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
        pub name: String,
        #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
        pub account_type: String,
        #[serde(default)]
        #[validate(range(min = 0.0, message = "must not be negative"))]
        pub balance: f64,
        #[validate(length(max = 255, message = "must be at most 255 characters"))]
        pub description: Option<String>,
        #[validate(length(max = 100, message = "must be at most 100 characters"))]
        pub icon: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i32,
        pub name: String,
        pub account_type: String,
        pub balance: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub icon: Option<String>,
        pub is_global: bool,
        /// `0` for global accounts.
        pub owner_id: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct CategoryRequest {
        #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
        pub is_global: bool,
        /// `0` for global categories.
        pub owner_id: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct ExpenseRequest {
        #[validate(length(min = 3, max = 100, message = "must be between 3 and 100 characters"))]
        pub title: String,
        #[validate(length(max = 255, message = "must be at most 255 characters"))]
        pub description: Option<String>,
        #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
        pub amount: f64,
        /// RFC3339 timestamp.
        pub date: DateTime<Utc>,
        #[validate(range(min = 1, message = "is required"))]
        pub category_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: i32,
        pub title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        pub amount: f64,
        pub date: DateTime<Utc>,
        pub owner_id: i32,
        pub category_id: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub file_url: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query string of `GET /expenses`.
    ///
    /// Values are kept as raw strings so that garbage falls back to the
    /// defaults instead of rejecting the request.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        pub page: Option<String>,
        pub limit: Option<String>,
        pub sort: Option<String>,
        pub search: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensePage {
        pub items: Vec<ExpenseView>,
        /// Matches after search, before paging.
        pub total: u64,
        pub page: u64,
        pub limit: u64,
    }
}
