use std::collections::BTreeMap;

use api_types::Envelope;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;
use serde::Serialize;
use serde_json::Value;
use validator::ValidationErrors;

pub use auth::{AuthError, AuthUser, Claims, DEFAULT_TOKEN_TTL_HOURS, IssuedToken, TokenSigner};
pub use receipts::{
    CloudinaryConfig, CloudinaryReceipts, DEFAULT_CLOUDINARY_FOLDER, LocalReceipts,
    MAX_RECEIPT_BYTES, ReceiptStore, ReceiptUpload, StoredReceipt, UploadError,
};
pub use server::{ServerConfig, ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod auth;
mod categories;
mod expenses;
mod extract;
mod receipts;
mod server;
mod users;

pub mod types {
    pub use api_types::{
        Envelope,
        account::{AccountRequest, AccountView},
        category::{CategoryRequest, CategoryView},
        expense::{ExpenseListQuery, ExpensePage, ExpenseRequest, ExpenseView},
        user::{LoginResponse, UserLogin, UserRegister, UserView},
    };
}

const MSG_BAD_REQUEST: &str = "The request was invalid.";
const MSG_INTERNAL: &str = "An internal server error occurred.";

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Field name to message.
    Validation(BTreeMap<String, String>),
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Upload(UploadError),
    Internal(String),
}

impl ServerError {
    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(BTreeMap::from([(field.to_string(), message.into())]))
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn field_errors(errors: BTreeMap<String, String>) -> Value {
    Value::Object(
        errors
            .into_iter()
            .map(|(field, message)| (field, Value::String(message)))
            .collect(),
    )
}

/// Status, message and optional `errors` payload for an engine error.
fn engine_error_parts(err: EngineError) -> (StatusCode, String, Option<Value>) {
    match err {
        EngineError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            MSG_BAD_REQUEST.to_string(),
            Some(field_errors(BTreeMap::from([(field, message)]))),
        ),
        EngineError::InvalidId(what) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid {what} ID"),
            None,
        ),
        EngineError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            format!("{} not found", capitalize(&what)),
            None,
        ),
        err @ (EngineError::Conflict(_) | EngineError::InUse(_)) => {
            (StatusCode::CONFLICT, capitalize(&err.to_string()), None)
        }
        EngineError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
            None,
        ),
        err @ (EngineError::PasswordHash(_) | EngineError::NoStore | EngineError::Database(_)) => {
            tracing::error!("engine error: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL.to_string(), None)
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ServerError::Engine(err) => engine_error_parts(err),
            ServerError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                MSG_BAD_REQUEST.to_string(),
                Some(field_errors(errors)),
            ),
            ServerError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            ServerError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, None),
            ServerError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            ServerError::Upload(UploadError::Invalid(message)) => (
                StatusCode::BAD_REQUEST,
                MSG_BAD_REQUEST.to_string(),
                Some(field_errors(BTreeMap::from([("file".to_string(), message)]))),
            ),
            ServerError::Upload(err) => {
                tracing::error!("receipt upload failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to upload receipt".to_string(),
                    None,
                )
            }
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL.to_string(), None)
            }
        };

        let body: Envelope<()> = Envelope {
            success: false,
            message,
            data: None,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<UploadError> for ServerError {
    fn from(value: UploadError) -> Self {
        Self::Upload(value)
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(value: ValidationErrors) -> Self {
        let errors = value
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "is invalid".to_string());
                (field.to_string(), message)
            })
            .collect();
        Self::Validation(errors)
    }
}

/// Successful envelope response.
pub(crate) struct Reply<T> {
    status: StatusCode,
    message: &'static str,
    data: Option<T>,
}

impl<T> Reply<T> {
    pub(crate) fn ok(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            data: Some(data),
        }
    }

    pub(crate) fn created(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message,
            data: Some(data),
        }
    }
}

impl Reply<()> {
    /// `200` without `data`.
    pub(crate) fn done(message: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            message: self.message.to_string(),
            data: self.data,
            errors: None,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("account".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Account not found");
    }

    #[tokio::test]
    async fn engine_validation_maps_to_400_with_field() {
        let err = EngineError::Validation {
            field: "category_id".to_string(),
            message: "category does not exist".to_string(),
        };
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = body_json(res).await;
        assert_eq!(json["errors"]["category_id"], "category does not exist");
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::Conflict("email".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn category_in_use_maps_to_409() {
        let res = ServerError::from(EngineError::InUse("category".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let json = body_json(res).await;
        assert_eq!(json["message"], "Category is still in use");
    }

    #[test]
    fn invalid_credentials_map_to_401() {
        let res = ServerError::from(EngineError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk I/O error".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(res).await;
        assert_eq!(json["message"], MSG_INTERNAL);
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn invalid_upload_is_a_file_field_error() {
        let res =
            ServerError::from(UploadError::Invalid("unsupported file type".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = body_json(res).await;
        assert_eq!(json["errors"]["file"], "unsupported file type");
    }

    #[tokio::test]
    async fn deleted_reply_has_no_data() {
        let res = Reply::done("Expense deleted successfully").into_response();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(
            json,
            serde_json::json!({"success": true, "message": "Expense deleted successfully"})
        );
    }
}
