//! Request extractors that report failures through the response envelope.

use api_types::expense::ExpenseRequest;
use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{ReceiptUpload, ServerError};

/// JSON body that has passed its `validator` rules.
pub(crate) struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("rejected JSON body: {rejection}");
            ServerError::BadRequest("Invalid request payload".to_string())
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Parses a path id, `what` names the resource in the error message.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i32, ServerError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::BadRequest(format!("Invalid {what} ID")))
}

/// Body of expense create/update: JSON, or a multipart form with an
/// optional receipt in the `file` field.
pub(crate) struct ExpenseForm {
    pub request: ExpenseRequest,
    pub receipt: Option<ReceiptUpload>,
}

#[derive(Default)]
struct RawExpenseFields {
    title: Option<String>,
    description: Option<String>,
    amount: Option<String>,
    date: Option<String>,
    category_id: Option<String>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ServerError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::field(field, "is required"))
}

impl RawExpenseFields {
    fn into_request(self) -> Result<ExpenseRequest, ServerError> {
        let amount = required(&self.amount, "amount")?
            .parse::<f64>()
            .map_err(|_| ServerError::field("amount", "must be a number"))?;
        let date = DateTime::parse_from_rfc3339(required(&self.date, "date")?)
            .map_err(|_| ServerError::field("date", "must be an RFC 3339 timestamp"))?
            .with_timezone(&Utc);
        let category_id = required(&self.category_id, "category_id")?
            .parse::<i32>()
            .map_err(|_| ServerError::field("category_id", "must be an integer"))?;

        Ok(ExpenseRequest {
            title: self.title.unwrap_or_default(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            amount,
            date,
            category_id,
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ExpenseForm, ServerError> {
    let bad_form = |err: axum::extract::multipart::MultipartError| {
        tracing::debug!("rejected multipart body: {err}");
        ServerError::BadRequest("Invalid request payload".to_string())
    };

    let mut fields = RawExpenseFields::default();
    let mut receipt = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;
                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                receipt = Some(ReceiptUpload { file_name, bytes });
            }
            "title" => fields.title = Some(field.text().await.map_err(bad_form)?),
            "description" => fields.description = Some(field.text().await.map_err(bad_form)?),
            "amount" => fields.amount = Some(field.text().await.map_err(bad_form)?),
            "date" => fields.date = Some(field.text().await.map_err(bad_form)?),
            "category_id" => fields.category_id = Some(field.text().await.map_err(bad_form)?),
            _ => {}
        }
    }

    Ok(ExpenseForm {
        request: fields.into_request()?,
        receipt,
    })
}

impl<S> FromRequest<S> for ExpenseForm
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"));

        if !is_multipart {
            let ValidatedJson(request) = ValidatedJson::from_request(req, state).await?;
            return Ok(Self {
                request,
                receipt: None,
            });
        }

        let multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("rejected multipart request: {rejection}");
            ServerError::BadRequest("Invalid request payload".to_string())
        })?;
        let form = read_multipart(multipart).await?;
        form.request.validate()?;
        if let Some(receipt) = &form.receipt {
            receipt.validate()?;
        }
        Ok(form)
    }
}
