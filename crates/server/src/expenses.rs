//! Expenses API endpoints.

use api_types::expense::{ExpenseListQuery, ExpensePage, ExpenseRequest, ExpenseView};
use axum::{
    Extension,
    extract::{Path, Query, State},
};
use engine::{ExpenseDraft, Pagination};

use crate::{
    AuthUser, Reply, ServerError, StoredReceipt,
    extract::{ExpenseForm, parse_id},
    receipts::discard,
    server::ServerState,
};

fn map_expense(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        title: expense.title,
        description: expense.description,
        amount: expense.amount,
        date: expense.date,
        owner_id: expense.owner,
        category_id: expense.category_id,
        file_url: expense.receipt.map(|r| r.url),
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

fn to_draft(payload: ExpenseRequest, receipt: Option<&StoredReceipt>) -> ExpenseDraft {
    ExpenseDraft {
        title: payload.title,
        description: payload.description,
        amount: payload.amount,
        date: payload.date,
        category_id: payload.category_id,
        receipt: receipt.cloned().map(Into::into),
    }
}

/// Stores the receipt of `form`, if any, before the expense is written.
async fn store_receipt(
    state: &ServerState,
    form: &mut ExpenseForm,
) -> Result<Option<StoredReceipt>, ServerError> {
    match form.receipt.take() {
        Some(upload) => Ok(Some(state.receipts.put(upload).await?)),
        None => Ok(None),
    }
}

pub async fn create(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    mut form: ExpenseForm,
) -> Result<Reply<ExpenseView>, ServerError> {
    let receipt = store_receipt(&state, &mut form).await?;
    let draft = to_draft(form.request, receipt.as_ref());

    match state.engine.create_expense(draft, user_id).await {
        Ok(expense) => Ok(Reply::created(
            "Expense created successfully",
            map_expense(expense),
        )),
        Err(err) => {
            discard(state.receipts.as_ref(), receipt).await;
            Err(err.into())
        }
    }
}

pub async fn list(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Reply<ExpensePage>, ServerError> {
    let pagination = Pagination::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        query.sort.as_deref(),
        query.search.as_deref(),
    )?;
    let page = state.engine.expenses(user_id, &pagination).await?;

    Ok(Reply::ok(
        "Expenses retrieved successfully",
        ExpensePage {
            items: page.items.into_iter().map(map_expense).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
        },
    ))
}

pub async fn get(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Reply<ExpenseView>, ServerError> {
    let id = parse_id(&raw_id, "expense")?;
    let expense = state
        .engine
        .expense(id, user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Expense not found".to_string()))?;
    Ok(Reply::ok(
        "Expense retrieved successfully",
        map_expense(expense),
    ))
}

pub async fn update(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
    mut form: ExpenseForm,
) -> Result<Reply<ExpenseView>, ServerError> {
    let id = parse_id(&raw_id, "expense")?;
    let receipt = store_receipt(&state, &mut form).await?;
    let draft = to_draft(form.request, receipt.as_ref());

    match state.engine.update_expense(id, draft, user_id).await {
        Ok(replaced) => {
            discard(state.receipts.as_ref(), replaced.previous_receipt).await;
            Ok(Reply::ok(
                "Expense updated successfully",
                map_expense(replaced.expense),
            ))
        }
        Err(err) => {
            discard(state.receipts.as_ref(), receipt).await;
            Err(err.into())
        }
    }
}

pub async fn delete(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Reply<()>, ServerError> {
    let id = parse_id(&raw_id, "expense")?;
    let expense = state.engine.delete_expense(id, user_id).await?;
    discard(state.receipts.as_ref(), expense.receipt).await;
    Ok(Reply::done("Expense deleted successfully"))
}
