//! Accounts API endpoints.

use api_types::account::{AccountRequest, AccountView};
use axum::{
    Extension,
    extract::{Path, State},
};
use engine::{AccountDraft, Owner, Scope};

use crate::{
    AuthUser, Reply, ServerError,
    extract::{ValidatedJson, parse_id},
    server::ServerState,
};

fn map_account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        account_type: account.account_type,
        balance: account.balance,
        description: account.description,
        icon: account.icon,
        is_global: account.owner.is_global(),
        owner_id: account.owner.user_id(),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

fn to_draft(payload: AccountRequest) -> AccountDraft {
    AccountDraft {
        name: payload.name,
        account_type: payload.account_type,
        balance: payload.balance,
        description: payload.description,
        icon: payload.icon,
    }
}

pub async fn list_global(
    State(state): State<ServerState>,
) -> Result<Reply<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.accounts(Scope::Global).await?;
    Ok(Reply::ok(
        "Global accounts retrieved successfully",
        accounts.into_iter().map(map_account).collect(),
    ))
}

pub async fn create_global(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<AccountRequest>,
) -> Result<Reply<AccountView>, ServerError> {
    let account = state
        .engine
        .create_account(to_draft(payload), Owner::Global)
        .await?;
    Ok(Reply::created(
        "Global account created successfully",
        map_account(account),
    ))
}

pub async fn list(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Reply<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.accounts(Scope::User(user_id)).await?;
    Ok(Reply::ok(
        "Accounts retrieved successfully",
        accounts.into_iter().map(map_account).collect(),
    ))
}

pub async fn create(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<AccountRequest>,
) -> Result<Reply<AccountView>, ServerError> {
    let account = state
        .engine
        .create_account(to_draft(payload), Owner::User(user_id))
        .await?;
    Ok(Reply::created(
        "Account created successfully",
        map_account(account),
    ))
}

pub async fn get(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Reply<AccountView>, ServerError> {
    let id = parse_id(&raw_id, "account")?;
    let account = state
        .engine
        .account(id, Scope::User(user_id))
        .await?
        .ok_or_else(|| ServerError::NotFound("Account not found".to_string()))?;
    Ok(Reply::ok(
        "Account retrieved successfully",
        map_account(account),
    ))
}

pub async fn update(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<AccountRequest>,
) -> Result<Reply<AccountView>, ServerError> {
    let id = parse_id(&raw_id, "account")?;
    let account = state
        .engine
        .update_account(id, to_draft(payload), Scope::User(user_id))
        .await?;
    Ok(Reply::ok(
        "Account updated successfully",
        map_account(account),
    ))
}

pub async fn delete(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Reply<()>, ServerError> {
    let id = parse_id(&raw_id, "account")?;
    state
        .engine
        .delete_account(id, Scope::User(user_id))
        .await?;
    Ok(Reply::done("Account deleted successfully"))
}
