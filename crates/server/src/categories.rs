//! Categories API endpoints.

use api_types::category::{CategoryRequest, CategoryView};
use axum::{
    Extension,
    extract::{Path, State},
};
use engine::{CategoryDraft, Owner, Scope};

use crate::{
    AuthUser, Reply, ServerError,
    extract::{ValidatedJson, parse_id},
    server::ServerState,
};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        is_global: category.owner.is_global(),
        owner_id: category.owner.user_id(),
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

fn to_draft(payload: CategoryRequest) -> CategoryDraft {
    CategoryDraft { name: payload.name }
}

pub async fn list_global(
    State(state): State<ServerState>,
) -> Result<Reply<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.categories(Scope::Global).await?;
    Ok(Reply::ok(
        "Global categories retrieved successfully",
        categories.into_iter().map(map_category).collect(),
    ))
}

pub async fn create_global(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<Reply<CategoryView>, ServerError> {
    let category = state
        .engine
        .create_category(to_draft(payload), Owner::Global)
        .await?;
    Ok(Reply::created(
        "Global category created successfully",
        map_category(category),
    ))
}

pub async fn list(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Reply<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.categories(Scope::User(user_id)).await?;
    Ok(Reply::ok(
        "Categories retrieved successfully",
        categories.into_iter().map(map_category).collect(),
    ))
}

pub async fn create(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<Reply<CategoryView>, ServerError> {
    let category = state
        .engine
        .create_category(to_draft(payload), Owner::User(user_id))
        .await?;
    Ok(Reply::created(
        "Category created successfully",
        map_category(category),
    ))
}

pub async fn get(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Reply<CategoryView>, ServerError> {
    let id = parse_id(&raw_id, "category")?;
    let category = state
        .engine
        .category(id, Scope::User(user_id))
        .await?
        .ok_or_else(|| ServerError::NotFound("Category not found".to_string()))?;
    Ok(Reply::ok(
        "Category retrieved successfully",
        map_category(category),
    ))
}

pub async fn update(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<Reply<CategoryView>, ServerError> {
    let id = parse_id(&raw_id, "category")?;
    let category = state
        .engine
        .update_category(id, to_draft(payload), Scope::User(user_id))
        .await?;
    Ok(Reply::ok(
        "Category updated successfully",
        map_category(category),
    ))
}

pub async fn delete(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Reply<()>, ServerError> {
    let id = parse_id(&raw_id, "category")?;
    state
        .engine
        .delete_category(id, Scope::User(user_id))
        .await?;
    Ok(Reply::done("Category deleted successfully"))
}
