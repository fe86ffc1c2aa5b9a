//! Registration, login and the caller's profile.

use api_types::user::{LoginResponse, UserLogin, UserRegister, UserView};
use axum::{Extension, extract::State};

use crate::{AuthUser, Reply, ServerError, extract::ValidatedJson, server::ServerState};

fn map_user(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }
}

pub async fn register(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<UserRegister>,
) -> Result<Reply<UserView>, ServerError> {
    let user = state
        .engine
        .register_user(&payload.username, &payload.email, &payload.password)
        .await?;
    Ok(Reply::created("User registered successfully", map_user(user)))
}

pub async fn login(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<UserLogin>,
) -> Result<Reply<LoginResponse>, ServerError> {
    let user = state
        .engine
        .verify_credentials(&payload.email, &payload.password)
        .await?;
    let issued = state
        .signer
        .issue(user.id)
        .map_err(|err| ServerError::Internal(format!("failed to generate token: {err}")))?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Reply::ok(
        "Login successful",
        LoginResponse {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
        },
    ))
}

pub async fn profile(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Reply<UserView>, ServerError> {
    let user = state
        .engine
        .user(user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;
    Ok(Reply::ok("User profile retrieved successfully", map_user(user)))
}
