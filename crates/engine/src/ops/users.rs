use tracing::{debug, info};

use crate::{EngineError, NewUser, ResultEngine, User, UserId};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Registers a new user and stores a bcrypt hash of `password`.
    ///
    /// Emails are compared lowercased. A taken email or username is a
    /// [`EngineError::Conflict`].
    pub async fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ResultEngine<User> {
        let username = normalize_required_name(username, "username")?;
        let email = normalize_required_name(email, "email")?.to_lowercase();
        if password.is_empty() {
            return Err(EngineError::validation("password", "must not be empty"));
        }

        if self.store.user_by_email(&email).await?.is_some() {
            return Err(EngineError::Conflict("email".to_string()));
        }
        if self.store.user_by_username(&username).await?.is_some() {
            return Err(EngineError::Conflict("username".to_string()));
        }

        let password_hash = bcrypt::hash(password, self.password_cost)?;
        // The unique indexes still catch a concurrent registration.
        let user = self
            .store
            .insert_user(NewUser {
                username,
                email,
                password_hash,
            })
            .await?;
        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Returns the user owning `email` if `password` matches.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.store.user_by_email(&email).await? else {
            debug!("login for unknown email");
            return Err(EngineError::InvalidCredentials);
        };
        if !bcrypt::verify(password, &user.password_hash)? {
            debug!(user_id = user.id, "login with wrong password");
            return Err(EngineError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn user(&self, id: UserId) -> ResultEngine<Option<User>> {
        super::require_user(id)?;
        self.store.user_by_id(id).await
    }
}
