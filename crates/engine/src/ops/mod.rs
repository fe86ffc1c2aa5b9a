use std::{fmt, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, SharedStore, SqlStore, Store, UserId};

mod accounts;
mod categories;
mod expenses;
mod users;

pub struct Engine {
    store: SharedStore,
    password_cost: u32,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("password_cost", &self.password_cost)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// `0` is never a stored id.
fn require_id(id: i32, label: &str) -> ResultEngine<()> {
    if id <= 0 {
        return Err(EngineError::InvalidId(label.to_string()));
    }
    Ok(())
}

fn require_user(user_id: UserId) -> ResultEngine<()> {
    require_id(user_id, "user")
}

fn normalize_required_name(value: &str, field: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    store: Option<SharedStore>,
    password_cost: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            store: None,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.store = Some(Arc::new(SqlStore::new(db)));
        self
    }

    /// Use an already built storage backend instead of a database.
    pub fn store(mut self, store: Arc<dyn Store>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// bcrypt work factor. Tests lower it to keep hashing fast.
    pub fn password_cost(mut self, cost: u32) -> EngineBuilder {
        self.password_cost = cost;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = self.store.ok_or(EngineError::NoStore)?;
        Ok(Engine {
            store,
            password_cost: self.password_cost,
        })
    }
}

#[cfg(test)]
pub(crate) async fn test_engine() -> Engine {
    use crate::store::memory::MemoryStore;

    Engine::builder()
        .store(Arc::new(MemoryStore::new()))
        .password_cost(4)
        .build()
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_without_store_fails() {
        let err = Engine::builder().build().await.unwrap_err();
        assert_eq!(err, EngineError::NoStore);
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(normalize_required_name("  Food ", "name").unwrap(), "Food");
        assert!(matches!(
            normalize_required_name("   ", "name"),
            Err(EngineError::Validation { ref field, .. }) if field == "name"
        ));
        assert_eq!(normalize_optional_text(Some("  ")), None);
    }
}
