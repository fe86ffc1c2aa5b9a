use tracing::debug;

use crate::{Category, CategoryDraft, EngineError, Owner, ResultEngine, Scope};

use super::{Engine, normalize_required_name, require_id};

impl Engine {
    pub async fn create_category(
        &self,
        draft: CategoryDraft,
        owner: Owner,
    ) -> ResultEngine<Category> {
        if let Owner::User(user_id) = owner {
            super::require_user(user_id)?;
        }
        let draft = CategoryDraft {
            name: normalize_required_name(&draft.name, "name")?,
        };
        let category = self.store.insert_category(owner, &draft).await?;
        debug!(category_id = category.id, ?owner, "category created");
        Ok(category)
    }

    pub async fn categories(&self, scope: Scope) -> ResultEngine<Vec<Category>> {
        self.store.categories(scope).await
    }

    /// Single category lookup, with the same visibility as [`Engine::categories`].
    pub async fn category(&self, id: i32, scope: Scope) -> ResultEngine<Option<Category>> {
        require_id(id, "category")?;
        self.store.category(id, scope).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        draft: CategoryDraft,
        scope: Scope,
    ) -> ResultEngine<Category> {
        require_id(id, "category")?;
        let draft = CategoryDraft {
            name: normalize_required_name(&draft.name, "name")?,
        };
        self.store
            .replace_category(id, scope, &draft)
            .await?
            .ok_or_else(|| EngineError::NotFound("category".to_string()))
    }

    /// Categories that expenses still point at cannot be deleted.
    pub async fn delete_category(&self, id: i32, scope: Scope) -> ResultEngine<()> {
        require_id(id, "category")?;
        if self.store.delete_category(id, scope).await? == 0 {
            return Err(EngineError::NotFound("category".to_string()));
        }
        debug!(category_id = id, ?scope, "category deleted");
        Ok(())
    }
}
