use tracing::debug;

use crate::{Account, AccountDraft, EngineError, Owner, ResultEngine, Scope};

use super::{Engine, normalize_optional_text, normalize_required_name, require_id};

fn normalize_draft(draft: AccountDraft) -> ResultEngine<AccountDraft> {
    if !draft.balance.is_finite() || draft.balance < 0.0 {
        return Err(EngineError::validation(
            "balance",
            "must be a non-negative number",
        ));
    }
    Ok(AccountDraft {
        name: normalize_required_name(&draft.name, "name")?,
        account_type: normalize_required_name(&draft.account_type, "account_type")?,
        balance: draft.balance,
        description: normalize_optional_text(draft.description.as_deref()),
        icon: normalize_optional_text(draft.icon.as_deref()),
    })
}

impl Engine {
    /// Stores a new account for `owner`.
    ///
    /// `Owner::Global` creates a template visible to every user.
    pub async fn create_account(&self, draft: AccountDraft, owner: Owner) -> ResultEngine<Account> {
        if let Owner::User(user_id) = owner {
            super::require_user(user_id)?;
        }
        let draft = normalize_draft(draft)?;
        let account = self.store.insert_account(owner, &draft).await?;
        debug!(account_id = account.id, ?owner, "account created");
        Ok(account)
    }

    /// Accounts visible to `scope`, ordered by id.
    pub async fn accounts(&self, scope: Scope) -> ResultEngine<Vec<Account>> {
        self.store.accounts(scope).await
    }

    pub async fn account(&self, id: i32, scope: Scope) -> ResultEngine<Option<Account>> {
        require_id(id, "account")?;
        self.store.account(id, scope).await
    }

    /// Replaces every caller controlled field. The owner never changes.
    pub async fn update_account(
        &self,
        id: i32,
        draft: AccountDraft,
        scope: Scope,
    ) -> ResultEngine<Account> {
        require_id(id, "account")?;
        let draft = normalize_draft(draft)?;
        self.store
            .replace_account(id, scope, &draft)
            .await?
            .ok_or_else(|| EngineError::NotFound("account".to_string()))
    }

    pub async fn delete_account(&self, id: i32, scope: Scope) -> ResultEngine<()> {
        require_id(id, "account")?;
        if self.store.delete_account(id, scope).await? == 0 {
            return Err(EngineError::NotFound("account".to_string()));
        }
        debug!(account_id = id, ?scope, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ops::test_engine;

    use super::*;

    fn draft(name: &str) -> AccountDraft {
        AccountDraft {
            name: name.to_string(),
            account_type: "bank".to_string(),
            balance: 100.0,
            description: Some("  main account ".to_string()),
            icon: Some("".to_string()),
        }
    }

    #[tokio::test]
    async fn create_normalizes_text_fields() {
        let engine = test_engine().await;
        let account = engine
            .create_account(draft("  Checking "), Owner::User(1))
            .await
            .unwrap();
        assert_eq!(account.name, "Checking");
        assert_eq!(account.description.as_deref(), Some("main account"));
        assert_eq!(account.icon, None);
        assert_eq!(account.owner, Owner::User(1));
    }

    #[tokio::test]
    async fn negative_balance_is_rejected() {
        let engine = test_engine().await;
        let mut d = draft("Cash");
        d.balance = -0.01;
        let err = engine.create_account(d, Owner::User(1)).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "balance"));
    }

    #[tokio::test]
    async fn users_see_globals_and_their_own_only() {
        let engine = test_engine().await;
        let global = engine
            .create_account(draft("Template"), Owner::Global)
            .await
            .unwrap();
        let mine = engine
            .create_account(draft("Mine"), Owner::User(1))
            .await
            .unwrap();
        let theirs = engine
            .create_account(draft("Theirs"), Owner::User(2))
            .await
            .unwrap();

        let ids: Vec<i32> = engine
            .accounts(Scope::User(1))
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![global.id, mine.id]);

        let ids: Vec<i32> = engine
            .accounts(Scope::Global)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![global.id]);

        assert_eq!(engine.account(theirs.id, Scope::User(1)).await.unwrap(), None);
        assert!(engine.account(global.id, Scope::User(2)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn zero_id_is_invalid() {
        let engine = test_engine().await;
        let err = engine.account(0, Scope::User(1)).await.unwrap_err();
        assert_eq!(err, EngineError::InvalidId("account".to_string()));
    }

    #[tokio::test]
    async fn users_cannot_modify_global_or_foreign_accounts() {
        let engine = test_engine().await;
        let global = engine
            .create_account(draft("Template"), Owner::Global)
            .await
            .unwrap();
        let theirs = engine
            .create_account(draft("Theirs"), Owner::User(2))
            .await
            .unwrap();

        for id in [global.id, theirs.id] {
            let err = engine
                .update_account(id, draft("Hijack"), Scope::User(1))
                .await
                .unwrap_err();
            assert_eq!(err, EngineError::NotFound("account".to_string()));
            let err = engine.delete_account(id, Scope::User(1)).await.unwrap_err();
            assert_eq!(err, EngineError::NotFound("account".to_string()));
        }

        let still = engine.account(global.id, Scope::Global).await.unwrap().unwrap();
        assert_eq!(still.name, "Template");
    }

    #[tokio::test]
    async fn update_keeps_owner_and_bumps_updated_at() {
        let engine = test_engine().await;
        let created = engine
            .create_account(draft("Cash"), Owner::User(1))
            .await
            .unwrap();
        let mut d = draft("Wallet");
        d.balance = 5.5;
        let updated = engine
            .update_account(created.id, d, Scope::User(1))
            .await
            .unwrap();
        assert_eq!(updated.name, "Wallet");
        assert_eq!(updated.balance, 5.5);
        assert_eq!(updated.owner, Owner::User(1));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let engine = test_engine().await;
        let created = engine
            .create_account(draft("Cash"), Owner::User(1))
            .await
            .unwrap();
        engine.delete_account(created.id, Scope::User(1)).await.unwrap();
        assert_eq!(engine.account(created.id, Scope::User(1)).await.unwrap(), None);
        let err = engine
            .delete_account(created.id, Scope::User(1))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound("account".to_string()));
    }
}
