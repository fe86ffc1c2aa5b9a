use tracing::debug;

use crate::{
    EngineError, Expense, ExpenseDraft, Page, Pagination, ReplacedExpense, ResultEngine, Scope,
    UserId,
};

use super::{Engine, normalize_optional_text, normalize_required_name, require_id, require_user};

impl Engine {
    async fn normalize_expense_draft(
        &self,
        draft: ExpenseDraft,
        user_id: UserId,
    ) -> ResultEngine<ExpenseDraft> {
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(EngineError::validation("amount", "must be greater than 0"));
        }
        if draft.category_id <= 0 {
            return Err(EngineError::validation("category_id", "is required"));
        }
        // Global categories or the caller's own.
        if self
            .store
            .category(draft.category_id, Scope::User(user_id))
            .await?
            .is_none()
        {
            return Err(EngineError::validation(
                "category_id",
                "category does not exist",
            ));
        }

        Ok(ExpenseDraft {
            title: normalize_required_name(&draft.title, "title")?,
            description: normalize_optional_text(draft.description.as_deref()),
            amount: draft.amount,
            date: draft.date,
            category_id: draft.category_id,
            receipt: draft.receipt,
        })
    }

    pub async fn create_expense(&self, draft: ExpenseDraft, user_id: UserId) -> ResultEngine<Expense> {
        require_user(user_id)?;
        let draft = self.normalize_expense_draft(draft, user_id).await?;
        let expense = self.store.insert_expense(user_id, &draft).await?;
        debug!(expense_id = expense.id, user_id, "expense created");
        Ok(expense)
    }

    /// One page of the caller's expenses, filtered and sorted per `pagination`.
    pub async fn expenses(
        &self,
        user_id: UserId,
        pagination: &Pagination,
    ) -> ResultEngine<Page<Expense>> {
        require_user(user_id)?;
        self.store.expense_page(user_id, pagination).await
    }

    pub async fn expense(&self, id: i32, user_id: UserId) -> ResultEngine<Option<Expense>> {
        require_id(id, "expense")?;
        self.store.expense(id, user_id).await
    }

    /// Replaces the expense fields. `draft.receipt = None` keeps the current
    /// receipt; a new one detaches the old receipt, which is handed back so
    /// the caller can remove the file.
    pub async fn update_expense(
        &self,
        id: i32,
        draft: ExpenseDraft,
        user_id: UserId,
    ) -> ResultEngine<ReplacedExpense> {
        require_id(id, "expense")?;
        require_user(user_id)?;
        let draft = self.normalize_expense_draft(draft, user_id).await?;
        self.store
            .replace_expense(id, user_id, &draft)
            .await?
            .ok_or_else(|| EngineError::NotFound("expense".to_string()))
    }

    /// Returns the deleted expense; its receipt is no longer referenced.
    pub async fn delete_expense(&self, id: i32, user_id: UserId) -> ResultEngine<Expense> {
        require_id(id, "expense")?;
        let expense = self
            .store
            .delete_expense(id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("expense".to_string()))?;
        debug!(expense_id = id, user_id, "expense deleted");
        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{CategoryDraft, Owner, Receipt, Sort, SortField, SortOrder, ops::test_engine};

    use super::*;

    fn draft(title: &str, amount: f64, category_id: i32) -> ExpenseDraft {
        ExpenseDraft {
            title: title.to_string(),
            description: None,
            amount,
            date: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            category_id,
            receipt: None,
        }
    }

    fn receipt(key: &str) -> Receipt {
        Receipt {
            url: format!("http://localhost/receipts/{key}"),
            key: key.to_string(),
        }
    }

    async fn engine_with_category(owner: Owner) -> (Engine, i32) {
        let engine = test_engine().await;
        let category = engine
            .create_category(
                CategoryDraft {
                    name: "Food".to_string(),
                },
                owner,
            )
            .await
            .unwrap();
        (engine, category.id)
    }

    #[tokio::test]
    async fn create_requires_a_visible_category() {
        let (engine, foreign) = engine_with_category(Owner::User(2)).await;
        let err = engine
            .create_expense(draft("Lunch", 10.0, foreign), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "category_id"));

        let global = engine
            .create_category(
                CategoryDraft {
                    name: "Travel".to_string(),
                },
                Owner::Global,
            )
            .await
            .unwrap();
        let expense = engine
            .create_expense(draft("Train", 30.0, global.id), 1)
            .await
            .unwrap();
        assert_eq!(expense.owner, 1);
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let (engine, category) = engine_with_category(Owner::Global).await;
        for amount in [0.0, -3.0, f64::NAN] {
            let err = engine
                .create_expense(draft("Lunch", amount, category), 1)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "amount"));
        }
    }

    #[tokio::test]
    async fn expenses_are_private_to_their_owner() {
        let (engine, category) = engine_with_category(Owner::Global).await;
        let expense = engine
            .create_expense(draft("Lunch", 10.0, category), 1)
            .await
            .unwrap();

        assert!(engine.expense(expense.id, 2).await.unwrap().is_none());
        let err = engine
            .update_expense(expense.id, draft("Mine now", 1.0, category), 2)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound("expense".to_string()));
        let err = engine.delete_expense(expense.id, 2).await.unwrap_err();
        assert_eq!(err, EngineError::NotFound("expense".to_string()));

        let page = engine.expenses(2, &Pagination::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn update_without_receipt_keeps_the_stored_one() {
        let (engine, category) = engine_with_category(Owner::Global).await;
        let mut with_receipt = draft("Lunch", 10.0, category);
        with_receipt.receipt = Some(receipt("a.png"));
        let expense = engine.create_expense(with_receipt, 1).await.unwrap();

        let updated = engine
            .update_expense(expense.id, draft("Dinner", 20.0, category), 1)
            .await
            .unwrap();
        assert_eq!(updated.expense.title, "Dinner");
        assert_eq!(updated.expense.receipt, expense.receipt);
        assert_eq!(updated.previous_receipt, None);
    }

    #[tokio::test]
    async fn replaced_and_deleted_receipts_are_handed_back() {
        let (engine, category) = engine_with_category(Owner::Global).await;
        let mut first = draft("Lunch", 10.0, category);
        first.receipt = Some(receipt("a.png"));
        let expense = engine.create_expense(first, 1).await.unwrap();

        let mut second = draft("Lunch", 10.0, category);
        second.receipt = Some(receipt("b.png"));
        let updated = engine.update_expense(expense.id, second, 1).await.unwrap();
        assert_eq!(updated.expense.receipt, Some(receipt("b.png")));
        assert_eq!(updated.previous_receipt, Some(receipt("a.png")));

        let deleted = engine.delete_expense(expense.id, 1).await.unwrap();
        assert_eq!(deleted.receipt, Some(receipt("b.png")));
    }

    #[tokio::test]
    async fn pages_are_counted_before_paging_and_searched() {
        let (engine, category) = engine_with_category(Owner::Global).await;
        for i in 1..=25 {
            let title = if i % 5 == 0 { format!("Coffee {i}") } else { format!("Rent {i}") };
            engine
                .create_expense(draft(&title, i as f64, category), 1)
                .await
                .unwrap();
        }

        let pagination = Pagination {
            page: 3,
            limit: 10,
            sort: Sort {
                field: SortField::Amount,
                order: SortOrder::Asc,
            },
            search: None,
        };
        let page = engine.expenses(1, &pagination).await.unwrap();
        assert_eq!(page.total, 25);
        let amounts: Vec<f64> = page.items.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![21.0, 22.0, 23.0, 24.0, 25.0]);

        let pagination = Pagination {
            search: Some("COFFEE".to_string()),
            ..Pagination::default()
        };
        let page = engine.expenses(1, &pagination).await.unwrap();
        assert_eq!(page.total, 5);
        assert!(page.items.iter().all(|e| e.title.starts_with("Coffee")));
    }
}
