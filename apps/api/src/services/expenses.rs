//! Expense categories and expenses.
//!
//! Categories are soft-listed: only active ones are returned, and one with
//! expenses attached cannot be deleted. Expenses carry an approval stamp
//! that only [`ExpenseService::approve`] writes.

use chrono::{Months, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::{clean, merge, merge_opt, require_reference};
use crate::error::{ApiError, ApiResult};
use zarmind_core::validation::{validate_name, validate_positive_amount};
use zarmind_core::{
    Expense, ExpenseCategory, ExpenseCategoryPatch, ExpensePatch, ExpenseQuery, JsonText, Money,
    NewExpense, NewExpenseCategory, PagedResult,
};
use zarmind_core::json::dedup_strings;
use zarmind_db::{new_id, Database, GroupTotal};

/// `GET /financials/expenses/summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub period: Period,
    #[serde(with = "zarmind_core::money::major")]
    pub total_amount: Money,
    pub total_count: i64,
    /// Largest total first.
    pub by_category: Vec<CategoryTotal>,
    pub by_payment_method: Vec<MethodTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: String,
    pub category_name: Option<String>,
    pub category_name_en: Option<String>,
    pub count: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodTotal {
    pub payment_method: String,
    pub count: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total_amount: Money,
}

pub struct ExpenseService {
    db: Database,
}

impl ExpenseService {
    pub fn new(db: &Database) -> Self {
        ExpenseService { db: db.clone() }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn create_category(&self, input: NewExpenseCategory) -> ApiResult<ExpenseCategory> {
        validate_name("name", &input.name)?;
        let repo = self.db.expenses();
        let parent_id = clean(input.parent_id);
        if let Some(parent) = parent_id.as_deref() {
            require_reference(repo.category_exists(parent).await?, "Parent category")?;
        }

        let now = Utc::now();
        let category = ExpenseCategory {
            id: new_id(),
            name: input.name.trim().to_string(),
            name_en: clean(input.name_en),
            description: clean(input.description),
            parent_id,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        let category = repo.insert_category(&category).await?;
        info!(id = %category.id, name = %category.name, "Expense category created");
        Ok(category)
    }

    pub async fn list_categories(&self, search: Option<&str>) -> ApiResult<Vec<ExpenseCategory>> {
        Ok(self.db.expenses().list_categories(search).await?)
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: ExpenseCategoryPatch,
    ) -> ApiResult<ExpenseCategory> {
        let repo = self.db.expenses();
        let mut category = repo.get_category(id).await?;

        if let Some(name) = patch.name.as_deref() {
            validate_name("name", name)?;
        }
        if let Some(parent) = clean(patch.parent_id.clone()) {
            if parent == id {
                return Err(ApiError::bad_request("A category cannot be its own parent"));
            }
            require_reference(repo.category_exists(&parent).await?, "Parent category")?;
        }

        merge(&mut category.name, patch.name.map(|n| n.trim().to_string()));
        merge_opt(&mut category.name_en, patch.name_en);
        merge_opt(&mut category.description, patch.description);
        merge_opt(&mut category.parent_id, clean(patch.parent_id));
        merge(&mut category.is_active, patch.is_active);

        category.updated_at = Utc::now();
        repo.update_category(&category).await?;
        Ok(category)
    }

    pub async fn remove_category(&self, id: &str) -> ApiResult<()> {
        let repo = self.db.expenses();
        repo.get_category(id).await?;
        if repo.category_usage(id).await? > 0 {
            return Err(ApiError::bad_request(
                "Cannot delete category with associated expenses",
            ));
        }
        repo.delete_category(id).await?;
        info!(id = %id, "Expense category deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Expenses
    // -------------------------------------------------------------------------

    pub async fn create(&self, input: NewExpense) -> ApiResult<Expense> {
        validate_name("title", &input.title)?;
        validate_positive_amount("amount", input.amount)?;
        let repo = self.db.expenses();
        require_reference(
            repo.category_exists(&input.category_id).await?,
            "Expense category",
        )?;

        let now = Utc::now();
        let expense = Expense {
            id: new_id(),
            category_id: input.category_id,
            amount: input.amount,
            expense_date: input.expense_date.unwrap_or_else(|| now.date_naive()),
            title: input.title.trim().to_string(),
            description: clean(input.description),
            vendor: clean(input.vendor),
            invoice_number: clean(input.invoice_number),
            receipt_images: JsonText(dedup_strings(input.receipt_images)),
            payment_method: input.payment_method.unwrap_or_default(),
            reference_number: clean(input.reference_number),
            is_recurring: input.is_recurring,
            recurring_pattern: clean(input.recurring_pattern),
            approved_by: None,
            approved_at: None,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };
        let expense = repo.insert(&expense).await?;
        info!(id = %expense.id, amount = %expense.amount, "Expense created");
        Ok(expense)
    }

    pub async fn list(&self, query: &ExpenseQuery) -> ApiResult<PagedResult<Expense>> {
        Ok(self.db.expenses().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Expense> {
        Ok(self.db.expenses().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: ExpensePatch) -> ApiResult<Expense> {
        let repo = self.db.expenses();
        let mut expense = repo.get(id).await?;

        if let Some(title) = patch.title.as_deref() {
            validate_name("title", title)?;
        }
        if let Some(amount) = patch.amount {
            validate_positive_amount("amount", amount)?;
        }
        if let Some(category) = patch.category_id.as_deref() {
            require_reference(repo.category_exists(category).await?, "Expense category")?;
        }

        merge(&mut expense.category_id, patch.category_id);
        merge(&mut expense.amount, patch.amount);
        merge(&mut expense.expense_date, patch.expense_date);
        merge(&mut expense.title, patch.title.map(|t| t.trim().to_string()));
        merge_opt(&mut expense.description, patch.description);
        merge_opt(&mut expense.vendor, patch.vendor);
        merge_opt(&mut expense.invoice_number, patch.invoice_number);
        merge(
            &mut expense.receipt_images,
            patch.receipt_images.map(|images| JsonText(dedup_strings(images))),
        );
        merge(&mut expense.payment_method, patch.payment_method);
        merge_opt(&mut expense.reference_number, patch.reference_number);
        merge(&mut expense.is_recurring, patch.is_recurring);
        merge_opt(&mut expense.recurring_pattern, patch.recurring_pattern);
        merge_opt(&mut expense.notes, patch.notes);

        expense.updated_at = Utc::now();
        repo.update(&expense).await?;
        Ok(expense)
    }

    /// Stamps the approver. Approving again moves the stamp to the new caller.
    pub async fn approve(&self, id: &str, user_id: &str) -> ApiResult<Expense> {
        let repo = self.db.expenses();
        repo.get(id).await?;
        repo.approve(id, user_id, Utc::now()).await?;
        info!(id = %id, user = %user_id, "Expense approved");
        Ok(repo.get(id).await?)
    }

    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let repo = self.db.expenses();
        repo.get(id).await?;
        repo.delete(id).await?;
        info!(id = %id, "Expense deleted");
        Ok(())
    }

    /// Totals over `[from, to]`, defaulting to the month ending today.
    pub async fn summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApiResult<ExpenseSummary> {
        let to = to.unwrap_or_else(|| Utc::now().date_naive());
        let from = from.unwrap_or_else(|| to.checked_sub_months(Months::new(1)).unwrap_or(to));
        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }

        let repo = self.db.expenses();
        let totals = repo.totals(from, to).await?;

        let ids: Vec<String> = totals.by_category.keys().cloned().collect();
        let categories = repo.categories_by_ids(&ids).await?;

        let mut by_category: Vec<CategoryTotal> = totals
            .by_category
            .into_iter()
            .map(|(category_id, GroupTotal { count, amount })| {
                let category = categories.iter().find(|c| c.id == category_id);
                CategoryTotal {
                    category_name: category.map(|c| c.name.clone()),
                    category_name_en: category.and_then(|c| c.name_en.clone()),
                    category_id,
                    count,
                    total_amount: amount,
                }
            })
            .collect();
        by_category.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

        let by_payment_method = totals
            .by_payment_method
            .into_iter()
            .map(|(payment_method, total)| MethodTotal {
                payment_method,
                count: total.count,
                total_amount: total.amount,
            })
            .collect();

        Ok(ExpenseSummary {
            period: Period { from, to },
            total_amount: totals.amount,
            total_count: totals.count,
            by_category,
            by_payment_method,
        })
    }
}
