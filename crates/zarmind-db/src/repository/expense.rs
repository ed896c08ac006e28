//! # Expense Repository
//!
//! Expense categories and the expenses booked against them.
//!
//! ```text
//! expense_categories ◄──── expenses.category_id
//!        ▲
//!        └──── parent_id (optional nesting)
//! ```
//!
//! A category that still has expenses cannot be deleted; the caller checks
//! [`ExpenseRepository::category_usage`] first.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate::{self, GroupTotal};
use crate::error::{DbError, DbResult};
use crate::query::{self, money_bound, Filter, Resource};
use zarmind_core::paging::parse_flag;
use zarmind_core::{
    Expense, ExpenseCategory, ExpenseQuery, Money, PagedResult, SortOrder, DEFAULT_PAGE_LIMIT,
};

pub const EXPENSE_CATEGORIES: Resource = Resource {
    entity: "Expense category",
    table: "expense_categories",
    columns: "*",
    search_columns: &["name", "name_en", "description"],
    sort_columns: &[("name", "name"), ("createdAt", "created_at")],
    default_sort: "name",
    default_order: SortOrder::Asc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

pub const EXPENSES: Resource = Resource {
    entity: "Expense",
    table: "expenses",
    columns: "*",
    search_columns: &["title", "description", "vendor", "invoice_number"],
    sort_columns: &[
        ("expenseDate", "expense_date"),
        ("amount", "amount"),
        ("title", "title"),
        ("createdAt", "created_at"),
    ],
    default_sort: "expense_date",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

/// Expense totals for a date range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseTotals {
    pub count: i64,
    pub amount: Money,
    /// Keyed by category id.
    pub by_category: BTreeMap<String, GroupTotal>,
    /// Keyed by payment method.
    pub by_payment_method: BTreeMap<String, GroupTotal>,
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Active categories by name, optionally narrowed by a search term.
    pub async fn list_categories(&self, search: Option<&str>) -> DbResult<Vec<ExpenseCategory>> {
        let filter = Filter::new()
            .eq("is_active", true)
            .search(EXPENSE_CATEGORIES.search_columns, search);
        query::fetch_all(&self.pool, &EXPENSE_CATEGORIES, &filter).await
    }

    pub async fn categories_by_ids(&self, ids: &[String]) -> DbResult<Vec<ExpenseCategory>> {
        let filter = Filter::new().in_list("id", ids.iter());
        query::fetch_all(&self.pool, &EXPENSE_CATEGORIES, &filter).await
    }

    pub async fn get_category_by_id(&self, id: &str) -> DbResult<Option<ExpenseCategory>> {
        query::fetch_optional(&self.pool, &EXPENSE_CATEGORIES, &Filter::new().eq("id", id)).await
    }

    pub async fn get_category(&self, id: &str) -> DbResult<ExpenseCategory> {
        self.get_category_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EXPENSE_CATEGORIES.entity, id))
    }

    pub async fn category_exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get_category_by_id(id).await?.is_some())
    }

    pub async fn insert_category(&self, c: &ExpenseCategory) -> DbResult<ExpenseCategory> {
        debug!(name = %c.name, "Inserting expense category");

        sqlx::query(
            r#"
            INSERT INTO expense_categories (
                id, name, name_en, description, parent_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&c.id)
        .bind(&c.name)
        .bind(&c.name_en)
        .bind(&c.description)
        .bind(&c.parent_id)
        .bind(c.is_active)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(c.clone())
    }

    pub async fn update_category(&self, c: &ExpenseCategory) -> DbResult<()> {
        debug!(id = %c.id, "Updating expense category");

        let result = sqlx::query(
            r#"
            UPDATE expense_categories SET
                name = ?2, name_en = ?3, description = ?4, parent_id = ?5,
                is_active = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&c.id)
        .bind(&c.name)
        .bind(&c.name_en)
        .bind(&c.description)
        .bind(&c.parent_id)
        .bind(c.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EXPENSE_CATEGORIES.entity, &c.id));
        }
        Ok(())
    }

    /// Expenses booked against the category.
    pub async fn category_usage(&self, id: &str) -> DbResult<i64> {
        aggregate::count_where(&self.pool, EXPENSES.table, &Filter::new().eq("category_id", id))
            .await
    }

    pub async fn delete_category(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense category");

        let result = sqlx::query("DELETE FROM expense_categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EXPENSE_CATEGORIES.entity, id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Expenses
    // -------------------------------------------------------------------------

    pub async fn list(&self, q: &ExpenseQuery) -> DbResult<PagedResult<Expense>> {
        let filter = Filter::new()
            .eq_opt("category_id", q.category_id.as_deref())
            .contains_opt("vendor", q.vendor.as_deref())
            .eq_opt("is_recurring", parse_flag(q.is_recurring.as_deref()))
            .range("expense_date", q.from, q.to)
            .range(
                "amount",
                money_bound(q.min_amount.as_deref()),
                money_bound(q.max_amount.as_deref()),
            );
        query::paginate(&self.pool, &EXPENSES, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        query::fetch_optional(&self.pool, &EXPENSES, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Expense> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EXPENSES.entity, id))
    }

    pub async fn insert(&self, e: &Expense) -> DbResult<Expense> {
        debug!(title = %e.title, amount = %e.amount, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, category_id, amount, expense_date, title, description, vendor,
                invoice_number, receipt_images, payment_method, reference_number,
                is_recurring, recurring_pattern, approved_by, approved_at, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(&e.id)
        .bind(&e.category_id)
        .bind(e.amount)
        .bind(e.expense_date)
        .bind(&e.title)
        .bind(&e.description)
        .bind(&e.vendor)
        .bind(&e.invoice_number)
        .bind(&e.receipt_images)
        .bind(e.payment_method)
        .bind(&e.reference_number)
        .bind(e.is_recurring)
        .bind(&e.recurring_pattern)
        .bind(&e.approved_by)
        .bind(e.approved_at)
        .bind(&e.notes)
        .bind(e.created_at)
        .bind(e.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(e.clone())
    }

    /// Full-row write of a merged expense. Approval is left alone.
    pub async fn update(&self, e: &Expense) -> DbResult<()> {
        debug!(id = %e.id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                category_id = ?2, amount = ?3, expense_date = ?4, title = ?5,
                description = ?6, vendor = ?7, invoice_number = ?8, receipt_images = ?9,
                payment_method = ?10, reference_number = ?11, is_recurring = ?12,
                recurring_pattern = ?13, notes = ?14, updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&e.id)
        .bind(&e.category_id)
        .bind(e.amount)
        .bind(e.expense_date)
        .bind(&e.title)
        .bind(&e.description)
        .bind(&e.vendor)
        .bind(&e.invoice_number)
        .bind(&e.receipt_images)
        .bind(e.payment_method)
        .bind(&e.reference_number)
        .bind(e.is_recurring)
        .bind(&e.recurring_pattern)
        .bind(&e.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EXPENSES.entity, &e.id));
        }
        Ok(())
    }

    pub async fn approve(&self, id: &str, user_id: &str, at: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, user = %user_id, "Approving expense");

        let result = sqlx::query(
            "UPDATE expenses SET approved_by = ?2, approved_at = ?3, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EXPENSES.entity, id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EXPENSES.entity, id));
        }
        Ok(())
    }

    /// Counts and sums over `expense_date` in `[from, to]`.
    pub async fn totals(&self, from: NaiveDate, to: NaiveDate) -> DbResult<ExpenseTotals> {
        let pool = &self.pool;
        let table = EXPENSES.table;
        let scope = Filter::new().range("expense_date", Some(from), Some(to));

        Ok(ExpenseTotals {
            count: aggregate::count_where(pool, table, &scope).await?,
            amount: aggregate::sum_money_where(pool, table, "amount", &scope).await?,
            by_category: aggregate::group_totals_where(pool, table, "category_id", "amount", &scope)
                .await?,
            by_payment_method: aggregate::group_totals_where(
                pool,
                table,
                "payment_method",
                "amount",
                &scope,
            )
            .await?,
        })
    }
}
