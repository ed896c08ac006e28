//! # Work Order Repository
//!
//! Orders placed with workshops. Status transitions and date stamping are
//! applied to the row in memory by the caller; [`WorkOrderRepository::update`]
//! then writes the whole row back.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::query::{self, number_bound, Filter, Resource};
use zarmind_core::{PagedResult, SortOrder, WorkOrder, WorkOrderQuery, DEFAULT_PAGE_LIMIT};

pub const WORK_ORDERS: Resource = Resource {
    entity: "Work order",
    table: "work_orders",
    columns: "*",
    search_columns: &["order_number", "product_name", "description"],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("orderDate", "order_date"),
        ("orderNumber", "order_number"),
        ("priority", "priority"),
        ("status", "status"),
        ("expectedEndDate", "expected_end_date"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct WorkOrderRepository {
    pool: SqlitePool,
}

impl WorkOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WorkOrderRepository { pool }
    }

    pub async fn list(&self, q: &WorkOrderQuery) -> DbResult<PagedResult<WorkOrder>> {
        let filter = Filter::new()
            .eq_opt("workshop_id", q.workshop_id.as_deref())
            .eq_opt("status", q.status)
            .eq_opt("priority", q.priority)
            .range("order_date", q.from, q.to)
            .range(
                "quality_rating",
                number_bound(q.min_rating.as_deref()),
                number_bound(q.max_rating.as_deref()),
            );
        query::paginate(&self.pool, &WORK_ORDERS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<WorkOrder>> {
        query::fetch_optional(&self.pool, &WORK_ORDERS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<WorkOrder> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(WORK_ORDERS.entity, id))
    }

    pub async fn number_exists(&self, order_number: &str) -> DbResult<bool> {
        let found = query::fetch_optional::<WorkOrder>(
            &self.pool,
            &WORK_ORDERS,
            &Filter::new().eq("order_number", order_number),
        )
        .await?;
        Ok(found.is_some())
    }

    pub async fn insert(&self, w: &WorkOrder) -> DbResult<WorkOrder> {
        debug!(order_number = %w.order_number, workshop = %w.workshop_id, "Inserting work order");

        sqlx::query(
            r#"
            INSERT INTO work_orders (
                id, order_number, workshop_id, product_name, description, specifications,
                quantity, status, priority, order_date, start_date, expected_end_date,
                completed_date, delivered_date, cost_estimate, actual_cost, gold_provided,
                stones_provided, quality_rating, quality_notes, images, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)
            "#,
        )
        .bind(&w.id)
        .bind(&w.order_number)
        .bind(&w.workshop_id)
        .bind(&w.product_name)
        .bind(&w.description)
        .bind(&w.specifications)
        .bind(w.quantity)
        .bind(w.status)
        .bind(w.priority)
        .bind(w.order_date)
        .bind(w.start_date)
        .bind(w.expected_end_date)
        .bind(w.completed_date)
        .bind(w.delivered_date)
        .bind(w.cost_estimate)
        .bind(w.actual_cost)
        .bind(w.gold_provided)
        .bind(&w.stones_provided)
        .bind(w.quality_rating)
        .bind(&w.quality_notes)
        .bind(&w.images)
        .bind(&w.notes)
        .bind(w.created_at)
        .bind(w.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(w.clone())
    }

    pub async fn update(&self, w: &WorkOrder) -> DbResult<()> {
        debug!(id = %w.id, status = %w.status, "Updating work order");

        let result = sqlx::query(
            r#"
            UPDATE work_orders SET
                order_number = ?2, workshop_id = ?3, product_name = ?4, description = ?5,
                specifications = ?6, quantity = ?7, status = ?8, priority = ?9,
                order_date = ?10, start_date = ?11, expected_end_date = ?12,
                completed_date = ?13, delivered_date = ?14, cost_estimate = ?15,
                actual_cost = ?16, gold_provided = ?17, stones_provided = ?18,
                quality_rating = ?19, quality_notes = ?20, images = ?21, notes = ?22,
                updated_at = ?23
            WHERE id = ?1
            "#,
        )
        .bind(&w.id)
        .bind(&w.order_number)
        .bind(&w.workshop_id)
        .bind(&w.product_name)
        .bind(&w.description)
        .bind(&w.specifications)
        .bind(w.quantity)
        .bind(w.status)
        .bind(w.priority)
        .bind(w.order_date)
        .bind(w.start_date)
        .bind(w.expected_end_date)
        .bind(w.completed_date)
        .bind(w.delivered_date)
        .bind(w.cost_estimate)
        .bind(w.actual_cost)
        .bind(w.gold_provided)
        .bind(&w.stones_provided)
        .bind(w.quality_rating)
        .bind(&w.quality_notes)
        .bind(&w.images)
        .bind(&w.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(WORK_ORDERS.entity, &w.id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting work order");

        let result = sqlx::query("DELETE FROM work_orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(WORK_ORDERS.entity, id));
        }
        Ok(())
    }
}
