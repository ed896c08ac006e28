//! Dashboard, aging reports and health.
//!
//! Dashboard and aging reports go through the cache-aside wrapper, keyed by
//! endpoint and query. A cache outage only costs the recomputation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::out_of_range;
use crate::cache::{cache_key, Cache, CacheStatus};
use crate::error::{ApiError, ApiResult};
use zarmind_core::status::AgingBucket;
use zarmind_core::{LedgerKind, Money};
use zarmind_db::Database;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub branch_id: Option<String>,
    pub active_customers: i64,
    pub active_suppliers: i64,
    pub active_employees: i64,
    pub inventory: InventoryStats,
    #[serde(with = "zarmind_core::money::major")]
    pub receivables_outstanding: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub payables_outstanding: Money,
    pub purchases_this_month: PurchaseStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub item_count: i64,
    pub total_quantity: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total_purchase_value: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub total_selling_value: Money,
    pub low_stock_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStats {
    pub count: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total_amount: Money,
}

/// `?asOf&supplierId` or `?asOf&customerId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingQuery {
    pub as_of: Option<NaiveDate>,
    #[serde(alias = "supplierId", alias = "customerId")]
    pub counterparty_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingRow {
    pub id: String,
    pub counterparty_id: String,
    pub invoice_number: String,
    pub due_date: Option<NaiveDate>,
    pub days_overdue: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub remaining_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBucketReport {
    pub label: String,
    pub count: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total: Money,
    pub records: Vec<AgingRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    pub as_of: NaiveDate,
    #[serde(with = "zarmind_core::money::major")]
    pub total_remaining: Money,
    pub buckets: Vec<AgingBucketReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Up,
    Down,
}

/// `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub database: DatabaseStatus,
    pub cache: CacheStatus,
    pub time: DateTime<Utc>,
}

pub struct AnalyticsService {
    db: Database,
    cache: Cache,
    ttl_secs: u64,
}

impl AnalyticsService {
    pub fn new(db: &Database, cache: &Cache, ttl_secs: u64) -> Self {
        AnalyticsService {
            db: db.clone(),
            cache: cache.clone(),
            ttl_secs,
        }
    }

    pub async fn dashboard(&self, query: &DashboardQuery) -> ApiResult<Dashboard> {
        let key = cache_key("analytics:dashboard", query);
        self.cache
            .wrap(&key, self.ttl_secs, || self.compute_dashboard(query))
            .await
    }

    async fn compute_dashboard(&self, query: &DashboardQuery) -> ApiResult<Dashboard> {
        let branch_id = query.branch_id.as_deref();
        let products = self.db.products();
        let totals = products.totals(branch_id).await?;

        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        let purchases = self
            .db
            .purchases()
            .totals(month_start, today, branch_id)
            .await?;

        Ok(Dashboard {
            generated_at: Utc::now(),
            branch_id: query.branch_id.clone(),
            active_customers: self.db.customers().count_active().await?,
            active_suppliers: self.db.suppliers().count_active().await?,
            active_employees: self.db.employees().count_active().await?,
            inventory: InventoryStats {
                item_count: totals.item_count,
                total_quantity: totals.total_quantity,
                total_purchase_value: totals.total_purchase_value,
                total_selling_value: totals.total_selling_value,
                low_stock_count: products.low_stock_count(branch_id).await?,
            },
            receivables_outstanding: self.db.receivables().outstanding().await?,
            payables_outstanding: self.db.payables().outstanding().await?,
            purchases_this_month: PurchaseStats {
                count: purchases.count,
                total_amount: purchases.total_amount,
            },
        })
    }

    /// Open records grouped by how far past due they are on `asOf`.
    pub async fn aging(&self, kind: LedgerKind, query: &AgingQuery) -> ApiResult<AgingReport> {
        let resolved = AgingQuery {
            as_of: Some(query.as_of.unwrap_or_else(|| Utc::now().date_naive())),
            counterparty_id: query.counterparty_id.clone(),
        };
        let endpoint = match kind {
            LedgerKind::Payable => "reports:ap-aging",
            LedgerKind::Receivable => "reports:ar-aging",
        };
        let key = cache_key(endpoint, &resolved);
        self.cache
            .wrap(&key, self.ttl_secs, || self.compute_aging(kind, &resolved))
            .await
    }

    async fn compute_aging(&self, kind: LedgerKind, query: &AgingQuery) -> ApiResult<AgingReport> {
        let as_of = query
            .as_of
            .ok_or_else(|| ApiError::internal("aging date not resolved"))?;
        let entries = self
            .db
            .ledger(kind)
            .open_entries(query.counterparty_id.as_deref())
            .await?;

        let mut buckets: Vec<AgingBucketReport> = AgingBucket::ALL
            .iter()
            .map(|b| AgingBucketReport {
                label: b.label().to_string(),
                count: 0,
                total: Money::zero(),
                records: Vec::new(),
            })
            .collect();

        let mut total_remaining = Money::zero();
        for entry in entries {
            let days_overdue = entry.days_overdue(as_of);
            let bucket = AgingBucket::from_days_overdue(days_overdue);
            let slot = AgingBucket::ALL
                .iter()
                .position(|b| *b == bucket)
                .unwrap_or(0);

            total_remaining = total_remaining
                .checked_add(entry.remaining_amount)
                .ok_or_else(|| out_of_range("totalRemaining"))?;
            let report = &mut buckets[slot];
            report.count += 1;
            report.total = report
                .total
                .checked_add(entry.remaining_amount)
                .ok_or_else(|| out_of_range("total"))?;
            report.records.push(AgingRow {
                id: entry.id,
                counterparty_id: entry.counterparty_id,
                invoice_number: entry.invoice_number,
                due_date: entry.due_date,
                days_overdue,
                remaining_amount: entry.remaining_amount,
            });
        }

        Ok(AgingReport {
            as_of,
            total_remaining,
            buckets,
        })
    }

    /// Never fails: a cache outage degrades the status instead.
    pub async fn health(&self) -> HealthReport {
        let database = if self.db.health_check().await {
            DatabaseStatus::Up
        } else {
            DatabaseStatus::Down
        };
        let cache = self.cache.status().await;
        let status = if database == DatabaseStatus::Up && cache != CacheStatus::Down {
            ServiceStatus::Ok
        } else {
            ServiceStatus::Degraded
        };
        HealthReport {
            status,
            database,
            cache,
            time: Utc::now(),
        }
    }
}
