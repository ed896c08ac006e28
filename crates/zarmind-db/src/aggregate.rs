//! # Aggregate Reporting Queries
//!
//! Read-only sums and counts used by summaries, the dashboard and aging
//! reports. A `NULL` aggregate (no rows) reads as zero.
//!
//! ```text
//! sum_where(pool, "accounts_payable", "remaining_amount", &filter)
//!   → SELECT CAST(SUM(remaining_amount) AS REAL) FROM accounts_payable WHERE ..
//!
//! group_count_where(pool, "employees", "department", &filter)
//!   → { "Sales": 4, "Workshop": 2, "UNASSIGNED": 1 }
//! ```

use std::collections::BTreeMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::DbResult;
use crate::query::Filter;
use zarmind_core::{to_number, Money};

/// Group key used for rows whose group column is `NULL`.
pub const UNASSIGNED: &str = "UNASSIGNED";

/// `SUM(expr)` as a float.
pub async fn sum_where(
    pool: &SqlitePool,
    table: &'static str,
    expr: &'static str,
    filter: &Filter,
) -> DbResult<f64> {
    let mut qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT CAST(SUM({expr}) AS REAL) FROM {table}"));
    filter.push_where(&mut qb);
    let sum = qb.build_query_scalar::<Option<f64>>().fetch_one(pool).await?;
    Ok(to_number(&sum))
}

/// `SUM(expr)` over a money column (minor units).
pub async fn sum_money_where(
    pool: &SqlitePool,
    table: &'static str,
    expr: &'static str,
    filter: &Filter,
) -> DbResult<Money> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT SUM({expr}) FROM {table}"));
    filter.push_where(&mut qb);
    let sum = qb.build_query_scalar::<Option<i64>>().fetch_one(pool).await?;
    Ok(Money::from_cents(sum.unwrap_or(0)))
}

pub async fn count_where(pool: &SqlitePool, table: &'static str, filter: &Filter) -> DbResult<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {table}"));
    filter.push_where(&mut qb);
    Ok(qb.build_query_scalar::<i64>().fetch_one(pool).await?)
}

/// `SUM(expr)` per distinct value of `group_column`.
pub async fn group_sum_where(
    pool: &SqlitePool,
    table: &'static str,
    group_column: &'static str,
    expr: &'static str,
    filter: &Filter,
) -> DbResult<BTreeMap<String, f64>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT COALESCE(CAST({group_column} AS TEXT), '{UNASSIGNED}') AS grp, \
         CAST(COALESCE(SUM({expr}), 0) AS REAL) AS total FROM {table}"
    ));
    filter.push_where(&mut qb);
    qb.push(" GROUP BY grp");
    let rows = qb.build_query_as::<(String, f64)>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(k, v)| (k, to_number(&v))).collect())
}

/// Money `SUM(expr)` per distinct value of `group_column`.
pub async fn group_sum_money_where(
    pool: &SqlitePool,
    table: &'static str,
    group_column: &'static str,
    expr: &'static str,
    filter: &Filter,
) -> DbResult<BTreeMap<String, Money>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT COALESCE(CAST({group_column} AS TEXT), '{UNASSIGNED}') AS grp, \
         COALESCE(SUM({expr}), 0) AS total FROM {table}"
    ));
    filter.push_where(&mut qb);
    qb.push(" GROUP BY grp");
    let rows = qb.build_query_as::<(String, i64)>().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(k, v)| (k, Money::from_cents(v)))
        .collect())
}

/// Row count and money total of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTotal {
    pub count: i64,
    pub amount: Money,
}

/// `COUNT(*)` and money `SUM(expr)` per distinct value of `group_column`.
pub async fn group_totals_where(
    pool: &SqlitePool,
    table: &'static str,
    group_column: &'static str,
    expr: &'static str,
    filter: &Filter,
) -> DbResult<BTreeMap<String, GroupTotal>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT COALESCE(CAST({group_column} AS TEXT), '{UNASSIGNED}') AS grp, \
         COUNT(*) AS n, COALESCE(SUM({expr}), 0) AS total FROM {table}"
    ));
    filter.push_where(&mut qb);
    qb.push(" GROUP BY grp");
    let rows = qb
        .build_query_as::<(String, i64, i64)>()
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(k, count, total)| {
            (
                k,
                GroupTotal {
                    count,
                    amount: Money::from_cents(total),
                },
            )
        })
        .collect())
}

/// `COUNT(*)` per distinct value of `group_column`.
pub async fn group_count_where(
    pool: &SqlitePool,
    table: &'static str,
    group_column: &'static str,
    filter: &Filter,
) -> DbResult<BTreeMap<String, i64>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT COALESCE(CAST({group_column} AS TEXT), '{UNASSIGNED}') AS grp, \
         COUNT(*) AS total FROM {table}"
    ));
    filter.push_where(&mut qb);
    qb.push(" GROUP BY grp");
    let rows = qb.build_query_as::<(String, i64)>().fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}
