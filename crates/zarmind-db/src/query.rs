//! # List Query Engine
//!
//! One implementation of "filter, search, sort, count and page" shared by
//! every resource repository.
//!
//! ## How A List Request Becomes SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/crm/customers?search=ali&status=ACTIVE&page=2&limit=10       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CustomerRepository::list(&CustomerQuery)                              │
//! │       │  Filter::new().eq_opt("status", ..).contains_opt("city", ..)   │
//! │       ▼                                                                 │
//! │  paginate(pool, &CUSTOMERS, &filter, &list_params)                     │
//! │       │                                                                 │
//! │       ├── + search: (code LIKE ? OR phone LIKE ? OR ...)               │
//! │       ├── sortBy checked against the resource allow-list               │
//! │       │                                                                 │
//! │       ▼   BEGIN                                                         │
//! │  SELECT COUNT(*) FROM customers WHERE <predicate>                      │
//! │  SELECT * FROM customers WHERE <predicate>                             │
//! │      ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?             │
//! │       │   COMMIT                                                        │
//! │       ▼                                                                 │
//! │  PagedResult { items, total, page: 2, limit: 10 }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column names only ever come from `&'static str` constants in this crate;
//! every user-supplied value goes through `push_bind`.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use zarmind_core::{to_number, ListParams, Money, PagedResult, SortOrder};

// =============================================================================
// Bind Values
// =============================================================================

/// A value bound into a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Date(NaiveDate),
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<Money> for SqlValue {
    fn from(value: Money) -> Self {
        SqlValue::Integer(value.cents())
    }
}

macro_rules! enum_sql_values {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Text(value.as_str().to_string())
                }
            }
        )+
    };
}

enum_sql_values!(
    zarmind_core::UserRole,
    zarmind_core::UserStatus,
    zarmind_core::CustomerType,
    zarmind_core::CustomerStatus,
    zarmind_core::SupplierStatus,
    zarmind_core::WorkshopStatus,
    zarmind_core::EmploymentStatus,
    zarmind_core::EmploymentType,
    zarmind_core::ProductCategory,
    zarmind_core::ProductStatus,
    zarmind_core::LedgerStatus,
    zarmind_core::PurchaseStatus,
    zarmind_core::SettingCategory,
    zarmind_core::PaymentMethod,
    zarmind_core::CashTransactionType,
    zarmind_core::WorkOrderStatus,
    zarmind_core::WorkOrderPriority,
);

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &SqlValue) {
    match value {
        SqlValue::Text(s) => qb.push_bind(s.clone()),
        SqlValue::Integer(n) => qb.push_bind(*n),
        SqlValue::Real(n) => qb.push_bind(*n),
        SqlValue::Date(d) => qb.push_bind(*d),
        SqlValue::Null => qb.push_bind(None::<String>),
    };
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Reads a numeric filter bound from a query string; blank is unbounded.
pub fn number_bound(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| to_number(s))
}

/// A major-unit bound for a money column stored in minor units.
pub fn money_bound(raw: Option<&str>) -> Option<Money> {
    number_bound(raw).map(Money::from_major)
}

// =============================================================================
// Conditions
// =============================================================================

/// One predicate of a `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(&'static str, SqlValue),
    NotEq(&'static str, SqlValue),
    /// An empty list matches nothing.
    In(&'static str, Vec<SqlValue>),
    Lt(&'static str, SqlValue),
    /// Inclusive on both ends; a missing bound is unbounded.
    Range {
        column: &'static str,
        from: Option<SqlValue>,
        to: Option<SqlValue>,
    },
    /// Case-insensitive substring on one column.
    Contains(&'static str, String),
    /// Case-insensitive substring on any of the columns.
    Search(&'static [&'static str], String),
    IsNull(&'static str),
    /// Hand-written fragment; each `?` takes the next bind in order.
    Raw {
        sql: &'static str,
        binds: Vec<SqlValue>,
    },
}

impl Condition {
    fn push(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Condition::Eq(col, value) => {
                qb.push(*col).push(" = ");
                push_value(qb, value);
            }
            Condition::NotEq(col, value) => {
                qb.push(*col).push(" <> ");
                push_value(qb, value);
            }
            Condition::In(_, values) if values.is_empty() => {
                qb.push("0 = 1");
            }
            Condition::In(col, values) => {
                qb.push(*col).push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    push_value(qb, value);
                }
                qb.push(")");
            }
            Condition::Lt(col, value) => {
                qb.push(*col).push(" < ");
                push_value(qb, value);
            }
            Condition::Range { column, from, to } => {
                qb.push("(");
                let mut first = true;
                if let Some(from) = from {
                    qb.push(*column).push(" >= ");
                    push_value(qb, from);
                    first = false;
                }
                if let Some(to) = to {
                    if !first {
                        qb.push(" AND ");
                    }
                    qb.push(*column).push(" <= ");
                    push_value(qb, to);
                    first = false;
                }
                if first {
                    qb.push("1 = 1");
                }
                qb.push(")");
            }
            Condition::Contains(col, term) => {
                qb.push(*col)
                    .push(" LIKE ")
                    .push_bind(like_pattern(term))
                    .push(" ESCAPE '\\'");
            }
            Condition::Search(columns, term) => {
                let pattern = like_pattern(term);
                qb.push("(");
                for (i, col) in columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(*col)
                        .push(" LIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\'");
                }
                qb.push(")");
            }
            Condition::IsNull(col) => {
                qb.push(*col).push(" IS NULL");
            }
            Condition::Raw { sql, binds } => {
                let mut binds = binds.iter();
                let mut parts = sql.split('?').peekable();
                qb.push("(");
                while let Some(part) = parts.next() {
                    qb.push(part);
                    if parts.peek().is_some() {
                        push_value(qb, binds.next().unwrap_or(&SqlValue::Null));
                    }
                }
                qb.push(")");
            }
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// A conjunction of [`Condition`]s, built fluently.
///
/// ```rust
/// use zarmind_db::query::Filter;
///
/// let filter = Filter::new()
///     .eq("status", "ACTIVE")
///     .contains_opt("city", Some("Tehran"))
///     .eq_opt::<String>("branch_id", None);
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.and(Condition::Eq(column, value.into()))
    }

    /// Adds `column = value` only when a value is present.
    pub fn eq_opt<V: Into<SqlValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    pub fn not_eq(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.and(Condition::NotEq(column, value.into()))
    }

    pub fn in_list<V: Into<SqlValue>>(
        self,
        column: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.and(Condition::In(
            column,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn lt(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.and(Condition::Lt(column, value.into()))
    }

    /// Inclusive range; skipped entirely when both bounds are missing.
    pub fn range<V: Into<SqlValue>>(
        self,
        column: &'static str,
        from: Option<V>,
        to: Option<V>,
    ) -> Self {
        if from.is_none() && to.is_none() {
            return self;
        }
        self.and(Condition::Range {
            column,
            from: from.map(Into::into),
            to: to.map(Into::into),
        })
    }

    /// Substring match; blank terms are ignored.
    pub fn contains_opt(self, column: &'static str, term: Option<&str>) -> Self {
        match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => self.and(Condition::Contains(column, term.to_string())),
            None => self,
        }
    }

    /// Substring match over several columns; blank terms are ignored.
    pub fn search(self, columns: &'static [&'static str], term: Option<&str>) -> Self {
        match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) if !columns.is_empty() => {
                self.and(Condition::Search(columns, term.to_string()))
            }
            _ => self,
        }
    }

    pub fn is_null(self, column: &'static str) -> Self {
        self.and(Condition::IsNull(column))
    }

    pub fn raw(self, sql: &'static str, binds: Vec<SqlValue>) -> Self {
        self.and(Condition::Raw { sql, binds })
    }

    /// Appends ` WHERE a AND b ...`, or nothing for an empty filter.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            condition.push(qb);
        }
    }
}

// =============================================================================
// Resource Descriptor
// =============================================================================

/// Static description of a listable table.
#[derive(Debug, Clone, Copy)]
pub struct Resource {
    /// Name used in "not found" messages.
    pub entity: &'static str,
    /// `FROM` target.
    pub table: &'static str,
    /// Select list, `*` unless columns need aliasing.
    pub columns: &'static str,
    /// Columns matched by `search`.
    pub search_columns: &'static [&'static str],
    /// `(sortBy on the wire, column)` pairs accepted for sorting.
    pub sort_columns: &'static [(&'static str, &'static str)],
    pub default_sort: &'static str,
    pub default_order: SortOrder,
    pub default_limit: u32,
}

impl Resource {
    /// Maps a client `sortBy` to a column; unknown keys fall back to the
    /// default. The wire key and the column name are both accepted.
    pub fn resolve_sort(&self, sort_by: Option<&str>) -> &'static str {
        let wanted = match sort_by.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return self.default_sort,
        };
        self.sort_columns
            .iter()
            .find(|(key, column)| key.eq_ignore_ascii_case(wanted) || *column == wanted)
            .map(|(_, column)| *column)
            .unwrap_or(self.default_sort)
    }

    pub fn select(&self) -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!("SELECT {} FROM {}", self.columns, self.table))
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Runs the count and the page fetch for one list request inside a single
/// transaction, so `total` and `items` see the same snapshot.
pub async fn paginate<T>(
    pool: &SqlitePool,
    resource: &Resource,
    filter: &Filter,
    params: &ListParams,
) -> DbResult<PagedResult<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let request = params.page_request(resource.default_limit);
    let filter = filter
        .clone()
        .search(resource.search_columns, params.search_term());
    let column = resource.resolve_sort(params.sort_by.as_deref());
    let order = params.sort_order().unwrap_or(resource.default_order);

    debug!(
        table = resource.table,
        page = request.page,
        limit = request.limit,
        sort = column,
        conditions = filter.len(),
        "Listing"
    );

    let mut tx = pool.begin().await?;

    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", resource.table));
    filter.push_where(&mut count);
    let total = count.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

    let mut fetch = resource.select();
    filter.push_where(&mut fetch);
    fetch.push(format!(
        " ORDER BY {column} {dir}, rowid {dir} LIMIT ",
        dir = order.as_sql()
    ));
    fetch.push_bind(i64::from(request.limit));
    fetch.push(" OFFSET ");
    fetch.push_bind(request.offset());
    let items = fetch.build_query_as::<T>().fetch_all(&mut *tx).await?;

    tx.commit().await?;

    Ok(PagedResult::new(items, total, request))
}

/// Every row matching `filter`, in the resource's default order.
pub async fn fetch_all<T>(pool: &SqlitePool, resource: &Resource, filter: &Filter) -> DbResult<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut qb = resource.select();
    filter.push_where(&mut qb);
    qb.push(format!(
        " ORDER BY {} {}",
        resource.default_sort,
        resource.default_order.as_sql()
    ));
    Ok(qb.build_query_as::<T>().fetch_all(pool).await?)
}

/// The single row matching `filter`, if any.
pub async fn fetch_optional<T>(
    pool: &SqlitePool,
    resource: &Resource,
    filter: &Filter,
) -> DbResult<Option<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut qb = resource.select();
    filter.push_where(&mut qb);
    qb.push(" LIMIT 1");
    Ok(qb.build_query_as::<T>().fetch_optional(pool).await?)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn render(filter: &Filter) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM t");
        filter.push_where(&mut qb);
        qb.sql().to_string()
    }

    const THINGS: Resource = Resource {
        entity: "Thing",
        table: "things",
        columns: "*",
        search_columns: &["name", "code"],
        sort_columns: &[("createdAt", "created_at"), ("name", "name")],
        default_sort: "created_at",
        default_order: SortOrder::Desc,
        default_limit: 20,
    };

    #[test]
    fn test_empty_filter_renders_no_where() {
        assert_eq!(render(&Filter::new()), "SELECT * FROM t");
    }

    #[test]
    fn test_conditions_are_joined_with_and() {
        let filter = Filter::new()
            .eq("status", "ACTIVE")
            .range("invoice_date", Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None)
            .search(&["name", "code"], Some("ali"));

        assert_eq!(
            render(&filter),
            "SELECT * FROM t WHERE status = ? AND (invoice_date >= ?) AND \
             (name LIKE ? ESCAPE '\\' OR code LIKE ? ESCAPE '\\')"
        );
    }

    #[test]
    fn test_optional_conditions_are_skipped() {
        let filter = Filter::new()
            .eq_opt::<String>("status", None)
            .range::<i64>("quantity", None, None)
            .contains_opt("city", Some("   "))
            .search(&["name"], None);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let filter = Filter::new().in_list::<String>("status", vec![]);
        assert_eq!(render(&filter), "SELECT * FROM t WHERE 0 = 1");
    }

    #[test]
    fn test_raw_binds_each_placeholder() {
        let filter = Filter::new().raw(
            "EXISTS (SELECT 1 FROM stock s WHERE s.item_id = t.id AND s.branch_id = ?)",
            vec!["b1".into()],
        );
        assert_eq!(
            render(&filter),
            "SELECT * FROM t WHERE (EXISTS (SELECT 1 FROM stock s WHERE s.item_id = t.id AND s.branch_id = ?))"
        );
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ali"), "%ali%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_bounds_skip_blank_input() {
        assert_eq!(number_bound(Some(" 3 ")), Some(3.0));
        assert_eq!(number_bound(Some("  ")), None);
        assert_eq!(number_bound(None), None);
        assert_eq!(money_bound(Some("12.5")), Some(Money::from_cents(1250)));
    }

    #[test]
    fn test_resolve_sort_uses_allow_list() {
        assert_eq!(THINGS.resolve_sort(Some("name")), "name");
        assert_eq!(THINGS.resolve_sort(Some("CREATEDAT")), "created_at");
        assert_eq!(THINGS.resolve_sort(Some("created_at")), "created_at");
        assert_eq!(THINGS.resolve_sort(Some("password_hash")), "created_at");
        assert_eq!(THINGS.resolve_sort(Some("name; DROP TABLE things")), "created_at");
        assert_eq!(THINGS.resolve_sort(None), "created_at");
    }
}
