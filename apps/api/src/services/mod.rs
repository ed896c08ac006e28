//! Resource lifecycle services.
//!
//! Each service owns the business rules of one resource and talks to the
//! database only through `zarmind-db` repositories.
//!
//! ```text
//! handler ──► XService::new(&state.db)
//!                 │
//!                 ├── validate input          (zarmind_core::validation)
//!                 ├── check references        → 400 "<Entity> not found"
//!                 ├── derive code / status    (codes, status rules)
//!                 └── repository call         (zarmind_db)
//! ```

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use zarmind_db::{DbError, DbResult, Removal};

pub mod analytics;
pub mod auth;
pub mod branches;
pub mod cash;
pub mod customers;
pub mod employees;
pub mod expenses;
pub mod ledger;
pub mod payroll;
pub mod products;
pub mod purchases;
pub mod settings;
pub mod suppliers;
pub mod users;
pub mod work_orders;
pub mod workshops;

/// `{ success, message }` returned by actions that have no body of their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        ActionResult {
            success: true,
            message: message.into(),
        }
    }

    /// Describes how a remove request was carried out.
    pub fn removed(entity: &str, removal: Removal) -> Self {
        match removal {
            Removal::Deleted => ActionResult::ok(format!("{entity} deleted")),
            Removal::Deactivated => {
                ActionResult::ok(format!("{entity} has related records and was deactivated"))
            }
        }
    }
}

/// Fails with 400 "<entity> not found" when a referenced record is missing.
pub(crate) fn require_reference(found: bool, entity: &str) -> ApiResult<()> {
    if found {
        Ok(())
    } else {
        Err(zarmind_core::CoreError::reference_not_found(entity).into())
    }
}

/// Trims and drops blank strings.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Overwrites `slot` when the patch carries a value.
pub(crate) fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Overwrites an optional `slot` when the patch carries a value.
pub(crate) fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Validates an optional email.
pub(crate) fn check_email(email: Option<&str>) -> ApiResult<()> {
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        zarmind_core::validation::validate_email(email)?;
    }
    Ok(())
}

/// Validates an optional phone number.
pub(crate) fn check_phone(phone: Option<&str>) -> ApiResult<()> {
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        zarmind_core::validation::validate_phone(phone)?;
    }
    Ok(())
}

pub(crate) fn check_rating(rating: Option<i64>) -> ApiResult<()> {
    check_score("rating", rating)
}

/// Validates an optional 1 to 5 score on `field`.
pub(crate) fn check_score(field: &str, score: Option<i64>) -> ApiResult<()> {
    if let Some(score) = score {
        zarmind_core::validation::validate_score(field, score)?;
    }
    Ok(())
}

/// Rejects a blank generated-or-supplied code before it reaches the database.
pub(crate) fn code_or(supplied: Option<String>, generate: impl FnOnce() -> String) -> String {
    clean(supplied).unwrap_or_else(generate)
}

/// Inserts attempted for a record whose code was generated.
pub(crate) const CODE_ATTEMPTS: u32 = 3;

/// Inserts a record keyed by a business code stored in `column`.
///
/// A supplied code is tried once and a clash is a 409. A generated code
/// that clashes on `column` is regenerated and retried, up to
/// [`CODE_ATTEMPTS`] inserts in total. The pause between attempts moves
/// millisecond-based codes forward.
pub(crate) async fn insert_with_code<T, Fut>(
    column: &str,
    supplied: Option<String>,
    mut generate: impl FnMut() -> String,
    mut insert: impl FnMut(String) -> Fut,
) -> ApiResult<T>
where
    Fut: Future<Output = DbResult<T>>,
{
    if let Some(code) = clean(supplied) {
        return Ok(insert(code).await?);
    }

    let mut attempt = 1;
    loop {
        let code = generate();
        match insert(code.clone()).await {
            Err(DbError::UniqueViolation { field, .. })
                if field == column && attempt < CODE_ATTEMPTS =>
            {
                warn!(column, code = %code, attempt, "Generated code already taken, retrying");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            result => return Ok(result?),
        }
    }
}

/// 400 for arithmetic that left the representable range.
pub(crate) fn out_of_range(field: &str) -> ApiError {
    ApiError::validation(format!("{field} is out of range"))
}

pub(crate) fn not_found(entity: &str) -> ApiError {
    ApiError::not_found(format!("{entity} not found"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use zarmind_core::Branch;
    use zarmind_db::new_id;

    fn branch_row(code: String) -> Branch {
        let now = Utc::now();
        Branch {
            id: new_id(),
            code,
            name: "Karaj".to_string(),
            city: None,
            address: None,
            phone: None,
            is_main_branch: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_generated_code_retried_after_collision() {
        let db = testing::database().await;
        testing::branch(&db, "TAKEN").await;
        let repo = &db.branches();

        let mut codes = vec!["BR-FRESH", "BR-TAKEN"];
        let mut calls = 0;
        let branch = insert_with_code(
            "code",
            None,
            || {
                calls += 1;
                codes.pop().unwrap_or("BR-LAST").to_string()
            },
            move |code| async move { repo.insert(&branch_row(code)).await },
        )
        .await
        .unwrap();

        assert_eq!(branch.code, "BR-FRESH");
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_generated_code_gives_up_after_attempts() {
        let db = testing::database().await;
        testing::branch(&db, "TAKEN").await;
        let repo = &db.branches();

        let mut calls = 0;
        let err = insert_with_code(
            "code",
            None,
            || {
                calls += 1;
                "BR-TAKEN".to_string()
            },
            move |code| async move { repo.insert(&branch_row(code)).await },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(calls, CODE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_supplied_code_is_not_regenerated() {
        let db = testing::database().await;
        testing::branch(&db, "TAKEN").await;
        let repo = &db.branches();

        let err = insert_with_code(
            "code",
            Some(" BR-TAKEN ".to_string()),
            || "BR-FRESH".to_string(),
            move |code| async move { repo.insert(&branch_row(code)).await },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(db.branches().count().await.unwrap(), 1);
    }

    #[test]
    fn test_removed_messages() {
        assert_eq!(
            ActionResult::removed("Customer", Removal::Deleted).message,
            "Customer deleted"
        );
        assert!(ActionResult::removed("Customer", Removal::Deactivated)
            .message
            .contains("deactivated"));
    }

    #[test]
    fn test_merge_helpers() {
        let mut name = "old".to_string();
        merge(&mut name, None);
        assert_eq!(name, "old");
        merge(&mut name, Some("new".to_string()));
        assert_eq!(name, "new");

        let mut city = Some("Tehran".to_string());
        merge_opt(&mut city, None);
        assert_eq!(city.as_deref(), Some("Tehran"));
    }

    #[test]
    fn test_clean_drops_blank() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(Some(" x ".to_string())).as_deref(), Some("x"));
    }
}
