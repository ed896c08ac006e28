//! Typed key/value settings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::clean;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use zarmind_core::validation::validate_required;
use zarmind_core::{
    raw_setting_value, BulkSettingEntry, NewSetting, Setting, SettingCategory, SettingPatch,
    SettingValueType,
};
use zarmind_db::{new_id, Database};

/// A setting as returned to clients, with its value already typed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingView {
    pub key: String,
    pub category: SettingCategory,
    pub value: serde_json::Value,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub is_public: bool,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Setting> for SettingView {
    fn from(setting: Setting) -> Self {
        SettingView {
            value: setting.parsed_value(),
            key: setting.key,
            category: setting.category,
            value_type: setting.value_type,
            description: setting.description,
            is_public: setting.is_public,
            updated_by: setting.updated_by,
            updated_at: setting.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub key: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /settings/bulk`.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResult {
    pub success: bool,
    pub message: String,
    pub results: Vec<BulkOutcome>,
}

pub struct SettingService {
    db: Database,
}

impl SettingService {
    pub fn new(db: &Database) -> Self {
        SettingService { db: db.clone() }
    }

    /// `include_private` must only be set for privileged callers.
    pub async fn list(
        &self,
        category: Option<SettingCategory>,
        include_private: bool,
    ) -> ApiResult<Vec<SettingView>> {
        let rows = self.db.settings().list(category, include_private).await?;
        Ok(rows.into_iter().map(SettingView::from).collect())
    }

    pub async fn public(&self) -> ApiResult<Vec<SettingView>> {
        self.list(None, false).await
    }

    pub async fn grouped(&self, include_private: bool) -> ApiResult<BTreeMap<String, Vec<SettingView>>> {
        let mut groups: BTreeMap<String, Vec<SettingView>> = BTreeMap::new();
        for setting in self.list(None, include_private).await? {
            groups
                .entry(setting.category.to_string())
                .or_default()
                .push(setting);
        }
        Ok(groups)
    }

    pub async fn get(&self, key: &str) -> ApiResult<SettingView> {
        Ok(self.db.settings().get(key).await?.into())
    }

    pub async fn create(&self, input: NewSetting, caller: &AuthUser) -> ApiResult<SettingView> {
        validate_required("key", &input.key)?;
        let key = input.key.trim().to_string();
        let repo = self.db.settings();
        if repo.get_by_key(&key).await?.is_some() {
            return Err(ApiError::bad_request(format!(
                "Setting with key {key} already exists"
            )));
        }

        let value_type = input.value_type.unwrap_or_default();
        let raw = raw_setting_value(&input.value);
        value_type.validate(&raw)?;

        let now = Utc::now();
        let setting = Setting {
            id: new_id(),
            key,
            category: input.category.unwrap_or_default(),
            value: raw,
            value_type,
            description: clean(input.description),
            is_public: input.is_public,
            updated_by: Some(caller.id.clone()),
            created_at: now,
            updated_at: now,
        };

        let setting = repo.insert(&setting).await?;
        info!(key = %setting.key, "Setting created");
        Ok(setting.into())
    }

    /// Replaces the value after checking it against the declared type.
    pub async fn update(
        &self,
        key: &str,
        patch: SettingPatch,
        caller: &AuthUser,
    ) -> ApiResult<SettingView> {
        let repo = self.db.settings();
        let setting = repo.get(key).await?;

        let raw = raw_setting_value(&patch.value);
        setting.value_type.validate(&raw)?;
        let description = clean(patch.description);

        repo.update_value(key, &raw, description.as_deref(), Some(&caller.id))
            .await?;
        info!(key = %key, "Setting updated");
        self.get(key).await
    }

    pub async fn delete(&self, key: &str) -> ApiResult<()> {
        self.db.settings().delete(key).await?;
        info!(key = %key, "Setting deleted");
        Ok(())
    }

    /// Upserts each entry independently; one failure does not stop the rest.
    pub async fn bulk(&self, entries: Vec<BulkSettingEntry>, caller: &AuthUser) -> BulkResult {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = entry.key.trim().to_string();
            let outcome = self.upsert(&key, &entry.value, caller).await;
            if let Err(err) = &outcome {
                warn!(key = %key, error = %err, "Bulk setting update failed");
            }
            results.push(BulkOutcome {
                key,
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.message),
            });
        }

        let failed = results.iter().filter(|r| !r.success).count();
        BulkResult {
            success: failed == 0,
            message: format!(
                "Updated {} settings, {} failed",
                results.len() - failed,
                failed
            ),
            results,
        }
    }

    async fn upsert(&self, key: &str, value: &serde_json::Value, caller: &AuthUser) -> ApiResult<()> {
        validate_required("key", key)?;
        match self.db.settings().get_by_key(key).await? {
            Some(_) => {
                self.update(
                    key,
                    SettingPatch {
                        value: value.clone(),
                        description: None,
                    },
                    caller,
                )
                .await?;
            }
            None => {
                self.create(
                    NewSetting {
                        key: key.to_string(),
                        value: value.clone(),
                        ..NewSetting::default()
                    },
                    caller,
                )
                .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use serde_json::json;
    use zarmind_core::{UserRole, UserStatus};

    fn admin() -> AuthUser {
        AuthUser {
            id: "admin-1".to_string(),
            email: "admin@zarmind.test".to_string(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            branch_id: None,
        }
    }

    fn setting(key: &str, value: serde_json::Value, value_type: SettingValueType) -> NewSetting {
        NewSetting {
            key: key.to_string(),
            value,
            value_type: Some(value_type),
            ..NewSetting::default()
        }
    }

    #[tokio::test]
    async fn test_values_are_typed_on_read() {
        let db = testing::database().await;
        let service = SettingService::new(&db);
        let caller = admin();

        let tax = service
            .create(setting("tax.rate", json!("9"), SettingValueType::Number), &caller)
            .await
            .unwrap();
        assert_eq!(tax.value, json!(9.0));

        let flag = service
            .create(setting("pos.enabled", json!("Yes"), SettingValueType::Boolean), &caller)
            .await
            .unwrap();
        assert_eq!(flag.value, json!(true));

        let layout = service
            .create(
                setting("printer.layout", json!({"width": 80}), SettingValueType::Json),
                &caller,
            )
            .await
            .unwrap();
        assert_eq!(layout.value, json!({"width": 80}));
    }

    #[tokio::test]
    async fn test_type_rules_on_write() {
        let db = testing::database().await;
        let service = SettingService::new(&db);
        let caller = admin();

        let err = service
            .create(setting("tax.rate", json!("abc"), SettingValueType::Number), &caller)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        service
            .create(setting("tax.rate", json!(9), SettingValueType::Number), &caller)
            .await
            .unwrap();
        let err = service
            .create(setting("tax.rate", json!(10), SettingValueType::Number), &caller)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err = service
            .update(
                "tax.rate",
                SettingPatch {
                    value: json!("nine"),
                    description: None,
                },
                &caller,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(service.get("tax.rate").await.unwrap().value, json!(9.0));
    }

    #[tokio::test]
    async fn test_public_hides_private() {
        let db = testing::database().await;
        let service = SettingService::new(&db);
        let caller = admin();

        service
            .create(
                NewSetting {
                    is_public: true,
                    category: Some(SettingCategory::Company),
                    ..setting("company.name", json!("Zarmind Gold"), SettingValueType::String)
                },
                &caller,
            )
            .await
            .unwrap();
        service
            .create(
                NewSetting {
                    category: Some(SettingCategory::Security),
                    ..setting("security.lockout", json!(5), SettingValueType::Number)
                },
                &caller,
            )
            .await
            .unwrap();

        let public = service.public().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].key, "company.name");

        let grouped = service.grouped(true).await.unwrap();
        assert_eq!(grouped.len(), 2);
        assert!(grouped.contains_key("SECURITY"));
    }

    #[tokio::test]
    async fn test_bulk_reports_each_key() {
        let db = testing::database().await;
        let service = SettingService::new(&db);
        let caller = admin();
        service
            .create(setting("tax.rate", json!(9), SettingValueType::Number), &caller)
            .await
            .unwrap();

        let result = service
            .bulk(
                vec![
                    BulkSettingEntry {
                        key: "tax.rate".to_string(),
                        value: json!(10),
                    },
                    BulkSettingEntry {
                        key: "tax.rate".to_string(),
                        value: json!("ten"),
                    },
                    BulkSettingEntry {
                        key: "company.motto".to_string(),
                        value: json!("Since 1350"),
                    },
                ],
                &caller,
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.message, "Updated 2 settings, 1 failed");
        assert!(result.results[1].error.is_some());

        let created = service.get("company.motto").await.unwrap();
        assert_eq!(created.value_type, SettingValueType::String);
        assert_eq!(created.category, SettingCategory::General);
        assert_eq!(service.get("tax.rate").await.unwrap().value, json!(10.0));
    }
}
