//! Key/value system settings with typed values.
//!
//! Values are stored raw (as text) next to their declared type. The typed
//! reading is derived on every read and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{SettingCategory, SettingValueType};
use crate::error::ValidationError;
use crate::numeric::to_number;

const BOOLEAN_LITERALS: [&str; 6] = ["true", "false", "1", "0", "yes", "no"];
const TRUTHY_LITERALS: [&str; 4] = ["true", "1", "yes", "on"];

impl SettingValueType {
    /// Checks that `raw` can be stored under this type.
    ///
    /// ```rust
    /// use zarmind_core::SettingValueType;
    ///
    /// assert!(SettingValueType::Boolean.validate("YES").is_ok());
    /// assert!(SettingValueType::Boolean.validate("maybe").is_err());
    /// assert!(SettingValueType::Number.validate("12.5").is_ok());
    /// ```
    pub fn validate(&self, raw: &str) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "value".to_string(),
            reason: reason.to_string(),
        };
        match self {
            SettingValueType::String => Ok(()),
            SettingValueType::Number => match raw.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(()),
                _ => Err(invalid("must be a valid number")),
            },
            SettingValueType::Boolean => {
                let lowered = raw.trim().to_ascii_lowercase();
                if BOOLEAN_LITERALS.contains(&lowered.as_str()) {
                    Ok(())
                } else {
                    Err(invalid("must be a boolean (true/false, 1/0, yes/no)"))
                }
            }
            SettingValueType::Json => serde_json::from_str::<serde_json::Value>(raw)
                .map(|_| ())
                .map_err(|_| invalid("must be valid JSON")),
        }
    }

    /// Typed reading of a stored raw value. Never fails; malformed JSON
    /// falls back to the raw string.
    pub fn parse(&self, raw: &str) -> serde_json::Value {
        match self {
            SettingValueType::String => serde_json::Value::String(raw.to_string()),
            SettingValueType::Number => serde_json::json!(to_number(raw)),
            SettingValueType::Boolean => {
                let lowered = raw.trim().to_ascii_lowercase();
                serde_json::Value::Bool(TRUTHY_LITERALS.contains(&lowered.as_str()))
            }
            SettingValueType::Json => serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
        }
    }
}

/// Renders an incoming JSON value as the raw text stored in the database.
///
/// Strings are stored as-is; everything else as compact JSON.
pub fn raw_setting_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Setting
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Setting {
    pub id: String,
    pub key: String,
    pub category: SettingCategory,
    /// Raw stored text.
    pub value: String,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    /// Readable without authentication.
    pub is_public: bool,
    pub updated_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub fn parsed_value(&self) -> serde_json::Value {
        self.value_type.parse(&self.value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSetting {
    #[serde(default)]
    pub key: String,
    pub category: Option<SettingCategory>,
    #[serde(default)]
    pub value: serde_json::Value,
    pub value_type: Option<SettingValueType>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingQuery {
    pub category: Option<SettingCategory>,
    pub include_private: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingPatch {
    #[serde(default)]
    pub value: serde_json::Value,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSettingEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

// =============================================================================
// Unit Tests
// =============================================================================
