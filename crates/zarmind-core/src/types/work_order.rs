//! Manufacturing and repair orders placed with workshops.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{WorkOrderPriority, WorkOrderStatus};
use crate::json::JsonText;
use crate::money::Money;
use crate::paging::ListParams;

/// Free-form order specifications (karat, size, stone layout ...).
pub type Specifications = serde_json::Map<String, serde_json::Value>;

/// An order placed with a workshop.
///
/// Status changes stamp `start_date`, `completed_date` and
/// `delivered_date` the first time the order reaches the matching status.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WorkOrder {
    pub id: String,
    /// `WO-YYMMDD-XXXXXXXX`.
    pub order_number: String,
    pub workshop_id: String,
    pub product_name: String,
    pub description: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub specifications: Option<JsonText<Specifications>>,
    pub quantity: i64,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub expected_end_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub completed_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub delivered_date: Option<NaiveDate>,
    #[serde(with = "crate::money::major::option")]
    #[ts(type = "number | null")]
    pub cost_estimate: Option<Money>,
    #[serde(with = "crate::money::major::option")]
    #[ts(type = "number | null")]
    pub actual_cost: Option<Money>,
    /// Grams of gold handed to the workshop.
    pub gold_provided: Option<f64>,
    pub stones_provided: Option<String>,
    pub quality_rating: Option<i64>,
    pub quality_notes: Option<String>,
    #[ts(as = "Vec<String>")]
    pub images: JsonText<Vec<String>>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Applies a status change, stamping the first-reached date for it.
    /// Explicit dates in `update` win over the stamp.
    pub fn apply_status(&mut self, update: &StatusUpdate, today: NaiveDate) {
        let Some(status) = update.status else {
            return;
        };
        self.status = status;

        if update.start_date.is_some() {
            self.start_date = update.start_date;
        } else if status == WorkOrderStatus::InProgress && self.start_date.is_none() {
            self.start_date = Some(today);
        }
        if update.completed_date.is_some() {
            self.completed_date = update.completed_date;
        } else if status == WorkOrderStatus::Completed && self.completed_date.is_none() {
            self.completed_date = Some(today);
        }
        if update.delivered_date.is_some() {
            self.delivered_date = update.delivered_date;
        } else if status == WorkOrderStatus::Delivered && self.delivered_date.is_none() {
            self.delivered_date = Some(today);
        }
        if update.expected_end_date.is_some() {
            self.expected_end_date = update.expected_end_date;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrder {
    pub order_number: Option<String>,
    #[serde(default)]
    pub workshop_id: String,
    #[serde(default)]
    pub product_name: String,
    pub description: Option<String>,
    pub specifications: Option<Specifications>,
    #[serde(default)]
    pub quantity: i64,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    pub order_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    #[serde(default, with = "crate::money::major::option")]
    pub cost_estimate: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub actual_cost: Option<Money>,
    pub gold_provided: Option<f64>,
    pub stones_provided: Option<String>,
    pub quality_rating: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub workshop_id: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    /// Inclusive bounds on `orderDate`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Inclusive bounds on `qualityRating`.
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
}

/// General edit. A different `workshopId` moves the order without a
/// transfer note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderPatch {
    pub order_number: Option<String>,
    pub workshop_id: Option<String>,
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<Specifications>,
    pub quantity: Option<i64>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    pub order_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    #[serde(default, with = "crate::money::major::option")]
    pub cost_estimate: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub actual_cost: Option<Money>,
    pub gold_provided: Option<f64>,
    pub stones_provided: Option<String>,
    pub quality_rating: Option<i64>,
    pub images: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: Option<WorkOrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    /// Appended to the order notes.
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferWorkOrder {
    #[serde(default)]
    pub workshop_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChanges {
    #[serde(default)]
    pub images_to_add: Vec<String>,
    #[serde(default)]
    pub images_to_remove: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityUpdate {
    pub quality_rating: Option<i64>,
    pub quality_notes: Option<String>,
}
