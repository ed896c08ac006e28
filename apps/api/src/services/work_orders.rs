//! Workshop work orders.
//!
//! ```text
//! PENDING ─► ACCEPTED ─► IN_PROGRESS ─► QUALITY_CHECK ─► COMPLETED ─► DELIVERED
//!                            │                               │            │
//!                       startDate                    completedDate  deliveredDate
//!
//! remove: any status ─► CANCELLED (note "CANCELLED");  CANCELLED ─► row deleted
//! ```
//!
//! Status changes are free-form; any status may follow any other. The date
//! stamps are written only the first time a status is reached.

use chrono::Utc;
use tracing::info;

use super::{check_score, clean, insert_with_code, merge, merge_opt, require_reference};
use crate::error::{ApiError, ApiResult};
use zarmind_core::codes::generate_code;
use zarmind_core::json::dedup_strings;
use zarmind_core::validation::{validate_name, validate_positive_quantity};
use zarmind_core::{
    ImageChanges, JsonText, NewWorkOrder, PagedResult, QualityUpdate, StatusUpdate,
    TransferWorkOrder, WorkOrder, WorkOrderPatch, WorkOrderQuery, WorkOrderStatus,
};
use zarmind_db::{append_note, new_id, Database};

/// How a remove request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrderRemoval {
    Cancelled,
    Deleted,
}

impl WorkOrderRemoval {
    pub fn message(&self) -> &'static str {
        match self {
            WorkOrderRemoval::Cancelled => "Work order cancelled",
            WorkOrderRemoval::Deleted => "Work order deleted",
        }
    }
}

pub struct WorkOrderService {
    db: Database,
}

impl WorkOrderService {
    pub fn new(db: &Database) -> Self {
        WorkOrderService { db: db.clone() }
    }

    pub async fn create(&self, input: NewWorkOrder) -> ApiResult<WorkOrder> {
        validate_name("productName", &input.product_name)?;
        validate_positive_quantity("quantity", input.quantity)?;
        check_score("qualityRating", input.quality_rating)?;
        require_reference(self.db.workshops().exists(&input.workshop_id).await?, "Workshop")?;

        let repo = &self.db.work_orders();
        let supplied = clean(input.order_number);
        if let Some(number) = supplied.as_deref() {
            if repo.number_exists(number).await? {
                return Err(ApiError::bad_request("Order number already exists"));
            }
        }

        let now = Utc::now();
        let template = WorkOrder {
            id: new_id(),
            order_number: String::new(),
            workshop_id: input.workshop_id,
            product_name: input.product_name.trim().to_string(),
            description: clean(input.description),
            specifications: input.specifications.map(JsonText),
            quantity: input.quantity,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            order_date: input.order_date.unwrap_or_else(|| now.date_naive()),
            start_date: input.start_date,
            expected_end_date: input.expected_end_date,
            completed_date: input.completed_date,
            delivered_date: input.delivered_date,
            cost_estimate: input.cost_estimate,
            actual_cost: input.actual_cost,
            gold_provided: input.gold_provided,
            stones_provided: clean(input.stones_provided),
            quality_rating: input.quality_rating,
            quality_notes: None,
            images: JsonText(dedup_strings(input.images)),
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let order = insert_with_code(
            "order_number",
            supplied,
            || generate_code("WO"),
            move |order_number| {
                let order = WorkOrder {
                    order_number,
                    ..template.clone()
                };
                async move { repo.insert(&order).await }
            },
        )
        .await?;
        info!(id = %order.id, number = %order.order_number, "Work order created");
        Ok(order)
    }

    pub async fn list(&self, query: &WorkOrderQuery) -> ApiResult<PagedResult<WorkOrder>> {
        Ok(self.db.work_orders().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<WorkOrder> {
        Ok(self.db.work_orders().get(id).await?)
    }

    /// General edit. A new `workshopId` moves the order without a note.
    pub async fn update(&self, id: &str, patch: WorkOrderPatch) -> ApiResult<WorkOrder> {
        let repo = self.db.work_orders();
        let mut order = repo.get(id).await?;

        if let Some(number) = clean(patch.order_number.clone()) {
            if number != order.order_number && repo.number_exists(&number).await? {
                return Err(ApiError::bad_request("Order number already exists"));
            }
        }
        if let Some(name) = patch.product_name.as_deref() {
            validate_name("productName", name)?;
        }
        if let Some(quantity) = patch.quantity {
            validate_positive_quantity("quantity", quantity)?;
        }
        check_score("qualityRating", patch.quality_rating)?;
        if let Some(workshop) = patch.workshop_id.as_deref() {
            if workshop != order.workshop_id {
                require_reference(
                    self.db.workshops().exists(workshop).await?,
                    "Target workshop",
                )?;
            }
        }

        merge(&mut order.order_number, clean(patch.order_number));
        merge(&mut order.workshop_id, patch.workshop_id);
        merge(&mut order.product_name, patch.product_name.map(|n| n.trim().to_string()));
        merge_opt(&mut order.description, patch.description);
        merge_opt(&mut order.specifications, patch.specifications.map(JsonText));
        merge(&mut order.quantity, patch.quantity);
        merge(&mut order.status, patch.status);
        merge(&mut order.priority, patch.priority);
        merge(&mut order.order_date, patch.order_date);
        merge_opt(&mut order.start_date, patch.start_date);
        merge_opt(&mut order.expected_end_date, patch.expected_end_date);
        merge_opt(&mut order.completed_date, patch.completed_date);
        merge_opt(&mut order.delivered_date, patch.delivered_date);
        merge_opt(&mut order.cost_estimate, patch.cost_estimate);
        merge_opt(&mut order.actual_cost, patch.actual_cost);
        merge_opt(&mut order.gold_provided, patch.gold_provided);
        merge_opt(&mut order.stones_provided, patch.stones_provided);
        merge_opt(&mut order.quality_rating, patch.quality_rating);
        merge(&mut order.images, patch.images.map(|i| JsonText(dedup_strings(i))));
        merge_opt(&mut order.notes, patch.notes);

        order.updated_at = Utc::now();
        repo.update(&order).await?;
        Ok(order)
    }

    pub async fn update_status(&self, id: &str, update: StatusUpdate) -> ApiResult<WorkOrder> {
        let repo = self.db.work_orders();
        let mut order = repo.get(id).await?;
        let Some(status) = update.status else {
            return Err(ApiError::bad_request("status is required"));
        };

        order.apply_status(&update, Utc::now().date_naive());
        if let Some(note) = clean(update.notes) {
            order.notes = Some(append_note(order.notes.as_deref(), &note));
        }

        order.updated_at = Utc::now();
        repo.update(&order).await?;
        info!(id = %id, status = %status, "Work order status changed");
        Ok(order)
    }

    /// Moves the order and records the move in its notes.
    pub async fn transfer(&self, id: &str, input: TransferWorkOrder) -> ApiResult<WorkOrder> {
        let target_id = input.workshop_id.trim();
        if target_id.is_empty() {
            return Err(ApiError::bad_request("workshopId is required"));
        }

        let repo = self.db.work_orders();
        let mut order = repo.get(id).await?;
        if order.workshop_id == target_id {
            return Err(ApiError::bad_request(
                "Work order is already in the target workshop",
            ));
        }

        let workshops = self.db.workshops();
        let target = workshops.get_by_id(target_id).await?;
        require_reference(target.is_some(), "Target workshop")?;
        let target_name = target.map(|w| w.name).unwrap_or_default();
        let source_name = workshops
            .get_by_id(&order.workshop_id)
            .await?
            .map(|w| w.name)
            .unwrap_or_else(|| order.workshop_id.clone());

        let mut note = format!("Transferred from \"{source_name}\" to \"{target_name}\"");
        if let Some(reason) = clean(input.reason) {
            note.push_str(&format!(" - Reason: {reason}"));
        }
        order.notes = Some(append_note(order.notes.as_deref(), &note));
        order.workshop_id = target_id.to_string();

        order.updated_at = Utc::now();
        repo.update(&order).await?;
        info!(id = %id, workshop = %order.workshop_id, "Work order transferred");
        Ok(order)
    }

    /// Adds then removes images; the result keeps first-seen order.
    pub async fn update_images(&self, id: &str, changes: ImageChanges) -> ApiResult<WorkOrder> {
        let repo = self.db.work_orders();
        let mut order = repo.get(id).await?;

        let mut images = order.images.into_inner();
        images.extend(changes.images_to_add);
        images.retain(|image| !changes.images_to_remove.contains(image));
        order.images = JsonText(dedup_strings(images));

        order.updated_at = Utc::now();
        repo.update(&order).await?;
        Ok(order)
    }

    pub async fn update_quality(&self, id: &str, input: QualityUpdate) -> ApiResult<WorkOrder> {
        let repo = self.db.work_orders();
        let mut order = repo.get(id).await?;
        check_score("qualityRating", input.quality_rating)?;

        merge_opt(&mut order.quality_rating, input.quality_rating);
        merge_opt(&mut order.quality_notes, clean(input.quality_notes));

        order.updated_at = Utc::now();
        repo.update(&order).await?;
        Ok(order)
    }

    /// Cancels an open order; deletes one that is already cancelled.
    pub async fn remove(&self, id: &str) -> ApiResult<WorkOrderRemoval> {
        let repo = self.db.work_orders();
        let mut order = repo.get(id).await?;

        let removal = if order.status == WorkOrderStatus::Cancelled {
            repo.delete(id).await?;
            WorkOrderRemoval::Deleted
        } else {
            order.status = WorkOrderStatus::Cancelled;
            order.notes = Some(append_note(order.notes.as_deref(), "CANCELLED"));
            order.updated_at = Utc::now();
            repo.update(&order).await?;
            WorkOrderRemoval::Cancelled
        };
        info!(id = %id, ?removal, "Work order removed");
        Ok(removal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use crate::services::workshops::WorkshopService;
    use chrono::NaiveDate;
    use zarmind_core::{NewWorkshop, Workshop};

    async fn workshop(db: &Database, name: &str) -> Workshop {
        WorkshopService::new(db)
            .create(NewWorkshop {
                name: name.to_string(),
                ..NewWorkshop::default()
            })
            .await
            .unwrap()
    }

    fn new_order(workshop_id: &str) -> NewWorkOrder {
        NewWorkOrder {
            workshop_id: workshop_id.to_string(),
            product_name: "Gold bangle".to_string(),
            quantity: 1,
            images: vec!["front.jpg".to_string()],
            ..NewWorkOrder::default()
        }
    }

    fn to(status: WorkOrderStatus) -> StatusUpdate {
        StatusUpdate {
            status: Some(status),
            ..StatusUpdate::default()
        }
    }

    #[tokio::test]
    async fn test_create_validates_references() {
        let db = testing::database().await;
        let service = WorkOrderService::new(&db);

        let err = service.create(new_order("missing")).await.unwrap_err();
        assert_eq!(err.message, "Workshop not found");

        let ws = workshop(&db, "Zagros").await;
        let order = service.create(new_order(&ws.id)).await.unwrap();
        assert!(order.order_number.starts_with("WO-"));
        assert_eq!(order.status, WorkOrderStatus::Pending);

        let err = service
            .create(NewWorkOrder {
                order_number: Some(order.order_number.clone()),
                ..new_order(&ws.id)
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "Order number already exists");

        let err = service
            .create(NewWorkOrder {
                quality_rating: Some(7),
                ..new_order(&ws.id)
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "qualityRating must be between 1 and 5");
    }

    #[tokio::test]
    async fn test_status_stamps_dates_and_appends_notes() {
        let db = testing::database().await;
        let ws = workshop(&db, "Zagros").await;
        let service = WorkOrderService::new(&db);
        let order = service.create(new_order(&ws.id)).await.unwrap();

        let err = service
            .update_status(&order.id, StatusUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "status is required");

        let started = service
            .update_status(
                &order.id,
                StatusUpdate {
                    notes: Some("Casting begun".to_string()),
                    ..to(WorkOrderStatus::InProgress)
                },
            )
            .await
            .unwrap();
        assert_eq!(started.start_date, Some(Utc::now().date_naive()));

        let explicit = NaiveDate::from_ymd_opt(2024, 1, 15);
        let done = service
            .update_status(
                &order.id,
                StatusUpdate {
                    completed_date: explicit,
                    notes: Some("Polished".to_string()),
                    ..to(WorkOrderStatus::Completed)
                },
            )
            .await
            .unwrap();
        assert_eq!(done.completed_date, explicit);
        assert_eq!(done.start_date, started.start_date);
        assert_eq!(done.notes.as_deref(), Some("Casting begun\nPolished"));

        let stored = service.get(&order.id).await.unwrap();
        assert_eq!(stored.status, WorkOrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_transfer_records_move() {
        let db = testing::database().await;
        let from = workshop(&db, "Zagros").await;
        let to_ws = workshop(&db, "Alborz").await;
        let service = WorkOrderService::new(&db);
        let order = service.create(new_order(&from.id)).await.unwrap();

        let err = service
            .transfer(
                &order.id,
                TransferWorkOrder {
                    workshop_id: from.id.clone(),
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Work order is already in the target workshop");

        let err = service
            .transfer(
                &order.id,
                TransferWorkOrder {
                    workshop_id: "missing".to_string(),
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Target workshop not found");

        let moved = service
            .transfer(
                &order.id,
                TransferWorkOrder {
                    workshop_id: to_ws.id.clone(),
                    reason: Some("Backlog".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.workshop_id, to_ws.id);
        assert_eq!(
            moved.notes.as_deref(),
            Some("Transferred from \"Zagros\" to \"Alborz\" - Reason: Backlog")
        );
    }

    #[tokio::test]
    async fn test_quality_and_images() {
        let db = testing::database().await;
        let ws = workshop(&db, "Zagros").await;
        let service = WorkOrderService::new(&db);
        let order = service.create(new_order(&ws.id)).await.unwrap();

        let err = service
            .update_quality(
                &order.id,
                QualityUpdate {
                    quality_rating: Some(0),
                    quality_notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "qualityRating must be between 1 and 5");

        let rated = service
            .update_quality(
                &order.id,
                QualityUpdate {
                    quality_rating: Some(4),
                    quality_notes: Some("Minor scratches".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(rated.quality_rating, Some(4));
        assert_eq!(rated.quality_notes.as_deref(), Some("Minor scratches"));

        let images = service
            .update_images(
                &order.id,
                ImageChanges {
                    images_to_add: vec!["side.jpg".to_string(), "front.jpg".to_string()],
                    images_to_remove: vec!["front.jpg".to_string()],
                },
            )
            .await
            .unwrap();
        assert_eq!(images.images.0, vec!["side.jpg"]);
    }

    #[tokio::test]
    async fn test_remove_cancels_then_deletes() {
        let db = testing::database().await;
        let ws = workshop(&db, "Zagros").await;
        let service = WorkOrderService::new(&db);
        let order = service.create(new_order(&ws.id)).await.unwrap();

        assert_eq!(
            service.remove(&order.id).await.unwrap(),
            WorkOrderRemoval::Cancelled
        );
        let cancelled = service.get(&order.id).await.unwrap();
        assert_eq!(cancelled.status, WorkOrderStatus::Cancelled);
        assert_eq!(cancelled.notes.as_deref(), Some("CANCELLED"));

        assert_eq!(
            service.remove(&order.id).await.unwrap(),
            WorkOrderRemoval::Deleted
        );
        let err = service.get(&order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Work order not found");
    }
}
