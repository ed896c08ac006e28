//! Purchase orders and goods receipt.
//!
//! ```text
//!              receive (some)            receive (rest) / complete
//!   PENDING ─────────────────► PARTIALLY_RECEIVED ─────────────────► COMPLETED
//!      │                              │
//!      └──────────── cancel ──────────┴──► CANCELLED
//! ```
//!
//! Receiving validates every line up front, then writes item, branch row
//! and item counter as separate awaited calls. A failure half-way leaves
//! the earlier writes in place.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::{clean, insert_with_code, merge, merge_opt, out_of_range, require_reference};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use zarmind_core::codes::generate_code;
use zarmind_core::status::apply_quantity_delta;
use zarmind_core::validation::{
    validate_non_negative, validate_positive_quantity, validate_required,
};
use zarmind_core::{
    BranchStock, CancelPurchase, CompletePurchase, Money, NewPurchase, PagedResult, Purchase,
    PurchaseItem, PurchasePatch, PurchaseQuery, PurchaseStatus, ReceiveItems,
    DEFAULT_MINIMUM_STOCK,
};
use zarmind_db::{append_note, new_id, Database, PurchaseTotals};

const SUMMARY_DAYS: i64 = 30;

/// A purchase with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

/// `GET summary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub count: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total_amount: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub total_paid: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub outstanding: Money,
    pub by_status: BTreeMap<String, f64>,
}

impl PurchaseSummary {
    fn new(from: NaiveDate, to: NaiveDate, totals: PurchaseTotals) -> Self {
        PurchaseSummary {
            from,
            to,
            count: totals.count,
            total_amount: totals.total_amount,
            total_paid: totals.total_paid,
            outstanding: totals.outstanding(),
            by_status: totals
                .by_status
                .into_iter()
                .map(|(status, total)| (status, total.to_major()))
                .collect(),
        }
    }
}

/// Stock movement of one item into one branch, validated before writing.
struct StockMove {
    product_id: String,
    delta: i64,
    product_quantity: i64,
    row_quantity: i64,
    row: Option<BranchStock>,
}

pub struct PurchaseService {
    db: Database,
}

impl PurchaseService {
    pub fn new(db: &Database) -> Self {
        PurchaseService { db: db.clone() }
    }

    /// Creates the order for the calling user.
    pub async fn create(&self, input: NewPurchase, caller: &AuthUser) -> ApiResult<PurchaseDetail> {
        require_reference(self.db.branches().exists(&input.branch_id).await?, "Branch")?;
        let supplier_id = clean(input.supplier_id);
        if let Some(supplier_id) = supplier_id.as_deref() {
            require_reference(self.db.suppliers().exists(supplier_id).await?, "Supplier")?;
        }

        let purchase_id = new_id();
        let mut items = Vec::with_capacity(input.items.len());
        for line in input.items {
            validate_positive_quantity("quantity", line.quantity)?;
            validate_non_negative("unitPrice", line.unit_price)?;
            require_reference(self.db.products().exists(&line.product_id).await?, "Product")?;
            items.push(PurchaseItem {
                id: new_id(),
                purchase_id: purchase_id.clone(),
                product_id: line.product_id,
                quantity: line.quantity,
                received_quantity: 0,
                unit_price: line.unit_price,
                weight: line.weight,
                subtotal: line
                    .unit_price
                    .multiply_quantity(line.quantity)
                    .ok_or_else(|| out_of_range("subtotal"))?,
                notes: clean(line.notes),
            });
        }

        let subtotal = if items.is_empty() {
            input.subtotal.unwrap_or_default()
        } else {
            Money::checked_sum(items.iter().map(|i| i.subtotal))
                .ok_or_else(|| out_of_range("subtotal"))?
        };
        let tax_amount = input.tax_amount.unwrap_or_default();
        let total_amount = match input.total_amount {
            Some(total) => total,
            None => subtotal
                .checked_add(tax_amount)
                .ok_or_else(|| out_of_range("totalAmount"))?,
        };
        let paid_amount = input.paid_amount.unwrap_or_default();
        validate_non_negative("subtotal", subtotal)?;
        validate_non_negative("taxAmount", tax_amount)?;
        validate_non_negative("totalAmount", total_amount)?;
        validate_non_negative("paidAmount", paid_amount)?;

        let status = input.status.unwrap_or_else(|| {
            if total_amount.is_positive() && paid_amount >= total_amount {
                PurchaseStatus::Completed
            } else {
                PurchaseStatus::Pending
            }
        });

        let now = Utc::now();
        let template = Purchase {
            id: purchase_id,
            purchase_number: String::new(),
            purchase_date: input.purchase_date.unwrap_or_else(|| now.date_naive()),
            supplier_id,
            branch_id: input.branch_id,
            user_id: caller.id.clone(),
            status,
            subtotal,
            tax_amount,
            total_amount,
            paid_amount,
            payment_method: clean(input.payment_method),
            delivery_date: input.delivery_date,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let repo = &self.db.purchases();
        let lines = &items;
        let purchase = insert_with_code(
            "purchase_number",
            input.purchase_number,
            || generate_code("PUR"),
            move |purchase_number| {
                let purchase = Purchase {
                    purchase_number,
                    ..template.clone()
                };
                async move { repo.insert(&purchase, lines).await }
            },
        )
        .await?;
        info!(
            id = %purchase.id,
            number = %purchase.purchase_number,
            status = %purchase.status,
            lines = items.len(),
            "Purchase created"
        );

        if purchase.status == PurchaseStatus::Completed {
            self.receive_outstanding(&purchase, &items).await?;
        }
        self.get(&purchase.id).await
    }

    pub async fn list(&self, query: &PurchaseQuery) -> ApiResult<PagedResult<Purchase>> {
        Ok(self.db.purchases().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<PurchaseDetail> {
        let repo = self.db.purchases();
        let purchase = repo.get(id).await?;
        let items = repo.items(id).await?;
        Ok(PurchaseDetail { purchase, items })
    }

    /// Header fields only.
    pub async fn update(&self, id: &str, patch: PurchasePatch) -> ApiResult<Purchase> {
        let repo = self.db.purchases();
        let mut purchase = repo.get(id).await?;

        if let Some(paid) = patch.paid_amount {
            validate_non_negative("paidAmount", paid)?;
        }

        merge(&mut purchase.purchase_date, patch.purchase_date);
        merge_opt(&mut purchase.delivery_date, patch.delivery_date);
        merge_opt(&mut purchase.payment_method, patch.payment_method);
        merge(&mut purchase.paid_amount, patch.paid_amount);
        merge_opt(&mut purchase.notes, patch.notes);

        purchase.updated_at = Utc::now();
        repo.update(&purchase).await?;
        Ok(purchase)
    }

    /// Moves received quantities by signed deltas.
    pub async fn receive(&self, id: &str, input: ReceiveItems) -> ApiResult<PurchaseDetail> {
        let repo = self.db.purchases();
        let purchase = repo.get(id).await?;
        if matches!(
            purchase.status,
            PurchaseStatus::Cancelled | PurchaseStatus::Completed
        ) {
            return Err(ApiError::bad_request(format!(
                "Cannot receive items for a {} purchase",
                purchase.status.to_string().to_lowercase()
            )));
        }
        if input.items.is_empty() {
            return Err(ApiError::validation("items is required"));
        }

        let items = repo.items(id).await?;
        let mut received: BTreeMap<&str, i64> = BTreeMap::new();
        let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
        for line in &input.items {
            let item = items
                .iter()
                .find(|i| i.id == line.item_id)
                .ok_or_else(|| {
                    ApiError::bad_request(format!(
                        "Purchase item {} does not belong to this purchase",
                        line.item_id
                    ))
                })?;
            let current = received
                .get(item.id.as_str())
                .copied()
                .unwrap_or(item.received_quantity);
            let next = current
                .checked_add(line.quantity)
                .ok_or_else(|| out_of_range("quantity"))?;
            if !(0..=item.quantity).contains(&next) {
                return Err(ApiError::bad_request(format!(
                    "Received quantity for item {} must be between 0 and {}",
                    item.id, item.quantity
                )));
            }
            received.insert(item.id.as_str(), next);
            add_delta(&mut deltas, &item.product_id, line.quantity)?;
        }

        let moves = self.plan_moves(&purchase.branch_id, deltas).await?;

        for line in &input.items {
            if let Some(next) = received.get(line.item_id.as_str()) {
                repo.set_received(&line.item_id, *next, clean(line.notes.clone()).as_deref())
                    .await?;
            }
        }
        self.apply_moves(&purchase.branch_id, moves).await?;

        let items = repo.items(id).await?;
        let status = derive_status(&items);
        repo.set_status(id, status, None).await?;
        info!(id = %id, lines = input.items.len(), status = %status, "Purchase items received");

        self.get(id).await
    }

    /// Receives whatever is still outstanding and closes the order.
    pub async fn complete(&self, id: &str, input: CompletePurchase) -> ApiResult<PurchaseDetail> {
        let repo = self.db.purchases();
        let purchase = repo.get(id).await?;
        if purchase.status == PurchaseStatus::Cancelled {
            return Err(ApiError::bad_request("Cannot complete a cancelled purchase"));
        }

        let items = repo.items(id).await?;
        self.receive_outstanding(&purchase, &items).await?;

        let notes = clean(input.notes).map(|n| append_note(purchase.notes.as_deref(), &n));
        repo.set_status(id, PurchaseStatus::Completed, notes.as_deref())
            .await?;
        info!(id = %id, "Purchase completed");
        self.get(id).await
    }

    pub async fn cancel(&self, id: &str, input: CancelPurchase) -> ApiResult<PurchaseDetail> {
        validate_required("reason", &input.reason)?;
        let repo = self.db.purchases();
        let purchase = repo.get(id).await?;
        if purchase.status == PurchaseStatus::Completed {
            return Err(ApiError::bad_request("Cannot cancel a completed purchase"));
        }

        let mut notes = append_note(
            purchase.notes.as_deref(),
            &format!("CANCELLED: {}", input.reason.trim()),
        );
        if let Some(extra) = clean(input.notes) {
            notes = append_note(Some(&notes), &extra);
        }
        repo.set_status(id, PurchaseStatus::Cancelled, Some(&notes))
            .await?;
        info!(id = %id, reason = %input.reason.trim(), "Purchase cancelled");
        self.get(id).await
    }

    /// Period totals; the period defaults to the last 30 days.
    pub async fn summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        branch_id: Option<&str>,
    ) -> ApiResult<PurchaseSummary> {
        let to = to.unwrap_or_else(|| Utc::now().date_naive());
        let from = from.unwrap_or(to - Duration::days(SUMMARY_DAYS));
        let totals = self.db.purchases().totals(from, to, branch_id).await?;
        Ok(PurchaseSummary::new(from, to, totals))
    }

    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let repo = self.db.purchases();
        let purchase = repo.get(id).await?;
        if purchase.status == PurchaseStatus::Completed {
            return Err(ApiError::bad_request(
                "Cannot delete completed purchase. Cancel it first.",
            ));
        }
        repo.delete(id).await?;
        info!(id = %id, "Purchase deleted");
        Ok(())
    }

    async fn receive_outstanding(&self, purchase: &Purchase, items: &[PurchaseItem]) -> ApiResult<()> {
        let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
        for item in items.iter().filter(|i| i.outstanding() > 0) {
            add_delta(&mut deltas, &item.product_id, item.outstanding())?;
        }
        let moves = self.plan_moves(&purchase.branch_id, deltas).await?;

        let repo = self.db.purchases();
        for item in items.iter().filter(|i| i.outstanding() > 0) {
            repo.set_received(&item.id, item.quantity, None).await?;
        }
        self.apply_moves(&purchase.branch_id, moves).await
    }

    /// Checks every per-product delta against the branch row and the item
    /// counter without writing anything.
    async fn plan_moves(
        &self,
        branch_id: &str,
        deltas: BTreeMap<String, i64>,
    ) -> ApiResult<Vec<StockMove>> {
        let products = self.db.products();
        let mut moves = Vec::with_capacity(deltas.len());
        for (product_id, delta) in deltas.into_iter().filter(|(_, d)| *d != 0) {
            let row = products.stock_at(&product_id, branch_id).await?;
            let on_hand = row.as_ref().map(|r| r.quantity).unwrap_or(0);
            let row_quantity = on_hand
                .checked_add(delta)
                .ok_or_else(|| out_of_range("quantity"))?;
            if row_quantity < 0 {
                return Err(ApiError::bad_request(
                    "Receiving would result in negative branch inventory",
                ));
            }
            let product = products.get(&product_id).await?;
            let product_quantity = apply_quantity_delta(product.quantity, delta)?;
            moves.push(StockMove {
                product_id,
                delta,
                product_quantity,
                row_quantity,
                row,
            });
        }
        Ok(moves)
    }

    async fn apply_moves(&self, branch_id: &str, moves: Vec<StockMove>) -> ApiResult<()> {
        let products = self.db.products();
        for stock in moves {
            match stock.row {
                Some(row) => {
                    products
                        .set_stock_quantity(&row.id, stock.row_quantity)
                        .await?
                }
                None if stock.delta > 0 => {
                    products
                        .insert_stock(&BranchStock {
                            id: new_id(),
                            product_id: stock.product_id.clone(),
                            branch_id: branch_id.to_string(),
                            quantity: stock.delta,
                            minimum_stock: DEFAULT_MINIMUM_STOCK,
                            location: None,
                            updated_at: Utc::now(),
                        })
                        .await?
                }
                None => {}
            }
            products
                .set_quantity(&stock.product_id, stock.product_quantity)
                .await?;
        }
        Ok(())
    }
}

fn add_delta(deltas: &mut BTreeMap<String, i64>, product_id: &str, quantity: i64) -> ApiResult<()> {
    let delta = deltas.entry(product_id.to_string()).or_default();
    *delta = delta
        .checked_add(quantity)
        .ok_or_else(|| out_of_range("quantity"))?;
    Ok(())
}

fn derive_status(items: &[PurchaseItem]) -> PurchaseStatus {
    if !items.is_empty() && items.iter().all(PurchaseItem::is_fully_received) {
        PurchaseStatus::Completed
    } else if items.iter().any(|i| i.received_quantity > 0) {
        PurchaseStatus::PartiallyReceived
    } else {
        PurchaseStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::products::ProductService;
    use crate::services::testing;
    use zarmind_core::{
        NewProduct, NewPurchaseItem, NewUser, ReceiveLine, UserRole, UserStatus,
    };

    async fn caller(db: &Database) -> AuthUser {
        let user = crate::services::users::UserService::new(db)
            .create(NewUser {
                email: "buyer@zarmind.test".to_string(),
                username: "buyer".to_string(),
                password: "s3cret-pass".to_string(),
                role: Some(UserRole::Manager),
                ..NewUser::default()
            })
            .await
            .unwrap();
        AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
            status: UserStatus::Active,
            branch_id: None,
        }
    }

    async fn product(db: &Database, sku: &str) -> String {
        ProductService::new(db)
            .create(NewProduct {
                sku: Some(sku.to_string()),
                name: format!("Item {sku}"),
                ..NewProduct::default()
            })
            .await
            .unwrap()
            .product
            .id
    }

    fn line(product_id: &str, quantity: i64, price: f64) -> NewPurchaseItem {
        NewPurchaseItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Money::from_major(price),
            ..NewPurchaseItem::default()
        }
    }

    fn receive(item_id: &str, quantity: i64) -> ReceiveItems {
        ReceiveItems {
            items: vec![ReceiveLine {
                item_id: item_id.to_string(),
                quantity,
                notes: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_computes_totals() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let chain = product(&db, "CHAIN-1").await;

        let detail = PurchaseService::new(&db)
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    tax_amount: Some(Money::from_major(9.0)),
                    items: vec![line(&chain, 3, 30.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        assert!(detail.purchase.purchase_number.starts_with("PUR-"));
        assert_eq!(detail.purchase.subtotal, Money::from_major(90.0));
        assert_eq!(detail.purchase.total_amount, Money::from_major(99.0));
        assert_eq!(detail.purchase.status, PurchaseStatus::Pending);
        assert_eq!(detail.purchase.user_id, user.id);
        assert_eq!(detail.items.len(), 1);
    }

    #[tokio::test]
    async fn test_paid_purchase_is_received_on_create() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let coin = product(&db, "COIN-1").await;

        let detail = PurchaseService::new(&db)
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    paid_amount: Some(Money::from_major(500.0)),
                    items: vec![line(&coin, 2, 250.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        assert_eq!(detail.purchase.status, PurchaseStatus::Completed);
        assert!(detail.items[0].is_fully_received());

        let stock = ProductService::new(&db).get(&coin).await.unwrap();
        assert_eq!(stock.product.quantity, 2);
        assert_eq!(stock.total_branch_quantity, 2);
    }

    #[tokio::test]
    async fn test_receive_moves_status_and_stock() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let stone = product(&db, "STONE-1").await;
        let service = PurchaseService::new(&db);

        let detail = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    items: vec![line(&stone, 5, 10.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        let id = detail.purchase.id.clone();
        let item_id = detail.items[0].id.clone();

        let partial = service.receive(&id, receive(&item_id, 2)).await.unwrap();
        assert_eq!(partial.purchase.status, PurchaseStatus::PartiallyReceived);
        assert_eq!(partial.items[0].received_quantity, 2);

        let err = service.receive(&id, receive(&item_id, 4)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        let err = service.receive(&id, receive(&item_id, -3)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(
            service.get(&id).await.unwrap().items[0].received_quantity,
            2
        );

        let done = service.receive(&id, receive(&item_id, 3)).await.unwrap();
        assert_eq!(done.purchase.status, PurchaseStatus::Completed);
        assert_eq!(ProductService::new(&db).get(&stone).await.unwrap().product.quantity, 5);

        let err = service.receive(&id, receive(&item_id, -1)).await.unwrap_err();
        assert!(err.message.contains("completed"));
    }

    #[tokio::test]
    async fn test_foreign_item_is_rejected() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let service = PurchaseService::new(&db);

        let detail = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    subtotal: Some(Money::from_major(10.0)),
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        let err = service
            .receive(&detail.purchase.id, receive("not-an-item", 1))
            .await
            .unwrap_err();
        assert!(err.message.contains("does not belong"));
    }

    #[tokio::test]
    async fn test_cancel_complete_and_remove_rules() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let bar = product(&db, "BAR-1").await;
        let service = PurchaseService::new(&db);

        let first = service
            .create(
                NewPurchase {
                    purchase_number: Some("PUR-A".to_string()),
                    branch_id: branch.id.clone(),
                    notes: Some("Urgent".to_string()),
                    items: vec![line(&bar, 1, 100.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        let cancelled = service
            .cancel(
                &first.purchase.id,
                CancelPurchase {
                    reason: "Supplier out of stock".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(cancelled.purchase.status, PurchaseStatus::Cancelled);
        assert_eq!(
            cancelled.purchase.notes.as_deref(),
            Some("Urgent\nCANCELLED: Supplier out of stock")
        );
        let err = service
            .complete(&first.purchase.id, CompletePurchase::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Cannot complete a cancelled purchase");

        let second = service
            .create(
                NewPurchase {
                    purchase_number: Some("PUR-B".to_string()),
                    branch_id: branch.id.clone(),
                    items: vec![line(&bar, 4, 100.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        let completed = service
            .complete(&second.purchase.id, CompletePurchase::default())
            .await
            .unwrap();
        assert_eq!(completed.purchase.status, PurchaseStatus::Completed);
        assert_eq!(ProductService::new(&db).get(&bar).await.unwrap().product.quantity, 4);

        let err = service.remove(&second.purchase.id).await.unwrap_err();
        assert_eq!(err.message, "Cannot delete completed purchase. Cancel it first.");
        service.remove(&first.purchase.id).await.unwrap();

        let summary = service.summary(None, None, Some(&branch.id)).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_amount, Money::from_major(400.0));
        assert_eq!(summary.outstanding, Money::from_major(400.0));
    }

    #[tokio::test]
    async fn test_line_total_overflow_is_rejected() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let ingot = product(&db, "INGOT-1").await;
        let service = PurchaseService::new(&db);
        let half = Money::from_cents(i64::MAX / 2 + 1);

        let err = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    items: vec![NewPurchaseItem {
                        unit_price: half,
                        ..line(&ingot, 2, 0.0)
                    }],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "subtotal is out of range");

        let one = NewPurchaseItem {
            unit_price: half,
            ..line(&ingot, 1, 0.0)
        };
        let err = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    items: vec![one.clone(), one],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "subtotal is out of range");

        let err = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    subtotal: Some(Money::from_cents(i64::MAX)),
                    tax_amount: Some(Money::from_cents(1)),
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "totalAmount is out of range");
        assert_eq!(service.summary(None, None, None).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_receive_overflow_is_rejected() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let user = caller(&db).await;
        let service = PurchaseService::new(&db);

        let bulk = product(&db, "BULK-1").await;
        let detail = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    items: vec![line(&bulk, i64::MAX, 0.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        let item_id = detail.items[0].id.clone();
        let twice = ReceiveItems {
            items: vec![
                ReceiveLine {
                    item_id: item_id.clone(),
                    quantity: i64::MAX,
                    notes: None,
                },
                ReceiveLine {
                    item_id: item_id.clone(),
                    quantity: i64::MAX,
                    notes: None,
                },
            ],
        };
        let err = service.receive(&detail.purchase.id, twice).await.unwrap_err();
        assert_eq!(err.message, "quantity is out of range");
        assert_eq!(
            service.get(&detail.purchase.id).await.unwrap().items[0].received_quantity,
            0
        );

        let stocked = ProductService::new(&db)
            .create(NewProduct {
                sku: Some("STOCKED-1".to_string()),
                name: "Stocked".to_string(),
                quantity: Some(0),
                allocations: vec![zarmind_core::BranchAllocation {
                    branch_id: branch.id.clone(),
                    quantity: i64::MAX,
                    ..zarmind_core::BranchAllocation::default()
                }],
                ..NewProduct::default()
            })
            .await
            .unwrap()
            .product
            .id;
        let detail = service
            .create(
                NewPurchase {
                    branch_id: branch.id.clone(),
                    items: vec![line(&stocked, 1, 10.0)],
                    ..NewPurchase::default()
                },
                &user,
            )
            .await
            .unwrap();
        let err = service
            .receive(&detail.purchase.id, receive(&detail.items[0].id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.message, "quantity is out of range");
        let after = ProductService::new(&db).get(&stocked).await.unwrap();
        assert_eq!(after.product.quantity, 0);
        assert_eq!(after.inventory[0].quantity, i64::MAX);
    }
}
