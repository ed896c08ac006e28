//! Accounts payable and receivable.
//!
//! One engine serves both sides of the books; [`LedgerKind`] picks the table
//! and the counterparty (supplier or customer).
//!
//! ```text
//! create 1000/0   → PENDING  remaining 1000
//! pay 400         → PARTIAL  remaining  600
//! pay 600         → PAID     remaining    0
//! pay 1           → 400 "Payment amount exceeds total amount", unchanged
//! ```
//!
//! Payments are read-modify-write without a row lock. Two concurrent
//! payments on the same record can lose one update.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::{clean, code_or, merge, merge_opt, require_reference};
use crate::error::ApiResult;
use zarmind_core::codes::generate_code;
use zarmind_core::status::LedgerAmounts;
use zarmind_core::{
    LedgerEntry, LedgerKind, LedgerPatch, LedgerQuery, Money, NewLedgerEntry, PagedResult,
    PaymentInput,
};
use zarmind_db::{append_note, new_id, Database, LedgerRepository, LedgerTotals};

/// `GET .../summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    #[serde(with = "zarmind_core::money::major")]
    pub total_due: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub total_paid: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub total_pending: Money,
    pub overdue: OverdueSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueSummary {
    #[serde(with = "zarmind_core::money::major")]
    pub amount: Money,
    pub count: i64,
}

impl From<LedgerTotals> for LedgerSummary {
    fn from(totals: LedgerTotals) -> Self {
        LedgerSummary {
            total_due: totals.total_due,
            total_paid: totals.total_paid,
            total_pending: totals.total_pending,
            overdue: OverdueSummary {
                amount: totals.overdue_amount,
                count: totals.overdue_count,
            },
        }
    }
}

/// Action envelope for `POST :id/payment`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResult {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub record: LedgerEntry,
}

pub struct LedgerService {
    db: Database,
    kind: LedgerKind,
}

impl LedgerService {
    pub fn new(db: &Database, kind: LedgerKind) -> Self {
        LedgerService {
            db: db.clone(),
            kind,
        }
    }

    fn repo(&self) -> LedgerRepository {
        self.db.ledger(self.kind)
    }

    async fn counterparty_exists(&self, id: &str) -> ApiResult<bool> {
        Ok(match self.kind {
            LedgerKind::Payable => self.db.suppliers().exists(id).await?,
            LedgerKind::Receivable => self.db.customers().exists(id).await?,
        })
    }

    pub async fn create(&self, input: NewLedgerEntry) -> ApiResult<LedgerEntry> {
        require_reference(
            self.counterparty_exists(&input.counterparty_id).await?,
            self.kind.counterparty(),
        )?;
        let amounts = LedgerAmounts::new(input.amount, input.paid_amount.unwrap_or_default())?;

        let now = Utc::now();
        let entry = LedgerEntry {
            id: new_id(),
            counterparty_id: input.counterparty_id,
            invoice_number: code_or(input.invoice_number, || {
                generate_code(self.kind.code_prefix())
            }),
            invoice_date: input.invoice_date.unwrap_or_else(|| now.date_naive()),
            amount: amounts.amount(),
            paid_amount: amounts.paid(),
            remaining_amount: amounts.remaining(),
            due_date: input.due_date,
            status: amounts.status(),
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let entry = self.repo().insert(&entry).await?;
        info!(kind = ?self.kind, id = %entry.id, status = %entry.status, "Ledger record created");
        Ok(entry)
    }

    pub async fn list(&self, query: &LedgerQuery) -> ApiResult<PagedResult<LedgerEntry>> {
        Ok(self.repo().list(query, today()).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<LedgerEntry> {
        Ok(self.repo().get(id).await?)
    }

    /// Merges the patch and re-derives remaining and status.
    pub async fn update(&self, id: &str, patch: LedgerPatch) -> ApiResult<LedgerEntry> {
        let repo = self.repo();
        let mut entry = repo.get(id).await?;

        let amounts = LedgerAmounts::new(entry.amount, entry.paid_amount)?
            .merge(patch.amount, patch.paid_amount)?;

        merge(&mut entry.invoice_number, clean(patch.invoice_number));
        merge(&mut entry.invoice_date, patch.invoice_date);
        merge_opt(&mut entry.due_date, patch.due_date);
        merge_opt(&mut entry.notes, patch.notes);
        apply(&mut entry, amounts);

        repo.update(&entry).await?;
        Ok(entry)
    }

    /// Adds a payment. Over-payment is rejected and nothing is written.
    pub async fn record_payment(&self, id: &str, input: PaymentInput) -> ApiResult<PaymentResult> {
        let repo = self.repo();
        let mut entry = repo.get(id).await?;

        let amounts = LedgerAmounts::new(entry.amount, entry.paid_amount)?
            .record_payment(input.payment_amount)?;

        apply(&mut entry, amounts);
        if let Some(note) = clean(input.notes) {
            entry.notes = Some(append_note(entry.notes.as_deref(), &note));
        }
        repo.update(&entry).await?;

        info!(
            kind = ?self.kind,
            id = %id,
            payment = %input.payment_amount,
            status = %entry.status,
            "Payment recorded"
        );
        Ok(PaymentResult {
            success: true,
            message: "Payment recorded successfully".to_string(),
            record: entry,
        })
    }

    pub async fn summary(&self, counterparty_id: Option<&str>) -> ApiResult<LedgerSummary> {
        Ok(self.repo().totals(counterparty_id, today()).await?.into())
    }

    /// Ledger records have no dependents and are always hard-deleted.
    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let repo = self.repo();
        repo.get(id).await?;
        repo.delete(id).await?;
        info!(kind = ?self.kind, id = %id, "Ledger record deleted");
        Ok(())
    }
}

fn apply(entry: &mut LedgerEntry, amounts: LedgerAmounts) {
    entry.amount = amounts.amount();
    entry.paid_amount = amounts.paid();
    entry.remaining_amount = amounts.remaining();
    entry.status = amounts.status();
    entry.updated_at = Utc::now();
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
