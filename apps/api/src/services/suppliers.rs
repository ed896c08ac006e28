//! Suppliers, the counterparties of accounts payable.

use chrono::Utc;
use tracing::info;

use super::{
    check_email, check_phone, check_rating, clean, insert_with_code, merge, merge_opt,
};
use crate::error::ApiResult;
use zarmind_core::codes::generate_code_with_suffix;
use zarmind_core::validation::{validate_name, validate_rating};
use zarmind_core::{
    LedgerEntry, NewSupplier, PagedResult, RatingUpdate, Supplier, SupplierPatch, SupplierQuery,
    SupplierStatus,
};
use zarmind_db::{append_note, new_id, Database, Removal};

pub struct SupplierService {
    db: Database,
}

impl SupplierService {
    pub fn new(db: &Database) -> Self {
        SupplierService { db: db.clone() }
    }

    pub async fn create(&self, input: NewSupplier) -> ApiResult<Supplier> {
        validate_name("name", &input.name)?;
        check_phone(input.phone.as_deref())?;
        check_email(input.email.as_deref())?;
        check_rating(input.rating)?;

        let now = Utc::now();
        let template = Supplier {
            id: new_id(),
            code: String::new(),
            name: input.name.trim().to_string(),
            contact_person: clean(input.contact_person),
            phone: clean(input.phone),
            email: clean(input.email),
            address: clean(input.address),
            city: clean(input.city),
            payment_terms: clean(input.payment_terms),
            rating: input.rating,
            status: input.status.unwrap_or_default(),
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let repo = &self.db.suppliers();
        let supplier = insert_with_code(
            "code",
            input.code,
            || generate_code_with_suffix("SUPP"),
            move |code| {
                let supplier = Supplier {
                    code,
                    ..template.clone()
                };
                async move { repo.insert(&supplier).await }
            },
        )
        .await?;
        info!(id = %supplier.id, code = %supplier.code, "Supplier created");
        Ok(supplier)
    }

    pub async fn list(&self, query: &SupplierQuery) -> ApiResult<PagedResult<Supplier>> {
        Ok(self.db.suppliers().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Supplier> {
        Ok(self.db.suppliers().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: SupplierPatch) -> ApiResult<Supplier> {
        let repo = self.db.suppliers();
        let mut supplier = repo.get(id).await?;

        if let Some(name) = patch.name.as_deref() {
            validate_name("name", name)?;
        }
        check_phone(patch.phone.as_deref())?;
        check_email(patch.email.as_deref())?;
        check_rating(patch.rating)?;

        merge(&mut supplier.name, patch.name.map(|n| n.trim().to_string()));
        merge_opt(&mut supplier.contact_person, patch.contact_person);
        merge_opt(&mut supplier.phone, patch.phone);
        merge_opt(&mut supplier.email, patch.email);
        merge_opt(&mut supplier.address, patch.address);
        merge_opt(&mut supplier.city, patch.city);
        merge_opt(&mut supplier.payment_terms, patch.payment_terms);
        merge_opt(&mut supplier.rating, patch.rating);
        merge(&mut supplier.status, patch.status);
        merge_opt(&mut supplier.notes, patch.notes);

        supplier.updated_at = Utc::now();
        repo.update(&supplier).await?;
        Ok(supplier)
    }

    /// Sets the rating; rating notes are appended to the existing notes.
    pub async fn rate(&self, id: &str, input: RatingUpdate) -> ApiResult<Supplier> {
        validate_rating(input.rating)?;

        let repo = self.db.suppliers();
        let mut supplier = repo.get(id).await?;
        supplier.rating = Some(input.rating);
        if let Some(note) = clean(input.notes) {
            supplier.notes = Some(append_note(supplier.notes.as_deref(), &note));
        }
        supplier.updated_at = Utc::now();
        repo.update(&supplier).await?;
        Ok(supplier)
    }

    /// Suppliers with payables or purchases are deactivated, others deleted.
    pub async fn remove(&self, id: &str) -> ApiResult<Removal> {
        let repo = self.db.suppliers();
        repo.get(id).await?;

        let removal = Removal::for_dependents(repo.dependents(id).await?);
        match removal {
            Removal::Deactivated => repo.set_status(id, SupplierStatus::Inactive).await?,
            Removal::Deleted => repo.delete(id).await?,
        }
        info!(id = %id, ?removal, "Supplier removed");
        Ok(removal)
    }

    pub async fn payables(&self, id: &str) -> ApiResult<Vec<LedgerEntry>> {
        self.db.suppliers().get(id).await?;
        Ok(self.db.payables().list_for_counterparty(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use zarmind_core::{LedgerKind, Money, NewLedgerEntry};

    fn new_supplier(name: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_string(),
            city: Some("Tehran".to_string()),
            ..NewSupplier::default()
        }
    }

    #[tokio::test]
    async fn test_rate_appends_notes() {
        let db = testing::database().await;
        let service = SupplierService::new(&db);
        let supplier = service
            .create(NewSupplier {
                notes: Some("Bulk gold".to_string()),
                ..new_supplier("Arya Gold")
            })
            .await
            .unwrap();
        assert!(supplier.code.starts_with("SUPP-"));

        let rated = service
            .rate(
                &supplier.id,
                RatingUpdate {
                    rating: 4,
                    notes: Some("Late delivery in March".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(rated.rating, Some(4));
        assert_eq!(rated.notes.as_deref(), Some("Bulk gold\nLate delivery in March"));
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let db = testing::database().await;
        let service = SupplierService::new(&db);
        let supplier = service.create(new_supplier("Pars Coins")).await.unwrap();

        let err = service
            .rate(&supplier.id, RatingUpdate { rating: 6, notes: None })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(service.get(&supplier.id).await.unwrap().rating, None);
    }

    #[tokio::test]
    async fn test_remove_with_payables_deactivates() {
        let db = testing::database().await;
        let service = SupplierService::new(&db);
        let supplier = service.create(new_supplier("Kian Stones")).await.unwrap();

        crate::services::ledger::LedgerService::new(&db, LedgerKind::Payable)
            .create(NewLedgerEntry {
                counterparty_id: supplier.id.clone(),
                amount: Money::from_major(500.0),
                ..NewLedgerEntry::default()
            })
            .await
            .unwrap();

        assert_eq!(service.remove(&supplier.id).await.unwrap(), Removal::Deactivated);
        assert_eq!(
            service.get(&supplier.id).await.unwrap().status,
            SupplierStatus::Inactive
        );
        assert_eq!(service.payables(&supplier.id).await.unwrap().len(), 1);
    }
}
