//! CRM customers.

use chrono::Utc;
use tracing::info;

use super::{check_email, clean, insert_with_code, merge, merge_opt};
use crate::error::ApiResult;
use zarmind_core::codes::generate_code_with_suffix;
use zarmind_core::validation::{validate_name, validate_non_negative, validate_phone};
use zarmind_core::{
    Customer, CustomerPatch, CustomerQuery, CustomerStatus, CustomerType, LedgerEntry, Money,
    NewCustomer, PagedResult, ValidationError,
};
use zarmind_db::{new_id, Database, Removal};

pub struct CustomerService {
    db: Database,
}

impl CustomerService {
    pub fn new(db: &Database) -> Self {
        CustomerService { db: db.clone() }
    }

    pub async fn create(&self, input: NewCustomer) -> ApiResult<Customer> {
        let customer_type = input.customer_type.unwrap_or_default();
        validate_phone(&input.phone)?;
        check_email(input.email.as_deref())?;
        check_names(
            customer_type,
            input.first_name.as_deref(),
            input.last_name.as_deref(),
            input.business_name.as_deref(),
        )?;
        let credit_limit = input.credit_limit.unwrap_or_default();
        validate_non_negative("creditLimit", credit_limit)?;

        let now = Utc::now();
        let template = Customer {
            id: new_id(),
            code: String::new(),
            customer_type,
            status: input.status.unwrap_or_default(),
            first_name: clean(input.first_name),
            last_name: clean(input.last_name),
            business_name: clean(input.business_name),
            phone: input.phone.trim().to_string(),
            email: clean(input.email),
            national_id: clean(input.national_id),
            address: clean(input.address),
            city: clean(input.city),
            credit_limit,
            current_balance: Money::zero(),
            loyalty_points: 0,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let repo = &self.db.customers();
        let customer = insert_with_code(
            "code",
            input.code,
            || generate_code_with_suffix("CUST"),
            move |code| {
                let customer = Customer {
                    code,
                    ..template.clone()
                };
                async move { repo.insert(&customer).await }
            },
        )
        .await?;
        info!(id = %customer.id, code = %customer.code, "Customer created");
        Ok(customer)
    }

    pub async fn list(&self, query: &CustomerQuery) -> ApiResult<PagedResult<Customer>> {
        Ok(self.db.customers().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Customer> {
        Ok(self.db.customers().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: CustomerPatch) -> ApiResult<Customer> {
        let repo = self.db.customers();
        let mut customer = repo.get(id).await?;

        if let Some(phone) = patch.phone.as_deref() {
            validate_phone(phone)?;
        }
        check_email(patch.email.as_deref())?;
        if let Some(limit) = patch.credit_limit {
            validate_non_negative("creditLimit", limit)?;
        }

        merge(&mut customer.customer_type, patch.customer_type);
        merge(&mut customer.status, patch.status);
        merge_opt(&mut customer.first_name, patch.first_name);
        merge_opt(&mut customer.last_name, patch.last_name);
        merge_opt(&mut customer.business_name, patch.business_name);
        merge(&mut customer.phone, patch.phone.map(|p| p.trim().to_string()));
        merge_opt(&mut customer.email, patch.email);
        merge_opt(&mut customer.national_id, patch.national_id);
        merge_opt(&mut customer.address, patch.address);
        merge_opt(&mut customer.city, patch.city);
        merge(&mut customer.credit_limit, patch.credit_limit);
        merge(&mut customer.loyalty_points, patch.loyalty_points);
        merge_opt(&mut customer.notes, patch.notes);

        check_names(
            customer.customer_type,
            customer.first_name.as_deref(),
            customer.last_name.as_deref(),
            customer.business_name.as_deref(),
        )?;

        customer.updated_at = Utc::now();
        repo.update(&customer).await?;
        Ok(customer)
    }

    /// Customers with receivables are deactivated, others deleted.
    pub async fn remove(&self, id: &str) -> ApiResult<Removal> {
        let repo = self.db.customers();
        repo.get(id).await?;

        let removal = Removal::for_dependents(repo.dependents(id).await?);
        match removal {
            Removal::Deactivated => repo.set_status(id, CustomerStatus::Inactive).await?,
            Removal::Deleted => repo.delete(id).await?,
        }
        info!(id = %id, ?removal, "Customer removed");
        Ok(removal)
    }

    pub async fn receivables(&self, id: &str) -> ApiResult<Vec<LedgerEntry>> {
        self.db.customers().get(id).await?;
        Ok(self.db.receivables().list_for_counterparty(id).await?)
    }
}

/// Individuals need a first or last name, businesses a business name.
fn check_names(
    customer_type: CustomerType,
    first_name: Option<&str>,
    last_name: Option<&str>,
    business_name: Option<&str>,
) -> Result<(), ValidationError> {
    match customer_type {
        CustomerType::Business => validate_name("businessName", business_name.unwrap_or_default()),
        CustomerType::Individual => {
            let full = format!(
                "{} {}",
                first_name.unwrap_or_default(),
                last_name.unwrap_or_default()
            );
            validate_name("firstName", &full)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use zarmind_core::{LedgerKind, ListParams, NewLedgerEntry};

    fn new_customer(first_name: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            first_name: Some(first_name.to_string()),
            last_name: Some("Rahimi".to_string()),
            phone: phone.to_string(),
            ..NewCustomer::default()
        }
    }

    #[tokio::test]
    async fn test_create_generates_code() {
        let db = testing::database().await;
        let service = CustomerService::new(&db);

        let customer = service.create(new_customer("Sara", "09121234567")).await.unwrap();
        assert!(customer.code.starts_with("CUST-"));
        assert_eq!(customer.status, CustomerStatus::Active);
        assert_eq!(customer.customer_type, CustomerType::Individual);
    }

    #[tokio::test]
    async fn test_business_requires_business_name() {
        let db = testing::database().await;
        let service = CustomerService::new(&db);

        let err = service
            .create(NewCustomer {
                customer_type: Some(CustomerType::Business),
                phone: "02188776655".to_string(),
                ..NewCustomer::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "businessName is required");
    }

    #[tokio::test]
    async fn test_list_paginates_and_filters() {
        let db = testing::database().await;
        let service = CustomerService::new(&db);

        for i in 0..25 {
            service
                .create(new_customer(&format!("Customer{i}"), &format!("0912000{i:04}")))
                .await
                .unwrap();
        }

        let page = service
            .list(&CustomerQuery {
                list: ListParams::paged(2, 10),
                ..CustomerQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, 25);

        let page = service
            .list(&CustomerQuery {
                list: ListParams::paged(1, 10).with_search("customer2"),
                ..CustomerQuery::default()
            })
            .await
            .unwrap();
        // Customer2 and Customer20..24
        assert_eq!(page.total, 6);
    }

    #[tokio::test]
    async fn test_remove_with_receivables_deactivates() {
        let db = testing::database().await;
        let service = CustomerService::new(&db);
        let customer = service.create(new_customer("Ali", "09120000001")).await.unwrap();

        crate::services::ledger::LedgerService::new(&db, LedgerKind::Receivable)
            .create(NewLedgerEntry {
                counterparty_id: customer.id.clone(),
                amount: Money::from_major(100.0),
                ..NewLedgerEntry::default()
            })
            .await
            .unwrap();

        assert_eq!(service.remove(&customer.id).await.unwrap(), Removal::Deactivated);
        assert_eq!(
            service.get(&customer.id).await.unwrap().status,
            CustomerStatus::Inactive
        );
        assert_eq!(service.receivables(&customer.id).await.unwrap().len(), 1);

        let other = service.create(new_customer("Reza", "09120000002")).await.unwrap();
        assert_eq!(service.remove(&other.id).await.unwrap(), Removal::Deleted);
        assert!(service.get(&other.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_merges_only_given_fields() {
        let db = testing::database().await;
        let service = CustomerService::new(&db);
        let customer = service.create(new_customer("Mina", "09120000003")).await.unwrap();

        let updated = service
            .update(
                &customer.id,
                CustomerPatch {
                    city: Some("Shiraz".to_string()),
                    ..CustomerPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.city.as_deref(), Some("Shiraz"));
        assert_eq!(updated.first_name.as_deref(), Some("Mina"));
        assert_eq!(updated.phone, "09120000003");
    }
}
