//! Goldsmith workshops.

use chrono::Utc;
use tracing::info;

use super::{
    check_email, check_phone, check_rating, clean, insert_with_code, merge, merge_opt,
};
use crate::error::{ApiError, ApiResult};
use zarmind_core::codes::generate_code_with_suffix;
use zarmind_core::validation::{validate_name, validate_rating};
use zarmind_core::{
    NewWorkshop, PagedResult, RatingUpdate, Workshop, WorkshopPatch, WorkshopQuery, WorkshopStatus,
};
use zarmind_db::{append_note, new_id, Database, Removal};

pub struct WorkshopService {
    db: Database,
}

impl WorkshopService {
    pub fn new(db: &Database) -> Self {
        WorkshopService { db: db.clone() }
    }

    pub async fn create(&self, input: NewWorkshop) -> ApiResult<Workshop> {
        validate_name("name", &input.name)?;
        check_phone(input.phone.as_deref())?;
        check_email(input.email.as_deref())?;
        check_rating(input.rating)?;

        let repo = &self.db.workshops();
        let supplied = clean(input.code);
        if let Some(code) = supplied.as_deref() {
            if repo.code_exists(code).await? {
                return Err(ApiError::bad_request(format!(
                    "Workshop with code {code} already exists"
                )));
            }
        }

        let now = Utc::now();
        let template = Workshop {
            id: new_id(),
            code: String::new(),
            name: input.name.trim().to_string(),
            contact_person: clean(input.contact_person),
            phone: clean(input.phone),
            email: clean(input.email),
            city: clean(input.city),
            status: input.status.unwrap_or_default(),
            rating: input.rating,
            payment_terms: clean(input.payment_terms),
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let workshop = insert_with_code(
            "code",
            supplied,
            || generate_code_with_suffix("WS"),
            move |code| {
                let workshop = Workshop {
                    code,
                    ..template.clone()
                };
                async move { repo.insert(&workshop).await }
            },
        )
        .await?;
        info!(id = %workshop.id, code = %workshop.code, "Workshop created");
        Ok(workshop)
    }

    pub async fn list(&self, query: &WorkshopQuery) -> ApiResult<PagedResult<Workshop>> {
        Ok(self.db.workshops().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Workshop> {
        Ok(self.db.workshops().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: WorkshopPatch) -> ApiResult<Workshop> {
        let repo = self.db.workshops();
        let mut workshop = repo.get(id).await?;

        if let Some(name) = patch.name.as_deref() {
            validate_name("name", name)?;
        }
        check_phone(patch.phone.as_deref())?;
        check_email(patch.email.as_deref())?;
        check_rating(patch.rating)?;

        merge(&mut workshop.name, patch.name.map(|n| n.trim().to_string()));
        merge_opt(&mut workshop.contact_person, patch.contact_person);
        merge_opt(&mut workshop.phone, patch.phone);
        merge_opt(&mut workshop.email, patch.email);
        merge_opt(&mut workshop.city, patch.city);
        merge(&mut workshop.status, patch.status);
        merge_opt(&mut workshop.rating, patch.rating);
        merge_opt(&mut workshop.payment_terms, patch.payment_terms);
        merge_opt(&mut workshop.notes, patch.notes);

        workshop.updated_at = Utc::now();
        repo.update(&workshop).await?;
        Ok(workshop)
    }

    pub async fn rate(&self, id: &str, input: RatingUpdate) -> ApiResult<Workshop> {
        validate_rating(input.rating)?;

        let repo = self.db.workshops();
        let mut workshop = repo.get(id).await?;
        workshop.rating = Some(input.rating);
        if let Some(note) = clean(input.notes) {
            workshop.notes = Some(append_note(workshop.notes.as_deref(), &note));
        }
        workshop.updated_at = Utc::now();
        repo.update(&workshop).await?;
        Ok(workshop)
    }

    /// Workshops still holding products are deactivated, others deleted.
    pub async fn remove(&self, id: &str) -> ApiResult<Removal> {
        let repo = self.db.workshops();
        repo.get(id).await?;

        let removal = Removal::for_dependents(repo.dependents(id).await?);
        match removal {
            Removal::Deactivated => repo.set_status(id, WorkshopStatus::Inactive).await?,
            Removal::Deleted => repo.delete(id).await?,
        }
        info!(id = %id, ?removal, "Workshop removed");
        Ok(removal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;

    #[tokio::test]
    async fn test_duplicate_code_is_bad_request() {
        let db = testing::database().await;
        let service = WorkshopService::new(&db);
        let input = NewWorkshop {
            code: Some("WS-001".to_string()),
            name: "Zagros Smithy".to_string(),
            ..NewWorkshop::default()
        };

        service.create(input.clone()).await.unwrap();
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(err.message, "Workshop with code WS-001 already exists");
    }

    #[tokio::test]
    async fn test_remove_without_products_deletes() {
        let db = testing::database().await;
        let service = WorkshopService::new(&db);
        let workshop = service
            .create(NewWorkshop {
                name: "Alborz Repairs".to_string(),
                ..NewWorkshop::default()
            })
            .await
            .unwrap();
        assert!(workshop.code.starts_with("WS-"));

        assert_eq!(service.remove(&workshop.id).await.unwrap(), Removal::Deleted);
        assert_eq!(
            service.get(&workshop.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
