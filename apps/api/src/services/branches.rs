//! Branches (shops and warehouses).

use chrono::Utc;
use tracing::info;

use super::{check_phone, clean, insert_with_code, merge, merge_opt};
use crate::error::{ApiError, ApiResult};
use zarmind_core::codes::generate_code;
use zarmind_core::validation::validate_name;
use zarmind_core::{Branch, BranchPatch, BranchQuery, NewBranch, PagedResult};
use zarmind_db::{new_id, Database, Removal};

pub struct BranchService {
    db: Database,
}

impl BranchService {
    pub fn new(db: &Database) -> Self {
        BranchService { db: db.clone() }
    }

    pub async fn create(&self, input: NewBranch) -> ApiResult<Branch> {
        validate_name("name", &input.name)?;
        check_phone(input.phone.as_deref())?;

        let now = Utc::now();
        let template = Branch {
            id: new_id(),
            code: String::new(),
            name: input.name.trim().to_string(),
            city: clean(input.city),
            address: clean(input.address),
            phone: clean(input.phone),
            is_main_branch: input.is_main_branch,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let repo = &self.db.branches();
        let branch = insert_with_code("code", input.code, || generate_code("BR"), move |code| {
            let branch = Branch {
                code,
                ..template.clone()
            };
            async move { repo.insert(&branch).await }
        })
        .await?;
        info!(id = %branch.id, code = %branch.code, "Branch created");
        Ok(branch)
    }

    pub async fn list(&self, query: &BranchQuery) -> ApiResult<PagedResult<Branch>> {
        Ok(self.db.branches().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Branch> {
        Ok(self.db.branches().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: BranchPatch) -> ApiResult<Branch> {
        let repo = self.db.branches();
        let mut branch = repo.get(id).await?;

        if let Some(name) = patch.name.as_deref() {
            validate_name("name", name)?;
        }
        check_phone(patch.phone.as_deref())?;

        merge(&mut branch.name, patch.name.map(|n| n.trim().to_string()));
        merge_opt(&mut branch.city, patch.city);
        merge_opt(&mut branch.address, patch.address);
        merge_opt(&mut branch.phone, patch.phone);
        merge(&mut branch.is_active, patch.is_active);

        branch.updated_at = Utc::now();
        repo.update(&branch).await?;
        Ok(branch)
    }

    /// Flips the active flag.
    pub async fn toggle_active(&self, id: &str) -> ApiResult<Branch> {
        let repo = self.db.branches();
        let mut branch = repo.get(id).await?;
        branch.is_active = !branch.is_active;
        repo.set_active(id, branch.is_active).await?;
        info!(id = %id, active = branch.is_active, "Branch active flag toggled");
        Ok(branch)
    }

    /// The main branch is never removed; branches with staff, stock or
    /// purchases are deactivated.
    pub async fn remove(&self, id: &str) -> ApiResult<Removal> {
        let repo = self.db.branches();
        let branch = repo.get(id).await?;
        if branch.is_main_branch {
            return Err(ApiError::bad_request("Cannot delete the main branch"));
        }

        let removal = Removal::for_dependents(repo.dependents(id).await?);
        match removal {
            Removal::Deactivated => repo.set_active(id, false).await?,
            Removal::Deleted => repo.delete(id).await?,
        }
        info!(id = %id, ?removal, "Branch removed");
        Ok(removal)
    }
}
