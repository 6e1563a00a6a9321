use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::error::ApiError;
use crate::grievances::dto::GrievanceUpdate;
use crate::store::{Attachment, Grievance, GrievanceStore, NewGrievance};

const DEFAULT_STATUS: &str = "PENDING";

/// Academic matters go to faculty; everything else lands with admins.
fn assigned_role_for(category: &str) -> &'static str {
    if category.eq_ignore_ascii_case("ACADEMIC") || category.eq_ignore_ascii_case("FACULTY") {
        "FACULTY"
    } else {
        "ADMIN"
    }
}

/// A submission as it arrives from the transport layer.
#[derive(Debug, Clone)]
pub struct GrievanceSubmission {
    pub description: String,
    pub category: String,
    pub user_id: String,
    pub user_name: String,
    pub title: Option<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Clone)]
pub struct GrievanceService {
    store: Arc<dyn GrievanceStore>,
}

impl GrievanceService {
    pub fn new(store: Arc<dyn GrievanceStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, submission: GrievanceSubmission) -> Result<Grievance, ApiError> {
        // An empty upload counts as no attachment at all.
        let attachment = submission.attachment.filter(|a| !a.data.is_empty());
        let grievance = self
            .store
            .insert(NewGrievance {
                user_id: submission.user_id,
                user_name: submission.user_name,
                title: submission.title,
                description: submission.description,
                assigned_role: assigned_role_for(&submission.category).to_string(),
                category: submission.category,
                status: DEFAULT_STATUS.to_string(),
                created_at: OffsetDateTime::now_utc(),
                attachment,
            })
            .await?;
        info!(
            id = grievance.id,
            category = %grievance.category,
            assigned_role = %grievance.assigned_role,
            "grievance submitted"
        );
        Ok(grievance)
    }

    pub async fn list(&self) -> Result<Vec<Grievance>, ApiError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Grievance, ApiError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("Grievance"))
    }

    /// Applies status and resolution notes independently; a field that was
    /// not supplied keeps its previous value.
    pub async fn update(&self, id: i64, update: GrievanceUpdate) -> Result<Grievance, ApiError> {
        let mut grievance = self.get(id).await?;
        if let Some(status) = update.status {
            grievance.status = status;
        }
        if let Some(notes) = update.resolution_notes {
            grievance.resolution_notes = Some(notes);
        }
        grievance.updated_at = Some(OffsetDateTime::now_utc());
        let grievance = self.store.update(grievance).await?;
        info!(id = grievance.id, status = %grievance.status, "grievance updated");
        Ok(grievance)
    }

    pub async fn attachment(&self, id: i64) -> Result<Attachment, ApiError> {
        let grievance = self.get(id).await?;
        match (grievance.file_name, grievance.file_type, grievance.file_data) {
            (Some(file_name), Some(file_type), Some(data)) => Ok(Attachment {
                file_name,
                file_type,
                data,
            }),
            _ => Err(ApiError::NotFound("Attachment")),
        }
    }
}
