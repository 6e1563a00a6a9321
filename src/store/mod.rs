use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

pub mod memory;
pub mod postgres;

/// User record in the store. `password` holds the argon2 hash and is never
/// serialized back to clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone_number: Option<String>,
    pub role: String, // STUDENT, FACULTY, ADMIN
    pub reset_token: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub token_expiry: Option<OffsetDateTime>,
}

/// Grievance record. `file_data` is only served through the download
/// endpoint, never inlined into list responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Grievance {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub title: Option<String>,
    pub description: String,
    pub category: String,
    pub status: String,
    pub assigned_role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub resolution_notes: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    #[serde(skip_serializing, default)]
    pub file_data: Option<Vec<u8>>,
}

/// Uploaded file kept with a grievance. Name, content type and bytes travel
/// together or not at all.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub file_type: String,
    pub data: Vec<u8>,
}

/// Grievance before the store has assigned an id.
#[derive(Debug, Clone)]
pub struct NewGrievance {
    pub user_id: String,
    pub user_name: String,
    pub title: Option<String>,
    pub description: String,
    pub category: String,
    pub status: String,
    pub assigned_role: String,
    pub created_at: OffsetDateTime,
    pub attachment: Option<Attachment>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>>;
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn insert(&self, user: User) -> anyhow::Result<User>;
    async fn update(&self, user: User) -> anyhow::Result<User>;
    /// Returns false when no row matched the id.
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait GrievanceStore: Send + Sync {
    async fn insert(&self, grievance: NewGrievance) -> anyhow::Result<Grievance>;
    async fn list(&self) -> anyhow::Result<Vec<Grievance>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Grievance>>;
    async fn update(&self, grievance: Grievance) -> anyhow::Result<Grievance>;
}
