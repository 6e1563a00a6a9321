use axum::async_trait;
use sqlx::PgPool;

use super::{Grievance, GrievanceStore, NewGrievance, User, UserStore};

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, phone_number, role, reset_token, token_expiry
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, phone_number, role, reset_token, token_expiry
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, phone_number, role, reset_token, token_expiry
            FROM users
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert(&self, user: User) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password, phone_number, role, reset_token, token_expiry)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, email, password, phone_number, role, reset_token, token_expiry
            "#,
        )
        .bind(user.id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.password)
        .bind(user.phone_number)
        .bind(user.role)
        .bind(user.reset_token)
        .bind(user.token_expiry)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: User) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, password = $4, phone_number = $5,
                role = $6, reset_token = $7, token_expiry = $8
            WHERE id = $1
            RETURNING id, name, email, password, phone_number, role, reset_token, token_expiry
            "#,
        )
        .bind(user.id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.password)
        .bind(user.phone_number)
        .bind(user.role)
        .bind(user.reset_token)
        .bind(user.token_expiry)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgGrievanceStore {
    pool: PgPool,
}

impl PgGrievanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrievanceStore for PgGrievanceStore {
    async fn insert(&self, grievance: NewGrievance) -> anyhow::Result<Grievance> {
        let (file_name, file_type, file_data) = match grievance.attachment {
            Some(a) => (Some(a.file_name), Some(a.file_type), Some(a.data)),
            None => (None, None, None),
        };
        let grievance = sqlx::query_as::<_, Grievance>(
            r#"
            INSERT INTO grievances
                (user_id, user_name, title, description, category, status,
                 assigned_role, created_at, file_name, file_type, file_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, user_name, title, description, category, status,
                      assigned_role, created_at, updated_at, resolution_notes,
                      file_name, file_type, file_data
            "#,
        )
        .bind(grievance.user_id)
        .bind(grievance.user_name)
        .bind(grievance.title)
        .bind(grievance.description)
        .bind(grievance.category)
        .bind(grievance.status)
        .bind(grievance.assigned_role)
        .bind(grievance.created_at)
        .bind(file_name)
        .bind(file_type)
        .bind(file_data)
        .fetch_one(&self.pool)
        .await?;
        Ok(grievance)
    }

    async fn list(&self) -> anyhow::Result<Vec<Grievance>> {
        let grievances = sqlx::query_as::<_, Grievance>(
            r#"
            SELECT id, user_id, user_name, title, description, category, status,
                   assigned_role, created_at, updated_at, resolution_notes,
                   file_name, file_type, file_data
            FROM grievances
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(grievances)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Grievance>> {
        let grievance = sqlx::query_as::<_, Grievance>(
            r#"
            SELECT id, user_id, user_name, title, description, category, status,
                   assigned_role, created_at, updated_at, resolution_notes,
                   file_name, file_type, file_data
            FROM grievances
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(grievance)
    }

    async fn update(&self, grievance: Grievance) -> anyhow::Result<Grievance> {
        // Only the mutable fields; created_at and the attachment are immutable
        // after creation.
        let grievance = sqlx::query_as::<_, Grievance>(
            r#"
            UPDATE grievances
            SET status = $2, resolution_notes = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, user_id, user_name, title, description, category, status,
                      assigned_role, created_at, updated_at, resolution_notes,
                      file_name, file_type, file_data
            "#,
        )
        .bind(grievance.id)
        .bind(grievance.status)
        .bind(grievance.resolution_notes)
        .bind(grievance.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(grievance)
    }
}
