use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use anyhow::bail;
use axum::async_trait;

use super::{Grievance, GrievanceStore, NewGrievance, User, UserStore};

/// In-memory user store backing `AppState::fake` and the service tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.lock().expect("user store lock poisoned").clone())
    }

    async fn insert(&self, user: User) -> anyhow::Result<User> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        if users.iter().any(|u| u.email == user.email) {
            bail!("duplicate key value violates unique constraint: users.email");
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> anyhow::Result<User> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => bail!("no user with id {}", user.id),
        }
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}

/// In-memory grievance store with a monotonic id sequence.
#[derive(Default)]
pub struct MemoryGrievanceStore {
    grievances: Mutex<Vec<Grievance>>,
    next_id: AtomicI64,
}

#[async_trait]
impl GrievanceStore for MemoryGrievanceStore {
    async fn insert(&self, grievance: NewGrievance) -> anyhow::Result<Grievance> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (file_name, file_type, file_data) = match grievance.attachment {
            Some(a) => (Some(a.file_name), Some(a.file_type), Some(a.data)),
            None => (None, None, None),
        };
        let grievance = Grievance {
            id,
            user_id: grievance.user_id,
            user_name: grievance.user_name,
            title: grievance.title,
            description: grievance.description,
            category: grievance.category,
            status: grievance.status,
            assigned_role: grievance.assigned_role,
            created_at: grievance.created_at,
            updated_at: None,
            resolution_notes: None,
            file_name,
            file_type,
            file_data,
        };
        self.grievances
            .lock()
            .expect("grievance store lock poisoned")
            .push(grievance.clone());
        Ok(grievance)
    }

    async fn list(&self) -> anyhow::Result<Vec<Grievance>> {
        Ok(self
            .grievances
            .lock()
            .expect("grievance store lock poisoned")
            .clone())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Grievance>> {
        let grievances = self.grievances.lock().expect("grievance store lock poisoned");
        Ok(grievances.iter().find(|g| g.id == id).cloned())
    }

    async fn update(&self, grievance: Grievance) -> anyhow::Result<Grievance> {
        let mut grievances = self.grievances.lock().expect("grievance store lock poisoned");
        match grievances.iter_mut().find(|g| g.id == grievance.id) {
            Some(slot) => {
                slot.status = grievance.status.clone();
                slot.resolution_notes = grievance.resolution_notes.clone();
                slot.updated_at = grievance.updated_at;
                Ok(slot.clone())
            }
            None => bail!("no grievance with id {}", grievance.id),
        }
    }
}
