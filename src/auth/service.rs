use std::sync::Arc;

use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::RegisterRequest;
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::store::{User, UserStore};

const OTP_TTL: Duration = Duration::minutes(10);
const DEFAULT_ROLE: &str = "STUDENT";

/// Registration, login and the OTP password-reset state machine. Also owns
/// the admin user-management operations.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { users, mailer }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User, ApiError> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "registration with existing email");
            return Err(ApiError::DuplicateEmail);
        }

        let id = match req.id {
            Some(id) if !id.is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };
        let role = match req.role {
            Some(role) if !role.is_empty() => role,
            _ => DEFAULT_ROLE.to_string(),
        };
        let user = self
            .users
            .insert(User {
                id,
                name: req.name,
                email: req.email,
                password: hash_password(&req.password)?,
                phone_number: req.phone_number,
                role,
                reset_token: None,
                token_expiry: None,
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str, role: &str) -> Result<User, ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(password, &user.password)? {
            warn!(%email, "login with invalid password");
            return Err(ApiError::InvalidCredentials);
        }

        // The password is correct, but the claimed role still has to match.
        if !user.role.eq_ignore_ascii_case(role) {
            warn!(%email, claimed = %role, actual = %user.role, "login role mismatch");
            return Err(ApiError::RoleMismatch(user.role));
        }

        info!(user_id = %user.id, %email, "user logged in");
        Ok(user)
    }

    /// Issues a 6-digit OTP valid for 10 minutes. The token is persisted
    /// before delivery is attempted and stays valid even when the mail
    /// bounces; the log line below is the manual fallback channel.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let otp = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        user.reset_token = Some(otp.clone());
        user.token_expiry = Some(OffsetDateTime::now_utc() + OTP_TTL);
        self.users.update(user).await?;

        info!(%email, %otp, "password reset OTP issued");

        self.mailer
            .send_otp(email, &otp)
            .await
            .map_err(ApiError::Delivery)?;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::InvalidOtp)?;

        let valid = match (&user.reset_token, user.token_expiry) {
            (Some(token), Some(expiry)) => token == otp && expiry > OffsetDateTime::now_utc(),
            _ => false,
        };
        if !valid {
            warn!(%email, "reset attempt with invalid or expired OTP");
            return Err(ApiError::InvalidOtp);
        }

        // Token is single-use: consuming it clears both fields together with
        // the password update.
        user.password = hash_password(new_password)?;
        user.reset_token = None;
        user.token_expiry = None;
        self.users.update(user).await?;
        info!(%email, "password reset completed");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.list().await?)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        if !self.users.delete(id).await? {
            return Err(ApiError::NotFound("User"));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn update_role(&self, id: &str, role: String) -> Result<(), ApiError> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("User"))?;
        let previous = std::mem::replace(&mut user.role, role);
        let user = self.users.update(user).await?;
        info!(user_id = %id, from = %previous, to = %user.role, "role updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::test_support::{FailingMailer, RecordingMailer};
    use crate::store::memory::MemoryUserStore;

    fn service() -> (AuthService, Arc<MemoryUserStore>, Arc<RecordingMailer>) {
        let users = Arc::new(MemoryUserStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        (
            AuthService::new(users.clone(), mailer.clone()),
            users,
            mailer,
        )
    }

    fn request(email: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            id: None,
            name: Some("Pat".into()),
            email: email.into(),
            password: "hunter22!".into(),
            phone_number: None,
            role: role.map(String::from),
        }
    }

    #[tokio::test]
    async fn register_generates_id_and_defaults_role() {
        let (svc, _, _) = service();
        let user = svc.register(request("s@campus.edu", None)).await.unwrap();
        assert!(!user.id.is_empty());
        assert_eq!(user.role, "STUDENT");
        // Stored credential is the hash, never the plaintext.
        assert_ne!(user.password, "hunter22!");
        assert!(verify_password("hunter22!", &user.password).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (svc, users, _) = service();
        svc.register(request("s@campus.edu", None)).await.unwrap();
        let err = svc.register(request("s@campus.edu", None)).await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_matches_role_case_insensitively() {
        let (svc, _, _) = service();
        svc.register(request("a@campus.edu", Some("ADMIN"))).await.unwrap();
        let user = svc.login("a@campus.edu", "hunter22!", "admin").await.unwrap();
        assert_eq!(user.role, "ADMIN");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let (svc, _, _) = service();
        svc.register(request("a@campus.edu", None)).await.unwrap();
        let err = svc.login("a@campus.edu", "wrong", "STUDENT").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_reports_role_mismatch_with_actual_role() {
        let (svc, _, _) = service();
        svc.register(request("a@campus.edu", Some("ADMIN"))).await.unwrap();
        let err = svc.login("a@campus.edu", "hunter22!", "STUDENT").await.unwrap_err();
        match err {
            ApiError::RoleMismatch(role) => assert_eq!(role, "ADMIN"),
            other => panic!("expected role mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let (svc, _, _) = service();
        let err = svc.login("nobody@campus.edu", "pw", "STUDENT").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn forgot_password_issues_six_digit_otp_with_ten_minute_expiry() {
        let (svc, users, mailer) = service();
        svc.register(request("s@campus.edu", None)).await.unwrap();
        svc.forgot_password("s@campus.edu").await.unwrap();

        let user = users.find_by_email("s@campus.edu").await.unwrap().unwrap();
        let token = user.reset_token.expect("token set");
        assert_eq!(token.len(), 6);
        let code: u32 = token.parse().expect("numeric otp");
        assert!((100_000..=999_999).contains(&code));

        let expiry = user.token_expiry.expect("expiry set");
        let now = OffsetDateTime::now_utc();
        assert!(expiry > now + Duration::minutes(9));
        assert!(expiry <= now + Duration::minutes(10));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("s@campus.edu".to_string(), token));
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_not_found() {
        let (svc, _, mailer) = service();
        let err = svc.forgot_password("nobody@campus.edu").await.unwrap_err();
        assert!(matches!(err, ApiError::UserNotFound));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_password_consumes_the_token() {
        let (svc, users, mailer) = service();
        svc.register(request("s@campus.edu", None)).await.unwrap();
        svc.forgot_password("s@campus.edu").await.unwrap();
        let otp = mailer.sent.lock().unwrap()[0].1.clone();

        svc.reset_password("s@campus.edu", &otp, "n3w-secret").await.unwrap();

        let user = users.find_by_email("s@campus.edu").await.unwrap().unwrap();
        assert!(user.reset_token.is_none());
        assert!(user.token_expiry.is_none());
        svc.login("s@campus.edu", "n3w-secret", "STUDENT").await.unwrap();

        // Single-use: replaying the same code fails.
        let err = svc
            .reset_password("s@campus.edu", &otp, "again")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOtp));
    }

    #[tokio::test]
    async fn reset_password_rejects_expired_token() {
        let (svc, users, mailer) = service();
        svc.register(request("s@campus.edu", None)).await.unwrap();
        svc.forgot_password("s@campus.edu").await.unwrap();
        let otp = mailer.sent.lock().unwrap()[0].1.clone();

        let mut user = users.find_by_email("s@campus.edu").await.unwrap().unwrap();
        user.token_expiry = Some(OffsetDateTime::now_utc() - Duration::minutes(1));
        users.update(user).await.unwrap();

        let err = svc
            .reset_password("s@campus.edu", &otp, "n3w-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOtp));
    }

    #[tokio::test]
    async fn reset_password_rejects_wrong_code() {
        let (svc, _, _) = service();
        svc.register(request("s@campus.edu", None)).await.unwrap();
        svc.forgot_password("s@campus.edu").await.unwrap();
        let err = svc
            .reset_password("s@campus.edu", "000000", "n3w-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOtp));
    }

    #[tokio::test]
    async fn delivery_failure_keeps_the_token_persisted() {
        let users = Arc::new(MemoryUserStore::default());
        let svc = AuthService::new(users.clone(), Arc::new(FailingMailer));
        svc.register(request("s@campus.edu", None)).await.unwrap();

        let err = svc.forgot_password("s@campus.edu").await.unwrap_err();
        assert!(matches!(err, ApiError::Delivery(_)));

        // State mutated before the send; the token survives the failure.
        let user = users.find_by_email("s@campus.edu").await.unwrap().unwrap();
        let otp = user.reset_token.expect("token kept");
        svc.reset_password("s@campus.edu", &otp, "n3w-secret").await.unwrap();
    }

    #[tokio::test]
    async fn delete_and_role_update_report_unknown_ids() {
        let (svc, _, _) = service();
        let err = svc.delete_user("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User")));
        let err = svc.update_role("missing", "ADMIN".into()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User")));
    }

    #[tokio::test]
    async fn role_update_surfaces_store_failures() {
        use axum::async_trait;

        struct BrokenUpdates(MemoryUserStore);

        #[async_trait]
        impl UserStore for BrokenUpdates {
            async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
                self.0.find_by_email(email).await
            }
            async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
                self.0.find_by_id(id).await
            }
            async fn list(&self) -> anyhow::Result<Vec<User>> {
                self.0.list().await
            }
            async fn insert(&self, user: User) -> anyhow::Result<User> {
                self.0.insert(user).await
            }
            async fn update(&self, _user: User) -> anyhow::Result<User> {
                anyhow::bail!("connection reset")
            }
            async fn delete(&self, id: &str) -> anyhow::Result<bool> {
                self.0.delete(id).await
            }
        }

        let store = Arc::new(BrokenUpdates(MemoryUserStore::default()));
        let svc = AuthService::new(store, Arc::new(RecordingMailer::default()));
        let user = svc.register(request("s@campus.edu", None)).await.unwrap();
        let err = svc.update_role(&user.id, "ADMIN".into()).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));
    }

    #[tokio::test]
    async fn role_update_changes_the_stored_role() {
        let (svc, users, _) = service();
        let user = svc.register(request("s@campus.edu", None)).await.unwrap();
        svc.update_role(&user.id, "FACULTY".into()).await.unwrap();
        let stored = users.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, "FACULTY");
    }
}
