use anyhow::Context;
use axum::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound notification sink for password-reset codes. Delivery may fail;
/// the caller decides what that means for the reset flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = cfg.from.parse().context("parse SMTP_FROM address")?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("build smtp transport")?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("parse recipient address")?)
            .subject("Password Reset OTP - Grievance System")
            .body(format!(
                "Your OTP for password reset is: {otp}\n\nThis OTP is valid for 10 minutes."
            ))
            .context("build otp message")?;
        self.transport.send(message).await.context("smtp send")?;
        info!(%to, "OTP mail sent");
        Ok(())
    }
}

/// Used when SMTP is unconfigured. The auth service already logs every OTP,
/// so delivery degrades to a no-op instead of an error.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp(&self, to: &str, _otp: &str) -> anyhow::Result<()> {
        info!(%to, "SMTP not configured; OTP is available in the server log only");
        Ok(())
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use axum::async_trait;

    use super::Mailer;

    /// Records every (recipient, otp) pair instead of sending.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("mailer lock poisoned")
                .push((to.to_string(), otp.to_string()));
            Ok(())
        }
    }

    /// Always fails, for exercising the delivery-failure path.
    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_otp(&self, _to: &str, _otp: &str) -> anyhow::Result<()> {
            anyhow::bail!("smtp connection refused")
        }
    }
}
