//! Outgoing e-mail. The default mailer only logs; deployments plug in a real transport.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), AppError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        tracing::info!(to = %email.to, subject = %email.subject, "email queued");
        tracing::debug!(body = %email.body, "email body");
        Ok(())
    }
}

/// Keeps every message in memory; lets tests read the reset link.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<Email>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        self.sent
            .lock()
            .map_err(|_| AppError::Internal("outbox lock poisoned".into()))?
            .push(email);
        Ok(())
    }
}

pub fn reset_link(base: &str, user_id: i64, token: &str) -> String {
    format!("{}?id={}&token={}", base, user_id, token)
}

pub fn reset_email(to: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Redefinição de Senha - REDE TRADE".to_string(),
        body: format!(
            "Olá,\n\nVocê solicitou a redefinição de senha para sua conta na REDE TRADE. \
             Por favor, clique no link a seguir para redefinir sua senha:\n\n{}\n\n\
             Se você não solicitou essa redefinição, ignore este e-mail.\n\nAtenciosamente,\nREDE TRADE",
            link
        ),
    }
}
