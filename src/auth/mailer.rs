use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub link: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), String>;
}

/// Writes outgoing mail to the log. Good enough for a self-hosted instance
/// where the operator relays links by hand.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), String> {
        tracing::info!(to = %message.to, subject = %message.subject, link = %message.link, "Outgoing mail");
        Ok(())
    }
}

/// Keeps every message in memory.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<MailMessage> {
        self.sent.lock().await.clone()
    }

    /// Most recent link mailed to `to`.
    pub async fn last_link_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.to == to)
            .map(|m| m.link.clone())
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), String> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}
