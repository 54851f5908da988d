use std::sync::Arc;

/// A notification handed to the outbound mail collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of a transport.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "mail sent"
        );
        Ok(())
    }
}

/// Fire-and-forget delivery on the blocking pool. Failures are logged and dropped.
pub fn dispatch(mailer: Arc<dyn Mailer>, mail: OutgoingMail) {
    tokio::task::spawn_blocking(move || {
        if let Err(err) = mailer.send(&mail) {
            tracing::warn!(error = %err, to = %mail.to, "mail delivery failed");
        }
    });
}
