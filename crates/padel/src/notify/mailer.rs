//! Outbound mail transport.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Boundary to the mail server. Implementations raise on any delivery
/// problem; the dispatcher decides what a failure means.
pub trait MailTransport: Send + Sync {
    fn send(&self, subject: &str, body: &str, from: &str, to: &[String]) -> anyhow::Result<()>;
}

/// SMTP-backed transport. Connections are established lazily on first send.
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn connect(host: &str, port: u16, username: String, password: String) -> anyhow::Result<Self> {
        let transport = SmtpTransport::relay(host)?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self { transport })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, subject: &str, body: &str, from: &str, to: &[String]) -> anyhow::Result<()> {
        let mut builder = Message::builder().from(from.parse::<Mailbox>()?).subject(subject);
        for address in to {
            builder = builder.to(address.parse::<Mailbox>()?);
        }
        let email = builder.body(body.to_string())?;
        self.transport.send(&email)?;
        Ok(())
    }
}

/// In-memory transport for tests: records every send and can be told to
/// reject specific recipients.
#[cfg(test)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<SentMail>>,
    rejected: std::sync::Mutex<std::collections::HashSet<String>>,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            rejected: std::sync::Mutex::new(std::collections::HashSet::new()),
        }
    }

    pub fn reject_recipient(&self, address: &str) {
        self.rejected.lock().unwrap().insert(address.to_string());
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[cfg(test)]
impl MailTransport for RecordingMailer {
    fn send(&self, subject: &str, body: &str, from: &str, to: &[String]) -> anyhow::Result<()> {
        let rejected = self.rejected.lock().unwrap();
        if to.iter().any(|addr| rejected.contains(addr)) {
            anyhow::bail!("recipient rejected by server");
        }
        drop(rejected);
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            body: body.to_string(),
            from: from.to_string(),
            to: to.to_vec(),
        });
        Ok(())
    }
}
