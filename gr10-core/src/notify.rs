use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;

/// Subject line shared by every notification.
pub const SUBJECT: &str = "Formulário GR10 A07 - Monitoramento de PLD";

/// Builds the fixed-template body for one recipient: the form link, the
/// 3-business-day SLA reminder, the optional observação and the
/// sender's display name.
pub fn compose_body(link_base: &str, contrato: &str, display_name: &str, note: &str) -> String {
    let link = format!("{link_base}?contrato={contrato}");
    let mut body = format!(
        "Olá,\n\n\
         Segue o link para preenchimento do formulário GR10 A07 - Monitoramento de PLD:\n\
         {link}\n\n\
         Lembre-se: o prazo para resposta é de 3 dias úteis.\n"
    );
    if !note.is_empty() {
        body.push_str(&format!("\nObservação: {note}\n"));
    }
    body.push_str(&format!(
        "\nEm caso de dúvidas, acione o time de Compliance.\n\nAtenciosamente,\n{display_name}"
    ));
    body
}

/// Splits a single recipients field on semicolons, trimming each entry
/// and dropping the empty ones.
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Transport seam so surfaces can be exercised without a live relay.
pub trait Mailer: Send + Sync {
    /// Transmits one message to exactly one recipient.
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Authenticated STARTTLS submission through the configured outbound
/// relay, one fixed sender identity for all notifications.
pub struct SmtpMailer {
    relay: String,
    port: u16,
    sender: String,
    password: String,
}

impl SmtpMailer {
    pub fn new(relay: impl Into<String>, port: u16, sender: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            relay: relay.into(),
            port,
            sender: sender.into(),
            password: password.into(),
        }
    }

    pub fn from_config(smtp: &SmtpConfig) -> Self {
        Self::new(&smtp.relay, smtp.port, &smtp.sender, &smtp.password)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let from: Mailbox = self
            .sender
            .parse()
            .with_context(|| format!("invalid sender address: {}", self.sender))?;
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("invalid recipient address: {recipient}"))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("failed to build notification message")?;

        let transport = SmtpTransport::starttls_relay(&self.relay)
            .with_context(|| format!("failed to configure relay {}", self.relay))?
            .port(self.port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();

        transport
            .send(&message)
            .with_context(|| format!("failed to send notification to {recipient}"))?;
        Ok(())
    }
}

/// Sends the form link to every address in a semicolon-separated
/// recipients field, one transmission per address. The first transport
/// failure aborts the remainder and is surfaced as the single error for
/// the whole request. Returns how many messages went out.
pub fn notify_all(
    mailer: &dyn Mailer,
    link_base: &str,
    recipients_raw: &str,
    contrato: &str,
    display_name: &str,
    note: &str,
) -> Result<usize> {
    let recipients = split_recipients(recipients_raw);
    let body = compose_body(link_base, contrato, display_name, note);
    for recipient in &recipients {
        mailer.send(recipient, SUBJECT, &body)?;
    }
    Ok(recipients.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every send instead of talking to a relay.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail_on: Option<String>,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
            if self.fail_on.as_deref() == Some(recipient) {
                anyhow::bail!("relay rejected {recipient}");
            }
            self.sent.lock().unwrap().push((
                recipient.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    #[test]
    fn test_split_recipients_trims_and_skips_empties() {
        assert_eq!(
            split_recipients(" a@x.com ; ;b@y.com;  "),
            vec!["a@x.com".to_string(), "b@y.com".to_string()]
        );
        assert!(split_recipients("").is_empty());
        assert!(split_recipients(" ; ; ").is_empty());
    }

    #[test]
    fn test_body_carries_link_sla_and_signature() {
        let body = compose_body(
            "https://riscos.example.com/formulario",
            "999",
            "Ana Ferrari",
            "",
        );
        assert!(body.contains("https://riscos.example.com/formulario?contrato=999"));
        assert!(body.contains("3 dias úteis"));
        assert!(body.ends_with("Atenciosamente,\nAna Ferrari"));
        assert!(!body.contains("Observação"));
    }

    #[test]
    fn test_body_includes_optional_note() {
        let body = compose_body("http://x", "1", "Ana", "Urgente, vence sexta.");
        assert!(body.contains("Observação: Urgente, vence sexta."));
    }

    #[test]
    fn test_notify_all_sends_one_message_per_recipient() {
        let mailer = RecordingMailer::default();
        let count = notify_all(
            &mailer,
            "http://x/formulario",
            "a@x.com; b@y.com",
            "123",
            "Ana",
            "",
        )
        .unwrap();

        assert_eq!(count, 2);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "a@x.com");
        assert_eq!(sent[1].0, "b@y.com");
        assert_eq!(sent[0].1, SUBJECT);
    }

    #[test]
    fn test_notify_all_surfaces_first_failure() {
        let mailer = RecordingMailer {
            fail_on: Some("bad@x.com".to_string()),
            ..Default::default()
        };
        let err = notify_all(
            &mailer,
            "http://x/formulario",
            "ok@x.com; bad@x.com; never@x.com",
            "123",
            "Ana",
            "",
        )
        .unwrap_err();

        assert!(err.to_string().contains("bad@x.com"));
        // the failure aborted the remainder
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }
}
