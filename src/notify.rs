use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use log::info;

use crate::config::MailSettings;
use crate::error::TransportError;
use crate::models::Listing;

pub const SUBJECT: &str = "📢 New Facebook Marketplace Ads Detected";

pub trait Notifier {
    /// Deliver one message covering `listings`.
    fn notify(&self, listings: &[Listing]) -> Result<(), TransportError>;
}

/// `title\nlink` for every listing, separated by blank lines.
pub fn compose_body(listings: &[Listing]) -> String {
    listings
        .iter()
        .map(|listing| format!("{}\n{}", listing.title, listing.id))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address.parse().map_err(|e: lettre::address::AddressError| TransportError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}

/// Sends notifications over SMTPS with the configured mail account.
pub struct EmailNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl EmailNotifier {
    pub fn new(mail: &MailSettings) -> Result<Self, TransportError> {
        let from = parse_mailbox(&mail.login.user)?;
        let to = parse_mailbox(&mail.recipient)?;

        let transport = SmtpTransport::relay(&mail.smtp_host)
            .map_err(|e| TransportError::Smtp(e.to_string()))?
            .port(mail.smtp_port)
            .credentials(Credentials::new(mail.login.user.clone(), mail.login.password.clone()))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            subject: SUBJECT.to_string(),
        })
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn build_message(&self, listings: &[Listing]) -> Result<Message, TransportError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(compose_body(listings))
            .map_err(|e| TransportError::Message(e.to_string()))
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, listings: &[Listing]) -> Result<(), TransportError> {
        info!("Sending email notification...");
        let message = self.build_message(listings)?;
        self.transport
            .send(&message)
            .map_err(|e| TransportError::Smtp(e.to_string()))?;
        info!("Email sent successfully.");
        Ok(())
    }
}
