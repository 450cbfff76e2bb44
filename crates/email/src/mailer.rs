// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Send the sweep report

use lettre::{
    Address, AsyncTransport, Message,
    address::AddressError,
    message::{Mailbox, MessageBuilder, MultiPart},
};
use sweeper_data_model::SweepSummary;
use sweeper_templates::{ReportContext, Templates};
use thiserror::Error;

use crate::MailTransport;

/// The sender used when none is configured: a mailbox named after the server
/// running the sweep
///
/// # Errors
///
/// Returns an error if the server name is not a valid email domain
pub fn default_sender(server: &str) -> Result<Mailbox, AddressError> {
    let address = Address::new("token-sweeper", server)?;
    Ok(Mailbox::new(
        Some(format!("{server} OAuth Token Cleanup Script")),
        address,
    ))
}

/// Helps sending the sweep report
#[derive(Clone)]
pub struct Mailer {
    templates: Templates,
    transport: MailTransport,
    from: Mailbox,
}

/// Errors which can happen while sending the report
#[derive(Debug, Error)]
#[error(transparent)]
pub enum Error {
    /// The transport failed to deliver the message
    Transport(#[from] crate::transport::Error),

    /// The report could not be rendered
    Templates(#[from] sweeper_templates::TemplateError),

    /// The message could not be built
    Content(#[from] lettre::error::Error),
}

impl Mailer {
    /// Constructs a new [`Mailer`]
    #[must_use]
    pub fn new(templates: Templates, transport: MailTransport, from: Mailbox) -> Self {
        Self {
            templates,
            transport,
            from,
        }
    }

    fn base_message(&self) -> MessageBuilder {
        Message::builder()
            .from(self.from.clone())
            // By passing `None`, lettre generates a random message ID
            // with a random UUID and the hostname for us
            .message_id(None)
    }

    fn prepare_report(&self, to: Mailbox, summary: &SweepSummary) -> Result<Message, Error> {
        let context = ReportContext::from(summary);

        let plain = self.templates.render_report_txt(&context)?;

        let html = self.templates.render_report_html(&context)?;

        let multipart = MultiPart::alternative_plain_html(plain, html);

        let subject = self.templates.render_report_subject(&context)?;

        let message = self
            .base_message()
            .subject(subject.trim())
            .to(to)
            .multipart(multipart)?;

        Ok(message)
    }

    /// Send the sweep report
    ///
    /// # Errors
    ///
    /// Will return `Err` if the email failed rendering or failed sending
    #[tracing::instrument(
        name = "email.report.send",
        skip_all,
        fields(
            email.to = %to,
            sweep.keyspace = %summary.keyspace,
            sweep.deleted = summary.deleted,
            sweep.abusers = summary.abusers.len(),
        ),
    )]
    pub async fn send_report(&self, to: Mailbox, summary: &SweepSummary) -> Result<(), Error> {
        let message = self.prepare_report(to, summary)?;
        self.transport.send(message).await?;
        Ok(())
    }

    /// Test the connection to the mail server
    ///
    /// # Errors
    ///
    /// Returns an error if the connection failed
    #[tracing::instrument(name = "email.test_connection", skip_all)]
    pub async fn test_connection(&self) -> Result<(), Error> {
        self.transport.test_connection().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sweeper_data_model::{AbusiveConsumer, Uuid};

    use super::*;

    fn summary() -> SweepSummary {
        SweepSummary {
            server: "sweeper01.example.com".to_owned(),
            keyspace: "kong".to_owned(),
            executed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            count_before: 250,
            count_after: 50,
            deleted: 200,
            abusers: vec![AbusiveConsumer {
                credential_id: Uuid::from_u128(1),
                consumer_id: Uuid::from_u128(2),
                username: "mobile-app".to_owned(),
                tokens: 150,
            }],
        }
    }

    #[test]
    fn test_default_sender() {
        let sender = default_sender("sweeper01.example.com").unwrap();
        assert_eq!(
            sender.name.as_deref(),
            Some("sweeper01.example.com OAuth Token Cleanup Script")
        );
        assert_eq!(
            sender.email.to_string(),
            "token-sweeper@sweeper01.example.com"
        );

        assert!(default_sender("not a hostname").is_err());
    }

    #[test]
    fn test_prepare_report() {
        let templates = Templates::load().unwrap();
        let from = default_sender("sweeper01.example.com").unwrap();
        let mailer = Mailer::new(templates, MailTransport::blackhole(), from);

        let to: Mailbox = "ops@example.com".parse().unwrap();
        let message = mailer.prepare_report(to, &summary()).unwrap();
        assert_eq!(
            message.headers().get_raw("Subject"),
            Some("sweeper01.example.com OAuth Token Cleanup executed at 2024-03-01 12:30:05 UTC")
        );

        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_send_report() {
        let templates = Templates::load().unwrap();
        let from = default_sender("sweeper01.example.com").unwrap();
        let transport = MailTransport::memory();
        let mailer = Mailer::new(templates, transport.clone(), from);

        mailer.test_connection().await.unwrap();

        let to: Mailbox = "ops@example.com".parse().unwrap();
        mailer.send_report(to, &summary()).await.unwrap();

        let sent = transport.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].envelope.to().len(), 1);
        assert_eq!(sent[0].envelope.to()[0].to_string(), "ops@example.com");
        assert_eq!(
            sent[0].envelope.from().map(ToString::to_string).as_deref(),
            Some("token-sweeper@sweeper01.example.com")
        );
    }
}
