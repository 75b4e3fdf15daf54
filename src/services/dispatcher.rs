//! Email dispatch of rendered reports

use std::fmt::Display;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MessageBuilder, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::email_config::{parse_address, EmailConfig, Encryption};
use super::templating::ReportTemplates;
use crate::types::{AggregatedUsage, ReporterError, Result};

/// MIME type of the xlsx attachment
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A fully rendered message, ready to hand to a transport
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub subject: String,
    pub attachment_name: Option<String>,
    pub recipient_count: usize,
    pub message: Message,
}

enum Body {
    Single(SinglePart),
    Alternative(MultiPart),
}

/// Composes and sends one report email per call
pub struct Dispatcher<'a> {
    config: &'a EmailConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a EmailConfig) -> Self {
        Self { config }
    }

    /// Compose and send over SMTP using the configured encryption
    pub fn dispatch(&self, usage: &AggregatedUsage, attachment: &[u8]) -> Result<()> {
        let transport = self.smtp_transport()?;
        self.dispatch_with(&transport, usage, attachment)
    }

    /// Compose and send over any lettre transport
    pub fn dispatch_with<T>(
        &self,
        transport: &T,
        usage: &AggregatedUsage,
        attachment: &[u8],
    ) -> Result<()>
    where
        T: Transport,
        T::Error: Display,
    {
        let email = self.compose(usage, attachment)?;

        tracing::info!("Sending email to {} recipients.", email.recipient_count);
        transport
            .send(&email.message)
            .map_err(|e| ReporterError::Delivery(e.to_string()))?;
        tracing::debug!(subject = %email.subject, "email sent");
        Ok(())
    }

    /// Render every template and build the MIME message
    pub fn compose(&self, usage: &AggregatedUsage, attachment: &[u8]) -> Result<OutboundEmail> {
        let config = self.config;
        let templates = ReportTemplates::new(usage);

        let subject = templates.render(&config.subject)?;
        let from_name = templates.render_opt(config.from.name.as_deref())?;
        let from_address = parse_address("from.address", &templates.render(&config.from.address)?)?;

        let mut builder = Message::builder()
            .from(Mailbox::new(from_name, from_address))
            .subject(subject.clone());
        builder = add_recipients(builder, &templates, "to", &config.to, MessageBuilder::to)?;
        builder = add_recipients(builder, &templates, "cc", &config.cc, MessageBuilder::cc)?;
        builder = add_recipients(builder, &templates, "bcc", &config.bcc, MessageBuilder::bcc)?;

        let text = templates.render_opt(config.text.as_deref())?;
        let html = templates.render_opt(config.html.as_deref())?;
        let body = match (text, html) {
            (Some(text), Some(html)) => Some(Body::Alternative(MultiPart::alternative_plain_html(
                text, html,
            ))),
            (Some(text), None) => Some(Body::Single(SinglePart::plain(text))),
            (None, Some(html)) => Some(Body::Single(SinglePart::html(html))),
            (None, None) => None,
        };

        let attachment_name = templates.render_opt(config.filename.as_deref())?;
        let attachment_part = match &attachment_name {
            Some(name) => {
                let content_type = ContentType::parse(XLSX_CONTENT_TYPE)
                    .map_err(|e| ReporterError::Delivery(format!("invalid content type: {}", e)))?;
                Some(Attachment::new(name.clone()).body(attachment.to_vec(), content_type))
            }
            None => None,
        };

        let message = match (body, attachment_part) {
            (Some(Body::Alternative(alt)), Some(att)) => {
                builder.multipart(MultiPart::mixed().multipart(alt).singlepart(att))
            }
            (Some(Body::Single(part)), Some(att)) => {
                builder.multipart(MultiPart::mixed().singlepart(part).singlepart(att))
            }
            (None, Some(att)) => builder.multipart(MultiPart::mixed().singlepart(att)),
            (Some(Body::Alternative(alt)), None) => builder.multipart(alt),
            (Some(Body::Single(part)), None) => builder.singlepart(part),
            (None, None) => builder.body(String::new()),
        }
        .map_err(|e| ReporterError::Delivery(format!("cannot build message: {}", e)))?;

        Ok(OutboundEmail {
            subject,
            attachment_name,
            recipient_count: config.recipient_count(),
            message,
        })
    }

    /// SMTP transport for the configured server; credentials are always set,
    /// so authentication happens before any message is submitted
    fn smtp_transport(&self) -> Result<SmtpTransport> {
        let server = &self.config.server;
        let credentials = Credentials::new(server.username.clone(), server.password.clone());
        let tls_error = |e: lettre::transport::smtp::Error| {
            ReporterError::Delivery(format!("cannot set up TLS for {}: {}", server.address, e))
        };

        let builder = match server.encryption {
            Encryption::Implicit => SmtpTransport::relay(&server.address).map_err(tls_error)?,
            Encryption::Explicit => {
                SmtpTransport::starttls_relay(&server.address).map_err(tls_error)?
            }
            Encryption::Disabled => SmtpTransport::builder_dangerous(&server.address),
        };

        Ok(builder
            .port(server.port())
            .credentials(credentials)
            .build())
    }
}

fn add_recipients(
    mut builder: MessageBuilder,
    templates: &ReportTemplates,
    field: &str,
    addresses: &[String],
    add: fn(MessageBuilder, Mailbox) -> MessageBuilder,
) -> Result<MessageBuilder> {
    for address in addresses {
        let rendered = templates.render(address)?;
        builder = add(builder, Mailbox::new(None, parse_address(field, &rendered)?));
    }
    Ok(builder)
}
