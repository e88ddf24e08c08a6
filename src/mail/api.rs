use super::model::Report;
use crate::config::model::SmtpConfig;
use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument};

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
    #[error("invalid content type: {0}")]
    ContentType(#[from] ContentTypeErr),
    #[error("could not read attachment '{path}': {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers a run's report
#[async_trait]
pub trait ReportSender {
    async fn send_report(&self, report: &Report) -> Result<(), MailError>;
}

/// Sends reports through an authenticated STARTTLS relay
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub async fn build_message(&self, report: &Report) -> Result<Message, MailError> {
        let attachment = tokio::fs::read(&report.attachment)
            .await
            .map_err(|source| MailError::Attachment {
                path: report.attachment.clone(),
                source,
            })?;

        let mut builder = Message::builder()
            .from(self.config.username.parse::<Mailbox>()?)
            .subject(report.subject());

        for recipient in self.config.recipients.iter() {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        let message = builder.multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(report.html_body()))
                .singlepart(
                    Attachment::new(report.attachment_name())
                        .body(attachment, ContentType::parse(JSON_CONTENT_TYPE)?),
                ),
        )?;

        Ok(message)
    }
}

#[async_trait]
impl ReportSender for SmtpMailer {
    #[instrument(skip(self, report), fields(events = report.events.len(), attachment = %report.attachment.display()))]
    async fn send_report(&self, report: &Report) -> Result<(), MailError> {
        let message = self.build_message(report).await?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(message).await?;

        info!("Events sent to: {}", self.config.recipients.join(", "));

        Ok(())
    }
}
