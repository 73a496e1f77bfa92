//! Mail transport for notification jobs.
//!
//! The dispatch loop only sees the [`Mailer`] trait: one job in, success or a
//! [`SendError`] out. The production implementation is [`SmtpMailer`], an
//! authenticated SMTP relay over lettre's async Tokio transport; tests swap
//! in a recording implementation.
//!
//! One SMTP message is sent per job. Recipients are never batched into a
//! single message.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::debug;

use crate::config::{EmailAccount, SmtpOptions};
use crate::notify::NotificationJob;

/// Errors that can occur while transmitting a single job.
///
/// A send failure affects that one job only: the dispatch loop logs it and
/// carries on with the remaining recipients and events.
#[derive(Debug, Error)]
pub enum SendError {
    /// The sender or recipient address failed to parse.
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// The SMTP transport rejected or failed the delivery.
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Transmits a single notification job.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, job: &NotificationJob) -> Result<(), SendError>;
}

/// SMTP mailer using the configured relay and sender account.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Builds the mailer from the relay settings and sender account.
    ///
    /// The transport connects lazily; construction only fails if the relay
    /// host is unusable.
    pub fn new(smtp: &SmtpOptions, account: &EmailAccount) -> Result<Self, SendError> {
        let credentials = Credentials::new(account.addr.clone(), account.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
            .port(smtp.port)
            .credentials(credentials)
            .build();

        Ok(SmtpMailer {
            transport,
            from: account.addr.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, job: &NotificationJob) -> Result<(), SendError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(job.recipient.as_str().parse()?)
            .subject(&job.title)
            .header(ContentType::TEXT_PLAIN)
            .body(job.body.clone())?;

        self.transport.send(message).await?;
        debug!(recipient = %job.recipient, "Notification sent");
        Ok(())
    }
}
