use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{NotificationError, RenderedEmail};
use crate::config::SmtpConfig;

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &RenderedEmail) -> Result<(), NotificationError>;
}

/// Sends multipart (plain text + HTML) mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from_address: String) -> Result<Self, NotificationError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address,
        })
    }

    fn build_message(&self, email: &RenderedEmail) -> Result<Message, NotificationError> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(self.from_address.clone()))?;

        let mut builder = Message::builder().from(from).subject(email.subject.as_str());
        for recipient in &email.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|_| NotificationError::InvalidAddress(recipient.clone()))?;
            builder = builder.to(to);
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html.clone()),
                ),
        )?;
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &RenderedEmail) -> Result<(), NotificationError> {
        let message = self.build_message(email)?;
        self.mailer.send(message).await?;
        tracing::info!(to = ?email.recipients, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Writes rendered mail to the log instead of sending it. Used when no SMTP relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &RenderedEmail) -> Result<(), NotificationError> {
        tracing::info!(
            to = ?email.recipients,
            subject = %email.subject,
            body = %email.text,
            "email logged (no SMTP relay configured)"
        );
        Ok(())
    }
}
