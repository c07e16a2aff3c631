//! Order emails: what gets sent, when, and how it leaves the process.
//!
//! Request handlers only talk to a [`NotificationScheduler`]. The production
//! scheduler persists jobs in Postgres ([`PgJobQueue`]) and a background
//! [`Dispatcher`] renders and mails them once they are due.

mod dispatcher;
mod mailer;
mod memory;
mod queue;
mod templates;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order_policy::OrderLine;

pub use dispatcher::Dispatcher;
pub use mailer::{LogMailer, Mailer, SmtpMailer};
pub use memory::{InMemoryScheduler, MemoryMailer, ScheduledMessage};
pub use queue::{JOB_FAILED, JOB_PENDING, JOB_SENDING, JOB_SENT, PgJobQueue};
pub use templates::{RenderedEmail, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailTemplate {
    OrderConfirmation,
    PaymentReminder,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::OrderConfirmation => "order-confirmation",
            EmailTemplate::PaymentReminder => "payment-reminder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "order-confirmation" => Some(EmailTemplate::OrderConfirmation),
            "payment-reminder" => Some(EmailTemplate::PaymentReminder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemSummary {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// Values the order templates are rendered against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEmailContext {
    pub order: String,
    pub items: Vec<LineItemSummary>,
    pub total: Decimal,
    pub payment_deadline: DateTime<Utc>,
}

impl OrderEmailContext {
    pub fn new(
        order: String,
        lines: &[OrderLine],
        total: Decimal,
        payment_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            order,
            items: lines
                .iter()
                .map(|line| LineItemSummary {
                    name: line.name.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            total,
            payment_deadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub template: EmailTemplate,
    pub recipients: Vec<String>,
    pub context: OrderEmailContext,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Unknown notification kind: {0}")]
    UnknownKind(String),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] sea_orm::DbErr),

    #[error("Scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Hands messages to whatever executes them outside the request cycle.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Deliver as soon as possible.
    async fn schedule_now(&self, message: EmailMessage) -> Result<(), NotificationError>;

    /// Deliver no earlier than `run_at`.
    async fn schedule_at(
        &self,
        message: EmailMessage,
        run_at: DateTime<Utc>,
    ) -> Result<(), NotificationError>;
}
