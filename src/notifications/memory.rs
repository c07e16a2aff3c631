use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{EmailMessage, Mailer, NotificationError, NotificationScheduler, RenderedEmail};

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledMessage {
    pub message: EmailMessage,
    /// `None` for messages scheduled to go out immediately.
    pub run_at: Option<DateTime<Utc>>,
}

/// Scheduler that only records what it was asked to do.
#[derive(Clone, Default)]
pub struct InMemoryScheduler {
    scheduled: Arc<Mutex<Vec<ScheduledMessage>>>,
    failing: bool,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler whose every call fails, for exercising error isolation.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn scheduled(&self) -> Vec<ScheduledMessage> {
        self.scheduled
            .lock()
            .map(|scheduled| scheduled.clone())
            .unwrap_or_default()
    }

    fn record(
        &self,
        message: EmailMessage,
        run_at: Option<DateTime<Utc>>,
    ) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::Unavailable("scheduler configured to fail".into()));
        }
        let mut scheduled = self
            .scheduled
            .lock()
            .map_err(|_| NotificationError::Unavailable("scheduler buffer poisoned".into()))?;
        scheduled.push(ScheduledMessage { message, run_at });
        Ok(())
    }
}

#[async_trait]
impl NotificationScheduler for InMemoryScheduler {
    async fn schedule_now(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.record(message, None)
    }

    async fn schedule_at(
        &self,
        message: EmailMessage,
        run_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        self.record(message, Some(run_at))
    }
}

/// Mailer that keeps every email it is handed.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<RenderedEmail>>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<RenderedEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &RenderedEmail) -> Result<(), NotificationError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| NotificationError::Unavailable("mailer buffer poisoned".into()))?;
        sent.push(email.clone());
        Ok(())
    }
}
