use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use tokio::sync::Notify;
use uuid::Uuid;

use super::{EmailMessage, NotificationError, NotificationScheduler};
use crate::{db::OrmConn, entity::notification_jobs::ActiveModel as JobActive};

pub const JOB_PENDING: &str = "pending";
/// Claimed by a dispatcher; delivery is in progress or its outcome was never recorded.
pub const JOB_SENDING: &str = "sending";
pub const JOB_SENT: &str = "sent";
pub const JOB_FAILED: &str = "failed";

/// Postgres-backed scheduler: every message becomes a `notification_jobs` row
/// that the [`super::Dispatcher`] picks up once `run_at` has passed.
#[derive(Clone)]
pub struct PgJobQueue {
    orm: OrmConn,
    wakeup: Arc<Notify>,
}

impl PgJobQueue {
    pub fn new(orm: OrmConn, wakeup: Arc<Notify>) -> Self {
        Self { orm, wakeup }
    }

    pub async fn enqueue(
        &self,
        message: EmailMessage,
        run_at: DateTime<Utc>,
    ) -> Result<Uuid, NotificationError> {
        let job = JobActive {
            id: Set(Uuid::new_v4()),
            kind: Set(message.template.as_str().to_string()),
            recipients: Set(serde_json::to_value(&message.recipients)?),
            context: Set(serde_json::to_value(&message.context)?),
            run_at: Set(run_at.into()),
            status: Set(JOB_PENDING.to_string()),
            attempts: Set(0),
            last_error: Set(None),
            created_at: NotSet,
            sent_at: Set(None),
        }
        .insert(&self.orm)
        .await?;

        tracing::debug!(
            job_id = %job.id,
            kind = %job.kind,
            run_at = %run_at,
            "notification scheduled"
        );
        Ok(job.id)
    }
}

#[async_trait]
impl NotificationScheduler for PgJobQueue {
    async fn schedule_now(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.enqueue(message, Utc::now()).await?;
        self.wakeup.notify_one();
        Ok(())
    }

    async fn schedule_at(
        &self,
        message: EmailMessage,
        run_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        self.enqueue(message, run_at).await?;
        Ok(())
    }
}
