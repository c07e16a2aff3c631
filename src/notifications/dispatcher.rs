use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{LockBehavior, LockType},
};
use tokio::{sync::Notify, task::JoinHandle};

use super::{
    EmailMessage, EmailTemplate, JOB_FAILED, JOB_PENDING, JOB_SENDING, JOB_SENT, Mailer,
    NotificationError, OrderEmailContext, render,
};
use crate::{
    db::OrmConn,
    entity::notification_jobs::{ActiveModel as JobActive, Column as JobCol, Entity as Jobs, Model as Job},
};

const BATCH_SIZE: usize = 50;

/// Background worker that delivers due `notification_jobs`.
///
/// Each job is claimed in its own short transaction with `FOR UPDATE SKIP LOCKED`
/// and committed as `sending` before delivery, so several dispatchers can share
/// one queue without sending a message twice. Delivery is attempted once; a
/// failure marks the job `failed` and keeps the error text. A job whose outcome
/// could not be recorded stays `sending` and is not retried.
pub struct Dispatcher {
    orm: OrmConn,
    mailer: Arc<dyn Mailer>,
    wakeup: Arc<Notify>,
    poll_interval: Duration,
}

impl Dispatcher {
    pub fn new(
        orm: OrmConn,
        mailer: Arc<dyn Mailer>,
        wakeup: Arc<Notify>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            orm,
            mailer,
            wakeup,
            poll_interval,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                poll_seconds = self.poll_interval.as_secs(),
                "notification dispatcher started"
            );
            loop {
                match self.dispatch_due(Utc::now()).await {
                    Ok(processed) if has_backlog(processed) => {
                        tracing::debug!(processed, "notification backlog, polling again");
                        continue;
                    }
                    Ok(0) => {}
                    Ok(processed) => tracing::debug!(processed, "notification batch processed"),
                    Err(err) => tracing::error!(error = %err, "notification dispatch failed"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = self.wakeup.notified() => {}
                }
            }
        })
    }

    /// Deliver up to one batch of pending jobs with `run_at <= now`.
    /// Returns how many jobs were claimed.
    pub async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<usize, NotificationError> {
        let mut processed = 0;
        while processed < BATCH_SIZE {
            let Some(job) = self.claim_next(now).await? else {
                break;
            };
            processed += 1;

            let outcome = self.deliver(&job).await;
            if let Err(err) = self.record_outcome(&job, outcome).await {
                tracing::error!(job_id = %job.id, error = %err, "failed to record notification outcome");
            }
        }
        Ok(processed)
    }

    /// Takes the oldest due job and commits it as `sending` before anything is mailed,
    /// so a later failure can never put an already delivered job back in the queue.
    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<Job>, NotificationError> {
        let txn = self.orm.begin().await?;

        let job = Jobs::find()
            .filter(JobCol::Status.eq(JOB_PENDING))
            .filter(JobCol::RunAt.lte(now))
            .order_by_asc(JobCol::RunAt)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;
        let Some(job) = job else {
            txn.commit().await?;
            return Ok(None);
        };

        let attempts = job.attempts + 1;
        let mut active: JobActive = job.into();
        active.status = Set(JOB_SENDING.to_string());
        active.attempts = Set(attempts);
        let job = active.update(&txn).await?;

        txn.commit().await?;
        Ok(Some(job))
    }

    async fn record_outcome(
        &self,
        job: &Job,
        outcome: Result<(), NotificationError>,
    ) -> Result<(), NotificationError> {
        let mut active: JobActive = job.clone().into();
        match outcome {
            Ok(()) => {
                tracing::info!(job_id = %job.id, kind = %job.kind, "notification sent");
                active.status = Set(JOB_SENT.to_string());
                active.sent_at = Set(Some(Utc::now().into()));
                active.last_error = Set(None);
            }
            Err(err) => {
                tracing::warn!(job_id = %job.id, kind = %job.kind, error = %err, "notification failed");
                active.status = Set(JOB_FAILED.to_string());
                active.last_error = Set(Some(storable_error(&err)));
            }
        }
        active.update(&self.orm).await?;
        Ok(())
    }

    async fn deliver(&self, job: &Job) -> Result<(), NotificationError> {
        let template = EmailTemplate::parse(&job.kind)
            .ok_or_else(|| NotificationError::UnknownKind(job.kind.clone()))?;
        let recipients: Vec<String> = serde_json::from_value(job.recipients.clone())?;
        let context: OrderEmailContext = serde_json::from_value(job.context.clone())?;

        let email = render(&EmailMessage {
            template,
            recipients,
            context,
        })?;
        self.mailer.send(&email).await
    }
}

/// A full batch means more jobs are probably due.
fn has_backlog(processed: usize) -> bool {
    processed >= BATCH_SIZE
}

/// Postgres `TEXT` rejects NUL bytes, which transport errors may carry.
fn storable_error(err: &NotificationError) -> String {
    err.to_string().replace('\0', "")
}
