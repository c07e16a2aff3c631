mod common;

use std::{sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use buylando_api::{
    db::orm_from_pool,
    entity::notification_jobs::{ActiveModel as JobActive, Entity as Jobs},
    notifications::{
        Dispatcher, EmailMessage, EmailTemplate, JOB_FAILED, JOB_PENDING, JOB_SENT,
        LineItemSummary, Mailer, MemoryMailer, NotificationError, OrderEmailContext, PgJobQueue,
        RenderedEmail,
    },
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use tokio::sync::Notify;
use uuid::Uuid;

use common::{database_url, price, setup_with_memory_scheduler, unique};

/// Records every email except those for one order, which fail with an
/// error text Postgres cannot store verbatim.
#[derive(Clone, Default)]
struct RejectingMailer {
    delivered: MemoryMailer,
    reject_order: String,
}

#[async_trait]
impl Mailer for RejectingMailer {
    async fn send(&self, email: &RenderedEmail) -> Result<(), NotificationError> {
        if email.subject.contains(&self.reject_order) {
            return Err(NotificationError::InvalidAddress(format!(
                "mailbox\0{}",
                self.reject_order
            )));
        }
        self.delivered.send(email).await
    }
}

fn message(template: EmailTemplate, order: &str) -> EmailMessage {
    EmailMessage {
        template,
        recipients: vec!["customer@example.com".into()],
        context: OrderEmailContext {
            order: order.to_string(),
            items: vec![LineItemSummary {
                name: "Laptop".into(),
                price: price("10.00"),
                quantity: 2,
            }],
            total: price("20.00"),
            payment_deadline: Utc::now() + Duration::days(5),
        },
    }
}

#[tokio::test]
async fn dispatcher_delivers_due_jobs_once() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;
    let orm = orm_from_pool(state.pool.clone());

    let wakeup = Arc::new(Notify::new());
    let queue = PgJobQueue::new(orm.clone(), wakeup.clone());
    let mailer = MemoryMailer::default();
    let dispatcher = Dispatcher::new(
        orm.clone(),
        Arc::new(mailer.clone()),
        wakeup,
        StdDuration::from_secs(60),
    );

    let order = unique("ORD");
    let now = Utc::now();
    let remind_at = now + Duration::days(6);
    let confirmation = queue
        .enqueue(message(EmailTemplate::OrderConfirmation, &order), now)
        .await?;
    let reminder = queue
        .enqueue(message(EmailTemplate::PaymentReminder, &order), remind_at)
        .await?;

    dispatcher.dispatch_due(now + Duration::seconds(1)).await?;

    let mine = |mailer: &MemoryMailer| {
        mailer
            .sent()
            .into_iter()
            .filter(|email| email.subject.contains(&order))
            .collect::<Vec<_>>()
    };
    let sent = mine(&mailer);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("confirmed"));
    assert!(sent[0].text.contains("Laptop x2 @ 10.00"));

    let job = Jobs::find_by_id(confirmation).one(&orm).await?.expect("job");
    assert_eq!(job.status, JOB_SENT);
    assert_eq!(job.attempts, 1);
    assert!(job.sent_at.is_some());
    let job = Jobs::find_by_id(reminder).one(&orm).await?.expect("job");
    assert_eq!(job.status, JOB_PENDING);

    dispatcher.dispatch_due(remind_at + Duration::seconds(1)).await?;

    let sent = mine(&mailer);
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.starts_with("Payment reminder"));
    let job = Jobs::find_by_id(reminder).one(&orm).await?.expect("job");
    assert_eq!(job.status, JOB_SENT);

    // A job that cannot be rendered is marked failed instead of retried.
    let broken = JobActive {
        id: Set(Uuid::new_v4()),
        kind: Set("carrier-pigeon".into()),
        recipients: Set(serde_json::json!(["customer@example.com"])),
        context: Set(serde_json::json!({})),
        run_at: Set(now.into()),
        status: Set(JOB_PENDING.into()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: NotSet,
        sent_at: Set(None),
    }
    .insert(&orm)
    .await?;

    dispatcher.dispatch_due(now + Duration::seconds(1)).await?;

    let stored = Jobs::find_by_id(broken.id).one(&orm).await?.expect("job");
    assert_eq!(stored.status, JOB_FAILED);
    assert_eq!(stored.attempts, 1);
    assert!(
        stored
            .last_error
            .unwrap_or_default()
            .contains("carrier-pigeon")
    );
    assert_eq!(mine(&mailer).len(), 2);

    // A failed delivery next to a successful one: the good job is mailed once
    // no matter how often the dispatcher runs afterwards.
    let good_order = unique("ORD");
    let bad_order = unique("ORD");
    let rejecting = RejectingMailer {
        reject_order: bad_order.clone(),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(
        orm.clone(),
        Arc::new(rejecting.clone()),
        Arc::new(Notify::new()),
        StdDuration::from_secs(60),
    );
    let good = queue
        .enqueue(message(EmailTemplate::OrderConfirmation, &good_order), now)
        .await?;
    let bad = queue
        .enqueue(message(EmailTemplate::OrderConfirmation, &bad_order), now)
        .await?;

    dispatcher.dispatch_due(now + Duration::seconds(1)).await?;
    dispatcher.dispatch_due(now + Duration::seconds(2)).await?;

    let delivered = rejecting
        .delivered
        .sent()
        .into_iter()
        .filter(|email| email.subject.contains(&good_order))
        .count();
    assert_eq!(delivered, 1);

    let job = Jobs::find_by_id(good).one(&orm).await?.expect("job");
    assert_eq!(job.status, JOB_SENT);
    assert_eq!(job.attempts, 1);
    let job = Jobs::find_by_id(bad).one(&orm).await?.expect("job");
    assert_eq!(job.status, JOB_FAILED);
    assert_eq!(job.attempts, 1);
    let last_error = job.last_error.unwrap_or_default();
    assert!(last_error.contains(&bad_order));
    assert!(!last_error.contains('\0'));

    Ok(())
}
