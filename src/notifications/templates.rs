use askama::Template;

use super::{EmailMessage, EmailTemplate, NotificationError, OrderEmailContext};

#[derive(Template)]
#[template(path = "email/order_confirmation_subject.txt")]
struct OrderConfirmationSubject<'a> {
    ctx: &'a OrderEmailContext,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    ctx: &'a OrderEmailContext,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    ctx: &'a OrderEmailContext,
}

#[derive(Template)]
#[template(path = "email/payment_reminder_subject.txt")]
struct PaymentReminderSubject<'a> {
    ctx: &'a OrderEmailContext,
}

#[derive(Template)]
#[template(path = "email/payment_reminder.html")]
struct PaymentReminderHtml<'a> {
    ctx: &'a OrderEmailContext,
}

#[derive(Template)]
#[template(path = "email/payment_reminder.txt")]
struct PaymentReminderText<'a> {
    ctx: &'a OrderEmailContext,
}

/// A message ready for a mail transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn render(message: &EmailMessage) -> Result<RenderedEmail, NotificationError> {
    let ctx = &message.context;
    let (subject, text, html) = match message.template {
        EmailTemplate::OrderConfirmation => (
            OrderConfirmationSubject { ctx }.render()?,
            OrderConfirmationText { ctx }.render()?,
            OrderConfirmationHtml { ctx }.render()?,
        ),
        EmailTemplate::PaymentReminder => (
            PaymentReminderSubject { ctx }.render()?,
            PaymentReminderText { ctx }.render()?,
            PaymentReminderHtml { ctx }.render()?,
        ),
    };

    Ok(RenderedEmail {
        recipients: message.recipients.clone(),
        subject: subject.trim().to_string(),
        text,
        html,
    })
}
