use std::{env, str::FromStr};

use anyhow::{Context, bail};
use chrono::Duration;

use crate::order_policy::{DEFAULT_REMINDER_OFFSET_HOURS, MAX_REMINDER_OFFSET_HOURS};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub reminder_offset: Duration,
    pub notification_poll_seconds: u64,
    pub email_sender: String,
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay settings. Absent when `SMTP_HOST` is not set, in which case
/// rendered emails only go to the log.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("APP_PORT", 3000)?;
        let email_sender =
            env::var("EMAIL_SENDER").unwrap_or_else(|_| "no-reply@buylando.local".to_string());

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: env_or("SMTP_PORT", 587)?,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            }),
            Err(_) => None,
        };

        let access_minutes: i64 = env_or("ACCESS_TOKEN_TTL_MINUTES", 60)?;
        let refresh_hours: i64 = env_or("REFRESH_TOKEN_TTL_HOURS", 24)?;
        let reminder_hours: i64 =
            env_or("PAYMENT_REMINDER_OFFSET_HOURS", DEFAULT_REMINDER_OFFSET_HOURS)?;
        if !(-MAX_REMINDER_OFFSET_HOURS..=MAX_REMINDER_OFFSET_HOURS).contains(&reminder_hours) {
            bail!(
                "PAYMENT_REMINDER_OFFSET_HOURS must be within {MAX_REMINDER_OFFSET_HOURS} hours of the deadline"
            );
        }

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            access_token_ttl: positive(
                "ACCESS_TOKEN_TTL_MINUTES",
                access_minutes,
                Duration::try_minutes,
            )?,
            refresh_token_ttl: positive(
                "REFRESH_TOKEN_TTL_HOURS",
                refresh_hours,
                Duration::try_hours,
            )?,
            reminder_offset: Duration::hours(reminder_hours),
            notification_poll_seconds: env_or("NOTIFICATION_POLL_SECONDS", 5)?,
            email_sender,
            smtp,
        })
    }
}

/// Reads `key`, falling back to `default` when it is unset. A value that is set
/// but does not parse is an error.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("{key} is not valid unicode")),
    }
}

fn parse_value<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value: {value:?}"))
}

fn positive(
    key: &str,
    amount: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> anyhow::Result<Duration> {
    if amount <= 0 {
        bail!("{key} must be positive, got {amount}");
    }
    to_duration(amount).with_context(|| format!("{key} is out of range: {amount}"))
}
