//! Pricing and scheduling rules applied when an order is placed.
//!
//! Everything here is pure so the workflow's arithmetic can be checked
//! without a database.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Orders must be paid within this many days of creation.
pub const PAYMENT_WINDOW_DAYS: i64 = 5;

/// Payment reminders go out this many hours after the deadline.
/// A negative value sends the reminder before the deadline instead.
pub const DEFAULT_REMINDER_OFFSET_HOURS: i64 = 24;

/// Largest reminder offset accepted from configuration, in either direction.
pub const MAX_REMINDER_OFFSET_HOURS: i64 = 24 * 365;

/// A priced line of a persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Total price of an order: the sum of `quantity x unit_price` over its lines.
pub fn compute_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(OrderLine::subtotal).sum()
}

#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    pub payment_window: Duration,
    pub reminder_offset: Duration,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_REMINDER_OFFSET_HOURS))
    }
}

impl OrderPolicy {
    pub fn new(reminder_offset: Duration) -> Self {
        Self {
            payment_window: Duration::days(PAYMENT_WINDOW_DAYS),
            reminder_offset,
        }
    }

    /// Creation timestamp for a new order, truncated to the precision Postgres stores.
    pub fn creation_time(now: DateTime<Utc>) -> DateTime<Utc> {
        now.trunc_subsecs(6)
    }

    pub fn payment_deadline(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + self.payment_window
    }

    pub fn reminder_time(&self, payment_deadline: DateTime<Utc>) -> DateTime<Utc> {
        payment_deadline + self.reminder_offset
    }
}

/// Human readable order reference used in emails, e.g. `ORD-20240131-1a2b3c4d`.
pub fn order_reference(order_id: Uuid, created_at: DateTime<Utc>) -> String {
    let date = created_at.format("%Y%m%d");
    let simple = order_id.simple().to_string();
    let short = simple.get(..8).unwrap_or(&simple);
    format!("ORD-{}-{}", date, short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn line(price: &str, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            name: "item".into(),
            unit_price: Decimal::from_str(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn total_multiplies_quantity() {
        let lines = vec![line("10.00", 2), line("5.00", 1)];
        assert_eq!(compute_total(&lines), Decimal::from_str("25.00").unwrap());
    }

    #[test]
    fn total_of_no_lines_is_zero() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn total_keeps_cents_exact() {
        let lines = vec![line("0.10", 3), line("9999.99", 1)];
        assert_eq!(compute_total(&lines), Decimal::from_str("10000.29").unwrap());
    }

    #[test]
    fn deadline_is_five_days_after_creation() {
        let policy = OrderPolicy::default();
        let created = Utc.with_ymd_and_hms(2024, 3, 28, 23, 30, 0).unwrap();
        let deadline = policy.payment_deadline(created);
        assert_eq!(deadline - created, Duration::days(5));
        assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 4, 2, 23, 30, 0).unwrap());
    }

    #[test]
    fn reminder_defaults_to_one_day_after_deadline() {
        let policy = OrderPolicy::default();
        let deadline = Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap();
        assert_eq!(
            policy.reminder_time(deadline),
            Utc.with_ymd_and_hms(2024, 4, 3, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn reminder_offset_can_precede_deadline() {
        let policy = OrderPolicy::new(Duration::hours(-24));
        let deadline = Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap();
        assert_eq!(
            policy.reminder_time(deadline),
            Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn creation_time_drops_nanoseconds() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let created = OrderPolicy::creation_time(now);
        assert_eq!(created.timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn order_reference_uses_date_and_id_prefix() {
        let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap();
        assert_eq!(order_reference(id, created), "ORD-20240131-1a2b3c4d");
    }
}
