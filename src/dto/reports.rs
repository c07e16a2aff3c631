use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, models::PopularProduct};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PopularProductsQuery {
    /// First day counted, format `YYYY-MM-DD`.
    pub date_from: Option<NaiveDate>,
    /// Last day counted (inclusive), format `YYYY-MM-DD`.
    pub date_to: Option<NaiveDate>,
    /// Keep only the first `n` entries.
    pub n: Option<u64>,
}

/// Validated report window as half-open UTC instants `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

impl PopularProductsQuery {
    pub fn window(&self) -> Result<ReportWindow, AppError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(AppError::Validation(
                    "date_from must not be after date_to".into(),
                ));
            }
        }
        if self.n == Some(0) {
            return Err(AppError::Validation("n must be at least 1".into()));
        }

        let until = match self.date_to {
            Some(date) => Some(
                date.succ_opt()
                    .ok_or_else(|| AppError::Validation("date_to is out of range".into()))?
                    .and_time(chrono::NaiveTime::MIN)
                    .and_utc(),
            ),
            None => None,
        };

        Ok(ReportWindow {
            from: self
                .date_from
                .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc()),
            until,
            limit: self.n,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PopularProductList {
    #[schema(value_type = Vec<PopularProduct>)]
    pub items: Vec<PopularProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_to_covers_the_whole_day() {
        let query = PopularProductsQuery {
            date_from: Some(date(2023, 12, 1)),
            date_to: Some(date(2023, 12, 31)),
            n: Some(3),
        };
        let window = query.window().unwrap();
        assert_eq!(window.from, Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()));
        assert_eq!(window.until, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(window.limit, Some(3));
    }

    #[test]
    fn open_window_is_unbounded() {
        let window = PopularProductsQuery::default().window().unwrap();
        assert_eq!(window.from, None);
        assert_eq!(window.until, None);
        assert_eq!(window.limit, None);
    }

    #[test]
    fn reversed_window_is_rejected() {
        let query = PopularProductsQuery {
            date_from: Some(date(2024, 1, 2)),
            date_to: Some(date(2024, 1, 1)),
            n: None,
        };
        assert!(matches!(query.window(), Err(AppError::Validation(_))));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let query = PopularProductsQuery {
            n: Some(0),
            ..Default::default()
        };
        assert!(query.window().is_err());
    }
}
