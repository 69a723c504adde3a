//! Emotion diary aggregation models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar month scoping a diary query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    /// Returns `None` unless `month` is within 1..=12 and the year is representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Half-open range `[first day of month, first day of next month)`.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default();
        let end = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        }
        .unwrap_or(NaiveDate::MAX);
        (start, end)
    }
}

/// One row of the top-emotions query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: i64,
}

/// Diary text grouped under one dominant emotion, built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionBucket {
    pub emotion: String,
    pub count: i64,
    pub source_text: String,
}

/// Keywords extracted for one bucket, with stopwords and empty tokens removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub emotion: String,
    pub count: i64,
    pub words: Vec<String>,
}

/// Dominant emotion recorded for a single diary day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyEmotion {
    pub diary_date: String,
    pub emotion: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_period_rejects_invalid_month() {
        assert!(MonthPeriod::new(2024, 0).is_none());
        assert!(MonthPeriod::new(2024, 13).is_none());
        assert!(MonthPeriod::new(2024, 12).is_some());
    }

    #[test]
    fn test_date_range_rolls_over_year() {
        let period = MonthPeriod::new(2024, 12).unwrap();
        let (start, end) = period.date_range();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
