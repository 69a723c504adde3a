use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

use crate::models::MonthPeriod;

/// Query string shared by the monthly diary endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct MonthlyQuery {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i64>,
    #[validate(
        required(message = "year is required"),
        range(min = 1, max = 9999, message = "year is out of range")
    )]
    pub year: Option<i32>,
    #[validate(
        required(message = "month is required"),
        range(min = 1, max = 12, message = "month must be between 1 and 12")
    )]
    pub month: Option<u32>,
}

impl MonthlyQuery {
    /// Validates the query and returns the user and month it names.
    pub fn into_parts(self) -> Result<(i64, MonthPeriod), AppError> {
        self.validate()?;

        let (Some(user_id), Some(year), Some(month)) = (self.user_id, self.year, self.month) else {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "user_id, year and month are required"
            )));
        };
        let period = MonthPeriod::new(year, month)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid year/month")))?;

        Ok((user_id, period))
    }
}
