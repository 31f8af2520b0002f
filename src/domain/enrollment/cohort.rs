//! Enrollment window granted by a successful purchase.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId, ValidationError};

/// Fixed-length access window, `end = start + length_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortWindow {
    start: Timestamp,
    end: Timestamp,
}

impl CohortWindow {
    /// Opens a window of `length_days` beginning at `start`.
    pub fn starting_at(start: Timestamp, length_days: u32) -> Result<Self, ValidationError> {
        if length_days == 0 {
            return Err(ValidationError::out_of_range(
                "cohort_length_days",
                1,
                365,
                0,
            ));
        }
        Ok(Self {
            start,
            end: start.add_days(i64::from(length_days)),
        })
    }

    pub fn reconstitute(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        !at.is_before(&self.start) && at.is_before(&self.end)
    }
}

/// How a user came to be enrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentType {
    Paid,
    Free,
}

/// Enrollment fields carried on a user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub user_id: UserId,
    pub enrolled: bool,
    pub cohort: Option<CohortWindow>,
}

impl Enrollment {
    pub fn not_enrolled(user_id: UserId) -> Self {
        Self {
            user_id,
            enrolled: false,
            cohort: None,
        }
    }
}
