//! Booking window value object

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entity::ValueObject;
use crate::domain::DomainResult;
use crate::shared::DomainError;

const SECONDS_PER_HOUR: i64 = 3600;

/// Half-open interval `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl ValueObject for TimeRange {}

impl TimeRange {
    /// Range for a new booking: must be well-formed and must not start in
    /// the past.
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> DomainResult<Self> {
        Self::new_at(start_time, end_time, Utc::now())
    }

    /// Same as [`TimeRange::new`] with an explicit "now".
    pub fn new_at(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let range = Self::restore(start_time, end_time)?;
        if start_time < now {
            return Err(DomainError::validation(format!(
                "start time {} is in the past",
                start_time.to_rfc3339()
            )));
        }
        Ok(range)
    }

    /// Trusted reconstruction of a stored range. Historical ranges are in
    /// the past, so only the ordering invariant is checked.
    pub fn restore(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> DomainResult<Self> {
        if end_time <= start_time {
            return Err(DomainError::validation(
                "invalid range: end time must be after start time",
            ));
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Ranges that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    pub fn has_started_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended_at(Utc::now())
    }

    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        now > self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Exact duration in hours (fractional hours are kept).
    pub fn duration_in_hours(&self) -> Decimal {
        let millis = self.duration().num_milliseconds();
        Decimal::from(millis) / Decimal::from(SECONDS_PER_HOUR * 1000)
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start_time.to_rfc3339(),
            self.end_time.to_rfc3339()
        )
    }
}
