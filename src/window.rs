//! Publication window selection for the periodically issued grid forecast
//!
//! The provider issues a new forecast at fixed local hours and needs a few
//! minutes after each slot before the data can be queried reliably.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// System clock converted to a fixed time zone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// The publication instant to query against
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TemporalWindow {
    pub issue_date: NaiveDate,
    pub issue_hour: u32,
}

impl TemporalWindow {
    /// Issue date as `YYYYMMDD`
    #[must_use]
    pub fn base_date(&self) -> String {
        self.issue_date.format("%Y%m%d").to_string()
    }

    /// Issue time as `HHmm`
    #[must_use]
    pub fn base_time(&self) -> String {
        format!("{:02}00", self.issue_hour)
    }
}

/// Publication hours and the latency margin after each one
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationSchedule {
    /// Ascending local hours at which a forecast is issued
    hours: Vec<u32>,
    latency_margin: Duration,
}

/// Village forecast issue hours
pub const DEFAULT_PUBLICATION_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];
pub const DEFAULT_LATENCY_MARGIN_MINUTES: i64 = 10;

impl Default for PublicationSchedule {
    fn default() -> Self {
        Self {
            hours: DEFAULT_PUBLICATION_HOURS.to_vec(),
            latency_margin: Duration::minutes(DEFAULT_LATENCY_MARGIN_MINUTES),
        }
    }
}

impl PublicationSchedule {
    /// Build a schedule; hours are sorted and deduplicated, and must be non-empty and < 24
    pub fn new(mut hours: Vec<u32>, latency_margin_minutes: i64) -> crate::Result<Self> {
        hours.sort_unstable();
        hours.dedup();
        if hours.is_empty() || hours.iter().any(|h| *h > 23) {
            return Err(crate::ForecastError::config(
                "Publication hours must be a non-empty set of hours between 0 and 23",
            ));
        }
        if latency_margin_minutes < 0 {
            return Err(crate::ForecastError::config(
                "Latency margin cannot be negative",
            ));
        }
        Ok(Self {
            hours,
            latency_margin: Duration::minutes(latency_margin_minutes),
        })
    }

    /// Select the most recent window that is safe to query at `now` (local time)
    #[must_use]
    pub fn select_window(&self, now: NaiveDateTime) -> TemporalWindow {
        let today = now.date();
        let mut index = self.hours.iter().rposition(|h| *h <= now.hour());

        if let Some(i) = index {
            let elapsed = now - today.and_hms_opt(self.hours[i], 0, 0).unwrap_or(now);
            if elapsed < self.latency_margin {
                debug!(
                    "Slot {:02}00 is within the latency margin, stepping back",
                    self.hours[i]
                );
                index = i.checked_sub(1);
            }
        }

        let window = match index {
            Some(i) => TemporalWindow {
                issue_date: today,
                issue_hour: self.hours[i],
            },
            None => TemporalWindow {
                issue_date: today.pred_opt().unwrap_or(today),
                issue_hour: self.last_hour(),
            },
        };
        debug!(
            "Selected forecast window {} {} for {}",
            window.base_date(),
            window.base_time(),
            now
        );
        window
    }

    fn last_hour(&self) -> u32 {
        self.hours.last().copied().unwrap_or(23)
    }
}
