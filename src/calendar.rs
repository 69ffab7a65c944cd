use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate};

/// Half-open range of days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Interval {
    pub fn single_day(day: NaiveDate) -> Self {
        Interval {
            start: day,
            end: day + Duration::days(1),
        }
    }

    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| anyhow!("bad year {}", year))?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(|| anyhow!("bad year {}", year))?;
        Ok(Interval { start, end })
    }

    /// Results are collected after the fact, so default to last year.
    pub fn previous_year(today: NaiveDate) -> Result<Self> {
        Self::year(today.year() - 1)
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take_while(|d| *d < self.end).collect()
    }
}

/// Breed ids as the calendar search form posts them, trailing space included.
fn breed_id(breed: &str) -> &'static str {
    match breed {
        "Basenji" => "402%20",
        _ => "",
    }
}

/// Request path for the specialty listings on one day. An empty
/// `event_states` means every state.
pub fn date_page_path(date: NaiveDate, breed: &str) -> String {
    let params = [
        format!("urlday={}", date.format("%Y-%m-%d")),
        "event_type=S".to_string(),
        "event_states=".to_string(),
        format!("event_month={}", date.format("%b")),
        format!("breed={}", breed_id(breed)),
        format!("event_year={}", date.format("%Y")),
    ];
    format!("/apps/event_calendar/index.cfm?{}", params.join("&"))
}
