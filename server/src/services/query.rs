use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::models::{EventType, SchoolEvent};
use crate::utils::error::AppError;

/// Listing filter. Every present field narrows the result; dates compare
/// against the calendar day of the event start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub to: Option<NaiveDate>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub event_type: Option<EventType>,
    pub search: Option<String>,
}

/// Filter forms submit untouched fields as `name=`; those mean "not given".
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

impl EventFilter {
    /// Whitespace-only searches are ignored.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn matches(&self, event: &SchoolEvent) -> bool {
        let day = event.start_at.date();

        self.from.map_or(true, |from| day >= from)
            && self.to.map_or(true, |to| day <= to)
            && self.event_type.map_or(true, |t| event.event_type == t)
            && self.search_term().map_or(true, |term| {
                event.title.contains(term)
                    || event.location.as_deref().unwrap_or("").contains(term)
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventIndex {
    pub filter: EventFilter,
    pub events: Vec<SchoolEvent>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CalendarQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub year: i32,
    pub month: u32,
    pub events_by_day: BTreeMap<NaiveDate, Vec<SchoolEvent>>,
}

impl CalendarQuery {
    /// Missing parts fall back to today's local date.
    pub fn resolve(self) -> (i32, u32) {
        let today = Local::now().date_naive();
        (
            self.year.unwrap_or_else(|| today.year()),
            self.month.unwrap_or_else(|| today.month()),
        )
    }
}

/// Half-open range `[first day of month, first day of next month)`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::validation(
            "month",
            "month must be between 1 and 12",
        ));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation("year", "year is out of range"))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::validation("year", "year is out of range"))?;

    Ok((first.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN)))
}

/// Sparse day map; each day's events ascend by start time.
pub fn group_by_day(mut events: Vec<SchoolEvent>) -> BTreeMap<NaiveDate, Vec<SchoolEvent>> {
    events.sort_by_key(|e| e.start_at);

    let mut days: BTreeMap<NaiveDate, Vec<SchoolEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.start_at.date()).or_default().push(event);
    }
    days
}
