//! Season windows and in-force checks for schedule rules.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::CalendarError;
use crate::schedule::ScheduleRule;

/// One end of a season window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeasonBoundary {
    /// Fixed month/day, same every year.
    MonthDay { month: u32, day: u32 },
    /// Named boundary ("First day of March") resolved per year.
    Named(String),
}

impl SeasonBoundary {
    /// `MM-DD` (optionally `--MM-DD`) yields a fixed boundary, anything else
    /// is treated as a season name.
    pub fn parse(text: &str) -> Result<Self, CalendarError> {
        let t = text.trim();
        if t.is_empty() {
            return Err(CalendarError::integrity("empty season boundary"));
        }
        let digits = t.trim_start_matches("--");
        if let Some((m, d)) = digits.split_once('-') {
            if let (Ok(month), Ok(day)) = (m.parse::<u32>(), d.parse::<u32>()) {
                // 2000 is a leap year, so 02-29 is accepted here.
                if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
                    return Err(CalendarError::integrity(format!(
                        "invalid season boundary '{t}'"
                    )));
                }
                return Ok(SeasonBoundary::MonthDay { month, day });
            }
        }
        Ok(SeasonBoundary::Named(t.to_string()))
    }
}

impl fmt::Display for SeasonBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonBoundary::MonthDay { month, day } => write!(f, "{month:02}-{day:02}"),
            SeasonBoundary::Named(name) => f.write_str(name),
        }
    }
}

/// Inclusive season window. Wraps the year end when `end` falls before `start`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeasonWindow {
    pub start: SeasonBoundary,
    pub end: SeasonBoundary,
}

/// Resolves season boundaries to dates and decides rule eligibility.
#[derive(Clone, Debug, Default)]
pub struct SeasonResolver {
    definitions: HashMap<(String, i32), NaiveDate>,
}

impl SeasonResolver {
    pub fn new(definitions: impl IntoIterator<Item = (String, i32, NaiveDate)>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|(name, year, date)| ((name.to_lowercase(), year), date))
                .collect(),
        }
    }

    pub fn knows(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.definitions.keys().any(|(n, _)| *n == key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn boundary_date(
        &self,
        boundary: &SeasonBoundary,
        year: i32,
    ) -> Result<NaiveDate, CalendarError> {
        match boundary {
            SeasonBoundary::MonthDay { month, day } => NaiveDate::from_ymd_opt(year, *month, *day)
                // Feb 29 outside leap years.
                .or_else(|| NaiveDate::from_ymd_opt(year, *month, day.saturating_sub(1)))
                .ok_or_else(|| {
                    CalendarError::integrity(format!("invalid season boundary {boundary}"))
                }),
            SeasonBoundary::Named(name) => self
                .definitions
                .get(&(name.to_lowercase(), year))
                .copied()
                .ok_or_else(|| {
                    CalendarError::integrity(format!(
                        "season '{name}' has no definition for {year}"
                    ))
                }),
        }
    }

    /// True when the rule has no season or `date` falls inside it.
    pub fn in_season(&self, rule: &ScheduleRule, date: NaiveDate) -> Result<bool, CalendarError> {
        let Some(window) = &rule.season else {
            return Ok(true);
        };
        let start = self.boundary_date(&window.start, date.year())?;
        let end = self.boundary_date(&window.end, date.year())?;
        if end < start {
            Ok(date <= end || date >= start)
        } else {
            Ok(start <= date && date <= end)
        }
    }

    /// In force and in season on `date`.
    pub fn applies(&self, rule: &ScheduleRule, date: NaiveDate) -> Result<bool, CalendarError> {
        if !rule.is_in_force(date) {
            return Ok(false);
        }
        self.in_season(rule, date)
    }
}
