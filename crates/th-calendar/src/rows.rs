//! Typed input rows accepted by [`crate::SnapshotBuilder`].
//!
//! Rows are already parsed into domain types (dates, times, timezones,
//! weekday sets) but not yet cross-validated. Loaders (CSV, fixtures) produce
//! these; the builder turns them into an immutable snapshot.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::types::{DaySet, MarketState};

#[derive(Clone, Debug)]
pub struct MarketRow {
    pub fin_id: String,
    pub mic: Option<String>,
    pub exchange_name: String,
    pub market_name: String,
    pub security_group: Option<String>,
    pub acronym: Option<String>,
    pub asset_type: Option<String>,
    pub memo: Option<String>,
    pub timezone: Tz,
    pub weekend: DaySet,
    pub permanently_closed: Option<NaiveDate>,
    pub replaced_by: Option<String>,
    /// Explicit coverage bounds. Derived from holiday dates when absent.
    pub first_available_date: Option<NaiveDate>,
    pub last_available_date: Option<NaiveDate>,
}

impl MarketRow {
    pub fn new(fin_id: &str, timezone: Tz) -> Self {
        Self {
            fin_id: fin_id.to_string(),
            mic: None,
            exchange_name: fin_id.to_string(),
            market_name: fin_id.to_string(),
            security_group: None,
            acronym: None,
            asset_type: None,
            memo: None,
            timezone,
            weekend: DaySet::EMPTY,
            permanently_closed: None,
            replaced_by: None,
            first_available_date: None,
            last_available_date: None,
        }
    }
}

/// Secondary MIC -> FinID association.
#[derive(Clone, Debug)]
pub struct MicMappingRow {
    pub mic: String,
    pub fin_id: String,
}

#[derive(Clone, Debug)]
pub struct ScheduleRow {
    pub fin_id: String,
    pub schedule_group: String,
    pub schedule_group_memo: Option<String>,
    pub timezone: Tz,
    pub phase_type: String,
    pub phase_name: Option<String>,
    pub phase_memo: Option<String>,
    pub days: DaySet,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub offset_days: i64,
    /// Declared length in seconds; checked against start/end/offset when set.
    pub duration_secs: Option<i64>,
    pub min_start: Option<NaiveTime>,
    pub max_start: Option<NaiveTime>,
    pub min_end: Option<NaiveTime>,
    pub max_end: Option<NaiveTime>,
    pub in_force_start_date: Option<NaiveDate>,
    pub in_force_end_date: Option<NaiveDate>,
    /// `MM-DD` or a named season resolved through season definitions.
    pub season_start: Option<String>,
    pub season_end: Option<String>,
}

impl ScheduleRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fin_id: &str,
        schedule_group: &str,
        timezone: Tz,
        phase_type: &str,
        days: DaySet,
        start: NaiveTime,
        end: NaiveTime,
        offset_days: i64,
    ) -> Self {
        Self {
            fin_id: fin_id.to_string(),
            schedule_group: schedule_group.to_string(),
            schedule_group_memo: None,
            timezone,
            phase_type: phase_type.to_string(),
            phase_name: None,
            phase_memo: None,
            days,
            start,
            end,
            offset_days,
            duration_secs: None,
            min_start: None,
            max_start: None,
            min_end: None,
            max_end: None,
            in_force_start_date: None,
            in_force_end_date: None,
            season_start: None,
            season_end: None,
        }
    }

    pub fn named(mut self, phase_name: &str) -> Self {
        self.phase_name = Some(phase_name.to_string());
        self
    }

    pub fn in_force(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.in_force_start_date = start;
        self.in_force_end_date = end;
        self
    }

    pub fn season(mut self, start: &str, end: &str) -> Self {
        self.season_start = Some(start.to_string());
        self.season_end = Some(end.to_string());
        self
    }
}

#[derive(Clone, Debug)]
pub struct HolidayRow {
    pub fin_id: String,
    pub date: NaiveDate,
    pub holiday_name: String,
    /// Schedule group the market follows that day, if it trades at all.
    pub schedule_group: Option<String>,
    pub closed: bool,
    pub settlement: bool,
    pub observed: bool,
    pub memo: Option<String>,
}

impl HolidayRow {
    pub fn closed(fin_id: &str, date: NaiveDate, name: &str) -> Self {
        Self {
            fin_id: fin_id.to_string(),
            date,
            holiday_name: name.to_string(),
            schedule_group: None,
            closed: true,
            settlement: false,
            observed: false,
            memo: None,
        }
    }

    pub fn override_group(fin_id: &str, date: NaiveDate, name: &str, group: &str) -> Self {
        Self {
            schedule_group: Some(group.to_string()),
            closed: false,
            ..Self::closed(fin_id, date, name)
        }
    }
}

#[derive(Clone, Debug)]
pub struct CurrencyRow {
    pub code: String,
    pub name: String,
    pub country_code: Option<String>,
    pub central_bank: Option<String>,
    pub financial_capital: Option<String>,
    pub financial_capital_timezone: Option<Tz>,
    pub weekend: DaySet,
}

#[derive(Clone, Debug)]
pub struct CurrencyHolidayRow {
    pub currency_code: String,
    pub date: NaiveDate,
    pub holiday_name: String,
    pub settlement: bool,
    pub observed: bool,
    pub memo: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PhaseTypeRow {
    pub name: String,
    pub status: MarketState,
    pub settlement: bool,
    pub closing_price: bool,
}

#[derive(Clone, Debug)]
pub struct SeasonDefinitionRow {
    pub season: String,
    pub year: i32,
    pub date: NaiveDate,
}
