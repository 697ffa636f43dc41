//! Raw CSV records, one struct per export table.
//!
//! Every field is an optional string keyed by its normalised header; typing
//! happens in `load.rs` so errors can name the row and field.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MarketRecord {
    pub fin_id: Option<String>,
    pub exchange_name: Option<String>,
    pub market_name: Option<String>,
    pub security_group: Option<String>,
    pub timezone: Option<String>,
    pub weekend_definition: Option<String>,
    pub mic: Option<String>,
    pub acronym: Option<String>,
    pub asset_type: Option<String>,
    pub memo: Option<String>,
    pub permanently_closed: Option<String>,
    pub replaced_by: Option<String>,
    pub first_available_date: Option<String>,
    pub last_available_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MicMappingRecord {
    pub mic: Option<String>,
    pub fin_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ScheduleRecord {
    pub fin_id: Option<String>,
    pub schedule_group: Option<String>,
    pub schedule_group_memo: Option<String>,
    pub timezone: Option<String>,
    pub phase_type: Option<String>,
    pub phase_name: Option<String>,
    pub phase_memo: Option<String>,
    pub days: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub offset_days: Option<String>,
    pub duration: Option<String>,
    pub min_start: Option<String>,
    pub max_start: Option<String>,
    pub min_end: Option<String>,
    pub max_end: Option<String>,
    pub in_force_start_date: Option<String>,
    pub in_force_end_date: Option<String>,
    pub season_start: Option<String>,
    pub season_end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HolidayRecord {
    pub fin_id: Option<String>,
    pub date: Option<String>,
    pub holiday_name: Option<String>,
    pub schedule: Option<String>,
    pub settlement: Option<String>,
    pub observed: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PhaseRecord {
    pub name: Option<String>,
    pub status: Option<String>,
    pub settlement: Option<String>,
    pub closing_price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SeasonRecord {
    pub season: Option<String>,
    pub year: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CurrencyRecord {
    pub currency_code: Option<String>,
    pub currency_name: Option<String>,
    pub country_code: Option<String>,
    pub central_bank: Option<String>,
    pub financial_capital: Option<String>,
    pub financial_capital_timezone: Option<String>,
    pub weekend_definition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CurrencyHolidayRecord {
    pub currency_code: Option<String>,
    pub date: Option<String>,
    pub holiday_name: Option<String>,
    pub settlement: Option<String>,
    pub observed: Option<String>,
    pub memo: Option<String>,
}
