use std::path::Path;

use th_calendar::{
    CurrencyHolidayRow, CurrencyRow, HolidayRow, MarketRow, MarketState, MicMappingRow,
    PhaseTypeRow, ScheduleRow, SeasonDefinitionRow, Snapshot, SnapshotBuilder,
};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::records::{
    CurrencyHolidayRecord, CurrencyRecord, HolidayRecord, MarketRecord, MicMappingRecord,
    PhaseRecord, ScheduleRecord, SeasonRecord,
};
use crate::table::{present, read_table, Cell};

pub const MARKETS_FILE: &str = "markets.csv";
pub const HOLIDAYS_FILE: &str = "holidays.csv";
pub const SCHEDULES_FILE: &str = "schedules.csv";
pub const MIC_MAPPING_FILE: &str = "mic_mapping.csv";
pub const PHASES_FILE: &str = "phases.csv";
pub const SEASONS_FILE: &str = "season_definitions.csv";
pub const CURRENCIES_FILE: &str = "currencies.csv";
pub const CURRENCY_HOLIDAYS_FILE: &str = "currency_holidays.csv";

/// Loads an export directory and builds a validated snapshot.
pub fn load_snapshot(dir: &Path) -> Result<Snapshot, StoreError> {
    let snapshot = read_export(dir)?.build()?;
    let summary = snapshot.summary();
    info!(
        dir = %dir.display(),
        markets = summary.markets,
        schedules = summary.schedules,
        holidays = summary.holidays,
        currencies = summary.currencies,
        "calendar export loaded"
    );
    Ok(snapshot)
}

/// Reads and types every table without cross-validating them.
pub fn read_export(dir: &Path) -> Result<SnapshotBuilder, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::Io(format!(
            "data dir is not a directory: {}",
            dir.display()
        )));
    }

    let markets = required(dir, MARKETS_FILE, market_row)?;
    let holidays = required(dir, HOLIDAYS_FILE, holiday_row)?;
    let schedules = optional(dir, SCHEDULES_FILE, schedule_row)?;
    let mics = optional(dir, MIC_MAPPING_FILE, mic_row)?;
    let phases = optional(dir, PHASES_FILE, phase_row)?;
    let seasons = optional(dir, SEASONS_FILE, season_row)?;
    let currencies = optional(dir, CURRENCIES_FILE, currency_row)?;
    let currency_holidays = optional(dir, CURRENCY_HOLIDAYS_FILE, currency_holiday_row)?;

    Ok(Snapshot::builder()
        .markets(markets)
        .holidays(holidays)
        .schedules(schedules)
        .mic_mappings(mics)
        .phase_types(phases)
        .season_definitions(seasons)
        .currencies(currencies)
        .currency_holidays(currency_holidays))
}

fn required<R, T>(
    dir: &Path,
    file: &'static str,
    convert: fn(Cell, R) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError>
where
    R: serde::de::DeserializeOwned,
{
    let path = dir.join(file);
    if !path.is_file() {
        return Err(StoreError::MissingFile(path));
    }
    convert_all(&path, file, convert)
}

fn optional<R, T>(
    dir: &Path,
    file: &'static str,
    convert: fn(Cell, R) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError>
where
    R: serde::de::DeserializeOwned,
{
    let path = dir.join(file);
    if !path.is_file() {
        debug!(file, "optional table absent");
        return Ok(Vec::new());
    }
    convert_all(&path, file, convert)
}

fn convert_all<R, T>(
    path: &Path,
    file: &'static str,
    convert: fn(Cell, R) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError>
where
    R: serde::de::DeserializeOwned,
{
    let rows = read_table::<R>(path, file)?
        .into_iter()
        .map(|(line, rec)| convert(Cell::new(file, line), rec))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(file, rows = rows.len(), "table read");
    Ok(rows)
}

fn market_row(c: Cell, r: MarketRecord) -> Result<MarketRow, StoreError> {
    let fin_id = c.text("fin_id", r.fin_id)?;
    let timezone = c.required_tz("timezone", r.timezone)?;
    let mut row = MarketRow::new(&fin_id, timezone);
    if let Some(name) = present(r.exchange_name) {
        row.exchange_name = name;
    }
    if let Some(name) = present(r.market_name) {
        row.market_name = name;
    }
    row.mic = present(r.mic);
    row.security_group = present(r.security_group);
    row.acronym = present(r.acronym);
    row.asset_type = present(r.asset_type);
    row.memo = present(r.memo);
    row.weekend = c.days("weekend_definition", r.weekend_definition)?;
    row.permanently_closed = c.date("permanently_closed", r.permanently_closed)?;
    row.replaced_by = present(r.replaced_by);
    row.first_available_date = c.date("first_available_date", r.first_available_date)?;
    row.last_available_date = c.date("last_available_date", r.last_available_date)?;
    Ok(row)
}

fn mic_row(c: Cell, r: MicMappingRecord) -> Result<MicMappingRow, StoreError> {
    Ok(MicMappingRow {
        mic: c.text("mic", r.mic)?,
        fin_id: c.text("fin_id", r.fin_id)?,
    })
}

fn schedule_row(c: Cell, r: ScheduleRecord) -> Result<ScheduleRow, StoreError> {
    let mut row = ScheduleRow::new(
        &c.text("fin_id", r.fin_id)?,
        &c.text("schedule_group", r.schedule_group)?,
        c.required_tz("timezone", r.timezone)?,
        &c.text("phase_type", r.phase_type)?,
        c.days("days", r.days)?,
        c.required_time("start", r.start)?,
        c.required_time("end", r.end)?,
        c.int("offset_days", r.offset_days)?.unwrap_or(0),
    );
    row.schedule_group_memo = present(r.schedule_group_memo);
    row.phase_name = present(r.phase_name);
    row.phase_memo = present(r.phase_memo);
    row.duration_secs = c.duration("duration", r.duration)?;
    row.min_start = c.time("min_start", r.min_start)?;
    row.max_start = c.time("max_start", r.max_start)?;
    row.min_end = c.time("min_end", r.min_end)?;
    row.max_end = c.time("max_end", r.max_end)?;
    row.in_force_start_date = c.date("in_force_start_date", r.in_force_start_date)?;
    row.in_force_end_date = c.date("in_force_end_date", r.in_force_end_date)?;
    row.season_start = present(r.season_start);
    row.season_end = present(r.season_end);
    Ok(row)
}

fn holiday_row(c: Cell, r: HolidayRecord) -> Result<HolidayRow, StoreError> {
    let fin_id = c.text("fin_id", r.fin_id)?;
    let date = c.required_date("date", r.date)?;
    let name = c.text("holiday_name", r.holiday_name)?;
    let mut row = match present(r.schedule) {
        Some(group) if !group.eq_ignore_ascii_case("closed") => {
            HolidayRow::override_group(&fin_id, date, &name, &group)
        }
        _ => HolidayRow::closed(&fin_id, date, &name),
    };
    row.settlement = c.flag("settlement", r.settlement)?;
    row.observed = c.observed("observed", r.observed)?;
    row.memo = present(r.memo);
    Ok(row)
}

fn phase_row(c: Cell, r: PhaseRecord) -> Result<PhaseTypeRow, StoreError> {
    let name = c.text("name", r.name)?;
    let raw = c.text("status", r.status)?;
    let status = if raw.eq_ignore_ascii_case("open") {
        MarketState::Open
    } else if raw.eq_ignore_ascii_case("closed") {
        MarketState::Closed
    } else {
        return Err(StoreError::ParseField {
            file: c.file.to_string(),
            row: c.row,
            field: "status",
            raw,
        });
    };
    Ok(PhaseTypeRow {
        name,
        status,
        settlement: c.flag("settlement", r.settlement)?,
        closing_price: c.flag("closing_price", r.closing_price)?,
    })
}

fn season_row(c: Cell, r: SeasonRecord) -> Result<SeasonDefinitionRow, StoreError> {
    let season = c.text("season", r.season)?;
    let raw_year = c.text("year", r.year)?;
    let year = raw_year.parse::<i32>().map_err(|_| StoreError::ParseField {
        file: c.file.to_string(),
        row: c.row,
        field: "year",
        raw: raw_year.clone(),
    })?;
    Ok(SeasonDefinitionRow {
        season,
        year,
        date: c.required_date("date", r.date)?,
    })
}

fn currency_row(c: Cell, r: CurrencyRecord) -> Result<CurrencyRow, StoreError> {
    let code = c.text("currency_code", r.currency_code)?;
    Ok(CurrencyRow {
        name: present(r.currency_name).unwrap_or_else(|| code.clone()),
        code,
        country_code: present(r.country_code),
        central_bank: present(r.central_bank),
        financial_capital: present(r.financial_capital),
        financial_capital_timezone: c.tz("financial_capital_timezone", r.financial_capital_timezone)?,
        weekend: c.days("weekend_definition", r.weekend_definition)?,
    })
}

fn currency_holiday_row(c: Cell, r: CurrencyHolidayRecord) -> Result<CurrencyHolidayRow, StoreError> {
    Ok(CurrencyHolidayRow {
        currency_code: c.text("currency_code", r.currency_code)?,
        date: c.required_date("date", r.date)?,
        holiday_name: c.text("holiday_name", r.holiday_name)?,
        settlement: c.flag("settlement", r.settlement)?,
        observed: c.observed("observed", r.observed)?,
        memo: present(r.memo),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> Cell {
        Cell::new(HOLIDAYS_FILE, 2)
    }

    fn holiday(schedule: Option<&str>) -> HolidayRecord {
        HolidayRecord {
            fin_id: Some("US.NYSE".into()),
            date: Some("2023-11-24".into()),
            holiday_name: Some("Thanksgiving Day".into()),
            schedule: schedule.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn empty_or_closed_schedule_means_closed() {
        for s in [None, Some(""), Some("Closed"), Some("CLOSED")] {
            let row = holiday_row(cell(), holiday(s)).unwrap();
            assert!(row.closed, "{s:?}");
            assert_eq!(row.schedule_group, None);
        }
    }

    #[test]
    fn named_schedule_overrides_group() {
        let row = holiday_row(cell(), holiday(Some("Partial"))).unwrap();
        assert!(!row.closed);
        assert_eq!(row.schedule_group.as_deref(), Some("Partial"));
    }

    #[test]
    fn unknown_phase_status_is_rejected() {
        let rec = PhaseRecord {
            name: Some("Halt".into()),
            status: Some("Paused".into()),
            ..Default::default()
        };
        assert!(matches!(
            phase_row(Cell::new(PHASES_FILE, 4), rec),
            Err(StoreError::ParseField { field: "status", row: 4, .. })
        ));
    }

    #[test]
    fn currency_name_defaults_to_code() {
        let rec = CurrencyRecord {
            currency_code: Some("CHF".into()),
            ..Default::default()
        };
        let row = currency_row(Cell::new(CURRENCIES_FILE, 2), rec).unwrap();
        assert_eq!(row.name, "CHF");
        assert_eq!(row.financial_capital_timezone, None);
    }
}
