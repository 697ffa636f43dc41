//! Shared fixtures for scenario tests across the workspace.
//!
//! `fixture_snapshot()` builds a small calendar through the public builder:
//!
//! - US.NYSE      New York, Regular + Partial groups, holiday-derived coverage
//! - US.CME.EQUITY.USINDEX1  Chicago, Sun-Thu overnight session
//! - US.MGEX      Chicago, overnight session plus a day session
//! - GB.SEASONAL  London, summer/winter hours, named seasons, in-force rule
//! - CN.SZSE      Shanghai, Sunday make-up day that keeps the Regular group
//! - XX.NIGHT     New York, Saturday night session across spring-forward
//! - AR.OLD -> AR.BCBA (XBUE) -> AR.BYMA replacement chain
//! - currencies USD and EUR
//!
//! `write_csv_fixture()` writes a CSV export of a subset for loader, CLI and
//! daemon tests.

mod csv_fixture;

pub use csv_fixture::{csv_fixture_dir, write_csv_fixture};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use th_calendar::{
    CalendarError, CurrencyHolidayRow, CurrencyRow, DaySet, HolidayRow, MarketRow, MarketState,
    MicMappingRow, PhaseTypeRow, ScheduleRow, SeasonDefinitionRow, Snapshot, SnapshotBuilder,
    PRIMARY_TRADING_SESSION,
};

pub const NYSE: &str = "US.NYSE";
pub const CME_USINDEX1: &str = "US.CME.EQUITY.USINDEX1";
pub const MGEX: &str = "US.MGEX";
pub const SEASONAL: &str = "GB.SEASONAL";
pub const SZSE: &str = "CN.SZSE";
pub const NIGHT: &str = "XX.NIGHT";
pub const AR_OLD: &str = "AR.OLD";
pub const AR_BCBA: &str = "AR.BCBA";
pub const AR_BYMA: &str = "AR.BYMA";

pub const PRE_TRADING: &str = "Pre-Trading Session";
pub const PRE_OPEN: &str = "Pre-Open";
pub const CALL_AUCTION: &str = "Call Auction";
pub const PRE_CLOSE: &str = "Pre-Close";
pub const POST_TRADING: &str = "Post-Trading Session";
pub const INTERMISSION: &str = "Intermission";
pub const EXTENDED: &str = "Extended Trading Session";
pub const CLOSING_AUCTION: &str = "Closing Auction";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("fixture date")
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("fixture time")
}

/// RFC 3339 literal -> instant.
pub fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).expect("fixture timestamp")
}

pub fn days(s: &str) -> DaySet {
    DaySet::parse(s).expect("fixture weekday set")
}

#[allow(clippy::too_many_arguments)]
fn rule(
    fin_id: &str,
    group: &str,
    tz: Tz,
    phase_type: &str,
    on: &str,
    start: NaiveTime,
    end: NaiveTime,
    offset: i64,
) -> ScheduleRow {
    ScheduleRow::new(fin_id, group, tz, phase_type, days(on), start, end, offset)
}

fn market(fin_id: &str, tz: Tz, mic: Option<&str>, name: &str) -> MarketRow {
    let mut row = MarketRow::new(fin_id, tz);
    row.mic = mic.map(str::to_string);
    row.exchange_name = name.to_string();
    row.weekend = days("Sat-Sun");
    row
}

fn covered(mut row: MarketRow, first: NaiveDate, last: NaiveDate) -> MarketRow {
    row.first_available_date = Some(first);
    row.last_available_date = Some(last);
    row
}

// ---------------------------------------------------------------------------
// Fixture snapshot
// ---------------------------------------------------------------------------

pub fn fixture_snapshot() -> Result<Snapshot, CalendarError> {
    fixture_builder().build()
}

pub fn fixture_builder() -> SnapshotBuilder {
    Snapshot::builder()
        .phase_types(phase_types())
        .season_definitions(season_definitions())
        .markets(markets())
        .mic_mappings([MicMappingRow {
            mic: "XCBT".to_string(),
            fin_id: CME_USINDEX1.to_string(),
        }])
        .schedules(nyse_rules())
        .schedules(cme_rules())
        .schedules(mgex_rules())
        .schedules(seasonal_rules())
        .schedules(szse_rules())
        .schedules(night_rules())
        .schedules(byma_rules())
        .holidays(holidays())
        .currencies(currencies())
        .currency_holidays(currency_holidays())
}

pub fn phase_types() -> Vec<PhaseTypeRow> {
    let closed = |name: &str| PhaseTypeRow {
        name: name.to_string(),
        status: MarketState::Closed,
        settlement: false,
        closing_price: false,
    };
    vec![
        PhaseTypeRow {
            name: PRIMARY_TRADING_SESSION.to_string(),
            status: MarketState::Open,
            settlement: true,
            closing_price: true,
        },
        closed(PRE_TRADING),
        closed(PRE_OPEN),
        closed(CALL_AUCTION),
        closed(PRE_CLOSE),
        closed(POST_TRADING),
        closed(INTERMISSION),
        closed(EXTENDED),
        closed(CLOSING_AUCTION),
    ]
}

pub fn season_definitions() -> Vec<SeasonDefinitionRow> {
    let def = |season: &str, date: NaiveDate| SeasonDefinitionRow {
        season: season.to_string(),
        year: chrono::Datelike::year(&date),
        date,
    };
    vec![
        def("Second Sunday of March", d(2023, 3, 12)),
        def("Second Sunday of March", d(2024, 3, 10)),
        def("Second Sunday of March", d(2025, 3, 9)),
        def("First Sunday of November", d(2023, 11, 5)),
        def("First Sunday of November", d(2024, 11, 3)),
        def("First Sunday of November", d(2025, 11, 2)),
    ]
}

pub fn markets() -> Vec<MarketRow> {
    use chrono_tz::America::{Argentina::Buenos_Aires, Chicago, New_York};
    use chrono_tz::Asia::Shanghai;
    use chrono_tz::Europe::London;

    let y23 = d(2023, 1, 1);
    let y25 = d(2025, 12, 31);

    let mut nyse = market(NYSE, New_York, Some("XNYS"), "New York Stock Exchange");
    nyse.market_name = "Canonical".to_string();
    nyse.asset_type = Some("Securities".to_string());
    nyse.acronym = Some("NYSE".to_string());

    let mut cme = market(CME_USINDEX1, Chicago, Some("XCME"), "Chicago Mercantile Exchange");
    cme.market_name = "Equity Index Futures".to_string();
    cme.asset_type = Some("Futures".to_string());

    let mut old = market(AR_OLD, Buenos_Aires, None, "Old Buenos Aires Exchange");
    old.replaced_by = Some(AR_BCBA.to_string());
    old.permanently_closed = Some(d(2015, 1, 1));

    let mut bcba = market(AR_BCBA, Buenos_Aires, Some("XBUE"), "Buenos Aires Stock Exchange");
    bcba.replaced_by = Some(AR_BYMA.to_string());
    bcba.permanently_closed = Some(d(2017, 5, 1));

    let mut byma = market(AR_BYMA, Buenos_Aires, None, "Bolsas y Mercados Argentinos");
    byma.acronym = Some("BYMA".to_string());

    let mut night = market(NIGHT, New_York, None, "Overnight Venue");
    night.weekend = DaySet::EMPTY;

    vec![
        nyse,
        covered(cme, y23, y25),
        covered(
            market(MGEX, Chicago, Some("XMGE"), "Minneapolis Grain Exchange"),
            y23,
            y25,
        ),
        covered(market(SEASONAL, London, None, "Seasonal Exchange"), y23, y25),
        covered(
            market(SZSE, Shanghai, Some("XSHE"), "Shenzhen Stock Exchange"),
            d(2024, 1, 1),
            d(2024, 12, 31),
        ),
        covered(night, d(2024, 1, 1), d(2024, 12, 31)),
        covered(old, y23, y25),
        covered(bcba, y23, y25),
        covered(byma, y23, y25),
    ]
}

pub fn nyse_rules() -> Vec<ScheduleRow> {
    use chrono_tz::America::New_York as Ny;
    let wk = "Mon-Fri";
    vec![
        rule(NYSE, "Regular", Ny, PRE_TRADING, wk, t(4, 0), t(9, 30), 0),
        rule(NYSE, "Regular", Ny, PRE_OPEN, wk, t(6, 30), t(9, 30), 0),
        rule(NYSE, "Regular", Ny, CALL_AUCTION, wk, t(9, 30), t(9, 30), 0),
        rule(NYSE, "Regular", Ny, PRIMARY_TRADING_SESSION, wk, t(9, 30), t(16, 0), 0)
            .named("Core Trading Session"),
        rule(NYSE, "Regular", Ny, PRE_CLOSE, wk, t(15, 50), t(16, 0), 0),
        rule(NYSE, "Regular", Ny, POST_TRADING, wk, t(16, 0), t(20, 0), 0),
        rule(NYSE, "Partial", Ny, PRE_TRADING, wk, t(6, 30), t(9, 30), 0),
        rule(NYSE, "Partial", Ny, PRIMARY_TRADING_SESSION, wk, t(9, 30), t(13, 0), 0)
            .named("Core Trading Session"),
        rule(NYSE, "Partial", Ny, POST_TRADING, wk, t(13, 0), t(13, 30), 0),
    ]
}

pub fn cme_rules() -> Vec<ScheduleRow> {
    use chrono_tz::America::Chicago as Chi;
    vec![
        rule(CME_USINDEX1, "Regular", Chi, PRE_OPEN, "Sun-Thu", t(16, 45), t(17, 0), 0),
        rule(CME_USINDEX1, "Regular", Chi, PRIMARY_TRADING_SESSION, "Sun-Thu", t(17, 0), t(16, 0), 1),
    ]
}

pub fn mgex_rules() -> Vec<ScheduleRow> {
    use chrono_tz::America::Chicago as Chi;
    vec![
        rule(MGEX, "Regular", Chi, PRIMARY_TRADING_SESSION, "Sun-Thu", t(19, 0), t(7, 45), 1)
            .named("Electronic Session"),
        rule(MGEX, "Regular", Chi, PRE_OPEN, "Mon-Fri", t(8, 0), t(8, 30), 0),
        rule(MGEX, "Regular", Chi, PRIMARY_TRADING_SESSION, "Mon-Fri", t(8, 30), t(13, 20), 0)
            .named("Day Session"),
        rule(MGEX, "Regular", Chi, POST_TRADING, "Mon-Fri", t(13, 20), t(16, 0), 0),
    ]
}

pub fn seasonal_rules() -> Vec<ScheduleRow> {
    use chrono_tz::Europe::London as Lon;
    let wk = "Mon-Fri";
    vec![
        rule(SEASONAL, "Regular", Lon, PRIMARY_TRADING_SESSION, wk, t(8, 0), t(16, 30), 0)
            .named("Summer Hours")
            .season("03-01", "10-31"),
        rule(SEASONAL, "Regular", Lon, PRIMARY_TRADING_SESSION, wk, t(9, 0), t(16, 0), 0)
            .named("Winter Hours")
            .season("11-01", "02-29"),
        rule(SEASONAL, "Regular", Lon, EXTENDED, wk, t(16, 30), t(17, 0), 0)
            .season("Second Sunday of March", "First Sunday of November"),
        rule(SEASONAL, "Regular", Lon, CLOSING_AUCTION, wk, t(16, 30), t(16, 35), 0)
            .in_force(Some(d(2024, 6, 3)), None),
    ]
}

pub fn szse_rules() -> Vec<ScheduleRow> {
    use chrono_tz::Asia::Shanghai as Sh;
    let wk = "Mon-Fri";
    vec![
        rule(SZSE, "Regular", Sh, CALL_AUCTION, wk, t(9, 15), t(9, 25), 0),
        rule(SZSE, "Regular", Sh, PRIMARY_TRADING_SESSION, wk, t(9, 30), t(11, 30), 0)
            .named("Morning Session"),
        rule(SZSE, "Regular", Sh, INTERMISSION, wk, t(11, 30), t(13, 0), 0),
        rule(SZSE, "Regular", Sh, PRIMARY_TRADING_SESSION, wk, t(13, 0), t(15, 0), 0)
            .named("Afternoon Session"),
    ]
}

pub fn night_rules() -> Vec<ScheduleRow> {
    use chrono_tz::America::New_York as Ny;
    vec![rule(NIGHT, "Regular", Ny, PRIMARY_TRADING_SESSION, "Sat", t(22, 0), t(6, 0), 1)]
}

pub fn byma_rules() -> Vec<ScheduleRow> {
    use chrono_tz::America::Argentina::Buenos_Aires as Ba;
    vec![rule(AR_BYMA, "Regular", Ba, PRIMARY_TRADING_SESSION, "Mon-Fri", t(11, 0), t(17, 0), 0)]
}

pub fn holidays() -> Vec<HolidayRow> {
    vec![
        HolidayRow::closed(NYSE, d(2023, 1, 2), "New Year's Day"),
        HolidayRow::closed(NYSE, d(2023, 11, 23), "Thanksgiving Day"),
        HolidayRow::override_group(NYSE, d(2023, 11, 24), "Thanksgiving Day", "Partial"),
        HolidayRow::closed(NYSE, d(2024, 11, 28), "Thanksgiving Day"),
        HolidayRow::override_group(NYSE, d(2024, 11, 29), "Thanksgiving Day", "Partial"),
        HolidayRow::closed(NYSE, d(2024, 12, 25), "Christmas"),
        HolidayRow::closed(NYSE, d(2025, 12, 25), "Christmas"),
        HolidayRow::closed(CME_USINDEX1, d(2024, 7, 4), "Independence Day"),
        HolidayRow::closed(MGEX, d(2024, 12, 25), "Christmas"),
        HolidayRow::closed(SEASONAL, d(2024, 12, 25), "Christmas Day"),
        HolidayRow::override_group(SZSE, d(2024, 2, 4), "Spring Festival Make-up Day", "Regular"),
        HolidayRow::closed(SZSE, d(2024, 2, 12), "Spring Festival"),
    ]
}

pub fn currencies() -> Vec<CurrencyRow> {
    vec![
        CurrencyRow {
            code: "USD".to_string(),
            name: "United States Dollar".to_string(),
            country_code: Some("US".to_string()),
            central_bank: Some("Federal Reserve".to_string()),
            financial_capital: Some("New York".to_string()),
            financial_capital_timezone: Some(chrono_tz::America::New_York),
            weekend: days("Sat-Sun"),
        },
        CurrencyRow {
            code: "EUR".to_string(),
            name: "Euro".to_string(),
            country_code: None,
            central_bank: Some("European Central Bank".to_string()),
            financial_capital: Some("Frankfurt".to_string()),
            financial_capital_timezone: Some(chrono_tz::Europe::Berlin),
            weekend: days("Sat-Sun"),
        },
    ]
}

pub fn currency_holidays() -> Vec<CurrencyHolidayRow> {
    let h = |code: &str, date: NaiveDate, name: &str| CurrencyHolidayRow {
        currency_code: code.to_string(),
        date,
        holiday_name: name.to_string(),
        settlement: false,
        observed: false,
        memo: None,
    };
    vec![
        h("USD", d(2024, 7, 4), "Independence Day"),
        h("USD", d(2024, 12, 25), "Christmas Day"),
        h("EUR", d(2024, 12, 25), "Christmas Day"),
        h("EUR", d(2024, 12, 26), "St. Stephen's Day"),
    ]
}
