//! Immutable calendar snapshot, its builder, and swap-on-refresh publishing.
//!
//! All data-integrity checks run in [`SnapshotBuilder::build`]. A snapshot
//! that builds is safe to expand and resolve without further validation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::error::CalendarError;
use crate::expander::PhaseExpander;
use crate::holidays::{
    Currency, CurrencyBook, CurrencyHoliday, GroupSelector, HolidayCalendar, HolidayEntry,
};
use crate::registry::{MarketRegistry, Resolved};
use crate::rows::{
    CurrencyHolidayRow, CurrencyRow, HolidayRow, MarketRow, MicMappingRow, PhaseTypeRow,
    ScheduleRow, SeasonDefinitionRow,
};
use crate::schedule::{validate_rule, ScheduleGroup, ScheduleIndex, ScheduleRule};
use crate::season::{SeasonBoundary, SeasonResolver};
use crate::status::StatusResolver;
use crate::types::{Coverage, Market, MarketId, MarketStatus, Phase, PhaseType, PhaseTypeCatalog};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Snapshot {
    registry: MarketRegistry,
    schedules: ScheduleIndex,
    holidays: HolidayCalendar,
    currencies: CurrencyBook,
    seasons: SeasonResolver,
    phase_types: PhaseTypeCatalog,
}

/// Row counts of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub markets: usize,
    pub schedules: usize,
    pub holidays: usize,
    pub currencies: usize,
    pub phase_types: usize,
    pub season_definitions: usize,
}

impl Snapshot {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    pub fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    pub fn schedule_index(&self) -> &ScheduleIndex {
        &self.schedules
    }

    pub fn holidays_index(&self) -> &HolidayCalendar {
        &self.holidays
    }

    pub fn seasons(&self) -> &SeasonResolver {
        &self.seasons
    }

    pub fn phase_types(&self) -> &PhaseTypeCatalog {
        &self.phase_types
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            markets: self.registry.len(),
            schedules: self.schedules.rule_count(),
            holidays: self.holidays.len(),
            currencies: self.currencies.len(),
            phase_types: self.phase_types.len(),
            season_definitions: self.seasons.len(),
        }
    }

    // -- markets ------------------------------------------------------------

    /// FinID or MIC, exact match. `follow` walks `replaced_by` to the end.
    pub fn resolve(&self, identifier: &str, follow: bool) -> Result<Resolved<'_>, CalendarError> {
        self.registry.resolve(identifier, follow)
    }

    pub fn market(&self, id: MarketId) -> &Market {
        self.registry.get(id)
    }

    pub fn list_markets(&self, pattern: Option<&str>) -> Vec<&Market> {
        self.registry.list(pattern)
    }

    // -- holidays and schedules ---------------------------------------------

    pub fn holiday(&self, market: MarketId, date: NaiveDate) -> Option<&HolidayEntry> {
        self.holidays.entry(market, date)
    }

    pub fn active_group(&self, market: MarketId, date: NaiveDate) -> GroupSelector {
        self.holidays.active_group(market, date)
    }

    pub fn holidays(
        &self,
        market: MarketId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<&HolidayEntry>, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(self.holidays.range(market, start, end).collect())
    }

    pub fn schedule_groups(&self, market: MarketId) -> &[ScheduleGroup] {
        self.schedules.groups(market)
    }

    pub fn schedules(&self, market: MarketId) -> Vec<&ScheduleRule> {
        self.schedules.rules(market)
    }

    // -- phases and status --------------------------------------------------

    pub fn expand(
        &self,
        market: MarketId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Phase>, CalendarError> {
        PhaseExpander::new(self).expand(market, start, end)
    }

    pub fn phases_on(&self, market: MarketId, date: NaiveDate) -> Result<Vec<Phase>, CalendarError> {
        self.expand(market, date, date)
    }

    pub fn status_at(
        &self,
        market: MarketId,
        instant: DateTime<FixedOffset>,
    ) -> Result<MarketStatus, CalendarError> {
        StatusResolver::new(self).status_at(market, instant)
    }

    // -- currencies ---------------------------------------------------------

    pub fn currency(&self, code: &str) -> Result<&Currency, CalendarError> {
        self.currencies.get(code)
    }

    pub fn currencies(&self) -> Vec<&Currency> {
        self.currencies.list().collect()
    }

    pub fn currency_holidays(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<&CurrencyHoliday>, CalendarError> {
        self.currencies.holidays(code, start, end)
    }

    pub fn currency_day(&self, code: &str, date: NaiveDate) -> Result<GroupSelector, CalendarError> {
        self.currencies.day(code, date)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct SnapshotBuilder {
    markets: Vec<MarketRow>,
    mic_mappings: Vec<MicMappingRow>,
    schedules: Vec<ScheduleRow>,
    holidays: Vec<HolidayRow>,
    currencies: Vec<CurrencyRow>,
    currency_holidays: Vec<CurrencyHolidayRow>,
    phase_types: Vec<PhaseTypeRow>,
    seasons: Vec<SeasonDefinitionRow>,
}

impl SnapshotBuilder {
    pub fn market(mut self, row: MarketRow) -> Self {
        self.markets.push(row);
        self
    }

    pub fn markets(mut self, rows: impl IntoIterator<Item = MarketRow>) -> Self {
        self.markets.extend(rows);
        self
    }

    pub fn mic_mappings(mut self, rows: impl IntoIterator<Item = MicMappingRow>) -> Self {
        self.mic_mappings.extend(rows);
        self
    }

    pub fn schedule(mut self, row: ScheduleRow) -> Self {
        self.schedules.push(row);
        self
    }

    pub fn schedules(mut self, rows: impl IntoIterator<Item = ScheduleRow>) -> Self {
        self.schedules.extend(rows);
        self
    }

    pub fn holiday(mut self, row: HolidayRow) -> Self {
        self.holidays.push(row);
        self
    }

    pub fn holidays(mut self, rows: impl IntoIterator<Item = HolidayRow>) -> Self {
        self.holidays.extend(rows);
        self
    }

    pub fn currencies(mut self, rows: impl IntoIterator<Item = CurrencyRow>) -> Self {
        self.currencies.extend(rows);
        self
    }

    pub fn currency_holidays(mut self, rows: impl IntoIterator<Item = CurrencyHolidayRow>) -> Self {
        self.currency_holidays.extend(rows);
        self
    }

    pub fn phase_types(mut self, rows: impl IntoIterator<Item = PhaseTypeRow>) -> Self {
        self.phase_types.extend(rows);
        self
    }

    pub fn season_definitions(mut self, rows: impl IntoIterator<Item = SeasonDefinitionRow>) -> Self {
        self.seasons.extend(rows);
        self
    }

    pub fn build(self) -> Result<Snapshot, CalendarError> {
        // Markets (coverage and replacements are filled in below).
        let mut markets: Vec<Market> = Vec::with_capacity(self.markets.len());
        let mut by_fin_id: HashMap<String, MarketId> = HashMap::new();
        let mut pending: Vec<(Option<String>, Option<NaiveDate>, Option<NaiveDate>)> = Vec::new();
        for row in self.markets {
            if row.fin_id.trim().is_empty() {
                return Err(CalendarError::integrity("market row with empty fin_id"));
            }
            let id = MarketId(markets.len());
            if by_fin_id.insert(row.fin_id.clone(), id).is_some() {
                return Err(CalendarError::integrity(format!(
                    "duplicate market {}",
                    row.fin_id
                )));
            }
            pending.push((
                row.replaced_by.filter(|r| !r.trim().is_empty()),
                row.first_available_date,
                row.last_available_date,
            ));
            markets.push(Market {
                id,
                fin_id: row.fin_id,
                mic: row.mic.filter(|m| !m.trim().is_empty()),
                exchange_name: row.exchange_name,
                market_name: row.market_name,
                security_group: row.security_group,
                acronym: row.acronym,
                asset_type: row.asset_type,
                memo: row.memo,
                timezone: row.timezone,
                weekend: row.weekend,
                permanently_closed: row.permanently_closed,
                replaced_by: None,
                coverage: Coverage {
                    first: NaiveDate::MIN,
                    last: NaiveDate::MAX,
                },
            });
        }

        let lookup = |fin_id: &str, what: &str| -> Result<MarketId, CalendarError> {
            by_fin_id.get(fin_id).copied().ok_or_else(|| {
                CalendarError::integrity(format!("{what} references unknown market {fin_id}"))
            })
        };

        // Holidays.
        let mut holidays = HolidayCalendar::default();
        for row in self.holidays {
            let id = lookup(&row.fin_id, "holiday")?;
            let date = row.date;
            let entry = HolidayEntry {
                fin_id: row.fin_id,
                date,
                holiday_name: row.holiday_name,
                schedule_group: row.schedule_group.filter(|g| !g.trim().is_empty()),
                closed: row.closed,
                settlement: row.settlement,
                observed: row.observed,
                memo: row.memo,
            };
            if let Some(prev) = holidays.insert(id, entry) {
                return Err(CalendarError::integrity(format!(
                    "duplicate holiday for {} on {date}",
                    prev.fin_id
                )));
            }
        }

        // Replacement links and coverage.
        for (idx, (replaced_by, first, last)) in pending.into_iter().enumerate() {
            let m = &mut markets[idx];
            if let Some(name) = replaced_by {
                let target = lookup(&name, &format!("replaced_by of {}", m.fin_id))?;
                if target == m.id {
                    return Err(CalendarError::integrity(format!(
                        "market {} replaces itself",
                        m.fin_id
                    )));
                }
                m.replaced_by = Some(target);
            }

            let derived = holidays
                .date_bounds(m.id)
                .map(|(a, b)| (month_start(a), month_end(b)));
            match (first.or(derived.map(|d| d.0)), last.or(derived.map(|d| d.1))) {
                (Some(first), Some(last)) if first <= last => m.coverage = Coverage { first, last },
                (Some(first), Some(last)) => {
                    return Err(CalendarError::integrity(format!(
                        "market {} coverage {first}..{last} is inverted",
                        m.fin_id
                    )))
                }
                _ => {
                    return Err(CalendarError::integrity(format!(
                        "market {} has no coverage: no available dates and no holidays",
                        m.fin_id
                    )))
                }
            }
        }

        // MIC aliases.
        let mut by_mic: HashMap<String, MarketId> = HashMap::new();
        let market_mics: Vec<(String, MarketId)> = markets
            .iter()
            .filter_map(|m| m.mic.clone().map(|mic| (mic, m.id)))
            .collect();
        for (mic, id) in market_mics {
            register_mic(&mut by_mic, &markets, mic, id)?;
        }
        for row in self.mic_mappings {
            let id = lookup(&row.fin_id, "mic mapping")?;
            register_mic(&mut by_mic, &markets, row.mic, id)?;
        }

        let registry = MarketRegistry::from_parts(markets, by_fin_id.clone(), by_mic);
        for m in registry.iter() {
            registry.chain_end(m.id)?;
        }

        // Seasons, then schedules that may reference them.
        let seasons = SeasonResolver::new(
            self.seasons
                .into_iter()
                .map(|s| (s.season, s.year, s.date)),
        );
        let mut schedules = ScheduleIndex::default();
        for (seq, row) in self.schedules.into_iter().enumerate() {
            let id = by_fin_id.get(&row.fin_id).copied().ok_or_else(|| {
                CalendarError::integrity(format!(
                    "schedule references unknown market {}",
                    row.fin_id
                ))
            })?;
            let rule = validate_rule(row, seq, registry.get(id).timezone)?;
            if let Some(window) = &rule.season {
                for b in [&window.start, &window.end] {
                    if let SeasonBoundary::Named(name) = b {
                        if !seasons.knows(name) {
                            return Err(CalendarError::integrity(format!(
                                "{} rule '{}' uses undefined season '{name}'",
                                registry.get(id).fin_id,
                                rule.phase_type
                            )));
                        }
                    }
                }
            }
            schedules.insert(id, rule);
        }

        // Phase types.
        let phase_types = if self.phase_types.is_empty() {
            PhaseTypeCatalog::default()
        } else {
            let mut seen: HashSet<&str> = HashSet::new();
            for row in &self.phase_types {
                if !seen.insert(row.name.as_str()) {
                    return Err(CalendarError::integrity(format!(
                        "duplicate phase type '{}'",
                        row.name
                    )));
                }
            }
            PhaseTypeCatalog::new(self.phase_types.into_iter().map(|r| PhaseType {
                name: r.name,
                status: r.status,
                settlement: r.settlement,
                closing_price: r.closing_price,
            }))
        };

        // Currencies.
        let mut currencies = CurrencyBook::default();
        for row in self.currencies {
            currencies.insert_currency(Currency {
                code: row.code,
                name: row.name,
                country_code: row.country_code,
                central_bank: row.central_bank,
                financial_capital: row.financial_capital,
                financial_capital_timezone: row.financial_capital_timezone,
                weekend: row.weekend,
            })?;
        }
        for row in self.currency_holidays {
            currencies.insert_holiday(CurrencyHoliday {
                currency_code: row.currency_code,
                date: row.date,
                holiday_name: row.holiday_name,
                settlement: row.settlement,
                observed: row.observed,
                memo: row.memo,
            })?;
        }

        let snapshot = Snapshot {
            registry,
            schedules,
            holidays,
            currencies,
            seasons,
            phase_types,
        };
        let s = snapshot.summary();
        info!(
            markets = s.markets,
            schedules = s.schedules,
            holidays = s.holidays,
            currencies = s.currencies,
            "calendar snapshot built"
        );
        Ok(snapshot)
    }
}

fn register_mic(
    by_mic: &mut HashMap<String, MarketId>,
    markets: &[Market],
    mic: String,
    id: MarketId,
) -> Result<(), CalendarError> {
    if let Some(existing) = by_mic.get(&mic) {
        if *existing != id {
            return Err(CalendarError::integrity(format!(
                "MIC {mic} maps to both {} and {}",
                markets[existing.0].fin_id, markets[id.0].fin_id
            )));
        }
    }
    by_mic.insert(mic, id);
    Ok(())
}

fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

fn month_end(d: NaiveDate) -> NaiveDate {
    let (y, m) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(d)
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Current snapshot behind an atomic swap. Readers keep the `Arc` they took
/// for the whole call, so a concurrent `publish` never tears a resolution.
#[derive(Debug)]
pub struct SharedSnapshot {
    inner: RwLock<Arc<Snapshot>>,
}

impl SharedSnapshot {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `snapshot` and returns the one it replaced.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::ScheduleRow;
    use crate::types::DaySet;
    use chrono::NaiveTime;
    use chrono_tz::America::New_York;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn market(fin_id: &str) -> MarketRow {
        let mut row = MarketRow::new(fin_id, New_York);
        row.first_available_date = Some(d(2024, 1, 1));
        row.last_available_date = Some(d(2024, 12, 31));
        row
    }

    fn expect_integrity(b: SnapshotBuilder) -> String {
        match b.build() {
            Err(CalendarError::DataIntegrity(msg)) => msg,
            other => panic!("expected DataIntegrity, got {other:?}"),
        }
    }

    #[test]
    fn coverage_is_derived_from_holiday_months() {
        let mut row = MarketRow::new("US.NYSE", New_York);
        row.first_available_date = None;
        let snap = Snapshot::builder()
            .market(row)
            .holiday(HolidayRow::closed("US.NYSE", d(2023, 1, 16), "MLK Day"))
            .holiday(HolidayRow::closed("US.NYSE", d(2024, 2, 19), "Presidents Day"))
            .build()
            .unwrap();
        let m = snap.resolve("US.NYSE", true).unwrap().market;
        assert_eq!(m.coverage.first, d(2023, 1, 1));
        assert_eq!(m.coverage.last, d(2024, 2, 29));
    }

    #[test]
    fn market_without_coverage_is_rejected() {
        let msg = expect_integrity(Snapshot::builder().market(MarketRow::new("XX.NONE", New_York)));
        assert!(msg.contains("XX.NONE"));
    }

    #[test]
    fn duplicate_fin_id_is_rejected() {
        expect_integrity(Snapshot::builder().market(market("A.A")).market(market("A.A")));
    }

    #[test]
    fn unknown_replacement_is_rejected() {
        let mut a = market("A.A");
        a.replaced_by = Some("A.MISSING".to_string());
        expect_integrity(Snapshot::builder().market(a));
    }

    #[test]
    fn cyclic_replacement_is_rejected() {
        let mut a = market("A.A");
        a.replaced_by = Some("A.B".to_string());
        let mut b = market("A.B");
        b.replaced_by = Some("A.A".to_string());
        let msg = expect_integrity(Snapshot::builder().market(a).market(b));
        assert!(msg.contains("replacement chain"));
    }

    #[test]
    fn conflicting_mic_is_rejected() {
        let mut a = market("A.A");
        a.mic = Some("XAAA".to_string());
        expect_integrity(
            Snapshot::builder()
                .market(a)
                .market(market("A.B"))
                .mic_mappings([MicMappingRow {
                    mic: "XAAA".to_string(),
                    fin_id: "A.B".to_string(),
                }]),
        );
    }

    #[test]
    fn schedule_for_unknown_market_is_rejected() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let row = ScheduleRow::new(
            "A.MISSING",
            "Regular",
            New_York,
            "Primary Trading Session",
            DaySet::parse("Mon-Fri").unwrap(),
            t(9),
            t(16),
            0,
        );
        expect_integrity(Snapshot::builder().market(market("A.A")).schedule(row));
    }

    #[test]
    fn undefined_named_season_is_rejected() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let row = ScheduleRow::new(
            "A.A",
            "Regular",
            New_York,
            "Primary Trading Session",
            DaySet::parse("Mon-Fri").unwrap(),
            t(9),
            t(16),
            0,
        )
        .season("Second Sunday of March", "First Sunday of November");
        let msg = expect_integrity(Snapshot::builder().market(market("A.A")).schedule(row));
        assert!(msg.contains("Second Sunday of March"));
    }

    #[test]
    fn duplicate_holiday_is_rejected() {
        expect_integrity(
            Snapshot::builder()
                .market(market("A.A"))
                .holiday(HolidayRow::closed("A.A", d(2024, 7, 4), "Independence Day"))
                .holiday(HolidayRow::closed("A.A", d(2024, 7, 4), "Independence Day")),
        );
    }

    #[test]
    fn publish_swaps_and_returns_previous() {
        let first = Snapshot::builder().market(market("A.A")).build().unwrap();
        let second = Snapshot::builder()
            .market(market("A.A"))
            .market(market("A.B"))
            .build()
            .unwrap();
        let shared = SharedSnapshot::new(first);
        let held = shared.current();
        let old = shared.publish(second);
        assert_eq!(old.summary().markets, 1);
        assert_eq!(held.summary().markets, 1);
        assert_eq!(shared.current().summary().markets, 2);
    }
}
