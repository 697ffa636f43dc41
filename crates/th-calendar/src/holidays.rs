//! Per-market holiday calendar and the currency settlement book.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::CalendarError;
use crate::types::{DaySet, MarketId, REGULAR_GROUP};

/// Which schedule group governs a date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum GroupSelector {
    Regular,
    Override(String),
    /// Fully closed; carries the holiday name.
    Closed(String),
}

impl GroupSelector {
    pub fn is_closed(&self) -> bool {
        matches!(self, GroupSelector::Closed(_))
    }

    /// Group whose rules apply, `None` when closed.
    pub fn group_name(&self) -> Option<&str> {
        match self {
            GroupSelector::Regular => Some(REGULAR_GROUP),
            GroupSelector::Override(g) => Some(g),
            GroupSelector::Closed(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HolidayEntry {
    pub fin_id: String,
    pub date: NaiveDate,
    pub holiday_name: String,
    pub schedule_group: Option<String>,
    pub closed: bool,
    pub settlement: bool,
    pub observed: bool,
    pub memo: Option<String>,
}

impl HolidayEntry {
    pub fn selector(&self) -> GroupSelector {
        if self.closed {
            return GroupSelector::Closed(self.holiday_name.clone());
        }
        match self.schedule_group.as_deref() {
            None => GroupSelector::Regular,
            Some(g) if g.eq_ignore_ascii_case(REGULAR_GROUP) => GroupSelector::Regular,
            Some(g) => GroupSelector::Override(g.to_string()),
        }
    }
}

/// At most one entry per (market, date).
#[derive(Clone, Debug, Default)]
pub struct HolidayCalendar {
    by_market: HashMap<MarketId, BTreeMap<NaiveDate, HolidayEntry>>,
}

impl HolidayCalendar {
    /// Returns the displaced entry if the date was already taken.
    pub(crate) fn insert(&mut self, market: MarketId, entry: HolidayEntry) -> Option<HolidayEntry> {
        self.by_market
            .entry(market)
            .or_default()
            .insert(entry.date, entry)
    }

    pub fn entry(&self, market: MarketId, date: NaiveDate) -> Option<&HolidayEntry> {
        self.by_market.get(&market).and_then(|m| m.get(&date))
    }

    pub fn active_group(&self, market: MarketId, date: NaiveDate) -> GroupSelector {
        self.entry(market, date)
            .map(HolidayEntry::selector)
            .unwrap_or(GroupSelector::Regular)
    }

    /// Entries with `start <= date <= end`, ascending.
    pub fn range(
        &self,
        market: MarketId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &HolidayEntry> {
        self.by_market
            .get(&market)
            .into_iter()
            .flat_map(move |m| m.range(start..=end).map(|(_, h)| h))
    }

    pub(crate) fn date_bounds(&self, market: MarketId) -> Option<(NaiveDate, NaiveDate)> {
        let m = self.by_market.get(&market)?;
        Some((*m.keys().next()?, *m.keys().next_back()?))
    }

    pub fn len(&self) -> usize {
        self.by_market.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub country_code: Option<String>,
    pub central_bank: Option<String>,
    pub financial_capital: Option<String>,
    #[serde(serialize_with = "ser_tz_opt")]
    pub financial_capital_timezone: Option<Tz>,
    pub weekend: DaySet,
}

fn ser_tz_opt<S: serde::Serializer>(tz: &Option<Tz>, s: S) -> Result<S::Ok, S::Error> {
    match tz {
        Some(tz) => s.serialize_some(tz.name()),
        None => s.serialize_none(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CurrencyHoliday {
    pub currency_code: String,
    pub date: NaiveDate,
    pub holiday_name: String,
    pub settlement: bool,
    pub observed: bool,
    pub memo: Option<String>,
}

/// Currency metadata plus settlement holidays. Currencies carry no schedules:
/// a day is either Regular or Closed.
#[derive(Clone, Debug, Default)]
pub struct CurrencyBook {
    currencies: BTreeMap<String, Currency>,
    holidays: HashMap<String, BTreeMap<NaiveDate, CurrencyHoliday>>,
}

impl CurrencyBook {
    pub(crate) fn insert_currency(&mut self, c: Currency) -> Result<(), CalendarError> {
        if self.currencies.contains_key(&c.code) {
            return Err(CalendarError::integrity(format!(
                "duplicate currency {}",
                c.code
            )));
        }
        self.currencies.insert(c.code.clone(), c);
        Ok(())
    }

    pub(crate) fn insert_holiday(&mut self, h: CurrencyHoliday) -> Result<(), CalendarError> {
        if !self.currencies.contains_key(&h.currency_code) {
            return Err(CalendarError::integrity(format!(
                "currency holiday {} references unknown currency {}",
                h.date, h.currency_code
            )));
        }
        self.holidays
            .entry(h.currency_code.clone())
            .or_default()
            .insert(h.date, h);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Result<&Currency, CalendarError> {
        self.currencies
            .get(code)
            .ok_or_else(|| CalendarError::currency_not_found(code))
    }

    pub fn list(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    pub fn holidays(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<&CurrencyHoliday>, CalendarError> {
        self.get(code)?;
        if start > end {
            return Err(CalendarError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(self
            .holidays
            .get(code)
            .map(|m| m.range(start..=end).map(|(_, h)| h).collect())
            .unwrap_or_default())
    }

    pub fn day(&self, code: &str, date: NaiveDate) -> Result<GroupSelector, CalendarError> {
        self.get(code)?;
        Ok(self
            .holidays
            .get(code)
            .and_then(|m| m.get(&date))
            .map(|h| GroupSelector::Closed(h.holiday_name.clone()))
            .unwrap_or(GroupSelector::Regular))
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn entry(date: NaiveDate, group: Option<&str>, closed: bool) -> HolidayEntry {
        HolidayEntry {
            fin_id: "US.NYSE".to_string(),
            date,
            holiday_name: "Thanksgiving Day".to_string(),
            schedule_group: group.map(str::to_string),
            closed,
            settlement: false,
            observed: false,
            memo: None,
        }
    }

    #[test]
    fn no_entry_means_regular() {
        let cal = HolidayCalendar::default();
        assert_eq!(cal.active_group(MarketId(0), d(11, 15)), GroupSelector::Regular);
    }

    #[test]
    fn closed_entry_wins_over_group() {
        let mut cal = HolidayCalendar::default();
        cal.insert(MarketId(0), entry(d(11, 23), Some("Partial"), true));
        assert_eq!(
            cal.active_group(MarketId(0), d(11, 23)),
            GroupSelector::Closed("Thanksgiving Day".to_string())
        );
    }

    #[test]
    fn override_group_and_regular_spelling() {
        let mut cal = HolidayCalendar::default();
        cal.insert(MarketId(0), entry(d(11, 24), Some("Partial"), false));
        cal.insert(MarketId(0), entry(d(11, 27), Some("regular"), false));
        assert_eq!(
            cal.active_group(MarketId(0), d(11, 24)),
            GroupSelector::Override("Partial".to_string())
        );
        assert_eq!(cal.active_group(MarketId(0), d(11, 27)), GroupSelector::Regular);
        assert_eq!(cal.date_bounds(MarketId(0)), Some((d(11, 24), d(11, 27))));
    }

    #[test]
    fn range_is_inclusive_and_ordered() {
        let mut cal = HolidayCalendar::default();
        for day in [27, 23, 24] {
            cal.insert(MarketId(0), entry(d(11, day), None, true));
        }
        let got: Vec<NaiveDate> = cal
            .range(MarketId(0), d(11, 23), d(11, 24))
            .map(|h| h.date)
            .collect();
        assert_eq!(got, vec![d(11, 23), d(11, 24)]);
        assert_eq!(cal.range(MarketId(1), d(1, 1), d(12, 31)).count(), 0);
    }

    #[test]
    fn currency_day_is_regular_or_closed() {
        let mut book = CurrencyBook::default();
        book.insert_currency(Currency {
            code: "USD".to_string(),
            name: "US Dollar".to_string(),
            country_code: Some("US".to_string()),
            central_bank: None,
            financial_capital: Some("New York".to_string()),
            financial_capital_timezone: Some(chrono_tz::America::New_York),
            weekend: DaySet::parse("Sat-Sun").unwrap(),
        })
        .unwrap();
        book.insert_holiday(CurrencyHoliday {
            currency_code: "USD".to_string(),
            date: d(7, 4),
            holiday_name: "Independence Day".to_string(),
            settlement: false,
            observed: false,
            memo: None,
        })
        .unwrap();

        assert_eq!(
            book.day("USD", d(7, 4)).unwrap(),
            GroupSelector::Closed("Independence Day".to_string())
        );
        assert_eq!(book.day("USD", d(7, 5)).unwrap(), GroupSelector::Regular);
        assert!(matches!(
            book.day("EUR", d(7, 5)),
            Err(CalendarError::NotFound { kind: "currency", .. })
        ));
        assert!(book.holidays("USD", d(8, 1), d(7, 1)).is_err());
    }
}
