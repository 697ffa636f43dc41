//! Core value types shared by every resolver.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Name of the default schedule group.
pub const REGULAR_GROUP: &str = "Regular";

/// Phase type that marks a market as open.
pub const PRIMARY_TRADING_SESSION: &str = "Primary Trading Session";

/// Largest `offset_days` a schedule rule may carry.
pub const MAX_OFFSET_DAYS: u32 = 2;

/// Saturating calendar-day arithmetic.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

// ---------------------------------------------------------------------------
// DaySet
// ---------------------------------------------------------------------------

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays, one bit per day (Mon = bit 0).
///
/// Parses the compact forms found in calendar data: `"Mon-Fri"`,
/// `"Sun-Thu"` (wrapping), `"Sat,Sun"` and mixes such as `"Mon-Wed,Fri"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DaySet(u8);

impl DaySet {
    pub const EMPTY: DaySet = DaySet(0);

    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = DaySet::EMPTY;
        for d in days {
            set.insert(*d);
        }
        set
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let mut set = DaySet::EMPTY;
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('-') {
                Some((a, b)) => {
                    let first = parse_day(a.trim())?;
                    let last = parse_day(b.trim())?;
                    let mut day = first;
                    set.insert(day);
                    while day != last {
                        day = day.succ();
                        set.insert(day);
                    }
                }
                None => set.insert(parse_day(token)?),
            }
        }
        Ok(set)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(|d| self.contains(*d))
    }
}

/// Three-letter or full English day name, any case.
fn parse_day(token: &str) -> Result<Weekday, String> {
    const NAMES: [(Weekday, &str); 7] = [
        (Weekday::Mon, "monday"),
        (Weekday::Tue, "tuesday"),
        (Weekday::Wed, "wednesday"),
        (Weekday::Thu, "thursday"),
        (Weekday::Fri, "friday"),
        (Weekday::Sat, "saturday"),
        (Weekday::Sun, "sunday"),
    ];
    let key = token.to_ascii_lowercase();
    NAMES
        .iter()
        .find(|(_, full)| key == *full || key == full[..3])
        .map(|(day, _)| *day)
        .ok_or_else(|| format!("unknown weekday '{token}'"))
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

impl fmt::Display for DaySet {
    /// Runs of three or more consecutive days print as ranges.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let mut i = 0;
        while i < WEEK.len() {
            if !self.contains(WEEK[i]) {
                i += 1;
                continue;
            }
            let mut j = i;
            while j + 1 < WEEK.len() && self.contains(WEEK[j + 1]) {
                j += 1;
            }
            if j - i >= 2 {
                parts.push(format!("{}-{}", day_name(WEEK[i]), day_name(WEEK[j])));
            } else {
                for d in &WEEK[i..=j] {
                    parts.push(day_name(*d).to_string());
                }
            }
            i = j + 1;
        }
        f.write_str(&parts.join(","))
    }
}

impl Serialize for DaySet {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Arena index of a market inside a snapshot. Only the snapshot mints these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarketId(pub(crate) usize);

impl MarketId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Inclusive date window for which a market's data is complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl Coverage {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    pub(crate) fn check(&self, fin_id: &str, date: NaiveDate) -> Result<(), CalendarError> {
        if self.contains(date) {
            return Ok(());
        }
        Err(CalendarError::Coverage {
            fin_id: fin_id.to_string(),
            requested: date,
            first: self.first,
            last: self.last,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Market {
    pub id: MarketId,
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
    pub replaced_by: Option<MarketId>,
    pub coverage: Coverage,
}

impl Market {
    /// Leading component of the FinID ("US" for "US.NYSE").
    pub fn country_code(&self) -> &str {
        self.fin_id.split('.').next().unwrap_or(&self.fin_id)
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketState {
    Open,
    Closed,
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketState::Open => f.write_str("Open"),
            MarketState::Closed => f.write_str("Closed"),
        }
    }
}

/// A concrete, dated interval produced by applying a rule to a date.
/// Half-open: `start <= t < end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub phase_type: String,
    pub phase_name: Option<String>,
    pub phase_memo: Option<String>,
    pub schedule_group: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Phase {
    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        self.start <= *instant && *instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub fin_id: String,
    pub status: MarketState,
    pub reason: Option<String>,
    pub until: DateTime<FixedOffset>,
    pub next_bell: DateTime<FixedOffset>,
    pub phase: Option<Phase>,
}

// ---------------------------------------------------------------------------
// Phase-type catalog
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseType {
    pub name: String,
    pub status: MarketState,
    pub settlement: bool,
    pub closing_price: bool,
}

/// Maps phase-type names to their market state. Unknown names are Closed.
#[derive(Clone, Debug)]
pub struct PhaseTypeCatalog {
    types: HashMap<String, PhaseType>,
}

impl PhaseTypeCatalog {
    pub fn new(types: impl IntoIterator<Item = PhaseType>) -> Self {
        Self {
            types: types.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PhaseType> {
        self.types.get(name)
    }

    pub fn state_of(&self, name: &str) -> MarketState {
        self.get(name).map(|t| t.status).unwrap_or(MarketState::Closed)
    }

    pub fn is_primary(&self, name: &str) -> bool {
        self.state_of(name) == MarketState::Open
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for PhaseTypeCatalog {
    fn default() -> Self {
        Self::new([PhaseType {
            name: PRIMARY_TRADING_SESSION.to_string(),
            status: MarketState::Open,
            settlement: true,
            closing_price: true,
        }])
    }
}
