//! Point-in-time market status.

use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::trace;

use crate::error::CalendarError;
use crate::expander::PhaseExpander;
use crate::holidays::GroupSelector;
use crate::snapshot::Snapshot;
use crate::types::{add_days, Market, MarketId, MarketState, MarketStatus, Phase, MAX_OFFSET_DAYS};

/// Days expanded after the instant's local date before searching onward.
const LOOKAHEAD_DAYS: i64 = 3;
/// Width of each forward-search step.
const SEARCH_STEP_DAYS: i64 = 7;

pub struct StatusResolver<'s> {
    snapshot: &'s Snapshot,
}

impl<'s> StatusResolver<'s> {
    pub fn new(snapshot: &'s Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn status_at(
        &self,
        market: MarketId,
        instant: DateTime<FixedOffset>,
    ) -> Result<MarketStatus, CalendarError> {
        let snap = self.snapshot;
        let m = snap.registry().get(market);
        let date = instant.with_timezone(&m.timezone).date_naive();
        m.coverage.check(&m.fin_id, date)?;

        let from = add_days(date, -i64::from(MAX_OFFSET_DAYS)).max(m.coverage.first);
        let to = add_days(date, LOOKAHEAD_DAYS).min(m.coverage.last);
        let expander = PhaseExpander::new(snap);
        let phases = expander.expand_unchecked(m, from, to)?;
        let catalog = snap.phase_types();

        let covering: Vec<&Phase> = phases.iter().filter(|p| p.contains(&instant)).collect();
        let current = covering
            .iter()
            .find(|p| catalog.is_primary(&p.phase_type))
            .or_else(|| covering.first())
            .map(|p| (*p).clone());

        let later: Vec<&Phase> = phases.iter().filter(|p| p.start > instant).collect();
        let until = match &current {
            Some(cur) => later
                .iter()
                .filter(|p| p.start < cur.end)
                .map(|p| p.start)
                .min()
                .unwrap_or(cur.end),
            None => match later.first().map(|p| p.start) {
                Some(s) => s,
                None => self.search_forward(m, instant, to, |_| true)?,
            },
        };

        let next_bell = match later
            .iter()
            .filter(|p| catalog.is_primary(&p.phase_type))
            .map(|p| p.start)
            .min()
        {
            Some(s) => s,
            None => self.search_forward(m, instant, to, |p| catalog.is_primary(&p.phase_type))?,
        };

        let status = current
            .as_ref()
            .map(|p| catalog.state_of(&p.phase_type))
            .unwrap_or(MarketState::Closed);
        let reason = self.reason(market, date, current.as_ref());

        trace!(fin_id = %m.fin_id, %instant, %status, "status resolved");
        Ok(MarketStatus {
            fin_id: m.fin_id.clone(),
            status,
            reason,
            until,
            next_bell,
            phase: current,
        })
    }

    /// Earliest phase start after `instant` satisfying `pred`, scanning from
    /// the day after `after` one week at a time up to coverage end.
    fn search_forward(
        &self,
        market: &Market,
        instant: DateTime<FixedOffset>,
        after: NaiveDate,
        pred: impl Fn(&Phase) -> bool,
    ) -> Result<DateTime<FixedOffset>, CalendarError> {
        let expander = PhaseExpander::new(self.snapshot);
        let mut from = add_days(after, 1);
        loop {
            market.coverage.check(&market.fin_id, from)?;
            let to = add_days(from, SEARCH_STEP_DAYS - 1).min(market.coverage.last);
            let phases = expander.expand_unchecked(market, from, to)?;
            if let Some(p) = phases.iter().find(|p| p.start > instant && pred(p)) {
                return Ok(p.start);
            }
            if to >= market.coverage.last {
                return Err(CalendarError::Coverage {
                    fin_id: market.fin_id.clone(),
                    requested: add_days(to, 1),
                    first: market.coverage.first,
                    last: market.coverage.last,
                });
            }
            from = add_days(to, 1);
        }
    }

    fn reason(&self, market: MarketId, date: NaiveDate, current: Option<&Phase>) -> Option<String> {
        let holiday = self.snapshot.holidays_index().entry(market, date);
        let mut text = String::new();
        if let Some(h) = holiday {
            text.push_str(&h.holiday_name);
        }
        if let Some(cur) = current {
            text.push_str(" - ");
            text.push_str(&cur.phase_type);
            if let Some(GroupSelector::Override(group)) = holiday.map(|h| h.selector()) {
                text.push_str(&format!(" ({group})"));
            }
        }
        let trimmed = text.trim_matches(|c: char| c == ' ' || c == '-');
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
