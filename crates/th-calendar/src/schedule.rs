//! Schedule rules, grouped per market and schedule group.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::CalendarError;
use crate::rows::ScheduleRow;
use crate::season::{SeasonBoundary, SeasonWindow};
use crate::types::{DaySet, MarketId, MAX_OFFSET_DAYS};

/// Advisory bounds for randomized open/close times. Not used for expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RandomBounds {
    pub min_start: Option<NaiveTime>,
    pub max_start: Option<NaiveTime>,
    pub min_end: Option<NaiveTime>,
    pub max_end: Option<NaiveTime>,
}

impl RandomBounds {
    pub fn is_empty(&self) -> bool {
        self.min_start.is_none()
            && self.max_start.is_none()
            && self.min_end.is_none()
            && self.max_end.is_none()
    }
}

/// A validated recurring phase template.
#[derive(Clone, Debug)]
pub struct ScheduleRule {
    /// Position in the input; final tie-break when ordering phases.
    pub(crate) seq: usize,
    pub schedule_group: String,
    pub schedule_group_memo: Option<String>,
    pub timezone: Tz,
    pub phase_type: String,
    pub phase_name: Option<String>,
    pub phase_memo: Option<String>,
    pub days: DaySet,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub offset_days: u32,
    pub random_bounds: RandomBounds,
    pub in_force_start: Option<NaiveDate>,
    pub in_force_end: Option<NaiveDate>,
    pub season: Option<SeasonWindow>,
}

impl ScheduleRule {
    pub fn has_season(&self) -> bool {
        self.season.is_some()
    }

    /// Inclusive on both bounds; an absent bound is open.
    pub fn is_in_force(&self, date: NaiveDate) -> bool {
        self.in_force_start.map_or(true, |s| s <= date)
            && self.in_force_end.map_or(true, |e| date <= e)
    }

    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.days.contains(date.weekday())
    }

    /// Wall-clock length assuming no DST transition inside the phase.
    pub fn nominal_secs(&self) -> i64 {
        nominal_secs(self.start, self.end, i64::from(self.offset_days))
    }
}

fn nominal_secs(start: NaiveTime, end: NaiveTime, offset_days: i64) -> i64 {
    i64::from(end.num_seconds_from_midnight()) - i64::from(start.num_seconds_from_midnight())
        + offset_days * 86_400
}

/// Validates one row against its market's timezone.
pub(crate) fn validate_rule(
    row: ScheduleRow,
    seq: usize,
    market_tz: Tz,
) -> Result<ScheduleRule, CalendarError> {
    let ctx = || format!("{} {} '{}'", row.fin_id, row.schedule_group, row.phase_type);

    if row.schedule_group.trim().is_empty() {
        return Err(CalendarError::integrity(format!(
            "{}: empty schedule group",
            ctx()
        )));
    }
    if row.timezone != market_tz {
        return Err(CalendarError::integrity(format!(
            "{}: rule timezone {} differs from market timezone {}",
            ctx(),
            row.timezone.name(),
            market_tz.name()
        )));
    }
    if row.days.is_empty() {
        return Err(CalendarError::integrity(format!("{}: empty days", ctx())));
    }
    if row.offset_days < 0 || row.offset_days > i64::from(MAX_OFFSET_DAYS) {
        return Err(CalendarError::integrity(format!(
            "{}: offset_days {} outside 0..={MAX_OFFSET_DAYS}",
            ctx(),
            row.offset_days
        )));
    }
    let secs = nominal_secs(row.start, row.end, row.offset_days);
    // start == end is accepted for any phase type: auction rows are
    // instants, and the phase-type catalog is not known at this point.
    if secs < 0 {
        return Err(CalendarError::integrity(format!(
            "{}: end {} is before start {}",
            ctx(),
            row.end,
            row.start
        )));
    }
    if let Some(declared) = row.duration_secs {
        if declared != secs {
            return Err(CalendarError::integrity(format!(
                "{}: declared duration {declared}s does not match {secs}s",
                ctx()
            )));
        }
    }
    if let (Some(s), Some(e)) = (row.in_force_start_date, row.in_force_end_date) {
        if s > e {
            return Err(CalendarError::integrity(format!(
                "{}: in-force window {s}..{e} is inverted",
                ctx()
            )));
        }
    }

    let season = match (nonempty(row.season_start), nonempty(row.season_end)) {
        (Some(s), Some(e)) => Some(SeasonWindow {
            start: SeasonBoundary::parse(&s)?,
            end: SeasonBoundary::parse(&e)?,
        }),
        (None, None) => None,
        _ => {
            return Err(CalendarError::integrity(format!(
                "{}: season needs both start and end",
                ctx()
            )))
        }
    };

    Ok(ScheduleRule {
        seq,
        schedule_group: row.schedule_group,
        schedule_group_memo: row.schedule_group_memo,
        timezone: row.timezone,
        phase_type: row.phase_type,
        phase_name: row.phase_name,
        phase_memo: row.phase_memo,
        days: row.days,
        start: row.start,
        end: row.end,
        offset_days: row.offset_days as u32,
        random_bounds: RandomBounds {
            min_start: row.min_start,
            max_start: row.max_start,
            min_end: row.min_end,
            max_end: row.max_end,
        },
        in_force_start: row.in_force_start_date,
        in_force_end: row.in_force_end_date,
        season,
    })
}

fn nonempty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Rules of one schedule group, in definition order.
#[derive(Clone, Debug)]
pub struct ScheduleGroup {
    pub name: String,
    pub memo: Option<String>,
    pub rules: Vec<ScheduleRule>,
}

/// All rules of a snapshot, keyed by market then group (case-insensitive).
#[derive(Clone, Debug, Default)]
pub struct ScheduleIndex {
    by_market: HashMap<MarketId, Vec<ScheduleGroup>>,
}

impl ScheduleIndex {
    pub(crate) fn insert(&mut self, market: MarketId, rule: ScheduleRule) {
        let groups = self.by_market.entry(market).or_default();
        let key = rule.schedule_group.to_lowercase();
        match groups.iter_mut().find(|g| g.name.to_lowercase() == key) {
            Some(g) => {
                if g.memo.is_none() {
                    g.memo = rule.schedule_group_memo.clone();
                }
                g.rules.push(rule);
            }
            None => groups.push(ScheduleGroup {
                name: rule.schedule_group.clone(),
                memo: rule.schedule_group_memo.clone(),
                rules: vec![rule],
            }),
        }
    }

    pub fn groups(&self, market: MarketId) -> &[ScheduleGroup] {
        self.by_market.get(&market).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group(&self, market: MarketId, name: &str) -> Option<&ScheduleGroup> {
        let key = name.to_lowercase();
        self.groups(market)
            .iter()
            .find(|g| g.name.to_lowercase() == key)
    }

    /// Every rule of a market, all groups, in definition order.
    pub fn rules(&self, market: MarketId) -> Vec<&ScheduleRule> {
        let mut all: Vec<&ScheduleRule> = self
            .groups(market)
            .iter()
            .flat_map(|g| g.rules.iter())
            .collect();
        all.sort_by_key(|r| r.seq);
        all
    }

    pub fn rule_count(&self) -> usize {
        self.by_market
            .values()
            .flat_map(|gs| gs.iter())
            .map(|g| g.rules.len())
            .sum()
    }
}
