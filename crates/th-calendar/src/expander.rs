//! Phase expansion: schedule rules + holidays + seasons -> dated phases.
//!
//! For every date in the range the expander picks the active schedule group,
//! keeps the group's rules that are in force, in season and scheduled for the
//! weekday, and anchors each surviving rule on that date. A phase belongs to
//! the date its local start falls on; overnight phases that started before
//! the range are not part of it.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone,
};
use chrono_tz::Tz;
use tracing::trace;

use crate::error::CalendarError;
use crate::holidays::GroupSelector;
use crate::schedule::ScheduleRule;
use crate::snapshot::Snapshot;
use crate::types::{add_days, Market, MarketId, Phase};

pub struct PhaseExpander<'s> {
    snapshot: &'s Snapshot,
}

impl<'s> PhaseExpander<'s> {
    pub fn new(snapshot: &'s Snapshot) -> Self {
        Self { snapshot }
    }

    /// Ordered phases whose local start date lies in `[start, end]`.
    ///
    /// Both dates must be inside the market's coverage.
    pub fn expand(
        &self,
        market: MarketId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Phase>, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        let m = self.snapshot.registry().get(market);
        m.coverage.check(&m.fin_id, start)?;
        m.coverage.check(&m.fin_id, end)?;
        self.expand_unchecked(m, start, end)
    }

    /// Same as [`Self::expand`] without the coverage check. Callers clip the
    /// range themselves.
    pub(crate) fn expand_unchecked(
        &self,
        market: &Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Phase>, CalendarError> {
        let mut out: Vec<(Phase, usize)> = Vec::new();
        let mut date = start;
        while date <= end {
            for rule in self.rules_for_date(market.id, date)? {
                out.push((materialize(market, rule, date)?, rule.seq));
            }
            if date == NaiveDate::MAX {
                break;
            }
            date = add_days(date, 1);
        }

        out.sort_by(|(a, sa), (b, sb)| {
            a.start
                .cmp(&b.start)
                .then(a.end.cmp(&b.end))
                .then(sa.cmp(sb))
        });
        trace!(
            fin_id = %market.fin_id,
            %start,
            %end,
            phases = out.len(),
            "expanded"
        );
        Ok(out.into_iter().map(|(p, _)| p).collect())
    }

    /// Rules that produce a phase starting on `date`, in definition order.
    pub fn rules_for_date(
        &self,
        market: MarketId,
        date: NaiveDate,
    ) -> Result<Vec<&'s ScheduleRule>, CalendarError> {
        let snap = self.snapshot;
        let selector = snap.holidays_index().active_group(market, date);
        let Some(group_name) = selector.group_name() else {
            return Ok(Vec::new());
        };
        let Some(group) = snap.schedule_index().group(market, group_name) else {
            return Ok(Vec::new());
        };

        let mut eligible = Vec::with_capacity(group.rules.len());
        for rule in &group.rules {
            if snap.seasons().applies(rule, date)? {
                eligible.push(rule);
            }
        }

        let weekday = date.weekday();
        let found: Vec<&ScheduleRule> = eligible
            .iter()
            .copied()
            .filter(|r| r.days.contains(weekday))
            .collect();
        if !found.is_empty() || !self.falls_back(market, date, &selector) {
            return Ok(found);
        }

        // Make-up trading day: borrow the nearest earlier weekday's rules.
        let mut day = weekday.pred();
        while day != weekday {
            let borrowed: Vec<&ScheduleRule> = eligible
                .iter()
                .copied()
                .filter(|r| r.days.contains(day))
                .collect();
            if !borrowed.is_empty() {
                trace!(%date, borrowed_from = ?day, "regular weekday fallback");
                return Ok(borrowed);
            }
            day = day.pred();
        }
        Ok(Vec::new())
    }

    fn falls_back(&self, market: MarketId, date: NaiveDate, selector: &GroupSelector) -> bool {
        *selector == GroupSelector::Regular
            && self.snapshot.holidays_index().entry(market, date).is_some()
    }
}

/// Anchors `rule` on `date` in the market's timezone.
///
/// A start inside a spring-forward gap is normally shifted by the gap's
/// length. When that would put it at or past the end, the phase opens at the
/// first instant after the gap instead.
pub(crate) fn materialize(
    market: &Market,
    rule: &ScheduleRule,
    date: NaiveDate,
) -> Result<Phase, CalendarError> {
    let tz = market.timezone;
    let end_date = add_days(date, i64::from(rule.offset_days));
    let local_start = date.and_time(rule.start);
    let end = localize(&tz, end_date.and_time(rule.end));
    let mut start = localize(&tz, local_start);
    if start >= end && rule.nominal_secs() > 0 {
        start = gap_end(&tz, local_start).unwrap_or(start);
    }
    if end < start || (end == start && rule.nominal_secs() > 0) {
        return Err(CalendarError::integrity(format!(
            "{} rule '{}' on {date}: local times {} -> {} collapse across a DST change",
            market.fin_id, rule.phase_type, rule.start, rule.end
        )));
    }
    Ok(Phase {
        phase_type: rule.phase_type.clone(),
        phase_name: rule.phase_name.clone(),
        phase_memo: rule.phase_memo.clone(),
        schedule_group: rule.schedule_group.clone(),
        start,
        end,
    })
}

/// First instant after the gap containing `naive`, or `None` when `naive`
/// exists on the local clock.
fn gap_end(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    if tz.from_local_datetime(&naive).earliest().is_some() {
        return None;
    }
    let before = tz.offset_from_utc_datetime(&(naive - Duration::days(1))).fix();
    // Read with the old offset, `naive` is already past the transition; the
    // gap is never longer than a day, so the transition lies within it.
    let upper = naive - Duration::seconds(i64::from(before.local_minus_utc()));
    let at = |secs: i64| upper - Duration::seconds(secs);
    // Seconds back from `upper`: `lo` still has the new offset, `hi` the old.
    let (mut lo, mut hi) = (0_i64, 86_400_i64);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if tz.offset_from_utc_datetime(&at(mid)).fix() == before {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some(tz.from_utc_datetime(&at(lo)).fixed_offset())
}

/// Local wall-clock time to an offset-aware instant.
///
/// Ambiguous times (fall-back) take the earlier instant. Nonexistent times
/// (spring-forward gap) are read with the offset in force before the gap,
/// which lands them the gap's length later on the new offset.
pub(crate) fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.fixed_offset();
    }
    let before = tz
        .offset_from_utc_datetime(&(naive - Duration::days(1)))
        .fix();
    let utc = naive - Duration::seconds(i64::from(before.local_minus_utc()));
    tz.from_utc_datetime(&utc).fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use chrono_tz::America::New_York;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    #[test]
    fn localize_standard_and_daylight() {
        assert_eq!(
            localize(&New_York, at(2024, 1, 2, 9, 30)).to_rfc3339(),
            "2024-01-02T09:30:00-05:00"
        );
        assert_eq!(
            localize(&New_York, at(2024, 7, 2, 9, 30)).to_rfc3339(),
            "2024-07-02T09:30:00-04:00"
        );
    }

    #[test]
    fn localize_gap_moves_forward() {
        // 02:30 does not exist on 2024-03-10 in New York.
        assert_eq!(
            localize(&New_York, at(2024, 3, 10, 2, 30)).to_rfc3339(),
            "2024-03-10T03:30:00-04:00"
        );
    }

    #[test]
    fn gap_end_is_the_transition_instant() {
        assert_eq!(
            gap_end(&New_York, at(2024, 3, 10, 2, 30)).unwrap().to_rfc3339(),
            "2024-03-10T03:00:00-04:00"
        );
        assert!(gap_end(&New_York, at(2024, 3, 10, 3, 30)).is_none());
    }

    #[test]
    fn localize_ambiguous_takes_earlier() {
        // 01:30 happens twice on 2024-11-03 in New York.
        assert_eq!(
            localize(&New_York, at(2024, 11, 3, 1, 30)).to_rfc3339(),
            "2024-11-03T01:30:00-04:00"
        );
    }
}
