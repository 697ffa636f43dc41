//! Serializable projections of registry and schedule types.
//!
//! `Market` and `ScheduleRule` hold arena ids and `Tz` values; these views
//! flatten them to names for JSON output.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::schedule::{RandomBounds, ScheduleRule};
use crate::snapshot::Snapshot;
use crate::types::{DaySet, Market};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarketInfo {
    pub fin_id: String,
    pub mic: Option<String>,
    pub exchange_name: String,
    pub market_name: String,
    pub security_group: Option<String>,
    pub acronym: Option<String>,
    pub asset_type: Option<String>,
    pub memo: Option<String>,
    pub country_code: String,
    pub timezone: String,
    pub weekend: DaySet,
    pub permanently_closed: Option<NaiveDate>,
    /// FinID of the direct successor, if retired.
    pub replaced_by: Option<String>,
    pub first_available_date: NaiveDate,
    pub last_available_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleRuleInfo {
    pub schedule_group: String,
    pub schedule_group_memo: Option<String>,
    pub timezone: String,
    pub phase_type: String,
    pub phase_name: Option<String>,
    pub phase_memo: Option<String>,
    pub days: DaySet,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub offset_days: u32,
    pub random_bounds: RandomBounds,
    pub in_force_start_date: Option<NaiveDate>,
    pub in_force_end_date: Option<NaiveDate>,
    pub season_start: Option<String>,
    pub season_end: Option<String>,
}

impl Snapshot {
    pub fn market_info(&self, market: &Market) -> MarketInfo {
        MarketInfo {
            fin_id: market.fin_id.clone(),
            mic: market.mic.clone(),
            exchange_name: market.exchange_name.clone(),
            market_name: market.market_name.clone(),
            security_group: market.security_group.clone(),
            acronym: market.acronym.clone(),
            asset_type: market.asset_type.clone(),
            memo: market.memo.clone(),
            country_code: market.country_code().to_string(),
            timezone: market.timezone.name().to_string(),
            weekend: market.weekend,
            permanently_closed: market.permanently_closed,
            replaced_by: market.replaced_by.map(|id| self.market(id).fin_id.clone()),
            first_available_date: market.coverage.first,
            last_available_date: market.coverage.last,
        }
    }
}

impl From<&ScheduleRule> for ScheduleRuleInfo {
    fn from(rule: &ScheduleRule) -> Self {
        Self {
            schedule_group: rule.schedule_group.clone(),
            schedule_group_memo: rule.schedule_group_memo.clone(),
            timezone: rule.timezone.name().to_string(),
            phase_type: rule.phase_type.clone(),
            phase_name: rule.phase_name.clone(),
            phase_memo: rule.phase_memo.clone(),
            days: rule.days,
            start: rule.start,
            end: rule.end,
            offset_days: rule.offset_days,
            random_bounds: rule.random_bounds,
            in_force_start_date: rule.in_force_start,
            in_force_end_date: rule.in_force_end,
            season_start: rule.season.as_ref().map(|s| s.start.to_string()),
            season_end: rule.season.as_ref().map(|s| s.end.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MarketRow, Snapshot};
    use chrono_tz::America::Argentina::Buenos_Aires;

    #[test]
    fn market_info_names_successor() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let mut old = MarketRow::new("AR.BCBA", Buenos_Aires);
        old.replaced_by = Some("AR.BYMA".to_string());
        old.first_available_date = Some(d(2024, 1, 1));
        old.last_available_date = Some(d(2024, 12, 31));
        let mut new = MarketRow::new("AR.BYMA", Buenos_Aires);
        new.first_available_date = Some(d(2024, 1, 1));
        new.last_available_date = Some(d(2024, 12, 31));

        let s = Snapshot::builder().market(old).market(new).build().unwrap();
        let r = s.resolve("AR.BCBA", false).unwrap();
        let info = s.market_info(r.market);
        assert_eq!(info.replaced_by.as_deref(), Some("AR.BYMA"));
        assert_eq!(info.timezone, "America/Argentina/Buenos_Aires");
        assert_eq!(info.country_code, "AR");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["first_available_date"], "2024-01-01");
    }
}
