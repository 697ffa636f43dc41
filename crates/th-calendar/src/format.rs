//! Template rendering for human-readable output.
//!
//! Templates use `{field}` placeholders; `{{` and `}}` are literal braces and
//! unknown fields are left as written. The config is always passed in.

use serde::{Deserialize, Serialize};

use crate::holidays::{Currency, CurrencyHoliday, HolidayEntry};
use crate::schedule::ScheduleRule;
use crate::types::{Market, MarketStatus, Phase};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub market: String,
    pub phase: String,
    pub status: String,
    pub holiday: String,
    pub schedule: String,
    pub currency: String,
    pub currency_holiday: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            market: "{fin_id}  {exchange_name} ({market_name})  {timezone}".to_string(),
            phase: "{start} - {end}  {phase_type}{phase_name_suffix}".to_string(),
            status: "{fin_id}  {status}  until {until}  next bell {next_bell}{reason_suffix}"
                .to_string(),
            holiday: "{date}  {holiday_name}  {schedule}".to_string(),
            schedule: "{schedule_group}  {days}  {start} - {end}{offset_suffix}  {phase_type}"
                .to_string(),
            currency: "{code}  {name}".to_string(),
            currency_holiday: "{date}  {holiday_name}".to_string(),
        }
    }
}

/// An entity that can fill template placeholders.
pub trait Render {
    fn template(config: &DisplayConfig) -> &str;
    fn field(&self, name: &str) -> Option<String>;
}

pub fn render<T: Render>(item: &T, config: &DisplayConfig) -> String {
    fill(T::template(config), |name| item.field(name))
}

fn fill(template: &str, field: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(close) = tail.find('}') {
                let name = &tail[1..close];
                match field(name) {
                    Some(v) => out.push_str(&v),
                    None => out.push_str(&tail[..=close]),
                }
                rest = &tail[close + 1..];
                continue;
            }
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

fn opt(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

impl Render for Market {
    fn template(config: &DisplayConfig) -> &str {
        &config.market
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "fin_id" => self.fin_id.clone(),
            "mic" => opt(&self.mic),
            "exchange_name" => self.exchange_name.clone(),
            "market_name" => self.market_name.clone(),
            "security_group" => opt(&self.security_group),
            "acronym" => opt(&self.acronym),
            "asset_type" => opt(&self.asset_type),
            "memo" => opt(&self.memo),
            "timezone" => self.timezone.name().to_string(),
            "weekend" => self.weekend.to_string(),
            "country_code" => self.country_code().to_string(),
            "first_available_date" => self.coverage.first.to_string(),
            "last_available_date" => self.coverage.last.to_string(),
            "permanently_closed" => self
                .permanently_closed
                .map(|d| d.to_string())
                .unwrap_or_default(),
            _ => return None,
        })
    }
}

impl Render for Phase {
    fn template(config: &DisplayConfig) -> &str {
        &config.phase
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "start" => self.start.to_rfc3339(),
            "end" => self.end.to_rfc3339(),
            "phase_type" => self.phase_type.clone(),
            "phase_name" => opt(&self.phase_name),
            "phase_name_suffix" => self
                .phase_name
                .as_ref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default(),
            "phase_memo" => opt(&self.phase_memo),
            "schedule_group" => self.schedule_group.clone(),
            _ => return None,
        })
    }
}

impl Render for MarketStatus {
    fn template(config: &DisplayConfig) -> &str {
        &config.status
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "fin_id" => self.fin_id.clone(),
            "status" => self.status.to_string(),
            "reason" => opt(&self.reason),
            "reason_suffix" => self
                .reason
                .as_ref()
                .map(|r| format!("  ({r})"))
                .unwrap_or_default(),
            "until" => self.until.to_rfc3339(),
            "next_bell" => self.next_bell.to_rfc3339(),
            "phase_type" => self
                .phase
                .as_ref()
                .map(|p| p.phase_type.clone())
                .unwrap_or_default(),
            _ => return None,
        })
    }
}

impl Render for HolidayEntry {
    fn template(config: &DisplayConfig) -> &str {
        &config.holiday
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "fin_id" => self.fin_id.clone(),
            "date" => self.date.to_string(),
            "holiday_name" => self.holiday_name.clone(),
            "schedule" => match (&self.schedule_group, self.closed) {
                (_, true) => "Closed".to_string(),
                (Some(g), false) => g.clone(),
                (None, false) => "Regular".to_string(),
            },
            "settlement" => self.settlement.to_string(),
            "observed" => self.observed.to_string(),
            "memo" => opt(&self.memo),
            _ => return None,
        })
    }
}

impl Render for ScheduleRule {
    fn template(config: &DisplayConfig) -> &str {
        &config.schedule
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "schedule_group" => self.schedule_group.clone(),
            "days" => self.days.to_string(),
            "start" => self.start.format("%H:%M:%S").to_string(),
            "end" => self.end.format("%H:%M:%S").to_string(),
            "offset_days" => self.offset_days.to_string(),
            "offset_suffix" => match self.offset_days {
                0 => String::new(),
                n => format!(" +{n}"),
            },
            "phase_type" => self.phase_type.clone(),
            "phase_name" => opt(&self.phase_name),
            "phase_memo" => opt(&self.phase_memo),
            "timezone" => self.timezone.name().to_string(),
            _ => return None,
        })
    }
}

impl Render for Currency {
    fn template(config: &DisplayConfig) -> &str {
        &config.currency
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "code" => self.code.clone(),
            "name" => self.name.clone(),
            "country_code" => opt(&self.country_code),
            "central_bank" => opt(&self.central_bank),
            "financial_capital" => opt(&self.financial_capital),
            "financial_capital_timezone" => self
                .financial_capital_timezone
                .map(|tz| tz.name().to_string())
                .unwrap_or_default(),
            "weekend" => self.weekend.to_string(),
            _ => return None,
        })
    }
}

impl Render for CurrencyHoliday {
    fn template(config: &DisplayConfig) -> &str {
        &config.currency_holiday
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "currency_code" => self.currency_code.clone(),
            "date" => self.date.to_string(),
            "holiday_name" => self.holiday_name.clone(),
            "settlement" => self.settlement.to_string(),
            "observed" => self.observed.to_string(),
            "memo" => opt(&self.memo),
            _ => return None,
        })
    }
}
