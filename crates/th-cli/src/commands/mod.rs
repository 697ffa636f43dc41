//! Command handlers for `th`.
//!
//! Every handler resolves its market through the snapshot (following
//! replacement chains unless told otherwise) and prints either JSON or the
//! configured display template, one entity per line.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use th_calendar::format::{render, DisplayConfig, Render};
use th_calendar::{parse_instant, parse_range, ScheduleRuleInfo, Snapshot};
use tracing::debug;

pub struct Output<'a> {
    json: bool,
    display: &'a DisplayConfig,
}

impl<'a> Output<'a> {
    pub fn new(json: bool, display: &'a DisplayConfig) -> Self {
        Self { json, display }
    }

    fn list<T: Render + Serialize>(&self, items: &[&T]) -> Result<()> {
        if self.json {
            return print_json(&items);
        }
        for item in items {
            println!("{}", render(*item, self.display));
        }
        Ok(())
    }

    fn one<T: Render + Serialize>(&self, item: &T) -> Result<()> {
        if self.json {
            return print_json(item);
        }
        println!("{}", render(item, self.display));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{s}");
    Ok(())
}

pub fn markets(snapshot: &Snapshot, out: &Output<'_>, pattern: Option<&str>) -> Result<()> {
    let markets = snapshot.list_markets(pattern);
    if out.json {
        let infos: Vec<_> = markets.iter().map(|m| snapshot.market_info(m)).collect();
        return print_json(&infos);
    }
    for m in markets {
        println!("{}", render(m, out.display));
    }
    Ok(())
}

pub fn market(snapshot: &Snapshot, out: &Output<'_>, id: &str, follow: bool) -> Result<()> {
    let resolved = snapshot.resolve(id, follow)?;
    if out.json {
        return print_json(&serde_json::json!({
            "requested": resolved.requested.fin_id,
            "replaced": resolved.was_replaced(),
            "market": snapshot.market_info(resolved.market),
        }));
    }
    if resolved.was_replaced() {
        println!(
            "{} was replaced by {}",
            resolved.requested.fin_id, resolved.market.fin_id
        );
    }
    println!("{}", render(resolved.market, out.display));
    Ok(())
}

pub fn schedules(snapshot: &Snapshot, out: &Output<'_>, id: &str) -> Result<()> {
    let market = snapshot.resolve(id, true)?.market;
    let rules = snapshot.schedules(market.id);
    if out.json {
        let infos: Vec<ScheduleRuleInfo> = rules.into_iter().map(ScheduleRuleInfo::from).collect();
        return print_json(&infos);
    }
    for rule in rules {
        println!("{}", render(rule, out.display));
    }
    Ok(())
}

pub fn holidays(snapshot: &Snapshot, out: &Output<'_>, id: &str, start: &str, end: &str) -> Result<()> {
    let (start, end) = parse_range(start, end)?;
    let market = snapshot.resolve(id, true)?.market;
    out.list(&snapshot.holidays(market.id, start, end)?)
}

pub fn phases(snapshot: &Snapshot, out: &Output<'_>, id: &str, start: &str, end: &str) -> Result<()> {
    let (start, end) = parse_range(start, end)?;
    let market = snapshot.resolve(id, true)?.market;
    let phases = snapshot.expand(market.id, start, end)?;
    debug!(fin_id = %market.fin_id, phases = phases.len(), "expanded");
    out.list(&phases.iter().collect::<Vec<_>>())
}

pub fn status(snapshot: &Snapshot, out: &Output<'_>, id: &str, at: Option<&str>) -> Result<()> {
    let instant = match at {
        Some(raw) => parse_instant(raw)?,
        None => now(),
    };
    let market = snapshot.resolve(id, true)?.market;
    out.one(&snapshot.status_at(market.id, instant)?)
}

pub fn currencies(snapshot: &Snapshot, out: &Output<'_>) -> Result<()> {
    out.list(&snapshot.currencies())
}

pub fn currency_holidays(
    snapshot: &Snapshot,
    out: &Output<'_>,
    code: &str,
    start: &str,
    end: &str,
) -> Result<()> {
    let (start, end) = parse_range(start, end)?;
    out.list(&snapshot.currency_holidays(code, start, end)?)
}

/// The only wall-clock read in the workspace.
fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}
