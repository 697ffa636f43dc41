//! Generic CSV table reading and cell parsing.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use th_calendar::DaySet;

use crate::error::StoreError;

/// Canonical header form: lower case, quotes stripped, `FinID` spelled
/// `fin_id`, every other non-alphanumeric character replaced by `_`.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw
        .trim_start_matches('\u{feff}')
        .trim()
        .replace('"', "")
        .to_ascii_lowercase()
        .replace("finid", "fin_id");
    lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Reads every data row of `path`, pairing each with its 1-based line
/// number (the header is line 1).
pub(crate) fn read_table<T: DeserializeOwned>(
    path: &Path,
    file: &'static str,
) -> Result<Vec<(usize, T)>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_path(path)
        .map_err(|e| csv_error(file, e))?;

    let headers: csv::StringRecord = rdr
        .headers()
        .map_err(|e| csv_error(file, e))?
        .iter()
        .map(normalize_header)
        .collect();
    rdr.set_headers(headers);

    let mut out = Vec::new();
    for (i, rec) in rdr.deserialize::<T>().enumerate() {
        let rec = rec.map_err(|e| csv_error(file, e))?;
        out.push((i + 2, rec));
    }
    Ok(out)
}

fn csv_error(file: &str, e: csv::Error) -> StoreError {
    if let csv::ErrorKind::Io(io) = e.kind() {
        return StoreError::Io(format!("{file}: {io}"));
    }
    StoreError::Csv {
        file: file.to_string(),
        message: e.to_string(),
    }
}

/// Position of a cell, used to attribute parse failures.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cell {
    pub file: &'static str,
    pub row: usize,
}

impl Cell {
    pub fn new(file: &'static str, row: usize) -> Self {
        Self { file, row }
    }

    fn fail(&self, field: &'static str, raw: &str) -> StoreError {
        StoreError::ParseField {
            file: self.file.to_string(),
            row: self.row,
            field,
            raw: raw.to_string(),
        }
    }

    pub fn text(&self, field: &'static str, value: Option<String>) -> Result<String, StoreError> {
        present(value).ok_or_else(|| self.fail(field, ""))
    }

    pub fn date(
        &self,
        field: &'static str,
        value: Option<String>,
    ) -> Result<Option<NaiveDate>, StoreError> {
        match present(value) {
            None => Ok(None),
            Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| self.fail(field, &v)),
        }
    }

    pub fn required_date(
        &self,
        field: &'static str,
        value: Option<String>,
    ) -> Result<NaiveDate, StoreError> {
        self.date(field, value)?.ok_or_else(|| self.fail(field, ""))
    }

    pub fn time(
        &self,
        field: &'static str,
        value: Option<String>,
    ) -> Result<Option<NaiveTime>, StoreError> {
        match present(value) {
            None => Ok(None),
            Some(v) => NaiveTime::parse_from_str(&v, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(&v, "%H:%M"))
                .map(Some)
                .map_err(|_| self.fail(field, &v)),
        }
    }

    pub fn required_time(
        &self,
        field: &'static str,
        value: Option<String>,
    ) -> Result<NaiveTime, StoreError> {
        self.time(field, value)?.ok_or_else(|| self.fail(field, ""))
    }

    pub fn tz(&self, field: &'static str, value: Option<String>) -> Result<Option<Tz>, StoreError> {
        match present(value) {
            None => Ok(None),
            Some(v) => v.parse::<Tz>().map(Some).map_err(|_| self.fail(field, &v)),
        }
    }

    pub fn required_tz(&self, field: &'static str, value: Option<String>) -> Result<Tz, StoreError> {
        self.tz(field, value)?.ok_or_else(|| self.fail(field, ""))
    }

    /// Missing weekday cells mean "no days".
    pub fn days(&self, field: &'static str, value: Option<String>) -> Result<DaySet, StoreError> {
        match present(value) {
            None => Ok(DaySet::EMPTY),
            Some(v) => DaySet::parse(&v).map_err(|_| self.fail(field, &v)),
        }
    }

    pub fn int(&self, field: &'static str, value: Option<String>) -> Result<Option<i64>, StoreError> {
        match present(value) {
            None => Ok(None),
            Some(v) => v.parse::<i64>().map(Some).map_err(|_| self.fail(field, &v)),
        }
    }

    /// Seconds, either as an integer or as `H:MM:SS`.
    pub fn duration(
        &self,
        field: &'static str,
        value: Option<String>,
    ) -> Result<Option<i64>, StoreError> {
        match present(value) {
            None => Ok(None),
            Some(v) => parse_duration(&v).map(Some).ok_or_else(|| self.fail(field, &v)),
        }
    }

    pub fn flag(&self, field: &'static str, value: Option<String>) -> Result<bool, StoreError> {
        match present(value) {
            None => Ok(false),
            Some(v) => parse_flag(&v).ok_or_else(|| self.fail(field, &v)),
        }
    }

    /// `OBS` marks an observed holiday; any yes/no spelling is accepted too.
    pub fn observed(&self, field: &'static str, value: Option<String>) -> Result<bool, StoreError> {
        match present(value) {
            Some(v) if v.eq_ignore_ascii_case("obs") => Ok(true),
            other => self.flag(field, other),
        }
    }
}

/// Empty and whitespace-only cells are absent values.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_duration(v: &str) -> Option<i64> {
    if let Ok(secs) = v.parse::<i64>() {
        return Some(secs);
    }
    let parts: Vec<&str> = v.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let h = parts[0].parse::<i64>().ok()?;
    let m = parts[1].parse::<i64>().ok()?;
    let s = parts[2].parse::<i64>().ok()?;
    if h < 0 || !(0..60).contains(&m) || !(0..60).contains(&s) {
        return None;
    }
    Some(h * 3600 + m * 60 + s)
}
