//! CSV export fixture: US.NYSE, the AR replacement chain and USD.
//!
//! Headers are written the way calendar exports spell them ("FinID",
//! "Holiday Name", ...) so loaders exercise header normalisation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

const MARKETS: &str = r#""FinID","Exchange Name","Market Name","Security Group","Timezone","Weekend Definition","MIC","Acronym","Asset Type","Memo","Permanently Closed","Replaced By","First Available Date","Last Available Date"
"US.NYSE","New York Stock Exchange","Canonical","","America/New_York","Sat-Sun","XNYS","NYSE","Securities","Canonical trading hours","","","",""
"AR.OLD","Old Buenos Aires Exchange","Old Buenos Aires Exchange","","America/Argentina/Buenos_Aires","Sat-Sun","","","","","2015-01-01","AR.BCBA","2023-01-01","2025-12-31"
"AR.BCBA","Buenos Aires Stock Exchange","Buenos Aires Stock Exchange","","America/Argentina/Buenos_Aires","Sat-Sun","XBUE","BCBA","Securities","","2017-05-01","AR.BYMA","2023-01-01","2025-12-31"
"AR.BYMA","Bolsas y Mercados Argentinos","Bolsas y Mercados Argentinos","","America/Argentina/Buenos_Aires","Sat-Sun","","BYMA","Securities","","","","2023-01-01","2025-12-31"
"#;

const SCHEDULES: &str = r#""FinID","Schedule Group","Schedule Group Memo","Timezone","Phase Type","Phase Name","Phase Memo","Days","Start","End","Offset Days","Duration","Min Start","Max Start","Min End","Max End","In Force Start Date","In Force End Date","Season Start","Season End"
"US.NYSE","Regular","","America/New_York","Pre-Trading Session","Pre-Opening Session","","Mon-Fri","04:00:00","09:30:00","0","19800","","","","","","","",""
"US.NYSE","Regular","","America/New_York","Pre-Open","Core Open Auction","","Mon-Fri","06:30:00","09:30:00","0","10800","","","","","","","",""
"US.NYSE","Regular","","America/New_York","Call Auction","Opening Auction","","Mon-Fri","09:30:00","09:30:00","0","0","","","","","","","",""
"US.NYSE","Regular","","America/New_York","Primary Trading Session","Core Trading Session","","Mon-Fri","09:30:00","16:00:00","0","23400","","","","","","","",""
"US.NYSE","Regular","","America/New_York","Pre-Close","Closing Imbalance Period","","Mon-Fri","15:50:00","16:00:00","0","600","","","","","","","",""
"US.NYSE","Regular","","America/New_York","Post-Trading Session","Extended Hours","","Mon-Fri","16:00:00","20:00:00","0","14400","","","","","","","",""
"US.NYSE","Partial","Early close","America/New_York","Pre-Trading Session","Pre-Opening Session","","Mon-Fri","06:30:00","09:30:00","0","10800","","","","","","","",""
"US.NYSE","Partial","Early close","America/New_York","Primary Trading Session","Core Trading Session","","Mon-Fri","09:30:00","13:00:00","0","12600","","","","","","","",""
"US.NYSE","Partial","Early close","America/New_York","Post-Trading Session","Extended Hours","","Mon-Fri","13:00:00","13:30:00","0","1800","","","","","","","",""
"AR.BYMA","Regular","","America/Argentina/Buenos_Aires","Primary Trading Session","Continuous Trading","","Mon-Fri","11:00:00","17:00:00","0","6:00:00","","","","","","","",""
"#;

const HOLIDAYS: &str = r#""FinID","Date","Holiday Name","Schedule","Settlement","Observed","Memo","Status"
"US.NYSE","2023-01-02","New Year's Day","Closed","No","OBS","","Closed"
"US.NYSE","2023-11-23","Thanksgiving Day","Closed","No","","","Closed"
"US.NYSE","2023-11-24","Thanksgiving Day","Partial","Yes","","Early close","Open"
"US.NYSE","2024-12-25","Christmas","Closed","No","","","Closed"
"US.NYSE","2025-12-25","Christmas","","No","","","Closed"
"#;

const MIC_MAPPING: &str = r#""MIC","FinID"
"XNYS","US.NYSE"
"#;

const PHASES: &str = r#""Name","Status","Settlement","Closing Price"
"Primary Trading Session","Open","Yes","Yes"
"Pre-Trading Session","Closed","No","No"
"Pre-Open","Closed","No","No"
"Call Auction","Closed","No","No"
"Pre-Close","Closed","No","No"
"Post-Trading Session","Closed","No","No"
"#;

const CURRENCIES: &str = r#""Currency Code","Currency Name","Country Code","Central Bank","Financial Capital","Financial Capital Timezone","Weekend Definition"
"USD","United States Dollar","US","Federal Reserve","New York","America/New_York","Sat-Sun"
"#;

const CURRENCY_HOLIDAYS: &str = r#""Currency Code","Date","Holiday Name","Settlement","Observed","Memo"
"USD","2024-07-04","Independence Day","No","",""
"USD","2024-12-25","Christmas Day","No","",""
"#;

/// Writes every fixture table into `dir`.
pub fn write_csv_fixture(dir: &Path) -> Result<()> {
    for (name, body) in [
        ("markets.csv", MARKETS),
        ("schedules.csv", SCHEDULES),
        ("holidays.csv", HOLIDAYS),
        ("mic_mapping.csv", MIC_MAPPING),
        ("phases.csv", PHASES),
        ("currencies.csv", CURRENCIES),
        ("currency_holidays.csv", CURRENCY_HOLIDAYS),
    ] {
        let path = dir.join(name);
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

/// Fresh temp directory holding the fixture export.
pub fn csv_fixture_dir() -> Result<TempDir> {
    let dir = tempfile::tempdir().context("create fixture dir")?;
    write_csv_fixture(dir.path())?;
    Ok(dir)
}
