//! th-store
//!
//! Reads a directory of calendar CSV exports into typed rows and builds a
//! [`th_calendar::Snapshot`]. This is the only crate that touches the
//! filesystem for calendar data.

mod error;
mod load;
mod records;
mod table;

pub use error::StoreError;
pub use load::{
    load_snapshot, read_export, CURRENCIES_FILE, CURRENCY_HOLIDAYS_FILE, HOLIDAYS_FILE,
    MARKETS_FILE, MIC_MAPPING_FILE, PHASES_FILE, SCHEDULES_FILE, SEASONS_FILE,
};
pub use table::normalize_header;
