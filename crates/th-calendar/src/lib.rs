//! th-calendar
//!
//! Market trading calendars: which phases a market runs on which dates, and
//! whether it is open at a given instant.
//!
//! Deterministic, pure logic. No IO, no wall-clock. Callers build a
//! [`Snapshot`] from typed rows (see `th-store` for the CSV loader) and pass
//! every date and instant explicitly.

mod error;
mod expander;
pub mod format;
mod holidays;
mod parse;
mod registry;
mod rows;
mod schedule;
mod season;
mod snapshot;
mod status;
mod types;
mod view;

pub use error::CalendarError;
pub use expander::PhaseExpander;
pub use holidays::{Currency, CurrencyHoliday, GroupSelector, HolidayCalendar, HolidayEntry};
pub use parse::{parse_date, parse_instant, parse_range};
pub use registry::{MarketRegistry, Resolved, MAX_REPLACEMENT_HOPS};
pub use rows::{
    CurrencyHolidayRow, CurrencyRow, HolidayRow, MarketRow, MicMappingRow, PhaseTypeRow,
    ScheduleRow, SeasonDefinitionRow,
};
pub use schedule::{RandomBounds, ScheduleGroup, ScheduleIndex, ScheduleRule};
pub use season::{SeasonBoundary, SeasonResolver, SeasonWindow};
pub use snapshot::{SharedSnapshot, Snapshot, SnapshotBuilder, SnapshotSummary};
pub use status::StatusResolver;
pub use types::{
    Coverage, DaySet, Market, MarketId, MarketState, MarketStatus, Phase, PhaseType,
    PhaseTypeCatalog, MAX_OFFSET_DAYS, PRIMARY_TRADING_SESSION, REGULAR_GROUP,
};
pub use view::{MarketInfo, ScheduleRuleInfo};
