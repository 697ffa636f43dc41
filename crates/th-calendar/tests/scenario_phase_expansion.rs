//! Phase expansion scenarios.
//!
//! Reference dates:
//!   2024-01-02 Tue  regular NYSE day (EST, UTC-5)
//!   2023-11-23 Thu  Thanksgiving, NYSE closed
//!   2023-11-24 Fri  day after Thanksgiving, NYSE "Partial" group
//!   2024-01-07 Sun  CME overnight session opens 17:00 CT
//!   2024-03-09 Sat  New York springs forward at 02:00 the next morning
//!   2024-03-10 Sun  Chicago springs forward at 02:00
//!   2024-11-02 Sat  New York falls back at 02:00 the next morning
//!   2024-02-04 Sun  SZSE make-up day that keeps the Regular group

use chrono::{Duration, NaiveDate};
use chrono_tz::America::New_York;
use th_calendar::*;
use th_testkit::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn snap() -> Snapshot {
    fixture_snapshot().expect("fixture snapshot builds")
}

fn expand(s: &Snapshot, fin_id: &str, start: NaiveDate, end: NaiveDate) -> Vec<Phase> {
    let id = s.resolve(fin_id, true).expect("fixture market").market.id;
    s.expand(id, start, end).expect("expand")
}

fn spans(phases: &[Phase]) -> Vec<(String, String, String)> {
    phases
        .iter()
        .map(|p| (p.phase_type.clone(), p.start.to_rfc3339(), p.end.to_rfc3339()))
        .collect()
}

fn span(phase_type: &str, start: &str, end: &str) -> (String, String, String) {
    (phase_type.to_string(), start.to_string(), end.to_string())
}

// ---------------------------------------------------------------------------
// Single rule, single day
// ---------------------------------------------------------------------------

#[test]
fn single_rule_single_day() {
    let mut m = MarketRow::new("US.TEST", New_York);
    m.first_available_date = Some(d(2024, 1, 1));
    m.last_available_date = Some(d(2024, 12, 31));
    let s = Snapshot::builder()
        .market(m)
        .schedule(ScheduleRow::new(
            "US.TEST",
            "Regular",
            New_York,
            PRIMARY_TRADING_SESSION,
            days("Mon-Fri"),
            t(9, 30),
            t(16, 0),
            0,
        ))
        .build()
        .unwrap();

    let phases = expand(&s, "US.TEST", d(2024, 1, 2), d(2024, 1, 2));
    assert_eq!(
        spans(&phases),
        vec![span(
            PRIMARY_TRADING_SESSION,
            "2024-01-02T09:30:00-05:00",
            "2024-01-02T16:00:00-05:00"
        )]
    );
}

// ---------------------------------------------------------------------------
// NYSE regular, closed and partial days
// ---------------------------------------------------------------------------

#[test]
fn nyse_regular_day_in_rule_order() {
    let phases = expand(&snap(), NYSE, d(2023, 11, 15), d(2023, 11, 15));
    assert_eq!(
        spans(&phases),
        vec![
            span(PRE_TRADING, "2023-11-15T04:00:00-05:00", "2023-11-15T09:30:00-05:00"),
            span(PRE_OPEN, "2023-11-15T06:30:00-05:00", "2023-11-15T09:30:00-05:00"),
            span(CALL_AUCTION, "2023-11-15T09:30:00-05:00", "2023-11-15T09:30:00-05:00"),
            span(
                PRIMARY_TRADING_SESSION,
                "2023-11-15T09:30:00-05:00",
                "2023-11-15T16:00:00-05:00"
            ),
            span(PRE_CLOSE, "2023-11-15T15:50:00-05:00", "2023-11-15T16:00:00-05:00"),
            span(POST_TRADING, "2023-11-15T16:00:00-05:00", "2023-11-15T20:00:00-05:00"),
        ]
    );
    assert_eq!(phases[3].phase_name.as_deref(), Some("Core Trading Session"));
    assert!(phases.iter().all(|p| p.schedule_group == "Regular"));
}

#[test]
fn nyse_closed_holiday_has_no_phases() {
    assert!(expand(&snap(), NYSE, d(2023, 11, 23), d(2023, 11, 23)).is_empty());
}

#[test]
fn nyse_weekend_has_no_phases() {
    assert!(expand(&snap(), NYSE, d(2023, 11, 18), d(2023, 11, 19)).is_empty());
}

#[test]
fn nyse_partial_day_uses_override_group() {
    let phases = expand(&snap(), NYSE, d(2023, 11, 24), d(2023, 11, 24));
    assert_eq!(
        spans(&phases),
        vec![
            span(PRE_TRADING, "2023-11-24T06:30:00-05:00", "2023-11-24T09:30:00-05:00"),
            span(
                PRIMARY_TRADING_SESSION,
                "2023-11-24T09:30:00-05:00",
                "2023-11-24T13:00:00-05:00"
            ),
            span(POST_TRADING, "2023-11-24T13:00:00-05:00", "2023-11-24T13:30:00-05:00"),
        ]
    );
    assert!(phases.iter().all(|p| p.schedule_group == "Partial"));
}

#[test]
fn range_stitches_days_in_order() {
    let phases = expand(&snap(), NYSE, d(2023, 11, 22), d(2023, 11, 24));
    assert_eq!(phases.len(), 6 + 3);
    for w in phases.windows(2) {
        assert!(w[0].start <= w[1].start, "{w:?} out of order");
    }
}

#[test]
fn split_ranges_concatenate_to_the_whole_range() {
    let s = snap();
    let (start, end) = (d(2024, 1, 1), d(2024, 12, 31));
    // Both sides of the spring-forward and fall-back weekends.
    let splits = [d(2024, 3, 9), d(2024, 3, 10), d(2024, 11, 2), d(2024, 11, 3)];
    for fin_id in [NYSE, CME_USINDEX1, MGEX, SEASONAL, SZSE, NIGHT, AR_BYMA] {
        let whole = expand(&s, fin_id, start, end);
        for mid in splits {
            let mut joined = expand(&s, fin_id, start, mid);
            joined.extend(expand(&s, fin_id, mid + Duration::days(1), end));
            assert_eq!(joined, whole, "{fin_id} split after {mid}");
        }
    }
}

// ---------------------------------------------------------------------------
// Overnight sessions and the start-date boundary
// ---------------------------------------------------------------------------

#[test]
fn cme_sunday_session_runs_into_monday() {
    let phases = expand(&snap(), CME_USINDEX1, d(2024, 1, 7), d(2024, 1, 7));
    assert_eq!(
        spans(&phases),
        vec![
            span(PRE_OPEN, "2024-01-07T16:45:00-06:00", "2024-01-07T17:00:00-06:00"),
            span(
                PRIMARY_TRADING_SESSION,
                "2024-01-07T17:00:00-06:00",
                "2024-01-08T16:00:00-06:00"
            ),
        ]
    );
}

#[test]
fn phase_started_before_range_is_not_included() {
    // Sunday's session is still running on Monday morning, but it belongs to
    // Sunday.
    let phases = expand(&snap(), CME_USINDEX1, d(2024, 1, 8), d(2024, 1, 8));
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0].start.to_rfc3339(), "2024-01-08T16:45:00-06:00");
    assert!(phases.iter().all(|p| p.start.date_naive() == d(2024, 1, 8)));
}

#[test]
fn cme_friday_and_saturday_are_dark() {
    assert!(expand(&snap(), CME_USINDEX1, d(2024, 1, 12), d(2024, 1, 13)).is_empty());
}

#[test]
fn overnight_phase_across_spring_forward() {
    let phases = expand(&snap(), MGEX, d(2024, 3, 10), d(2024, 3, 10));
    assert_eq!(
        spans(&phases),
        vec![span(
            PRIMARY_TRADING_SESSION,
            "2024-03-10T19:00:00-05:00",
            "2024-03-11T07:45:00-05:00"
        )]
    );

    // Starts before the change, ends after it.
    let night = expand(&snap(), NIGHT, d(2024, 3, 9), d(2024, 3, 9));
    assert_eq!(
        spans(&night),
        vec![span(
            PRIMARY_TRADING_SESSION,
            "2024-03-09T22:00:00-05:00",
            "2024-03-10T06:00:00-04:00"
        )]
    );
    assert_eq!(night[0].duration(), Duration::hours(7));
}

#[test]
fn overnight_phase_across_fall_back() {
    let night = expand(&snap(), NIGHT, d(2024, 11, 2), d(2024, 11, 2));
    assert_eq!(night.len(), 1);
    assert_eq!(night[0].start.to_rfc3339(), "2024-11-02T22:00:00-04:00");
    assert_eq!(night[0].end.to_rfc3339(), "2024-11-03T06:00:00-05:00");
    assert_eq!(night[0].duration(), Duration::hours(9));
}

#[test]
fn offset_one_ends_next_local_day() {
    let s = snap();
    let cme = expand(&s, CME_USINDEX1, d(2024, 1, 1), d(2024, 12, 31));
    let night = expand(&s, NIGHT, d(2024, 1, 1), d(2024, 12, 31));
    for p in cme
        .iter()
        .filter(|p| p.phase_type == PRIMARY_TRADING_SESSION)
        .chain(night.iter())
    {
        let start = p.start.date_naive();
        let end = p.end.date_naive();
        assert_eq!(end, start + Duration::days(1), "{p:?}");
    }
}

// ---------------------------------------------------------------------------
// Holidays in the middle of overnight weeks
// ---------------------------------------------------------------------------

#[test]
fn closed_day_drops_only_its_own_phases() {
    let phases = expand(&snap(), CME_USINDEX1, d(2024, 7, 3), d(2024, 7, 4));
    assert_eq!(
        spans(&phases),
        vec![
            span(PRE_OPEN, "2024-07-03T16:45:00-05:00", "2024-07-03T17:00:00-05:00"),
            span(
                PRIMARY_TRADING_SESSION,
                "2024-07-03T17:00:00-05:00",
                "2024-07-04T16:00:00-05:00"
            ),
        ]
    );
}

// ---------------------------------------------------------------------------
// Regular-group weekday fallback
// ---------------------------------------------------------------------------

#[test]
fn make_up_day_borrows_previous_weekday_rules() {
    let s = snap();
    let phases = expand(&s, SZSE, d(2024, 2, 4), d(2024, 2, 4));
    assert_eq!(
        spans(&phases),
        vec![
            span(CALL_AUCTION, "2024-02-04T09:15:00+08:00", "2024-02-04T09:25:00+08:00"),
            span(
                PRIMARY_TRADING_SESSION,
                "2024-02-04T09:30:00+08:00",
                "2024-02-04T11:30:00+08:00"
            ),
            span(INTERMISSION, "2024-02-04T11:30:00+08:00", "2024-02-04T13:00:00+08:00"),
            span(
                PRIMARY_TRADING_SESSION,
                "2024-02-04T13:00:00+08:00",
                "2024-02-04T15:00:00+08:00"
            ),
        ]
    );

    // A plain Sunday keeps no phases.
    assert!(expand(&s, SZSE, d(2024, 2, 18), d(2024, 2, 18)).is_empty());
    assert!(expand(&s, SZSE, d(2024, 2, 12), d(2024, 2, 12)).is_empty());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn inverted_range_is_rejected() {
    let s = snap();
    let id = s.resolve(NYSE, true).unwrap().market.id;
    assert!(matches!(
        s.expand(id, d(2024, 1, 3), d(2024, 1, 2)),
        Err(CalendarError::InvalidRange(_))
    ));
}

#[test]
fn range_outside_coverage_is_rejected() {
    let s = snap();
    let id = s.resolve(NYSE, true).unwrap().market.id;
    match s.expand(id, d(2022, 12, 30), d(2023, 1, 3)) {
        Err(CalendarError::Coverage {
            requested,
            first,
            last,
            ..
        }) => {
            assert_eq!(requested, d(2022, 12, 30));
            assert_eq!(first, d(2023, 1, 1));
            assert_eq!(last, d(2025, 12, 31));
        }
        other => panic!("expected coverage error, got {other:?}"),
    }
    assert!(matches!(
        s.expand(id, d(2025, 12, 30), d(2026, 1, 2)),
        Err(CalendarError::Coverage { .. })
    ));
}

// ---------------------------------------------------------------------------
// Starts inside a spring-forward gap
// ---------------------------------------------------------------------------

fn gap_market(start: chrono::NaiveTime, end: chrono::NaiveTime) -> Result<Snapshot, CalendarError> {
    let mut m = MarketRow::new("XX.GAP", New_York);
    m.first_available_date = Some(d(2024, 1, 1));
    m.last_available_date = Some(d(2024, 12, 31));
    Snapshot::builder()
        .market(m)
        .schedule(ScheduleRow::new(
            "XX.GAP",
            "Regular",
            New_York,
            PRIMARY_TRADING_SESSION,
            days("Sun"),
            start,
            end,
            0,
        ))
        .build()
}

#[test]
fn start_in_gap_opens_when_the_clock_resumes() {
    // 02:30 does not exist on 2024-03-10; shifting it by the gap would pass 03:15.
    let s = gap_market(t(2, 30), t(3, 15)).unwrap();
    let phases = expand(&s, "XX.GAP", d(2024, 3, 10), d(2024, 3, 10));
    assert_eq!(
        spans(&phases),
        vec![span(
            PRIMARY_TRADING_SESSION,
            "2024-03-10T03:00:00-04:00",
            "2024-03-10T03:15:00-04:00"
        )]
    );

    let id = s.resolve("XX.GAP", true).unwrap().market.id;
    let st = s.status_at(id, ts("2024-03-10T03:05:00-04:00")).unwrap();
    assert_eq!(st.status, MarketState::Open);
    assert_eq!(st.until.to_rfc3339(), "2024-03-10T03:15:00-04:00");
}

#[test]
fn phase_wholly_inside_gap_keeps_its_length() {
    let s = gap_market(t(2, 15), t(2, 45)).unwrap();
    let phases = expand(&s, "XX.GAP", d(2024, 3, 10), d(2024, 3, 10));
    assert_eq!(
        spans(&phases),
        vec![span(
            PRIMARY_TRADING_SESSION,
            "2024-03-10T03:15:00-04:00",
            "2024-03-10T03:45:00-04:00"
        )]
    );
}

#[test]
fn phase_ending_where_gap_ends_is_integrity_error() {
    let s = gap_market(t(2, 30), t(3, 0)).unwrap();
    let id = s.resolve("XX.GAP", true).unwrap().market.id;
    assert!(matches!(
        s.expand(id, d(2024, 3, 10), d(2024, 3, 10)),
        Err(CalendarError::DataIntegrity(_))
    ));
    // Other Sundays are unaffected.
    assert_eq!(s.expand(id, d(2024, 3, 3), d(2024, 3, 3)).unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Properties over a full year
// ---------------------------------------------------------------------------

#[test]
fn year_of_phases_is_ordered_and_anchored_in_range() {
    let s = snap();
    for fin_id in [NYSE, CME_USINDEX1, MGEX, SEASONAL, SZSE, NIGHT, AR_BYMA] {
        let m = s.resolve(fin_id, true).unwrap().market;
        let (start, end) = (d(2024, 1, 1), d(2024, 12, 31));
        let phases = s.expand(m.id, start, end).unwrap();
        assert!(!phases.is_empty(), "{fin_id} has phases");
        for w in phases.windows(2) {
            assert!(
                (w[0].start, w[0].end) <= (w[1].start, w[1].end),
                "{fin_id}: {w:?}"
            );
        }
        let instantaneous: Vec<String> = s
            .schedules(m.id)
            .iter()
            .filter(|r| r.nominal_secs() == 0)
            .map(|r| r.phase_type.clone())
            .collect();
        for p in &phases {
            if instantaneous.contains(&p.phase_type) {
                assert_eq!(p.end, p.start, "{fin_id}: {p:?}");
            } else {
                assert!(p.end > p.start, "{fin_id}: {p:?}");
            }
            let local_start = p.start.with_timezone(&m.timezone).date_naive();
            assert!(start <= local_start && local_start <= end, "{fin_id}: {p:?}");
        }
    }
}

#[test]
fn expansion_is_deterministic() {
    let a = expand(&snap(), MGEX, d(2024, 1, 1), d(2024, 3, 31));
    let b = expand(&snap(), MGEX, d(2024, 1, 1), d(2024, 3, 31));
    assert_eq!(a, b);
}
