//! Zone / status / severity / date-range filtering shared by every view.
//!
//! All predicates are ANDed and an unset field never excludes a row. Filters
//! never fail: a date that does not parse is dropped and the window stays open
//! on that side.

use crate::models::streetlight::{EnergySummary, Fault, FaultId, MaintenanceTicket, ZoneId};
use crate::utils::{parse_calendar_date, start_of_day};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Filter bar state. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub zone: String,
    /// Matched against the target collection's own status names (`OPEN`, `IN_PROGRESS`, ...).
    pub status: String,
    /// Only consulted for fault-derived collections.
    pub severity: String,
    /// Inclusive calendar day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Inclusive calendar day, `YYYY-MM-DD`.
    pub end_date: String,
}

impl FilterSpec {
    pub fn is_unset(&self) -> bool {
        [&self.zone, &self.status, &self.severity, &self.start_date, &self.end_date]
            .iter()
            .all(|v| v.trim().is_empty())
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::from_dates(&self.start_date, &self.end_date)
    }

    fn zone(&self) -> Option<&str> {
        active(&self.zone)
    }

    fn status(&self) -> Option<&str> {
        active(&self.status)
    }

    fn severity(&self) -> Option<&str> {
        active(&self.severity)
    }
}

/// Half-open instant range `[start 00:00, end + 1 day 00:00)` in UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end_exclusive: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn from_dates(start_date: &str, end_date: &str) -> Self {
        let start = bound(start_date, "start").map(start_of_day);
        // Last representable day has no successor; leave the window open.
        let end_exclusive = bound(end_date, "end")
            .and_then(|day| day.succ_opt())
            .map(start_of_day);
        DateWindow { start, end_exclusive }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end_exclusive.is_none_or(|end| ts < end)
    }
}

fn bound(raw: &str, side: &str) -> Option<chrono::NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_calendar_date(raw);
    if parsed.is_none() {
        warn!("Filter: ignoring malformed {} date {:?}", side, raw);
    }
    parsed
}

fn active(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// `value` is `None` when the row cannot resolve that dimension; such rows only
/// pass while the filter is unset.
fn field_matches(wanted: Option<&str>, value: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(w) => value == Some(w),
    }
}

/// Keep the rows whose timestamp lies in `window` and that satisfy `keep`,
/// preserving input order.
pub fn filter_by_window<T, F>(rows: &[T], window: &DateWindow, timestamp: impl Fn(&T) -> DateTime<Utc>, keep: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    rows.iter()
        .filter(|row| window.contains(timestamp(*row)) && keep(*row))
        .cloned()
        .collect()
}

/// Faults by detection time. Zone is the fault's denormalized zone.
pub fn filter_faults(faults: &[Fault], spec: &FilterSpec) -> Vec<Fault> {
    let window = spec.window();
    filter_by_window(
        faults,
        &window,
        |f| f.detected_at,
        |f| {
            field_matches(spec.zone(), Some(f.zone_id.0.as_str()))
                && field_matches(spec.status(), Some(f.status.as_str()))
                && field_matches(spec.severity(), Some(f.severity.as_str()))
        },
    )
}

/// Tickets by creation time. Zone and severity come from the referenced fault;
/// a ticket whose fault is missing from `faults` fails any active zone or severity
/// filter.
pub fn filter_tickets(tickets: &[MaintenanceTicket], faults: &[Fault], spec: &FilterSpec) -> Vec<MaintenanceTicket> {
    let window = spec.window();
    let mut by_id: HashMap<&FaultId, &Fault> = HashMap::with_capacity(faults.len());
    for fault in faults {
        by_id.entry(&fault.fault_id).or_insert(fault);
    }

    let needs_fault = spec.zone().is_some() || spec.severity().is_some();
    filter_by_window(
        tickets,
        &window,
        |t| t.created_at,
        |t| {
            let fault = by_id.get(&t.fault_id).copied();
            if needs_fault && fault.is_none() {
                debug!(
                    "Filter: ticket {} references unknown fault {}",
                    t.ticket_id.0, t.fault_id.0
                );
            }
            field_matches(spec.zone(), fault.map(|f| f.zone_id.0.as_str()))
                && field_matches(spec.status(), Some(t.status.as_str()))
                && field_matches(spec.severity(), fault.map(|f| f.severity.as_str()))
        },
    )
}

/// Energy rows by calendar date. Energy rows carry no status or severity, so
/// those fields are ignored here.
pub fn filter_energy(rows: &[EnergySummary], spec: &FilterSpec) -> Vec<EnergySummary> {
    let window = spec.window();
    filter_by_window(
        rows,
        &window,
        |row| start_of_day(row.date),
        |row| field_matches(spec.zone(), Some(row.zone_id.0.as_str())),
    )
}

/// Rows of `rows` that belong to `zone`, for per-zone breakdowns.
pub fn energy_for_zone<'a>(rows: &'a [EnergySummary], zone: &'a ZoneId) -> impl Iterator<Item = &'a EnergySummary> + 'a {
    rows.iter().filter(move |row| &row.zone_id == zone)
}
