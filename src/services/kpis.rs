//! Fleet KPIs computed over a snapshot (or a windowed copy of one).
//!
//! Every function is pure and independent of the others; empty inputs give a
//! neutral value (0 or `None`) instead of NaN.

use crate::models::streetlight::{
    EnergySummary, Fault, FaultStatus, LampState, MaintenanceTicket, PoleId, Severity, Telemetry, ZoneId,
};
use crate::services::filter::energy_for_zone;
use crate::snapshot::Snapshot;
use crate::utils::{approx_eq, elapsed_hours, elapsed_minutes};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyTotals {
    pub total_energy_kwh: f64,
    pub baseline_kwh: f64,
    /// Sum of the stored per-row savings, not `baseline - total`.
    pub savings_kwh: f64,
    pub co2_saved_kg: f64,
}

/// Share of poles whose current reading is not `FAULT`, in percent.
///
/// Readings are keyed by pole so a duplicated reading counts once; the first
/// one in snapshot order wins, as in the lookup index. No readings at all gives 0.
pub fn uptime_pct(telemetry: &[Telemetry]) -> f64 {
    let mut by_pole: BTreeMap<&PoleId, &Telemetry> = BTreeMap::new();
    for reading in telemetry {
        by_pole.entry(&reading.pole_id).or_insert(reading);
    }
    if by_pole.is_empty() {
        return 0.0;
    }
    let total = by_pole.len();
    let down = by_pole.values().filter(|r| r.state == LampState::Fault).count();
    (total - down) as f64 / total as f64 * 100.0
}

pub fn active_faults(faults: &[Fault]) -> Vec<&Fault> {
    faults.iter().filter(|f| f.status == FaultStatus::Open).collect()
}

pub fn active_fault_count(faults: &[Fault]) -> usize {
    active_faults(faults).len()
}

/// Faults at `HIGH` severity or above, regardless of status.
pub fn high_severity_count(faults: &[Fault]) -> usize {
    faults.iter().filter(|f| f.severity >= Severity::High).count()
}

pub fn zone_energy<'a>(rows: impl IntoIterator<Item = &'a EnergySummary>) -> EnergyTotals {
    rows.into_iter().fold(EnergyTotals::default(), |mut acc, row| {
        acc.total_energy_kwh += row.total_energy_kwh;
        acc.baseline_kwh += row.baseline_kwh;
        acc.savings_kwh += row.savings_kwh;
        acc.co2_saved_kg += row.co2_saved_kg;
        acc
    })
}

/// Energy totals per zone, in zone-id order.
pub fn energy_by_zone(rows: &[EnergySummary]) -> BTreeMap<ZoneId, EnergyTotals> {
    let mut zones: Vec<&ZoneId> = rows.iter().map(|r| &r.zone_id).collect();
    zones.sort();
    zones.dedup();
    zones
        .into_iter()
        .map(|zone| (zone.clone(), zone_energy(energy_for_zone(rows, zone))))
        .collect()
}

/// Stored savings as a share of baseline, in percent. Zero baseline gives 0.
pub fn energy_savings_pct(totals: &EnergyTotals) -> f64 {
    if approx_eq(totals.baseline_kwh, 0.0) {
        return 0.0;
    }
    totals.savings_kwh / totals.baseline_kwh * 100.0
}

/// Share of closed tickets whose created→closed time is within `sla_hours`.
///
/// Tickets without a close time are left out of both sides of the ratio.
pub fn sla_compliance_pct(tickets: &[MaintenanceTicket]) -> f64 {
    let closed: Vec<f64> = tickets
        .iter()
        .filter_map(|t| elapsed_hours(Some(t.created_at), t.closed_at).map(|h| (h, t.sla_hours)))
        .map(|(hours, sla)| if hours <= sla { 1.0 } else { 0.0 })
        .collect();
    if closed.is_empty() {
        return 0.0;
    }
    closed.iter().sum::<f64>() / closed.len() as f64 * 100.0
}

/// Mean created→responded time in minutes over tickets that were responded to.
pub fn avg_response_time_minutes(tickets: &[MaintenanceTicket]) -> f64 {
    let responses: Vec<f64> = tickets
        .iter()
        .filter_map(|t| elapsed_minutes(Some(t.created_at), t.responded_at))
        .collect();
    if responses.is_empty() {
        return 0.0;
    }
    responses.iter().sum::<f64>() / responses.len() as f64
}

/// Most recent reading timestamp, or `None` when the snapshot has no telemetry.
pub fn latest_telemetry_timestamp(telemetry: &[Telemetry]) -> Option<DateTime<Utc>> {
    telemetry.iter().map(|r| r.timestamp).max()
}

/// Headline numbers for the live map / overview panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub uptime_pct: f64,
    pub active_faults: usize,
    pub high_severity_faults: usize,
    pub energy: EnergyTotals,
    pub energy_savings_pct: f64,
    pub sla_compliance_pct: f64,
    pub avg_response_minutes: f64,
    pub latest_telemetry: Option<DateTime<Utc>>,
}

impl DashboardKpis {
    pub fn compute(snapshot: &Snapshot) -> Self {
        let energy = zone_energy(&snapshot.energy_summary);
        DashboardKpis {
            uptime_pct: uptime_pct(&snapshot.telemetry),
            active_faults: active_fault_count(&snapshot.faults),
            high_severity_faults: high_severity_count(&snapshot.faults),
            energy_savings_pct: energy_savings_pct(&energy),
            energy,
            sla_compliance_pct: sla_compliance_pct(&snapshot.maintenance_tickets),
            avg_response_minutes: avg_response_time_minutes(&snapshot.maintenance_tickets),
            latest_telemetry: latest_telemetry_timestamp(&snapshot.telemetry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::streetlight::{FaultId, TicketId, TicketStatus};
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::path::Path;

    fn reading(pole: &str, state: LampState, ts: DateTime<Utc>) -> Telemetry {
        Telemetry {
            pole_id: PoleId(pole.into()),
            timestamp: ts,
            state,
            voltage: 229.0,
            current: 0.48,
            power_w: 110.0,
            energy_kwh: 2.0,
            ambient_lux: 12.0,
            temperature_c: 31.0,
            dimming_level: None,
            fault_code: None,
        }
    }

    fn ticket(
        id: &str,
        created: DateTime<Utc>,
        responded: Option<Duration>,
        closed: Option<Duration>,
        sla_hours: f64,
    ) -> MaintenanceTicket {
        MaintenanceTicket {
            ticket_id: TicketId(id.into()),
            fault_id: FaultId("F-1".into()),
            assigned_to: "Vendor-Alpha".into(),
            created_at: created,
            responded_at: responded.map(|d| created + d),
            closed_at: closed.map(|d| created + d),
            sla_hours,
            status: if closed.is_some() {
                TicketStatus::Closed
            } else {
                TicketStatus::Open
            },
        }
    }

    fn energy(zone: &str, savings: f64) -> EnergySummary {
        EnergySummary {
            zone_id: ZoneId(zone.into()),
            date: NaiveDate::from_ymd_opt(2026, 1, 27).unwrap(),
            total_energy_kwh: 30.0,
            baseline_kwh: 40.0,
            savings_kwh: savings,
            co2_saved_kg: 5.0,
        }
    }

    #[test]
    fn uptime_without_telemetry_is_zero() {
        let pct = uptime_pct(&[]);
        assert_eq!(pct, 0.0);
        assert!(!pct.is_nan());
    }

    #[test]
    fn uptime_counts_fault_state_as_down() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 27, 10, 15, 0).unwrap();
        let readings = vec![
            reading("P1", LampState::On, ts),
            reading("P2", LampState::Dimmed, ts),
            reading("P3", LampState::Off, ts),
            reading("P4", LampState::Fault, ts),
        ];
        assert!(approx_eq(uptime_pct(&readings), 75.0));
    }

    #[test]
    fn uptime_counts_a_duplicated_pole_once_using_its_first_reading() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 27, 10, 15, 0).unwrap();
        let readings = vec![
            reading("P1", LampState::On, ts),
            reading("P2", LampState::On, ts),
            reading("P1", LampState::Fault, ts + Duration::minutes(5)),
        ];
        assert_eq!(uptime_pct(&readings), 100.0);
    }

    #[test]
    fn sla_compliance_half_within_target() {
        let created = Utc.with_ymd_and_hms(2026, 1, 27, 8, 0, 0).unwrap();
        let tickets = vec![
            ticket("MT-1", created, None, Some(Duration::hours(4)), 6.0),
            ticket("MT-2", created, None, Some(Duration::hours(9)), 6.0),
            ticket("MT-3", created, Some(Duration::minutes(5)), None, 6.0),
        ];
        assert_eq!(sla_compliance_pct(&tickets), 50.0);
    }

    #[test]
    fn sla_boundary_is_inclusive_and_no_closed_is_zero() {
        let created = Utc.with_ymd_and_hms(2026, 1, 27, 8, 0, 0).unwrap();
        let on_the_dot = vec![ticket("MT-1", created, None, Some(Duration::hours(6)), 6.0)];
        assert_eq!(sla_compliance_pct(&on_the_dot), 100.0);

        let open_only = vec![ticket("MT-2", created, None, None, 6.0)];
        assert_eq!(sla_compliance_pct(&open_only), 0.0);
    }

    #[test]
    fn avg_response_excludes_unresponded() {
        let created = Utc.with_ymd_and_hms(2026, 1, 27, 8, 0, 0).unwrap();
        let tickets = vec![
            ticket("MT-1", created, Some(Duration::minutes(20)), None, 6.0),
            ticket("MT-2", created, None, None, 6.0),
        ];
        assert_eq!(avg_response_time_minutes(&tickets), 20.0);
        assert_eq!(avg_response_time_minutes(&tickets[1..]), 0.0);
    }

    #[test]
    fn energy_totals_sum_stored_savings() {
        let rows = vec![energy("Z01", 12.6), energy("Z02", 7.1)];
        let totals = zone_energy(&rows);
        assert!(approx_eq(totals.savings_kwh, 19.7));
        assert!(approx_eq(totals.total_energy_kwh, 60.0));

        // Stored savings that disagree with baseline - total propagate untouched.
        let inconsistent = vec![energy("Z01", -3.0)];
        assert!(approx_eq(zone_energy(&inconsistent).savings_kwh, -3.0));
        assert_eq!(zone_energy(&[]), EnergyTotals::default());
    }

    #[test]
    fn energy_breakdown_by_zone() {
        let rows = vec![energy("Z02", 1.0), energy("Z01", 2.0), energy("Z02", 3.0)];
        let by_zone = energy_by_zone(&rows);
        let keys: Vec<_> = by_zone.keys().map(|z| z.0.as_str()).collect();
        assert_eq!(keys, vec!["Z01", "Z02"]);
        assert!(approx_eq(by_zone[&ZoneId("Z02".into())].savings_kwh, 4.0));
    }

    #[test]
    fn latest_timestamp_is_none_without_readings() {
        assert_eq!(latest_telemetry_timestamp(&[]), None);
        let early = Utc.with_ymd_and_hms(2026, 1, 27, 10, 15, 10).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 27, 10, 15, 23).unwrap();
        let readings = vec![
            reading("P1", LampState::On, late),
            reading("P2", LampState::On, early),
        ];
        assert_eq!(latest_telemetry_timestamp(&readings), Some(late));
    }

    #[test]
    fn dashboard_over_fixture() {
        let snapshot = Snapshot::load(Path::new("tests/data/snapshot.json")).expect("fixture");
        let kpis = DashboardKpis::compute(&snapshot);

        // 14 poles, 2 of which report FAULT.
        assert!(approx_eq(kpis.uptime_pct, 12.0 / 14.0 * 100.0));
        assert_eq!(kpis.active_faults, 2);
        assert_eq!(kpis.high_severity_faults, 1);
        assert!(approx_eq(kpis.energy.savings_kwh, 19.7));
        assert!(approx_eq(kpis.energy.co2_saved_kg, 14.1));
        // MT-501 and MT-498 close within SLA, MT-497 takes 6h53m against 6h.
        assert!(approx_eq(kpis.sla_compliance_pct, 200.0 / 3.0));
        // Responses: 22, 16 and 32 minutes.
        assert!(approx_eq(kpis.avg_response_minutes, 70.0 / 3.0));
        assert_eq!(
            kpis.latest_telemetry,
            Some(Utc.with_ymd_and_hms(2026, 1, 27, 10, 15, 23).unwrap())
        );
    }

    #[test]
    fn windowed_kpis_follow_the_filter() {
        let snapshot = Snapshot::load(Path::new("tests/data/snapshot.json")).expect("fixture");
        let spec = crate::services::filter::FilterSpec {
            zone: "NH44-Z01".into(),
            ..Default::default()
        };
        let windowed = snapshot.windowed(&spec);
        let kpis = DashboardKpis::compute(&windowed);
        assert_eq!(kpis.active_faults, 1);
        assert!(approx_eq(kpis.energy.savings_kwh, 12.6));
        // MT-497 references a fault outside the snapshot and drops out under a zone filter.
        assert_eq!(windowed.maintenance_tickets.len(), 2);
        assert_eq!(kpis.sla_compliance_pct, 100.0);
    }
}
