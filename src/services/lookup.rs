//! Point lookups for the pole detail panel.
//!
//! The data model does not enforce one current reading per pole, one open fault
//! per pole, nor one ticket per fault. Where several candidates exist the first in
//! snapshot order is returned, which is stable for a given snapshot and matches
//! the reading [`crate::services::kpis::uptime_pct`] counts. Callers must not
//! assume uniqueness.

use crate::models::streetlight::{Fault, FaultId, FaultStatus, MaintenanceTicket, PoleId, Telemetry};
use crate::snapshot::Snapshot;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct LookupIndex<'a> {
    current_reading: HashMap<&'a PoleId, &'a Telemetry>,
    open_fault: HashMap<&'a PoleId, &'a Fault>,
    ticket: HashMap<&'a FaultId, &'a MaintenanceTicket>,
}

impl<'a> LookupIndex<'a> {
    /// One pass over telemetry, faults and tickets. Rebuild on every new snapshot.
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let mut index = LookupIndex {
            current_reading: HashMap::with_capacity(snapshot.telemetry.len()),
            open_fault: HashMap::new(),
            ticket: HashMap::with_capacity(snapshot.maintenance_tickets.len()),
        };

        for reading in &snapshot.telemetry {
            index.current_reading.entry(&reading.pole_id).or_insert(reading);
        }

        for fault in snapshot.faults.iter().filter(|f| f.status == FaultStatus::Open) {
            index.open_fault.entry(&fault.pole_id).or_insert(fault);
        }

        for ticket in &snapshot.maintenance_tickets {
            index.ticket.entry(&ticket.fault_id).or_insert(ticket);
        }

        index
    }

    pub fn current_reading_for(&self, pole: &PoleId) -> Option<&'a Telemetry> {
        self.current_reading.get(pole).copied()
    }

    pub fn open_fault_for(&self, pole: &PoleId) -> Option<&'a Fault> {
        self.open_fault.get(pole).copied()
    }

    pub fn ticket_for_fault(&self, fault: &FaultId) -> Option<&'a MaintenanceTicket> {
        self.ticket.get(fault).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::streetlight::{LampState, Severity, ZoneId};
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn open_fault(id: &str, pole: &str) -> Fault {
        Fault {
            fault_id: FaultId(id.into()),
            pole_id: PoleId(pole.into()),
            zone_id: ZoneId("NH44-Z01".into()),
            fault_code: "LAMP_FAILURE".into(),
            severity: Severity::High,
            detected_at: Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap(),
            status: FaultStatus::Open,
            resolved_at: None,
        }
    }

    #[test]
    fn fixture_lookups() {
        let snapshot = Snapshot::load(Path::new("tests/data/snapshot.json")).expect("fixture");
        let index = LookupIndex::build(&snapshot);

        let p002 = PoleId("NH44-P002".into());
        let reading = index.current_reading_for(&p002).expect("P002 has a reading");
        assert_eq!(reading.fault_code.as_deref(), Some("LAMP_FAILURE"));

        let fault = index.open_fault_for(&p002).expect("P002 has an open fault");
        assert_eq!(fault.fault_id.0, "F-1001");
        let ticket = index.ticket_for_fault(&fault.fault_id).expect("F-1001 has a ticket");
        assert_eq!(ticket.ticket_id.0, "MT-501");

        // P005's fault is resolved.
        assert!(index.open_fault_for(&PoleId("NH44-P005".into())).is_none());
        assert!(index.current_reading_for(&PoleId("NH44-P999".into())).is_none());
    }

    fn reading(pole: &str, state: LampState, minute: u32) -> Telemetry {
        Telemetry {
            pole_id: PoleId(pole.into()),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 27, 10, minute, 0).unwrap(),
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

    #[test]
    fn duplicate_readings_resolve_to_the_first_in_snapshot_order() {
        // The second reading is newer but still loses.
        let snapshot = Snapshot {
            telemetry: vec![reading("P1", LampState::Fault, 10), reading("P1", LampState::On, 20)],
            ..Snapshot::default()
        };
        let index = LookupIndex::build(&snapshot);
        let picked = index.current_reading_for(&PoleId("P1".into())).expect("reading");
        assert_eq!(picked.state, LampState::Fault);
        assert_eq!(crate::services::kpis::uptime_pct(&snapshot.telemetry), 0.0);
    }

    #[test]
    fn multiple_open_faults_resolve_deterministically() {
        let snapshot = Snapshot {
            faults: vec![open_fault("F-2", "P1"), open_fault("F-1", "P1")],
            ..Snapshot::default()
        };
        let first = LookupIndex::build(&snapshot).open_fault_for(&PoleId("P1".into())).map(|f| f.fault_id.clone());
        for _ in 0..5 {
            let again = LookupIndex::build(&snapshot)
                .open_fault_for(&PoleId("P1".into()))
                .map(|f| f.fault_id.clone());
            assert_eq!(again, first);
        }
        assert_eq!(first, Some(FaultId("F-2".into())));
    }
}
