//! Point-in-time snapshot of every fleet collection.
//!
//! A snapshot is produced by a source (mock generator, file, HTTP) and is never
//! patched in place: a newer snapshot replaces the old one wholesale through
//! [`SnapshotHandle`].

use crate::models::streetlight::{
    Asset, AutomationRule, Controller, EnergySummary, Fault, FaultStatus, LampState, MaintenanceTicket,
    PilotFramework, Telemetry, User, Zone,
};
use crate::services::filter::{self, FilterSpec};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub zones: Vec<Zone>,
    pub assets: Vec<Asset>,
    pub controllers: Vec<Controller>,
    pub telemetry: Vec<Telemetry>,
    pub faults: Vec<Fault>,
    pub maintenance_tickets: Vec<MaintenanceTicket>,
    pub energy_summary: Vec<EnergySummary>,
    #[serde(default)]
    pub automation_rules: Vec<AutomationRule>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pilot_framework: Option<PilotFramework>,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io { path: PathBuf, source: std::io::Error },
    /// JSON did not match the data model; `path` is the offending field path.
    Json { path: String, source: serde_json::Error },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io { path, source } => write!(f, "failed to read {}: {}", path.display(), source),
            SnapshotError::Json { path, source } => write!(f, "invalid snapshot at `{}`: {}", path, source),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SnapshotError::Io { source, .. } => Some(source),
            SnapshotError::Json { source, .. } => Some(source),
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for SnapshotError {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        SnapshotError::Json {
            path: value.path().to_string(),
            source: value.into_inner(),
        }
    }
}

/// A data-model invariant the source did not honour. Reported, never enforced.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    NonPositiveZoneLength { zone: String, length_km: f64 },
    UnknownZone { pole: String, zone: String },
    UnknownController { pole: String, controller: String },
    ResolvedAtMismatch { fault: String, status: FaultStatus },
    TicketTimestampsOutOfOrder { ticket: String },
    FaultCodeWithoutFaultState { pole: String, state: LampState },
    DuplicateReading { pole: String },
}

impl Display for IntegrityIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::NonPositiveZoneLength { zone, length_km } => {
                write!(f, "zone {} has non-positive length {} km", zone, length_km)
            }
            IntegrityIssue::UnknownZone { pole, zone } => write!(f, "pole {} references unknown zone {}", pole, zone),
            IntegrityIssue::UnknownController { pole, controller } => {
                write!(f, "pole {} references unknown controller {}", pole, controller)
            }
            IntegrityIssue::ResolvedAtMismatch { fault, status } => {
                write!(f, "fault {} has status {} but resolvedAt disagrees", fault, status.as_str())
            }
            IntegrityIssue::TicketTimestampsOutOfOrder { ticket } => {
                write!(f, "ticket {} has created/responded/closed out of order", ticket)
            }
            IntegrityIssue::FaultCodeWithoutFaultState { pole, state } => {
                write!(f, "telemetry for pole {} carries a fault code in state {:?}", pole, state)
            }
            IntegrityIssue::DuplicateReading { pole } => write!(f, "pole {} has more than one current reading", pole),
        }
    }
}

impl Snapshot {
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let de = &mut serde_json::Deserializer::from_str(json);
        Ok(serde_path_to_error::deserialize(de)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        Ok(serde_path_to_error::deserialize(value)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check the data-model invariants the sources are expected to uphold.
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        let zone_ids: BTreeSet<&str> = self.zones.iter().map(|z| z.zone_id.0.as_str()).collect();
        let controller_ids: BTreeSet<&str> = self
            .controllers
            .iter()
            .map(|c| c.controller_id.0.as_str())
            .collect();

        for zone in &self.zones {
            if zone.length_km.is_nan() || zone.length_km <= 0.0 {
                issues.push(IntegrityIssue::NonPositiveZoneLength {
                    zone: zone.zone_id.0.clone(),
                    length_km: zone.length_km,
                });
            }
        }

        for asset in &self.assets {
            if !zone_ids.contains(asset.zone_id.0.as_str()) {
                issues.push(IntegrityIssue::UnknownZone {
                    pole: asset.pole_id.0.clone(),
                    zone: asset.zone_id.0.clone(),
                });
            }
            if !controller_ids.contains(asset.controller_id.0.as_str()) {
                issues.push(IntegrityIssue::UnknownController {
                    pole: asset.pole_id.0.clone(),
                    controller: asset.controller_id.0.clone(),
                });
            }
        }

        for fault in &self.faults {
            let resolved = fault.status == FaultStatus::Resolved;
            if resolved != fault.resolved_at.is_some() {
                issues.push(IntegrityIssue::ResolvedAtMismatch {
                    fault: fault.fault_id.0.clone(),
                    status: fault.status,
                });
            }
        }

        for ticket in &self.maintenance_tickets {
            let responded_ok = ticket.responded_at.is_none_or(|r| r >= ticket.created_at);
            let closed_ok = ticket
                .closed_at
                .is_none_or(|c| c >= ticket.responded_at.unwrap_or(ticket.created_at));
            if !(responded_ok && closed_ok) {
                issues.push(IntegrityIssue::TicketTimestampsOutOfOrder {
                    ticket: ticket.ticket_id.0.clone(),
                });
            }
        }

        let mut readings_per_pole: BTreeMap<&str, usize> = BTreeMap::new();
        for reading in &self.telemetry {
            *readings_per_pole.entry(reading.pole_id.0.as_str()).or_default() += 1;
            if reading.fault_code.is_some() && reading.state != LampState::Fault {
                issues.push(IntegrityIssue::FaultCodeWithoutFaultState {
                    pole: reading.pole_id.0.clone(),
                    state: reading.state,
                });
            }
        }
        issues.extend(
            readings_per_pole
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(pole, _)| IntegrityIssue::DuplicateReading { pole: pole.to_string() }),
        );

        issues
    }

    /// Copy of this snapshot with faults, tickets and energy rows narrowed to `spec`.
    /// Reference collections (zones, assets, telemetry, ...) are carried over as-is.
    pub fn windowed(&self, spec: &FilterSpec) -> Snapshot {
        Snapshot {
            faults: filter::filter_faults(&self.faults, spec),
            maintenance_tickets: filter::filter_tickets(&self.maintenance_tickets, &self.faults, spec),
            energy_summary: filter::filter_energy(&self.energy_summary, spec),
            ..self.clone()
        }
    }
}

/// Shared slot holding the current snapshot.
///
/// Readers take the whole `Arc` at once, so an in-flight computation keeps seeing
/// the snapshot it started with even if a newer one is swapped in meanwhile.
#[derive(Debug, Default)]
pub struct SnapshotHandle {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotHandle {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new snapshot, returning the previous one.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}
