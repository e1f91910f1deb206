//! Street-light fleet domain records as carried in a snapshot.
//!
//! Notes
//! - Pure data: no behavior beyond enum name helpers used by filtering.
//! - JSON field names are camelCase, enum values use the console's wire spelling.
//! - Date/time fields use `chrono` (`DateTime<Utc>`); calendar days use `NaiveDate`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =====================
// Identifier newtype wrappers
// =====================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

// =====================
// Enums
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    Active,
    Inactive,
    Maintenance,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connectivity {
    #[serde(rename = "4G")]
    FourG,
    #[serde(rename = "NB-IoT")]
    NbIot,
    #[serde(rename = "5G")]
    FiveG,
    #[serde(rename = "LTE-M")]
    LteM,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LampState {
    On,
    Off,
    Dimmed,
    Fault,
}

impl LampState {
    pub fn as_str(self) -> &'static str {
        match self {
            LampState::On => "ON",
            LampState::Off => "OFF",
            LampState::Dimmed => "DIMMED",
            LampState::Fault => "FAULT",
        }
    }
}

/// Fault severity, ordered so that `Critical` compares highest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultStatus {
    Open,
    Resolved,
}

impl FaultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultStatus::Open => "OPEN",
            FaultStatus::Resolved => "RESOLVED",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Maintenance,
    Viewer,
}

// =====================
// Records
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub zone_id: ZoneId,
    pub name: String,
    pub length_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Number of poles the zone is provisioned for.
    pub poles: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A lighting pole ("asset" in the console).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub pole_id: PoleId,
    pub zone_id: ZoneId,
    pub gps: GeoPoint,
    pub fixture_type: String,
    pub controller_id: ControllerId,
    pub installed_on: NaiveDate,
    pub status: AssetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub controller_id: ControllerId,
    pub firmware: String,
    pub last_seen: DateTime<Utc>,
    pub connectivity: Connectivity,
}

/// Current reading of one pole. A snapshot is a point in time, not a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub pole_id: PoleId,
    pub timestamp: DateTime<Utc>,
    pub state: LampState,
    pub voltage: f64,
    pub current: f64,
    pub power_w: f64,
    pub energy_kwh: f64,
    pub ambient_lux: f64,
    pub temperature_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimming_level: Option<f64>,
    /// Only populated while `state` is `FAULT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    pub fault_id: FaultId,
    pub pole_id: PoleId,
    /// Denormalized from the pole's zone.
    pub zone_id: ZoneId,
    pub fault_code: String,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    pub status: FaultStatus,
    /// Present iff `status` is `RESOLVED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTicket {
    pub ticket_id: TicketId,
    pub fault_id: FaultId,
    pub assigned_to: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub sla_hours: f64,
    pub status: TicketStatus,
}

/// Daily energy roll-up for one zone.
///
/// `savings_kwh` is stored as delivered and is not required to equal
/// `baseline_kwh - total_energy_kwh`; it may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySummary {
    pub zone_id: ZoneId,
    pub date: NaiveDate,
    pub total_energy_kwh: f64,
    pub baseline_kwh: f64,
    pub savings_kwh: f64,
    pub co2_saved_kg: f64,
}

/// Descriptive only; nothing evaluates `condition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRule {
    pub rule_id: RuleId,
    pub zone_id: ZoneId,
    pub name: String,
    pub condition: String,
    pub action: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub role: UserRole,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotFramework {
    pub pilot_id: String,
    pub zone_id: ZoneId,
    pub kpis: Vec<String>,
    pub duration_months: u32,
    /// Keyed by KPI name, e.g. `uptimePct`, `energySavingsPct`, `responseTimeMinutes`.
    pub success_thresholds: BTreeMap<String, f64>,
}
