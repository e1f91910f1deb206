//! Deterministic NH44 demo fleet used when no live source is configured.

use crate::models::streetlight::{
    Asset, AssetStatus, AutomationRule, Connectivity, Controller, ControllerId, EnergySummary, Fault, FaultId,
    FaultStatus, GeoPoint, LampState, MaintenanceTicket, PilotFramework, PoleId, RuleId, Severity, Telemetry,
    TicketId, TicketStatus, User, UserId, UserRole, Zone, ZoneId,
};
use crate::snapshot::Snapshot;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{debug, info, warn};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

const METERS_PER_DEG_LAT: f64 = 111_320.0;
const KM_PER_DEG: f64 = 111.32;
const FIXTURE_TYPES: [&str; 2] = ["LED-120W", "LED-90W"];
const BEARINGS_DEG: [f64; 2] = [35.0, 115.0];
const POLE_PREFIX: &str = "NH44-P";
const CONTROLLER_PREFIX: &str = "CTRL-";

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid mock timestamp")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid mock date")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn pole_id(number: u32) -> PoleId {
    PoleId(format!("{POLE_PREFIX}{number:03}"))
}

fn controller_id(number: u32) -> ControllerId {
    ControllerId(format!("{CONTROLLER_PREFIX}{number:03}"))
}

/// `count` evenly spaced points on a line of `length_m` centred on the given
/// coordinate, running along `bearing_deg` (clockwise from north).
pub fn line_points(latitude: f64, longitude: f64, length_m: f64, count: usize, bearing_deg: f64) -> Vec<GeoPoint> {
    let lat_rad = latitude.to_radians();
    let bearing_rad = bearing_deg.to_radians();
    let spacing = if count > 1 { length_m / (count - 1) as f64 } else { 0.0 };
    let start_offset = -((count as f64 - 1.0) / 2.0) * spacing;
    let lng_scale = METERS_PER_DEG_LAT * lat_rad.cos().max(0.0001);

    (0..count)
        .map(|index| {
            let offset = start_offset + index as f64 * spacing;
            GeoPoint {
                lat: latitude + offset * bearing_rad.cos() / METERS_PER_DEG_LAT,
                lng: longitude + offset * bearing_rad.sin() / lng_scale,
            }
        })
        .collect()
}

fn zones() -> Vec<Zone> {
    vec![
        Zone {
            zone_id: ZoneId("NH44-Z01".into()),
            name: "NH44 Toll Plaza A to B".into(),
            length_km: 10.0,
            latitude: 28.6139,
            longitude: 77.209,
            poles: 8,
        },
        Zone {
            zone_id: ZoneId("NH44-Z02".into()),
            name: "NH44 Plaza B to C".into(),
            length_km: 10.0,
            latitude: 28.6433,
            longitude: 77.2917,
            poles: 6,
        },
    ]
}

fn assets(zones: &[Zone]) -> Vec<Asset> {
    zones
        .iter()
        .enumerate()
        .flat_map(|(zone_index, zone)| {
            let first_number: u32 = if zone_index == 0 { 1 } else { 101 };
            let count = zone.poles as usize;
            let points = line_points(
                zone.latitude,
                zone.longitude,
                zone.length_km * 1000.0,
                count,
                BEARINGS_DEG[zone_index % BEARINGS_DEG.len()],
            );
            points.into_iter().enumerate().map(move |(index, gps)| {
                let number = first_number + index as u32;
                Asset {
                    pole_id: pole_id(number),
                    zone_id: zone.zone_id.clone(),
                    gps,
                    fixture_type: FIXTURE_TYPES[(zone_index + index) % FIXTURE_TYPES.len()].to_string(),
                    controller_id: controller_id(number),
                    installed_on: date(2024, 7, 2 + index as u32),
                    status: AssetStatus::Active,
                }
            })
        })
        .collect()
}

fn controllers(assets: &[Asset]) -> Vec<Controller> {
    assets
        .iter()
        .enumerate()
        .map(|(index, asset)| Controller {
            controller_id: asset.controller_id.clone(),
            firmware: if index % 4 == 0 { "v1.2.2" } else { "v1.2.3" }.to_string(),
            last_seen: at(2026, 1, 27, 10, 15, 20 + index as u32),
            connectivity: if index % 3 == 0 {
                Connectivity::NbIot
            } else {
                Connectivity::FourG
            },
        })
        .collect()
}

/// One current reading per asset; poles with an open fault report `FAULT`.
fn telemetry(assets: &[Asset], faults: &[Fault]) -> Vec<Telemetry> {
    let mut open: HashMap<&PoleId, &Fault> = HashMap::new();
    for fault in faults.iter().filter(|f| f.status == FaultStatus::Open) {
        open.entry(&fault.pole_id).or_insert(fault);
    }

    assets
        .iter()
        .enumerate()
        .map(|(index, asset)| {
            let fault = open.get(&asset.pole_id).copied();
            let state = match fault {
                Some(_) => LampState::Fault,
                None if index % 3 == 0 => LampState::Dimmed,
                None => LampState::On,
            };
            let power_w = match fault {
                Some(_) => 4.0 + (index % 3) as f64,
                None => 100.0 + (index % 5) as f64 * 6.0,
            };
            Telemetry {
                pole_id: asset.pole_id.clone(),
                timestamp: at(2026, 1, 27, 10, 15, 10 + index as u32),
                state,
                voltage: 228.5 + (index % 4) as f64 * 0.3,
                current: round2(power_w / 230.0),
                power_w,
                energy_kwh: round2(1.8 + (index % 6) as f64 * 0.12),
                ambient_lux: 12.0 + (index % 10) as f64,
                temperature_c: 30.8 + (index % 6) as f64 * 0.3,
                dimming_level: None,
                fault_code: fault.map(|f| f.fault_code.clone()),
            }
        })
        .collect()
}

fn faults() -> Vec<Fault> {
    vec![
        Fault {
            fault_id: FaultId("F-1001".into()),
            pole_id: PoleId("NH44-P002".into()),
            zone_id: ZoneId("NH44-Z01".into()),
            fault_code: "LAMP_FAILURE".into(),
            severity: Severity::High,
            detected_at: at(2026, 1, 27, 10, 15, 10),
            status: FaultStatus::Open,
            resolved_at: None,
        },
        Fault {
            fault_id: FaultId("F-1002".into()),
            pole_id: PoleId("NH44-P104".into()),
            zone_id: ZoneId("NH44-Z02".into()),
            fault_code: "DRIVER_FAILURE".into(),
            severity: Severity::Medium,
            detected_at: at(2026, 1, 27, 10, 15, 35),
            status: FaultStatus::Open,
            resolved_at: None,
        },
        Fault {
            fault_id: FaultId("F-0995".into()),
            pole_id: PoleId("NH44-P005".into()),
            zone_id: ZoneId("NH44-Z01".into()),
            fault_code: "POWER_DROP".into(),
            severity: Severity::Low,
            detected_at: at(2026, 1, 26, 21, 35, 0),
            status: FaultStatus::Resolved,
            resolved_at: Some(at(2026, 1, 26, 23, 10, 0)),
        },
    ]
}

fn tickets() -> Vec<MaintenanceTicket> {
    let ticket = |id: &str, fault: &str, vendor: &str, times: [DateTime<Utc>; 3], sla_hours: f64, status: TicketStatus| {
        MaintenanceTicket {
            ticket_id: TicketId(id.into()),
            fault_id: FaultId(fault.into()),
            assigned_to: vendor.into(),
            created_at: times[0],
            responded_at: Some(times[1]),
            closed_at: Some(times[2]),
            sla_hours,
            status,
        }
    };
    vec![
        ticket(
            "MT-501",
            "F-1001",
            "Vendor-Alpha",
            [at(2026, 1, 27, 10, 16, 0), at(2026, 1, 27, 10, 38, 0), at(2026, 1, 27, 14, 20, 0)],
            8.0,
            TicketStatus::InProgress,
        ),
        ticket(
            "MT-498",
            "F-0995",
            "Vendor-Alpha",
            [at(2026, 1, 26, 21, 36, 0), at(2026, 1, 26, 21, 52, 0), at(2026, 1, 26, 23, 5, 0)],
            6.0,
            TicketStatus::Closed,
        ),
        // F-0989 predates this snapshot.
        ticket(
            "MT-497",
            "F-0989",
            "Vendor-Beta",
            [at(2026, 1, 25, 18, 12, 0), at(2026, 1, 25, 18, 44, 0), at(2026, 1, 26, 1, 5, 0)],
            6.0,
            TicketStatus::Closed,
        ),
    ]
}

fn energy_summary() -> Vec<EnergySummary> {
    vec![
        EnergySummary {
            zone_id: ZoneId("NH44-Z01".into()),
            date: date(2026, 1, 27),
            total_energy_kwh: 35.4,
            baseline_kwh: 48.0,
            savings_kwh: 12.6,
            co2_saved_kg: 8.7,
        },
        EnergySummary {
            zone_id: ZoneId("NH44-Z02".into()),
            date: date(2026, 1, 27),
            total_energy_kwh: 28.9,
            baseline_kwh: 36.0,
            savings_kwh: 7.1,
            co2_saved_kg: 5.4,
        },
    ]
}

fn automation_rules() -> Vec<AutomationRule> {
    vec![
        AutomationRule {
            rule_id: RuleId("AR-01".into()),
            zone_id: ZoneId("NH44-Z01".into()),
            name: "Night Dimming".into(),
            condition: "After 11 PM".into(),
            action: "Dim to 60%".into(),
            active: true,
        },
        AutomationRule {
            rule_id: RuleId("AR-02".into()),
            zone_id: ZoneId("NH44-Z02".into()),
            name: "Traffic Surge".into(),
            condition: "Traffic > 80%".into(),
            action: "Boost to 100%".into(),
            active: true,
        },
    ]
}

fn users() -> Vec<User> {
    vec![
        User {
            user_id: UserId("U-101".into()),
            name: "Aarav Mehta".into(),
            role: UserRole::Admin,
            email: "aarav.mehta@nhai.gov".into(),
        },
        User {
            user_id: UserId("U-102".into()),
            name: "Neha Kapoor".into(),
            role: UserRole::Maintenance,
            email: "neha.kapoor@nhai.gov".into(),
        },
    ]
}

fn pilot_framework() -> PilotFramework {
    PilotFramework {
        pilot_id: "Pilot-NH44".into(),
        zone_id: ZoneId("NH44-Z01".into()),
        kpis: vec!["Uptime".into(), "Energy Savings".into(), "Response Time".into()],
        duration_months: 6,
        success_thresholds: BTreeMap::from([
            ("uptimePct".to_string(), 99.0),
            ("energySavingsPct".to_string(), 20.0),
            ("responseTimeMinutes".to_string(), 90.0),
        ]),
    }
}

/// The full demo snapshot: two zones (8 + 6 poles), two open faults, one resolved.
pub fn snapshot() -> Snapshot {
    let zones = zones();
    let assets = assets(&zones);
    let faults = faults();
    let snapshot = Snapshot {
        controllers: controllers(&assets),
        telemetry: telemetry(&assets, &faults),
        zones,
        assets,
        faults,
        maintenance_tickets: tickets(),
        energy_summary: energy_summary(),
        automation_rules: automation_rules(),
        users: users(),
        pilot_framework: Some(pilot_framework()),
    };
    debug!(
        "Mock: built snapshot (zones={}, poles={}, faults={}, tickets={})",
        snapshot.zones.len(),
        snapshot.assets.len(),
        snapshot.faults.len(),
        snapshot.maintenance_tickets.len()
    );
    snapshot
}

/// Highest trailing number among pole ids, plus one. `None` once `u32` is exhausted.
fn next_pole_number(assets: &[Asset]) -> Option<u32> {
    let max = assets
        .iter()
        .filter_map(|a| {
            let id = a.pole_id.0.as_str();
            let digits_from = id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
            id[digits_from..].parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);
    max.checked_add(1)
}

/// Random point within half the zone length (in degrees) of its centroid.
fn sample_within_zone<R: Rng + ?Sized>(zone: &Zone, rng: &mut R) -> GeoPoint {
    let delta = zone.length_km / 2.0 / KM_PER_DEG;
    GeoPoint {
        lat: zone.latitude + rng.random_range(-1.0..=1.0) * delta,
        lng: zone.longitude + rng.random_range(-1.0..=1.0) * delta,
    }
}

/// New snapshot with one freshly commissioned pole in `zone_id`.
///
/// The pole gets a controller and an `ON` reading stamped `now`, and the zone's
/// pole count is bumped. `base` is left untouched. Unknown zone, or no pole
/// number left after the highest existing one, gives `None`.
pub fn add_pole<R: Rng + ?Sized>(base: &Snapshot, zone_id: &ZoneId, now: DateTime<Utc>, rng: &mut R) -> Option<Snapshot> {
    let zone = base.zones.iter().find(|z| &z.zone_id == zone_id)?;
    let Some(number) = next_pole_number(&base.assets) else {
        warn!("Mock: no pole number left after the highest existing id");
        return None;
    };
    let pole = pole_id(number);
    let controller = controller_id(number);

    let mut next = base.clone();
    next.assets.push(Asset {
        pole_id: pole.clone(),
        zone_id: zone.zone_id.clone(),
        gps: sample_within_zone(zone, rng),
        fixture_type: FIXTURE_TYPES[0].to_string(),
        controller_id: controller.clone(),
        installed_on: now.date_naive(),
        status: AssetStatus::Active,
    });
    next.controllers.push(Controller {
        controller_id: controller,
        firmware: "v1.2.3".into(),
        last_seen: now,
        connectivity: Connectivity::FourG,
    });
    next.telemetry.push(Telemetry {
        pole_id: pole.clone(),
        timestamp: now,
        state: LampState::On,
        voltage: 229.2,
        current: 0.48,
        power_w: 110.4,
        energy_kwh: 2.1,
        ambient_lux: 14.0,
        temperature_c: 31.2,
        dimming_level: None,
        fault_code: None,
    });
    for z in next.zones.iter_mut().filter(|z| &z.zone_id == zone_id) {
        z.poles += 1;
    }

    info!("Mock: commissioned pole {} in zone {}", pole.0, zone_id.0);
    Some(next)
}
