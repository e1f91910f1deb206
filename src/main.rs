pub mod models {
    pub mod streetlight;
}

pub mod client;
pub mod config;
pub mod snapshot;
pub mod utils;
pub mod services {
    pub mod filter;
    pub mod impact;
    pub mod kpis;
    pub mod lookup;
    pub mod mock;
    pub mod pilot;
    pub mod source;
}

use crate::client::SnapshotClient;
use crate::config::{Config, SourceConfig};
use crate::services::filter::FilterSpec;
use crate::services::impact::{ImpactInputs, ImpactMetrics};
use crate::services::kpis::{self, DashboardKpis, EnergyTotals};
use crate::services::lookup::LookupIndex;
use crate::services::mock;
use crate::services::pilot::{self, PilotEvaluation};
use crate::services::source::{self as sources, FileSource, HttpSource, MockSource, SnapshotSource};
use crate::snapshot::{Snapshot, SnapshotHandle};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
    applied: usize,
}

/// KPIs over the filtered faults, tickets and energy rows.
///
/// Telemetry is not narrowed by the filter, so `kpis.uptimePct` and
/// `kpis.latestTelemetry` are always fleet-wide, even under a zone filter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowReport {
    filter: FilterSpec,
    faults: usize,
    tickets: usize,
    energy_rows: usize,
    kpis: DashboardKpis,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenFaultDetail {
    fault_id: String,
    pole_id: String,
    severity: &'static str,
    lamp_state: Option<&'static str>,
    ticket_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    source: String,
    overall: DashboardKpis,
    window: WindowReport,
    energy_by_zone: BTreeMap<String, EnergyTotals>,
    open_faults: Vec<OpenFaultDetail>,
    impact_inputs: ImpactInputs,
    impact: ImpactMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pilot: Option<PilotEvaluation>,
}

fn build_source(cfg: &SourceConfig) -> Box<dyn SnapshotSource> {
    match cfg {
        SourceConfig::Mock => Box::new(MockSource),
        SourceConfig::File(path) => Box::new(FileSource { path: path.clone() }),
        SourceConfig::Http { url, timeout } => Box::new(HttpSource {
            client: SnapshotClient::new(url.clone(), *timeout),
        }),
    }
}

/// Detail-panel view of every pole that currently has an open fault.
fn open_fault_details(snapshot: &Snapshot) -> Vec<OpenFaultDetail> {
    let index = LookupIndex::build(snapshot);
    snapshot
        .assets
        .iter()
        .filter_map(|asset| {
            let fault = index.open_fault_for(&asset.pole_id)?;
            Some(OpenFaultDetail {
                fault_id: fault.fault_id.0.clone(),
                pole_id: asset.pole_id.0.clone(),
                severity: fault.severity.as_str(),
                lamp_state: index.current_reading_for(&asset.pole_id).map(|r| r.state.as_str()),
                ticket_id: index.ticket_for_fault(&fault.fault_id).map(|t| t.ticket_id.0.clone()),
            })
        })
        .collect()
}

fn build_report(source: String, snapshot: &Snapshot, cfg: &Config) -> Report {
    let overall = DashboardKpis::compute(snapshot);

    let windowed = snapshot.windowed(&cfg.filter);
    let window = WindowReport {
        filter: cfg.filter.clone(),
        faults: windowed.faults.len(),
        tickets: windowed.maintenance_tickets.len(),
        energy_rows: windowed.energy_summary.len(),
        kpis: DashboardKpis::compute(&windowed),
    };

    let pilot = snapshot.pilot_framework.as_ref().map(|p| pilot::evaluate(p, &overall));

    Report {
        source,
        energy_by_zone: kpis::energy_by_zone(&snapshot.energy_summary)
            .into_iter()
            .map(|(zone, totals)| (zone.0, totals))
            .collect(),
        open_faults: open_fault_details(snapshot),
        impact_inputs: cfg.impact,
        impact: ImpactMetrics::compute(&cfg.impact),
        overall,
        window,
        pilot,
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (source={:?}, filter_set={}, report_pretty={})",
        cfg.source,
        !cfg.filter.is_unset(),
        cfg.report_pretty
    );

    // 2) Fetch snapshot
    let source = build_source(&cfg.source);
    let handle = SnapshotHandle::new(sources::fetch_logged(source.as_ref())?);
    if let Some(zone) = cfg.commission_pole_in.as_ref() {
        let base = handle.current();
        let next = mock::add_pole(&base, zone, Utc::now(), &mut rand::rng())
            .ok_or_else(|| format!("cannot commission pole in zone {}: unknown zone or pole numbers exhausted", zone.0))?;
        handle.replace(next);
    }
    let snapshot = handle.current();

    // 3) Integrity check (report only)
    let issues = snapshot.integrity_issues();
    for issue in &issues {
        warn!("Snapshot integrity: {}", issue);
    }
    if issues.is_empty() {
        debug!("Snapshot integrity: no issues");
    }

    // 4) Compute and emit report
    let report = build_report(source.describe(), &snapshot, &cfg);
    info!(
        "KPIs: uptime={:.1}% active_faults={} sla={:.1}% avg_response={:.1}min latest={}",
        report.overall.uptime_pct,
        report.overall.active_faults,
        report.overall.sla_compliance_pct,
        report.overall.avg_response_minutes,
        report
            .overall
            .latest_telemetry
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );
    if let Some(p) = report.pilot.as_ref() {
        info!("Pilot {}: {}", p.pilot_id, if p.passed() { "on track" } else { "below target" });
    }

    let rendered = if cfg.report_pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| format!("serialize report failed: {}", e))?;
    println!("{}", rendered);

    Ok(())
}

fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    let mut args = std::env::args_os();
    args.next(); // program name

    let mut env_file: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        let path = match arg.to_str() {
            Some("--env-file") => args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| "`--env-file` requires a path argument".to_string())?,
            Some(s) if s.starts_with("--env-file=") => match s.split_once('=') {
                Some((_, p)) if !p.is_empty() => PathBuf::from(p),
                _ => return Err("`--env-file` requires a path argument".to_string()),
            },
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if env_file.replace(path).is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
    }

    let (path, explicit) = match env_file {
        Some(path) if path.is_file() => (path, true),
        Some(path) => return Err(format!("env file not found: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let default_path = cwd.join(".env");
            if !default_path.is_file() {
                return Ok(None);
            }
            (default_path, false)
        }
    };
    let applied = config::load_env_file(&path)?;
    Ok(Some(LoadedEnvFile {
        path,
        explicit,
        applied,
    }))
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!(
            "Environment loaded from {} .env file: {} ({} variable(s) applied)",
            origin,
            info.path.display(),
            info.applied
        );
    }

    info!(
        "streetlight-kpi {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(filter: FilterSpec) -> Config {
        Config {
            source: SourceConfig::Mock,
            filter,
            impact: ImpactInputs::default(),
            commission_pole_in: None,
            report_pretty: false,
        }
    }

    #[test]
    fn report_over_mock_fleet() {
        let snapshot = mock::snapshot();
        let cfg = config(FilterSpec {
            zone: "NH44-Z02".into(),
            ..FilterSpec::default()
        });
        let report = build_report("mock".into(), &snapshot, &cfg);

        assert_eq!(report.overall.active_faults, 2);
        assert_eq!(report.window.faults, 1);
        assert_eq!(report.window.energy_rows, 1);
        assert_eq!(report.window.tickets, 0);
        // Telemetry-derived figures stay fleet-wide under a zone filter.
        assert_eq!(report.window.kpis.uptime_pct, report.overall.uptime_pct);
        assert_eq!(report.window.kpis.latest_telemetry, report.overall.latest_telemetry);
        assert_eq!(report.energy_by_zone.len(), 2);
        assert!(report.pilot.is_some());

        let p002 = report
            .open_faults
            .iter()
            .find(|d| d.pole_id == "NH44-P002")
            .expect("P002 open fault");
        assert_eq!(p002.lamp_state, Some("FAULT"));
        assert_eq!(p002.ticket_id.as_deref(), Some("MT-501"));
        let p104 = report
            .open_faults
            .iter()
            .find(|d| d.pole_id == "NH44-P104")
            .expect("P104 open fault");
        assert_eq!(p104.ticket_id, None);

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["window"]["filter"]["zone"], "NH44-Z02");
        assert!(json["overall"]["latestTelemetry"].is_string());
    }

    #[test]
    fn empty_snapshot_reports_neutral_values() {
        let report = build_report("empty".into(), &Snapshot::default(), &config(FilterSpec::default()));
        assert_eq!(report.overall.uptime_pct, 0.0);
        assert_eq!(report.overall.sla_compliance_pct, 0.0);
        assert_eq!(report.overall.avg_response_minutes, 0.0);
        assert_eq!(report.overall.latest_telemetry, None);
        assert!(report.open_faults.is_empty());
        assert!(report.pilot.is_none());

        let json = serde_json::to_value(&report).expect("serialize");
        assert!(json["overall"]["latestTelemetry"].is_null());
    }
}
