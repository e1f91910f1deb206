//! Checks pilot success thresholds against measured KPIs.

use crate::models::streetlight::PilotFramework;
use crate::services::kpis::DashboardKpis;
use serde::Serialize;

pub const UPTIME_PCT: &str = "uptimePct";
pub const ENERGY_SAVINGS_PCT: &str = "energySavingsPct";
pub const RESPONSE_TIME_MINUTES: &str = "responseTimeMinutes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Met,
    Missed,
    /// Threshold key has no known KPI behind it.
    NotEvaluated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdCheck {
    pub kpi: String,
    pub target: f64,
    pub actual: Option<f64>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotEvaluation {
    pub pilot_id: String,
    pub checks: Vec<ThresholdCheck>,
}

impl PilotEvaluation {
    /// True when every evaluated threshold is met and at least one was evaluated.
    pub fn passed(&self) -> bool {
        let mut evaluated = self.checks.iter().filter(|c| c.outcome != Outcome::NotEvaluated).peekable();
        evaluated.peek().is_some() && evaluated.all(|c| c.outcome == Outcome::Met)
    }
}

/// Uptime and savings must reach their target, response time must stay at or below it.
pub fn evaluate(pilot: &PilotFramework, kpis: &DashboardKpis) -> PilotEvaluation {
    let checks = pilot
        .success_thresholds
        .iter()
        .map(|(kpi, &target)| {
            let measured = match kpi.as_str() {
                UPTIME_PCT => Some((kpis.uptime_pct, kpis.uptime_pct >= target)),
                ENERGY_SAVINGS_PCT => Some((kpis.energy_savings_pct, kpis.energy_savings_pct >= target)),
                RESPONSE_TIME_MINUTES => Some((kpis.avg_response_minutes, kpis.avg_response_minutes <= target)),
                _ => None,
            };
            let (actual, outcome) = match measured {
                Some((value, true)) => (Some(value), Outcome::Met),
                Some((value, false)) => (Some(value), Outcome::Missed),
                None => (None, Outcome::NotEvaluated),
            };
            ThresholdCheck {
                kpi: kpi.clone(),
                target,
                actual,
                outcome,
            }
        })
        .collect();

    PilotEvaluation {
        pilot_id: pilot.pilot_id.clone(),
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::streetlight::ZoneId;
    use crate::services::kpis::EnergyTotals;
    use std::collections::BTreeMap;

    fn kpis(uptime: f64, savings_pct: f64, response: f64) -> DashboardKpis {
        DashboardKpis {
            uptime_pct: uptime,
            active_faults: 0,
            high_severity_faults: 0,
            energy: EnergyTotals::default(),
            energy_savings_pct: savings_pct,
            sla_compliance_pct: 100.0,
            avg_response_minutes: response,
            latest_telemetry: None,
        }
    }

    fn pilot(thresholds: &[(&str, f64)]) -> PilotFramework {
        PilotFramework {
            pilot_id: "Pilot-NH44".into(),
            zone_id: ZoneId("NH44-Z01".into()),
            kpis: vec![],
            duration_months: 6,
            success_thresholds: thresholds.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn thresholds_use_their_own_direction() {
        let framework = pilot(&[(UPTIME_PCT, 99.0), (ENERGY_SAVINGS_PCT, 20.0), (RESPONSE_TIME_MINUTES, 90.0)]);
        let eval = evaluate(&framework, &kpis(99.5, 25.0, 30.0));
        assert!(eval.passed());

        let slow = evaluate(&framework, &kpis(99.5, 25.0, 120.0));
        assert!(!slow.passed());
        let response = slow
            .checks
            .iter()
            .find(|c| c.kpi == RESPONSE_TIME_MINUTES)
            .expect("response check");
        assert_eq!(response.outcome, Outcome::Missed);
        assert_eq!(response.actual, Some(120.0));
    }

    #[test]
    fn unknown_thresholds_are_reported_not_failed() {
        let framework = pilot(&[(UPTIME_PCT, 97.0), ("mttrHours", 6.0)]);
        let eval = evaluate(&framework, &kpis(98.0, 0.0, 0.0));
        assert!(eval.passed());
        let mttr = eval.checks.iter().find(|c| c.kpi == "mttrHours").expect("mttr check");
        assert_eq!(mttr.outcome, Outcome::NotEvaluated);
        assert_eq!(mttr.actual, None);
    }

    #[test]
    fn nothing_evaluated_is_not_a_pass() {
        let eval = evaluate(&pilot(&[("mttrHours", 6.0)]), &kpis(100.0, 100.0, 0.0));
        assert!(!eval.passed());
    }
}
