//! Environmental impact calculator: energy saved, CO₂ avoided, carbon credits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImpactInputs {
    pub baseline_kwh: f64,
    pub optimized_kwh: f64,
    /// Grid emission factor, kg CO₂ per kWh.
    pub grid_factor: f64,
    /// Price per carbon credit (one credit = one tonne CO₂).
    pub credit_price: f64,
    pub period_days: f64,
    /// Lit hours per night.
    pub lighting_hours: f64,
    pub luminaires: f64,
}

impl Default for ImpactInputs {
    fn default() -> Self {
        ImpactInputs {
            baseline_kwh: 125_000.0,
            optimized_kwh: 86_000.0,
            grid_factor: 0.82,
            credit_price: 12.0,
            period_days: 30.0,
            lighting_hours: 11.0,
            luminaires: 1800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMetrics {
    pub savings_kwh: f64,
    pub co2_saved_kg: f64,
    pub co2_saved_tons: f64,
    pub credits: f64,
    pub credit_value: f64,
    pub daily_savings_kwh: f64,
    pub annualized_savings_kwh: f64,
    pub avg_load_w: f64,
}

impl ImpactMetrics {
    /// Savings are clamped at zero; the period is treated as at least one day.
    pub fn compute(inputs: &ImpactInputs) -> Self {
        let savings_kwh = (inputs.baseline_kwh - inputs.optimized_kwh).max(0.0);
        let co2_saved_kg = savings_kwh * inputs.grid_factor;
        let co2_saved_tons = co2_saved_kg / 1000.0;
        let days = inputs.period_days.max(1.0);
        let avg_load_w = if inputs.luminaires > 0.0 {
            inputs.optimized_kwh * 1000.0 / (inputs.luminaires * inputs.lighting_hours * inputs.period_days)
        } else {
            0.0
        };

        ImpactMetrics {
            savings_kwh,
            co2_saved_kg,
            co2_saved_tons,
            credits: co2_saved_tons,
            credit_value: co2_saved_tons * inputs.credit_price,
            daily_savings_kwh: savings_kwh / days,
            annualized_savings_kwh: savings_kwh * (365.0 / days),
            avg_load_w: if avg_load_w.is_finite() { avg_load_w } else { 0.0 },
        }
    }
}
