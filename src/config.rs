//! Runtime configuration from the environment (optionally seeded from a `.env` file).
//! Defaults target the console backend on localhost.

use crate::models::streetlight::ZoneId;
use crate::services::filter::FilterSpec;
use crate::services::impact::ImpactInputs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SNAPSHOT_URL: &str = "http://localhost:3000/api/snapshot";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Mock,
    File(PathBuf),
    Http { url: String, timeout: Duration },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    /// Window applied to faults, tickets and energy rows for the filtered report.
    pub filter: FilterSpec,
    /// Inputs for the environmental impact section of the report.
    pub impact: ImpactInputs,
    /// Commission one extra pole in this zone before reporting.
    pub commission_pole_in: Option<ZoneId>,
    /// Pretty-print the JSON report.
    pub report_pretty: bool,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn flag(name: &str, default: bool) -> bool {
    var(name)
        .map(|s| matches!(s.trim(), "1" | "true" | "TRUE"))
        .unwrap_or(default)
}

fn number(name: &str, default: f64) -> Result<f64, String> {
    match var(name) {
        Some(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("{} must be a finite number, got {:?}", name, s)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let source = match var("SNAPSHOT_SOURCE").as_deref().map(str::trim) {
            None | Some("mock") => SourceConfig::Mock,
            Some("file") => {
                let path = var("SNAPSHOT_PATH").ok_or_else(|| "SNAPSHOT_SOURCE=file requires SNAPSHOT_PATH".to_string())?;
                SourceConfig::File(PathBuf::from(path.trim()))
            }
            Some("http") => {
                let timeout_secs = var("SNAPSHOT_TIMEOUT_SECS")
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS);
                SourceConfig::Http {
                    url: var("SNAPSHOT_URL").unwrap_or_else(|| DEFAULT_SNAPSHOT_URL.to_string()),
                    timeout: Duration::from_secs(timeout_secs),
                }
            }
            Some(other) => {
                return Err(format!("SNAPSHOT_SOURCE must be one of mock, file, http (got {:?})", other));
            }
        };

        // Filter values are passed through verbatim; the filter itself degrades on bad dates.
        let filter = FilterSpec {
            zone: var("FILTER_ZONE").unwrap_or_default(),
            status: var("FILTER_STATUS").unwrap_or_default(),
            severity: var("FILTER_SEVERITY").unwrap_or_default(),
            start_date: var("FILTER_START_DATE").unwrap_or_default(),
            end_date: var("FILTER_END_DATE").unwrap_or_default(),
        };

        let defaults = ImpactInputs::default();
        let impact = ImpactInputs {
            baseline_kwh: number("IMPACT_BASELINE_KWH", defaults.baseline_kwh)?,
            optimized_kwh: number("IMPACT_OPTIMIZED_KWH", defaults.optimized_kwh)?,
            grid_factor: number("IMPACT_GRID_FACTOR", defaults.grid_factor)?,
            credit_price: number("IMPACT_CREDIT_PRICE", defaults.credit_price)?,
            period_days: number("IMPACT_PERIOD_DAYS", defaults.period_days)?,
            lighting_hours: number("IMPACT_LIGHTING_HOURS", defaults.lighting_hours)?,
            luminaires: number("IMPACT_LUMINAIRES", defaults.luminaires)?,
        };

        Ok(Config {
            source,
            filter,
            impact,
            commission_pole_in: var("COMMISSION_POLE_ZONE").map(|z| ZoneId(z.trim().to_string())),
            report_pretty: flag("REPORT_PRETTY", true),
        })
    }
}

/// Load `KEY=value` lines into the process environment. Variables that are
/// already set keep their value. Returns how many were applied.
pub fn load_env_file(path: &Path) -> Result<usize, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    let mut applied = 0;
    for (index, line) in contents.lines().enumerate() {
        let parsed = parse_env_line(line).map_err(|e| format!("{}:{}: {}", path.display(), index + 1, e))?;
        let Some((key, value)) = parsed else { continue };
        if std::env::var_os(&key).is_none() {
            // Mutating the process environment is unsafe once other threads may read it;
            // this runs before logging or any worker starts.
            unsafe {
                std::env::set_var(&key, value);
            }
            applied += 1;
        }
    }
    Ok(applied)
}

/// Parse one dotenv line. Blank lines and `#` comments give `Ok(None)`.
pub fn parse_env_line(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let assignment = trimmed.strip_prefix("export ").map_or(trimmed, str::trim_start);

    let (key, raw_value) = assignment
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.contains(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }

    Ok(Some((key.to_string(), parse_env_value(raw_value.trim())?)))
}

fn parse_env_value(raw: &str) -> Result<String, String> {
    let mut chars = raw.chars();
    let quote = match chars.next() {
        None => return Ok(String::new()),
        Some(q @ ('"' | '\'')) => q,
        Some(_) => {
            let unquoted = raw.split('#').next().unwrap_or_default();
            return Ok(unquoted.trim_end().to_string());
        }
    };

    let mut value = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quote == '"' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| "unterminated escape sequence in double-quoted value".to_string())?;
                value.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                });
            }
            c if c == quote => {
                let rest = chars.as_str().trim();
                return if rest.is_empty() || rest.starts_with('#') {
                    Ok(value)
                } else {
                    Err("unexpected characters after closing quote".to_string())
                };
            }
            c => value.push(c),
        }
    }
    Err(format!("unterminated {} value", if quote == '"' { "double-quoted" } else { "single-quoted" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> Option<(String, String)> {
        Some((k.to_string(), v.to_string()))
    }

    #[test]
    fn env_lines() {
        assert_eq!(parse_env_line("").unwrap(), None);
        assert_eq!(parse_env_line("   # comment").unwrap(), None);
        assert_eq!(parse_env_line("FILTER_ZONE=NH44-Z01").unwrap(), pair("FILTER_ZONE", "NH44-Z01"));
        assert_eq!(
            parse_env_line("export FILTER_END_DATE = 2026-01-27 # inclusive").unwrap(),
            pair("FILTER_END_DATE", "2026-01-27")
        );
        assert_eq!(parse_env_line("EMPTY=").unwrap(), pair("EMPTY", ""));
    }

    #[test]
    fn env_quoting() {
        assert_eq!(
            parse_env_line(r#"SNAPSHOT_URL="http://host/api#x" # trailing"#).unwrap(),
            pair("SNAPSHOT_URL", "http://host/api#x")
        );
        assert_eq!(parse_env_line(r#"A="line\nbreak""#).unwrap(), pair("A", "line\nbreak"));
        assert_eq!(parse_env_line(r"B='raw\n'").unwrap(), pair("B", r"raw\n"));
        assert!(parse_env_line(r#"C="open"#).is_err());
        assert!(parse_env_line(r#"D="x" y"#).is_err());
        assert!(parse_env_line("NO_EQUALS").is_err());
        assert!(parse_env_line("BAD KEY=1").is_err());
        assert!(parse_env_line("=1").is_err());
    }
}
