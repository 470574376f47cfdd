use super::CliError;
use anyhow::Context;
use simularium_core::common::AgentOverrides;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub(super) fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

pub(super) fn load_agent_overrides(path: &Path) -> Result<AgentOverrides, CliError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read agent params file '{}'", path.display()))?;
    AgentOverrides::from_json_str(&content).map_err(|error| {
        CliError::Usage(format!(
            "invalid agent params file '{}': {}",
            path.display(),
            error
        ))
    })
}

pub(super) fn format_triple(values: [f64; 3]) -> String {
    format!("[{}, {}, {}]", values[0], values[1], values[2])
}

pub(super) fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub(super) fn parse_positive_f64(value: &str) -> Result<f64, String> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(format!("'{}' must be finite and > 0", value))
    }
}
