//! Telemetry configuration.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `QN_LOG_LEVEL`, then `RUST_LOG` | `log_filter` | `info` |
//! | `QN_JSON_LOGS` | `json_logs` | `false` |
//! | `QN_CONSOLE_OUTPUT` | `console_output` | `true` |
//! | `OTEL_SERVICE_NAME` | `service_name` | `quantum-net` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `otlp_endpoint` | `http://localhost:4317` |
//! | `QN_OTLP_ENABLED` | `otlp_enabled` | `false` |

pub const DEFAULT_SERVICE_NAME: &str = "quantum-net";
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `qn_04_bb84=debug,info`.
    pub log_filter: String,
    pub json_logs: bool,
    /// Disable to keep only trace export.
    pub console_output: bool,
    pub service_name: String,
    pub otlp_endpoint: String,
    /// Only honoured when built with the `otlp` feature.
    pub otlp_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            json_logs: false,
            console_output: true,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            otlp_enabled: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_filter: lookup("QN_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
            json_logs: lookup("QN_JSON_LOGS")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logs),
            console_output: lookup("QN_CONSOLE_OUTPUT")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.console_output),
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint),
            otlp_enabled: lookup("QN_OTLP_ENABLED")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.otlp_enabled),
        }
    }
}

/// `true/1/on/yes` or `false/0/off/no`, case-insensitive.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}
