//! Environment-driven knobs for a probe run.

use serde::{Deserialize, Serialize};

pub const ENV_RESOLVE_NAMES: &str = "DRSPROBE_RESOLVE_NAMES";
pub const ENV_PREDEFINED_VALUES: &str = "DRSPROBE_PREDEFINED_VALUES";
pub const ENV_DEBUG: &str = "DRSPROBE_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Look up display names for surviving settings.
    pub resolve_setting_names: bool,
    /// Decode a setting's predefined value when the driver marks it valid.
    pub decode_predefined_values: bool,
    pub debug: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            resolve_setting_names: true,
            decode_predefined_values: true,
            debug: false,
        }
    }
}

impl ProbeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            resolve_setting_names: flag(lookup(ENV_RESOLVE_NAMES), d.resolve_setting_names),
            decode_predefined_values: flag(
                lookup(ENV_PREDEFINED_VALUES),
                d.decode_predefined_values,
            ),
            debug: flag(lookup(ENV_DEBUG), d.debug),
        }
    }
}

fn flag(raw: Option<String>, default: bool) -> bool {
    let Some(v) = raw else { return default };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
