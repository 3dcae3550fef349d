use core_types::DEFAULT_POLL_PERIOD;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Observer-wide runtime settings.
///
/// ```toml
/// period_ms = 30
/// log_records = false
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ObserverSettings {
    /// Poll period in milliseconds.
    pub period_ms: u64,
    /// Emit one `trace` line per delivered record.
    pub log_records: bool,
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_POLL_PERIOD.as_millis() as u64,
            log_records: false,
        }
    }
}

impl ObserverSettings {
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(input).map_err(SettingsError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.period_ms == 0 {
            return Err(SettingsError::ZeroPeriod);
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Parse(toml::de::Error),
    ZeroPeriod,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(err) => write!(f, "invalid observer settings: {err}"),
            SettingsError::ZeroPeriod => f.write_str("poll period must be non-zero"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Parse(err) => Some(err),
            SettingsError::ZeroPeriod => None,
        }
    }
}
