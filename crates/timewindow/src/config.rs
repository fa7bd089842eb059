//! Process-wide settings.
//!
//! The process timezone is resolved once, when the host application starts,
//! and injected into a [`TimeWindow`] through [`Settings::time_window`].
//! Nothing in this crate reads it from ambient state afterwards.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::YearMonth;
use crate::error::{Result, TimeWindowError};
use crate::window::TimeWindow;

/// IANA name of the process timezone.
pub const TIMEZONE_ENV_VAR: &str = "TIMEWINDOW_TIMEZONE";
/// First month offered by month lists (`YYYY-MM` or `YYYY-MM-DD`).
pub const MONTH_EPOCH_ENV_VAR: &str = "TIMEWINDOW_MONTH_EPOCH";

const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IANA timezone name used whenever a caller supplies none.
    pub timezone: String,
    /// Default start of [`TimeWindow::month_list`].
    pub month_list_epoch: YearMonth,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            month_list_epoch: YearMonth::DEFAULT_EPOCH,
        }
    }
}

impl Settings {
    /// Settings from the process environment; unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from any key lookup shaped like the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(timezone) = read(TIMEZONE_ENV_VAR) {
            settings.timezone = timezone;
        }
        if let Some(epoch) = read(MONTH_EPOCH_ENV_VAR) {
            settings.month_list_epoch = epoch.parse().map_err(|_| {
                TimeWindowError::Config(format!("{MONTH_EPOCH_ENV_VAR}: '{epoch}'"))
            })?;
        }

        settings.timezone()?;
        debug!(
            timezone = %settings.timezone,
            epoch = %settings.month_list_epoch,
            "loaded settings"
        );
        Ok(settings)
    }

    /// Settings from a JSON document with `timezone` and `month_list_epoch` keys.
    pub fn from_json(document: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(document)
            .map_err(|e| TimeWindowError::Config(e.to_string()))?;
        settings.timezone()?;
        Ok(settings)
    }

    /// The configured timezone, validated against the IANA database.
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// A [`TimeWindow`] bound to these settings.
    pub fn time_window(&self) -> Result<TimeWindow> {
        Ok(TimeWindow::new(self.timezone()?).with_month_list_epoch(self.month_list_epoch))
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| TimeWindowError::InvalidTimezone(format!("'{}'", s)))
}
