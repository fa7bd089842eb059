//! Bootstrap contextual colours.

use serde::{Deserialize, Serialize};

/// The contextual colour classes of the Bootstrap 3 palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapColor {
    Success,
    Info,
    Warning,
    Danger,
}

impl BootstrapColor {
    pub fn hex(self) -> &'static str {
        match self {
            BootstrapColor::Success => "#5cb85c",
            BootstrapColor::Info => "#5bc0de",
            BootstrapColor::Warning => "#f0ad4e",
            BootstrapColor::Danger => "#d9534f",
        }
    }

    /// Look up a colour by its class name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "success" => Some(BootstrapColor::Success),
            "info" => Some(BootstrapColor::Info),
            "warning" => Some(BootstrapColor::Warning),
            "danger" => Some(BootstrapColor::Danger),
            _ => None,
        }
    }
}

/// Hex code of the Bootstrap primary colour for `color_type`.
pub fn bootstrap_primary_color(color_type: &str) -> Option<&'static str> {
    BootstrapColor::from_name(color_type).map(BootstrapColor::hex)
}
