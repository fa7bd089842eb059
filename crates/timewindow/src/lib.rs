//! # timewindow
//!
//! Timezone-aware time windows for request handlers.
//!
//! Converts untrusted request input (free text, UNIX timestamps, calendar
//! dates) into validated, localized time ranges, and enumerates calendar
//! grids (month lists, month timeframes, day boundaries) consistently across
//! the local/UTC boundary. Everything is stateless: the process timezone is
//! injected once into a [`TimeWindow`] and only read afterwards.
//!
//! ## Modules
//!
//! - [`window`] — [`TimeWindow`], [`TimeRange`], localization, range extraction, calendar enumeration
//! - [`parser`] — Pluggable free-text date grammar
//! - [`params`] — Request-parameter lookup and the quiet integer conversion
//! - [`calendar`] — [`YearMonth`] values
//! - [`format`] — Human-readable instants with ordinal days
//! - [`config`] — Process settings (timezone, month-list epoch)
//! - [`color`] — Bootstrap contextual colours
//! - [`mail`] — Outbound mail assembly over a pluggable transport
//! - [`image`] — Image scaling geometry and upload naming over a pluggable resizer
//! - [`error`] — Error types

pub mod calendar;
pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod image;
pub mod mail;
pub mod params;
pub mod parser;
pub mod window;

pub use calendar::YearMonth;
pub use color::{bootstrap_primary_color, BootstrapColor};
pub use config::{parse_timezone, Settings};
pub use error::{Result, TimeWindowError};
pub use format::{format_datetime, ordinal_suffix};
pub use image::{resize_image, scaled_dimensions, task_image_filename, ImageResizer};
pub use mail::{send_mail, Attachment, MailMessage, MailTransport};
pub use params::{parameter_string, quiet_int, require_parameter_string, ParameterSource};
pub use parser::{DateParser, PermissiveDateParser};
pub use window::{
    localize_in, localize_start_in, DayBoundary, SerializedRange, TimeRange, TimeWindow,
};
