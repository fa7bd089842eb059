//! Error types for timewindow operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeWindowError {
    #[error("Missing parameter: '{0}'")]
    MissingParameter(String),

    #[error("Invalid parameter: '{0}'")]
    InvalidParameter(String),

    #[error("Inverted range: the end time precedes the start time")]
    InvertedRange,

    #[error("Cannot parse date: '{0}'")]
    ParseFailure(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error(
        "Parameter '{key}' is {length} characters long, exceeding the maximum length of {maximum} characters"
    )]
    ParameterTooLong {
        key: String,
        length: usize,
        maximum: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, TimeWindowError>;
