use thiserror::Error;

use crate::filters::{FilterKey, Tour};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("'{0}' is an invalid attribute.")]
    UnknownKey(String),

    #[error("{message}")]
    InvalidValue { key: FilterKey, message: String },

    #[error("Invalid value type for key '{key}'. {expected}")]
    InvalidType { key: FilterKey, expected: &'static str },

    #[error("{message}")]
    IllegalCombination { key: FilterKey, message: &'static str },

    #[error("'start date' and 'end date' must both be present or absent in your 'attrs' dict.")]
    IncompleteRange,

    #[error("Key '{key}' needs a tour ('ATP' or 'WTA') to encode the value '{value}'.")]
    TourRequired { key: FilterKey, value: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl EncodeError {
    pub(crate) fn invalid(key: FilterKey, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "There were no direct matches for '{name}' on the {tour} tour. \
         Did you provide a valid name? Did you provide the proper tour?"
    )]
    NoMatch { name: String, tour: Tour },

    /// More than one player survived; `candidates` holds up to ten of them.
    #[error(
        "Your name pulled up multiple matches, including:\n'{}'.\n\
         If you see a match, copy it and re-run. Otherwise, be more specific \
         if possible, providing full first *and* last names.",
        .candidates.join("', '")
    )]
    AmbiguousMatch { name: String, candidates: Vec<String> },

    #[error("player directory unavailable: {0}")]
    Directory(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out after {waited_ms} ms waiting for {what}")]
    Timeout { what: String, waited_ms: u128 },

    #[error("no element matches '{0}'")]
    MissingElement(String),

    #[error("webdriver {command} failed: {message}")]
    Protocol { command: String, message: String },

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(
        "Your query returned a blank page. The package likely produced an invalid URL. \
         Try another search and open an issue about these filters in the repository, if you may."
    )]
    EmptyResult,

    #[error("Your filters produced no matches. Try making them less stringent?")]
    NoMatches,

    #[error(
        "Unexpected result on website (found <{found}> instead of a table). Something likely \
         failed inside this package. Try a different query and open an issue about these \
         filters in the repository, if you may."
    )]
    UnexpectedPage { found: String },

    #[error("Unexpected 'Result' string in row {row} ({reason}): {text:?}")]
    UnparseableResult {
        row: usize,
        reason: &'static str,
        text: String,
    },

    #[error("table fragment {index} shares no columns with the tables before it")]
    Join { index: usize },

    #[error("column '{0}' is missing; column names/order might have changed")]
    MissingColumn(String),

    #[error("percentage {value} in column '{column}' is outside 0-100")]
    PercentOutOfRange { column: String, value: f64 },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Ineligible tour '{0}'. Should be ATP or WTA.")]
    InvalidTour(String),

    #[error("Unexpected URL '{0}'.")]
    InvalidUrl(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
