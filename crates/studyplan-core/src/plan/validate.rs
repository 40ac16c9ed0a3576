//! Form input validation.
//!
//! Turns the three raw form fields into a [`ValidatedInput`] or a
//! [`ValidationError`]. Pure logic, no I/O.

use chrono::NaiveDate;
use thiserror::Error;

/// Date format accepted for each deadline token and used for the canonical
/// deadlines string.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Separator used when re-joining parsed deadlines.
pub const DEADLINE_SEPARATOR: &str = ", ";

/// Reasons a submission is rejected before any generation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid deadline {token:?} (expected YYYY-MM-DD)")]
    MalformedDeadlines { token: String },
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    /// Syllabus text exactly as submitted.
    pub syllabus: String,
    /// Parsed deadlines, in submission order.
    pub deadlines: Vec<NaiveDate>,
    /// Canonical `YYYY-MM-DD, YYYY-MM-DD` form of [`Self::deadlines`].
    pub canonical_deadlines: String,
    /// Hours per day exactly as submitted.
    pub available_time: String,
}

/// Validate the raw form fields.
///
/// Absent and empty fields are reported as [`ValidationError::MissingField`].
/// A whitespace-only field counts as present. Presence is checked for every
/// field before the deadlines are parsed.
pub fn validate_submission(
    syllabus: Option<&str>,
    deadlines: Option<&str>,
    available_time: Option<&str>,
) -> Result<ValidatedInput, ValidationError> {
    let syllabus = require("syllabus", syllabus)?;
    let raw_deadlines = require("deadlines", deadlines)?;
    let available_time = require("available_time", available_time)?;

    let deadlines = parse_deadlines(raw_deadlines)?;
    let canonical_deadlines = canonicalize(&deadlines);

    Ok(ValidatedInput {
        syllabus: syllabus.to_string(),
        deadlines,
        canonical_deadlines,
        available_time: available_time.to_string(),
    })
}

/// Split on commas, trim each token, and parse it as a calendar date.
///
/// Any token that is not a valid date (including an empty token left by a
/// stray comma) rejects the whole string.
pub fn parse_deadlines(raw: &str) -> Result<Vec<NaiveDate>, ValidationError> {
    raw.split(',').map(str::trim).map(parse_deadline).collect()
}

fn parse_deadline(token: &str) -> Result<NaiveDate, ValidationError> {
    let malformed = || ValidationError::MalformedDeadlines {
        token: token.to_string(),
    };
    if !is_date_shaped(token) {
        return Err(malformed());
    }
    NaiveDate::parse_from_str(token, DEADLINE_FORMAT).map_err(|_| malformed())
}

/// `YYYY-M[M]-D[D]` in ASCII digits. chrono alone would also take a signed
/// year or spaces before each number.
fn is_date_shaped(token: &str) -> bool {
    fn digits(part: Option<&str>, min: usize, max: usize) -> bool {
        part.is_some_and(|p| {
            (min..=max).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit())
        })
    }

    let mut parts = token.split('-');
    digits(parts.next(), 4, 4)
        && digits(parts.next(), 1, 2)
        && digits(parts.next(), 1, 2)
        && parts.next().is_none()
}

/// Re-serialize parsed dates as `YYYY-MM-DD` joined with `", "`.
pub fn canonicalize(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.format(DEADLINE_FORMAT).to_string())
        .collect::<Vec<_>>()
        .join(DEADLINE_SEPARATOR)
}

fn require<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(name)),
    }
}
