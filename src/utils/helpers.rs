//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use crate::utils::errors::{CollectivError, Result};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const PHONE_PATTERN: &str = r"^\+?[0-9]{6,15}$";

/// How a user was identified by a manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactIdentifier {
    Email(String),
    PhoneNumber(String),
}

impl ContactIdentifier {
    /// Values containing `@` are emails, anything else is a phone number
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CollectivError::invalid("Email or phone number is required"));
        }

        if value.contains('@') {
            if !matches_pattern(EMAIL_PATTERN, value)? {
                return Err(CollectivError::invalid(format!("{} is not a valid email", value)));
            }
            Ok(ContactIdentifier::Email(value.to_lowercase()))
        } else {
            let normalized: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
            if !matches_pattern(PHONE_PATTERN, &normalized)? {
                return Err(CollectivError::invalid(format!("{} is not a valid phone number", value)));
            }
            Ok(ContactIdentifier::PhoneNumber(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContactIdentifier::Email(value) | ContactIdentifier::PhoneNumber(value) => value,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContactIdentifier::Email(_) => "email",
            ContactIdentifier::PhoneNumber(_) => "phone number",
        }
    }
}

fn matches_pattern(pattern: &str, input: &str) -> Result<bool> {
    let regex = regex::Regex::new(pattern)
        .map_err(|_| CollectivError::Config("Invalid regex pattern".to_string()))?;
    Ok(regex.is_match(input))
}

/// Trim `value` and check its character count lies in `min..=max`
pub fn validate_trimmed_length(value: &str, min: usize, max: usize, field: &str) -> Result<String> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length < min || length > max {
        return Err(CollectivError::invalid(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Parse an ISO-8601 timestamp. Offsets are honoured; naive values are taken as UTC.
pub fn parse_iso_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(CollectivError::invalid(format!("{} must be a valid ISO date string", field)))
}

/// Running average after adding `new_value` to `count` previous values
pub fn update_average(new_value: f64, current_average: Option<f64>, count: i32) -> f64 {
    match current_average {
        Some(average) if count > 0 => (average * count as f64 + new_value) / (count as f64 + 1.0),
        _ => new_value,
    }
}

/// 00:00 UTC on the first day of the given month
fn start_of_month(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}

/// Half-open range covering the calendar month before `now`
pub fn previous_month_range(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (year, month) = shift_month(now.year(), now.month(), -1);
    let start = start_of_month(year, month);
    let end = start_of_month(now.year(), now.month());

    start
        .zip(end)
        .ok_or_else(|| CollectivError::invalid("Unable to compute previous month"))
}

/// First instant of the next month, 00:00 UTC, strictly after `now`
pub fn next_monthly_reset(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let (year, month) = shift_month(now.year(), now.month(), 1);
    start_of_month(year, month)
        .ok_or_else(|| CollectivError::invalid("Unable to compute next reset time"))
}

/// Content type for an uploaded image, from its extension
pub fn guess_image_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Extension of a file name, without the dot
pub fn file_extension(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .filter(|extension| !extension.is_empty())
}
