//! Request body validation.
//!
//! Bodies arrive as loose JSON objects. An [`Input`] walks one object,
//! converting each key with a small value parser and collecting every
//! failure into [`FieldErrors`], so a single response can name all the
//! offending fields at once.

pub mod payloads;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::models::{Boundaries, TextEnum};

pub use payloads::*;

/// Field name to reason, ordered for stable responses
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        // Keep the first complaint about a field
        self.0.entry(field.to_string()).or_insert_with(|| reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Cursor over one JSON object body.
pub struct Input<'a> {
    body: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Input<'a> {
    pub fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            errors: FieldErrors::default(),
        }
    }

    fn convert<T>(
        &mut self,
        key: &str,
        value: &Value,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        match parse(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                self.errors.add(key, reason);
                None
            }
        }
    }

    /// Must be present and non-null
    pub fn required<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        let body = self.body;
        match body.get(key) {
            None | Some(Value::Null) => {
                self.errors.add(key, "is required");
                None
            }
            Some(value) => self.convert(key, value, parse),
        }
    }

    /// Absent and null both mean "not given"
    pub fn optional<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        let body = self.body;
        match body.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.convert(key, value, parse),
        }
    }

    /// Update of a non-nullable column: absent leaves it alone, null is an error
    pub fn replace<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        let body = self.body;
        match body.get(key) {
            None => None,
            Some(Value::Null) => {
                self.errors.add(key, "cannot be null");
                None
            }
            Some(value) => self.convert(key, value, parse),
        }
    }

    /// Update of a nullable column: absent leaves it alone, null clears it
    pub fn nullable<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<Option<T>> {
        let body = self.body;
        match body.get(key) {
            None => None,
            Some(Value::Null) => Some(None),
            Some(value) => self.convert(key, value, parse).map(Some),
        }
    }

    /// Reject keys outside `allowed`. Keys listed in `immutable` get a more
    /// specific message.
    pub fn only(&mut self, allowed: &[&str], immutable: &[&str]) {
        let body = self.body;
        for key in body.keys() {
            if immutable.contains(&key.as_str()) {
                self.errors.add(key, "cannot be changed");
            } else if !allowed.contains(&key.as_str()) {
                self.errors.add(key, "is not a recognized field");
            }
        }
    }

    pub fn fail(&mut self, key: &str, reason: impl Into<String>) {
        self.errors.add(key, reason);
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

// Value parsers

/// Non-empty after trimming; the trimmed text is kept
pub fn text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) if s.trim().is_empty() => Err("must not be empty".to_string()),
        Value::String(s) => Ok(s.trim().to_string()),
        _ => Err("must be a string".to_string()),
    }
}

/// Non-empty, kept byte for byte
pub fn secret(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) if s.is_empty() => Err("must not be empty".to_string()),
        Value::String(s) => Ok(s.clone()),
        _ => Err("must be a string".to_string()),
    }
}

/// JSON number or numeric string
pub fn number(value: &Value) -> Result<f64, String> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
        .ok_or_else(|| "must be a number".to_string())
}

pub fn positive(value: &Value) -> Result<f64, String> {
    let n = number(value)?;
    if n > 0.0 {
        Ok(n)
    } else {
        Err("must be greater than 0".to_string())
    }
}

pub fn latitude(value: &Value) -> Result<f64, String> {
    bounded(number(value)?, -90.0, 90.0)
}

pub fn longitude(value: &Value) -> Result<f64, String> {
    bounded(number(value)?, -180.0, 180.0)
}

pub fn percentage(value: &Value) -> Result<f64, String> {
    bounded(number(value)?, 0.0, 100.0)
}

/// Whole number from 0 to 100
pub fn score(value: &Value) -> Result<i32, String> {
    let n = number(value)?;
    if n.fract() != 0.0 {
        return Err("must be a whole number".to_string());
    }
    bounded(n, 0.0, 100.0).map(|n| n as i32)
}

fn bounded(n: f64, min: f64, max: f64) -> Result<f64, String> {
    if (min..=max).contains(&n) {
        Ok(n)
    } else {
        Err(format!("must be between {} and {}", min, max))
    }
}

pub fn boolean(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err("must be a boolean".to_string()),
    }
}

/// RFC 3339 date-time, or a bare `YYYY-MM-DD` taken as midnight UTC
pub fn timestamp(value: &Value) -> Result<DateTime<Utc>, String> {
    let s = value
        .as_str()
        .ok_or_else(|| "must be a date string".to_string())?
        .trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .ok_or_else(|| "must be an ISO 8601 date or date-time".to_string())
}

pub fn uuid(value: &Value) -> Result<Uuid, String> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| "must be a valid id".to_string())
}

pub fn choice<T: TextEnum>(value: &Value) -> Result<T, String> {
    value
        .as_str()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| format!("must be one of: {}", T::choices()))
}

/// `local@domain.tld`, no whitespace
pub fn email(value: &Value) -> Result<String, String> {
    let s = text(value)?;
    let well_formed = match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
                    .unwrap_or(false)
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if well_formed {
        Ok(s)
    } else {
        Err("must be a valid email address".to_string())
    }
}

/// Polygon corners as `[[lat, lon], ...]`, or a string holding that JSON
pub fn boundaries(value: &Value) -> Result<Boundaries, String> {
    let parsed;
    let value = match value {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s)
                .map_err(|_| "must be a JSON array of [latitude, longitude] pairs".to_string())?;
            &parsed
        }
        other => other,
    };

    let points = value
        .as_array()
        .ok_or_else(|| "must be an array of [latitude, longitude] pairs".to_string())?;
    if points.len() < 3 {
        return Err("must have at least 3 points".to_string());
    }

    points
        .iter()
        .enumerate()
        .map(|(i, point)| match point.as_array().map(Vec::as_slice) {
            Some([lat, lon]) => {
                let lat = latitude(lat).map_err(|r| format!("point {}: latitude {}", i, r))?;
                let lon = longitude(lon).map_err(|r| format!("point {}: longitude {}", i, r))?;
                Ok([lat, lon])
            }
            _ => Err(format!("point {} must be a [latitude, longitude] pair", i)),
        })
        .collect()
}
