//! Five-field cron schedules.
//!
//! ```text
//! ┌ minute        0-59
//! │ ┌ hour        0-23
//! │ │ ┌ day       1-31
//! │ │ │ ┌ month   1-12
//! │ │ │ │ ┌ weekday 0-7 (0 and 7 are Sunday) or Sun-Sat
//! * * * * *
//! ```
//! Parsing and matching are done by the `cron` crate, which wants a
//! leading seconds field and names weekdays from Sunday = 1. Expressions
//! are rewritten to that form once, at parse time. When both day fields are
//! restricted a time is due if either matches, as in classic cron.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Timelike, Utc};
use cron::Schedule as CronParser;

use crate::error::RegistryError;

const WEEKDAYS: [&str; 8] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A parsed cron expression.
#[derive(Debug, Clone)]
pub struct Schedule {
    expr: String,
    /// One parser, or two when both day fields are restricted.
    parsers: Vec<CronParser>,
}

impl Schedule {
    pub fn parse(expr: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidSchedule {
            expr: expr.to_string(),
            reason,
        };

        let fields: Vec<&str> = expr.split_whitespace().collect();
        let [minute, hour, day, month, weekday] = fields[..] else {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        };
        if fields.iter().any(|f| f.split(',').any(|p| p.ends_with("/0"))) {
            return Err(invalid("step must be greater than zero".to_string()));
        }
        let weekday = weekday_names(weekday).map_err(|r| invalid(format!("weekday: {r}")))?;

        let compile = |day: &str, weekday: &str| {
            CronParser::from_str(&format!("0 {minute} {hour} {day} {month} {weekday}"))
                .map_err(|e| invalid(e.to_string()))
        };
        let parsers = if !day.starts_with('*') && !weekday.starts_with('*') {
            vec![compile(day, "*")?, compile("*", &weekday)?]
        } else {
            vec![compile(day, &weekday)?]
        };

        Ok(Self {
            expr: fields.join(" "),
            parsers,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Whether the minute containing `at` is a scheduled one.
    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        let Some(minute) = at.with_second(0).and_then(|t| t.with_nanosecond(0)) else {
            return false;
        };
        let just_before = minute - Duration::seconds(1);
        self.parsers
            .iter()
            .any(|parser| parser.after(&just_before).next() == Some(minute))
    }
}

impl PartialEq for Schedule {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl Eq for Schedule {}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// Rewrite numeric weekdays (0-7, Sunday = 0 or 7) as names.
fn weekday_names(field: &str) -> Result<String, String> {
    let mut parts = Vec::new();
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (part, None),
        };

        let range = match range.split_once('-') {
            // `n-7` ends on Sunday, which sorts first for the parser
            Some((a, "7")) if step.is_none() && a != "0" => {
                format!("{}-Sat,Sun", weekday_name(a)?)
            }
            Some((a, b)) => format!("{}-{}", weekday_name(a)?, weekday_name(b)?),
            None if range == "*" => range.to_string(),
            None => weekday_name(range)?.to_string(),
        };

        parts.push(match step {
            Some(step) => format!("{range}/{step}"),
            None => range,
        });
    }
    Ok(parts.join(","))
}

fn weekday_name(raw: &str) -> Result<&str, String> {
    match raw.parse::<usize>() {
        Ok(n) => WEEKDAYS
            .get(n)
            .copied()
            .ok_or_else(|| format!("{n} is outside 0-7")),
        // Already a name; the parser checks it
        Err(_) => Ok(raw),
    }
}
