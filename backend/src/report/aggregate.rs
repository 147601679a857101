//! Timesheet aggregation.
//!
//! A timesheet has one `total_hours_<day><week>` cell per weekday and week.
//! The aggregate counts the cells with a positive number of hours and sums
//! them. Anything that does not parse as a finite number is skipped without
//! an error; the per-cell [`CellHours`] breakdown keeps track of what was
//! skipped so the diagnostic endpoint can show it.

use common::model::submission::Submission;
use log::debug;
use std::collections::BTreeMap;

const HOURS_PREFIX: &str = "total_hours_";

/// Weekday codes used in timesheet field names, with their display labels.
/// `th` must be tried before `t` when matching a field suffix.
pub const WEEKDAYS: [(&str, &str); 5] = [
    ("m", "Monday"),
    ("t", "Tuesday"),
    ("w", "Wednesday"),
    ("th", "Thursday"),
    ("f", "Friday"),
];

/// Number of weeks printed on a timesheet.
pub const WEEKS: u32 = 5;

/// How a single `total_hours_*` cell was treated.
#[derive(Debug, Clone, PartialEq)]
pub enum CellHours {
    /// A positive number of hours; counts as a day worked.
    Counted(f64),
    /// Parsed, but zero or negative.
    NotPositive(f64),
    /// Not a finite number; holds the raw text.
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub total_days: u32,
    pub total_hours: f64,
    /// Non-empty weekday cells keyed by field name.
    pub breakdown: BTreeMap<String, CellHours>,
}

impl Aggregate {
    /// The summed hours as printed on the report.
    pub fn total_hours_all(&self) -> String {
        format!("{:.2}", self.total_hours)
    }

    /// Writes `total_days` and `total_hours_all` into the submission.
    pub fn apply_to(&self, submission: &mut Submission) {
        submission.insert("total_days", self.total_days.to_string());
        submission.insert("total_hours_all", self.total_hours_all());
    }
}

pub fn aggregate(submission: &Submission) -> Aggregate {
    let mut result = Aggregate::default();

    for (key, value) in submission.iter() {
        if !is_weekday_hours_field(key) {
            continue;
        }
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }

        let cell = match trimmed.parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours > 0.0 => {
                result.total_days += 1;
                result.total_hours += hours;
                CellHours::Counted(hours)
            }
            Ok(hours) if hours.is_finite() => CellHours::NotPositive(hours),
            _ => {
                debug!("Invalid hours value for {}: {:?}", key, value);
                CellHours::Invalid(value.to_string())
            }
        };
        result.breakdown.insert(key.to_string(), cell);
    }

    debug!(
        "Aggregated timesheet: {} days, {} hours",
        result.total_days,
        result.total_hours_all()
    );
    result
}

/// Matches `total_hours_<day><week>` where `<day>` is a weekday code and
/// `<week>` a positive integer. `total_hours_all` and friends do not match.
pub fn is_weekday_hours_field(key: &str) -> bool {
    let Some(rest) = key.strip_prefix(HOURS_PREFIX) else {
        return false;
    };
    WEEKDAYS.iter().any(|(code, _)| {
        rest.strip_prefix(code).is_some_and(|week| {
            is_digits(week) && week.parse::<u32>().is_ok_and(|w| w > 0)
        })
    })
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
