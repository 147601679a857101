//! # Report Templates
//!
//! The HTML layouts live in `backend/templates` and are embedded into the
//! binary at compile time. A template refers to values with `{{ field }}`
//! placeholders; each placeholder is replaced with the matching value from a
//! [`TemplateContext`], or with nothing when the context has no such key.
//!
//! Submission values are HTML-escaped when they enter the context. The table
//! bodies built here (`fuel_rows`, `timesheet_rows`) are already markup and
//! go in untouched.

use crate::error::ReportError;
use crate::report::aggregate::{WEEKDAYS, WEEKS};
use common::model::report::ReportKind;
use common::model::submission::Submission;
use include_dir::{include_dir, Dir};
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write;

static TEMPLATE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Highest day number a fuel form carries.
const FUEL_DAYS: u32 = 31;
const FUEL_COLUMNS: [&str; 4] = ["date", "vehicle", "miles", "gallons"];
const TIMESHEET_COLUMNS: [&str; 5] = ["date", "time_in", "time_out", "code", "total_hours"];

fn template_name(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Fuel => "fuel_report.html",
        ReportKind::Timesheet => "timesheet_report.html",
    }
}

/// Values available to a template, already safe to splice into HTML.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: HashMap<String, String>,
}

impl TemplateContext {
    /// Starts a context holding every submission field, escaped.
    pub fn from_submission(submission: &Submission) -> Self {
        let mut ctx = Self::default();
        for (key, value) in submission.iter() {
            ctx.insert_text(key, value);
        }
        ctx
    }

    /// Inserts plain text; it is escaped.
    pub fn insert_text(&mut self, key: impl Into<String>, value: &str) {
        self.values.insert(key.into(), escape_html(value));
    }

    /// Inserts trusted markup verbatim.
    pub fn insert_markup(&mut self, key: impl Into<String>, markup: String) {
        self.values.insert(key.into(), markup);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// The embedded templates plus the compiled placeholder pattern.
pub struct Templates {
    placeholder: Regex,
}

impl Templates {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            placeholder: Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}")?,
        })
    }

    fn source(&self, kind: ReportKind) -> Result<&'static str, ReportError> {
        let name = template_name(kind);
        TEMPLATE_DIR
            .get_file(name)
            .and_then(|file| file.contents_utf8())
            .ok_or_else(|| ReportError::processing(format!("Template {} is missing", name)))
    }

    /// Renders the template for `kind` with the values in `ctx`.
    pub fn render(&self, kind: ReportKind, ctx: &TemplateContext) -> Result<String, ReportError> {
        let source = self.source(kind)?;
        let rendered = self
            .placeholder
            .replace_all(source, |caps: &regex::Captures| {
                ctx.get(&caps[1]).unwrap_or_default().to_string()
            });
        Ok(rendered.into_owned())
    }
}

/// Table rows for every fuel-form day that has at least one value.
pub fn fuel_rows(submission: &Submission) -> String {
    let mut rows = String::new();
    for day in 1..=FUEL_DAYS {
        let cells: Vec<&str> = FUEL_COLUMNS
            .iter()
            .map(|column| submission.get_or(&format!("{}_{}", column, day), ""))
            .collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push_str("<tr>");
        for cell in cells {
            let _ = write!(rows, "<td>{}</td>", escape_html(cell));
        }
        rows.push_str("</tr>\n");
    }
    rows
}

/// One row per weekday of every week, empty cells included, so the printed
/// timesheet always has the same shape.
pub fn timesheet_rows(submission: &Submission) -> String {
    let mut rows = String::new();
    for week in 1..=WEEKS {
        for (code, label) in WEEKDAYS {
            let _ = write!(rows, "<tr><td>{}</td><td>{}</td>", week, label);
            for column in TIMESHEET_COLUMNS {
                let value = submission.get_or(&format!("{}_{}{}", column, code, week), "");
                let _ = write!(rows, "<td>{}</td>", escape_html(value));
            }
            rows.push_str("</tr>\n");
        }
    }
    rows
}

/// Replaces the characters HTML treats specially with their entities.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
