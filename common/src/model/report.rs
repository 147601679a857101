use serde::{Deserialize, Serialize};

/// The two report types the service knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Fuel,
    Timesheet,
}

impl ReportKind {
    /// Human readable label used in response messages.
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Fuel => "Fuel report",
            ReportKind::Timesheet => "Timesheet",
        }
    }

    /// Prefix of the scratch file written while a report is being stored.
    pub fn scratch_prefix(self) -> &'static str {
        match self {
            ReportKind::Fuel => "temp_fuel_report",
            ReportKind::Timesheet => "temp_timesheet",
        }
    }

    /// The submission field holding the person the report is about.
    pub fn subject_field(self) -> &'static str {
        match self {
            ReportKind::Fuel => "name",
            ReportKind::Timesheet => "emp_name",
        }
    }
}
