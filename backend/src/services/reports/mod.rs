//! # Report Service Module
//!
//! Endpoints that take a form submission and produce a PDF.
//!
//! ## Sub-modules:
//! - `submit`: renders the report, stores it and answers with a download URL.
//! - `preview`: renders the report and streams it back immediately.

mod preview;
mod submit;

use actix_web::web::{self, post};
use common::model::report::ReportKind;

/// Registers the report routes.
///
/// # Registered Routes:
///
/// *   **`POST /submit`** / **`POST /submit-timesheet`**:
///     - **Handlers**: `submit::fuel`, `submit::timesheet`
///     - **Description**: Takes the form fields as a JSON object, renders the
///       fuel report or timesheet and stores it. Responds with
///       `{success, message, download_url}`.
///
/// *   **`POST /preview-pdf`** / **`POST /preview-timesheet-pdf`**:
///     - **Handlers**: `preview::fuel`, `preview::timesheet`
///     - **Description**: Same input, but the PDF itself is the response,
///       sent as an attachment. Nothing is stored.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/submit", post().to(submit::fuel))
        .route("/submit-timesheet", post().to(submit::timesheet))
        .route("/preview-pdf", post().to(preview::fuel))
        .route("/preview-timesheet-pdf", post().to(preview::timesheet));
}

/// What the error messages call the thing that failed to generate.
fn failure_subject(kind: ReportKind, preview: bool) -> &'static str {
    match (kind, preview) {
        (ReportKind::Fuel, false) => "report",
        (ReportKind::Timesheet, false) => "timesheet",
        (ReportKind::Fuel, true) => "PDF",
        (ReportKind::Timesheet, true) => "timesheet PDF",
    }
}
