//! # Diagnostics
//!
//! Endpoints for operators checking a deployment. None of them change state.
//!
//! - `GET /version`: build version, application and organization name.
//! - `GET /debug/temp`: scratch directory contents and a live engine check,
//!   along with the display server and font availability on the host.
//! - `GET /debug/environment`: platform and runtime facts.
//! - `POST /debug/test-timesheet-data`: runs the timesheet aggregator over a
//!   submission and shows how every weekday cell was counted.
//! - `GET /logo`, `GET /logo-data`, `GET /test-logo`: the logo that gets
//!   embedded in reports, served raw, as a `data:` URL, or as a status check.

pub mod debug;
pub mod logo;
pub mod version;

use actix_web::web::{self, get, post};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/version", get().to(version::process))
        .route("/debug/temp", get().to(debug::temp))
        .route("/debug/environment", get().to(debug::environment))
        .route("/debug/test-timesheet-data", post().to(debug::test_timesheet_data))
        .route("/logo", get().to(logo::serve))
        .route("/logo-data", get().to(logo::data_url))
        .route("/test-logo", get().to(logo::status));
}
