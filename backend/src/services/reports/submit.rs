use super::failure_subject;
use crate::error::ReportError;
use crate::report::artifact::StoredArtifact;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::report::ReportKind;
use common::model::submission::Submission;
use common::responses::SubmitResponse;
use log::{error, info};

pub async fn fuel(state: web::Data<AppState>, payload: web::Json<Submission>) -> impl Responder {
    process(state, ReportKind::Fuel, payload.into_inner()).await
}

pub async fn timesheet(
    state: web::Data<AppState>,
    payload: web::Json<Submission>,
) -> impl Responder {
    process(state, ReportKind::Timesheet, payload.into_inner()).await
}

/// Wraps [`submit_report`] into the `{success, message, download_url}` body.
async fn process(state: web::Data<AppState>, kind: ReportKind, submission: Submission) -> HttpResponse {
    info!(
        "Received {} data for {}",
        kind.label().to_lowercase(),
        submission.get_or(kind.subject_field(), "Unknown")
    );

    match submit_report(&state, kind, submission).await {
        Ok(artifact) => {
            info!("{} stored at {}", kind.label(), artifact.path.display());
            HttpResponse::Ok().json(SubmitResponse::ok(
                format!("{} generated successfully! Click below to download.", kind.label()),
                artifact.download_url(),
            ))
        }
        Err(e) => {
            error!("Error processing {} submission: {}", kind.label().to_lowercase(), e);
            HttpResponse::build(e.status_code()).json(SubmitResponse::failed(format!(
                "Error generating {}: {}",
                failure_subject(kind, false),
                e
            )))
        }
    }
}

/// Runs render and store on the blocking pool; wkhtmltopdf blocks for the
/// whole render.
async fn submit_report(
    state: &AppState,
    kind: ReportKind,
    submission: Submission,
) -> Result<StoredArtifact, ReportError> {
    let pipeline = state.pipeline.clone();
    tokio::task::spawn_blocking(move || pipeline.submit(kind, submission)).await?
}
