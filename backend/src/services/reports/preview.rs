use super::failure_subject;
use crate::error::ReportError;
use crate::report::RenderedReport;
use crate::services::attachment;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::report::ReportKind;
use common::model::submission::Submission;
use common::responses::SubmitResponse;
use log::error;

pub async fn fuel(state: web::Data<AppState>, payload: web::Json<Submission>) -> impl Responder {
    process(state, ReportKind::Fuel, payload.into_inner()).await
}

pub async fn timesheet(
    state: web::Data<AppState>,
    payload: web::Json<Submission>,
) -> impl Responder {
    process(state, ReportKind::Timesheet, payload.into_inner()).await
}

async fn process(state: web::Data<AppState>, kind: ReportKind, submission: Submission) -> HttpResponse {
    let pipeline = state.pipeline.clone();
    let rendered: Result<RenderedReport, ReportError> =
        match tokio::task::spawn_blocking(move || pipeline.render(kind, submission)).await {
            Ok(result) => result,
            Err(join_err) => Err(join_err.into()),
        };

    match rendered {
        Ok(report) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(attachment(&report.download_name))
            .body(report.bytes),
        Err(e) => {
            error!("Error generating {} preview: {}", kind.label().to_lowercase(), e);
            HttpResponse::build(e.status_code()).json(SubmitResponse::failed(format!(
                "Error generating {}: {}",
                failure_subject(kind, true),
                e
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::report::renderer::fake::{FixedRenderer, MissingRenderer};
    use crate::services::{json_config, reports, test_support};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use common::responses::SubmitResponse;
    use serde_json::json;
    use std::sync::Arc;

    #[actix_web::test]
    async fn preview_streams_pdf_as_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_support::state(Arc::new(FixedRenderer::new(b"%PDF-preview")), dir.path());
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(state.clone())
                .configure(reports::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/preview-timesheet-pdf")
            .set_json(json!({"emp_name": "Doe", "time_period": "Week 1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("Timesheet_Doe_Week_1.pdf"));

        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), b"%PDF-preview");
        assert!(state.pipeline.store().list().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn preview_failure_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_support::state(Arc::new(MissingRenderer), dir.path());
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(state)
                .configure(reports::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/preview-pdf")
            .set_json(json!({"name": "Doe"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: SubmitResponse = test::read_body_json(resp).await;
        assert!(!body.success);
        assert!(body.message.starts_with("Error generating PDF: "));
    }
}
