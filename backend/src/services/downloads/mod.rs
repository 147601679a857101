//! # Download Service
//!
//! Serves reports stored by the submit endpoints at
//! `GET /download/{filename}`.
//!
//! The route captures the rest of the path, slashes included, so traversal
//! attempts such as `/download/../../etc/passwd` reach the filename check and
//! get a `400` instead of falling through the router.
//!
//! - `400 {error: "Invalid filename"}`: the name is not a safe filename.
//! - `404 {error: "File not found", requested}`: nothing stored under it.
//! - `403 {error: "File not accessible"}`: the file cannot be opened.
//! - `500 {error}`: anything else.

use crate::error::ReportError;
use crate::report::artifact::ArtifactError;
use crate::services::attachment;
use crate::state::AppState;
use actix_files::NamedFile;
use actix_web::web::{self, get};
use actix_web::{HttpRequest, HttpResponse};
use common::responses::DownloadError;
use log::error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/download/{filename:.*}", get().to(process));
}

pub async fn process(
    req: HttpRequest,
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let filename = filename.into_inner();
    let store = state.pipeline.store();

    let path = match store.resolve(&filename) {
        Ok(path) => path,
        Err(e) => return download_error(&state, &filename, e),
    };

    match NamedFile::open(&path) {
        Ok(file) => file
            .set_content_disposition(attachment(&filename))
            .into_response(&req),
        Err(e) => {
            error!("Error serving download {}: {}", path.display(), e);
            download_error(&state, &filename, ArtifactError::Io(e))
        }
    }
}

fn download_error(state: &AppState, filename: &str, err: ArtifactError) -> HttpResponse {
    let body = match &err {
        ArtifactError::InvalidName(_) => DownloadError {
            error: "Invalid filename".to_string(),
            requested: None,
        },
        ArtifactError::NotFound(_) => {
            let store = state.pipeline.store();
            error!("File not found: {}", store.base_dir().join(filename).display());
            match store.list() {
                Ok(files) => error!(
                    "Available files in {}: {:?}",
                    store.base_dir().display(),
                    files
                ),
                Err(e) => error!("Could not list temp directory: {}", e),
            }
            DownloadError {
                error: "File not found".to_string(),
                requested: Some(filename.to_string()),
            }
        }
        ArtifactError::Forbidden(_) => {
            error!("File not readable: {}", filename);
            DownloadError {
                error: "File not accessible".to_string(),
                requested: None,
            }
        }
        ArtifactError::Io(e) => {
            error!("Error serving download: {}", e);
            DownloadError {
                error: e.to_string(),
                requested: None,
            }
        }
    };
    HttpResponse::build(ReportError::from(err).status_code()).json(body)
}
