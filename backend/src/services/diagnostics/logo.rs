use crate::report::logo_data_url;
use crate::state::AppState;
use actix_files::NamedFile;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::warn;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LogoStatus {
    pub logo_path: String,
    pub exists: bool,
    pub static_folder: String,
    pub static_url_path: &'static str,
}

/// The logo file, never cached by the browser.
pub async fn serve(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let path = state.pipeline.logo_path();
    let file = match NamedFile::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Logo not available at {}: {}", path.display(), e);
            return HttpResponse::NotFound().body("Logo not found");
        }
    };

    let mut resp = file
        .use_etag(false)
        .use_last_modified(false)
        .into_response(&req);
    let headers = resp.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    resp
}

pub async fn data_url(state: web::Data<AppState>) -> HttpResponse {
    let path = state.pipeline.logo_path();
    match std::fs::metadata(path) {
        Ok(_) => match logo_data_url(path) {
            Some(url) => HttpResponse::Ok().content_type("text/plain").body(url),
            None => HttpResponse::InternalServerError().body("Error: logo could not be read"),
        },
        Err(e) => HttpResponse::InternalServerError().body(format!("Error: {}", e)),
    }
}

pub async fn status(state: web::Data<AppState>) -> impl Responder {
    let path = state.pipeline.logo_path();
    web::Json(LogoStatus {
        logo_path: path.display().to_string(),
        exists: path.is_file(),
        static_folder: state.config.static_dir.display().to_string(),
        static_url_path: "/static",
    })
}
