//! HTTP surface of the service.
//!
//! - `reports`: form submission and PDF preview.
//! - `downloads`: retrieval of stored reports.
//! - `diagnostics`: version, environment and engine health, logo helpers.
//!
//! Every module exposes a `configure_routes` function that `main` passes to
//! `App::configure`. The routes live at the root path, so they are
//! registered on the `ServiceConfig` rather than grouped in a `Scope`.

pub mod diagnostics;
pub mod downloads;
pub mod reports;

use crate::config::JSON_LIMIT_BYTES;
use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{error, web, HttpResponse};
use common::responses::SubmitResponse;
use log::error;

/// JSON extractor settings shared by every endpoint taking a submission.
/// Malformed bodies get the same `{success: false, message}` shape as any
/// other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| {
            error!("Rejected request body: {}", err);
            let response = HttpResponse::BadRequest()
                .json(SubmitResponse::failed(format!("Invalid form data: {}", err)));
            error::InternalError::from_response(err, response).into()
        })
}

/// `Content-Disposition: attachment` for `filename`. Names outside ASCII get
/// an underscored ASCII fallback plus the RFC 5987 `filename*` form.
pub fn attachment(filename: &str) -> ContentDisposition {
    let mut parameters = Vec::with_capacity(2);
    if filename.is_ascii() {
        parameters.push(DispositionParam::Filename(filename.to_string()));
    } else {
        let fallback: String = filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        parameters.push(DispositionParam::Filename(fallback));
        parameters.push(DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: filename.as_bytes().to_vec(),
        }));
    }
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_attachment_has_plain_filename() {
        let header = attachment("FuelReport_Doe_May_2025.pdf").to_string();
        assert_eq!(header, r#"attachment; filename="FuelReport_Doe_May_2025.pdf""#);
    }

    #[test]
    fn non_ascii_attachment_adds_extended_filename() {
        let header = attachment("Timesheet_José.pdf").to_string();
        assert!(header.contains(r#"filename="Timesheet_Jos_.pdf""#));
        assert!(header.contains("filename*=UTF-8''Timesheet_Jos%C3%A9.pdf"));
    }
}
