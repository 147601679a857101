use actix_web::{HttpResponse, Responder};
use common::responses::VersionInfo;

pub const APP_NAME: &str = "FuelTime";
pub const ORGANIZATION: &str = "Obion County Schools";

pub async fn process() -> impl Responder {
    HttpResponse::Ok().json(VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app: APP_NAME.to_string(),
        organization: ORGANIZATION.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::services::diagnostics::configure_routes;
    use actix_web::{test, App};
    use common::responses::VersionInfo;

    #[actix_web::test]
    async fn version_reports_package_version() {
        let app = test::init_service(App::new().configure(configure_routes)).await;
        let req = test::TestRequest::get().uri("/version").to_request();
        let body: VersionInfo = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.version, "1.0.2");
        assert_eq!(body.app, "FuelTime");
        assert_eq!(body.organization, "Obion County Schools");
    }
}
