use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

use crate::config::ContactInfo;

/// Start the metrics HTTP server
/// This should be called in a separate thread/runtime to avoid conflicts
pub async fn start_metrics_server(
    registry: Arc<Registry>,
    contact: ContactInfo,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    let contact = web::Data::new(contact);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .app_data(contact.clone())
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
            .route("/build-info", web::get().to(build_info_handler))
            .route("/contact-info", web::get().to(contact_info_handler))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(registry: web::Data<Arc<Registry>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "accounts-service"
    }))
}

async fn build_info_handler() -> impl Responder {
    HttpResponse::Ok().body(env!("CARGO_PKG_VERSION"))
}

async fn contact_info_handler(contact: web::Data<ContactInfo>) -> impl Responder {
    HttpResponse::Ok().json(contact.get_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, test};

    #[actix_web::test]
    async fn test_health_reports_service_name() {
        let app = test::init_service(App::new().route("/health", web::get().to(health_handler))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

        assert!(resp.status().is_success());
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "accounts-service");
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_exposes_registry() {
        let metrics = crate::metrics::Metrics::new().unwrap();
        metrics.record_operation("create", "ok", 0.01);
        let registry = Arc::new(metrics.registry().clone());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(registry))
                .route("/metrics", web::get().to(metrics_handler)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;

        assert!(resp.status().is_success());
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("accounts_operations_total"));
    }

    #[actix_web::test]
    async fn test_build_info_reports_package_version() {
        let app = test::init_service(App::new().route("/build-info", web::get().to(build_info_handler))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/build-info").to_request()).await;

        assert!(resp.status().is_success());
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], env!("CARGO_PKG_VERSION").as_bytes());
    }

    #[actix_web::test]
    async fn test_contact_info_serves_configured_contacts() {
        let mut contact = ContactInfo::default();
        contact.contact_details.insert("email".to_string(), "jane@example.com".to_string());
        contact.on_call_support.push("9000000001".to_string());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(contact))
                .route("/contact-info", web::get().to(contact_info_handler)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/contact-info").to_request()).await;

        assert!(resp.status().is_success());
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Welcome to the accounts service");
        assert_eq!(json["contactDetails"]["email"], "jane@example.com");
        assert_eq!(json["onCallSupport"][0], "9000000001");
    }
}
