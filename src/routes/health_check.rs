use actix_web::{HttpResponse, Responder};

/// Liveness probe for the JSON API. It does not touch the subscriber store.
#[tracing::instrument(name = "JSON HealthCheck")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}
