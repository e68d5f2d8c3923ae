use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;

use crate::domain::order::OrderCommandHandler;
use crate::metrics::{metrics_handler, Metrics};

use super::errors::ApiError;
use super::orders;

/// Start the order HTTP server and run until SIGINT/SIGTERM.
pub async fn run(
    handler: OrderCommandHandler,
    metrics: Arc<Metrics>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("Starting order service on http://0.0.0.0:{}", port);

    let handler = web::Data::new(handler);
    let metrics = web::Data::new(metrics);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(handler.clone())
            .app_data(metrics.clone())
            .configure(routes)
    })
    .shutdown_timeout(10)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

/// Route table plus extractor configuration. Expects `Data<OrderCommandHandler>`
/// and `Data<Arc<Metrics>>` to be registered on the app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        ApiError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _| {
        ApiError::BadRequest(err.to_string()).into()
    }))
    .route("/", web::get().to(health_handler))
    .route("/metrics", web::get().to(metrics_handler))
    .service(
        web::scope("/orders")
            .service(
                web::resource("")
                    .route(web::post().to(orders::create))
                    .route(web::get().to(orders::list)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(orders::get_by_id))
                    .route(web::put().to(orders::update_by_id))
                    .route(web::delete().to(orders::delete_by_id)),
            ),
    );
}

async fn health_handler(handler: web::Data<OrderCommandHandler>) -> HttpResponse {
    match handler.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "order-service"
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "order-service"
            }))
        }
    }
}
