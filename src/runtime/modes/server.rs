//! Server mode
//!
//! Builds the actix-web application and runs the HTTP server.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::{AppStartTime, health_routes, visitor_routes};
use crate::config::{CorsConfig, StaticConfig};
use crate::runtime::lifetime;
use crate::services::VisitorService;

/// Build CORS middleware from configuration
///
/// `*` (the default) allows any origin.
pub fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    let mut cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(cors_config.max_age as usize);

    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Build the application with all routes and middleware
///
/// Shared by the server and the integration tests. Arguments are taken by
/// value so the returned app does not borrow from the caller.
pub fn build_app(
    visitor_service: VisitorService,
    app_start_time: AppStartTime,
    cors_config: CorsConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(build_cors_middleware(&cors_config))
        .wrap(RequestIdMiddleware)
        .app_data(web::Data::new(visitor_service))
        .app_data(web::Data::new(app_start_time))
        .service(health_routes())
        .configure(visitor_routes)
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup(config);
    let visitor_service = startup.visitor_service;

    if config.cors.allowed_origins.is_empty() {
        warn!("CORS allowed_origins is empty, cross-origin requests will be rejected");
    }
    let cors_config = config.cors.clone();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!(
        "Starting server at http://{} with {} workers",
        bind_address, config.server.cpu_count
    );

    HttpServer::new(move || {
        build_app(
            visitor_service.clone(),
            app_start_time.clone(),
            cors_config.clone(),
        )
    })
    .workers(config.server.cpu_count.max(1))
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    warn!("Server stopped");
    Ok(())
}
