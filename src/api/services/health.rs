use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::api::constants::HEALTH_PREFIX;
use crate::services::VisitorService;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime: u64,
    pub log_backend: String,
    pub geoip_provider: String,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        service: web::Data<VisitorService>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let uptime = (chrono::Utc::now() - app_start_time.start_datetime)
            .num_seconds()
            .max(0) as u64;

        HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            uptime,
            log_backend: service.log_backend().to_string(),
            geoip_provider: service.geoip_provider().to_string(),
        })
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope(HEALTH_PREFIX)
        .route("", web::get().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
}
