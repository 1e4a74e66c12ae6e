//! 访客事件上报接口
//!
//! POST /log-visitor：无论请求体是否合法、是否过大，定位或写入是否成功，都返回固定的确认响应。
//! 超过上限的请求体按空对象处理。

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::api::constants::{DASHBOARD_PATH, LOG_VISITOR_PATH, MAX_PAYLOAD_BYTES};
use crate::api::services::dashboard::DashboardService;
use crate::services::{RequestMeta, VisitPayload, VisitorService};

/// 上报确认响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAck {
    pub status: String,
    pub logged: bool,
}

impl LogAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            logged: true,
        }
    }
}

pub struct VisitorApi;

impl VisitorApi {
    pub async fn log_visitor(
        req: HttpRequest,
        body: web::Payload,
        service: web::Data<VisitorService>,
    ) -> impl Responder {
        let meta = RequestMeta::from_request(&req);
        let payload = match read_body(body, MAX_PAYLOAD_BYTES).await {
            Some(bytes) => {
                trace!("Received visitor event ({} bytes)", bytes.len());
                VisitPayload::from_body(&bytes)
            }
            None => VisitPayload::default(),
        };

        // 写入失败已在 service 中记录，这里始终返回成功
        let _ = service.record_visit(&meta, payload).await;

        HttpResponse::Ok().json(LogAck::ok())
    }
}

/// 读取请求体，超过 `limit` 或读取出错时返回 `None`
async fn read_body(mut payload: web::Payload, limit: usize) -> Option<web::Bytes> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!("Failed to read visitor event body: {}", e);
                return None;
            }
        };
        if body.len() + chunk.len() > limit {
            debug!("Visitor event body exceeds {} bytes, ignoring it", limit);
            return None;
        }
        body.extend_from_slice(&chunk);
    }
    Some(body.freeze())
}

/// 注册访客相关路由
pub fn visitor_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(LOG_VISITOR_PATH, web::post().to(VisitorApi::log_visitor))
        .route(
            DASHBOARD_PATH,
            web::get().to(DashboardService::view_logs_dashboard),
        );
}
