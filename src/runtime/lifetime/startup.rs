use std::sync::Arc;

use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::services::{GeoLocator, VisitorService};
use crate::storage::{AppendLog, JsonlAppendLog};

pub struct StartupContext {
    pub log: Arc<dyn AppendLog>,
    pub visitor_service: VisitorService,
}

/// 准备服务器启动的上下文：访客日志存储、GeoIP provider、业务服务
pub fn prepare_server_startup(config: &StaticConfig) -> StartupContext {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let log: Arc<dyn AppendLog> = Arc::new(JsonlAppendLog::new(&config.storage.log_file));
    info!(
        "Using {} visitor log at {}",
        log.name(),
        config.storage.log_file
    );

    let geo = GeoLocator::new(&config.geoip);
    let visitor_service = VisitorService::new(geo, Arc::clone(&log));

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    StartupContext {
        log,
        visitor_service,
    }
}
