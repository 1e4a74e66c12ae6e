//! API 模块常量定义

/// 访客事件上报路径
pub const LOG_VISITOR_PATH: &str = "/log-visitor";

/// 访客日志面板路径
pub const DASHBOARD_PATH: &str = "/view-logs-dashboard";

/// 健康检查路由前缀
pub const HEALTH_PREFIX: &str = "/health";

/// 读取请求体的上限（1 MiB），超出部分不解析
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
