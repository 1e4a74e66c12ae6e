//! GeoIP 服务模块
//!
//! 提供 IP 地址地理位置查询功能，支持：
//! - 外部 HTTP API (ip-api.com)
//! - MaxMind GeoLite2 本地数据库（可选）
//!
//! 回环和内网地址在 `GeoLocator` 中直接返回 "Local"，不会走到具体实现。

mod external_api;
mod maxmind;
mod provider;

pub use external_api::ExternalApiProvider;
pub use maxmind::MaxMindProvider;
pub use provider::{GeoLocator, GeoLookup};
