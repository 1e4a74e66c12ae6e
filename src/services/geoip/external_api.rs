//! 外部 GeoIP API 实现
//!
//! 使用外部 HTTP API 进行 IP 地理位置查询（ip-api.com 格式）。
//! 每次查询发起一次请求，不缓存、不重试，超时由 Agent 统一控制。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::GeoLookup;
use crate::errors::{Result, VisitlogError};
use crate::storage::models::Location;

/// provider 未返回 message 时使用的错误文本
const LOOKUP_FAILED: &str = "lookup_failed";

/// ip-api.com 响应
///
/// 成功: {"status":"success","country":"...","regionName":"...",...}
/// 失败: {"status":"fail","message":"private range",...}
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Result<Location> {
        if self.status.as_deref() != Some("success") {
            return Err(VisitlogError::geo_lookup(
                self.message.unwrap_or_else(|| LOOKUP_FAILED.to_string()),
            ));
        }

        Ok(Location {
            ip_lookup: self.query,
            country: self.country,
            region: self.region_name,
            city: self.city,
            isp: self.isp,
            lat: self.lat,
            lon: self.lon,
            timezone: self.timezone,
        })
    }
}

/// 外部 API GeoIP Provider
pub struct ExternalApiProvider {
    api_url_template: String,
    agent: Agent,
}

impl ExternalApiProvider {
    /// 创建外部 API Provider
    ///
    /// `api_url_template` 使用 `{ip}` 作为占位符
    /// 例如: `http://ip-api.com/json/{ip}?fields=status,country,city`
    pub fn new(api_url_template: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            api_url_template: api_url_template.to_string(),
            agent,
        }
    }

    fn build_url(&self, ip: &str) -> String {
        self.api_url_template.replace("{ip}", ip)
    }

    /// 从外部 API 获取 GeoIP 信息（同步，在 spawn_blocking 中调用）
    fn fetch_from_api_sync(agent: Agent, url: String) -> Result<Location> {
        let resp = agent.get(&url).call().map_err(|e| {
            warn!("GeoIP API request to \"{}\" failed: {}", url, e);
            VisitlogError::geo_lookup(e.to_string())
        })?;

        let body: IpApiResponse = resp.into_body().read_json().map_err(|e| {
            warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
            VisitlogError::geo_lookup(e.to_string())
        })?;

        trace!("External API response: {:?}", body);
        body.into_location()
    }
}

#[async_trait]
impl GeoLookup for ExternalApiProvider {
    async fn lookup(&self, ip: &str) -> Result<Location> {
        let url = self.build_url(ip);
        let agent = self.agent.clone();

        // ureq 是同步客户端，放到阻塞线程池执行
        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(agent, url))
            .await
            .unwrap_or_else(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                Err(VisitlogError::geo_lookup(e.to_string()))
            })
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
