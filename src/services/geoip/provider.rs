//! GeoIP Provider 抽象层
//!
//! `GeoLookup` 是具体查询实现的接口，`GeoLocator` 在其之上负责：
//! 1. 本地地址分类（不发起网络请求）
//! 2. 把所有查询失败转换为 `LocationInfo::Failed`，对调用方永不报错

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, trace, warn};

use super::external_api::ExternalApiProvider;
use super::maxmind::MaxMindProvider;
use crate::config::GeoIpConfig;
use crate::errors::Result;
use crate::storage::models::{Location, LocationInfo};
use crate::utils::ip::is_local_address;

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// 查询 IP 地址的地理位置
    async fn lookup(&self, ip: &str) -> Result<Location>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 统一 GeoIP 入口
///
/// 启动时根据配置选择实现：
/// 1. 配置了 maxminddb_path 且可读 → MaxMindProvider
/// 2. 否则 → ExternalApiProvider
pub struct GeoLocator {
    inner: Arc<dyn GeoLookup>,
}

impl GeoLocator {
    pub fn new(config: &GeoIpConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let inner: Arc<dyn GeoLookup> = if let Some(ref path) = config.maxminddb_path {
            match MaxMindProvider::new(path) {
                Ok(provider) => {
                    info!("GeoIP: Using MaxMind database at {}", path);
                    Arc::new(provider)
                }
                Err(e) => {
                    warn!(
                        "GeoIP: Failed to load MaxMind database at {}: {}, falling back to external API",
                        path, e
                    );
                    Arc::new(ExternalApiProvider::new(&config.api_url, timeout))
                }
            }
        } else {
            debug!("GeoIP: No MaxMind database configured, using external API");
            Arc::new(ExternalApiProvider::new(&config.api_url, timeout))
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Self { inner }
    }

    /// 使用指定实现（测试或自定义 provider）
    pub fn with_lookup(inner: Arc<dyn GeoLookup>) -> Self {
        Self { inner }
    }

    /// 解析 IP 的地理位置
    ///
    /// 本地地址直接返回 "Local" 占位；其他地址查询一次，失败时返回 `{error}`。
    pub async fn resolve(&self, ip: &str) -> LocationInfo {
        if is_local_address(ip) {
            trace!("GeoIP: {} is a local address, skipping lookup", ip);
            return Location::local().into();
        }

        match self.inner.lookup(ip).await {
            Ok(location) => {
                trace!("GeoIP: {} resolved by {}", ip, self.inner.name());
                location.into()
            }
            Err(e) => {
                warn!("GeoIP lookup for {:?} failed: {}", ip, e);
                LocationInfo::failed(e.message())
            }
        }
    }

    /// 获取当前使用的 provider 名称
    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

impl Clone for GeoLocator {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
