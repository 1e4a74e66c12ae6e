//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 MaxMind GeoLite2-City.mmdb 文件进行 IP 地理位置查询。
//! 数据库不提供 ISP 信息，对应字段留空。

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::GeoLookup;
use crate::errors::{Result, VisitlogError};
use crate::storage::models::Location;

/// MaxMind GeoIP Provider
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 从文件路径创建 MaxMind Provider
    pub fn new(path: &str) -> std::result::Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

#[async_trait]
impl GeoLookup for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> Result<Location> {
        let ip_addr: IpAddr = ip
            .parse()
            .map_err(|_| VisitlogError::geo_lookup(format!("invalid IP address: {}", ip)))?;

        let result = self
            .reader
            .lookup(ip_addr)
            .map_err(|e| VisitlogError::geo_lookup(e.to_string()))?;
        let city: maxminddb::geoip2::City = result
            .decode()
            .map_err(|e| VisitlogError::geo_lookup(e.to_string()))?
            .ok_or_else(|| VisitlogError::geo_lookup("address not found in database"))?;

        let country = city.country.names.english.map(String::from);
        let city_name = city.city.names.english.map(String::from);

        trace!(
            "MaxMind lookup for {}: country={:?}, city={:?}",
            ip, country, city_name
        );

        Ok(Location {
            ip_lookup: Some(ip.to_string()),
            country,
            city: city_name,
            ..Default::default()
        })
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
