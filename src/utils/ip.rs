//! IP 地址处理工具
//!
//! - 本地地址判断（回环 + 10.0.0.0/8 + 192.168.0.0/16）
//! - CIDR 匹配
//! - 读取 X-Forwarded-For 和连接地址

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

/// 视为本地、不需要外部查询的网段
const LOCAL_NETWORKS: &[&str] = &["127.0.0.0/8", "::1/128", "10.0.0.0/8", "192.168.0.0/16"];

/// 无法解析为 IP 时使用的前缀规则
const LOCAL_PREFIXES: &[&str] = &["10.", "192.168."];

/// 检查 IP 是否为本地地址（回环或指定的内网网段）
///
/// 可解析的地址按 CIDR 精确匹配；无法解析的字符串退回到前缀匹配。
pub fn is_local_address(ip: &str) -> bool {
    let ip = ip.trim();
    match parse_ip(ip) {
        Some(addr) => LOCAL_NETWORKS.iter().any(|cidr| ip_in_cidr(&addr, cidr)),
        None => ip == "127.0.0.1" || LOCAL_PREFIXES.iter().any(|p| ip.starts_with(p)),
    }
}

/// 解析 IP，兼容带端口的写法（`1.2.3.4:80`、`[::1]:80`）
pub fn parse_ip(ip: &str) -> Option<IpAddr> {
    if let Ok(addr) = ip.parse::<IpAddr>() {
        return Some(addr);
    }
    ip.parse::<SocketAddr>().ok().map(|s| s.ip())
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false,
    }
}

/// 取转发链中的第一个地址（最左侧 = 原始客户端）
pub fn first_forwarded_ip(chain: &str) -> String {
    chain.split(',').next().unwrap_or("").trim().to_string()
}

/// 从 HeaderMap 读取 X-Forwarded-For 原始值
pub fn forwarded_chain_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

/// 连接对端地址（不含端口）
pub fn peer_ip(req: &HttpRequest) -> Option<String> {
    req.peer_addr().map(|addr| addr.ip().to_string())
}
