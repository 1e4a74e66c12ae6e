//! 配置值验证模块
//!
//! 加载时校验静态配置，校验失败时 `StaticConfig::load` 回退到默认值。

use super::StaticConfig;

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

/// 校验完整的静态配置
pub fn validate_static_config(config: &StaticConfig) -> Result<(), String> {
    validate_port(config.server.port)?;
    validate_geoip_api_url(&config.geoip.api_url)?;
    validate_timeout(config.geoip.timeout_secs)?;
    validate_log_format(&config.logging.format)?;

    if config.storage.log_file.trim().is_empty() {
        return Err("storage.log_file must not be empty".to_string());
    }

    Ok(())
}

fn validate_port(port: u16) -> Result<(), String> {
    if port == 0 {
        return Err("server.port must be between 1 and 65535".to_string());
    }
    Ok(())
}

/// API URL 必须包含 {ip} 占位符
pub fn validate_geoip_api_url(url: &str) -> Result<(), String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!(
            "geoip.api_url must be an http(s) URL, got '{}'",
            url
        ));
    }
    if !url.contains("{ip}") {
        return Err(format!(
            "geoip.api_url must contain the {{ip}} placeholder, got '{}'",
            url
        ));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: u64) -> Result<(), String> {
    if timeout_secs == 0 {
        return Err("geoip.timeout_secs must be greater than 0".to_string());
    }
    Ok(())
}

fn validate_log_format(format: &str) -> Result<(), String> {
    if !VALID_LOG_FORMATS.contains(&format) {
        return Err(format!(
            "Invalid logging.format: '{}'. Valid: {}",
            format,
            VALID_LOG_FORMATS.join(", ")
        ));
    }
    Ok(())
}
