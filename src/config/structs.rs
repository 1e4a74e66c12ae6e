use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 默认日志文件名（JSON Lines）
pub const DEFAULT_LOG_FILE_NAME: &str = "visitors.jsonl";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址、端口、worker 数量
/// - storage: 访客日志文件位置
/// - geoip: 地理位置查询配置
/// - cors: 跨域配置
/// - logging: 运行日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML 文件 > 默认值
    /// ENV 前缀：VL，分隔符：__
    /// 示例：VL__SERVER__PORT=5001
    pub fn load(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                if Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                // logging 尚未初始化，直接输出到 stderr
                eprintln!("{}", e.format_colored());
                eprintln!("[WARN] Falling back to default configuration");
                Self::default()
            }
        }
    }

    /// 加载配置，失败时返回错误而不是回退到默认值
    pub fn try_load(path: &str) -> crate::errors::Result<Self> {
        use config::{Config, Environment, File, FileFormat};

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix("VL")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins"),
            )
            .build()
            .map_err(|e| {
                crate::errors::VisitlogError::config(format!("Failed to build config: {}", e))
            })?;

        let config: StaticConfig = settings.try_deserialize().map_err(|e| {
            crate::errors::VisitlogError::config(format!("Failed to deserialize config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 校验配置值
    pub fn validate(&self) -> crate::errors::Result<()> {
        super::validators::validate_static_config(self)
            .map_err(crate::errors::VisitlogError::config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 访客日志存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON Lines 文件路径，默认放在可执行文件旁边
    #[serde(default = "default_log_file_path")]
    pub log_file: String,
}

/// GeoIP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// 外部 GeoIP API URL，使用 {ip} 作为占位符
    #[serde(default = "default_geoip_api_url")]
    pub api_url: String,

    /// 外部 API 请求超时（秒）
    #[serde(default = "default_geoip_timeout_secs")]
    pub timeout_secs: u64,

    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 如果配置且文件可读，使用本地解析；否则使用外部 API
    #[serde(default)]
    pub maxminddb_path: Option<String>,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的来源，`*` 表示任意来源
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_cpu_count() -> usize {
    num_cpus::get().min(32)
}

/// 可执行文件所在目录下的 visitors.jsonl，取不到时使用当前目录
pub fn default_log_file_path() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_LOG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_NAME))
        .to_string_lossy()
        .into_owned()
}

fn default_geoip_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,country,regionName,city,isp,lat,lon,query,timezone"
        .to_string()
}

fn default_geoip_timeout_secs() -> u64 {
    5
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file_path(),
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            api_url: default_geoip_api_url(),
            timeout_secs: default_geoip_timeout_secs(),
            maxminddb_path: None,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
