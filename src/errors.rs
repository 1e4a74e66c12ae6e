use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VisitlogError {
    FileOperation(String),
    Serialization(String),
    GeoLookup(String),
    Config(String),
}

impl VisitlogError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            VisitlogError::FileOperation(_) => "E001",
            VisitlogError::Serialization(_) => "E002",
            VisitlogError::GeoLookup(_) => "E003",
            VisitlogError::Config(_) => "E004",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            VisitlogError::FileOperation(_) => "File Operation Error",
            VisitlogError::Serialization(_) => "Serialization Error",
            VisitlogError::GeoLookup(_) => "GeoIP Lookup Error",
            VisitlogError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            VisitlogError::FileOperation(msg) => msg,
            VisitlogError::Serialization(msg) => msg,
            VisitlogError::GeoLookup(msg) => msg,
            VisitlogError::Config(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于启动失败时输出到终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for VisitlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for VisitlogError {}

// 便捷的构造函数
impl VisitlogError {
    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        VisitlogError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        VisitlogError::Serialization(msg.into())
    }

    pub fn geo_lookup<T: Into<String>>(msg: T) -> Self {
        VisitlogError::GeoLookup(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        VisitlogError::Config(msg.into())
    }
}

impl From<std::io::Error> for VisitlogError {
    fn from(err: std::io::Error) -> Self {
        VisitlogError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for VisitlogError {
    fn from(err: serde_json::Error) -> Self {
        VisitlogError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VisitlogError>;
