//! 访客日志存储
//!
//! `AppendLog` 是只追加的事件存储抽象：
//! - `JsonlAppendLog`：JSON Lines 文件，生产环境使用
//! - `MemoryAppendLog`：内存实现，测试使用，同样经过 JSON 行序列化

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{JsonlAppendLog, MemoryAppendLog};
pub use models::{EventRecord, Location, LocationInfo};

/// 只追加的事件日志
///
/// 实现必须保证每条记录以完整的一行落盘，并发追加不能交错。
pub trait AppendLog: Send + Sync {
    /// 追加一条记录
    fn append(&self, record: &EventRecord) -> Result<()>;

    /// 按写入顺序读取全部记录，无法解析的行直接跳过
    fn read_all(&self) -> Result<Vec<EventRecord>>;

    /// 后端名称（用于日志和健康检查）
    fn name(&self) -> &'static str;
}
