//! 内存后端
//!
//! 记录以 JSON 行的形式保存，读写路径与文件后端一致。

use parking_lot::RwLock;

use crate::errors::Result;
use crate::storage::AppendLog;
use crate::storage::models::EventRecord;

#[derive(Default)]
pub struct MemoryAppendLog {
    lines: RwLock<Vec<String>>,
}

impl MemoryAppendLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入一行原始文本（可以是损坏的数据）
    pub fn push_raw_line<T: Into<String>>(&self, line: T) {
        self.lines.write().push(line.into());
    }

    /// 当前保存的行数（包括无法解析的行）
    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// 所有原始行的快照
    pub fn raw_lines(&self) -> Vec<String> {
        self.lines.read().clone()
    }
}

impl AppendLog for MemoryAppendLog {
    fn append(&self, record: &EventRecord) -> Result<()> {
        let line = record.to_json_line()?;
        self.lines.write().push(line);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<EventRecord>> {
        Ok(self
            .lines
            .read()
            .iter()
            .filter_map(|line| EventRecord::from_json_line(line).ok())
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
