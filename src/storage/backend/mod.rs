//! AppendLog 后端实现

mod jsonl;
mod memory;

pub use jsonl::JsonlAppendLog;
pub use memory::MemoryAppendLog;
