//! JSON Lines 文件后端
//!
//! 每条记录序列化为一行 JSON，以 append 模式打开文件后一次性写入整行。
//! 进程内的并发追加由互斥锁串行化，文件句柄不在请求之间保持。

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::errors::Result;
use crate::storage::AppendLog;
use crate::storage::models::EventRecord;

pub struct JsonlAppendLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAppendLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_append(&self) -> std::io::Result<File> {
        let open = || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
        };

        match open() {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 父目录不存在时创建后重试一次
                if let Some(parent) = self.path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }
                open()
            }
            other => other,
        }
    }
}

impl AppendLog for JsonlAppendLog {
    fn append(&self, record: &EventRecord) -> Result<()> {
        let mut line = record.to_json_line()?;
        line.push('\n');

        let _guard = self.write_lock.lock();
        let mut file = self.open_for_append()?;
        file.write_all(line.as_bytes())?;
        trace!("Appended {} bytes to {}", line.len(), self.path.display());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<EventRecord>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Visitor log {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for line in BufReader::new(file).split(b'\n') {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<EventRecord>(&line) {
                Ok(record) => records.push(record),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(
                "Skipped {} malformed line(s) in {}",
                skipped,
                self.path.display()
            );
        }

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::LocationInfo;
    use chrono::Utc;
    use serde_json::{Map, json};
    use tempfile::TempDir;

    fn record(section: &str) -> EventRecord {
        let mut extra = Map::new();
        extra.insert("device".to_string(), json!("desktop"));
        EventRecord {
            timestamp: Utc::now(),
            ip: "8.8.8.8".to_string(),
            user_agent: "test-agent".to_string(),
            section: Some(section.into()),
            action: Some("view".into()),
            success: false,
            location: LocationInfo::failed("offline"),
            extra,
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = JsonlAppendLog::new(dir.path().join("absent.jsonl"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_file_and_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("visitors.jsonl");
        let log = JsonlAppendLog::new(&path);

        log.append(&record("home")).unwrap();

        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = TempDir::new().unwrap();
        let log = JsonlAppendLog::new(dir.path().join("visitors.jsonl"));

        for section in ["a", "b", "c"] {
            log.append(&record(section)).unwrap();
        }

        let sections: Vec<_> = log
            .read_all()
            .unwrap()
            .into_iter()
            .map(|r| r.section_text())
            .collect();
        assert_eq!(sections, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_skips_corrupt_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visitors.jsonl");
        let first = record("first").to_json_line().unwrap();
        let second = record("second").to_json_line().unwrap();
        std::fs::write(
            &path,
            format!("{}\n{{\"timestamp\": broken\n\n\u{fffd}\u{0}\n{}\n", first, second),
        )
        .unwrap();

        let records = JsonlAppendLog::new(&path).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].section_str(), Some("first"));
        assert_eq!(records[1].section_str(), Some("second"));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visitors.jsonl");
        let valid = record("ok").to_json_line().unwrap();

        let mut bytes = vec![0xff, 0xfe, b'\n'];
        bytes.extend_from_slice(valid.as_bytes());
        bytes.push(b'\n');
        std::fs::write(&path, bytes).unwrap();

        let records = JsonlAppendLog::new(&path).read_all().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_append_to_directory_path_fails() {
        let dir = TempDir::new().unwrap();
        let log = JsonlAppendLog::new(dir.path());
        assert!(log.append(&record("x")).is_err());
    }
}
