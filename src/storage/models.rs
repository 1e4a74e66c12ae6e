use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 一条访客事件记录，写入后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub user_agent: String,
    /// 客户端原样提交的 JSON 值，不限于字符串
    #[serde(default)]
    pub section: Option<Value>,
    #[serde(default)]
    pub action: Option<Value>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub location: LocationInfo,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// 序列化为一行 JSON（不含换行符）
    pub fn to_json_line(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 从一行 JSON 解析
    pub fn from_json_line(line: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// section 为字符串时返回其内容
    pub fn section_str(&self) -> Option<&str> {
        self.section.as_ref().and_then(Value::as_str)
    }

    /// action 为字符串时返回其内容
    pub fn action_str(&self) -> Option<&str> {
        self.action.as_ref().and_then(Value::as_str)
    }

    pub fn section_text(&self) -> String {
        display_text(self.section.as_ref())
    }

    pub fn action_text(&self) -> String {
        display_text(self.action.as_ref())
    }

    /// 读取 extra 中的字段用于展示
    pub fn extra_text(&self, key: &str) -> String {
        display_text(self.extra.get(key))
    }
}

/// 展示用文本：字符串原样返回，null/缺失为空，其他值输出紧凑 JSON
pub fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// 地理位置信息，所有字段可选
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_lookup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Location {
    /// 内网 / 回环地址使用的占位位置，不发起网络请求
    pub fn local() -> Self {
        Self {
            country: Some("Local".to_string()),
            region: Some(String::new()),
            city: Some(String::new()),
            isp: Some(String::new()),
            ..Default::default()
        }
    }
}

/// 记录中的 location 字段：成功解析的位置，或查询失败时的错误信息
///
/// `Failed` 必须排在前面，untagged 反序列化按顺序尝试，
/// 而 `Location` 的字段全部可选，会吞掉 `{"error": ...}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationInfo {
    Failed { error: String },
    Resolved(Location),
}

impl Default for LocationInfo {
    fn default() -> Self {
        LocationInfo::Resolved(Location::default())
    }
}

impl LocationInfo {
    pub fn failed<T: Into<String>>(error: T) -> Self {
        LocationInfo::Failed {
            error: error.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LocationInfo::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LocationInfo::Failed { error } => Some(error),
            LocationInfo::Resolved(_) => None,
        }
    }

    pub fn resolved(&self) -> Option<&Location> {
        match self {
            LocationInfo::Resolved(location) => Some(location),
            LocationInfo::Failed { .. } => None,
        }
    }

    pub fn city(&self) -> &str {
        self.field(|l| l.city.as_deref())
    }

    pub fn region(&self) -> &str {
        self.field(|l| l.region.as_deref())
    }

    pub fn country(&self) -> &str {
        self.field(|l| l.country.as_deref())
    }

    pub fn isp(&self) -> &str {
        self.field(|l| l.isp.as_deref())
    }

    fn field<'a>(&'a self, get: impl Fn(&'a Location) -> Option<&'a str>) -> &'a str {
        self.resolved().and_then(get).unwrap_or("")
    }
}

impl From<Location> for LocationInfo {
    fn from(location: Location) -> Self {
        LocationInfo::Resolved(location)
    }
}

/// 时间戳格式：`2024-01-01T12:00:00.123456Z`，读取时接受任意 RFC 3339
mod timestamp_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_record() -> EventRecord {
        EventRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
            ip: "203.0.113.5".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            section: Some(json!("home")),
            action: None,
            success: true,
            location: Location::local().into(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_timestamp_has_micros_and_trailing_z() {
        let line = sample_record().to_json_line().unwrap();
        assert!(line.contains(r#""timestamp":"2024-03-01T08:30:00.000000Z""#));
    }

    #[test]
    fn test_local_stub_serializes_exactly() {
        let value = serde_json::to_value(LocationInfo::from(Location::local())).unwrap();
        assert_eq!(
            value,
            json!({"country": "Local", "region": "", "city": "", "isp": ""})
        );
    }

    #[test]
    fn test_failed_location_round_trip() {
        let info = LocationInfo::failed("timed out");
        let text = serde_json::to_string(&info).unwrap();
        assert_eq!(text, r#"{"error":"timed out"}"#);

        let back: LocationInfo = serde_json::from_str(&text).unwrap();
        assert_eq!(back.error(), Some("timed out"));
        assert_eq!(back.city(), "");
    }

    #[test]
    fn test_absent_action_written_as_null() {
        let value: Value = serde_json::from_str(&sample_record().to_json_line().unwrap()).unwrap();
        assert_eq!(value["action"], Value::Null);
        assert_eq!(value["section"], json!("home"));
        assert_eq!(value["user_agent"], json!("Mozilla/5.0"));
    }

    #[test]
    fn test_reads_legacy_line_without_fraction() {
        let line = r#"{"timestamp":"2024-01-01T00:00:00Z","ip":"1.2.3.4","user_agent":"","section":null,"action":null,"success":false,"location":{"ip_lookup":"1.2.3.4","country":"Japan","region":"Tokyo","city":"Tokyo","isp":"X","lat":35.6,"lon":139.7,"timezone":"Asia/Tokyo"},"extra":{"device":"mobile"}}"#;
        let record = EventRecord::from_json_line(line).unwrap();
        assert_eq!(record.location.country(), "Japan");
        assert_eq!(record.location.resolved().unwrap().lat, Some(35.6));
        assert_eq!(record.extra_text("device"), "mobile");
        assert_eq!(record.extra_text("platform"), "");
    }

    #[test]
    fn test_missing_location_and_extra_default() {
        let record =
            EventRecord::from_json_line(r#"{"timestamp":"2024-01-01T00:00:00.5Z","ip":"x"}"#)
                .unwrap();
        assert_eq!(record.location, LocationInfo::default());
        assert!(record.extra.is_empty());
        assert!(!record.success);
    }

    #[test]
    fn test_line_without_timestamp_is_rejected() {
        assert!(EventRecord::from_json_line(r#"{"ip":"1.2.3.4"}"#).is_err());
        assert!(EventRecord::from_json_line("{not json").is_err());
    }

    #[test]
    fn test_non_ascii_written_raw() {
        let mut record = sample_record();
        record.section = Some(json!("首页"));
        assert!(record.to_json_line().unwrap().contains("首页"));
    }

    #[test]
    fn test_extra_text_non_string_values() {
        let mut record = sample_record();
        record.extra.insert("language".to_string(), json!(["en", "fr"]));
        record.extra.insert("device".to_string(), json!(42));
        assert_eq!(record.extra_text("language"), r#"["en","fr"]"#);
        assert_eq!(record.extra_text("device"), "42");
    }

    #[test]
    fn test_non_string_section_and_action_round_trip() {
        let mut record = sample_record();
        record.section = Some(json!(5));
        record.action = Some(json!({"k": 1}));

        let line = record.to_json_line().unwrap();
        assert!(line.contains(r#""section":5"#));
        assert!(line.contains(r#""action":{"k":1}"#));

        let back = EventRecord::from_json_line(&line).unwrap();
        assert_eq!(back.section, Some(json!(5)));
        assert_eq!(back.action, Some(json!({"k": 1})));
        assert_eq!(back.section_str(), None);
        assert_eq!(back.section_text(), "5");
        assert_eq!(back.action_text(), r#"{"k":1}"#);
    }

    #[test]
    fn test_reads_legacy_lines_with_raw_section() {
        // 旧日志行：分隔符带空格，section 可能是任意 JSON 值
        let numeric = r#"{"timestamp": "2024-02-10T09:15:42.123456Z", "ip": "203.0.113.5", "user_agent": "Mozilla/5.0", "section": 5, "action": "click", "success": true, "location": {"error": "timeout"}, "extra": {}}"#;
        let plain = r#"{"timestamp": "2024-02-10T09:16:00.000001Z", "ip": "127.0.0.1", "user_agent": "", "section": "home", "action": null, "success": false, "location": {"country": "Local", "region": "", "city": "", "isp": ""}, "extra": {"device": "desktop"}}"#;

        let first = EventRecord::from_json_line(numeric).unwrap();
        assert_eq!(first.section, Some(json!(5)));
        assert_eq!(first.action_str(), Some("click"));
        assert_eq!(first.location.error(), Some("timeout"));

        let second = EventRecord::from_json_line(plain).unwrap();
        assert_eq!(second.section_str(), Some("home"));
        assert_eq!(second.action, None);
        assert_eq!(second.action_text(), "");
    }
}
