//! 访客日志面板
//!
//! GET /view-logs-dashboard：读取全部记录，按时间倒序渲染为 HTML 表格。

use std::fmt::Write;

use actix_web::{HttpResponse, Responder, web};
use tracing::{error, trace};

use crate::services::VisitorService;
use crate::storage::models::EventRecord;
use crate::utils::escape_html;

const COLUMNS: &[&str] = &[
    "Timestamp",
    "IP",
    "City",
    "Region",
    "Country",
    "ISP",
    "Section",
    "Action",
    "Success",
    "Device",
    "Platform",
    "Language",
];

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Visitor Logs Dashboard</title>
    <style>
        body { font-family: Arial; padding: 20px; background: #f4f4f4; }
        table { border-collapse: collapse; width: 100%; background: #fff; }
        th, td { border: 1px solid #ccc; padding: 8px; text-align: left; }
        th { background: #333; color: #fff; }
        tr:nth-child(even) { background: #f9f9f9; }
    </style>
</head>
<body>
    <h2>Visitor Logs Dashboard</h2>
    <table>
"#;

const PAGE_TAIL: &str = "    </table>\n</body>\n</html>\n";

pub struct DashboardService;

impl DashboardService {
    pub async fn view_logs_dashboard(service: web::Data<VisitorService>) -> impl Responder {
        trace!("Received dashboard request");

        // 读取失败时渲染空表，不向调用方报错
        let records = service.recent_visits().await.unwrap_or_else(|e| {
            error!("Failed to read visitor log: {}", e);
            Vec::new()
        });

        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_dashboard(&records))
    }
}

/// 渲染 HTML 表格，`records` 已按展示顺序排列
pub fn render_dashboard(records: &[EventRecord]) -> String {
    let mut html = String::with_capacity(PAGE_HEAD.len() + records.len() * 512);
    html.push_str(PAGE_HEAD);

    html.push_str("        <tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{}</th>", column);
    }
    html.push_str("</tr>\n");

    for record in records {
        render_row(&mut html, record);
    }

    html.push_str(PAGE_TAIL);
    html
}

fn render_row(html: &mut String, record: &EventRecord) {
    let timestamp = record
        .timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    let cells = [
        timestamp,
        record.ip.clone(),
        record.location.city().to_string(),
        record.location.region().to_string(),
        record.location.country().to_string(),
        record.location.isp().to_string(),
        record.section_text(),
        record.action_text(),
        bool_label(record.success).to_string(),
        record.extra_text("device"),
        record.extra_text("platform"),
        record.extra_text("language"),
    ];

    html.push_str("        <tr>");
    for cell in &cells {
        let _ = write!(html, "<td>{}</td>", escape_html(cell));
    }
    html.push_str("</tr>\n");
}

/// 布尔值按 `True` / `False` 展示，与已有日志面板保持一致
fn bool_label(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
