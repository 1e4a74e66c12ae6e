//! GeoIP provider tests
//!
//! Runs the external API provider against a throwaway HTTP stub on
//! localhost so no real network access is needed.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use visitlog::config::GeoIpConfig;
use visitlog::services::{ExternalApiProvider, GeoLocator, GeoLookup};

// =============================================================================
// Test Setup
// =============================================================================

/// Serve `responses` in order, one connection each, and report request lines
fn spawn_stub(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let _ = tx.send(request_line.trim().to_string());

            let mut header = String::new();
            while reader.read_line(&mut header).unwrap_or(0) > 2 {
                header.clear();
            }

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{}/json/{{ip}}", addr), rx)
}

fn config(api_url: String) -> GeoIpConfig {
    GeoIpConfig {
        api_url,
        timeout_secs: 2,
        maxminddb_path: None,
    }
}

// =============================================================================
// External API Tests
// =============================================================================

#[tokio::test]
async fn test_successful_lookup_maps_fields() {
    let body = r#"{"status":"success","query":"203.0.113.5","country":"Japan","regionName":"Tokyo","city":"Shibuya","isp":"Example Net","lat":35.66,"lon":139.7,"timezone":"Asia/Tokyo"}"#;
    let (url, requests) = spawn_stub(vec![(200, body.to_string())]);
    let locator = GeoLocator::new(&config(url));
    assert_eq!(locator.provider_name(), "ExternalAPI");

    let info = locator.resolve("203.0.113.5").await;
    let location = info.resolved().expect("lookup should succeed");
    assert_eq!(location.ip_lookup.as_deref(), Some("203.0.113.5"));
    assert_eq!(location.country.as_deref(), Some("Japan"));
    assert_eq!(location.region.as_deref(), Some("Tokyo"));
    assert_eq!(location.city.as_deref(), Some("Shibuya"));
    assert_eq!(location.isp.as_deref(), Some("Example Net"));
    assert_eq!(location.lat, Some(35.66));
    assert_eq!(location.timezone.as_deref(), Some("Asia/Tokyo"));

    let request_line = requests.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(request_line.starts_with("GET /json/203.0.113.5 "));
}

#[tokio::test]
async fn test_fail_status_uses_provider_message() {
    let (url, _) = spawn_stub(vec![(
        200,
        r#"{"status":"fail","message":"reserved range","query":"240.0.0.1"}"#.to_string(),
    )]);
    let locator = GeoLocator::new(&config(url));

    let info = locator.resolve("240.0.0.1").await;
    assert_eq!(info.error(), Some("reserved range"));
}

#[tokio::test]
async fn test_fail_without_message_uses_default_text() {
    let (url, _) = spawn_stub(vec![(200, r#"{"status":"fail"}"#.to_string())]);
    let locator = GeoLocator::new(&config(url));

    let info = locator.resolve("198.51.100.4").await;
    assert_eq!(info.error(), Some("lookup_failed"));
}

#[tokio::test]
async fn test_http_error_degrades_to_error_location() {
    let (url, _) = spawn_stub(vec![(500, "{}".to_string())]);
    let locator = GeoLocator::new(&config(url));

    let info = locator.resolve("198.51.100.4").await;
    assert!(info.is_failed());
    assert!(!info.error().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_json_degrades_to_error_location() {
    let (url, _) = spawn_stub(vec![(200, "<html>rate limited</html>".to_string())]);
    let locator = GeoLocator::new(&config(url));

    assert!(locator.resolve("198.51.100.4").await.is_failed());
}

#[tokio::test]
async fn test_unreachable_provider() {
    // 绑定后立即释放端口，连接会被拒绝
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let locator = GeoLocator::new(&config(format!("http://127.0.0.1:{}/json/{{ip}}", port)));

    assert!(locator.resolve("8.8.8.8").await.is_failed());
}

#[tokio::test]
async fn test_timeout_bounds_lookup() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // 接受连接但从不响应
    let _holder = thread::spawn(move || {
        let conn = listener.accept();
        thread::sleep(Duration::from_secs(3));
        drop(conn);
    });

    let provider = ExternalApiProvider::new(
        &format!("http://{}/json/{{ip}}", addr),
        Duration::from_millis(300),
    );
    let started = std::time::Instant::now();
    let result = provider.lookup("8.8.4.4").await;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_local_addresses_skip_provider() {
    // 没有可用的 stub，本地地址不应发起任何请求
    let locator = GeoLocator::new(&config("http://127.0.0.1:9/json/{ip}".to_string()));

    for ip in ["127.0.0.1", "::1", "10.9.8.7", "192.168.100.1"] {
        let info = locator.resolve(ip).await;
        assert_eq!(info.country(), "Local", "ip: {}", ip);
        assert!(!info.is_failed());
    }
}

#[tokio::test]
async fn test_missing_maxmind_database_falls_back_to_api() {
    let mut cfg = config("http://127.0.0.1:9/json/{ip}".to_string());
    cfg.maxminddb_path = Some("/nonexistent/GeoLite2-City.mmdb".to_string());

    let locator = GeoLocator::new(&cfg);
    assert_eq!(locator.provider_name(), "ExternalAPI");
}
