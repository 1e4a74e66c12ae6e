//! Event record builder
//!
//! Turns request metadata and the client payload into a single
//! `EventRecord`. Client input is never rejected: every field has a default.

use actix_web::HttpRequest;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::services::geoip::GeoLocator;
use crate::storage::models::EventRecord;
use crate::utils::ip::{first_forwarded_ip, forwarded_chain_from_headers, peer_ip};

// ============ Inputs ============

/// Request metadata relevant to a visit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    /// Raw `X-Forwarded-For` value, if the header was present
    pub forwarded_for: Option<String>,
    /// Direct peer address (without port)
    pub peer_addr: Option<String>,
    /// Raw `User-Agent`, empty when absent
    pub user_agent: String,
}

impl RequestMeta {
    pub fn from_request(req: &HttpRequest) -> Self {
        let user_agent = req
            .headers()
            .get(actix_web::http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            forwarded_for: forwarded_chain_from_headers(req.headers()),
            peer_addr: peer_ip(req),
            user_agent,
        }
    }

    /// Client IP: first hop of the forwarding chain, else the peer address
    pub fn client_ip(&self) -> String {
        match &self.forwarded_for {
            Some(chain) => first_forwarded_ip(chain),
            None => self.peer_addr.clone().unwrap_or_default(),
        }
    }
}

/// Fields taken from the client's JSON body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitPayload {
    pub section: Option<Value>,
    pub action: Option<Value>,
    pub success: bool,
    pub extra: Map<String, Value>,
}

impl VisitPayload {
    /// Parse a raw request body. Absent, invalid or non-object JSON yields
    /// the empty payload.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };

        let extra = match fields.remove("extra") {
            Some(Value::Object(extra)) => extra,
            _ => Map::new(),
        };

        Self {
            section: raw_field(fields.remove("section")),
            action: raw_field(fields.remove("action")),
            success: fields.get("success").is_some_and(is_truthy),
            extra,
        }
    }
}

/// Boolean cast of a JSON value
///
/// `false`, `null`, `0`, `""`, `[]` and `{}` are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Any JSON value is kept as submitted; null/absent become `None`.
fn raw_field(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

// ============ Builder ============

#[derive(Clone)]
pub struct EventRecordBuilder {
    geo: GeoLocator,
}

impl EventRecordBuilder {
    pub fn new(geo: GeoLocator) -> Self {
        Self { geo }
    }

    pub fn geo(&self) -> &GeoLocator {
        &self.geo
    }

    /// Assemble a record. The timestamp is taken before the location lookup
    /// so it reflects receipt time.
    pub async fn build(&self, meta: &RequestMeta, payload: VisitPayload) -> EventRecord {
        let timestamp = Utc::now();
        let ip = meta.client_ip();
        let location = self.geo.resolve(&ip).await;

        EventRecord {
            timestamp,
            ip,
            user_agent: meta.user_agent.clone(),
            section: payload.section,
            action: payload.action,
            success: payload.success,
            location,
            extra: payload.extra,
        }
    }
}
