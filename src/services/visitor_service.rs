//! Visitor service
//!
//! Business logic behind the HTTP handlers: build a record, append it to
//! the log, and read the log back for display.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::{Result, VisitlogError};
use crate::services::event_builder::{EventRecordBuilder, RequestMeta, VisitPayload};
use crate::services::geoip::GeoLocator;
use crate::storage::AppendLog;
use crate::storage::models::EventRecord;

/// Result of ingesting one visit
///
/// `persisted` carries the append outcome; the HTTP layer reports success
/// either way.
#[derive(Debug)]
pub struct VisitOutcome {
    pub record: EventRecord,
    pub persisted: Result<()>,
}

#[derive(Clone)]
pub struct VisitorService {
    builder: EventRecordBuilder,
    log: Arc<dyn AppendLog>,
}

impl VisitorService {
    pub fn new(geo: GeoLocator, log: Arc<dyn AppendLog>) -> Self {
        Self {
            builder: EventRecordBuilder::new(geo),
            log,
        }
    }

    pub fn log_backend(&self) -> &'static str {
        self.log.name()
    }

    pub fn geoip_provider(&self) -> &'static str {
        self.builder.geo().provider_name()
    }

    /// Build and append a record for one visit
    pub async fn record_visit(&self, meta: &RequestMeta, payload: VisitPayload) -> VisitOutcome {
        let record = self.builder.build(meta, payload).await;
        info!(
            ip = %record.ip,
            section = ?record.section,
            action = ?record.action,
            success = record.success,
            "Visitor logged"
        );

        let persisted = self.append(record.clone()).await;
        if let Err(ref e) = persisted {
            error!("Failed to write visitor log: {}", e);
        }

        VisitOutcome { record, persisted }
    }

    /// All records, most recent first
    pub async fn recent_visits(&self) -> Result<Vec<EventRecord>> {
        let log = Arc::clone(&self.log);
        let mut records = tokio::task::spawn_blocking(move || log.read_all())
            .await
            .map_err(|e| VisitlogError::file_operation(e.to_string()))??;
        records.reverse();
        debug!("Loaded {} visitor records", records.len());
        Ok(records)
    }

    async fn append(&self, record: EventRecord) -> Result<()> {
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || log.append(&record))
            .await
            .map_err(|e| VisitlogError::file_operation(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geoip::GeoLookup;
    use crate::storage::MemoryAppendLog;
    use crate::storage::models::Location;
    use async_trait::async_trait;

    struct OfflineLookup;

    #[async_trait]
    impl GeoLookup for OfflineLookup {
        async fn lookup(&self, _ip: &str) -> Result<Location> {
            Err(VisitlogError::geo_lookup("offline"))
        }

        fn name(&self) -> &'static str {
            "Offline"
        }
    }

    struct BrokenLog;

    impl AppendLog for BrokenLog {
        fn append(&self, _record: &EventRecord) -> Result<()> {
            Err(VisitlogError::file_operation("disk full"))
        }

        fn read_all(&self) -> Result<Vec<EventRecord>> {
            Err(VisitlogError::file_operation("unreadable"))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn geo() -> GeoLocator {
        GeoLocator::with_lookup(Arc::new(OfflineLookup))
    }

    fn meta(ip: &str) -> RequestMeta {
        RequestMeta {
            forwarded_for: Some(ip.to_string()),
            peer_addr: None,
            user_agent: "agent".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_visit_appends() {
        let log = Arc::new(MemoryAppendLog::new());
        let service = VisitorService::new(geo(), log.clone());

        let outcome = service
            .record_visit(&meta("203.0.113.5"), VisitPayload::default())
            .await;

        assert!(outcome.persisted.is_ok());
        assert_eq!(outcome.record.location.error(), Some("offline"));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_raised() {
        let service = VisitorService::new(geo(), Arc::new(BrokenLog));
        let outcome = service
            .record_visit(&meta("127.0.0.1"), VisitPayload::default())
            .await;

        assert_eq!(
            outcome.persisted,
            Err(VisitlogError::file_operation("disk full"))
        );
        assert_eq!(outcome.record.location.country(), "Local");
        assert!(service.recent_visits().await.is_err());
    }

    #[tokio::test]
    async fn test_recent_visits_most_recent_first() {
        let log = Arc::new(MemoryAppendLog::new());
        let service = VisitorService::new(geo(), log);

        for section in ["first", "second", "third"] {
            let payload = VisitPayload {
                section: Some(section.into()),
                ..Default::default()
            };
            service.record_visit(&meta("10.0.0.1"), payload).await;
        }

        let sections: Vec<_> = service
            .recent_visits()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|r| r.section_str().map(String::from))
            .collect();
        assert_eq!(sections, vec!["third", "second", "first"]);
    }
}
