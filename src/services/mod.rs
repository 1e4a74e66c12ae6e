//! Service layer for business logic
//!
//! Shared between the HTTP handlers and tests; nothing here depends on
//! actix-web beyond reading request metadata.

pub mod event_builder;
pub mod geoip;
pub mod visitor_service;

pub use event_builder::{EventRecordBuilder, RequestMeta, VisitPayload, is_truthy};
pub use geoip::{ExternalApiProvider, GeoLocator, GeoLookup, MaxMindProvider};
pub use visitor_service::{VisitOutcome, VisitorService};
