//! Diagnosis service module for Diagchat
//!
//! This module contains the wire model of the remote diagnosis service, the
//! `DiagnosisService` abstraction the controller talks to, and its HTTP
//! implementation.

pub mod base;
pub mod http;

pub use base::{
    BookingField, BookingSummary, BookingType, Choice, Coverage, DiagnosisService,
    ExchangeRequest, ExchangeResponse, Prompt, ProviderInfo, ProviderList, Source, UrgencyInfo,
    UrgencyLevel, Vehicle, VehicleMatch, VisitUrgency,
};
pub use http::HttpDiagnosisService;

use crate::config::ServiceConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the diagnosis service client described by configuration
///
/// # Errors
///
/// Returns error if the base url is invalid or the HTTP client cannot be built
///
/// # Examples
///
/// ```
/// use diagchat::config::ServiceConfig;
/// use diagchat::service::create_service;
///
/// let service = create_service(&ServiceConfig::default());
/// assert!(service.is_ok());
/// ```
pub fn create_service(config: &ServiceConfig) -> Result<Arc<dyn DiagnosisService>> {
    Ok(Arc::new(HttpDiagnosisService::new(config.clone())?))
}
