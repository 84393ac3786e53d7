#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime watch server.
//!
//! These types are serialized to JSON for the REST API. They are
//! separate from the persisted record types so the API contract can
//! evolve independently; the response projection adds the derived
//! `severityLevel` bucket, which is computed here and never stored.

use chrono::{DateTime, Utc};
use crime_watch_database_models::Report;
use crime_watch_report_models::{
    CrimeCategory, ReportStatus, SeverityLevel, VerificationLevel,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crime report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Unique report ID.
    pub id: Uuid,
    /// Identity of the reporting user.
    pub reporter_id: String,
    /// Short title.
    pub title: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Crime category.
    pub crime_type: Option<CrimeCategory>,
    /// Latitude.
    pub lat: Option<f64>,
    /// Longitude.
    pub lng: Option<f64>,
    /// Free-text address.
    pub address: Option<String>,
    /// Province or city name.
    pub province: Option<String>,
    /// District name.
    pub district: Option<String>,
    /// Ward name.
    pub ward: Option<String>,
    /// Street name.
    pub street: Option<String>,
    /// Evidence attachment URLs.
    pub attachments: Vec<String>,
    /// Numeric status code (0 open, 1 investigating, 2 resolved).
    pub status: u8,
    /// Severity value (1-5).
    pub severity: u8,
    /// Derived low/medium/high severity bucket.
    pub severity_level: SeverityLevel,
    /// Derived trust score (0-100).
    pub trust_score: u8,
    /// Derived verification level.
    pub verification_level: VerificationLevel,
    /// Number of community confirmations.
    pub confirmation_count: u32,
    /// Number of community disputes.
    pub dispute_count: u32,
    /// Admin who manually verified the report, if any.
    pub verified_by: Option<String>,
    /// When the admin verification happened.
    pub verified_at: Option<DateTime<Utc>>,
    /// When the incident reportedly occurred.
    pub reported_at: Option<DateTime<Utc>>,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// When the report was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            reporter_id: report.reporter_id,
            title: report.title,
            description: report.description,
            crime_type: report.category,
            lat: report.lat,
            lng: report.lng,
            address: report.address,
            province: report.province,
            district: report.district,
            ward: report.ward,
            street: report.street,
            attachments: report.attachments,
            status: report.status.code(),
            severity: report.severity.value(),
            severity_level: report.severity.level(),
            trust_score: report.trust_score,
            verification_level: report.verification_level,
            confirmation_count: report.confirmation_count,
            dispute_count: report.dispute_count,
            verified_by: report.verified_by,
            verified_at: report.verified_at,
            reported_at: report.reported_at,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// Request body for creating a report.
///
/// String attachments may be hosted URLs or inline base64 data URIs;
/// the server classifies and normalizes them before persistence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// Short title.
    pub title: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Crime category.
    pub crime_type: Option<CrimeCategory>,
    /// Latitude.
    pub lat: Option<f64>,
    /// Longitude.
    pub lng: Option<f64>,
    /// Free-text address.
    pub address: Option<String>,
    /// Province or city name.
    pub province: Option<String>,
    /// District name.
    pub district: Option<String>,
    /// Ward name.
    pub ward: Option<String>,
    /// Street name.
    pub street: Option<String>,
    /// Explicit severity (1-5).
    pub severity: Option<u8>,
    /// Numeric status code.
    pub status: Option<u8>,
    /// When the incident reportedly occurred.
    pub reported_at: Option<DateTime<Utc>>,
    /// Attachment URLs or inline data URIs.
    pub attachments: Option<Vec<String>>,
}

/// Request body for updating a report. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New crime category.
    pub crime_type: Option<CrimeCategory>,
    /// New latitude.
    pub lat: Option<f64>,
    /// New longitude.
    pub lng: Option<f64>,
    /// New address.
    pub address: Option<String>,
    /// New province.
    pub province: Option<String>,
    /// New district.
    pub district: Option<String>,
    /// New ward.
    pub ward: Option<String>,
    /// New street.
    pub street: Option<String>,
    /// New severity (1-5).
    pub severity: Option<u8>,
    /// New status code.
    pub status: Option<u8>,
    /// New reported-at timestamp.
    pub reported_at: Option<DateTime<Utc>>,
    /// Authoritative replacement attachment list.
    pub attachments: Option<Vec<String>>,
}

/// Query parameters for listing reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListParams {
    /// Filter by crime category.
    pub crime_type: Option<CrimeCategory>,
}

/// Query parameters for the nearby-alert endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQueryParams {
    /// Latitude of the query point.
    pub lat: f64,
    /// Longitude of the query point.
    pub lng: f64,
    /// Radius in kilometers (defaults to 5).
    pub radius: Option<f64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Parses a numeric status code from a request into a status.
#[must_use]
pub fn status_from_code(code: Option<u8>) -> Option<ReportStatus> {
    code.map(ReportStatus::from_code)
}

#[cfg(test)]
mod tests {
    use crime_watch_report_models::Severity;

    use super::*;

    fn sample_report() -> Report {
        let now = Utc::now();
        Report {
            id: Uuid::new_v4(),
            reporter_id: "user-1".to_string(),
            title: Some("Robbery".to_string()),
            description: None,
            category: Some(CrimeCategory::Robbery),
            lat: Some(21.0),
            lng: Some(105.8),
            address: None,
            province: None,
            district: None,
            ward: None,
            street: None,
            attachments: Vec::new(),
            status: ReportStatus::Open,
            severity: Severity::Critical,
            confirmation_count: 2,
            dispute_count: 0,
            trust_score: 46,
            verification_level: VerificationLevel::Pending,
            verified_by: None,
            verified_at: None,
            reported_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn projection_derives_severity_level() {
        let api: ApiReport = sample_report().into();
        assert_eq!(api.severity, 5);
        assert_eq!(api.severity_level, SeverityLevel::High);
        assert_eq!(api.status, 0);

        let mut medium = sample_report();
        medium.severity = Severity::Moderate;
        let api: ApiReport = medium.into();
        assert_eq!(api.severity_level, SeverityLevel::Medium);
    }

    #[test]
    fn projection_serializes_camel_case() {
        let api: ApiReport = sample_report().into();
        let json = serde_json::to_value(&api).unwrap();

        assert_eq!(json["severityLevel"], "high");
        assert_eq!(json["verificationLevel"], "pending");
        assert_eq!(json["crimeType"], "ROBBERY");
        assert_eq!(json["trustScore"], 46);
        assert_eq!(json["confirmationCount"], 2);
    }

    #[test]
    fn create_request_accepts_camel_case_payload() {
        let request: CreateReportRequest = serde_json::from_str(
            r#"{
                "title": "Theft at downtown mall",
                "crimeType": "THEFT",
                "lat": 21.0285,
                "lng": 105.8542,
                "attachments": ["https://example.com/image.jpg"],
                "reportedAt": "2025-11-19T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(request.crime_type, Some(CrimeCategory::Theft));
        assert_eq!(request.attachments.unwrap().len(), 1);
        assert!(request.reported_at.is_some());
    }
}
