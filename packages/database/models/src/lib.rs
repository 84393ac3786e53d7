#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report and vote record types as stored in the database.
//!
//! These types represent the persisted shapes of crime reports and
//! community votes. They are distinct from the API response projections
//! in `crime_watch_server_models`.

use chrono::{DateTime, Utc};
use crime_watch_report_models::{
    CrimeCategory, ReportStatus, Severity, VerificationLevel, VoteKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crime report record.
///
/// `trust_score` and `verification_level` are derived fields: they are
/// recomputed from the other attributes by the rescoring path and must
/// never be written independently (the only exception is the explicit
/// admin verification override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique report ID.
    pub id: Uuid,
    /// Identity of the user who filed the report.
    pub reporter_id: String,
    /// Short title. At least one of title/description is present.
    pub title: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Crime category, if the reporter classified the incident.
    pub category: Option<CrimeCategory>,
    /// Latitude (WGS84). Present together with `lng` or not at all.
    pub lat: Option<f64>,
    /// Longitude (WGS84).
    pub lng: Option<f64>,
    /// Free-text address. At least one of coordinates/address is present.
    pub address: Option<String>,
    /// Province or city name.
    pub province: Option<String>,
    /// District name (administrative area used for heatmap grouping).
    pub district: Option<String>,
    /// Ward name.
    pub ward: Option<String>,
    /// Street name.
    pub street: Option<String>,
    /// Persisted evidence attachment URLs. Never inline data.
    pub attachments: Vec<String>,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Severity (1-5), defaulted from the category if not supplied.
    pub severity: Severity,
    /// Number of community confirm votes.
    pub confirmation_count: u32,
    /// Number of community dispute votes.
    pub dispute_count: u32,
    /// Derived trust score (0-100).
    pub trust_score: u8,
    /// Derived verification level.
    pub verification_level: VerificationLevel,
    /// Admin who manually verified the report, if any.
    pub verified_by: Option<String>,
    /// When the admin verification happened.
    pub verified_at: Option<DateTime<Utc>>,
    /// When the incident was reported to have occurred.
    pub reported_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Whether the report has usable coordinates.
    #[must_use]
    pub const fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// One user's stance on one report.
///
/// Votes are immutable once created: they can only be inserted or
/// removed along with their report, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Unique vote ID.
    pub id: Uuid,
    /// Identity of the voting user.
    pub voter_id: String,
    /// The report this vote targets.
    pub report_id: Uuid,
    /// Confirm or dispute.
    pub kind: VoteKind,
    /// When the vote was cast.
    pub created_at: DateTime<Utc>,
}

/// Filters for listing reports.
///
/// All filters are conjunctive; `None`/empty means "don't filter".
/// Results are always ordered most-recent-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Filter by crime category.
    pub category: Option<CrimeCategory>,
    /// Filter by district.
    pub district: Option<String>,
    /// Filter by province.
    pub province: Option<String>,
    /// Filter by reporting user.
    pub reporter_id: Option<String>,
}

/// A user's voting position on a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    /// Whether the user has cast a confirm vote.
    pub has_confirmed: bool,
    /// Whether the user has cast a dispute vote.
    pub has_disputed: bool,
    /// Total votes the user holds on this report.
    pub vote_count: u32,
    /// Whether the user may still vote (fewer than two votes held).
    pub can_vote: bool,
    /// Whether the user authored the report.
    pub is_owner: bool,
}
