#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report lifecycle orchestration and the community vote ledger.
//!
//! [`ReportService`] composes the store, the trust engine, and the
//! blob store around create/update/delete, admin verification,
//! community voting, and the aggregate read paths. Two invariants are
//! enforced here:
//!
//! - A report's derived fields (`trust_score`, `verification_level`)
//!   are written only by the rescoring path at the end of every
//!   state-changing operation (admin verification being the single
//!   forced override).
//! - Every mutation of a report's counters or derived fields runs
//!   under that report's serialization lock, so concurrent votes
//!   cannot both pass the quota check before either commits.

pub mod locks;
mod votes;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crime_watch_alert::{HeatmapCell, NearbyAlert, StatisticsSnapshot};
use crime_watch_blob::ingest::{self, AttachmentSource};
use crime_watch_blob::{BlobError, BlobStore};
use crime_watch_database::{DbError, queries};
use crime_watch_database_models::{Report, ReportQuery};
use crime_watch_report_models::{CrimeCategory, ReportStatus, Severity, VerificationLevel};
use switchy_database::Database;
use thiserror::Error;
use uuid::Uuid;

use crate::locks::ReportLocks;

pub use crime_watch_alert::DEFAULT_NEARBY_RADIUS_KM;
pub use votes::MAX_VOTES_PER_REPORT;

/// Errors surfaced by report and vote operations.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The target report does not exist.
    #[error("Crime report not found")]
    NotFound,

    /// A create/update input failed validation.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// What was missing or invalid.
        message: String,
    },

    /// The caller does not own the report.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// What was attempted.
        message: String,
    },

    /// A reporter tried to vote on their own report.
    #[error("Cannot vote on your own report")]
    SelfVoteRejected,

    /// The voter already holds a vote of this kind on the report.
    #[error("Vote of this kind already cast on this report")]
    DuplicateVote,

    /// The voter already holds the maximum number of votes on the
    /// report.
    #[error("Vote quota of {MAX_VOTES_PER_REPORT} reached for this report")]
    VoteQuotaExceeded,

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// An upstream blob-store operation failed during attachment
    /// staging.
    #[error("Storage error: {0}")]
    Storage(#[from] BlobError),
}

impl ReportError {
    fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    fn permission(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }
}

/// Input for creating a report.
#[derive(Debug, Default)]
pub struct CreateReport {
    /// Short title. At least one of title/description is required.
    pub title: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Crime category.
    pub category: Option<CrimeCategory>,
    /// Latitude. Coordinates count only when both lat and lng are set.
    pub lat: Option<f64>,
    /// Longitude.
    pub lng: Option<f64>,
    /// Free-text address. Required if coordinates are absent.
    pub address: Option<String>,
    /// Province or city name.
    pub province: Option<String>,
    /// District name.
    pub district: Option<String>,
    /// Ward name.
    pub ward: Option<String>,
    /// Street name.
    pub street: Option<String>,
    /// Explicit severity (1-5). Defaults from the category when unset.
    pub severity: Option<u8>,
    /// Initial status, defaults to open.
    pub status: Option<ReportStatus>,
    /// When the incident reportedly occurred.
    pub reported_at: Option<DateTime<Utc>>,
    /// Evidence attachments in any supported source shape.
    pub attachments: Vec<AttachmentSource>,
}

/// Input for updating a report. `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category. Re-derives severity unless `severity` is also set.
    pub category: Option<CrimeCategory>,
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
    /// New status.
    pub status: Option<ReportStatus>,
    /// New reported-at timestamp.
    pub reported_at: Option<DateTime<Utc>>,
    /// Authoritative replacement attachment list. Previously stored
    /// URLs absent from the resolved list are deleted from the blob
    /// store (best-effort).
    pub attachments: Option<Vec<AttachmentSource>>,
}

/// The report service: lifecycle orchestration, voting, and reads.
pub struct ReportService {
    db: Arc<dyn Database>,
    blob: Arc<dyn BlobStore>,
    locks: ReportLocks,
}

impl ReportService {
    /// Creates a service over the given store and blob store.
    #[must_use]
    pub fn new(db: Arc<dyn Database>, blob: Arc<dyn BlobStore>) -> Self {
        Self {
            db,
            blob,
            locks: ReportLocks::new(),
        }
    }

    pub(crate) fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub(crate) const fn locks(&self) -> &ReportLocks {
        &self.locks
    }

    /// Creates a report for `reporter_id`.
    ///
    /// Requires a title or description, and coordinates or an address.
    /// Severity defaults from the category's danger classification.
    /// Attachments are normalized into persisted URLs before the
    /// record is written; if the write fails, the uploads staged for
    /// it are rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ValidationFailed`] on missing required
    /// fields, [`ReportError::Storage`] if attachment staging fails,
    /// or [`ReportError::Database`] if persistence fails.
    pub async fn create(
        &self,
        reporter_id: &str,
        input: CreateReport,
    ) -> Result<Report, ReportError> {
        if input.title.is_none() && input.description.is_none() {
            return Err(ReportError::validation(
                "Either title or description must be provided",
            ));
        }

        let has_coordinates = input.lat.is_some() && input.lng.is_some();
        if !has_coordinates && input.address.is_none() {
            return Err(ReportError::validation(
                "Either coordinates (lat/lng) or address must be provided",
            ));
        }

        let severity = resolve_severity(input.severity, input.category)?;

        let staged = ingest::resolve_attachments(self.blob.as_ref(), input.attachments).await?;

        let now = Utc::now();
        let mut report = Report {
            id: Uuid::new_v4(),
            reporter_id: reporter_id.to_string(),
            title: input.title,
            description: input.description,
            category: input.category,
            lat: input.lat,
            lng: input.lng,
            address: input.address,
            province: input.province,
            district: input.district,
            ward: input.ward,
            street: input.street,
            attachments: staged.urls().to_vec(),
            status: input.status.unwrap_or(ReportStatus::Open),
            severity,
            confirmation_count: 0,
            dispute_count: 0,
            trust_score: 0,
            verification_level: VerificationLevel::Unverified,
            verified_by: None,
            verified_at: None,
            reported_at: input.reported_at,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = queries::insert_report(self.db(), &report).await {
            staged.discard(self.blob.as_ref()).await;
            return Err(e.into());
        }
        staged.commit();

        self.rescore_and_persist(&mut report).await?;
        log::info!("Created report {} by {reporter_id}", report.id);

        Ok(report)
    }

    /// Updates a report. Only the owning reporter may update.
    ///
    /// When a category is supplied without an explicit severity, the
    /// severity is re-derived from the new category. When an
    /// attachment list is supplied it fully replaces the stored list:
    /// previously stored URLs absent from the new list are deleted
    /// from the blob store best-effort after the record is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] for an unknown report,
    /// [`ReportError::PermissionDenied`] for a non-owner, and the
    /// staging/persistence errors of [`Self::create`].
    #[allow(clippy::too_many_lines)]
    pub async fn update(
        &self,
        id: Uuid,
        user_id: &str,
        input: UpdateReport,
    ) -> Result<Report, ReportError> {
        let _guard = self.locks.acquire(id).await;

        let mut report = queries::get_report(self.db(), id)
            .await?
            .ok_or(ReportError::NotFound)?;

        if report.reporter_id != user_id {
            return Err(ReportError::permission(
                "Cannot edit another user's report",
            ));
        }

        if let Some(category) = input.category {
            report.category = Some(category);
            if input.severity.is_none() {
                report.severity = category.default_severity();
            }
        }
        if let Some(value) = input.severity {
            report.severity = Severity::from_value(value)
                .map_err(|e| ReportError::validation(e.to_string()))?;
        }
        if let Some(title) = input.title {
            report.title = Some(title);
        }
        if let Some(description) = input.description {
            report.description = Some(description);
        }
        if let Some(lat) = input.lat {
            report.lat = Some(lat);
        }
        if let Some(lng) = input.lng {
            report.lng = Some(lng);
        }
        if let Some(address) = input.address {
            report.address = Some(address);
        }
        if let Some(province) = input.province {
            report.province = Some(province);
        }
        if let Some(district) = input.district {
            report.district = Some(district);
        }
        if let Some(ward) = input.ward {
            report.ward = Some(ward);
        }
        if let Some(street) = input.street {
            report.street = Some(street);
        }
        if let Some(status) = input.status {
            report.status = status;
        }
        if let Some(reported_at) = input.reported_at {
            report.reported_at = Some(reported_at);
        }

        let staged_replacement = match input.attachments {
            Some(sources) => {
                let staged = ingest::resolve_attachments(self.blob.as_ref(), sources).await?;
                let removed: Vec<String> = report
                    .attachments
                    .iter()
                    .filter(|url| !staged.urls().contains(*url))
                    .cloned()
                    .collect();
                report.attachments = staged.urls().to_vec();
                Some((staged, removed))
            }
            None => None,
        };

        report.updated_at = Utc::now();

        if let Err(e) = queries::update_report(self.db(), &report).await {
            if let Some((staged, _)) = staged_replacement {
                staged.discard(self.blob.as_ref()).await;
            }
            return Err(e.into());
        }

        if let Some((staged, removed)) = staged_replacement {
            staged.commit();
            if !removed.is_empty() {
                ingest::delete_urls_best_effort(self.blob.as_ref(), &removed).await;
                log::info!(
                    "Deleted {} removed attachment(s) for report {id}",
                    removed.len()
                );
            }
        }

        self.rescore_and_persist(&mut report).await?;

        Ok(report)
    }

    /// Deletes a report and its votes. Only the owning reporter may
    /// delete.
    ///
    /// Attachment blobs are removed best-effort before the record.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] for an unknown report,
    /// [`ReportError::PermissionDenied`] for a non-owner, or
    /// [`ReportError::Database`] if the delete fails.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<(), ReportError> {
        let guard = self.locks.acquire(id).await;

        let report = queries::get_report(self.db(), id)
            .await?
            .ok_or(ReportError::NotFound)?;

        if report.reporter_id != user_id {
            return Err(ReportError::permission(
                "Cannot delete another user's report",
            ));
        }

        if !report.attachments.is_empty() {
            ingest::delete_urls_best_effort(self.blob.as_ref(), &report.attachments).await;
        }

        queries::delete_report(self.db(), id).await?;
        log::info!("Deleted report {id}");

        drop(guard);
        self.locks.remove(id);

        Ok(())
    }

    /// Admin verification: the only externally-forced verification
    /// transition. Sets the trust score to 100 and the level to
    /// confirmed, recording the verifier and timestamp, bypassing the
    /// scoring formula.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] for an unknown report or
    /// [`ReportError::Database`] if persistence fails.
    pub async fn verify(&self, id: Uuid, admin_id: &str) -> Result<Report, ReportError> {
        let _guard = self.locks.acquire(id).await;

        let mut report = queries::get_report(self.db(), id)
            .await?
            .ok_or(ReportError::NotFound)?;

        let now = Utc::now();
        queries::set_verified(
            self.db(),
            id,
            crime_watch_trust::ADMIN_TRUST_SCORE,
            VerificationLevel::Confirmed,
            admin_id,
            now,
        )
        .await?;

        report.trust_score = crime_watch_trust::ADMIN_TRUST_SCORE;
        report.verification_level = VerificationLevel::Confirmed;
        report.verified_by = Some(admin_id.to_string());
        report.verified_at = Some(now);
        report.updated_at = now;
        log::info!("Report {id} verified by admin {admin_id}");

        Ok(report)
    }

    /// Fetches a report by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] if it doesn't exist.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Report, ReportError> {
        queries::get_report(self.db(), id)
            .await?
            .ok_or(ReportError::NotFound)
    }

    /// Lists reports matching the filters, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Database`] if the query fails.
    pub async fn list(&self, query: &ReportQuery) -> Result<Vec<Report>, ReportError> {
        Ok(queries::list_reports(self.db(), query).await?)
    }

    /// Computes the heatmap over all reports.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Database`] if the read fails.
    pub async fn heatmap(&self) -> Result<Vec<HeatmapCell>, ReportError> {
        let reports = queries::all_reports(self.db()).await?;
        Ok(crime_watch_alert::heatmap(&reports))
    }

    /// Computes the statistics snapshot over all reports.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Database`] if the read fails.
    pub async fn statistics(&self) -> Result<StatisticsSnapshot, ReportError> {
        let reports = queries::all_reports(self.db()).await?;
        Ok(crime_watch_alert::statistics(&reports))
    }

    /// Runs the nearby-alert danger query around a point.
    ///
    /// `radius_km` defaults to [`DEFAULT_NEARBY_RADIUS_KM`].
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Database`] if the read fails.
    pub async fn nearby_alert(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> Result<NearbyAlert, ReportError> {
        let reports = queries::all_reports(self.db()).await?;
        Ok(crime_watch_alert::nearby_alert(
            &reports,
            lat,
            lng,
            radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM),
        ))
    }

    /// Recomputes the trust score and level for every report.
    ///
    /// Intended for a periodic sweep; freshness decays with time, so
    /// scores drift downward without any triggering mutation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Database`] if a read or write fails.
    pub async fn rescore_all(&self) -> Result<u64, ReportError> {
        let reports = queries::all_reports(self.db()).await?;
        let mut rescored = 0u64;

        for report in reports {
            let _guard = self.locks.acquire(report.id).await;
            // Re-read under the lock so we score current state
            if let Some(mut current) = queries::get_report(self.db(), report.id).await? {
                self.rescore_and_persist(&mut current).await?;
                rescored += 1;
            }
        }

        log::info!("Rescored {rescored} report(s)");
        Ok(rescored)
    }

    /// Recomputes and persists a report's derived fields.
    ///
    /// The single write path for `trust_score`/`verification_level`
    /// outside the admin override.
    pub(crate) async fn rescore_and_persist(
        &self,
        report: &mut Report,
    ) -> Result<(), ReportError> {
        let now = Utc::now();
        let (trust_score, level) = crime_watch_trust::rescore(report, now);

        queries::update_score(self.db(), report.id, trust_score, level, now).await?;

        report.trust_score = trust_score;
        report.verification_level = level;
        report.updated_at = now;

        Ok(())
    }
}

fn resolve_severity(
    explicit: Option<u8>,
    category: Option<CrimeCategory>,
) -> Result<Severity, ReportError> {
    match explicit {
        Some(value) => {
            Severity::from_value(value).map_err(|e| ReportError::validation(e.to_string()))
        }
        None => Ok(category.map_or(Severity::Minimal, CrimeCategory::default_severity)),
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crime_watch_blob::{BlobHandle, MemoryBlobStore};

    use super::test_support::{minimal_report, service};
    use super::*;

    /// Wraps a [`MemoryBlobStore`] and records every `delete_by_url`
    /// call.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryBlobStore,
        deleted_urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for RecordingStore {
        async fn upload(&self, bytes: Vec<u8>) -> Result<BlobHandle, BlobError> {
            self.inner.upload(bytes).await
        }

        async fn delete(&self, id: &str) -> Result<(), BlobError> {
            self.inner.delete(id).await
        }

        async fn delete_by_url(&self, url: &str) -> Result<(), BlobError> {
            self.deleted_urls
                .lock()
                .unwrap()
                .push(url.to_string());
            self.inner.delete_by_url(url).await
        }
    }

    #[tokio::test]
    async fn create_requires_title_or_description() {
        let service = service().await;
        let result = service
            .create(
                "user-1",
                CreateReport {
                    address: Some("somewhere".to_string()),
                    ..CreateReport::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ReportError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn create_requires_location() {
        let service = service().await;
        let result = service
            .create(
                "user-1",
                CreateReport {
                    title: Some("Theft".to_string()),
                    // A single coordinate does not count as a location
                    lat: Some(21.0),
                    ..CreateReport::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ReportError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn create_defaults_severity_from_category() {
        let service = service().await;
        let report = service
            .create(
                "user-1",
                CreateReport {
                    title: Some("Homicide reported".to_string()),
                    address: Some("Alley behind 5th".to_string()),
                    category: Some(CrimeCategory::Homicide),
                    ..CreateReport::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(report.severity.value(), 5);
        assert_eq!(report.status, ReportStatus::Open);

        // Persisted too, not just on the returned value
        let loaded = service.find_by_id(report.id).await.unwrap();
        assert_eq!(loaded.severity.value(), 5);
    }

    #[tokio::test]
    async fn create_scores_and_persists_derived_fields() {
        let service = service().await;
        let report = service.create("user-1", minimal_report()).await.unwrap();

        // freshness 10 + title 4 + address 4 + category 3 = 21
        assert_eq!(report.trust_score, 21);
        assert_eq!(report.verification_level, VerificationLevel::Unverified);

        let loaded = service.find_by_id(report.id).await.unwrap();
        assert_eq!(loaded.trust_score, 21);
        assert_eq!(loaded.verification_level, VerificationLevel::Unverified);
    }

    #[tokio::test]
    async fn create_uploads_encoded_attachments() {
        let service = service().await;
        let mut input = minimal_report();
        input.attachments = vec![
            AttachmentSource::Encoded("data:image/png;base64,aGVsbG8=".to_string()),
            AttachmentSource::Url("https://cdn.example.com/kept.jpg".to_string()),
        ];

        let report = service.create("user-1", input).await.unwrap();
        assert_eq!(report.attachments.len(), 2);
        assert!(report.attachments[0].starts_with("memory://"));
        assert_eq!(report.attachments[1], "https://cdn.example.com/kept.jpg");

        // Evidence contribution kicks in: 25 + 21 = 46 -> pending
        assert_eq!(report.trust_score, 46);
        assert_eq!(report.verification_level, VerificationLevel::Pending);
    }

    #[tokio::test]
    async fn update_is_owner_scoped() {
        let service = service().await;
        let report = service.create("user-1", minimal_report()).await.unwrap();

        let result = service
            .update(
                report.id,
                "user-2",
                UpdateReport {
                    title: Some("hijacked".to_string()),
                    ..UpdateReport::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ReportError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn update_rederives_severity_on_category_change() {
        let service = service().await;
        let report = service.create("user-1", minimal_report()).await.unwrap();
        assert_eq!(report.severity.value(), 1);

        let updated = service
            .update(
                report.id,
                "user-1",
                UpdateReport {
                    category: Some(CrimeCategory::Kidnapping),
                    ..UpdateReport::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.severity.value(), 5);

        // Explicit severity wins over the category default
        let updated = service
            .update(
                report.id,
                "user-1",
                UpdateReport {
                    category: Some(CrimeCategory::Homicide),
                    severity: Some(2),
                    ..UpdateReport::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.severity.value(), 2);
    }

    #[tokio::test]
    async fn update_deletes_exactly_the_removed_attachments() {
        let store = Arc::new(RecordingStore::default());
        let db = crime_watch_database::open_db(None).await.unwrap();
        let service = ReportService::new(Arc::from(db), Arc::clone(&store) as Arc<dyn BlobStore>);

        let mut input = minimal_report();
        input.attachments = vec![
            AttachmentSource::Url("https://cdn.example.com/keep.jpg".to_string()),
            AttachmentSource::Url("https://cdn.example.com/remove.jpg".to_string()),
        ];
        let report = service.create("user-1", input).await.unwrap();

        let updated = service
            .update(
                report.id,
                "user-1",
                UpdateReport {
                    attachments: Some(vec![AttachmentSource::Url(
                        "https://cdn.example.com/keep.jpg".to_string(),
                    )]),
                    ..UpdateReport::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            updated.attachments,
            vec!["https://cdn.example.com/keep.jpg".to_string()]
        );

        let deleted = store.deleted_urls.lock().unwrap().clone();
        assert_eq!(deleted, vec!["https://cdn.example.com/remove.jpg".to_string()]);
    }

    #[tokio::test]
    async fn delete_is_owner_scoped_and_cleans_up() {
        let service = service().await;
        let mut input = minimal_report();
        input.attachments = vec![AttachmentSource::Encoded(
            "data:image/png;base64,aGVsbG8=".to_string(),
        )];
        let report = service.create("user-1", input).await.unwrap();

        assert!(matches!(
            service.delete(report.id, "user-2").await,
            Err(ReportError::PermissionDenied { .. })
        ));

        service.delete(report.id, "user-1").await.unwrap();
        assert!(matches!(
            service.find_by_id(report.id).await,
            Err(ReportError::NotFound)
        ));
    }

    #[tokio::test]
    async fn admin_verification_forces_confirmed() {
        let service = service().await;
        let report = service.create("user-1", minimal_report()).await.unwrap();
        assert_eq!(report.verification_level, VerificationLevel::Unverified);

        let verified = service.verify(report.id, "admin-1").await.unwrap();
        assert_eq!(verified.trust_score, 100);
        assert_eq!(verified.verification_level, VerificationLevel::Confirmed);
        assert_eq!(verified.verified_by.as_deref(), Some("admin-1"));
        assert!(verified.verified_at.is_some());

        let loaded = service.find_by_id(report.id).await.unwrap();
        assert_eq!(loaded.trust_score, 100);
        assert_eq!(loaded.verification_level, VerificationLevel::Confirmed);
    }

    #[tokio::test]
    async fn rescore_all_is_idempotent() {
        let service = service().await;
        let report = service.create("user-1", minimal_report()).await.unwrap();

        assert_eq!(service.rescore_all().await.unwrap(), 1);
        let first = service.find_by_id(report.id).await.unwrap();
        assert_eq!(service.rescore_all().await.unwrap(), 1);
        let second = service.find_by_id(report.id).await.unwrap();

        assert_eq!(first.trust_score, second.trust_score);
        assert_eq!(first.verification_level, second.verification_level);
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let service = service().await;
        service.create("user-1", minimal_report()).await.unwrap();
        let mut robbery = minimal_report();
        robbery.category = Some(CrimeCategory::Robbery);
        service.create("user-2", robbery).await.unwrap();

        let thefts = service
            .list(&ReportQuery {
                category: Some(CrimeCategory::Theft),
                ..ReportQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(thefts.len(), 1);

        let all = service.list(&ReportQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
