//! The community vote ledger.
//!
//! A voter may hold at most one confirm and one dispute vote per
//! report (never two of the same kind, at most two total) and may
//! never vote on a report they authored. Preconditions are checked in
//! a fixed order, each failing with its own error kind: existence,
//! self-vote, quota, duplicate kind.
//!
//! The count-votes / insert / increment / rescore sequence runs under
//! the report's serialization lock; see [`crate::locks`].

use chrono::Utc;
use crime_watch_database::queries;
use crime_watch_database_models::{Report, Vote, VoteStatus};
use crime_watch_report_models::VoteKind;
use uuid::Uuid;

use crate::{ReportError, ReportService};

/// Maximum total votes one user may hold on one report.
pub const MAX_VOTES_PER_REPORT: usize = 2;

impl ReportService {
    /// Casts a confirm vote on a report.
    ///
    /// # Errors
    ///
    /// See [`ReportError`]: `NotFound`, `SelfVoteRejected`,
    /// `VoteQuotaExceeded`, `DuplicateVote`, or `Database`.
    pub async fn confirm(&self, report_id: Uuid, voter_id: &str) -> Result<Report, ReportError> {
        self.cast_vote(report_id, voter_id, VoteKind::Confirm).await
    }

    /// Casts a dispute vote on a report.
    ///
    /// # Errors
    ///
    /// See [`ReportError`]: `NotFound`, `SelfVoteRejected`,
    /// `VoteQuotaExceeded`, `DuplicateVote`, or `Database`.
    pub async fn dispute(&self, report_id: Uuid, voter_id: &str) -> Result<Report, ReportError> {
        self.cast_vote(report_id, voter_id, VoteKind::Dispute).await
    }

    /// Reports a user's voting position on a report. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] for an unknown report or
    /// [`ReportError::Database`] on storage failure.
    pub async fn vote_status(
        &self,
        report_id: Uuid,
        user_id: &str,
    ) -> Result<VoteStatus, ReportError> {
        let report = queries::get_report(self.db(), report_id)
            .await?
            .ok_or(ReportError::NotFound)?;

        let votes = queries::votes_by_voter(self.db(), report_id, user_id).await?;

        let has_confirmed = votes.iter().any(|v| v.kind == VoteKind::Confirm);
        let has_disputed = votes.iter().any(|v| v.kind == VoteKind::Dispute);
        let vote_count = u32::try_from(votes.len()).unwrap_or(u32::MAX);

        Ok(VoteStatus {
            has_confirmed,
            has_disputed,
            vote_count,
            can_vote: votes.len() < MAX_VOTES_PER_REPORT,
            is_owner: report.reporter_id == user_id,
        })
    }

    async fn cast_vote(
        &self,
        report_id: Uuid,
        voter_id: &str,
        kind: VoteKind,
    ) -> Result<Report, ReportError> {
        let _guard = self.locks().acquire(report_id).await;

        let report = queries::get_report(self.db(), report_id)
            .await?
            .ok_or(ReportError::NotFound)?;

        if report.reporter_id == voter_id {
            return Err(ReportError::SelfVoteRejected);
        }

        let votes = queries::votes_by_voter(self.db(), report_id, voter_id).await?;
        if votes.len() >= MAX_VOTES_PER_REPORT {
            return Err(ReportError::VoteQuotaExceeded);
        }
        if votes.iter().any(|v| v.kind == kind) {
            return Err(ReportError::DuplicateVote);
        }

        let vote = Vote {
            id: Uuid::new_v4(),
            voter_id: voter_id.to_string(),
            report_id,
            kind,
            created_at: Utc::now(),
        };
        queries::insert_vote(self.db(), &vote).await?;
        queries::increment_vote_count(self.db(), report_id, kind).await?;

        // Re-read for the fresh counters, then derive score and level
        let mut updated = queries::get_report(self.db(), report_id)
            .await?
            .ok_or(ReportError::NotFound)?;
        self.rescore_and_persist(&mut updated).await?;

        log::info!("{kind} vote by {voter_id} on report {report_id}");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::test_support::{minimal_report, service};
    use crate::{CreateReport, ReportService};
    use crime_watch_report_models::VerificationLevel;

    use super::*;

    async fn created_report(service: &ReportService) -> Report {
        service.create("owner", minimal_report()).await.unwrap()
    }

    #[tokio::test]
    async fn vote_on_missing_report_is_not_found() {
        let service = service().await;
        assert!(matches!(
            service.confirm(Uuid::new_v4(), "voter").await,
            Err(ReportError::NotFound)
        ));
    }

    #[tokio::test]
    async fn owner_cannot_vote_on_own_report() {
        let service = service().await;
        let report = created_report(&service).await;

        assert!(matches!(
            service.confirm(report.id, "owner").await,
            Err(ReportError::SelfVoteRejected)
        ));
        assert!(matches!(
            service.dispute(report.id, "owner").await,
            Err(ReportError::SelfVoteRejected)
        ));
    }

    #[tokio::test]
    async fn duplicate_kind_is_rejected() {
        let service = service().await;
        let report = created_report(&service).await;

        service.confirm(report.id, "voter-1").await.unwrap();
        assert!(matches!(
            service.confirm(report.id, "voter-1").await,
            Err(ReportError::DuplicateVote)
        ));

        // The opposite kind is still allowed
        service.dispute(report.id, "voter-1").await.unwrap();
    }

    #[tokio::test]
    async fn quota_rejects_any_third_vote() {
        let service = service().await;
        let report = created_report(&service).await;

        service.confirm(report.id, "voter-1").await.unwrap();
        service.dispute(report.id, "voter-1").await.unwrap();

        // Quota is checked before duplicate kind, so both kinds now
        // fail with the quota error
        assert!(matches!(
            service.confirm(report.id, "voter-1").await,
            Err(ReportError::VoteQuotaExceeded)
        ));
        assert!(matches!(
            service.dispute(report.id, "voter-1").await,
            Err(ReportError::VoteQuotaExceeded)
        ));
    }

    #[tokio::test]
    async fn confirmations_raise_the_score() {
        let service = service().await;
        let report = created_report(&service).await;
        // freshness 10 + title 4 + address 4 + category 3 = 21
        assert_eq!(report.trust_score, 21);

        service.confirm(report.id, "voter-1").await.unwrap();
        let after_two = service.confirm(report.id, "voter-2").await.unwrap();

        assert_eq!(after_two.confirmation_count, 2);
        // community contribution: min(2 * 5, 45) = 10
        assert_eq!(after_two.trust_score, 31);
        assert_eq!(after_two.verification_level, VerificationLevel::Unverified);
    }

    #[tokio::test]
    async fn disputes_lower_the_score() {
        let service = service().await;
        let report = created_report(&service).await;

        service.confirm(report.id, "voter-1").await.unwrap();
        let disputed = service.dispute(report.id, "voter-2").await.unwrap();

        assert_eq!(disputed.confirmation_count, 1);
        assert_eq!(disputed.dispute_count, 1);
        // community: max(0, 1*5 - 1*10) = 0
        assert_eq!(disputed.trust_score, 21);
    }

    #[tokio::test]
    async fn vote_status_reflects_ledger_and_does_not_mutate() {
        let service = service().await;
        let report = created_report(&service).await;

        let status = service.vote_status(report.id, "voter-1").await.unwrap();
        assert!(!status.has_confirmed);
        assert!(!status.has_disputed);
        assert_eq!(status.vote_count, 0);
        assert!(status.can_vote);
        assert!(!status.is_owner);

        service.confirm(report.id, "voter-1").await.unwrap();
        service.dispute(report.id, "voter-1").await.unwrap();

        let before = service.find_by_id(report.id).await.unwrap();
        let status = service.vote_status(report.id, "voter-1").await.unwrap();
        let after = service.find_by_id(report.id).await.unwrap();

        assert!(status.has_confirmed);
        assert!(status.has_disputed);
        assert_eq!(status.vote_count, 2);
        assert!(!status.can_vote);
        assert_eq!(before, after);

        let owner_status = service.vote_status(report.id, "owner").await.unwrap();
        assert!(owner_status.is_owner);
    }

    #[tokio::test]
    async fn end_to_end_voting_flow() {
        let service = service().await;
        let report = service
            .create(
                "owner",
                CreateReport {
                    title: Some("Homicide near the docks".to_string()),
                    address: Some("Pier 4".to_string()),
                    category: Some(crime_watch_report_models::CrimeCategory::Homicide),
                    ..CreateReport::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(report.severity.value(), 5);

        service.confirm(report.id, "voter-1").await.unwrap();
        let confirmed = service.confirm(report.id, "voter-2").await.unwrap();
        assert_eq!(confirmed.confirmation_count, 2);
        assert_eq!(confirmed.trust_score, 31);

        // A repeat of an already-cast kind is a duplicate
        assert!(matches!(
            service.confirm(report.id, "voter-1").await,
            Err(ReportError::DuplicateVote)
        ));

        // A third voter only hits the quota once both votes are held
        service.confirm(report.id, "voter-3").await.unwrap();
        service.dispute(report.id, "voter-3").await.unwrap();
        assert!(matches!(
            service.confirm(report.id, "voter-3").await,
            Err(ReportError::VoteQuotaExceeded)
        ));
    }

    #[tokio::test]
    async fn concurrent_votes_keep_the_ledger_consistent() {
        let service = Arc::new(service().await);
        let report = created_report(&service).await;

        let tasks: Vec<_> = (0..6)
            .map(|i| {
                let service = Arc::clone(&service);
                let report_id = report.id;
                tokio::spawn(async move {
                    service.confirm(report_id, &format!("voter-{i}")).await
                })
            })
            .collect();

        let mut successes = 0u32;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 6);

        let loaded = service.find_by_id(report.id).await.unwrap();
        assert_eq!(loaded.confirmation_count, 6);
        // community: min(6 * 5, 45) = 30 -> 21 + 30 = 51
        assert_eq!(loaded.trust_score, 51);
        assert_eq!(loaded.verification_level, VerificationLevel::Pending);
    }

    #[tokio::test]
    async fn concurrent_duplicate_votes_only_count_once() {
        let service = Arc::new(service().await);
        let report = created_report(&service).await;

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                let report_id = report.id;
                tokio::spawn(async move { service.confirm(report_id, "same-voter").await })
            })
            .collect();

        let mut successes = 0u32;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);

        let loaded = service.find_by_id(report.id).await.unwrap();
        assert_eq!(loaded.confirmation_count, 1);
    }
}
