#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Trust score calculation and verification level derivation.
//!
//! The trust score summarizes a report's credibility as an integer in
//! `0..=100`, composed of four independently capped contributions:
//! evidence (25), completeness (20), freshness (10), and community
//! votes (45). The verification level is a deterministic bucketing of
//! the score.
//!
//! Both functions are pure: they read the report and an explicit `now`
//! and touch no other state. Scores are always recomputed from the full
//! current state of a report, never patched incrementally, so repeated
//! rescoring of an unchanged report is idempotent.

use chrono::{DateTime, Utc};
use crime_watch_database_models::Report;
use crime_watch_report_models::VerificationLevel;

/// Evidence contribution for a report with at least one attachment.
const EVIDENCE_POINTS: i64 = 25;

/// Cap on the completeness contribution.
const COMPLETENESS_CAP: i64 = 20;

/// Cap on the community vote contribution.
const COMMUNITY_CAP: i64 = 45;

/// Trust score assigned by an explicit admin verification.
pub const ADMIN_TRUST_SCORE: u8 = 100;

/// Computes the trust score for a report at the given instant.
///
/// Contributions:
/// - evidence: +25 if the report has at least one attachment URL
/// - completeness (capped at 20): +4 title, +5 description, +3
///   category, +4 address, +4 coordinates
/// - freshness (exclusive brackets on age since creation): under 24h
///   +10, under 72h +7, under one week +4, otherwise 0
/// - community (capped at 45, floored at 0):
///   `confirmations * 5 - disputes * 10`
///
/// The sum is clamped to `0..=100`.
#[must_use]
pub fn score(report: &Report, now: DateTime<Utc>) -> u8 {
    let mut total = 0i64;

    if !report.attachments.is_empty() {
        total += EVIDENCE_POINTS;
    }

    total += completeness(report).min(COMPLETENESS_CAP);
    total += freshness(report.created_at, now);
    total += community(report.confirmation_count, report.dispute_count);

    u8::try_from(total.clamp(0, 100)).unwrap_or(100)
}

/// Derives the verification level for a trust score.
///
/// Thresholds, evaluated high to low: 85 confirmed, 70 verified,
/// 40 pending, below 40 unverified.
#[must_use]
pub const fn verification_level(trust_score: u8) -> VerificationLevel {
    if trust_score >= 85 {
        VerificationLevel::Confirmed
    } else if trust_score >= 70 {
        VerificationLevel::Verified
    } else if trust_score >= 40 {
        VerificationLevel::Pending
    } else {
        VerificationLevel::Unverified
    }
}

/// Computes the score and level for a report in one call.
#[must_use]
pub fn rescore(report: &Report, now: DateTime<Utc>) -> (u8, VerificationLevel) {
    let trust_score = score(report, now);
    (trust_score, verification_level(trust_score))
}

fn completeness(report: &Report) -> i64 {
    let mut points = 0i64;
    if report.title.is_some() {
        points += 4;
    }
    if report.description.is_some() {
        points += 5;
    }
    if report.category.is_some() {
        points += 3;
    }
    if report.address.is_some() {
        points += 4;
    }
    if report.has_coordinates() {
        points += 4;
    }
    points
}

fn freshness(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let hours = (now - created_at).num_hours();
    if hours < 24 {
        10
    } else if hours < 72 {
        7
    } else if hours < 168 {
        4
    } else {
        0
    }
}

fn community(confirmations: u32, disputes: u32) -> i64 {
    let raw = i64::from(confirmations) * 5 - i64::from(disputes) * 10;
    raw.clamp(0, COMMUNITY_CAP)
}
