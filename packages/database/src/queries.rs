//! Database query functions for reports and votes.
//!
//! All queries use raw parameterized SQL via `query_raw_params()` /
//! `exec_raw_params()` with row extraction through
//! `moosicbox_json_utils`. Timestamps are stored as RFC 3339 text,
//! attachment lists as JSON text.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use crime_watch_database_models::{Report, ReportQuery, Vote};
use crime_watch_report_models::{
    CrimeCategory, ReportStatus, Severity, VerificationLevel, VoteKind,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use uuid::Uuid;

use crate::DbError;

/// Inserts a new report record.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_report(db: &dyn Database, report: &Report) -> Result<(), DbError> {
    let attachments_json = serde_json::to_string(&report.attachments)?;

    db.exec_raw_params(
        "INSERT INTO crime_reports (
            id, reporter_id, title, description, category,
            lat, lng, address, province, district, ward, street,
            attachments, status, severity,
            confirmation_count, dispute_count,
            trust_score, verification_level,
            verified_by, verified_at, reported_at,
            created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
            $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
        )",
        &[
            DatabaseValue::String(report.id.to_string()),
            DatabaseValue::String(report.reporter_id.clone()),
            opt_string(report.title.as_deref()),
            opt_string(report.description.as_deref()),
            opt_category(report.category),
            opt_real(report.lat),
            opt_real(report.lng),
            opt_string(report.address.as_deref()),
            opt_string(report.province.as_deref()),
            opt_string(report.district.as_deref()),
            opt_string(report.ward.as_deref()),
            opt_string(report.street.as_deref()),
            DatabaseValue::String(attachments_json),
            DatabaseValue::Int32(i32::from(report.status.code())),
            DatabaseValue::Int32(i32::from(report.severity.value())),
            DatabaseValue::Int64(i64::from(report.confirmation_count)),
            DatabaseValue::Int64(i64::from(report.dispute_count)),
            DatabaseValue::Int32(i32::from(report.trust_score)),
            DatabaseValue::String(report.verification_level.as_ref().to_string()),
            opt_string(report.verified_by.as_deref()),
            opt_datetime(report.verified_at),
            opt_datetime(report.reported_at),
            DatabaseValue::String(report.created_at.to_rfc3339()),
            DatabaseValue::String(report.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches a single report by ID, or `None` if it doesn't exist.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or the row
/// cannot be parsed.
pub async fn get_report(db: &dyn Database, id: Uuid) -> Result<Option<Report>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM crime_reports WHERE id = $1",
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    rows.first().map(report_from_row).transpose()
}

/// Lists reports matching the query filters, most recent first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or a row cannot
/// be parsed.
pub async fn list_reports(db: &dyn Database, query: &ReportQuery) -> Result<Vec<Report>, DbError> {
    let mut sql = String::from("SELECT * FROM crime_reports WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(category) = query.category {
        write!(sql, " AND category = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(category.as_ref().to_string()));
        param_idx += 1;
    }

    if let Some(district) = &query.district {
        write!(sql, " AND district = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(district.clone()));
        param_idx += 1;
    }

    if let Some(province) = &query.province {
        write!(sql, " AND province = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(province.clone()));
        param_idx += 1;
    }

    if let Some(reporter_id) = &query.reporter_id {
        write!(sql, " AND reporter_id = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(reporter_id.clone()));
    }

    sql.push_str(" ORDER BY created_at DESC");

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.iter().map(report_from_row).collect()
}

/// Returns every report in the store, most recent first.
///
/// Used by the aggregation read paths (heatmap, statistics, nearby
/// alerts) and the periodic rescoring sweep.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn all_reports(db: &dyn Database) -> Result<Vec<Report>, DbError> {
    list_reports(db, &ReportQuery::default()).await
}

/// Updates a report's content fields.
///
/// Derived fields (`trust_score`, `verification_level`) and vote
/// counters are intentionally not written here; they change only
/// through [`update_score`] and [`increment_vote_count`].
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn update_report(db: &dyn Database, report: &Report) -> Result<(), DbError> {
    let attachments_json = serde_json::to_string(&report.attachments)?;

    db.exec_raw_params(
        "UPDATE crime_reports SET
            title = $2, description = $3, category = $4,
            lat = $5, lng = $6, address = $7,
            province = $8, district = $9, ward = $10, street = $11,
            attachments = $12, status = $13, severity = $14,
            reported_at = $15, updated_at = $16
         WHERE id = $1",
        &[
            DatabaseValue::String(report.id.to_string()),
            opt_string(report.title.as_deref()),
            opt_string(report.description.as_deref()),
            opt_category(report.category),
            opt_real(report.lat),
            opt_real(report.lng),
            opt_string(report.address.as_deref()),
            opt_string(report.province.as_deref()),
            opt_string(report.district.as_deref()),
            opt_string(report.ward.as_deref()),
            opt_string(report.street.as_deref()),
            DatabaseValue::String(attachments_json),
            DatabaseValue::Int32(i32::from(report.status.code())),
            DatabaseValue::Int32(i32::from(report.severity.value())),
            opt_datetime(report.reported_at),
            DatabaseValue::String(report.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Deletes a report. Votes cascade via the foreign key.
///
/// Returns the number of deleted report rows (0 or 1).
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_report(db: &dyn Database, id: Uuid) -> Result<u64, DbError> {
    let deleted = db
        .exec_raw_params(
            "DELETE FROM crime_reports WHERE id = $1",
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    Ok(deleted)
}

/// Persists the derived trust score and verification level.
///
/// This is the only write path for the derived fields outside
/// [`set_verified`].
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn update_score(
    db: &dyn Database,
    id: Uuid,
    trust_score: u8,
    level: VerificationLevel,
    updated_at: DateTime<Utc>,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE crime_reports SET
            trust_score = $2, verification_level = $3, updated_at = $4
         WHERE id = $1",
        &[
            DatabaseValue::String(id.to_string()),
            DatabaseValue::Int32(i32::from(trust_score)),
            DatabaseValue::String(level.as_ref().to_string()),
            DatabaseValue::String(updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Records an explicit admin verification: forced score and level plus
/// the verifier identity and timestamp.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn set_verified(
    db: &dyn Database,
    id: Uuid,
    trust_score: u8,
    level: VerificationLevel,
    verified_by: &str,
    verified_at: DateTime<Utc>,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE crime_reports SET
            trust_score = $2, verification_level = $3,
            verified_by = $4, verified_at = $5, updated_at = $5
         WHERE id = $1",
        &[
            DatabaseValue::String(id.to_string()),
            DatabaseValue::Int32(i32::from(trust_score)),
            DatabaseValue::String(level.as_ref().to_string()),
            DatabaseValue::String(verified_by.to_string()),
            DatabaseValue::String(verified_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Increments a report's confirmation or dispute counter.
///
/// Uses a relative SQL increment so concurrent increments cannot lose
/// updates.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn increment_vote_count(
    db: &dyn Database,
    id: Uuid,
    kind: VoteKind,
) -> Result<(), DbError> {
    let sql = match kind {
        VoteKind::Confirm => {
            "UPDATE crime_reports
             SET confirmation_count = confirmation_count + 1
             WHERE id = $1"
        }
        VoteKind::Dispute => {
            "UPDATE crime_reports
             SET dispute_count = dispute_count + 1
             WHERE id = $1"
        }
    };

    db.exec_raw_params(sql, &[DatabaseValue::String(id.to_string())])
        .await?;

    Ok(())
}

/// Inserts a vote record.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails (including a
/// violation of the unique `(voter, report, kind)` constraint).
pub async fn insert_vote(db: &dyn Database, vote: &Vote) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO report_votes (id, voter_id, report_id, vote_kind, created_at)
         VALUES ($1, $2, $3, $4, $5)",
        &[
            DatabaseValue::String(vote.id.to_string()),
            DatabaseValue::String(vote.voter_id.clone()),
            DatabaseValue::String(vote.report_id.to_string()),
            DatabaseValue::String(vote.kind.as_ref().to_string()),
            DatabaseValue::String(vote.created_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Returns all votes a voter holds on a report.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or a row cannot
/// be parsed.
pub async fn votes_by_voter(
    db: &dyn Database,
    report_id: Uuid,
    voter_id: &str,
) -> Result<Vec<Vote>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM report_votes WHERE report_id = $1 AND voter_id = $2",
            &[
                DatabaseValue::String(report_id.to_string()),
                DatabaseValue::String(voter_id.to_string()),
            ],
        )
        .await?;

    rows.iter().map(vote_from_row).collect()
}

// ── Row parsing ─────────────────────────────────────────────────

fn report_from_row(row: &switchy_database::Row) -> Result<Report, DbError> {
    let id = parse_uuid(&required_string(row, "id")?)?;

    let category_name: Option<String> = row.to_value("category").unwrap_or(None);
    let category: Option<CrimeCategory> = category_name.and_then(|s| s.parse().ok());

    let status_code: i32 = row.to_value("status").unwrap_or(0);
    let status = ReportStatus::from_code(u8::try_from(status_code).unwrap_or(0));

    let severity_val: i32 = row.to_value("severity").unwrap_or(1);
    let severity = Severity::from_value(u8::try_from(severity_val).unwrap_or(1))
        .unwrap_or(Severity::Minimal);

    let level_name: Option<String> = row.to_value("verification_level").unwrap_or(None);
    let level = level_name
        .and_then(|s| s.parse().ok())
        .unwrap_or(VerificationLevel::Unverified);

    let attachments_json: String = row.to_value("attachments").unwrap_or_default();
    let attachments: Vec<String> = if attachments_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&attachments_json)?
    };

    let confirmation_count: i64 = row.to_value("confirmation_count").unwrap_or(0);
    let dispute_count: i64 = row.to_value("dispute_count").unwrap_or(0);
    let trust_score: i32 = row.to_value("trust_score").unwrap_or(0);

    Ok(Report {
        id,
        reporter_id: required_string(row, "reporter_id")?,
        title: row.to_value("title").unwrap_or(None),
        description: row.to_value("description").unwrap_or(None),
        category,
        lat: row.to_value("lat").unwrap_or(None),
        lng: row.to_value("lng").unwrap_or(None),
        address: row.to_value("address").unwrap_or(None),
        province: row.to_value("province").unwrap_or(None),
        district: row.to_value("district").unwrap_or(None),
        ward: row.to_value("ward").unwrap_or(None),
        street: row.to_value("street").unwrap_or(None),
        attachments,
        status,
        severity,
        confirmation_count: u32::try_from(confirmation_count).unwrap_or(0),
        dispute_count: u32::try_from(dispute_count).unwrap_or(0),
        trust_score: u8::try_from(trust_score.clamp(0, 100)).unwrap_or(0),
        verification_level: level,
        verified_by: row.to_value("verified_by").unwrap_or(None),
        verified_at: parse_opt_datetime(row, "verified_at")?,
        reported_at: parse_opt_datetime(row, "reported_at")?,
        created_at: parse_datetime(&required_string(row, "created_at")?)?,
        updated_at: parse_datetime(&required_string(row, "updated_at")?)?,
    })
}

fn vote_from_row(row: &switchy_database::Row) -> Result<Vote, DbError> {
    let kind: VoteKind = required_string(row, "vote_kind")?
        .parse()
        .map_err(|_| DbError::conversion("Unknown vote kind"))?;

    Ok(Vote {
        id: parse_uuid(&required_string(row, "id")?)?,
        voter_id: required_string(row, "voter_id")?,
        report_id: parse_uuid(&required_string(row, "report_id")?)?,
        kind,
        created_at: parse_datetime(&required_string(row, "created_at")?)?,
    })
}

fn required_string(row: &switchy_database::Row, column: &str) -> Result<String, DbError> {
    row.to_value(column)
        .map_err(|e| DbError::conversion(format!("Failed to read column {column}: {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::conversion(format!("Invalid UUID {s}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::conversion(format!("Invalid timestamp {s}: {e}")))
}

fn parse_opt_datetime(
    row: &switchy_database::Row,
    column: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let value: Option<String> = row.to_value(column).unwrap_or(None);
    value.map(|s| parse_datetime(&s)).transpose()
}

const fn opt_real(value: Option<f64>) -> DatabaseValue {
    match value {
        Some(v) => DatabaseValue::Real64(v),
        None => DatabaseValue::Null,
    }
}

fn opt_category(value: Option<CrimeCategory>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |c| {
        DatabaseValue::String(c.as_ref().to_string())
    })
}

fn opt_string(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| {
        DatabaseValue::String(s.to_string())
    })
}

fn opt_datetime(value: Option<DateTime<Utc>>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |dt| {
        DatabaseValue::String(dt.to_rfc3339())
    })
}
