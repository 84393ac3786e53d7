#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crime category taxonomy, danger weights, and verification levels.
//!
//! This crate defines the canonical reference data shared across the
//! crime-watch system: the crime categories users can report, the fixed
//! danger weight each category carries for aggregate scoring, the 1-5
//! severity scale, and the verification levels derived from trust scores.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Categories of reportable crime incidents.
///
/// Each category carries a fixed [`danger weight`](Self::danger_weight)
/// used by aggregate danger classification, and a coarser
/// [`default severity`](Self::default_severity) used when a report is
/// created without an explicit severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CrimeCategory {
    /// Murder or manslaughter
    Homicide,
    /// Abduction of a person
    Kidnapping,
    /// Sighting of a person wanted by the authorities
    WantedPerson,
    /// Taking property by force or threat
    Robbery,
    /// Threats of violence or intimidation
    Threat,
    /// Sighting of a known criminal suspect
    SuspectSighting,
    /// Behavior that looks suspicious but has no confirmed offense
    SuspiciousActivity,
    /// Unlawful taking of property without force
    Theft,
}

impl CrimeCategory {
    /// Returns the danger weight for this category.
    ///
    /// Danger weights feed aggregate danger scores: a heatmap cell or
    /// nearby-alert query sums `count * weight` and classifies the total
    /// with [`DangerLevel::from_danger_score`].
    #[must_use]
    pub const fn danger_weight(self) -> u32 {
        match self {
            Self::Homicide => 10,
            Self::Kidnapping => 9,
            Self::WantedPerson => 8,
            Self::Robbery => 7,
            Self::Threat => 6,
            Self::SuspectSighting => 5,
            Self::SuspiciousActivity | Self::Theft => 3,
        }
    }

    /// Danger weight for a report with no category.
    pub const UNCATEGORIZED_DANGER_WEIGHT: u32 = 1;

    /// Returns the default severity for this category.
    ///
    /// Applied at report creation when the reporter does not supply an
    /// explicit severity. Coarser than the danger weight: severity is a
    /// per-report 1-5 scale, the danger weight an aggregation factor.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Homicide | Self::Kidnapping => Severity::Critical,
            Self::WantedPerson => Severity::High,
            Self::Robbery => Severity::Moderate,
            Self::Threat | Self::SuspectSighting => Severity::Low,
            Self::SuspiciousActivity | Self::Theft => Severity::Minimal,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Homicide,
            Self::Kidnapping,
            Self::WantedPerson,
            Self::Robbery,
            Self::Threat,
            Self::SuspectSighting,
            Self::SuspiciousActivity,
            Self::Theft,
        ]
    }
}

/// Returns the danger weight for an optional category.
///
/// Reports without a category weigh
/// [`CrimeCategory::UNCATEGORIZED_DANGER_WEIGHT`].
#[must_use]
pub const fn danger_weight(category: Option<CrimeCategory>) -> u32 {
    match category {
        Some(c) => c.danger_weight(),
        None => CrimeCategory::UNCATEGORIZED_DANGER_WEIGHT,
    }
}

/// Severity of a reported incident, from 1 (minimal) to 5 (critical).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Level 1: minor or unconfirmed incidents
    Minimal = 1,
    /// Level 2: low-level incidents
    Low = 2,
    /// Level 3: moderate incidents
    Moderate = 3,
    /// Level 4: serious incidents
    High = 4,
    /// Level 5: most severe incidents
    Critical = 5,
}

impl Severity {
    /// Returns the numeric value of this severity.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a severity from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        match value {
            1 => Ok(Self::Minimal),
            2 => Ok(Self::Low),
            3 => Ok(Self::Moderate),
            4 => Ok(Self::High),
            5 => Ok(Self::Critical),
            _ => Err(InvalidSeverityError { value }),
        }
    }

    /// Buckets this severity into a coarse low/medium/high level.
    ///
    /// Severity 5 is high, 3-4 medium, 1-2 low.
    #[must_use]
    pub const fn level(self) -> SeverityLevel {
        match self {
            Self::Critical => SeverityLevel::High,
            Self::Moderate | Self::High => SeverityLevel::Medium,
            Self::Minimal | Self::Low => SeverityLevel::Low,
        }
    }
}

/// Error returned when attempting to create a [`Severity`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity value {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidSeverityError {}

/// Coarse low/medium/high bucket derived from a report's severity.
///
/// Serialized lowercase in API responses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SeverityLevel {
    /// Severity 1-2
    Low,
    /// Severity 3-4
    Medium,
    /// Severity 5
    High,
}

/// Aggregate danger classification for a heatmap cell or nearby-alert
/// query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DangerLevel {
    /// Danger score 0-50
    Low,
    /// Danger score 51-150
    Medium,
    /// Danger score above 150
    High,
}

impl DangerLevel {
    /// Classifies a summed `count * danger_weight` score.
    #[must_use]
    pub const fn from_danger_score(score: u64) -> Self {
        if score > 150 {
            Self::High
        } else if score > 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// How far a report has been verified, derived from its trust score.
///
/// Ordered from least to most trusted so ordering comparisons follow
/// trust.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VerificationLevel {
    /// Trust score below 40
    Unverified,
    /// Trust score 40-69
    Pending,
    /// Trust score 70-84
    Verified,
    /// Trust score 85 and above, or admin-verified
    Confirmed,
}

/// Lifecycle status of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Newly reported, no action taken
    Open = 0,
    /// Under investigation
    Investigating = 1,
    /// Closed / resolved
    Resolved = 2,
}

impl ReportStatus {
    /// Returns the numeric status code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Creates a status from its numeric code, defaulting to [`Self::Open`]
    /// for unknown codes.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Investigating,
            2 => Self::Resolved,
            _ => Self::Open,
        }
    }
}

/// The two stances a community member can take on a report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoteKind {
    /// The voter believes the report is accurate.
    Confirm,
    /// The voter believes the report is false or misleading.
    Dispute,
}
