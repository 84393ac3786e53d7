#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geospatial aggregation over crime reports.
//!
//! Read-only views computed from the report store: heatmap cells
//! grouped by administrative area and category, a statistics snapshot,
//! and the nearby-alert danger query. Nearby queries use true
//! great-circle (Haversine) distance; a flat degrees-to-kilometers
//! conversion would accumulate error with latitude and radius.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crime_watch_database_models::Report;
use crime_watch_report_models::{CrimeCategory, DangerLevel, ReportStatus, danger_weight};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default nearby-alert radius in kilometers.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

/// Maximum number of reports returned by a nearby-alert query.
pub const NEARBY_RESULT_CAP: usize = 50;

/// One heatmap cell: all reports sharing an administrative area and
/// category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    /// Mean latitude of the reports in this cell that have coordinates
    /// (0 when none do).
    pub latitude: f64,
    /// Mean longitude, same convention as `latitude`.
    pub longitude: f64,
    /// District the cell groups on.
    pub district: Option<String>,
    /// Province the cell groups on.
    pub province: Option<String>,
    /// Crime category the cell groups on.
    pub crime_type: Option<CrimeCategory>,
    /// Number of reports in the cell.
    pub count: u64,
    /// Danger classification of `count * danger_weight(category)`.
    pub severity: DangerLevel,
}

/// Counts-by-category entry in the statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Crime category (`None` groups the uncategorized reports).
    pub category: Option<CrimeCategory>,
    /// Number of reports.
    pub count: u64,
}

/// Counts-by-district entry in the statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictCount {
    /// District name.
    pub district: String,
    /// Number of reports.
    pub count: u64,
}

/// Aggregate statistics over the whole report store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Total number of reports.
    pub total: u64,
    /// Reports still in the open status.
    pub active_alerts: u64,
    /// Reports with severity 4 or higher.
    pub high_severity: u64,
    /// Counts per category.
    pub by_category: Vec<CategoryCount>,
    /// Top districts by report count (at most ten).
    pub by_district: Vec<DistrictCount>,
}

/// A report entry in a nearby-alert response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyReport {
    /// Report ID.
    pub id: Uuid,
    /// Report title.
    pub title: Option<String>,
    /// Crime category.
    pub crime_type: Option<CrimeCategory>,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Free-text address.
    pub address: Option<String>,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
}

/// Result of a nearby-alert query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NearbyAlert {
    /// No reports within the radius.
    Safe {
        /// Always `false`.
        #[serde(rename = "hasAlert")]
        has_alert: bool,
        /// Human-readable all-clear message.
        message: String,
    },
    /// At least one report within the radius.
    Alert {
        /// Always `true`.
        #[serde(rename = "hasAlert")]
        has_alert: bool,
        /// Danger classification of the total danger score.
        #[serde(rename = "alertLevel")]
        alert_level: DangerLevel,
        /// Number of reports within the radius (after the result cap).
        #[serde(rename = "totalReports")]
        total_reports: u64,
        /// Sum of danger weights over the selected reports.
        #[serde(rename = "totalDangerScore")]
        total_danger_score: u64,
        /// The selected reports, most recent first.
        reports: Vec<NearbyReport>,
    },
}

impl NearbyAlert {
    /// Whether the query found any reports.
    #[must_use]
    pub const fn has_alert(&self) -> bool {
        matches!(self, Self::Alert { .. })
    }
}

/// Groups reports into heatmap cells by (district, province, category).
///
/// Reports without coordinates still count toward their cell but are
/// ignored for the centroid.
#[must_use]
pub fn heatmap(reports: &[Report]) -> Vec<HeatmapCell> {
    struct CellAccumulator {
        count: u64,
        lat_sum: f64,
        lng_sum: f64,
        coord_count: u64,
    }

    let mut cells: BTreeMap<
        (Option<String>, Option<String>, Option<CrimeCategory>),
        CellAccumulator,
    > = BTreeMap::new();

    for report in reports {
        let key = (
            report.district.clone(),
            report.province.clone(),
            report.category,
        );
        let cell = cells.entry(key).or_insert(CellAccumulator {
            count: 0,
            lat_sum: 0.0,
            lng_sum: 0.0,
            coord_count: 0,
        });
        cell.count += 1;
        if let (Some(lat), Some(lng)) = (report.lat, report.lng) {
            cell.lat_sum += lat;
            cell.lng_sum += lng;
            cell.coord_count += 1;
        }
    }

    cells
        .into_iter()
        .map(|((district, province, category), cell)| {
            let danger_score = cell.count * u64::from(danger_weight(category));
            #[allow(clippy::cast_precision_loss)]
            let divisor = cell.coord_count.max(1) as f64;
            HeatmapCell {
                latitude: cell.lat_sum / divisor,
                longitude: cell.lng_sum / divisor,
                district,
                province,
                crime_type: category,
                count: cell.count,
                severity: DangerLevel::from_danger_score(danger_score),
            }
        })
        .collect()
}

/// Computes the statistics snapshot over all reports.
#[must_use]
pub fn statistics(reports: &[Report]) -> StatisticsSnapshot {
    let total = reports.len() as u64;
    let active_alerts = reports
        .iter()
        .filter(|r| r.status == ReportStatus::Open)
        .count() as u64;
    let high_severity = reports.iter().filter(|r| r.severity.value() >= 4).count() as u64;

    let mut by_category: BTreeMap<Option<CrimeCategory>, u64> = BTreeMap::new();
    let mut by_district: BTreeMap<String, u64> = BTreeMap::new();

    for report in reports {
        *by_category.entry(report.category).or_insert(0) += 1;
        if let Some(district) = &report.district {
            *by_district.entry(district.clone()).or_insert(0) += 1;
        }
    }

    let by_category = by_category
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    let mut by_district: Vec<DistrictCount> = by_district
        .into_iter()
        .map(|(district, count)| DistrictCount { district, count })
        .collect();
    by_district.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.district.cmp(&b.district)));
    by_district.truncate(10);

    StatisticsSnapshot {
        total,
        active_alerts,
        high_severity,
        by_category,
        by_district,
    }
}

/// Selects reports within `radius_km` of the query point and scores
/// the area's danger.
///
/// Distance is great-circle (Haversine); the radius boundary is
/// inclusive. Reports without coordinates are skipped. Results are
/// ordered most recent first and capped at [`NEARBY_RESULT_CAP`].
#[must_use]
pub fn nearby_alert(reports: &[Report], lat: f64, lng: f64, radius_km: f64) -> NearbyAlert {
    let origin = Point::new(lng, lat);
    let radius_meters = radius_km * 1000.0;

    let mut nearby: Vec<&Report> = reports
        .iter()
        .filter(|report| {
            let (Some(report_lat), Some(report_lng)) = (report.lat, report.lng) else {
                return false;
            };
            Haversine.distance(origin, Point::new(report_lng, report_lat)) <= radius_meters
        })
        .collect();

    if nearby.is_empty() {
        return NearbyAlert::Safe {
            has_alert: false,
            message: "This area is safe".to_string(),
        };
    }

    nearby.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    nearby.truncate(NEARBY_RESULT_CAP);

    let total_danger_score: u64 = nearby
        .iter()
        .map(|report| u64::from(danger_weight(report.category)))
        .sum();

    let reports = nearby
        .into_iter()
        .map(|report| NearbyReport {
            id: report.id,
            title: report.title.clone(),
            crime_type: report.category,
            lat: report.lat.unwrap_or_default(),
            lng: report.lng.unwrap_or_default(),
            address: report.address.clone(),
            created_at: report.created_at,
        })
        .collect::<Vec<_>>();

    NearbyAlert::Alert {
        has_alert: true,
        alert_level: DangerLevel::from_danger_score(total_danger_score),
        total_reports: reports.len() as u64,
        total_danger_score,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crime_watch_report_models::{Severity, VerificationLevel};

    use super::*;

    fn report_at(lat: f64, lng: f64, category: Option<CrimeCategory>) -> Report {
        let now = Utc::now();
        Report {
            id: Uuid::new_v4(),
            reporter_id: "reporter".to_string(),
            title: Some("incident".to_string()),
            description: None,
            category,
            lat: Some(lat),
            lng: Some(lng),
            address: None,
            province: Some("Hanoi".to_string()),
            district: Some("Hoan Kiem".to_string()),
            ward: None,
            street: None,
            attachments: Vec::new(),
            status: ReportStatus::Open,
            severity: category.map_or(Severity::Minimal, CrimeCategory::default_severity),
            confirmation_count: 0,
            dispute_count: 0,
            trust_score: 0,
            verification_level: VerificationLevel::Unverified,
            verified_by: None,
            verified_at: None,
            reported_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_area_reports_safe() {
        let result = nearby_alert(&[], 21.0285, 105.8542, DEFAULT_NEARBY_RADIUS_KM);
        assert!(!result.has_alert());
    }

    #[test]
    fn distant_reports_are_excluded() {
        // Roughly 170 km between Hanoi and Haiphong
        let reports = vec![report_at(20.8449, 106.6881, Some(CrimeCategory::Theft))];
        let result = nearby_alert(&reports, 21.0285, 105.8542, 5.0);
        assert!(!result.has_alert());
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let report = report_at(21.0285, 105.9, Some(CrimeCategory::Theft));
        let exact_meters = Haversine.distance(
            Point::new(105.8542, 21.0285),
            Point::new(105.9, 21.0285),
        );

        let reports = vec![report];
        let at_boundary = nearby_alert(&reports, 21.0285, 105.8542, exact_meters / 1000.0);
        assert!(at_boundary.has_alert());

        let below_boundary =
            nearby_alert(&reports, 21.0285, 105.8542, (exact_meters - 1.0) / 1000.0);
        assert!(!below_boundary.has_alert());
    }

    #[test]
    fn danger_score_sums_category_weights() {
        let reports = vec![
            report_at(21.0285, 105.8542, Some(CrimeCategory::Homicide)),
            report_at(21.0286, 105.8543, Some(CrimeCategory::Robbery)),
            report_at(21.0287, 105.8544, None),
        ];

        let result = nearby_alert(&reports, 21.0285, 105.8542, 5.0);
        let NearbyAlert::Alert {
            total_danger_score,
            total_reports,
            alert_level,
            ..
        } = result
        else {
            panic!("expected an alert");
        };

        assert_eq!(total_danger_score, 10 + 7 + 1);
        assert_eq!(total_reports, 3);
        assert_eq!(alert_level, DangerLevel::Low);
    }

    #[test]
    fn alert_level_crosses_thresholds() {
        // 16 homicides -> 160 danger score -> high
        let reports: Vec<Report> = (0..16)
            .map(|_| report_at(21.0285, 105.8542, Some(CrimeCategory::Homicide)))
            .collect();

        let result = nearby_alert(&reports, 21.0285, 105.8542, 5.0);
        let NearbyAlert::Alert { alert_level, .. } = result else {
            panic!("expected an alert");
        };
        assert_eq!(alert_level, DangerLevel::High);
    }

    #[test]
    fn results_are_capped_and_most_recent_first() {
        let mut reports: Vec<Report> = (0..60)
            .map(|i| {
                let mut r = report_at(21.0285, 105.8542, Some(CrimeCategory::Theft));
                r.created_at = Utc::now() - Duration::hours(i);
                r
            })
            .collect();
        // Shuffle-ish: reverse so the oldest comes first in storage order
        reports.reverse();

        let result = nearby_alert(&reports, 21.0285, 105.8542, 5.0);
        let NearbyAlert::Alert {
            reports: selected,
            total_reports,
            ..
        } = result
        else {
            panic!("expected an alert");
        };

        assert_eq!(selected.len(), NEARBY_RESULT_CAP);
        assert_eq!(total_reports, 50);
        for pair in selected.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[test]
    fn heatmap_groups_by_area_and_category() {
        let mut in_other_district = report_at(21.03, 105.86, Some(CrimeCategory::Theft));
        in_other_district.district = Some("Ba Dinh".to_string());

        let reports = vec![
            report_at(21.0, 105.8, Some(CrimeCategory::Theft)),
            report_at(21.2, 105.9, Some(CrimeCategory::Theft)),
            report_at(21.1, 105.85, Some(CrimeCategory::Homicide)),
            in_other_district,
        ];

        let cells = heatmap(&reports);
        assert_eq!(cells.len(), 3);

        let theft_cell = cells
            .iter()
            .find(|c| {
                c.crime_type == Some(CrimeCategory::Theft)
                    && c.district.as_deref() == Some("Hoan Kiem")
            })
            .unwrap();
        assert_eq!(theft_cell.count, 2);
        assert!((theft_cell.latitude - 21.1).abs() < 1e-9);
        assert!((theft_cell.longitude - 105.85).abs() < 1e-9);
        assert_eq!(theft_cell.severity, DangerLevel::Low);
    }

    #[test]
    fn heatmap_centroid_ignores_missing_coordinates() {
        let mut no_coords = report_at(0.0, 0.0, Some(CrimeCategory::Theft));
        no_coords.lat = None;
        no_coords.lng = None;

        let reports = vec![report_at(21.0, 105.8, Some(CrimeCategory::Theft)), no_coords];
        let cells = heatmap(&reports);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].count, 2);
        assert!((cells[0].latitude - 21.0).abs() < 1e-9);
    }

    #[test]
    fn heatmap_severity_scales_with_count() {
        // 20 homicides in one cell -> 200 -> high
        let reports: Vec<Report> = (0..20)
            .map(|_| report_at(21.0, 105.8, Some(CrimeCategory::Homicide)))
            .collect();
        let cells = heatmap(&reports);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].severity, DangerLevel::High);
    }

    #[test]
    fn statistics_counts_and_top_districts() {
        let mut resolved = report_at(21.0, 105.8, Some(CrimeCategory::Theft));
        resolved.status = ReportStatus::Resolved;

        let reports = vec![
            report_at(21.0, 105.8, Some(CrimeCategory::Homicide)),
            report_at(21.0, 105.8, Some(CrimeCategory::Homicide)),
            report_at(21.0, 105.8, Some(CrimeCategory::Theft)),
            resolved,
        ];

        let stats = statistics(&reports);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active_alerts, 3);
        // Homicide defaults to severity 5
        assert_eq!(stats.high_severity, 2);
        assert_eq!(stats.by_district.len(), 1);
        assert_eq!(stats.by_district[0].count, 4);

        let homicide_count = stats
            .by_category
            .iter()
            .find(|c| c.category == Some(CrimeCategory::Homicide))
            .unwrap();
        assert_eq!(homicide_count.count, 2);
    }
}
