//! HTTP handler functions for the crime watch API.

use actix_web::{HttpRequest, HttpResponse, web};
use crime_watch_blob::ingest::AttachmentSource;
use crime_watch_database_models::ReportQuery;
use crime_watch_report_models::CrimeCategory;
use crime_watch_reports::{CreateReport, ReportError, UpdateReport};
use crime_watch_server_models::{
    ApiHealth, ApiReport, CreateReportRequest, NearbyQueryParams, ReportListParams,
    UpdateReportRequest, status_from_code,
};
use uuid::Uuid;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
///
/// Returns the crime category taxonomy with danger weights and
/// default severities.
pub async fn categories() -> HttpResponse {
    let categories: Vec<serde_json::Value> = CrimeCategory::all()
        .iter()
        .map(|category| {
            serde_json::json!({
                "name": category.to_string(),
                "dangerWeight": category.danger_weight(),
                "defaultSeverity": category.default_severity().value(),
            })
        })
        .collect();

    HttpResponse::Ok().json(categories)
}

/// `GET /api/reports`
///
/// Lists reports, optionally filtered by category, most recent first.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportListParams>,
) -> HttpResponse {
    let query = ReportQuery {
        category: params.crime_type,
        ..ReportQuery::default()
    };

    match state.service.list(&query).await {
        Ok(reports) => HttpResponse::Ok().json(to_api_reports(reports)),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/reports`
pub async fn create_report(
    state: web::Data<AppState>,
    request: web::Json<CreateReportRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let reporter_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let input = to_create_input(&state, request.into_inner());

    match state.service.create(&reporter_id, input).await {
        Ok(report) => HttpResponse::Created().json(ApiReport::from(report)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/heatmap`
pub async fn heatmap(state: web::Data<AppState>) -> HttpResponse {
    match state.service.heatmap().await {
        Ok(cells) => HttpResponse::Ok().json(cells),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/statistics`
pub async fn statistics(state: web::Data<AppState>) -> HttpResponse {
    match state.service.statistics().await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/nearby?lat=..&lng=..&radius=..`
pub async fn nearby(
    state: web::Data<AppState>,
    params: web::Query<NearbyQueryParams>,
) -> HttpResponse {
    match state
        .service
        .nearby_alert(params.lat, params.lng, params.radius)
        .await
    {
        Ok(alert) => HttpResponse::Ok().json(alert),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/mine`
pub async fn my_reports(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let user_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = ReportQuery {
        reporter_id: Some(user_id),
        ..ReportQuery::default()
    };

    match state.service.list(&query).await {
        Ok(reports) => HttpResponse::Ok().json(to_api_reports(reports)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/district/{district}`
pub async fn by_district(
    state: web::Data<AppState>,
    district: web::Path<String>,
) -> HttpResponse {
    let query = ReportQuery {
        district: Some(district.into_inner()),
        ..ReportQuery::default()
    };

    match state.service.list(&query).await {
        Ok(reports) => HttpResponse::Ok().json(to_api_reports(reports)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/city/{province}`
pub async fn by_province(
    state: web::Data<AppState>,
    province: web::Path<String>,
) -> HttpResponse {
    let query = ReportQuery {
        province: Some(province.into_inner()),
        ..ReportQuery::default()
    };

    match state.service.list(&query).await {
        Ok(reports) => HttpResponse::Ok().json(to_api_reports(reports)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/{id}`
pub async fn get_report(state: web::Data<AppState>, id: web::Path<Uuid>) -> HttpResponse {
    match state.service.find_by_id(id.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => error_response(&e),
    }
}

/// `PATCH /api/reports/{id}`
pub async fn update_report(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    request: web::Json<UpdateReportRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let input = to_update_input(&state, request.into_inner());

    match state.service.update(id.into_inner(), &user_id, input).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/reports/{id}`
pub async fn delete_report(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.service.delete(id.into_inner(), &user_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/{id}/vote-status`
pub async fn vote_status(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.service.vote_status(id.into_inner(), &user_id).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/reports/{id}/confirm`
pub async fn confirm(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.service.confirm(id.into_inner(), &user_id).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/reports/{id}/dispute`
pub async fn dispute(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.service.dispute(id.into_inner(), &user_id).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/reports/{id}/verify`
///
/// Explicit admin verification. Role enforcement belongs to the
/// identity provider in front of this API; the caller's identity is
/// recorded as the verifier.
pub async fn verify(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: HttpRequest,
) -> HttpResponse {
    let admin_id = match caller_identity(&req) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.service.verify(id.into_inner(), &admin_id).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => error_response(&e),
    }
}

/// Extracts the authenticated caller's identity from the `X-User-Id`
/// header.
fn caller_identity(req: &HttpRequest) -> Result<String, HttpResponse> {
    req.headers()
        .get("X-User-Id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Missing X-User-Id header"
            }))
        })
}

fn to_api_reports(reports: Vec<crime_watch_database_models::Report>) -> Vec<ApiReport> {
    reports.into_iter().map(ApiReport::from).collect()
}

fn to_create_input(state: &AppState, request: CreateReportRequest) -> CreateReport {
    CreateReport {
        title: request.title,
        description: request.description,
        category: request.crime_type,
        lat: request.lat,
        lng: request.lng,
        address: request.address,
        province: request.province,
        district: request.district,
        ward: request.ward,
        street: request.street,
        severity: request.severity,
        status: status_from_code(request.status),
        reported_at: request.reported_at,
        attachments: classify_attachments(state, request.attachments),
    }
}

fn to_update_input(state: &AppState, request: UpdateReportRequest) -> UpdateReport {
    UpdateReport {
        title: request.title,
        description: request.description,
        category: request.crime_type,
        lat: request.lat,
        lng: request.lng,
        address: request.address,
        province: request.province,
        district: request.district,
        ward: request.ward,
        street: request.street,
        severity: request.severity,
        status: status_from_code(request.status),
        reported_at: request.reported_at,
        attachments: request
            .attachments
            .map(|urls| classify_attachments_list(state, urls)),
    }
}

fn classify_attachments(state: &AppState, urls: Option<Vec<String>>) -> Vec<AttachmentSource> {
    urls.map(|list| classify_attachments_list(state, list))
        .unwrap_or_default()
}

fn classify_attachments_list(state: &AppState, urls: Vec<String>) -> Vec<AttachmentSource> {
    urls.into_iter()
        .map(|value| AttachmentSource::from_string(state.blob.as_ref(), value))
        .collect()
}

fn error_response(err: &ReportError) -> HttpResponse {
    match err {
        ReportError::NotFound => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": err.to_string() }))
        }
        ReportError::ValidationFailed { .. }
        | ReportError::SelfVoteRejected
        | ReportError::DuplicateVote
        | ReportError::VoteQuotaExceeded => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": err.to_string() }))
        }
        ReportError::PermissionDenied { .. } => {
            HttpResponse::Forbidden().json(serde_json::json!({ "error": err.to_string() }))
        }
        ReportError::Database(_) | ReportError::Storage(_) => {
            log::error!("Report operation failed: {err}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}
