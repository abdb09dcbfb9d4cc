use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use certfeed_types::{CourseId, FeedbackSubmission};
use tracing::info;

use super::error::{extract_json, AppError};
use super::responses::*;
use super::server::AppState;

fn parse_course(raw: &str) -> Result<CourseId, AppError> {
    CourseId::from_str(raw).map_err(|e| AppError::BadRequest(format!("invalid course id: {}", e)))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Proof checks are CPU-bound and the store is synchronous, so admission
/// runs on the blocking pool.
pub async fn submit_feedback(
    State(state): State<AppState>,
    body: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    // Well-formed JSON whose fields do not decode (bad hex, wrong lengths,
    // missing members) is a malformed submission, not a transport error.
    let submission = match body {
        Err(JsonRejection::JsonDataError(err)) => {
            return Err(state.controller.reject_undecodable(&err.body_text()).into())
        }
        other => extract_json(other)?,
    };
    let controller = state.controller.clone();
    let admitted = tokio::task::spawn_blocking(move || controller.submit(submission))
        .await
        .map_err(|e| AppError::Internal(format!("admission task failed: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            course: admitted.course,
            index: admitted.index,
            mode: admitted.mode,
        }),
    ))
}

pub async fn course_feedbacks(
    State(state): State<AppState>,
    Path(course): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<CourseFeedbacksResponse>, AppError> {
    let course = parse_course(&course)?;
    let feedbacks = state.controller.feedbacks(&course, page.offset, page.limit)?;
    Ok(Json(CourseFeedbacksResponse {
        course,
        total: state.controller.feedback_count(&course)?,
        offset: page.offset,
        feedbacks,
    }))
}

pub async fn list_courses(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<CoursesResponse>, AppError> {
    Ok(Json(CoursesResponse {
        total: state.controller.course_count()?,
        offset: page.offset,
        courses: state.controller.courses(page.offset, page.limit)?,
    }))
}

pub async fn all_feedbacks(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<AllFeedbacksResponse>, AppError> {
    let (courses, feedbacks) = state.controller.all_feedbacks(page.offset, page.limit)?;
    Ok(Json(AllFeedbacksResponse { courses, feedbacks }))
}

pub async fn course_root(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> Result<Json<RootResponse>, AppError> {
    let course = parse_course(&course)?;
    let latest = state.roots.latest(&course)?;
    Ok(Json(RootResponse::from_record(course, latest)))
}

pub async fn root_history(
    State(state): State<AppState>,
    Path(course): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<RootHistoryResponse>, AppError> {
    let course = parse_course(&course)?;
    let limit = page.limit.min(state.controller.limits().max_page_size);
    Ok(Json(RootHistoryResponse {
        course,
        total: state.roots.history_len(&course)?,
        roots: state.roots.history(&course, page.offset, limit)?,
    }))
}

pub async fn publish_root(
    State(state): State<AppState>,
    body: Result<Json<PublishRootRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<crate::registry::RootRecord>), AppError> {
    let request = extract_json(body)?;
    let record = state.roots.publish(&request.course, request.root)?;
    info!(course = %request.course, index = record.index, "Root published over API");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    Ok(Json(StatsResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        courses: state.controller.course_count()?,
        zk_enabled: state.zk_enabled,
        admission: state.controller.stats(),
        storage: state.storage.as_ref().map(|s| s.storage_metrics().snapshot()),
        disk_bytes: state.storage.as_ref().map(|s| s.size_on_disk()).transpose()?,
    }))
}
