use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::Principal;
use crate::handlers::non_empty;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::enrollment::{EnrollOutcome, EnrollRequest, EnrollmentListResult};
use crate::store::ports::{EnrollmentFilter, EnrollmentRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub student_no: Option<String>,
    pub course_no: Option<String>,
    pub term_code: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/v1/enrollments
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<EnrollmentListResult> {
    let filter = EnrollmentFilter {
        student_no: non_empty(params.student_no),
        course_no: non_empty(params.course_no),
        term_code: non_empty(params.term_code),
    };

    let result = state
        .enrollments
        .list(
            filter,
            params.page.unwrap_or(0),
            params.page_size.unwrap_or(0),
        )
        .await?;
    Ok(ApiResponse::success(result))
}

#[derive(Debug, Default, Deserialize)]
pub struct MyParams {
    pub student_no: Option<String>,
}

/// GET /api/v1/enrollments/my
pub async fn my(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<MyParams>,
) -> ApiResult<Vec<EnrollmentRow>> {
    let rows = state
        .enrollments
        .list_for_student(&principal, non_empty(params.student_no).as_deref())
        .await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/v1/enrollments
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<EnrollRequest>,
) -> ApiResult<Vec<EnrollOutcome>> {
    let results = state.enrollments.enroll(req, &principal).await?;
    Ok(ApiResponse::created(results))
}

/// DELETE /api/v1/enrollments/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    state.enrollments.delete(id, &principal).await?;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
