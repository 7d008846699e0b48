use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::Principal;
use crate::handlers::non_empty;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::grade::{CourseGradeGroup, CourseGradeItem, StudentGradeItem};
use crate::store::ports::{GradeFilter, MyGradeRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub student_no: Option<String>,
    pub student_name: Option<String>,
    pub course_no: Option<String>,
    pub course_name: Option<String>,
    pub teacher_name: Option<String>,
    pub dept_no: Option<String>,
}

/// GET /api/v1/grades
pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<CourseGradeGroup>> {
    let filter = GradeFilter {
        student_no: non_empty(params.student_no),
        student_name: non_empty(params.student_name),
        course_no: non_empty(params.course_no),
        course_name: non_empty(params.course_name),
        teacher_name: non_empty(params.teacher_name),
        dept_no: non_empty(params.dept_no),
    };

    let groups = state.grades.query(filter).await?;
    Ok(ApiResponse::success(groups))
}

/// GET /api/v1/grades/my
pub async fn my(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<MyGradeRow>> {
    let rows = state.grades.my_grades(&principal).await?;
    Ok(ApiResponse::success(rows))
}

#[derive(Debug, Deserialize)]
pub struct ByCourseBody {
    #[serde(default)]
    pub course_no: String,
    #[serde(default)]
    pub items: Vec<CourseGradeItem>,
}

/// PUT /api/v1/grades/by-course
pub async fn upsert_by_course(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<ByCourseBody>,
) -> ApiResult<Value> {
    state
        .grades
        .upsert_by_course(&body.course_no, body.items, &principal)
        .await?;
    Ok(ApiResponse::success(json!({ "updated": true })))
}

#[derive(Debug, Deserialize)]
pub struct ByStudentBody {
    #[serde(default)]
    pub student_no: String,
    #[serde(default)]
    pub items: Vec<StudentGradeItem>,
}

/// PUT /api/v1/grades/by-student
pub async fn upsert_by_student(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<ByStudentBody>,
) -> ApiResult<Value> {
    state
        .grades
        .upsert_by_student(&body.student_no, body.items, &principal)
        .await?;
    Ok(ApiResponse::success(json!({ "updated": true })))
}
