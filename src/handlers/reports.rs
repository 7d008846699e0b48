use axum::extract::{Query, State};
use serde::Deserialize;

use crate::handlers::non_empty;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::report::RosterCourse;
use crate::store::ports::ReportFilter;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub course_no: Option<String>,
    pub course_name: Option<String>,
    pub teacher_name: Option<String>,
    pub dept_no: Option<String>,
}

impl ReportParams {
    fn into_filter(self) -> ReportFilter {
        ReportFilter {
            course_no: non_empty(self.course_no),
            course_name: non_empty(self.course_name),
            teacher_name: non_empty(self.teacher_name),
            dept_no: non_empty(self.dept_no),
        }
    }
}

/// GET /api/v1/reports/grade-roster
pub async fn grade_roster(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Vec<RosterCourse>> {
    let courses = state.reports.grade_roster(params.into_filter()).await?;
    Ok(ApiResponse::success(courses))
}

/// GET /api/v1/reports/grade-report
pub async fn grade_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Vec<RosterCourse>> {
    let courses = state.reports.grade_report(params.into_filter()).await?;
    Ok(ApiResponse::success(courses))
}
