use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{AuthService, EnrollmentService, GradeService, ReportService};
use crate::store::ports::{
    CourseStore, EnrollmentStore, GradeStore, ReportStore, StudentStore, TermStore, UserStore,
};
use crate::store::postgres::{
    PgCourseStore, PgEnrollmentStore, PgGradeStore, PgReportStore, PgStudentStore, PgTermStore,
    PgUserStore,
};

/// Shared application state: each engine receives exactly the store ports
/// it needs, wired here against the Postgres implementations.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: Arc<AuthService>,
    pub enrollments: Arc<EnrollmentService>,
    pub grades: Arc<GradeService>,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let terms: Arc<dyn TermStore> = Arc::new(PgTermStore::new(pool.clone()));
        let courses: Arc<dyn CourseStore> = Arc::new(PgCourseStore::new(pool.clone()));
        let students: Arc<dyn StudentStore> = Arc::new(PgStudentStore::new(pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let enrollments: Arc<dyn EnrollmentStore> = Arc::new(PgEnrollmentStore::new(pool.clone()));
        let grades: Arc<dyn GradeStore> = Arc::new(PgGradeStore::new(pool.clone()));
        let reports: Arc<dyn ReportStore> = Arc::new(PgReportStore::new(pool.clone()));

        Self {
            pool,
            auth: Arc::new(AuthService::new(users.clone())),
            enrollments: Arc::new(EnrollmentService::new(
                terms,
                courses.clone(),
                students.clone(),
                users.clone(),
                enrollments,
            )),
            grades: Arc::new(GradeService::new(grades, courses, students, users)),
            reports: Arc::new(ReportService::new(reports)),
        }
    }
}
