// Capability interfaces over the relational store, one per entity. The
// engines depend on these traits only, so tests can swap in in-memory
// fakes while production wires up the Postgres implementations.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::domain::{Course, CourseRef, Enrollment, StudentRef, Term, User};
use crate::store::StoreError;

#[async_trait]
pub trait TermStore: Send + Sync {
    async fn find_by_code(&self, term_code: &str) -> Result<Option<Term>, StoreError>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn find_by_no(&self, course_no: &str) -> Result<Option<Course>, StoreError>;

    /// Batch resolution of course numbers to {id, credits}. Returns only the
    /// rows that exist; callers compare cardinality against the request.
    async fn find_by_nos(&self, course_nos: &[String]) -> Result<Vec<CourseRef>, StoreError>;
}

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn find_by_no(&self, student_no: &str) -> Result<Option<StudentRef>, StoreError>;
    async fn find_by_nos(&self, student_nos: &[String]) -> Result<Vec<StudentRef>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub student_no: Option<String>,
    pub course_no: Option<String>,
    pub term_code: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub size: i64,
}

/// Enrollment joined with its student, course and term natural keys.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EnrollmentRow {
    pub id: i64,
    pub student_id: i64,
    pub student_no: String,
    pub student_name: String,
    pub course_id: i64,
    pub course_no: String,
    pub course_name: String,
    pub credits: i32,
    pub term_id: i64,
    pub term_code: String,
    pub term_name: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>, StoreError>;

    async fn list(
        &self,
        filter: &EnrollmentFilter,
        page: Page,
    ) -> Result<(Vec<EnrollmentRow>, i64), StoreError>;

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<EnrollmentRow>, StoreError>;

    /// Open a transactional unit of work. Dropping the unit without calling
    /// `commit` rolls back everything performed through it.
    async fn begin(&self) -> Result<Box<dyn EnrollmentUnit>, StoreError>;
}

/// One ACID transaction scoped to a single student's enrollment work or to
/// one cascading delete. Reads observe the snapshot the writes commit
/// against.
#[async_trait]
pub trait EnrollmentUnit: Send {
    /// Serialize concurrent enrollment attempts for the same (student, term)
    /// pair so two racing calls cannot both pass the credit-cap check.
    async fn lock_student_term(&mut self, student_id: i64, term_id: i64)
        -> Result<(), StoreError>;

    async fn enrolled_credits(&mut self, student_id: i64, term_id: i64)
        -> Result<i32, StoreError>;

    async fn count_enrolled(
        &mut self,
        student_id: i64,
        course_ids: &[i64],
    ) -> Result<i64, StoreError>;

    async fn insert_enrollments(
        &mut self,
        student_id: i64,
        term_id: i64,
        course_ids: &[i64],
    ) -> Result<(), StoreError>;

    async fn delete_grades(&mut self, student_id: i64, course_id: i64)
        -> Result<u64, StoreError>;

    async fn delete_enrollment(&mut self, id: i64) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct GradeFilter {
    pub student_no: Option<String>,
    pub student_name: Option<String>,
    pub course_no: Option<String>,
    pub course_name: Option<String>,
    pub teacher_name: Option<String>,
    pub dept_no: Option<String>,
}

/// Flat grade query row, one per student x course x grade.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GradeQueryRow {
    pub student_no: String,
    pub student_name: String,
    pub gender: String,
    pub course_no: String,
    pub course_name: String,
    pub teacher_no: String,
    pub teacher_name: String,
    pub dept_no: String,
    pub hours: i32,
    pub credits: i32,
    pub class_time: String,
    pub class_location: String,
    pub exam_time: String,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

/// A student's own grade joined with course and term info.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MyGradeRow {
    pub course_no: String,
    pub course_name: String,
    pub credits: i32,
    pub term_code: String,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct GradeUpsert {
    pub student_id: i64,
    pub course_id: i64,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

#[async_trait]
pub trait GradeStore: Send + Sync {
    async fn query(&self, filter: &GradeFilter) -> Result<Vec<GradeQueryRow>, StoreError>;

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<MyGradeRow>, StoreError>;

    /// Open a transactional unit spanning one upsert batch.
    async fn begin(&self) -> Result<Box<dyn GradeUnit>, StoreError>;
}

#[async_trait]
pub trait GradeUnit: Send {
    /// Update-if-exists-else-insert keyed by (student_id, course_id),
    /// atomic against concurrent upserts for the same pair.
    async fn upsert(&mut self, grade: &GradeUpsert) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub course_no: Option<String>,
    pub course_name: Option<String>,
    pub teacher_name: Option<String>,
    /// Filters by the teaching staff's department, not the student's.
    pub dept_no: Option<String>,
}

/// Enrollment-joined roster row; every enrolled student appears even when
/// no grade exists yet.
#[derive(Debug, Clone, FromRow)]
pub struct RosterRow {
    pub course_no: String,
    pub course_name: String,
    pub teacher_no: String,
    pub teacher_name: String,
    pub hours: i32,
    pub credits: i32,
    pub class_time: String,
    pub class_location: String,
    pub exam_time: String,
    pub student_no: String,
    pub student_name: String,
    pub gender: String,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn roster_rows(
        &self,
        filter: &ReportFilter,
        with_grades: bool,
    ) -> Result<Vec<RosterRow>, StoreError>;
}
