use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::info;

use crate::domain::{Course, Principal, Role};
use crate::services::error::ServiceError;
use crate::store::ports::{
    CourseStore, GradeFilter, GradeQueryRow, GradeStore, GradeUpsert, MyGradeRow, StudentStore,
    UserStore,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CourseGradeItem {
    pub student_no: String,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentGradeItem {
    pub course_no: String,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeRow {
    pub student_no: String,
    pub student_name: String,
    pub gender: String,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

/// One course with its grade rows, ordered final_score descending with
/// nulls last, tie-broken by student_no.
#[derive(Debug, Clone, Serialize)]
pub struct CourseGradeGroup {
    pub course_no: String,
    pub course_name: String,
    pub teacher_no: String,
    pub teacher_name: String,
    pub hours: i32,
    pub credits: i32,
    pub class_time: String,
    pub class_location: String,
    pub exam_time: String,
    pub dept_no: String,
    pub rows: Vec<GradeRow>,
}

/// Grade upsert engine and grouped grade queries.
pub struct GradeService {
    grades: Arc<dyn GradeStore>,
    courses: Arc<dyn CourseStore>,
    students: Arc<dyn StudentStore>,
    users: Arc<dyn UserStore>,
}

impl GradeService {
    pub fn new(
        grades: Arc<dyn GradeStore>,
        courses: Arc<dyn CourseStore>,
        students: Arc<dyn StudentStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            grades,
            courses,
            students,
            users,
        }
    }

    pub async fn query(&self, filter: GradeFilter) -> Result<Vec<CourseGradeGroup>, ServiceError> {
        let mut rows = self.grades.query(&filter).await?;
        sort_grade_rows(&mut rows);
        Ok(group_by_course(rows))
    }

    /// Flat per-course grades for the calling student.
    pub async fn my_grades(&self, principal: &Principal) -> Result<Vec<MyGradeRow>, ServiceError> {
        let student_id = self
            .users
            .find_by_id(principal.user_id)
            .await?
            .and_then(|u| u.student_id)
            .ok_or(ServiceError::StudentNotBound)?;

        Ok(self.grades.list_by_student(student_id).await?)
    }

    pub async fn upsert_by_course(
        &self,
        course_no: &str,
        items: Vec<CourseGradeItem>,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        if course_no.is_empty() || items.is_empty() {
            return Err(ServiceError::MissingRequired("course_no/items"));
        }

        let course = self
            .courses
            .find_by_no(course_no)
            .await?
            .ok_or_else(|| {
                ServiceError::CourseNotFound(format!("course not found: {}", course_no))
            })?;

        if principal.role == Role::Teacher {
            self.check_teacher_owns(principal.user_id, &course).await?;
        }

        // A missing student aborts the whole batch; the unit is dropped
        // uncommitted and nothing is applied.
        let mut unit = self.grades.begin().await?;
        for item in &items {
            let student = self
                .students
                .find_by_no(&item.student_no)
                .await?
                .ok_or_else(|| {
                    ServiceError::StudentNotFound(format!(
                        "student not found: {}",
                        item.student_no
                    ))
                })?;

            unit.upsert(&GradeUpsert {
                student_id: student.id,
                course_id: course.id,
                usual_score: item.usual_score,
                exam_score: item.exam_score,
                final_score: item.final_score,
            })
            .await?;
        }
        unit.commit().await?;

        info!(course_no, items = items.len(), "grades upserted by course");
        Ok(())
    }

    pub async fn upsert_by_student(
        &self,
        student_no: &str,
        items: Vec<StudentGradeItem>,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        if student_no.is_empty() || items.is_empty() {
            return Err(ServiceError::MissingRequired("student_no/items"));
        }

        let student = self
            .students
            .find_by_no(student_no)
            .await?
            .ok_or_else(|| {
                ServiceError::StudentNotFound(format!("student not found: {}", student_no))
            })?;

        // Resolve every course and check teacher ownership up front so a
        // failure on any item leaves no partial rows behind.
        let mut resolved = Vec::with_capacity(items.len());
        for item in &items {
            let course = self
                .courses
                .find_by_no(&item.course_no)
                .await?
                .ok_or_else(|| {
                    ServiceError::CourseNotFound(format!("course not found: {}", item.course_no))
                })?;

            if principal.role == Role::Teacher {
                self.check_teacher_owns(principal.user_id, &course).await?;
            }
            resolved.push((course.id, item));
        }

        let mut unit = self.grades.begin().await?;
        for (course_id, item) in resolved {
            unit.upsert(&GradeUpsert {
                student_id: student.id,
                course_id,
                usual_score: item.usual_score,
                exam_score: item.exam_score,
                final_score: item.final_score,
            })
            .await?;
        }
        unit.commit().await?;

        info!(student_no, items = items.len(), "grades upserted by student");
        Ok(())
    }

    /// A teacher may write grades only for courses they own.
    async fn check_teacher_owns(
        &self,
        user_id: i64,
        course: &Course,
    ) -> Result<(), ServiceError> {
        let staff_id = self
            .users
            .find_by_id(user_id)
            .await?
            .and_then(|u| u.staff_id)
            .ok_or(ServiceError::Forbidden("teacher not bound"))?;

        if course.teacher_id != staff_id {
            return Err(ServiceError::Forbidden(
                "can only modify grades for own courses",
            ));
        }
        Ok(())
    }
}

/// Base ordering for grade query rows: course_no ascending, final_score
/// descending with nulls last, student_no ascending. Applied in memory so
/// the contract holds regardless of the backing store's ordering.
fn sort_grade_rows(rows: &mut [GradeQueryRow]) {
    rows.sort_by(|a, b| {
        a.course_no
            .cmp(&b.course_no)
            .then_with(|| cmp_scores_desc_nulls_last(a.final_score, b.final_score))
            .then_with(|| a.student_no.cmp(&b.student_no))
    });
}

fn cmp_scores_desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn group_by_course(rows: Vec<GradeQueryRow>) -> Vec<CourseGradeGroup> {
    let mut groups: Vec<CourseGradeGroup> = Vec::new();
    for row in rows {
        let matches_last = groups
            .last()
            .map(|g| g.course_no == row.course_no)
            .unwrap_or(false);

        if !matches_last {
            groups.push(CourseGradeGroup {
                course_no: row.course_no.clone(),
                course_name: row.course_name.clone(),
                teacher_no: row.teacher_no.clone(),
                teacher_name: row.teacher_name.clone(),
                hours: row.hours,
                credits: row.credits,
                class_time: row.class_time.clone(),
                class_location: row.class_location.clone(),
                exam_time: row.exam_time.clone(),
                dept_no: row.dept_no.clone(),
                rows: Vec::new(),
            });
        }

        let group = groups.last_mut().expect("group exists after push");
        group.rows.push(GradeRow {
            student_no: row.student_no,
            student_name: row.student_name,
            gender: row.gender,
            usual_score: row.usual_score,
            exam_score: row.exam_score,
            final_score: row.final_score,
        });
    }
    groups
}
