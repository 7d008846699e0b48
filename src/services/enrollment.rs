use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::{Principal, Role, MAX_CREDITS_PER_TERM};
use crate::services::error::ServiceError;
use crate::store::ports::{
    CourseStore, EnrollmentFilter, EnrollmentRow, EnrollmentStore, Page, StudentStore, TermStore,
    UserStore,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollRequest {
    #[serde(default)]
    pub term_code: String,
    pub student_no: Option<String>,
    #[serde(default)]
    pub student_nos: Vec<String>,
    #[serde(default)]
    pub course_nos: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollOutcome {
    pub student_id: i64,
    pub term_id: i64,
    pub course_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentListResult {
    pub items: Vec<EnrollmentRow>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

/// Enrollment engine: validates requests against the credit cap and the
/// duplicate rule, commits one transaction per student, and handles the
/// cascading delete of enrollment plus grade.
pub struct EnrollmentService {
    terms: Arc<dyn TermStore>,
    courses: Arc<dyn CourseStore>,
    students: Arc<dyn StudentStore>,
    users: Arc<dyn UserStore>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl EnrollmentService {
    pub fn new(
        terms: Arc<dyn TermStore>,
        courses: Arc<dyn CourseStore>,
        students: Arc<dyn StudentStore>,
        users: Arc<dyn UserStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            terms,
            courses,
            students,
            users,
            enrollments,
        }
    }

    pub async fn list(
        &self,
        filter: EnrollmentFilter,
        page: i64,
        page_size: i64,
    ) -> Result<EnrollmentListResult, ServiceError> {
        let page = if page <= 0 { 1 } else { page };
        let size = if page_size <= 0 { 20 } else { page_size };

        let (items, total) = self
            .enrollments
            .list(&filter, Page { page, size })
            .await?;

        Ok(EnrollmentListResult {
            items,
            total,
            page,
            size,
        })
    }

    /// Role-scoped listing: students see their own enrollments via the bound
    /// student id, admins and teachers pass an explicit student_no.
    pub async fn list_for_student(
        &self,
        principal: &Principal,
        student_no: Option<&str>,
    ) -> Result<Vec<EnrollmentRow>, ServiceError> {
        let student_id = match principal.role {
            Role::Student => self.bound_student_id(principal.user_id).await?,
            Role::Admin | Role::Teacher => {
                let student_no = match student_no {
                    Some(no) if !no.is_empty() => no,
                    _ => return Err(ServiceError::MissingRequired("student_no")),
                };
                self.students
                    .find_by_no(student_no)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::StudentNotFound(format!("student not found: {}", student_no))
                    })?
                    .id
            }
        };

        Ok(self.enrollments.list_by_student(student_id).await?)
    }

    pub async fn enroll(
        &self,
        req: EnrollRequest,
        principal: &Principal,
    ) -> Result<Vec<EnrollOutcome>, ServiceError> {
        if req.term_code.is_empty() || req.course_nos.is_empty() {
            return Err(ServiceError::MissingRequired("term_code/course_nos"));
        }

        let term = self
            .terms
            .find_by_code(&req.term_code)
            .await?
            .ok_or(ServiceError::TermNotFound)?;

        let course_refs = self.courses.find_by_nos(&req.course_nos).await?;
        if course_refs.len() != req.course_nos.len() {
            return Err(ServiceError::CourseNotFound(
                "some courses not found".to_string(),
            ));
        }

        let course_ids: Vec<i64> = course_refs.iter().map(|c| c.id).collect();
        let course_credits: HashMap<i64, i32> =
            course_refs.iter().map(|c| (c.id, c.credits)).collect();

        let student_ids = self.resolve_target_students(&req, principal).await?;

        // One transaction per student: a failure aborts that student's unit
        // and stops the loop, but students already committed stay committed.
        let mut results = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            let mut unit = self.enrollments.begin().await?;
            unit.lock_student_term(student_id, term.id).await?;

            let current_credits = unit.enrolled_credits(student_id, term.id).await?;

            let duplicates = unit.count_enrolled(student_id, &course_ids).await?;
            if duplicates > 0 {
                return Err(ServiceError::DuplicateEnrollment);
            }

            let add_credits: i32 = course_ids
                .iter()
                .map(|id| course_credits.get(id).copied().unwrap_or(0))
                .sum();
            if current_credits + add_credits > MAX_CREDITS_PER_TERM {
                return Err(ServiceError::CreditLimitExceeded);
            }

            unit.insert_enrollments(student_id, term.id, &course_ids)
                .await?;
            unit.commit().await?;

            info!(
                student_id,
                term_id = term.id,
                courses = course_ids.len(),
                "enrollment committed"
            );

            results.push(EnrollOutcome {
                student_id,
                term_id: term.id,
                course_ids: course_ids.clone(),
            });
        }

        Ok(results)
    }

    /// Deletes the enrollment and, in the same transaction, any grade row
    /// for the same (student, course) pair.
    pub async fn delete(&self, id: i64, principal: &Principal) -> Result<(), ServiceError> {
        let enrollment = self
            .enrollments
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment not found"))?;

        match principal.role {
            Role::Admin => {}
            Role::Student => {
                let bound = self.bound_student_id(principal.user_id).await?;
                if bound != enrollment.student_id {
                    return Err(ServiceError::Forbidden("forbidden"));
                }
            }
            _ => return Err(ServiceError::Forbidden("forbidden")),
        }

        let mut unit = self.enrollments.begin().await?;
        let purged = unit
            .delete_grades(enrollment.student_id, enrollment.course_id)
            .await?;
        unit.delete_enrollment(enrollment.id).await?;
        unit.commit().await?;

        info!(enrollment_id = id, grades_purged = purged, "enrollment deleted");
        Ok(())
    }

    async fn resolve_target_students(
        &self,
        req: &EnrollRequest,
        principal: &Principal,
    ) -> Result<Vec<i64>, ServiceError> {
        match principal.role {
            Role::Admin => {
                let student_nos: Vec<String> = if !req.student_nos.is_empty() {
                    req.student_nos.clone()
                } else {
                    match &req.student_no {
                        Some(no) if !no.is_empty() => vec![no.clone()],
                        _ => {
                            return Err(ServiceError::MissingRequired(
                                "student_no/student_nos",
                            ))
                        }
                    }
                };

                let students = self.students.find_by_nos(&student_nos).await?;
                if students.len() != student_nos.len() {
                    return Err(ServiceError::StudentNotFound(
                        "some students not found".to_string(),
                    ));
                }
                Ok(students.iter().map(|s| s.id).collect())
            }
            // A student enrolls themselves only; any submitted student_no or
            // student_nos fields are ignored.
            Role::Student => Ok(vec![self.bound_student_id(principal.user_id).await?]),
            _ => Err(ServiceError::Forbidden("forbidden")),
        }
    }

    async fn bound_student_id(&self, user_id: i64) -> Result<i64, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .and_then(|u| u.student_id)
            .ok_or(ServiceError::StudentNotBound)
    }
}
