#![allow(dead_code)]

// In-memory fakes over the store ports so the engines can be exercised
// without a running Postgres. Transactional units buffer their writes and
// apply them on commit; a dropped unit applies nothing.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use registrar_api::domain::{Course, CourseRef, Enrollment, Principal, Role, StudentRef, Term, User};
use registrar_api::store::ports::{
    CourseStore, EnrollmentFilter, EnrollmentRow, EnrollmentStore, EnrollmentUnit, GradeFilter,
    GradeQueryRow, GradeStore, GradeUnit, GradeUpsert, MyGradeRow, Page, ReportFilter, ReportStore,
    RosterRow, StudentStore, TermStore, UserStore,
};
use registrar_api::store::StoreError;

use registrar_api::services::{EnrollmentService, GradeService, ReportService};

pub fn enrollment_service(db: &FakeDb) -> EnrollmentService {
    let db = Arc::new(db.clone());
    EnrollmentService::new(db.clone(), db.clone(), db.clone(), db.clone(), db)
}

pub fn grade_service(db: &FakeDb) -> GradeService {
    let db = Arc::new(db.clone());
    GradeService::new(db.clone(), db.clone(), db.clone(), db)
}

pub fn report_service(db: &FakeDb) -> ReportService {
    ReportService::new(Arc::new(db.clone()))
}

#[derive(Debug, Clone)]
pub struct FakeStudent {
    pub id: i64,
    pub student_no: String,
    pub name: String,
    pub gender: String,
    pub dept_no: String,
}

#[derive(Debug, Clone)]
pub struct FakeStaff {
    pub id: i64,
    pub staff_no: String,
    pub name: String,
    pub dept_no: String,
}

#[derive(Debug, Clone)]
pub struct FakeGrade {
    pub student_id: i64,
    pub course_id: i64,
    pub usual_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_score: Option<f64>,
}

#[derive(Default)]
pub struct DbState {
    pub terms: Vec<Term>,
    pub staff: Vec<FakeStaff>,
    pub students: Vec<FakeStudent>,
    pub courses: Vec<Course>,
    pub users: Vec<User>,
    pub enrollments: Vec<Enrollment>,
    pub grades: Vec<FakeGrade>,
    next_id: i64,
}

impl DbState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct FakeDb {
    state: Arc<Mutex<DbState>>,
}

impl FakeDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&self, term_code: &str) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.terms.push(Term {
            id,
            term_code: term_code.to_string(),
            name: format!("term {}", term_code),
            start_date: None,
            end_date: None,
        });
        id
    }

    pub fn add_staff(&self, staff_no: &str, name: &str, dept_no: &str) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.staff.push(FakeStaff {
            id,
            staff_no: staff_no.to_string(),
            name: name.to_string(),
            dept_no: dept_no.to_string(),
        });
        id
    }

    pub fn add_student(&self, student_no: &str) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.students.push(FakeStudent {
            id,
            student_no: student_no.to_string(),
            name: format!("student {}", student_no),
            gender: "F".to_string(),
            dept_no: "D01".to_string(),
        });
        id
    }

    pub fn add_course(&self, course_no: &str, credits: i32, teacher_id: i64) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.courses.push(Course {
            id,
            course_no: course_no.to_string(),
            name: format!("course {}", course_no),
            teacher_id,
            hours: credits * 16,
            credits,
            class_time: String::new(),
            class_location: String::new(),
            exam_time: String::new(),
        });
        id
    }

    pub fn add_user(
        &self,
        username: &str,
        role: Role,
        student_id: Option<i64>,
        staff_id: Option<i64>,
    ) -> Principal {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.users.push(User {
            id,
            username: username.to_string(),
            password_hash: String::new(),
            role: role.to_string(),
            student_id,
            staff_id,
        });
        Principal { user_id: id, role }
    }

    pub fn add_enrollment(&self, student_id: i64, course_id: i64, term_id: i64) -> i64 {
        let mut s = self.state.lock().unwrap();
        let id = s.next_id();
        s.enrollments.push(Enrollment {
            id,
            student_id,
            course_id,
            term_id,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_grade(
        &self,
        student_id: i64,
        course_id: i64,
        usual: Option<f64>,
        exam: Option<f64>,
        fin: Option<f64>,
    ) {
        let mut s = self.state.lock().unwrap();
        s.grades.push(FakeGrade {
            student_id,
            course_id,
            usual_score: usual,
            exam_score: exam,
            final_score: fin,
        });
    }

    pub fn enrollment_count(&self) -> usize {
        self.state.lock().unwrap().enrollments.len()
    }

    pub fn enrollments_for(&self, student_id: i64) -> Vec<Enrollment> {
        self.state
            .lock()
            .unwrap()
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect()
    }

    pub fn grade(&self, student_id: i64, course_id: i64) -> Option<FakeGrade> {
        self.state
            .lock()
            .unwrap()
            .grades
            .iter()
            .find(|g| g.student_id == student_id && g.course_id == course_id)
            .cloned()
    }

    pub fn grade_count(&self) -> usize {
        self.state.lock().unwrap().grades.len()
    }

    fn enrollment_row(state: &DbState, e: &Enrollment) -> Option<EnrollmentRow> {
        let student = state.students.iter().find(|s| s.id == e.student_id)?;
        let course = state.courses.iter().find(|c| c.id == e.course_id)?;
        let term = state.terms.iter().find(|t| t.id == e.term_id)?;
        Some(EnrollmentRow {
            id: e.id,
            student_id: e.student_id,
            student_no: student.student_no.clone(),
            student_name: student.name.clone(),
            course_id: e.course_id,
            course_no: course.course_no.clone(),
            course_name: course.name.clone(),
            credits: course.credits,
            term_id: e.term_id,
            term_code: term.term_code.clone(),
            term_name: term.name.clone(),
            created_at: e.created_at,
        })
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl TermStore for FakeDb {
    async fn find_by_code(&self, term_code: &str) -> Result<Option<Term>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.terms.iter().find(|t| t.term_code == term_code).cloned())
    }
}

#[async_trait]
impl CourseStore for FakeDb {
    async fn find_by_no(&self, course_no: &str) -> Result<Option<Course>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.courses.iter().find(|c| c.course_no == course_no).cloned())
    }

    async fn find_by_nos(&self, course_nos: &[String]) -> Result<Vec<CourseRef>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.courses
            .iter()
            .filter(|c| course_nos.contains(&c.course_no))
            .map(|c| CourseRef {
                id: c.id,
                credits: c.credits,
            })
            .collect())
    }
}

#[async_trait]
impl StudentStore for FakeDb {
    async fn find_by_no(&self, student_no: &str) -> Result<Option<StudentRef>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.students
            .iter()
            .find(|st| st.student_no == student_no)
            .map(|st| StudentRef { id: st.id }))
    }

    async fn find_by_nos(&self, student_nos: &[String]) -> Result<Vec<StudentRef>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.students
            .iter()
            .filter(|st| student_nos.contains(&st.student_no))
            .map(|st| StudentRef { id: st.id })
            .collect())
    }
}

#[async_trait]
impl UserStore for FakeDb {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl EnrollmentStore for FakeDb {
    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>, StoreError> {
        let s = self.state.lock().unwrap();
        Ok(s.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn list(
        &self,
        filter: &EnrollmentFilter,
        page: Page,
    ) -> Result<(Vec<EnrollmentRow>, i64), StoreError> {
        let s = self.state.lock().unwrap();
        let mut rows: Vec<EnrollmentRow> = s
            .enrollments
            .iter()
            .filter_map(|e| FakeDb::enrollment_row(&s, e))
            .filter(|r| {
                filter
                    .student_no
                    .as_ref()
                    .map_or(true, |no| &r.student_no == no)
                    && filter
                        .course_no
                        .as_ref()
                        .map_or(true, |no| &r.course_no == no)
                    && filter
                        .term_code
                        .as_ref()
                        .map_or(true, |code| &r.term_code == code)
            })
            .collect();

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len() as i64;

        let start = ((page.page - 1) * page.size).max(0) as usize;
        let rows = rows
            .into_iter()
            .skip(start)
            .take(page.size.max(0) as usize)
            .collect();

        Ok((rows, total))
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<EnrollmentRow>, StoreError> {
        let s = self.state.lock().unwrap();
        let mut rows: Vec<EnrollmentRow> = s
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .filter_map(|e| FakeDb::enrollment_row(&s, e))
            .collect();

        rows.sort_by(|a, b| {
            b.term_code
                .cmp(&a.term_code)
                .then_with(|| a.course_no.cmp(&b.course_no))
        });
        Ok(rows)
    }

    async fn begin(&self) -> Result<Box<dyn EnrollmentUnit>, StoreError> {
        Ok(Box::new(FakeEnrollmentUnit {
            db: self.clone(),
            inserts: Vec::new(),
            grade_deletes: Vec::new(),
            enrollment_deletes: Vec::new(),
        }))
    }
}

/// Buffers writes until commit, so a unit dropped on error leaves the
/// database untouched.
pub struct FakeEnrollmentUnit {
    db: FakeDb,
    inserts: Vec<(i64, i64, i64)>,
    grade_deletes: Vec<(i64, i64)>,
    enrollment_deletes: Vec<i64>,
}

#[async_trait]
impl EnrollmentUnit for FakeEnrollmentUnit {
    async fn lock_student_term(
        &mut self,
        _student_id: i64,
        _term_id: i64,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn enrolled_credits(
        &mut self,
        student_id: i64,
        term_id: i64,
    ) -> Result<i32, StoreError> {
        let s = self.db.state.lock().unwrap();
        Ok(s.enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.term_id == term_id)
            .filter_map(|e| s.courses.iter().find(|c| c.id == e.course_id))
            .map(|c| c.credits)
            .sum())
    }

    async fn count_enrolled(
        &mut self,
        student_id: i64,
        course_ids: &[i64],
    ) -> Result<i64, StoreError> {
        let s = self.db.state.lock().unwrap();
        Ok(s.enrollments
            .iter()
            .filter(|e| e.student_id == student_id && course_ids.contains(&e.course_id))
            .count() as i64)
    }

    async fn insert_enrollments(
        &mut self,
        student_id: i64,
        term_id: i64,
        course_ids: &[i64],
    ) -> Result<(), StoreError> {
        for &course_id in course_ids {
            self.inserts.push((student_id, course_id, term_id));
        }
        Ok(())
    }

    async fn delete_grades(&mut self, student_id: i64, course_id: i64) -> Result<u64, StoreError> {
        let s = self.db.state.lock().unwrap();
        let n = s
            .grades
            .iter()
            .filter(|g| g.student_id == student_id && g.course_id == course_id)
            .count() as u64;
        drop(s);
        self.grade_deletes.push((student_id, course_id));
        Ok(n)
    }

    async fn delete_enrollment(&mut self, id: i64) -> Result<(), StoreError> {
        self.enrollment_deletes.push(id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut s = self.db.state.lock().unwrap();
        for (student_id, course_id, term_id) in self.inserts {
            let id = s.next_id();
            s.enrollments.push(Enrollment {
                id,
                student_id,
                course_id,
                term_id,
                created_at: Utc::now(),
            });
        }
        for (student_id, course_id) in self.grade_deletes {
            s.grades
                .retain(|g| !(g.student_id == student_id && g.course_id == course_id));
        }
        for id in self.enrollment_deletes {
            s.enrollments.retain(|e| e.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl GradeStore for FakeDb {
    async fn query(&self, filter: &GradeFilter) -> Result<Vec<GradeQueryRow>, StoreError> {
        let s = self.state.lock().unwrap();
        let mut rows = Vec::new();
        for g in &s.grades {
            let student = match s.students.iter().find(|st| st.id == g.student_id) {
                Some(st) => st,
                None => continue,
            };
            let course = match s.courses.iter().find(|c| c.id == g.course_id) {
                Some(c) => c,
                None => continue,
            };
            let teacher = match s.staff.iter().find(|t| t.id == course.teacher_id) {
                Some(t) => t,
                None => continue,
            };

            let keep = filter
                .student_no
                .as_ref()
                .map_or(true, |no| &student.student_no == no)
                && filter
                    .student_name
                    .as_ref()
                    .map_or(true, |n| contains_ci(&student.name, n))
                && filter
                    .course_no
                    .as_ref()
                    .map_or(true, |no| &course.course_no == no)
                && filter
                    .course_name
                    .as_ref()
                    .map_or(true, |n| contains_ci(&course.name, n))
                && filter
                    .teacher_name
                    .as_ref()
                    .map_or(true, |n| contains_ci(&teacher.name, n))
                && filter
                    .dept_no
                    .as_ref()
                    .map_or(true, |no| &student.dept_no == no);
            if !keep {
                continue;
            }

            rows.push(GradeQueryRow {
                student_no: student.student_no.clone(),
                student_name: student.name.clone(),
                gender: student.gender.clone(),
                course_no: course.course_no.clone(),
                course_name: course.name.clone(),
                teacher_no: teacher.staff_no.clone(),
                teacher_name: teacher.name.clone(),
                dept_no: student.dept_no.clone(),
                hours: course.hours,
                credits: course.credits,
                class_time: course.class_time.clone(),
                class_location: course.class_location.clone(),
                exam_time: course.exam_time.clone(),
                usual_score: g.usual_score,
                exam_score: g.exam_score,
                final_score: g.final_score,
            });
        }
        Ok(rows)
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<MyGradeRow>, StoreError> {
        let s = self.state.lock().unwrap();
        let mut rows = Vec::new();
        for g in s.grades.iter().filter(|g| g.student_id == student_id) {
            let course = match s.courses.iter().find(|c| c.id == g.course_id) {
                Some(c) => c,
                None => continue,
            };
            let term_code = s
                .enrollments
                .iter()
                .find(|e| e.student_id == g.student_id && e.course_id == g.course_id)
                .and_then(|e| s.terms.iter().find(|t| t.id == e.term_id))
                .map(|t| t.term_code.clone())
                .unwrap_or_default();

            rows.push(MyGradeRow {
                course_no: course.course_no.clone(),
                course_name: course.name.clone(),
                credits: course.credits,
                term_code,
                usual_score: g.usual_score,
                exam_score: g.exam_score,
                final_score: g.final_score,
            });
        }

        rows.sort_by(|a, b| {
            b.term_code
                .cmp(&a.term_code)
                .then_with(|| a.course_no.cmp(&b.course_no))
        });
        Ok(rows)
    }

    async fn begin(&self) -> Result<Box<dyn GradeUnit>, StoreError> {
        Ok(Box::new(FakeGradeUnit {
            db: self.clone(),
            upserts: Vec::new(),
        }))
    }
}

pub struct FakeGradeUnit {
    db: FakeDb,
    upserts: Vec<GradeUpsert>,
}

#[async_trait]
impl GradeUnit for FakeGradeUnit {
    async fn upsert(&mut self, grade: &GradeUpsert) -> Result<(), StoreError> {
        self.upserts.push(grade.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut s = self.db.state.lock().unwrap();
        for up in self.upserts {
            match s
                .grades
                .iter_mut()
                .find(|g| g.student_id == up.student_id && g.course_id == up.course_id)
            {
                Some(existing) => {
                    existing.usual_score = up.usual_score;
                    existing.exam_score = up.exam_score;
                    existing.final_score = up.final_score;
                }
                None => s.grades.push(FakeGrade {
                    student_id: up.student_id,
                    course_id: up.course_id,
                    usual_score: up.usual_score,
                    exam_score: up.exam_score,
                    final_score: up.final_score,
                }),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for FakeDb {
    async fn roster_rows(
        &self,
        filter: &ReportFilter,
        with_grades: bool,
    ) -> Result<Vec<RosterRow>, StoreError> {
        let s = self.state.lock().unwrap();
        let mut rows = Vec::new();
        for e in &s.enrollments {
            let student = match s.students.iter().find(|st| st.id == e.student_id) {
                Some(st) => st,
                None => continue,
            };
            let course = match s.courses.iter().find(|c| c.id == e.course_id) {
                Some(c) => c,
                None => continue,
            };
            let teacher = match s.staff.iter().find(|t| t.id == course.teacher_id) {
                Some(t) => t,
                None => continue,
            };

            let keep = filter
                .course_no
                .as_ref()
                .map_or(true, |no| &course.course_no == no)
                && filter
                    .course_name
                    .as_ref()
                    .map_or(true, |n| contains_ci(&course.name, n))
                && filter
                    .teacher_name
                    .as_ref()
                    .map_or(true, |n| contains_ci(&teacher.name, n))
                && filter
                    .dept_no
                    .as_ref()
                    .map_or(true, |no| &teacher.dept_no == no);
            if !keep {
                continue;
            }

            let grade = if with_grades {
                s.grades
                    .iter()
                    .find(|g| g.student_id == e.student_id && g.course_id == e.course_id)
            } else {
                None
            };

            rows.push(RosterRow {
                course_no: course.course_no.clone(),
                course_name: course.name.clone(),
                teacher_no: teacher.staff_no.clone(),
                teacher_name: teacher.name.clone(),
                hours: course.hours,
                credits: course.credits,
                class_time: course.class_time.clone(),
                class_location: course.class_location.clone(),
                exam_time: course.exam_time.clone(),
                student_no: student.student_no.clone(),
                student_name: student.name.clone(),
                gender: student.gender.clone(),
                usual_score: grade.and_then(|g| g.usual_score),
                exam_score: grade.and_then(|g| g.exam_score),
                final_score: grade.and_then(|g| g.final_score),
            });
        }
        Ok(rows)
    }
}
