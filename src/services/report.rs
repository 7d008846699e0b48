use serde::Serialize;
use std::sync::Arc;

use crate::services::error::ServiceError;
use crate::store::ports::{ReportFilter, ReportStore, RosterRow};

#[derive(Debug, Clone, Serialize)]
pub struct RosterStudent {
    pub student_no: String,
    pub name: String,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usual_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
}

/// Score-band distribution over non-null final scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreDistribution {
    pub ge90_count: usize,
    pub ge90_rate: f64,
    pub ge80_count: usize,
    pub ge80_rate: f64,
    pub ge70_count: usize,
    pub ge70_rate: f64,
    pub ge60_count: usize,
    pub ge60_rate: f64,
    pub lt60_count: usize,
    pub lt60_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterCourse {
    pub course_no: String,
    pub course_name: String,
    pub teacher_no: String,
    pub teacher_name: String,
    pub hours: i32,
    pub credits: i32,
    pub class_time: String,
    pub class_location: String,
    pub exam_time: String,
    pub students: Vec<RosterStudent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist: Option<ScoreDistribution>,
}

/// Builds the printable grade roster and grade report views from the
/// enrollment-joined dataset.
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportStore>) -> Self {
        Self { reports }
    }

    /// Roster only: every enrolled student, all score fields null.
    pub async fn grade_roster(
        &self,
        filter: ReportFilter,
    ) -> Result<Vec<RosterCourse>, ServiceError> {
        self.build_roster(filter, false).await
    }

    /// Roster annotated with grades and per-course score distribution.
    pub async fn grade_report(
        &self,
        filter: ReportFilter,
    ) -> Result<Vec<RosterCourse>, ServiceError> {
        self.build_roster(filter, true).await
    }

    async fn build_roster(
        &self,
        filter: ReportFilter,
        with_grades: bool,
    ) -> Result<Vec<RosterCourse>, ServiceError> {
        let mut rows = self.reports.roster_rows(&filter, with_grades).await?;

        // Course groups ascend by course_no; students within a course ascend
        // by student_no regardless of score.
        rows.sort_by(|a, b| {
            a.course_no
                .cmp(&b.course_no)
                .then_with(|| a.student_no.cmp(&b.student_no))
        });

        let mut courses: Vec<RosterCourse> = Vec::new();
        for row in rows {
            let matches_last = courses
                .last()
                .map(|c| c.course_no == row.course_no)
                .unwrap_or(false);

            if !matches_last {
                courses.push(RosterCourse {
                    course_no: row.course_no.clone(),
                    course_name: row.course_name.clone(),
                    teacher_no: row.teacher_no.clone(),
                    teacher_name: row.teacher_name.clone(),
                    hours: row.hours,
                    credits: row.credits,
                    class_time: row.class_time.clone(),
                    class_location: row.class_location.clone(),
                    exam_time: row.exam_time.clone(),
                    students: Vec::new(),
                    dist: None,
                });
            }

            let course = courses.last_mut().expect("course exists after push");
            course.students.push(RosterStudent {
                student_no: row.student_no,
                name: row.student_name,
                gender: row.gender,
                usual_score: row.usual_score,
                exam_score: row.exam_score,
                final_score: row.final_score,
            });
        }

        if with_grades {
            for course in &mut courses {
                course.dist = Some(score_distribution(&course.students));
            }
        }

        Ok(courses)
    }
}

/// Buckets final scores into [90,inf), [80,90), [70,80), [60,70), (-inf,60).
/// Students without a final score are excluded from the total; rates are
/// unrounded fractions of that total.
fn score_distribution(students: &[RosterStudent]) -> ScoreDistribution {
    let mut dist = ScoreDistribution::default();
    let mut total = 0usize;

    for student in students {
        let score = match student.final_score {
            Some(s) => s,
            None => continue,
        };
        total += 1;
        if score >= 90.0 {
            dist.ge90_count += 1;
        } else if score >= 80.0 {
            dist.ge80_count += 1;
        } else if score >= 70.0 {
            dist.ge70_count += 1;
        } else if score >= 60.0 {
            dist.ge60_count += 1;
        } else {
            dist.lt60_count += 1;
        }
    }

    if total == 0 {
        return dist;
    }

    let rate = |n: usize| n as f64 / total as f64;
    dist.ge90_rate = rate(dist.ge90_count);
    dist.ge80_rate = rate(dist.ge80_count);
    dist.ge70_rate = rate(dist.ge70_count);
    dist.ge60_rate = rate(dist.ge60_count);
    dist.lt60_rate = rate(dist.lt60_count);
    dist
}
