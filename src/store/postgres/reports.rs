use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::store::ports::{ReportFilter, ReportStore, RosterRow};
use crate::store::StoreError;

pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn roster_rows(
        &self,
        filter: &ReportFilter,
        with_grades: bool,
    ) -> Result<Vec<RosterRow>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT c.course_no, c.name AS course_name, \
                    st.staff_no AS teacher_no, st.name AS teacher_name, \
                    c.hours, c.credits, c.class_time, c.class_location, c.exam_time, \
                    s.student_no, s.name AS student_name, s.gender, ",
        );

        // Roster without grades forces all score fields null; every enrolled
        // student still appears.
        if with_grades {
            qb.push("g.usual_score, g.exam_score, g.final_score");
        } else {
            qb.push("NULL::FLOAT8 AS usual_score, NULL::FLOAT8 AS exam_score, NULL::FLOAT8 AS final_score");
        }

        qb.push(
            " FROM enrollments e \
              JOIN students s ON s.id = e.student_id \
              JOIN courses c ON c.id = e.course_id \
              JOIN staff st ON st.id = c.teacher_id",
        );

        if with_grades {
            qb.push(" LEFT JOIN grades g ON g.student_id = s.id AND g.course_id = c.id");
        }

        qb.push(" WHERE 1=1");

        if let Some(course_no) = &filter.course_no {
            qb.push(" AND c.course_no = ").push_bind(course_no.clone());
        }
        if let Some(course_name) = &filter.course_name {
            qb.push(" AND c.name ILIKE ")
                .push_bind(format!("%{}%", course_name));
        }
        if let Some(teacher_name) = &filter.teacher_name {
            qb.push(" AND st.name ILIKE ")
                .push_bind(format!("%{}%", teacher_name));
        }
        if let Some(dept_no) = &filter.dept_no {
            // dept_no selects courses taught by that department's staff, not
            // the students' department.
            qb.push(
                " AND EXISTS (SELECT 1 FROM departments td \
                  WHERE td.id = st.dept_id AND td.dept_no = ",
            )
            .push_bind(dept_no.clone());
            qb.push(")");
        }

        qb.push(" ORDER BY c.course_no ASC, s.student_no ASC");

        let rows = qb
            .build_query_as::<RosterRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
