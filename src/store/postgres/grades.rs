use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::store::ports::{GradeFilter, GradeQueryRow, GradeStore, GradeUnit, GradeUpsert, MyGradeRow};
use crate::store::StoreError;

pub struct PgGradeStore {
    pool: PgPool,
}

impl PgGradeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GradeStore for PgGradeStore {
    async fn query(&self, filter: &GradeFilter) -> Result<Vec<GradeQueryRow>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT s.student_no, s.name AS student_name, s.gender, \
                    c.course_no, c.name AS course_name, \
                    st.staff_no AS teacher_no, st.name AS teacher_name, \
                    d.dept_no, \
                    c.hours, c.credits, c.class_time, c.class_location, c.exam_time, \
                    g.usual_score, g.exam_score, g.final_score \
             FROM grades g \
             JOIN students s ON s.id = g.student_id \
             JOIN courses c ON c.id = g.course_id \
             JOIN staff st ON st.id = c.teacher_id \
             JOIN departments d ON d.id = s.dept_id \
             WHERE 1=1",
        );

        if let Some(student_no) = &filter.student_no {
            qb.push(" AND s.student_no = ").push_bind(student_no.clone());
        }
        if let Some(student_name) = &filter.student_name {
            qb.push(" AND s.name ILIKE ")
                .push_bind(format!("%{}%", student_name));
        }
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
            qb.push(" AND d.dept_no = ").push_bind(dept_no.clone());
        }

        qb.push(" ORDER BY c.course_no ASC, g.final_score DESC NULLS LAST, s.student_no ASC");

        let rows = qb
            .build_query_as::<GradeQueryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<MyGradeRow>, StoreError> {
        let rows = sqlx::query_as::<_, MyGradeRow>(
            "SELECT c.course_no, c.name AS course_name, c.credits, \
                    COALESCE(t.term_code, '') AS term_code, \
                    g.usual_score, g.exam_score, g.final_score \
             FROM grades g \
             JOIN courses c ON c.id = g.course_id \
             LEFT JOIN enrollments e \
               ON e.student_id = g.student_id AND e.course_id = g.course_id \
             LEFT JOIN terms t ON t.id = e.term_id \
             WHERE g.student_id = $1 \
             ORDER BY term_code DESC, c.course_no ASC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn begin(&self) -> Result<Box<dyn GradeUnit>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgGradeUnit { tx }))
    }
}

pub struct PgGradeUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl GradeUnit for PgGradeUnit {
    async fn upsert(&mut self, grade: &GradeUpsert) -> Result<(), StoreError> {
        // Backed by the unique (student_id, course_id) index, so concurrent
        // upserts for the same pair cannot produce two rows.
        sqlx::query(
            "INSERT INTO grades (student_id, course_id, usual_score, exam_score, final_score, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (student_id, course_id) DO UPDATE SET \
                usual_score = EXCLUDED.usual_score, \
                exam_score = EXCLUDED.exam_score, \
                final_score = EXCLUDED.final_score, \
                updated_at = NOW()",
        )
        .bind(grade.student_id)
        .bind(grade.course_id)
        .bind(grade.usual_score)
        .bind(grade.exam_score)
        .bind(grade.final_score)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
