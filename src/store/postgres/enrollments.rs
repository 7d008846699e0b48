use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::domain::Enrollment;
use crate::store::ports::{
    EnrollmentFilter, EnrollmentRow, EnrollmentStore, EnrollmentUnit, Page,
};
use crate::store::StoreError;

pub struct PgEnrollmentStore {
    pool: PgPool,
}

impl PgEnrollmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ROW_SELECT: &str = "SELECT e.id, e.student_id, e.course_id, e.term_id, e.created_at, \
            s.student_no, s.name AS student_name, \
            c.course_no, c.name AS course_name, c.credits, \
            t.term_code, t.name AS term_name \
     FROM enrollments e \
     JOIN students s ON s.id = e.student_id \
     JOIN courses c ON c.id = e.course_id \
     JOIN terms t ON t.id = e.term_id";

fn push_filters(qb: &mut QueryBuilder<Postgres>, filter: &EnrollmentFilter) {
    if let Some(student_no) = &filter.student_no {
        qb.push(" AND s.student_no = ").push_bind(student_no.clone());
    }
    if let Some(course_no) = &filter.course_no {
        qb.push(" AND c.course_no = ").push_bind(course_no.clone());
    }
    if let Some(term_code) = &filter.term_code {
        qb.push(" AND t.term_code = ").push_bind(term_code.clone());
    }
}

#[async_trait]
impl EnrollmentStore for PgEnrollmentStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>, StoreError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, student_id, course_id, term_id, created_at \
             FROM enrollments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    async fn list(
        &self,
        filter: &EnrollmentFilter,
        page: Page,
    ) -> Result<(Vec<EnrollmentRow>, i64), StoreError> {
        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM enrollments e \
             JOIN students s ON s.id = e.student_id \
             JOIN courses c ON c.id = e.course_id \
             JOIN terms t ON t.id = e.term_id \
             WHERE 1=1",
        );
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(ROW_SELECT);
        qb.push(" WHERE 1=1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY e.created_at DESC");
        qb.push(" LIMIT ").push_bind(page.size);
        qb.push(" OFFSET ").push_bind((page.page - 1) * page.size);

        let rows = qb
            .build_query_as::<EnrollmentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<EnrollmentRow>, StoreError> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "{} WHERE e.student_id = $1 ORDER BY t.term_code DESC, c.course_no ASC",
            ROW_SELECT
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn begin(&self) -> Result<Box<dyn EnrollmentUnit>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgEnrollmentUnit { tx }))
    }
}

/// One transaction per student (enroll) or per cascading delete. Dropping
/// the unit without commit rolls the transaction back.
pub struct PgEnrollmentUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl EnrollmentUnit for PgEnrollmentUnit {
    async fn lock_student_term(
        &mut self,
        student_id: i64,
        term_id: i64,
    ) -> Result<(), StoreError> {
        // Transaction-scoped advisory lock keyed by (student, term): two
        // racing enroll calls for the same student serialize here instead of
        // both passing the credit-cap read.
        let key = (student_id << 20) ^ term_id;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn enrolled_credits(
        &mut self,
        student_id: i64,
        term_id: i64,
    ) -> Result<i32, StoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(c.credits), 0)::BIGINT \
             FROM enrollments e JOIN courses c ON c.id = e.course_id \
             WHERE e.student_id = $1 AND e.term_id = $2",
        )
        .bind(student_id)
        .bind(term_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(total as i32)
    }

    async fn count_enrolled(
        &mut self,
        student_id: i64,
        course_ids: &[i64],
    ) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE student_id = $1 AND course_id = ANY($2)",
        )
        .bind(student_id)
        .bind(course_ids)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn insert_enrollments(
        &mut self,
        student_id: i64,
        term_id: i64,
        course_ids: &[i64],
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO enrollments (student_id, course_id, term_id) \
             SELECT $1, cid, $2 FROM UNNEST($3::BIGINT[]) AS cid",
        )
        .bind(student_id)
        .bind(term_id)
        .bind(course_ids)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_grades(&mut self, student_id: i64, course_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM grades WHERE student_id = $1 AND course_id = $2")
            .bind(student_id)
            .bind(course_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_enrollment(&mut self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
