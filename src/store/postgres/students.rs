use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::StudentRef;
use crate::store::ports::StudentStore;
use crate::store::StoreError;

pub struct PgStudentStore {
    pool: PgPool,
}

impl PgStudentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn find_by_no(&self, student_no: &str) -> Result<Option<StudentRef>, StoreError> {
        let student =
            sqlx::query_as::<_, StudentRef>("SELECT id FROM students WHERE student_no = $1")
                .bind(student_no)
                .fetch_optional(&self.pool)
                .await?;

        Ok(student)
    }

    async fn find_by_nos(&self, student_nos: &[String]) -> Result<Vec<StudentRef>, StoreError> {
        let refs =
            sqlx::query_as::<_, StudentRef>("SELECT id FROM students WHERE student_no = ANY($1)")
                .bind(student_nos)
                .fetch_all(&self.pool)
                .await?;

        Ok(refs)
    }
}
