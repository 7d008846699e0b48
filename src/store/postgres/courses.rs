use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Course, CourseRef};
use crate::store::ports::CourseStore;
use crate::store::StoreError;

pub struct PgCourseStore {
    pool: PgPool,
}

impl PgCourseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn find_by_no(&self, course_no: &str) -> Result<Option<Course>, StoreError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, course_no, name, teacher_id, hours, credits, \
                    class_time, class_location, exam_time \
             FROM courses WHERE course_no = $1",
        )
        .bind(course_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    async fn find_by_nos(&self, course_nos: &[String]) -> Result<Vec<CourseRef>, StoreError> {
        let refs = sqlx::query_as::<_, CourseRef>(
            "SELECT id, credits FROM courses WHERE course_no = ANY($1)",
        )
        .bind(course_nos)
        .fetch_all(&self.pool)
        .await?;

        Ok(refs)
    }
}
