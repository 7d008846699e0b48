use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::Term;
use crate::store::ports::TermStore;
use crate::store::StoreError;

pub struct PgTermStore {
    pool: PgPool,
}

impl PgTermStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TermStore for PgTermStore {
    async fn find_by_code(&self, term_code: &str) -> Result<Option<Term>, StoreError> {
        let term = sqlx::query_as::<_, Term>(
            "SELECT id, term_code, name, start_date, end_date FROM terms WHERE term_code = $1",
        )
        .bind(term_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(term)
    }
}
