use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::quotes::repo_types::Quote;

#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn insert_quote(&self, content: &str) -> anyhow::Result<Quote>;

    async fn find_quote(&self, id: Uuid) -> anyhow::Result<Option<Quote>>;

    async fn count_quotes(&self) -> anyhow::Result<i64>;

    /// Oldest first.
    async fn list_quotes(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Quote>>;

    /// Single quote at `offset` in the same order as `list_quotes`.
    async fn quote_at(&self, offset: i64) -> anyhow::Result<Option<Quote>> {
        Ok(self.list_quotes(1, offset).await?.into_iter().next())
    }
}

#[derive(Clone)]
pub struct PgQuoteStore {
    db: PgPool,
}

impl PgQuoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuoteStore for PgQuoteStore {
    async fn insert_quote(&self, content: &str) -> anyhow::Result<Quote> {
        let quote = sqlx::query_as::<_, Quote>(
            "INSERT INTO quotes (content) VALUES ($1) RETURNING id, content, created_at, updated_at",
        )
        .bind(content)
        .fetch_one(&self.db)
        .await
        .context("insert quote")?;
        Ok(quote)
    }

    async fn find_quote(&self, id: Uuid) -> anyhow::Result<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>(
            "SELECT id, content, created_at, updated_at FROM quotes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find quote")?;
        Ok(quote)
    }

    async fn count_quotes(&self) -> anyhow::Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes")
            .fetch_one(&self.db)
            .await
            .context("count quotes")?;
        Ok(total)
    }

    async fn list_quotes(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(
            r#"
            SELECT id, content, created_at, updated_at
              FROM quotes
             ORDER BY created_at ASC, id ASC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list quotes")?;
        Ok(quotes)
    }
}
