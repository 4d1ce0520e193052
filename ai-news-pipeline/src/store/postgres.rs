use super::CacheStore;
use crate::types::{CacheEntry, ClassifiedArticle, Cohort, PipelineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

pub struct PostgresCacheStore {
    db: PgPool,
}

impl PostgresCacheStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn setup_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_cache (
                id UUID PRIMARY KEY,
                generation TEXT NOT NULL,
                articles JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_news_cache_generation_created ON news_cache (generation, created_at DESC)",
        )
        .execute(&self.db)
        .await?;

        info!("news_cache schema is ready");
        Ok(())
    }

    fn entry_from_row(row: &PgRow) -> Result<CacheEntry> {
        let generation: String = row.try_get("generation")?;
        let Json(articles): Json<Vec<ClassifiedArticle>> = row.try_get("articles")?;

        Ok(CacheEntry {
            id: row.try_get("id")?,
            generation: decode_generation(&generation)?,
            articles,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

// A row with an unknown cohort id is corrupt storage, not a bad request.
fn decode_generation(value: &str) -> Result<Cohort> {
    value
        .parse::<Cohort>()
        .map_err(|e| PipelineError::Storage(sqlx::Error::Decode(Box::new(e))))
}

#[async_trait]
impl CacheStore for PostgresCacheStore {
    async fn insert(&self, entry: &CacheEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO news_cache (id, generation, articles, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.id)
        .bind(entry.generation.id())
        .bind(Json(&entry.articles))
        .bind(entry.created_at)
        .execute(&self.db)
        .await?;

        debug!("Inserted cache entry {} for {}", entry.id, entry.generation);
        Ok(())
    }

    async fn latest_since(&self, generation: Cohort, threshold: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, generation, articles, created_at
            FROM news_cache
            WHERE generation = $1 AND created_at >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(generation.id())
        .bind(threshold)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(Self::entry_from_row).transpose()
    }

    async fn entries(&self, generation: Cohort) -> Result<Vec<CacheEntry>> {
        let rows = sqlx::query(
            "SELECT id, generation, articles, created_at FROM news_cache WHERE generation = $1 ORDER BY created_at DESC",
        )
        .bind(generation.id())
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(Self::entry_from_row).collect()
    }
}
