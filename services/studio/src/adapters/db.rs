//! services/studio/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StoryStore` port from the `core` crate. It keeps every story in one
//! embedded SQLite table using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use freeplotter_core::domain::{Story, StoryId};
use freeplotter_core::ports::{PortError, PortResult, StoryStore};
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StoryStore` port.
#[derive(Clone)]
pub struct SqliteStoryStore {
    pool: SqlitePool,
}

impl SqliteStoryStore {
    /// Creates a new `SqliteStoryStore`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

#[derive(FromRow)]
struct StoryRecord {
    id: String,
    title: String,
    context: String,
    date: DateTime<Utc>,
    sentences: String,
    paragraphs: String,
}

impl StoryRecord {
    fn from_domain(story: &Story) -> PortResult<Self> {
        Ok(Self {
            id: story.id.to_string(),
            title: story.title.clone(),
            context: story.context.clone(),
            date: story.date,
            sentences: serde_json::to_string(&story.sentences)
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
            paragraphs: serde_json::to_string(&story.paragraphs)
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        })
    }

    fn to_domain(self) -> PortResult<Story> {
        let id = self
            .id
            .parse::<StoryId>()
            .map_err(|e| PortError::Unexpected(format!("Corrupt story id '{}': {}", self.id, e)))?;
        Ok(Story {
            id,
            title: self.title,
            context: self.context,
            date: self.date,
            sentences: decode_lines(&self.sentences)?,
            paragraphs: decode_lines(&self.paragraphs)?,
        })
    }
}

fn decode_lines(raw: &str) -> PortResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `StoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoryStore for SqliteStoryStore {
    async fn list_stories(&self) -> PortResult<Vec<Story>> {
        let records = sqlx::query_as::<_, StoryRecord>(
            "SELECT id, title, context, date, sentences, paragraphs FROM stories ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(StoryRecord::to_domain).collect()
    }

    async fn get_story(&self, id: StoryId) -> PortResult<Option<Story>> {
        let record = sqlx::query_as::<_, StoryRecord>(
            "SELECT id, title, context, date, sentences, paragraphs FROM stories WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.map(StoryRecord::to_domain).transpose()
    }

    async fn upsert_story(&self, story: &Story) -> PortResult<()> {
        let record = StoryRecord::from_domain(story)?;
        sqlx::query(
            "INSERT INTO stories (id, title, context, date, sentences, paragraphs) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                title = excluded.title, \
                context = excluded.context, \
                date = excluded.date, \
                sentences = excluded.sentences, \
                paragraphs = excluded.paragraphs",
        )
        .bind(record.id)
        .bind(record.title)
        .bind(record.context)
        .bind(record.date)
        .bind(record.sentences)
        .bind(record.paragraphs)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
