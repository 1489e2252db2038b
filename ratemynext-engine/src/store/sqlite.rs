//! SQLite key-value backend

use async_trait::async_trait;
use ratemynext_core::{storage_error, KeyValueStore, RateResult, RepoData, RepoKey};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

const COMPONENT: &str = "sqlite_storage";

/// Durable store backed by two tables: `repo_data` and `sorted_sets`
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a database URL such as `sqlite://ratemynext.db?mode=rwc`
    pub async fn from_url(database_url: &str) -> RateResult<Self> {
        let pool = SqlitePool::connect(database_url).await.map_err(|e| {
            storage_error!(
                format!("Failed to connect to SQLite database: {}", e),
                COMPONENT,
                "connect"
            )
        })?;

        Ok(Self::new(pool))
    }

    /// Run database migrations
    pub async fn migrate(&self) -> RateResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Database migration failed: {}", e),
                    COMPONENT,
                    "migrate"
                )
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn to_db_score(score: u64) -> i64 {
    i64::try_from(score).unwrap_or(i64::MAX)
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn hash_set(&self, key: &RepoKey, data: &RepoData) -> RateResult<()> {
        let json = serde_json::to_string(data).map_err(|e| {
            storage_error!(
                format!("Failed to serialize result: {}", e),
                COMPONENT,
                "hash_set"
            )
        })?;

        sqlx::query("INSERT OR REPLACE INTO repo_data (key, data, updated_at) VALUES (?, ?, ?)")
            .bind(key.as_str())
            .bind(json)
            .bind(data.info.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Failed to save result to database: {}", e),
                    COMPONENT,
                    "hash_set"
                )
            })?;

        debug!("Saved {} to SQLite storage", key);
        Ok(())
    }

    async fn hash_get(&self, key: &RepoKey) -> RateResult<Option<RepoData>> {
        let row = sqlx::query("SELECT data FROM repo_data WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Failed to load result from database: {}", e),
                    COMPONENT,
                    "hash_get"
                )
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let json: String = row.try_get("data").map_err(|e| {
            storage_error!(
                format!("Failed to get data column: {}", e),
                COMPONENT,
                "hash_get"
            )
        })?;

        let data = serde_json::from_str(&json).map_err(|e| {
            storage_error!(
                format!("Failed to parse stored result: {}", e),
                COMPONENT,
                "hash_get"
            )
        })?;

        Ok(Some(data))
    }

    async fn sorted_set_add(&self, set: &str, member: &RepoKey, score: u64) -> RateResult<()> {
        sqlx::query("INSERT OR REPLACE INTO sorted_sets (set_name, member, score) VALUES (?, ?, ?)")
            .bind(set)
            .bind(member.as_str())
            .bind(to_db_score(score))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Failed to update sorted set: {}", e),
                    COMPONENT,
                    "sorted_set_add"
                )
            })?;

        Ok(())
    }

    async fn sorted_set_range(
        &self,
        set: &str,
        start: usize,
        stop: usize,
        reversed: bool,
    ) -> RateResult<Vec<(RepoKey, u64)>> {
        if stop < start {
            return Ok(Vec::new());
        }

        let query = if reversed {
            "SELECT member, score FROM sorted_sets WHERE set_name = ? \
             ORDER BY score DESC, member ASC LIMIT ? OFFSET ?"
        } else {
            "SELECT member, score FROM sorted_sets WHERE set_name = ? \
             ORDER BY score ASC, member ASC LIMIT ? OFFSET ?"
        };

        let limit = i64::try_from((stop - start).saturating_add(1)).unwrap_or(i64::MAX);
        let offset = i64::try_from(start).unwrap_or(i64::MAX);

        let rows = sqlx::query(query)
            .bind(set)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Failed to read sorted set: {}", e),
                    COMPONENT,
                    "sorted_set_range"
                )
            })?;

        rows.iter()
            .map(|row| {
                let member: String = row.try_get("member").map_err(|e| {
                    storage_error!(
                        format!("Failed to get member column: {}", e),
                        COMPONENT,
                        "sorted_set_range"
                    )
                })?;
                let score: i64 = row.try_get("score").map_err(|e| {
                    storage_error!(
                        format!("Failed to get score column: {}", e),
                        COMPONENT,
                        "sorted_set_range"
                    )
                })?;
                Ok((RepoKey::from_raw(member), score.max(0) as u64))
            })
            .collect()
    }

    async fn health_check(&self) -> RateResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Database health check failed: {}", e),
                    COMPONENT,
                    "health_check"
                )
            })?;
        Ok(())
    }
}
