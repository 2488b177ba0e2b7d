use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::config::THEME_KEY;
use crate::error::Result;
use crate::types::Theme;

/// The one persisted datum: the view theme, kept in the `preferences`
/// key/value table. Read once at startup, written on every toggle.
#[derive(Clone)]
pub struct ThemeStore {
    pool: sqlx::SqlitePool,
}

impl ThemeStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the saved theme. A missing row or an unrecognized value falls
    /// back to the default rather than failing startup.
    pub async fn load(&self) -> Result<Theme> {
        let saved: Option<String> =
            sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
                .bind(THEME_KEY)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match saved {
            None => Theme::default(),
            Some(value) => value.parse().unwrap_or_else(|bad| {
                warn!("Ignoring unrecognized saved theme {bad:?}");
                Theme::default()
            }),
        })
    }

    pub async fn save(&self, theme: Theme) -> Result<()> {
        let updated_at = now_ns() as i64;
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(THEME_KEY)
        .bind(theme.to_string())
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> ThemeStore {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        ThemeStore::new(pool)
    }

    #[tokio::test]
    async fn missing_row_falls_back_to_default() {
        let store = memory_store().await;
        assert_eq!(store.load().await.unwrap(), Theme::Dark);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = memory_store().await;
        store.save(Theme::Light).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Theme::Light);

        // Toggling back overwrites the single row.
        store.save(Theme::Dark).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Theme::Dark);
    }

    #[tokio::test]
    async fn garbage_value_falls_back_to_default() {
        let store = memory_store().await;
        sqlx::query("INSERT INTO preferences (key, value, updated_at) VALUES (?, ?, 0)")
            .bind(THEME_KEY)
            .bind("hotdog-stand")
            .execute(&store.pool)
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap(), Theme::Dark);
    }
}
