use chrono::Utc;
use sqlx::SqlitePool;

use super::StoreError;
use crate::models::settings::Settings;

/// Stored settings, or defaults when nothing (or nothing readable) is stored.
pub async fn load(pool: &SqlitePool) -> Result<Settings, StoreError> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    Ok(match raw {
        None => Settings::default(),
        Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!("Stored settings are unreadable, using defaults: {e}");
            Settings::default()
        }),
    })
}

pub async fn save(pool: &SqlitePool, settings: &Settings) -> Result<(), StoreError> {
    let json = serde_json::to_string(settings)?;
    sqlx::query(
        "INSERT INTO settings (id, value, updated_at) VALUES (1, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(json)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn missing_row_yields_defaults() {
        let pool = test_pool().await;
        assert_eq!(load(&pool).await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let pool = test_pool().await;
        let settings = Settings {
            primary_color: "#123456".into(),
            slot_card_template_override: true,
            slot_card_template: "<li>{{slot_title}}</li>".into(),
            ..Settings::default()
        };
        save(&pool, &settings).await.unwrap();
        save(&pool, &settings).await.unwrap();
        assert_eq!(load(&pool).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn malformed_row_yields_defaults() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO settings (id, value, updated_at) VALUES (1, 'not json', '2025-01-01T00:00:00Z')")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(load(&pool).await.unwrap(), Settings::default());
    }
}
