use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::StoreError;
use crate::models::user::{Role, User};

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, StoreError> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, StoreError> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn insert_and_lookup() {
        let pool = test_pool().await;
        assert_eq!(count(&pool).await.unwrap(), 0);
        let id = insert(&pool, "ed@example.com", "hash", Role::Editor).await.unwrap();

        let user = find_by_email(&pool, "ed@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Editor);
        assert_eq!(count(&pool).await.unwrap(), 1);
        assert!(find_by_email(&pool, "nobody@example.com").await.unwrap().is_none());

        let dup = insert(&pool, "ed@example.com", "hash", Role::Editor).await;
        assert!(matches!(dup, Err(StoreError::Sqlx(e)) if crate::db::is_unique_violation(&e)));
    }
}
