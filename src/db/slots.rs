use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{is_unique_violation, StoreError};
use crate::listing::Sort;
use crate::models::slot::{
    format_slot_id, slugify, MetaUpdate, NewSlot, Slot, SlotChanges, SlotFilter, SlotStatus,
};

const MAX_SLUG_ATTEMPTS: u32 = 100;
const MAX_SLOT_ID_ATTEMPTS: u32 = 16;

// ── Writes ───────────────────────────────────────────────────────────────────

/// Insert a slot and give it a slot ID. Both happen in one transaction, so a
/// failed allocation leaves no row behind.
pub async fn insert(pool: &SqlitePool, new: &NewSlot) -> Result<Slot, StoreError> {
    let base = new
        .slug
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&new.title));

    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut attempts = 0;
    let id: i64 = loop {
        let slug = unique_slug(&mut tx, &base, None).await?;
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO slots (title, slug, content, excerpt, status, thumbnail_url, \
             star_rating, provider_name, rtp, min_wager, max_wager, created_at, modified_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new.title)
        .bind(&slug)
        .bind(&new.content)
        .bind(&new.excerpt)
        .bind(new.status)
        .bind(&new.thumbnail_url)
        .bind(new.meta.star_rating.flatten())
        .bind(new.meta.provider_name.clone().flatten())
        .bind(new.meta.rtp.flatten())
        .bind(new.meta.min_wager.flatten())
        .bind(new.meta.max_wager.flatten())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await;

        match result {
            Ok(id) => break id,
            // another writer took the slug between the check and the insert
            Err(e) if is_unique_violation(&e) && attempts < 3 => attempts += 1,
            Err(e) => return Err(e.into()),
        }
    };

    let slot_id = assign_slot_id(&mut tx, id).await?;
    tx.commit().await?;
    tracing::info!("Created slot {id} ({slot_id})");
    get(pool, id).await?.ok_or(StoreError::NotFound(id))
}

/// Apply column changes. Returns the updated row, or `None` if it doesn't exist.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    changes: &SlotChanges,
) -> Result<Option<Slot>, StoreError> {
    if get(pool, id).await?.is_none() {
        return Ok(None);
    }

    let slug = match &changes.slug {
        Some(s) if !s.is_empty() => {
            let mut conn = pool.acquire().await?;
            Some(unique_slug(&mut conn, s, Some(id)).await?)
        }
        _ => None,
    };

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE slots SET modified_at = ");
    qb.push_bind(Utc::now());
    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(slug) = slug {
        qb.push(", slug = ").push_bind(slug);
    }
    if let Some(content) = &changes.content {
        qb.push(", content = ").push_bind(content.clone());
    }
    if let Some(excerpt) = &changes.excerpt {
        qb.push(", excerpt = ").push_bind(excerpt.clone());
    }
    if let Some(status) = changes.status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(thumbnail) = &changes.thumbnail_url {
        qb.push(", thumbnail_url = ").push_bind(thumbnail.clone());
    }
    push_meta(&mut qb, &changes.meta);
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(pool).await?;

    get(pool, id).await
}

/// Write metadata fields and bump `modified_at`. Returns false if the slot doesn't exist.
pub async fn update_meta(pool: &SqlitePool, id: i64, meta: &MetaUpdate) -> Result<bool, StoreError> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE slots SET modified_at = ");
    qb.push_bind(Utc::now());
    push_meta(&mut qb, meta);
    qb.push(" WHERE id = ").push_bind(id);
    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() == 1)
}

fn push_meta(qb: &mut QueryBuilder<'_, Sqlite>, meta: &MetaUpdate) {
    for (column, value) in [
        ("star_rating", meta.star_rating),
        ("rtp", meta.rtp),
        ("min_wager", meta.min_wager),
        ("max_wager", meta.max_wager),
    ] {
        if let Some(value) = value {
            qb.push(format!(", {column} = ")).push_bind(value);
        }
    }
    if let Some(provider) = &meta.provider_name {
        qb.push(", provider_name = ").push_bind(provider.clone());
    }
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM slots WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// `base`, or `base-2`, `base-3`, ... whichever is free.
async fn unique_slug(
    conn: &mut SqliteConnection,
    base: &str,
    exclude: Option<i64>,
) -> Result<String, StoreError> {
    for n in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = if n == 1 {
            base.to_string()
        } else {
            format!("{base}-{n}")
        };
        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM slots WHERE slug = ? AND id != ?")
            .bind(&candidate)
            .bind(exclude.unwrap_or(-1))
            .fetch_optional(&mut *conn)
            .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
    Err(StoreError::Exhausted("slug", MAX_SLUG_ATTEMPTS))
}

// ── Slot IDs ─────────────────────────────────────────────────────────────────

/// Highest numeric suffix in use plus one.
pub async fn next_slot_id(conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let max: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(CAST(SUBSTR(slot_id, 5) AS INTEGER)) FROM slots WHERE slot_id GLOB 'SLOT[0-9]*'",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(max.map_or(1, |m| m.max(0) as u64 + 1))
}

/// Give slot `id` a slot ID unless it already has one. The UNIQUE column
/// settles races between concurrent writers; a collision moves on to the
/// next counter.
pub async fn assign_slot_id(conn: &mut SqliteConnection, id: i64) -> Result<String, StoreError> {
    if let Some(existing) = current_slot_id(conn, id).await? {
        return Ok(existing);
    }

    let mut counter = next_slot_id(conn).await?;
    for _ in 0..MAX_SLOT_ID_ATTEMPTS {
        let candidate = format_slot_id(counter);
        let result = sqlx::query("UPDATE slots SET slot_id = ? WHERE id = ? AND slot_id IS NULL")
            .bind(&candidate)
            .bind(id)
            .execute(&mut *conn)
            .await;

        match result {
            Ok(r) if r.rows_affected() == 1 => return Ok(candidate),
            // assigned concurrently, or the row is gone
            Ok(_) => return current_slot_id(conn, id).await?.ok_or(StoreError::NotFound(id)),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!("Slot ID {candidate} taken, retrying");
                counter += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(StoreError::Exhausted("slot_id", MAX_SLOT_ID_ATTEMPTS))
}

async fn current_slot_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<String>, StoreError> {
    let row: Option<Option<String>> = sqlx::query_scalar("SELECT slot_id FROM slots WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        None => Err(StoreError::NotFound(id)),
        Some(slot_id) => Ok(slot_id.filter(|s| !s.is_empty())),
    }
}

/// Assign IDs to every slot that lacks one. Returns how many were assigned.
pub async fn backfill_slot_ids(pool: &SqlitePool) -> Result<usize, StoreError> {
    sqlx::query("UPDATE slots SET slot_id = NULL WHERE slot_id = ''")
        .execute(pool)
        .await?;
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM slots WHERE slot_id IS NULL ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut conn = pool.acquire().await?;
    for id in &ids {
        assign_slot_id(&mut conn, *id).await?;
    }
    if !ids.is_empty() {
        tracing::info!("Backfilled slot IDs for {} slots", ids.len());
    }
    Ok(ids.len())
}

// ── Reads ────────────────────────────────────────────────────────────────────

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Slot>, StoreError> {
    Ok(sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Every slot, newest first, regardless of status.
pub async fn list(pool: &SqlitePool) -> Result<Vec<Slot>, StoreError> {
    Ok(
        sqlx::query_as::<_, Slot>("SELECT * FROM slots ORDER BY modified_at DESC, id DESC")
            .fetch_all(pool)
            .await?,
    )
}

/// Published slot by slot ID, falling back to the numeric row id.
pub async fn find_published(pool: &SqlitePool, key: &str) -> Result<Option<Slot>, StoreError> {
    let key = key.trim();
    if key.is_empty() {
        return Ok(None);
    }
    let by_slot_id = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE slot_id = ? AND status = ?")
        .bind(key)
        .bind(SlotStatus::Publish)
        .fetch_optional(pool)
        .await?;
    if by_slot_id.is_some() {
        return Ok(by_slot_id);
    }

    let Ok(id) = key.parse::<i64>() else {
        return Ok(None);
    };
    Ok(get(pool, id).await?.filter(Slot::is_published))
}

pub async fn find_published_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Slot>, StoreError> {
    Ok(
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE slug = ? AND status = ?")
            .bind(slug)
            .bind(SlotStatus::Publish)
            .fetch_optional(pool)
            .await?,
    )
}

/// One page of published slots for the grid.
pub async fn list_grid(
    pool: &SqlitePool,
    sort: Sort,
    limit: u32,
    page: u32,
) -> Result<Vec<Slot>, StoreError> {
    let order = match sort {
        Sort::Recent => "modified_at DESC, id DESC",
        Sort::Random => "RANDOM()",
    };
    let offset = i64::from(page.max(1) - 1) * i64::from(limit);
    let sql = format!("SELECT * FROM slots WHERE status = ? ORDER BY {order} LIMIT ? OFFSET ?");
    Ok(sqlx::query_as::<_, Slot>(&sql)
        .bind(SlotStatus::Publish)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?)
}

/// Published slots matching the public listing filters.
pub async fn query(pool: &SqlitePool, filter: &SlotFilter) -> Result<Vec<Slot>, StoreError> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM slots WHERE status = ");
    qb.push_bind(SlotStatus::Publish);

    if let Some(slot_id) = &filter.slot_id {
        qb.push(" AND slot_id = ").push_bind(slot_id.clone());
    }
    if let Some(provider) = &filter.provider {
        qb.push(" AND provider_name LIKE ")
            .push_bind(format!("%{}%", escape_like(provider)))
            .push(" ESCAPE '\\'");
    }
    if filter.rating_bounded() {
        qb.push(" AND star_rating BETWEEN ")
            .push_bind(filter.min_rating)
            .push(" AND ")
            .push_bind(filter.max_rating);
    }

    let (column, requires_value) = filter.order_by.column();
    if requires_value {
        qb.push(format!(" AND {column} IS NOT NULL"));
    }
    qb.push(format!(
        " ORDER BY {column} {dir}, id {dir}",
        dir = filter.direction.as_sql()
    ));

    Ok(qb.build_query_as::<Slot>().fetch_all(pool).await?)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
