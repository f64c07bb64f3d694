use anyhow::Context;
use sqlx::PgPool;

use crate::gifts::repo_types::Gift;

/// Return all gifts, newest first.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Gift>> {
    let rows = sqlx::query_as::<_, Gift>(
        r#"
        SELECT id, name, category, condition, posted_by, zipcode,
               date_added, age_days, age_years, description, image
          FROM gifts
         ORDER BY date_added DESC NULLS LAST, id ASC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list gifts")?;
    Ok(rows)
}

/// Whether a storage error came from the primary key constraint on `gifts.id`.
pub fn is_unique_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

pub async fn find_by_id(db: &PgPool, id: &str) -> anyhow::Result<Option<Gift>> {
    let row = sqlx::query_as::<_, Gift>(
        r#"
        SELECT id, name, category, condition, posted_by, zipcode,
               date_added, age_days, age_years, description, image
          FROM gifts
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get gift by id")?;
    Ok(row)
}

pub async fn insert(db: &PgPool, gift: &Gift) -> anyhow::Result<Gift> {
    let row = sqlx::query_as::<_, Gift>(
        r#"
        INSERT INTO gifts (id, name, category, condition, posted_by, zipcode,
                           date_added, age_days, age_years, description, image)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id, name, category, condition, posted_by, zipcode,
                  date_added, age_days, age_years, description, image
        "#,
    )
    .bind(&gift.id)
    .bind(&gift.name)
    .bind(&gift.category)
    .bind(&gift.condition)
    .bind(&gift.posted_by)
    .bind(&gift.zipcode)
    .bind(gift.date_added)
    .bind(gift.age_days)
    .bind(gift.age_years)
    .bind(&gift.description)
    .bind(&gift.image)
    .fetch_one(db)
    .await
    .context("insert gift")?;
    Ok(row)
}
