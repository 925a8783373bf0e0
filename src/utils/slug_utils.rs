use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use slug::slugify;

/// Derives a URL-safe slug from a display name. Runs once, at creation time,
/// and only when no slug was supplied; slugs are never re-derived on update.
pub fn derive_slug(name: &str) -> String {
    slugify(name)
}

/// Probes `base`, `base-1`, `base-2`, ... against the entity's slug column
/// until an unused value is found. Read-then-write: two concurrent creations
/// with the same base can race on the suffix; the unique index on the column
/// turns the loser into a write error.
pub async fn ensure_unique_slug<C, E>(
    db: &C,
    slug_column: <E as EntityTrait>::Column,
    base: &str,
) -> Result<String, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut candidate = base.to_string();
    let mut counter = 1u32;

    while E::find()
        .filter(slug_column.eq(candidate.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::entities::category;

    use super::*;

    #[test]
    fn derivation_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Hello World"), "hello-world");
    }

    fn category_row(slug: &str) -> category::Model {
        let now = Utc::now();
        category::Model {
            id: 1,
            public_id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn free_base_is_used_unchanged() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();

        let slug =
            ensure_unique_slug::<_, category::Entity>(&db, category::Column::Slug, "fresh")
                .await
                .unwrap();
        assert_eq!(slug, "fresh");
    }

    #[tokio::test]
    async fn collision_probes_suffixes_until_one_is_free() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![category_row("hello-world")]])
            .append_query_results([vec![category_row("hello-world-1")]])
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();

        let slug = ensure_unique_slug::<_, category::Entity>(
            &db,
            category::Column::Slug,
            "hello-world",
        )
        .await
        .unwrap();
        assert_eq!(slug, "hello-world-2");
    }

    #[test]
    fn derivation_normalizes_punctuation_and_accents() {
        assert_eq!(derive_slug("Rust: Fearless Concurrency!"), "rust-fearless-concurrency");
        assert_eq!(derive_slug("Café culture"), "cafe-culture");
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(derive_slug("Same Input"), derive_slug("Same Input"));
    }
}
