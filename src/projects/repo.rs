use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use super::repo_types::{
    DeleteOutcome, Project, ProjectFields, ProjectPatch, ProjectRow, UpdateOutcome,
};
use crate::error::{StoreError, StoreResult};
use crate::object_id::ObjectId;

/// Resource store for catalog projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Every stored project, in no particular order.
    async fn list(&self) -> StoreResult<Vec<Project>>;
    async fn insert(&self, fields: ProjectFields) -> StoreResult<ObjectId>;
    async fn update(&self, id: &ObjectId, patch: &ProjectPatch) -> StoreResult<UpdateOutcome>;
    async fn delete(&self, id: &ObjectId) -> StoreResult<DeleteOutcome>;
}

#[derive(Clone)]
pub struct PgProjectStore {
    db: PgPool,
}

impl PgProjectStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn list(&self) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, image, category, name, live, server, client, rating, extra
            FROM projects
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        rows.into_iter()
            .map(|r| Project::try_from(r).map_err(StoreError::from))
            .collect()
    }

    async fn insert(&self, fields: ProjectFields) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        sqlx::query(
            r#"
            INSERT INTO projects (id, image, category, name, live, server, client, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id.to_hex())
        .bind(fields.image)
        .bind(fields.category)
        .bind(fields.name)
        .bind(fields.live)
        .bind(fields.server)
        .bind(fields.client)
        .bind(fields.rating)
        .execute(&self.db)
        .await?;
        Ok(id)
    }

    /// Row counts only include the project as modified when a supplied value
    /// differs from the stored one. Each field binds a presence flag followed
    /// by its value, so an explicit `null` clears the column.
    async fn update(&self, id: &ObjectId, patch: &ProjectPatch) -> StoreResult<UpdateOutcome> {
        let (matched, modified) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH target AS (
                SELECT id FROM projects WHERE id = $1
            ),
            updated AS (
                UPDATE projects SET
                    image    = CASE WHEN $2::boolean  THEN $3::text    ELSE image    END,
                    category = CASE WHEN $4::boolean  THEN $5::text    ELSE category END,
                    name     = CASE WHEN $6::boolean  THEN $7::text    ELSE name     END,
                    live     = CASE WHEN $8::boolean  THEN $9::text    ELSE live     END,
                    server   = CASE WHEN $10::boolean THEN $11::text   ELSE server   END,
                    client   = CASE WHEN $12::boolean THEN $13::text   ELSE client   END,
                    rating   = CASE WHEN $14::boolean THEN $15::float8 ELSE rating   END,
                    extra    = extra || $16::jsonb
                WHERE id = $1
                  AND (   ($2::boolean  AND image    IS DISTINCT FROM $3::text)
                       OR ($4::boolean  AND category IS DISTINCT FROM $5::text)
                       OR ($6::boolean  AND name     IS DISTINCT FROM $7::text)
                       OR ($8::boolean  AND live     IS DISTINCT FROM $9::text)
                       OR ($10::boolean AND server   IS DISTINCT FROM $11::text)
                       OR ($12::boolean AND client   IS DISTINCT FROM $13::text)
                       OR ($14::boolean AND rating   IS DISTINCT FROM $15::float8)
                       OR extra IS DISTINCT FROM extra || $16::jsonb)
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM updated)
            "#,
        )
        .bind(id.to_hex())
        .bind(patch.image.is_some())
        .bind(patch.image.clone().flatten())
        .bind(patch.category.is_some())
        .bind(patch.category.clone().flatten())
        .bind(patch.name.is_some())
        .bind(patch.name.clone().flatten())
        .bind(patch.live.is_some())
        .bind(patch.live.clone().flatten())
        .bind(patch.server.is_some())
        .bind(patch.server.clone().flatten())
        .bind(patch.client.is_some())
        .bind(patch.client.clone().flatten())
        .bind(patch.rating.is_some())
        .bind(patch.rating.flatten())
        .bind(Json(&patch.extra))
        .fetch_one(&self.db)
        .await?;

        Ok(UpdateOutcome {
            matched_count: matched as u64,
            modified_count: modified as u64,
        })
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<DeleteOutcome> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.to_hex())
            .execute(&self.db)
            .await?;
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;
    use serde_json::json;

    async fn stored(store: &PgProjectStore, id: &ObjectId) -> Project {
        store
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.id == *id)
            .expect("inserted project")
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified_counts() {
        let Some(pool) = test_pool().await else { return };
        let store = PgProjectStore::new(pool);
        let id = store
            .insert(ProjectFields {
                name: Some("P".into()),
                live: Some("https://x".into()),
                rating: Some(4.0),
                ..Default::default()
            })
            .await
            .unwrap();

        let same: ProjectPatch = serde_json::from_value(json!({ "name": "P" })).unwrap();
        assert_eq!(
            store.update(&id, &same).await.unwrap(),
            UpdateOutcome { matched_count: 1, modified_count: 0 }
        );

        let rating: ProjectPatch = serde_json::from_value(json!({ "rating": 5 })).unwrap();
        assert_eq!(
            store.update(&id, &rating).await.unwrap(),
            UpdateOutcome { matched_count: 1, modified_count: 1 }
        );

        assert_eq!(
            store.update(&ObjectId::new(), &rating).await.unwrap(),
            UpdateOutcome { matched_count: 0, modified_count: 0 }
        );

        let after = stored(&store, &id).await;
        assert_eq!(after.fields.rating, Some(5.0));
        assert_eq!(after.fields.name.as_deref(), Some("P"));
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn update_writes_nulls_and_unknown_keys() {
        let Some(pool) = test_pool().await else { return };
        let store = PgProjectStore::new(pool);
        let id = store
            .insert(ProjectFields {
                live: Some("https://x".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let clear: ProjectPatch = serde_json::from_value(json!({ "live": null })).unwrap();
        assert_eq!(store.update(&id, &clear).await.unwrap().modified_count, 1);
        assert_eq!(store.update(&id, &clear).await.unwrap().modified_count, 0);

        let featured: ProjectPatch = serde_json::from_value(json!({ "featured": true })).unwrap();
        assert_eq!(store.update(&id, &featured).await.unwrap().modified_count, 1);
        assert_eq!(store.update(&id, &featured).await.unwrap().modified_count, 0);

        let after = stored(&store, &id).await;
        assert_eq!(after.fields.live, None);
        assert_eq!(after.extra.get("featured"), Some(&json!(true)));
        assert_eq!(store.delete(&id).await.unwrap().deleted_count, 1);
    }
}
