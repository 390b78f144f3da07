use std::sync::Arc;

use tracing::{debug, info};

use super::repo::ProjectStore;
use super::repo_types::{DeleteOutcome, Project, ProjectFields, ProjectPatch, UpdateOutcome};
use crate::error::{AppError, AppResult};
use crate::object_id::ObjectId;

/// Catalog operations over a [`ProjectStore`].
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
}

fn parse_id(raw: &str) -> AppResult<ObjectId> {
    raw.parse()
        .map_err(|_| AppError::MalformedIdentifier(raw.to_string()))
}

impl ProjectService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Project>> {
        Ok(self.store.list().await?)
    }

    /// Stores a new project. The assigned id is not handed back; callers
    /// discover it through [`ProjectService::list`].
    pub async fn create(&self, fields: ProjectFields) -> AppResult<()> {
        let id = self.store.insert(fields).await?;
        info!(project_id = %id, "project created");
        Ok(())
    }

    /// Shallow-merges `patch` into the project. A project that exists but
    /// would not change reports `NotFound`, same as a missing one.
    pub async fn update(&self, id: &str, patch: ProjectPatch) -> AppResult<UpdateOutcome> {
        let id = parse_id(id)?;
        if patch.extra.contains_key("_id") {
            return Err(AppError::ValidationFailure("_id cannot be modified".into()));
        }
        let outcome = self.store.update(&id, &patch).await?;
        if outcome.modified_count == 0 {
            debug!(project_id = %id, matched = outcome.matched_count, "update modified nothing");
            return Err(AppError::NotFound("Project"));
        }
        info!(project_id = %id, "project updated");
        Ok(outcome)
    }

    pub async fn delete(&self, id: &str) -> AppResult<DeleteOutcome> {
        let id = parse_id(id)?;
        let outcome = self.store.delete(&id).await?;
        info!(project_id = %id, deleted = outcome.deleted_count, "project delete");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::memory::InMemoryProjectStore;
    use serde_json::json;

    fn service() -> ProjectService {
        ProjectService::new(Arc::new(InMemoryProjectStore::new()))
    }

    fn project(name: &str) -> ProjectFields {
        ProjectFields {
            image: Some(format!("https://img.example/{name}.png")),
            category: Some("web".into()),
            name: Some(name.into()),
            live: Some(format!("https://{name}.example")),
            server: Some(format!("https://github.com/x/{name}-server")),
            client: Some(format!("https://github.com/x/{name}-client")),
            rating: Some(3.5),
        }
    }

    #[tokio::test]
    async fn list_reflects_every_insert() {
        let svc = service();
        for name in ["alpha", "beta", "gamma"] {
            svc.create(project(name)).await.unwrap();
        }
        let mut names: Vec<_> = svc
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.fields.name)
            .collect();
        names.sort();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn create_accepts_absent_fields() {
        let svc = service();
        svc.create(ProjectFields::default()).await.unwrap();
        let listed = svc.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].fields, ProjectFields::default());
    }

    #[tokio::test]
    async fn rating_update_leaves_other_fields_untouched() {
        let svc = service();
        svc.create(project("alpha")).await.unwrap();
        let id = svc.list().await.unwrap()[0].id;

        let patch = ProjectPatch {
            rating: Some(Some(5.0)),
            ..Default::default()
        };
        svc.update(&id.to_hex(), patch).await.unwrap();

        let after = &svc.list().await.unwrap()[0];
        assert_eq!(after.fields.rating, Some(5.0));
        assert_eq!(
            ProjectFields {
                rating: Some(3.5),
                ..after.fields.clone()
            },
            project("alpha")
        );
    }

    #[tokio::test]
    async fn null_clears_a_field_on_an_existing_project() {
        let svc = service();
        svc.create(project("alpha")).await.unwrap();
        let id = svc.list().await.unwrap()[0].id.to_hex();

        let clear: ProjectPatch = serde_json::from_value(json!({ "live": null })).unwrap();
        svc.update(&id, clear.clone()).await.unwrap();

        let after = &svc.list().await.unwrap()[0];
        assert_eq!(after.fields.live, None);
        assert_eq!(after.fields.name.as_deref(), Some("alpha"));

        let err = svc.update(&id, clear).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn keys_outside_the_catalog_are_persisted() {
        let svc = service();
        svc.create(project("alpha")).await.unwrap();
        let id = svc.list().await.unwrap()[0].id.to_hex();

        let patch: ProjectPatch = serde_json::from_value(json!({ "featured": true })).unwrap();
        svc.update(&id, patch).await.unwrap();

        let after = &svc.list().await.unwrap()[0];
        assert_eq!(after.extra.get("featured"), Some(&json!(true)));
        assert_eq!(after.fields, project("alpha"));
    }

    #[tokio::test]
    async fn id_key_in_patch_is_rejected() {
        let svc = service();
        svc.create(project("alpha")).await.unwrap();
        let id = svc.list().await.unwrap()[0].id.to_hex();

        let patch: ProjectPatch =
            serde_json::from_value(json!({ "_id": ObjectId::new().to_hex() })).unwrap();
        let err = svc.update(&id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailure(_)));
        assert_eq!(svc.list().await.unwrap()[0].id.to_hex(), id);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let svc = service();
        let patch = ProjectPatch {
            rating: Some(Some(1.0)),
            ..Default::default()
        };
        let err = svc
            .update(&ObjectId::new().to_hex(), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_regardless_of_store_state() {
        let svc = service();
        svc.create(project("alpha")).await.unwrap();
        let err = svc
            .update("not-an-id", ProjectPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedIdentifier(_)));
        let err = svc.delete("not-an-id").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedIdentifier(_)));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_twice_reports_nothing_the_second_time() {
        let svc = service();
        svc.create(project("alpha")).await.unwrap();
        let id = svc.list().await.unwrap()[0].id.to_hex();

        let first = svc.delete(&id).await.unwrap();
        assert_eq!(first.deleted_count, 1);
        let second = svc.delete(&id).await.unwrap();
        assert_eq!(second.deleted_count, 0);
        assert!(second.acknowledged);
    }
}
