//! In-memory resource store. Not durable; backs tests and database-less runs.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use tokio::sync::RwLock;

use super::repo::ProjectStore;
use super::repo_types::{DeleteOutcome, Project, ProjectFields, ProjectPatch, UpdateOutcome};
use crate::error::StoreResult;
use crate::object_id::ObjectId;

#[derive(Clone, Default)]
pub struct InMemoryProjectStore {
    projects: Arc<RwLock<HashMap<ObjectId, Project>>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn list(&self) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .values()
            .cloned()
            .collect())
    }

    async fn insert(&self, fields: ProjectFields) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        let project = Project {
            id,
            fields,
            extra: Map::new(),
        };
        self.projects.write().await.insert(id, project);
        Ok(id)
    }

    async fn update(&self, id: &ObjectId, patch: &ProjectPatch) -> StoreResult<UpdateOutcome> {
        let mut projects = self.projects.write().await;
        Ok(match projects.get_mut(id) {
            Some(project) => UpdateOutcome {
                matched_count: 1,
                modified_count: patch.apply(project) as u64,
            },
            None => UpdateOutcome {
                matched_count: 0,
                modified_count: 0,
            },
        })
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<DeleteOutcome> {
        let removed = self.projects.write().await.remove(id).is_some();
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: removed as u64,
        })
    }
}
