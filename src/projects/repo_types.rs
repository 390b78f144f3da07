use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};

use crate::object_id::ObjectId;

/// Catalog attributes of a project. Every field is optional; absent fields
/// are stored as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFields {
    pub image: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub live: Option<String>,
    pub server: Option<String>,
    pub client: Option<String>,
    pub rating: Option<f64>,
}

/// Stored project. Keys written by updates outside the catalog attributes
/// live in `extra` and serialize next to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(flatten)]
    pub fields: ProjectFields,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A present key decodes to `Some`, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sparse overrides for a project. Outer `None` means the key was absent,
/// `Some(None)` an explicit `null`. Unrecognised keys land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub live: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub server: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub client: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectPatch {
    /// Overwrites every key present in the patch. Returns whether any stored
    /// value actually changed.
    pub fn apply(&self, target: &mut Project) -> bool {
        fn set<T: Clone + PartialEq>(slot: &mut Option<T>, value: &Option<Option<T>>) -> bool {
            match value {
                Some(v) if slot != v => {
                    *slot = v.clone();
                    true
                }
                _ => false,
            }
        }

        let fields = &mut target.fields;
        // Non-short-circuiting `|` so every present field is written.
        let mut changed = set(&mut fields.image, &self.image)
            | set(&mut fields.category, &self.category)
            | set(&mut fields.name, &self.name)
            | set(&mut fields.live, &self.live)
            | set(&mut fields.server, &self.server)
            | set(&mut fields.client, &self.client)
            | set(&mut fields.rating, &self.rating);

        for (key, value) in &self.extra {
            if target.extra.get(key) != Some(value) {
                target.extra.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Counts reported by a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Raw result of a delete, returned to the caller as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[derive(Debug, FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub live: Option<String>,
    pub server: Option<String>,
    pub client: Option<String>,
    pub rating: Option<f64>,
    pub extra: Json<Map<String, Value>>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = anyhow::Error;

    fn try_from(r: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id.parse()?,
            fields: ProjectFields {
                image: r.image,
                category: r.category,
                name: r.name,
                live: r.live,
                server: r.server,
                client: r.client,
                rating: r.rating,
            },
            extra: r.extra.0,
        })
    }
}
