//! Scene snapshots
//!
//! A snapshot flattens a scene's forest into a pre-order list of entities.
//! Each entry names its parent by its snapshot id, which is enough to rebuild
//! the same topology with fresh ids. Every field has a default so partial or
//! older snapshots still load.

use serde::{Deserialize, Serialize};

use super::error::SceneError;
use crate::config::{Config, ConfigError, ConfigFormat};
use crate::ecs::ComponentData;

/// Serialized scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSnapshot {
    /// Id of the scene the snapshot was taken from
    pub id: u64,
    /// Scene name
    pub name: String,
    /// Every entity, parents before children
    pub entities: Vec<EntitySnapshot>,
}

/// Serialized entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySnapshot {
    /// Id at the time of the snapshot
    pub id: u64,
    /// Entity name
    pub name: String,
    /// Active flag
    pub active: bool,
    /// Tags in sorted order
    pub tags: Vec<String>,
    /// Snapshot id of the parent; `None` for roots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    /// Output of each component's `serialize`
    pub components: Vec<ComponentData>,
}

impl Default for EntitySnapshot {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            active: true,
            tags: Vec::new(),
            parent: None,
            components: Vec::new(),
        }
    }
}

impl Config for SceneSnapshot {}

fn snapshot_error(error: ConfigError) -> SceneError {
    SceneError::Snapshot(error.to_string())
}

impl SceneSnapshot {
    /// Pretty JSON text
    pub fn to_json(&self) -> Result<String, SceneError> {
        self.to_format(ConfigFormat::Json).map_err(snapshot_error)
    }

    /// Parse JSON text
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        Self::from_format(ConfigFormat::Json, text).map_err(snapshot_error)
    }

    /// Pretty RON text
    pub fn to_ron(&self) -> Result<String, SceneError> {
        self.to_format(ConfigFormat::Ron).map_err(snapshot_error)
    }

    /// Parse RON text
    pub fn from_ron(text: &str) -> Result<Self, SceneError> {
        Self::from_format(ConfigFormat::Ron, text).map_err(snapshot_error)
    }

    /// Number of root entries
    pub fn root_count(&self) -> usize {
        self.entities.iter().filter(|e| e.parent.is_none()).count()
    }
}
