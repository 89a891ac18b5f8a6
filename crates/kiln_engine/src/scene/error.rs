//! Scene errors

use crate::foundation::ids::EntityId;

/// Failures of scene and hierarchy operations
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// An id that is not part of the scene
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// Parenting that would make an entity its own ancestor
    #[error("Cannot parent {child} under {parent}: would create a cycle")]
    HierarchyCycle {
        /// Requested parent
        parent: EntityId,
        /// Requested child
        child: EntityId,
    },

    /// A load or unload hook failed
    #[error("Scene load failed: {0}")]
    LoadFailed(String),

    /// Snapshot text could not be parsed or produced
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
