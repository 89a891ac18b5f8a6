//! Scene management
//!
//! A [`Scene`] owns its entities through an [`EntityGraph`] arena and keeps
//! an ordered list of root entities:
//!
//! ```text
//! Scene
//!  ├─ roots: [camera, light, cube]      (indexed by id)
//!  └─ EntityGraph
//!       camera ─ arm ─ hand             (reached by traversal)
//! ```
//!
//! Snapshots flatten the forest for persistence and rebuild it through a
//! [`ComponentRegistry`](crate::ecs::ComponentRegistry).

mod error;
#[allow(clippy::module_inception)]
mod scene;
mod scene_graph;
mod snapshot;

pub use error::SceneError;
pub use scene::{Scene, SceneHooks};
pub use scene_graph::EntityGraph;
pub use snapshot::{EntitySnapshot, SceneSnapshot};
