//! # Kiln Engine
//!
//! An entity/component scene engine driven by a priority-ordered system
//! scheduler and a timed game loop.
//!
//! ## Features
//!
//! - **Entities and components**: hierarchical entities owning typed
//!   components with attach, update and detach hooks
//! - **Scenes**: a forest of entities with lifecycle hooks, queries and
//!   JSON/RON snapshots
//! - **Systems**: named services updated each tick in priority order
//! - **Game loop**: time scaling, pausing, fps counting and frame limiting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kiln_engine::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new();
//!     engine.register_system(HeadlessRenderer::new());
//!     engine.initialize(EngineConfig::default()).await?;
//!
//!     let mut scene = Scene::new("Main");
//!     let camera = scene.create_entity("Camera");
//!     scene.add_root(camera)?;
//!     engine.load_scene(scene).await?;
//!
//!     engine.handle().stop();
//!     engine.run().await?;
//!     engine.shutdown().await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod core;
pub mod ecs;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineCommand, EngineError, EngineHandle, EngineState, TickReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ConfigFormat},
        core::{EngineConfig, FaultPolicy},
        ecs::{
            components::{Camera, Light, LightType, MeshRenderer, Script, ScriptBehavior, Transform},
            Component, ComponentData, ComponentKind, ComponentRegistry, ComponentType, Entity, Siblings,
            System, SystemError,
        },
        foundation::{
            ids::{ComponentId, EntityId, SceneId},
            math::{Vec2, Vec3},
        },
        input::{ActionBindings, InputEvent, InputSystem, KeyCode, MouseButton},
        render::{HeadlessRenderer, RenderStats, Renderer},
        scene::{Scene, SceneError, SceneHooks, SceneSnapshot},
        Engine, EngineCommand, EngineError, EngineHandle, EngineState,
    };
}
