//! Entity-Component-System implementation
//!
//! Component and system contracts, the entity container, built-in
//! components, the component registry used to rebuild snapshots, and the
//! priority-ordered system scheduler.

pub mod component;
pub mod components;
pub mod entity;
pub mod registry;
pub mod scheduler;
pub mod system;

pub use component::{
    downcast_mut, downcast_ref, AsAny, AttachedComponent, Capabilities, Component, ComponentData,
    ComponentKind, ComponentType,
};
pub use entity::{Entity, Siblings};
pub use registry::ComponentRegistry;
pub use scheduler::{SystemFault, SystemScheduler};
pub use system::{names, System, SystemError};
