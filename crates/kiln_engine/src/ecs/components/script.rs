//! Script component
//!
//! Hosts user game logic. A [`ScriptBehavior`] supplies the hooks; the
//! [`Script`] component maps them onto the component lifecycle: attach runs
//! `on_awake` then `on_start`, every frame runs `update`, detach runs
//! `on_destroy`. Per-frame updates reach the owning entity's other
//! components through [`Siblings`].

use crate::ecs::component::{Capabilities, Component, ComponentData, ComponentKind, ComponentType};
use crate::ecs::entity::Siblings;
use crate::foundation::ids::EntityId;

/// User logic driven by a [`Script`] component
pub trait ScriptBehavior: 'static {
    /// Name recorded in snapshots and used to rebuild the script
    fn script_name(&self) -> &str;

    /// Called once when attached
    fn on_awake(&mut self, _entity: EntityId) {}

    /// Called right after `on_awake`
    fn on_start(&mut self) {}

    /// Called every frame while enabled
    fn update(&mut self, _delta_time: f32, _entity: &mut Siblings<'_>) {}

    /// Called once when detached
    fn on_destroy(&mut self) {}
}

/// Component running a [`ScriptBehavior`]
pub struct Script {
    behavior: Box<dyn ScriptBehavior>,
    entity: Option<EntityId>,
}

impl Script {
    /// Wrap a behavior
    pub fn new(behavior: impl ScriptBehavior) -> Self {
        Self::from_boxed(Box::new(behavior))
    }

    /// Wrap an already boxed behavior
    pub fn from_boxed(behavior: Box<dyn ScriptBehavior>) -> Self {
        Self {
            behavior,
            entity: None,
        }
    }

    /// Name of the hosted behavior
    pub fn script_name(&self) -> &str {
        self.behavior.script_name()
    }

    /// Entity the script is attached to
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// The hosted behavior
    pub fn behavior(&self) -> &dyn ScriptBehavior {
        self.behavior.as_ref()
    }

    /// The hosted behavior, mutably
    pub fn behavior_mut(&mut self) -> &mut dyn ScriptBehavior {
        self.behavior.as_mut()
    }
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("script_name", &self.script_name())
            .field("entity", &self.entity)
            .finish()
    }
}

impl Component for Script {
    fn component_type(&self) -> ComponentType {
        Self::TYPE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn on_attach(&mut self, owner: EntityId) {
        self.entity = Some(owner);
        self.behavior.on_awake(owner);
        self.behavior.on_start();
    }

    fn on_detach(&mut self) {
        self.behavior.on_destroy();
        self.entity = None;
    }

    fn on_update(&mut self, delta_time: f32, siblings: &mut Siblings<'_>) {
        self.behavior.update(delta_time, siblings);
    }

    fn serialize(&self) -> ComponentData {
        ComponentData::new(Self::TYPE).with("scriptName", self.script_name().to_string())
    }

    /// Script state is not persisted; the behavior is chosen by name when the
    /// component is rebuilt through the registry.
    fn deserialize(&mut self, _data: &ComponentData) {}
}

impl ComponentKind for Script {
    const TYPE: ComponentType = ComponentType::new("Script");
}
