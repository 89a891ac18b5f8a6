//! Component trait and supporting types
//!
//! A component is a typed unit of data and behaviour attached to exactly one
//! entity. Its optional hooks are declared up front through [`Capabilities`]
//! and read once when the component is attached.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;

use super::entity::Siblings;
use crate::foundation::ids::{ComponentId, EntityId};
use crate::foundation::math::Vec3;

/// String discriminator grouping components by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(&'static str);

impl ComponentType {
    /// Declare a component type tag
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    /// The tag text
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

bitflags! {
    /// Optional hooks a component implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// `on_attach` is called after the component is registered with its entity
        const ATTACH = 1 << 0;
        /// `on_detach` is called on removal or entity destruction
        const DETACH = 1 << 1;
        /// `on_update` is called every frame while attached and enabled
        const UPDATE = 1 << 2;
    }
}

/// Object-safe access to `Any` for trait objects
pub trait AsAny: Any {
    /// Upcast to `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Upcast to `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Contract every component satisfies
pub trait Component: AsAny {
    /// Type tag used for grouping and lookups
    fn component_type(&self) -> ComponentType;

    /// Hooks this component wants called. Read once, at attach time.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Called once, right after the component is registered with `owner`
    fn on_attach(&mut self, _owner: EntityId) {}

    /// Release everything acquired since attach
    fn on_detach(&mut self) {}

    /// Per-frame behaviour; `delta_time` is scaled, non-negative seconds.
    /// `siblings` reaches the owning entity's other components.
    fn on_update(&mut self, _delta_time: f32, _siblings: &mut Siblings<'_>) {}

    /// Persisted fields, including the `type` key
    fn serialize(&self) -> ComponentData;

    /// Restore fields from `data`, substituting defaults for anything missing
    fn deserialize(&mut self, data: &ComponentData);
}

/// Components with a compile-time type tag, enabling typed lookups
pub trait ComponentKind: Component + Sized {
    /// Tag shared by every instance of this type
    const TYPE: ComponentType;
}

/// Downcast a component trait object to its concrete type
pub fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

/// Mutable variant of [`downcast_ref`]
pub fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}

/// A component registered with an entity.
///
/// The owner and id are fixed when the component is attached and cannot be
/// reassigned while it stays attached.
pub struct AttachedComponent {
    id: ComponentId,
    owner: EntityId,
    enabled: bool,
    capabilities: Capabilities,
    inner: Box<dyn Component>,
}

impl AttachedComponent {
    pub(crate) fn new(id: ComponentId, owner: EntityId, inner: Box<dyn Component>) -> Self {
        let capabilities = inner.capabilities();
        Self {
            id,
            owner,
            enabled: true,
            capabilities,
            inner,
        }
    }

    /// Component id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Entity the component is attached to
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Whether per-frame updates run
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Capabilities captured at attach time
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Type tag of the wrapped component
    pub fn component_type(&self) -> ComponentType {
        self.inner.component_type()
    }

    /// The wrapped component
    pub fn component(&self) -> &dyn Component {
        self.inner.as_ref()
    }

    /// The wrapped component, mutably
    pub fn component_mut(&mut self) -> &mut dyn Component {
        self.inner.as_mut()
    }

    pub(crate) fn attach(&mut self) {
        if self.capabilities.contains(Capabilities::ATTACH) {
            self.inner.on_attach(self.owner);
        }
    }

    pub(crate) fn update(&mut self, delta_time: f32, siblings: &mut Siblings<'_>) {
        if self.enabled && self.capabilities.contains(Capabilities::UPDATE) {
            self.inner.on_update(delta_time, siblings);
        }
    }

    /// Run the detach hook and hand back the component
    pub(crate) fn detach(mut self) -> Box<dyn Component> {
        if self.capabilities.contains(Capabilities::DETACH) {
            self.inner.on_detach();
        }
        self.inner
    }
}

impl fmt::Debug for AttachedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedComponent")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("type", &self.component_type())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Serialized component fields.
///
/// A JSON object carrying the component's `type` tag plus its fields. The
/// typed getters never fail: missing or mistyped values yield the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentData(Map<String, Value>);

impl ComponentData {
    /// Key holding the type tag
    pub const TYPE_KEY: &'static str = "type";

    /// Start a mapping tagged with `component_type`
    pub fn new(component_type: ComponentType) -> Self {
        let mut map = Map::new();
        map.insert(
            Self::TYPE_KEY.to_string(),
            Value::String(component_type.as_str().to_string()),
        );
        Self(map)
    }

    /// Wrap an existing JSON object
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The type tag, if present
    pub fn type_tag(&self) -> Option<&str> {
        self.0.get(Self::TYPE_KEY).and_then(Value::as_str)
    }

    /// Builder: set a field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder: set a vector field as `{x, y, z}`
    pub fn with_vec3(mut self, key: &str, value: Vec3) -> Self {
        let mut map = Map::new();
        map.insert("x".into(), Value::from(value.x));
        map.insert("y".into(), Value::from(value.y));
        map.insert("z".into(), Value::from(value.z));
        self.0.insert(key.to_string(), Value::Object(map));
        self
    }

    /// Set a field
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number field; integers and numeric strings are coerced
    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_f64().map_or(default, |v| v as f32),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Boolean field
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// String field
    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// Vector field stored as `{x, y, z}` or `[x, y, z]`; missing axes keep
    /// the default's value
    pub fn vec3_or(&self, key: &str, default: Vec3) -> Vec3 {
        let axis = |value: Option<&Value>, fallback: f32| {
            value.and_then(Value::as_f64).map_or(fallback, |v| v as f32)
        };
        match self.0.get(key) {
            Some(Value::Object(map)) => Vec3::new(
                axis(map.get("x"), default.x),
                axis(map.get("y"), default.y),
                axis(map.get("z"), default.z),
            ),
            Some(Value::Array(items)) => Vec3::new(
                axis(items.first(), default.x),
                axis(items.get(1), default.y),
                axis(items.get(2), default.z),
            ),
            _ => default,
        }
    }

    /// Underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}
