//! Component registry
//!
//! Maps type tags to factories so snapshot data can be turned back into live
//! components. Scripts are registered by script name under the `Script` tag.

use std::collections::HashMap;

use super::component::{Component, ComponentData, ComponentKind, ComponentType};
use super::components::{Camera, Light, MeshRenderer, Script, ScriptBehavior, Transform};
use crate::foundation::logging::debug;

type ComponentFactory = Box<dyn Fn(&ComponentData) -> Option<Box<dyn Component>>>;
type ScriptFactory = Box<dyn Fn() -> Box<dyn ScriptBehavior>>;

/// Factories for every component type a snapshot may contain
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
    scripts: HashMap<String, ScriptFactory>,
}

impl Default for ComponentRegistry {
    /// Registry knowing the built-in data components
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_default::<Transform>();
        registry.register_default::<Camera>();
        registry.register_default::<Light>();
        registry.register_default::<MeshRenderer>();
        registry
    }
}

impl ComponentRegistry {
    /// Registry without any factories
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            scripts: HashMap::new(),
        }
    }

    /// Register a factory for a type tag, replacing any previous one
    pub fn register<F>(&mut self, component_type: ComponentType, factory: F)
    where
        F: Fn(&ComponentData) -> Option<Box<dyn Component>> + 'static,
    {
        debug!("Registering component factory '{component_type}'");
        self.factories
            .insert(component_type.as_str().to_string(), Box::new(factory));
    }

    /// Register `T`: rebuilt from its default, then deserialized
    pub fn register_default<T: ComponentKind + Default>(&mut self) {
        self.register(T::TYPE, |data| {
            let mut component = T::default();
            component.deserialize(data);
            Some(Box::new(component) as Box<dyn Component>)
        });
    }

    /// Register a script behavior under its script name
    pub fn register_script<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ScriptBehavior> + 'static,
    {
        let name = name.into();
        debug!("Registering script '{name}'");
        self.scripts.insert(name, Box::new(factory));
    }

    /// Whether a type tag can be rebuilt
    pub fn contains(&self, type_tag: &str) -> bool {
        if type_tag == Script::TYPE.as_str() {
            !self.scripts.is_empty()
        } else {
            self.factories.contains_key(type_tag)
        }
    }

    /// Rebuild a component from its serialized form.
    ///
    /// Returns `None` for a missing or unknown type tag, or an unknown
    /// script name.
    pub fn create(&self, data: &ComponentData) -> Option<Box<dyn Component>> {
        let tag = data.type_tag()?;
        if tag == Script::TYPE.as_str() {
            let name = data.str_or("scriptName", "");
            let factory = self.scripts.get(&name)?;
            let mut script = Script::from_boxed(factory());
            script.deserialize(data);
            return Some(Box::new(script));
        }
        self.factories.get(tag).and_then(|factory| factory(data))
    }
}
