//! Entity implementation
//!
//! An entity owns its components, grouped by type tag in attach order. Its
//! place in the hierarchy (parent, children) is maintained by the scene's
//! [`EntityGraph`](crate::scene::EntityGraph), which exclusively owns every
//! entity it holds.

use std::collections::BTreeSet;
use std::fmt;

use super::component::{
    downcast_mut, downcast_ref, AttachedComponent, Component, ComponentKind, ComponentType,
};
use crate::foundation::ids::{ComponentId, EntityId, IdSource};

struct ComponentBucket {
    component_type: ComponentType,
    items: Vec<AttachedComponent>,
}

/// View over the other components of the entity being updated.
///
/// Handed to [`Component::on_update`]. The bucket of the component that is
/// updating is checked out for the duration of the call, so components of
/// its own type are not visible.
pub struct Siblings<'a> {
    entity: EntityId,
    buckets: &'a mut [ComponentBucket],
}

impl Siblings<'_> {
    /// The owning entity
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// First sibling of type `T`
    pub fn get<T: ComponentKind>(&self) -> Option<&T> {
        self.buckets
            .iter()
            .find(|b| b.component_type == T::TYPE)
            .and_then(|b| b.items.first())
            .and_then(|c| downcast_ref::<T>(c.component()))
    }

    /// First sibling of type `T`, mutably
    pub fn get_mut<T: ComponentKind>(&mut self) -> Option<&mut T> {
        self.buckets
            .iter_mut()
            .find(|b| b.component_type == T::TYPE)
            .and_then(|b| b.items.first_mut())
            .and_then(|c| downcast_mut::<T>(c.component_mut()))
    }

    /// Whether a sibling of the type is attached
    pub fn has_component(&self, component_type: ComponentType) -> bool {
        self.buckets
            .iter()
            .any(|b| b.component_type == component_type && !b.items.is_empty())
    }
}

/// A node of the scene tree owning zero or more components
pub struct Entity {
    id: EntityId,
    /// Human-readable name; not required to be unique
    pub name: String,
    /// Inactive entities skip their own and their children's updates
    pub active: bool,
    tags: BTreeSet<String>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    buckets: Vec<ComponentBucket>,
    ids: IdSource,
}

impl Entity {
    /// Create a standalone entity drawing ids from `ids`
    pub fn new(ids: &IdSource, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(ids.as_ref()),
            name: name.into(),
            active: true,
            tags: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
            buckets: Vec::new(),
            ids: IdSource::clone(ids),
        }
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Parent entity, `None` for roots and standalone entities
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Direct children in order
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: EntityId) {
        self.children.push(child);
    }

    pub(crate) fn unlink_child(&mut self, child: EntityId) -> bool {
        match self.children.iter().position(|&c| c == child) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_children(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.children)
    }

    // Tags

    /// Tags in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Add a tag; returns false if it was already present
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Remove a tag; returns whether it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Check for a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    // Components

    /// Attach a component, run its attach hook and return its id
    pub fn add_component(&mut self, component: impl Component) -> ComponentId {
        self.add_boxed_component(Box::new(component))
    }

    /// Attach an already boxed component
    pub fn add_boxed_component(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = ComponentId::generate(self.ids.as_ref());
        let component_type = component.component_type();
        let attached = AttachedComponent::new(id, self.id, component);

        let index = match self
            .buckets
            .iter()
            .position(|b| b.component_type == component_type)
        {
            Some(index) => index,
            None => {
                self.buckets.push(ComponentBucket {
                    component_type,
                    items: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };
        let items = &mut self.buckets[index].items;
        items.push(attached);
        if let Some(attached) = items.last_mut() {
            attached.attach();
        }
        id
    }

    fn bucket(&self, component_type: ComponentType) -> Option<&ComponentBucket> {
        self.buckets
            .iter()
            .find(|b| b.component_type == component_type)
    }

    /// First attached component of a type
    pub fn get_component(&self, component_type: ComponentType) -> Option<&AttachedComponent> {
        self.bucket(component_type).and_then(|b| b.items.first())
    }

    /// All attached components of a type, in attach order
    pub fn get_components(&self, component_type: ComponentType) -> &[AttachedComponent] {
        self.bucket(component_type).map_or(&[], |b| b.items.as_slice())
    }

    /// First component of type `T`, downcast
    pub fn get<T: ComponentKind>(&self) -> Option<&T> {
        self.get_component(T::TYPE)
            .and_then(|c| downcast_ref::<T>(c.component()))
    }

    /// First component of type `T`, downcast mutably
    pub fn get_mut<T: ComponentKind>(&mut self) -> Option<&mut T> {
        self.buckets
            .iter_mut()
            .find(|b| b.component_type == T::TYPE)
            .and_then(|b| b.items.first_mut())
            .and_then(|c| downcast_mut::<T>(c.component_mut()))
    }

    /// Every component of type `T`, in attach order
    pub fn get_all<T: ComponentKind>(&self) -> Vec<&T> {
        self.get_components(T::TYPE)
            .iter()
            .filter_map(|c| downcast_ref::<T>(c.component()))
            .collect()
    }

    /// Every attached component, grouped by type
    pub fn get_all_components(&self) -> impl Iterator<Item = &AttachedComponent> {
        self.buckets.iter().flat_map(|b| b.items.iter())
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }

    /// Look up an attached component by id
    pub fn component_by_id(&self, id: ComponentId) -> Option<&AttachedComponent> {
        self.get_all_components().find(|c| c.id() == id)
    }

    /// Mutable lookup by id
    pub fn component_by_id_mut(&mut self, id: ComponentId) -> Option<&mut AttachedComponent> {
        self.buckets
            .iter_mut()
            .flat_map(|b| b.items.iter_mut())
            .find(|c| c.id() == id)
    }

    /// Whether any component of the type is attached
    pub fn has_component(&self, component_type: ComponentType) -> bool {
        self.bucket(component_type).is_some()
    }

    /// Toggle per-frame updates of a component; false if it is not attached here
    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) -> bool {
        match self.component_by_id_mut(id) {
            Some(component) => {
                component.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Detach a component, running its detach hook.
    ///
    /// Returns the detached component, or `None` if it is not attached to
    /// this entity.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let (bucket_index, item_index) = self.buckets.iter().enumerate().find_map(|(b, bucket)| {
            bucket
                .items
                .iter()
                .position(|c| c.id() == id)
                .map(|i| (b, i))
        })?;

        let attached = self.buckets[bucket_index].items.remove(item_index);
        if self.buckets[bucket_index].items.is_empty() {
            self.buckets.remove(bucket_index);
        }
        Some(attached.detach())
    }

    /// Detach every component, running each detach hook once
    pub fn clear_components(&mut self) {
        for bucket in std::mem::take(&mut self.buckets) {
            for attached in bucket.items {
                drop(attached.detach());
            }
        }
    }

    /// Run `on_update` on every enabled component of this entity only.
    ///
    /// No-op while inactive. Children are driven by the graph.
    pub fn update(&mut self, delta_time: f32) {
        if !self.active {
            return;
        }
        for index in 0..self.buckets.len() {
            let mut items = std::mem::take(&mut self.buckets[index].items);
            let mut siblings = Siblings {
                entity: self.id,
                buckets: &mut self.buckets,
            };
            for component in &mut items {
                component.update(delta_time, &mut siblings);
            }
            self.buckets[index].items = items;
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .field("tags", &self.tags)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("components", &self.component_count())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ecs::component::{Capabilities, ComponentData};
    use crate::foundation::ids::SequentialIds;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared event log for hook ordering assertions
    pub(crate) type EventLog = Rc<RefCell<Vec<String>>>;

    /// Component recording its hooks into a shared log
    pub(crate) struct Tracker {
        pub label: String,
        pub log: EventLog,
        pub updates: u32,
    }

    impl Tracker {
        pub(crate) const TYPE: ComponentType = ComponentType::new("Tracker");

        pub(crate) fn new(label: &str, log: &EventLog) -> Self {
            Self {
                label: label.to_string(),
                log: Rc::clone(log),
                updates: 0,
            }
        }
    }

    impl Component for Tracker {
        fn component_type(&self) -> ComponentType {
            Self::TYPE
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::all()
        }

        fn on_attach(&mut self, _owner: EntityId) {
            self.log.borrow_mut().push(format!("attach:{}", self.label));
        }

        fn on_detach(&mut self) {
            self.log.borrow_mut().push(format!("detach:{}", self.label));
        }

        fn on_update(&mut self, _delta_time: f32, _siblings: &mut Siblings<'_>) {
            self.updates += 1;
            self.log.borrow_mut().push(format!("update:{}", self.label));
        }

        fn serialize(&self) -> ComponentData {
            ComponentData::new(Self::TYPE).with("label", self.label.clone())
        }

        fn deserialize(&mut self, data: &ComponentData) {
            self.label = data.str_or("label", "tracker");
        }
    }

    impl ComponentKind for Tracker {
        const TYPE: ComponentType = Tracker::TYPE;
    }

    /// Component declaring no capabilities at all
    struct Passive {
        touched: bool,
    }

    impl Component for Passive {
        fn component_type(&self) -> ComponentType {
            ComponentType::new("Passive")
        }

        fn on_update(&mut self, _delta_time: f32, _siblings: &mut Siblings<'_>) {
            self.touched = true;
        }

        fn serialize(&self) -> ComponentData {
            ComponentData::new(self.component_type())
        }

        fn deserialize(&mut self, _data: &ComponentData) {}
    }

    pub(crate) fn new_log() -> EventLog {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn entity(name: &str) -> Entity {
        Entity::new(&SequentialIds::shared(), name)
    }

    #[test]
    fn test_add_component_sets_owner_and_attaches() {
        let log = new_log();
        let mut e = entity("player");
        let id = e.add_component(Tracker::new("a", &log));

        let attached = e.component_by_id(id).unwrap();
        assert_eq!(attached.owner(), e.id());
        assert!(attached.is_enabled());
        assert_eq!(*log.borrow(), vec!["attach:a"]);
    }

    #[test]
    fn test_duplicates_allowed_first_wins() {
        let log = new_log();
        let mut e = entity("e");
        e.add_component(Tracker::new("first", &log));
        e.add_component(Tracker::new("second", &log));

        assert_eq!(e.get::<Tracker>().unwrap().label, "first");
        let labels: Vec<_> = e.get_all::<Tracker>().iter().map(|p| p.label.clone()).collect();
        assert_eq!(labels, vec!["first", "second"]);
        assert_eq!(e.get_components(Tracker::TYPE).len(), 2);
    }

    #[test]
    fn test_missing_type_lookups() {
        let e = entity("empty");
        assert!(e.get_component(Tracker::TYPE).is_none());
        assert!(e.get_components(Tracker::TYPE).is_empty());
        assert!(!e.has_component(Tracker::TYPE));
    }

    #[test]
    fn test_remove_component_detaches_once() {
        let log = new_log();
        let mut e = entity("e");
        let a = e.add_component(Tracker::new("a", &log));
        let b = e.add_component(Tracker::new("b", &log));

        assert!(e.remove_component(a).is_some());
        assert!(e.remove_component(a).is_none());
        assert_eq!(e.component_count(), 1);
        assert_eq!(e.get_all_components().next().map(AttachedComponent::id), Some(b));

        let detaches = log.borrow().iter().filter(|l| l.starts_with("detach")).count();
        assert_eq!(detaches, 1);
    }

    #[test]
    fn test_remove_component_from_other_entity_is_rejected() {
        let log = new_log();
        let ids = SequentialIds::shared();
        let mut a = Entity::new(&ids, "a");
        let mut b = Entity::new(&ids, "b");
        let id = a.add_component(Tracker::new("p", &log));

        assert!(b.remove_component(id).is_none());
        assert_eq!(a.component_count(), 1);
    }

    #[test]
    fn test_remove_last_of_type_drops_bucket() {
        let log = new_log();
        let mut e = entity("e");
        let id = e.add_component(Tracker::new("a", &log));
        e.remove_component(id);
        assert!(!e.has_component(Tracker::TYPE));
    }

    #[test]
    fn test_random_add_remove_sequence_tracks_attached_set() {
        let log = new_log();
        let mut e = entity("e");
        let mut attached: Vec<ComponentId> = Vec::new();
        let mut removed = 0;
        let mut rng = fastrand::Rng::with_seed(7);

        for step in 0..200 {
            if attached.is_empty() || rng.bool() {
                attached.push(e.add_component(Tracker::new(&format!("c{step}"), &log)));
            } else {
                let id = attached.swap_remove(rng.usize(..attached.len()));
                assert!(e.remove_component(id).is_some());
                removed += 1;
            }
            let mut current: Vec<_> = e.get_all_components().map(AttachedComponent::id).collect();
            let mut expected = attached.clone();
            current.sort();
            expected.sort();
            assert_eq!(current, expected);
        }

        let detaches = log.borrow().iter().filter(|l| l.starts_with("detach")).count();
        assert_eq!(detaches, removed);
    }

    #[test]
    fn test_update_respects_enabled_and_active() {
        let log = new_log();
        let mut e = entity("e");
        let a = e.add_component(Tracker::new("a", &log));
        e.add_component(Tracker::new("b", &log));

        e.update(0.016);
        assert!(e.set_component_enabled(a, false));
        e.update(0.016);
        e.active = false;
        e.update(0.016);

        let updates: Vec<_> = log
            .borrow()
            .iter()
            .filter(|l| l.starts_with("update"))
            .cloned()
            .collect();
        assert_eq!(updates, vec!["update:a", "update:b", "update:b"]);
    }

    #[test]
    fn test_undeclared_hooks_are_not_called() {
        let mut e = entity("e");
        let id = e.add_component(Passive { touched: false });
        e.update(1.0);
        let passive = e.component_by_id(id).unwrap().component();
        let passive = downcast_ref::<Passive>(passive).unwrap();
        assert!(!passive.touched);
    }

    #[test]
    fn test_clear_components_detaches_all() {
        let log = new_log();
        let mut e = entity("e");
        e.add_component(Tracker::new("a", &log));
        e.add_component(Tracker::new("b", &log));
        e.clear_components();
        assert_eq!(e.component_count(), 0);
        let detaches: Vec<_> = log
            .borrow()
            .iter()
            .filter(|l| l.starts_with("detach"))
            .cloned()
            .collect();
        assert_eq!(detaches, vec!["detach:a", "detach:b"]);
    }

    #[test]
    fn test_tags() {
        let mut e = entity("e");
        assert!(e.add_tag("enemy"));
        assert!(!e.add_tag("enemy"));
        e.add_tag("boss");
        assert!(e.has_tag("enemy"));
        assert_eq!(e.tags().collect::<Vec<_>>(), vec!["boss", "enemy"]);
        assert!(e.remove_tag("enemy"));
        assert!(!e.has_tag("enemy"));
    }
}
