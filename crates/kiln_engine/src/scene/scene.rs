//! Scene container
//!
//! A scene owns a forest of root entities (plus any detached entities created
//! but not yet parented), answers queries over it and has a load/unload
//! lifecycle driven by the engine.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::error::SceneError;
use super::scene_graph::EntityGraph;
use super::snapshot::{EntitySnapshot, SceneSnapshot};
use crate::ecs::{ComponentRegistry, ComponentType, Entity};
use crate::foundation::ids::{default_id_source, EntityId, IdSource, SceneId};
use crate::foundation::logging::{debug, warn};

/// Scene-specific behaviour attached to a [`Scene`].
///
/// `on_load` typically populates the scene; `on_unload` runs before the
/// scene's entities are destroyed.
#[async_trait(?Send)]
pub trait SceneHooks {
    /// Called by [`Scene::load`] before the scene is marked loaded
    async fn on_load(&mut self, _scene: &mut Scene) -> Result<(), SceneError> {
        Ok(())
    }

    /// Called by [`Scene::unload`] before entities are destroyed
    async fn on_unload(&mut self, _scene: &mut Scene) -> Result<(), SceneError> {
        Ok(())
    }

    /// The scene became current
    fn on_activate(&mut self, _scene: &mut Scene) {}

    /// The scene stops being current
    fn on_deactivate(&mut self, _scene: &mut Scene) {}
}

/// Loadable container of entities
pub struct Scene {
    id: SceneId,
    /// Scene name
    pub name: String,
    graph: EntityGraph,
    roots: Vec<EntityId>,
    index: HashSet<EntityId>,
    loaded: bool,
    hooks: Option<Box<dyn SceneHooks>>,
}

impl Scene {
    /// Create an unloaded, empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_ids(name, default_id_source())
    }

    /// Create a scene drawing scene, entity and component ids from `ids`
    pub fn with_ids(name: impl Into<String>, ids: IdSource) -> Self {
        Self {
            id: SceneId::generate(ids.as_ref()),
            name: name.into(),
            graph: EntityGraph::new(ids),
            roots: Vec::new(),
            index: HashSet::new(),
            loaded: false,
            hooks: None,
        }
    }

    /// Builder: attach scene hooks
    pub fn with_hooks(mut self, hooks: impl SceneHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Replace the scene hooks
    pub fn set_hooks(&mut self, hooks: Box<dyn SceneHooks>) {
        self.hooks = Some(hooks);
    }

    /// Scene id
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Whether `load` has completed and `unload` has not run since
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Id source shared by the scene's entities
    pub fn id_source(&self) -> &IdSource {
        self.graph.id_source()
    }

    /// Root entities in order
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Number of entities owned by the scene, detached ones included
    pub fn entity_count(&self) -> usize {
        self.graph.len()
    }

    // Structure

    /// Create a detached entity owned by the scene.
    ///
    /// It is not updated or queried until it becomes a root or a descendant
    /// of one.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.graph.spawn(name)
    }

    /// Take ownership of a standalone entity and append it as a root
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = self.graph.insert(entity);
        self.push_root(id);
        id
    }

    /// Make an entity already owned by the scene a root, detaching it from
    /// its parent if it has one
    pub fn add_root(&mut self, id: EntityId) -> Result<(), SceneError> {
        let parent = self
            .graph
            .get(id)
            .ok_or(SceneError::UnknownEntity(id))?
            .parent();
        if let Some(parent) = parent {
            self.graph.remove_child(parent, id);
        }
        self.push_root(id);
        Ok(())
    }

    fn push_root(&mut self, id: EntityId) {
        if self.index.insert(id) {
            self.roots.push(id);
        }
    }

    fn drop_root(&mut self, id: EntityId) -> bool {
        if !self.index.remove(&id) {
            return false;
        }
        self.roots.retain(|&root| root != id);
        true
    }

    /// Remove a root entity and destroy it with its subtree.
    ///
    /// Returns false if `id` is not a root of this scene.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if !self.drop_root(id) {
            return false;
        }
        self.graph.destroy(id);
        true
    }

    /// Destroy any entity owned by the scene with its subtree
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        self.drop_root(id);
        self.graph.destroy(id).is_some()
    }

    /// Parent `child` under `parent`; a root child stops being a root
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), SceneError> {
        self.graph.add_child(parent, child)?;
        self.drop_root(child);
        Ok(())
    }

    /// Detach a direct child; it stays owned by the scene, detached
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        self.graph.remove_child(parent, child)
    }

    /// First direct child of `parent` with the given name
    pub fn find_child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.graph.find_child(parent, name)
    }

    /// Any entity owned by the scene
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.graph.get(id)
    }

    /// Any entity owned by the scene, mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.graph.get_mut(id)
    }

    // Queries

    /// Root entity by id. Descendants are not indexed.
    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        if self.index.contains(&id) {
            self.graph.get(id)
        } else {
            None
        }
    }

    /// Mutable root lookup
    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if self.index.contains(&id) {
            self.graph.get_mut(id)
        } else {
            None
        }
    }

    /// First root with the given name, in root order
    pub fn find_entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.roots
            .iter()
            .filter_map(|&id| self.graph.get(id))
            .find(|e| e.name == name)
    }

    /// Ids of every root and descendant, depth-first pre-order
    pub fn traverse(&self) -> Vec<EntityId> {
        self.roots
            .iter()
            .flat_map(|&root| self.graph.preorder(root))
            .collect()
    }

    fn collect<F>(&self, mut predicate: F) -> Vec<&Entity>
    where
        F: FnMut(&Entity) -> bool,
    {
        self.traverse()
            .into_iter()
            .filter_map(|id| self.graph.get(id))
            .filter(|e| predicate(e))
            .collect()
    }

    /// Every entity in the forest carrying `tag`, in traversal order
    pub fn find_entities_by_tag(&self, tag: &str) -> Vec<&Entity> {
        self.collect(|e| e.has_tag(tag))
    }

    /// Every entity in the forest with a component of the type, in
    /// traversal order
    pub fn find_entities_with_component(&self, component_type: ComponentType) -> Vec<&Entity> {
        self.collect(|e| e.has_component(component_type))
    }

    // Lifecycle

    /// Update every root's subtree, in root order
    pub fn update(&mut self, delta_time: f32) {
        for &root in &self.roots {
            self.graph.update_subtree(root, delta_time);
        }
    }

    /// Load the scene. No-op when already loaded.
    pub async fn load(&mut self) -> Result<(), SceneError> {
        if self.loaded {
            return Ok(());
        }
        if let Some(mut hooks) = self.hooks.take() {
            let result = hooks.on_load(self).await;
            self.hooks = Some(hooks);
            result?;
        }
        self.loaded = true;
        debug!("Scene '{}' loaded with {} entities", self.name, self.graph.len());
        Ok(())
    }

    /// Unload the scene, destroying every entity. No-op when not loaded.
    pub async fn unload(&mut self) -> Result<(), SceneError> {
        if !self.loaded {
            return Ok(());
        }
        if let Some(mut hooks) = self.hooks.take() {
            let result = hooks.on_unload(self).await;
            self.hooks = Some(hooks);
            result?;
        }
        self.clear();
        self.loaded = false;
        debug!("Scene '{}' unloaded", self.name);
        Ok(())
    }

    fn clear(&mut self) {
        for root in std::mem::take(&mut self.roots) {
            self.graph.destroy(root);
        }
        self.index.clear();
        self.graph.clear();
    }

    /// Notify the hooks that the scene became current
    pub fn activate(&mut self) {
        if let Some(mut hooks) = self.hooks.take() {
            hooks.on_activate(self);
            self.hooks = Some(hooks);
        }
    }

    /// Notify the hooks that the scene stops being current
    pub fn deactivate(&mut self) {
        if let Some(mut hooks) = self.hooks.take() {
            hooks.on_deactivate(self);
            self.hooks = Some(hooks);
        }
    }

    // Snapshots

    /// Capture the forest; detached entities are not included
    pub fn serialize(&self) -> SceneSnapshot {
        let entities = self
            .traverse()
            .into_iter()
            .filter_map(|id| self.graph.get(id))
            .map(|entity| EntitySnapshot {
                id: entity.id().raw(),
                name: entity.name.clone(),
                active: entity.active,
                tags: entity.tags().map(str::to_string).collect(),
                parent: entity.parent().map(EntityId::raw),
                components: entity
                    .get_all_components()
                    .map(|c| c.component().serialize())
                    .collect(),
            })
            .collect();

        SceneSnapshot {
            id: self.id.raw(),
            name: self.name.clone(),
            entities,
        }
    }

    /// Replace the scene's content with a snapshot.
    ///
    /// Existing entities are destroyed first. Entities get fresh ids;
    /// parent links are resolved through the snapshot ids. Entries whose
    /// parent is missing become roots, and components with unknown types
    /// are skipped. The scene keeps its own id and loaded flag.
    pub fn deserialize(&mut self, snapshot: &SceneSnapshot, registry: &ComponentRegistry) {
        self.clear();
        if !snapshot.name.is_empty() {
            self.name = snapshot.name.clone();
        }

        let mut remap = HashMap::with_capacity(snapshot.entities.len());
        let mut created = Vec::with_capacity(snapshot.entities.len());
        for entry in &snapshot.entities {
            let mut entity = Entity::new(self.graph.id_source(), entry.name.clone());
            entity.active = entry.active;
            for tag in &entry.tags {
                entity.add_tag(tag.clone());
            }
            for data in &entry.components {
                match registry.create(data) {
                    Some(component) => {
                        entity.add_boxed_component(component);
                    }
                    None => warn!(
                        "Skipping component of unknown type {:?} on '{}'",
                        data.type_tag().unwrap_or("<missing>"),
                        entry.name
                    ),
                }
            }
            let id = self.graph.insert(entity);
            remap.insert(entry.id, id);
            created.push(id);
        }

        for (entry, &id) in snapshot.entities.iter().zip(&created) {
            let parent = entry.parent.and_then(|p| remap.get(&p).copied());
            let linked = match parent {
                Some(parent) => self.graph.add_child(parent, id).is_ok(),
                None => false,
            };
            if !linked {
                self.push_root(id);
            }
        }
        debug!(
            "Scene '{}' restored {} entities ({} roots)",
            self.name,
            created.len(),
            self.roots.len()
        );
    }

    /// Build a new scene from a snapshot
    pub fn from_snapshot(
        snapshot: &SceneSnapshot,
        registry: &ComponentRegistry,
        ids: IdSource,
    ) -> Self {
        let mut scene = Self::with_ids(snapshot.name.clone(), ids);
        scene.deserialize(snapshot, registry);
        scene
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("roots", &self.roots)
            .field("entities", &self.graph.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Camera, Light, LightType, MeshRenderer, Transform};
    use crate::ecs::entity::tests::{new_log, EventLog, Tracker};
    use crate::ecs::ComponentKind;
    use crate::foundation::ids::SequentialIds;
    use crate::foundation::math::Vec3;
    use std::collections::BTreeSet;

    fn scene() -> Scene {
        Scene::with_ids("Test", SequentialIds::shared())
    }

    fn named(scene: &Scene, name: &str) -> Entity {
        Entity::new(scene.id_source(), name)
    }

    struct Populate {
        log: EventLog,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl SceneHooks for Populate {
        async fn on_load(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
            self.log.borrow_mut().push("on_load".into());
            if self.fail {
                return Err(SceneError::LoadFailed("missing asset".into()));
            }
            let mut player = Entity::new(scene.id_source(), "Player");
            player.add_component(Tracker::new("player", &self.log));
            scene.add_entity(player);
            Ok(())
        }

        async fn on_unload(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
            self.log
                .borrow_mut()
                .push(format!("on_unload:{}", scene.entity_count()));
            Ok(())
        }

        fn on_activate(&mut self, _scene: &mut Scene) {
            self.log.borrow_mut().push("activate".into());
        }
    }

    #[test]
    fn test_index_holds_roots_only() {
        let mut s = scene();
        let root = s.add_entity(named(&s, "root"));
        let child = s.create_entity("child");
        s.add_child(root, child).unwrap();

        assert!(s.find_entity(root).is_some());
        assert!(s.find_entity(child).is_none());
        assert!(s.entity(child).is_some());
        assert!(s.find_entity_by_name("child").is_none());
        assert_eq!(s.find_entity_by_name("root").map(Entity::id), Some(root));
    }

    #[test]
    fn test_tag_and_component_queries_traverse_descendants() {
        let mut s = scene();
        let a = s.add_entity(named(&s, "a"));
        let a1 = s.create_entity("a1");
        let b = s.add_entity(named(&s, "b"));
        s.add_child(a, a1).unwrap();
        for id in [a1, b] {
            let e = s.entity_mut(id).unwrap();
            e.add_tag("enemy");
            e.add_component(MeshRenderer::new("cube", "red"));
        }

        let tagged: Vec<_> = s.find_entities_by_tag("enemy").iter().map(|e| e.id()).collect();
        assert_eq!(tagged, vec![a1, b]);
        let meshes: Vec<_> = s
            .find_entities_with_component(MeshRenderer::TYPE)
            .iter()
            .map(|e| e.id())
            .collect();
        assert_eq!(meshes, vec![a1, b]);
        assert!(s.find_entities_by_tag("friend").is_empty());
    }

    #[test]
    fn test_remove_entity_destroys_roots_only() {
        let log = new_log();
        let mut s = scene();
        let mut root = named(&s, "root");
        root.add_component(Tracker::new("root", &log));
        let root = s.add_entity(root);
        let child = s.create_entity("child");
        s.add_child(root, child).unwrap();

        assert!(!s.remove_entity(child));
        assert!(s.remove_entity(root));
        assert!(!s.remove_entity(root));
        assert!(s.entity(child).is_none());
        assert!(s.roots().is_empty());
        assert_eq!(*log.borrow(), vec!["attach:root", "detach:root"]);
    }

    #[test]
    fn test_parenting_a_root_removes_it_from_roots() {
        let mut s = scene();
        let a = s.add_entity(named(&s, "a"));
        let b = s.add_entity(named(&s, "b"));
        s.add_child(a, b).unwrap();
        assert_eq!(s.roots(), &[a]);
        assert!(s.find_entity(b).is_none());

        s.add_root(b).unwrap();
        assert_eq!(s.roots(), &[a, b]);
        assert!(s.entity(a).unwrap().children().is_empty());
    }

    #[test]
    fn test_update_visits_roots_in_order() {
        let log = new_log();
        let mut s = scene();
        for name in ["first", "second"] {
            let mut e = named(&s, name);
            e.add_component(Tracker::new(name, &log));
            s.add_entity(e);
        }
        let detached = s.create_entity("detached");
        s.entity_mut(detached)
            .unwrap()
            .add_component(Tracker::new("detached", &log));

        s.update(0.1);
        let updates: Vec<_> = log
            .borrow()
            .iter()
            .filter(|l| l.starts_with("update"))
            .cloned()
            .collect();
        assert_eq!(updates, vec!["update:first", "update:second"]);
    }

    #[tokio::test]
    async fn test_load_and_unload_are_idempotent() {
        let log = new_log();
        let mut s = scene().with_hooks(Populate {
            log: log.clone(),
            fail: false,
        });

        s.load().await.unwrap();
        s.load().await.unwrap();
        assert!(s.is_loaded());
        assert_eq!(s.roots().len(), 1);

        s.create_entity("stray");
        s.unload().await.unwrap();
        s.unload().await.unwrap();
        assert!(!s.is_loaded());
        assert_eq!(s.entity_count(), 0);
        assert!(s.roots().is_empty());

        assert_eq!(
            *log.borrow(),
            vec!["on_load", "attach:player", "on_unload:2", "detach:player"]
        );
    }

    #[tokio::test]
    async fn test_failed_load_leaves_scene_unloaded() {
        let log = new_log();
        let mut s = scene().with_hooks(Populate {
            log: log.clone(),
            fail: true,
        });
        assert!(matches!(s.load().await, Err(SceneError::LoadFailed(_))));
        assert!(!s.is_loaded());
    }

    #[test]
    fn test_activate_reaches_hooks() {
        let log = new_log();
        let mut s = scene().with_hooks(Populate {
            log: log.clone(),
            fail: false,
        });
        s.activate();
        s.deactivate();
        assert_eq!(*log.borrow(), vec!["activate"]);
    }

    fn sample_scene() -> Scene {
        let mut s = scene();
        let mut camera = named(&s, "MainCamera");
        camera.add_component(Transform::from_position(Vec3::new(0.0, 2.0, 5.0)));
        camera.add_component(Camera::default().main());
        let camera = s.add_entity(camera);

        let mut light = named(&s, "Sun");
        light.add_component(Light::new(LightType::Directional).with_shadows());
        light.add_tag("lighting");
        light.active = false;
        s.add_entity(light);

        let arm = s.create_entity("Arm");
        let hand = s.create_entity("Hand");
        s.add_child(camera, arm).unwrap();
        s.add_child(arm, hand).unwrap();
        let hand = s.entity_mut(hand).unwrap();
        hand.add_component(MeshRenderer::new("hand", "skin"));
        hand.add_tag("interactable");
        hand.add_tag("body");
        s
    }

    fn shape(scene: &Scene) -> Vec<(String, bool, BTreeSet<String>, Vec<String>, Option<String>)> {
        scene
            .traverse()
            .into_iter()
            .filter_map(|id| scene.entity(id))
            .map(|e| {
                (
                    e.name.clone(),
                    e.active,
                    e.tags().map(str::to_string).collect(),
                    e.get_all_components()
                        .map(|c| c.component_type().to_string())
                        .collect(),
                    e.parent()
                        .and_then(|p| scene.entity(p))
                        .map(|p| p.name.clone()),
                )
            })
            .collect()
    }

    #[test]
    fn test_snapshot_restores_topology_and_content() {
        let original = sample_scene();
        let snapshot = original.serialize();
        assert_eq!(snapshot.entities.len(), 4);
        assert_eq!(snapshot.root_count(), 2);

        let restored = Scene::from_snapshot(
            &snapshot,
            &ComponentRegistry::default(),
            SequentialIds::shared(),
        );
        assert_eq!(shape(&restored), shape(&original));

        let camera = restored.find_entity_by_name("MainCamera").unwrap();
        assert_eq!(
            camera.get::<Transform>().map(|t| t.position),
            Some(Vec3::new(0.0, 2.0, 5.0))
        );
        assert!(camera.get::<Camera>().map_or(false, |c| c.is_main));
    }

    #[test]
    fn test_snapshot_survives_json_text() {
        let original = sample_scene();
        let text = original.serialize().to_json().unwrap();
        let snapshot = SceneSnapshot::from_json(&text).unwrap();

        let mut restored = Scene::new("Other");
        restored.deserialize(&snapshot, &ComponentRegistry::default());
        assert_eq!(restored.name, "Test");
        assert_eq!(shape(&restored), shape(&original));
    }

    #[test]
    fn test_deserialize_replaces_content_and_skips_unknown_components() {
        let mut tracked_entity = EntitySnapshot {
            id: 1,
            name: "Tracked".into(),
            ..Default::default()
        };
        tracked_entity
            .components
            .push(crate::ecs::ComponentData::new(Tracker::TYPE));
        let orphan = EntitySnapshot {
            id: 2,
            name: "Orphan".into(),
            parent: Some(77),
            ..Default::default()
        };
        let snapshot = SceneSnapshot {
            id: 9,
            name: String::new(),
            entities: vec![tracked_entity, orphan],
        };

        let mut s = sample_scene();
        let scene_id = s.id();
        s.deserialize(&snapshot, &ComponentRegistry::default());

        assert_eq!(s.id(), scene_id);
        assert_eq!(s.name, "Test");
        assert_eq!(s.entity_count(), 2);
        assert_eq!(s.roots().len(), 2);
        let tracked = s.find_entity_by_name("Tracked").unwrap();
        assert_eq!(tracked.component_count(), 0);
    }
}
