//! Entity graph
//!
//! Arena of entities keyed by id. Parent and child links are stored as ids on
//! each [`Entity`] and kept bidirectionally consistent here: an entity lists
//! a child exactly when that child names it as parent.

use std::collections::HashMap;

use super::error::SceneError;
use crate::ecs::Entity;
use crate::foundation::ids::{EntityId, IdSource};

/// Owner of every entity in a scene
pub struct EntityGraph {
    nodes: HashMap<EntityId, Entity>,
    ids: IdSource,
}

impl EntityGraph {
    /// Create an empty graph drawing entity ids from `ids`
    pub fn new(ids: IdSource) -> Self {
        Self {
            nodes: HashMap::new(),
            ids,
        }
    }

    /// Id source shared with every entity in the graph
    pub fn id_source(&self) -> &IdSource {
        &self.ids
    }

    /// Create a detached entity
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        self.insert(Entity::new(&self.ids, name))
    }

    /// Take ownership of a standalone entity
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = entity.id();
        entity.set_parent(None);
        entity.take_children();
        self.nodes.insert(id, entity);
        id
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no entity
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether an entity is part of the graph
    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Entity by id
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.nodes.get(&id)
    }

    /// Mutable entity by id
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.nodes.get_mut(&id)
    }

    /// Ids of every entity, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.keys().copied()
    }

    fn is_ancestor(&self, ancestor: EntityId, of: EntityId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(Entity::parent);
        }
        false
    }

    fn unlink(&mut self, child: EntityId) {
        let parent = self.nodes.get(&child).and_then(Entity::parent);
        if let Some(parent) = parent {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.unlink_child(child);
            }
        }
        if let Some(child) = self.nodes.get_mut(&child) {
            child.set_parent(None);
        }
    }

    /// Append `child` to `parent`'s children.
    ///
    /// A child that already has a parent is moved, not copied. Re-adding a
    /// child to its current parent moves it to the end of the list.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), SceneError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(SceneError::UnknownEntity(id));
            }
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::HierarchyCycle { parent, child });
        }

        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.push_child(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.set_parent(Some(parent));
        }
        Ok(())
    }

    /// Detach a direct child; false if `child` is not a child of `parent`
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        let removed = self
            .nodes
            .get_mut(&parent)
            .map_or(false, |node| node.unlink_child(child));
        if removed {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.set_parent(None);
            }
        }
        removed
    }

    /// First direct child with the given name
    pub fn find_child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.nodes
            .get(&parent)?
            .children()
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).map_or(false, |e| e.name == name))
    }

    /// Ids of `root` and all its descendants, depth-first pre-order
    pub fn preorder(&self, root: EntityId) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(entity) = self.nodes.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(entity.children().iter().rev().copied());
        }
        order
    }

    /// Ids of `root`'s subtree with every descendant before its ancestor,
    /// siblings in child order
    pub fn postorder(&self, root: EntityId) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            let Some(entity) = self.nodes.get(&id) else {
                continue;
            };
            stack.push((id, true));
            stack.extend(entity.children().iter().rev().map(|&c| (c, false)));
        }
        order
    }

    /// Update `root` and its descendants, parents before children.
    /// Inactive entities are skipped along with their subtrees.
    pub fn update_subtree(&mut self, root: EntityId, delta_time: f32) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(entity) = self.nodes.get_mut(&id) else {
                continue;
            };
            if !entity.active {
                continue;
            }
            entity.update(delta_time);
            stack.extend(entity.children().iter().rev().copied());
        }
    }

    /// Destroy `root` and its subtree.
    ///
    /// Descendants are destroyed before their ancestors. Every component is
    /// detached, then the root is unlinked from its parent. Returns the
    /// emptied root entity, or `None` if it was not in the graph.
    pub fn destroy(&mut self, root: EntityId) -> Option<Entity> {
        if !self.contains(root) {
            return None;
        }
        self.unlink(root);

        let mut destroyed = None;
        for id in self.postorder(root) {
            if let Some(mut entity) = self.nodes.remove(&id) {
                entity.clear_components();
                entity.take_children();
                entity.set_parent(None);
                if id == root {
                    destroyed = Some(entity);
                }
            }
        }
        destroyed
    }

    /// Destroy every entity
    pub fn clear(&mut self) {
        let tops: Vec<_> = self
            .nodes
            .values()
            .filter(|e| e.parent().is_none())
            .map(Entity::id)
            .collect();
        for id in tops {
            self.destroy(id);
        }
    }
}
