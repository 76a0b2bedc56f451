//! The entity repository and container store.

use slotmap::SlotMap;
use tracing::debug;

use crate::{
    EntityId, EntityKind, GroupId, MeshData, Result, SceneError, Selection,
    entity::Entity,
    group::{Group, GroupPurpose},
};

/// Name of the root container every scene starts with.
pub const ROOT_GROUP_NAME: &str = "Scene Collection";

/// Owns every entity and group, plus the selection.
///
/// Groups and operations refer to entities by [`EntityId`]; the scene is the
/// only owner. Structural edits go through methods here so group membership
/// stays mirrored on both sides and no operation is left pointing at a
/// removed entity.
#[derive(Debug, Clone)]
pub struct Scene {
    entities: SlotMap<EntityId, Entity>,
    groups: SlotMap<GroupId, Group>,
    root: GroupId,
    selection: Selection,
}

impl Default for Scene {
    fn default() -> Self {
        let mut groups = SlotMap::with_key();
        let root = groups.insert(Group::new(
            ROOT_GROUP_NAME.to_string(),
            GroupPurpose::Scene,
            None,
        ));
        Self {
            entities: SlotMap::with_key(),
            groups,
            root,
            selection: Selection::default(),
        }
    }
}

impl Scene {
    /// Create an empty scene with only the root group.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Entity lookup
    // =========================================================================

    /// Borrow an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Borrow an entity mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Borrow an entity or fail with [`SceneError::EntityNotFound`].
    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id).ok_or(SceneError::EntityNotFound(id))
    }

    /// Mutable variant of [`Scene::get`].
    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(id)
            .ok_or(SceneError::EntityNotFound(id))
    }

    /// Whether `id` resolves.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Iterate all entities.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Find an entity by exact name.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(id, _)| id)
    }

    /// Selected entities of the given kinds, in selection order.
    pub fn list_selected(&self, kinds: &[EntityKind]) -> Vec<EntityId> {
        self.selection
            .selected
            .iter()
            .copied()
            .filter(|id| {
                self.entities
                    .get(*id)
                    .is_some_and(|e| kinds.contains(&e.kind))
            })
            .collect()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Add an entity, linked into `group` (the root group when `None`).
    pub fn add_entity(
        &mut self,
        name: &str,
        kind: EntityKind,
        mesh: MeshData,
        group: Option<GroupId>,
    ) -> Result<EntityId> {
        if name.is_empty() {
            return Err(SceneError::InvalidName(name.to_string()));
        }
        let group = group.unwrap_or(self.root);
        if !self.groups.contains_key(group) {
            return Err(SceneError::GroupNotFound(group));
        }
        let name = self.unique_name(name, None);
        let id = self.entities.insert(Entity::new(name, kind, mesh));
        self.link_entity(group, id)?;
        Ok(id)
    }

    /// Add a mesh entity to the root group.
    pub fn add_mesh(&mut self, name: &str, mesh: MeshData) -> EntityId {
        let name = if name.is_empty() { "Mesh" } else { name };
        let name = self.unique_name(name, None);
        let id = self
            .entities
            .insert(Entity::new(name, EntityKind::Mesh, mesh));
        self.entities[id].groups.insert(self.root);
        self.groups[self.root].entities.push(id);
        id
    }

    /// Copy an entity (geometry, stack, transform, style, groups).
    ///
    /// The copy gets a fresh unique name and no constraints or parent.
    pub fn duplicate_entity(&mut self, id: EntityId) -> Result<EntityId> {
        let original = self.get(id)?;
        let name = self.unique_name(&original.name, None);
        let mut copy = Entity::new(name, original.kind, original.mesh.clone());
        copy.stack = original.stack.clone();
        copy.display = original.display;
        copy.transform = original.transform;
        copy.hide_viewport = original.hide_viewport;
        let groups: Vec<GroupId> = original.groups.iter().copied().collect();

        let new_id = self.entities.insert(copy);
        for group in groups {
            self.link_entity(group, new_id)?;
        }
        debug!(
            source = %self.entities[id].full_name(),
            copy = %self.entities[new_id].full_name(),
            "duplicated entity"
        );
        Ok(new_id)
    }

    /// `base`, or `base.001`, `base.002`, … if taken by another entity.
    pub fn unique_name(&self, base: &str, exclude: Option<EntityId>) -> String {
        let taken = |name: &str| {
            self.entities
                .iter()
                .any(|(id, e)| Some(id) != exclude && e.name == name)
        };
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}.{n:03}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Rename an entity and its mesh data together.
    ///
    /// Returns the final (possibly suffixed) name.
    pub fn rename(&mut self, id: EntityId, new_name: &str) -> Result<String> {
        if new_name.is_empty() {
            return Err(SceneError::InvalidName(new_name.to_string()));
        }
        let final_name = self.unique_name(new_name, Some(id));
        let entity = self.get_mut(id)?;
        let old = entity.full_name();
        entity.name = final_name.clone();
        entity.data_name = final_name.clone();
        debug!(from = %old, to = %entity.full_name(), "renamed entity");
        Ok(final_name)
    }

    /// Number of boolean operations (on other entities) whose source is `id`.
    pub fn boolean_references(&self, id: EntityId) -> usize {
        self.entities
            .iter()
            .filter(|(owner, _)| *owner != id)
            .flat_map(|(_, e)| e.stack.iter())
            .filter(|op| op.boolean_source() == Some(id))
            .count()
    }

    /// Number of operations of any kind (on other entities) referring to `id`.
    pub fn references(&self, id: EntityId) -> usize {
        self.entities
            .iter()
            .filter(|(owner, _)| *owner != id)
            .flat_map(|(_, e)| e.stack.iter())
            .filter(|op| op.kind.referenced_entity() == Some(id))
            .count()
    }

    /// Whether any operation refers to `id`.
    pub fn is_referenced(&self, id: EntityId) -> bool {
        self.references(id) > 0
    }

    /// First viewport-hidden group `id` is linked into.
    pub fn hidden_group_of(&self, id: EntityId) -> Option<GroupId> {
        self.entities.get(id)?.groups.iter().copied().find(|g| {
            self.groups.get(*g).is_some_and(|g| g.hide_viewport)
        })
    }

    /// Remove an entity.
    ///
    /// Fails while any operation still refers to it, or while it sits in a
    /// group hidden from the viewport. Constraints targeting it are dropped
    /// and children are unparented.
    pub fn delete_entity(&mut self, id: EntityId) -> Result<Entity> {
        let entity = self.get(id)?;
        let count = self.references(id);
        if count > 0 {
            return Err(SceneError::StillReferenced {
                name: entity.name.clone(),
                count,
            });
        }
        if let Some(hidden) = self.hidden_group_of(id) {
            return Err(SceneError::GroupHidden {
                entity: entity.name.clone(),
                group: self.groups[hidden].name.clone(),
            });
        }

        let entity = self
            .entities
            .remove(id)
            .ok_or(SceneError::EntityNotFound(id))?;
        for group in &entity.groups {
            if let Some(g) = self.groups.get_mut(*group) {
                g.entities.retain(|e| *e != id);
            }
        }
        for (_, other) in self.entities.iter_mut() {
            other.constraints.retain(|c| c.target() != id);
            if other.parent == Some(id) {
                other.parent = None;
            }
        }
        self.selection.deselect(id);
        debug!(entity = %entity.full_name(), "deleted entity");
        Ok(entity)
    }

    /// Delete `id` if nothing refers to it. Returns whether it was deleted.
    pub fn delete_if_unreferenced(&mut self, id: EntityId) -> Result<bool> {
        if self.is_referenced(id) {
            return Ok(false);
        }
        self.delete_entity(id)?;
        Ok(true)
    }

    /// Strip every operation referring to `id`, then delete it.
    ///
    /// Returns the removed entity and the number of stripped operations.
    pub fn purge_entity(&mut self, id: EntityId) -> Result<(Entity, usize)> {
        self.get(id)?;
        let mut stripped = 0;
        for (owner, e) in self.entities.iter_mut() {
            if owner == id {
                continue;
            }
            let before = e.stack.len();
            e.stack.retain(|op| op.kind.referenced_entity() != Some(id));
            stripped += before - e.stack.len();
        }
        let entity = self.delete_entity(id)?;
        Ok((entity, stripped))
    }

    /// Copy constrained transforms from their targets.
    pub fn evaluate_constraints(&mut self) {
        let updates: Vec<(EntityId, crate::Transform)> = self
            .entities
            .iter()
            .flat_map(|(id, e)| e.constraints.iter().map(move |c| (id, c.target())))
            .filter_map(|(id, target)| Some((id, self.entities.get(target)?.transform)))
            .collect();
        for (id, transform) in updates {
            self.entities[id].transform = transform;
        }
    }

    /// Check the graph-wide invariants.
    ///
    /// Every operation reference must resolve, and each stack's boolean
    /// operations must form one contiguous block.
    pub fn validate(&self) -> Result<()> {
        for (_, e) in self.entities.iter() {
            for op in &e.stack {
                if let Some(target) = op.kind.referenced_entity() {
                    if !self.entities.contains_key(target) {
                        return Err(SceneError::DanglingReference {
                            entity: e.name.clone(),
                            operation: op.name.clone(),
                        });
                    }
                }
            }
            let first = e.stack.iter().position(|op| op.is_boolean());
            let last = e.stack.iter().rposition(|op| op.is_boolean());
            if let (Some(first), Some(last)) = (first, last) {
                if !e.stack[first..=last].iter().all(|op| op.is_boolean()) {
                    return Err(SceneError::NonContiguousBooleans {
                        entity: e.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// The scene root group.
    pub fn root_group(&self) -> GroupId {
        self.root
    }

    /// Borrow a group.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Borrow a group mutably.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    /// Borrow a group or fail with [`SceneError::GroupNotFound`].
    pub fn get_group(&self, id: GroupId) -> Result<&Group> {
        self.groups.get(id).ok_or(SceneError::GroupNotFound(id))
    }

    /// Iterate all groups.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter()
    }

    /// Find a group by exact name.
    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|(_, g)| g.name == name)
            .map(|(id, _)| id)
    }

    /// Create a group under `parent` (the root group when `None`).
    pub fn create_group(
        &mut self,
        name: &str,
        purpose: GroupPurpose,
        parent: Option<GroupId>,
    ) -> Result<GroupId> {
        if name.is_empty() {
            return Err(SceneError::InvalidName(name.to_string()));
        }
        let parent = parent.unwrap_or(self.root);
        if !self.groups.contains_key(parent) {
            return Err(SceneError::GroupNotFound(parent));
        }
        let id = self
            .groups
            .insert(Group::new(name.to_string(), purpose, Some(parent)));
        self.groups[parent].children.push(id);
        debug!(group = name, ?purpose, "created group");
        Ok(id)
    }

    /// Link `entity` into `group`. Returns `false` if it was already linked.
    pub fn link_entity(&mut self, group: GroupId, entity: EntityId) -> Result<bool> {
        if !self.groups.contains_key(group) {
            return Err(SceneError::GroupNotFound(group));
        }
        let e = self.get_mut(entity)?;
        if !e.groups.insert(group) {
            return Ok(false);
        }
        self.groups[group].entities.push(entity);
        Ok(true)
    }

    /// Unlink `entity` from `group`. Returns `false` if it was not linked.
    pub fn unlink_entity(&mut self, group: GroupId, entity: EntityId) -> Result<bool> {
        if !self.groups.contains_key(group) {
            return Err(SceneError::GroupNotFound(group));
        }
        let e = self.get_mut(entity)?;
        if !e.groups.remove(&group) {
            return Ok(false);
        }
        self.groups[group].entities.retain(|id| *id != entity);
        Ok(true)
    }

    /// Link `entity` into `group` and unlink it from every other group.
    pub fn move_to_group(&mut self, entity: EntityId, group: GroupId) -> Result<()> {
        self.link_entity(group, entity)?;
        let others: Vec<GroupId> = self
            .get(entity)?
            .groups
            .iter()
            .copied()
            .filter(|g| *g != group)
            .collect();
        for other in others {
            self.unlink_entity(other, entity)?;
        }
        Ok(())
    }

    /// The group an entity calls home: its first non-boolean group, or the root.
    pub fn home_group(&self, entity: EntityId) -> Result<GroupId> {
        Ok(self
            .get(entity)?
            .groups
            .iter()
            .copied()
            .find(|g| {
                self.groups
                    .get(*g)
                    .is_some_and(|g| g.purpose != GroupPurpose::Boolean)
            })
            .unwrap_or(self.root))
    }

    /// Every entity linked into `id` or any of its descendant groups, once each.
    pub fn all_group_entities(&self, id: GroupId) -> Vec<EntityId> {
        let mut found = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(group) = self.groups.get(next) else {
                continue;
            };
            for entity in &group.entities {
                if !found.contains(entity) {
                    found.push(*entity);
                }
            }
            pending.extend(group.children.iter().copied());
        }
        found
    }

    /// Remove a group, unlinking it from its parent.
    ///
    /// Member entities lose the membership; child groups move to the parent.
    pub fn delete_group(&mut self, id: GroupId) -> Result<Group> {
        if id == self.root {
            return Err(SceneError::RootGroup);
        }
        let group = self.groups.remove(id).ok_or(SceneError::GroupNotFound(id))?;
        let parent = group.parent.unwrap_or(self.root);
        if let Some(p) = self.groups.get_mut(parent) {
            p.children.retain(|c| *c != id);
            p.children.extend(group.children.iter().copied());
        }
        for child in &group.children {
            if let Some(c) = self.groups.get_mut(*child) {
                c.parent = Some(parent);
            }
        }
        for entity in &group.entities {
            if let Some(e) = self.entities.get_mut(*entity) {
                e.groups.remove(&id);
            }
        }
        debug!(group = %group.name, "deleted group");
        Ok(group)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Select `ids` in order, the last one active.
    pub fn select(&mut self, ids: &[EntityId]) {
        let ids: Vec<EntityId> = ids
            .iter()
            .copied()
            .filter(|id| self.entities.contains_key(*id))
            .collect();
        self.selection.set(&ids);
    }
}
