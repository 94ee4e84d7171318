/// ProbeScene
///
/// The off-screen scene the visibility probe renders.
///
/// Holds renderable groups in a SlotMap so the render pass can add and
/// remove the transparent group every cycle without disturbing the key
/// of the opaque group.

use std::sync::Arc;
use slotmap::{new_key_type, SlotMap};
use super::instance_batch::RenderGroup;
use super::probe_renderer::RenderableGroup;

new_key_type! {
    /// Stable key for a group within a ProbeScene.
    pub struct GroupKey;
}

#[derive(Debug, Default)]
pub struct ProbeScene {
    groups: SlotMap<GroupKey, Arc<dyn RenderableGroup>>,
}

impl ProbeScene {
    pub fn new() -> Self {
        Self { groups: SlotMap::with_key() }
    }

    /// Add a group; the key stays valid until the group is removed.
    pub fn add(&mut self, group: Arc<dyn RenderableGroup>) -> GroupKey {
        self.groups.insert(group)
    }

    /// Remove a group. Returns None if the key is stale.
    pub fn remove(&mut self, key: GroupKey) -> Option<Arc<dyn RenderableGroup>> {
        self.groups.remove(key)
    }

    pub fn contains(&self, key: GroupKey) -> bool {
        self.groups.contains_key(key)
    }

    pub fn group(&self, key: GroupKey) -> Option<&Arc<dyn RenderableGroup>> {
        self.groups.get(key)
    }

    /// Iterate over all groups (key, group)
    pub fn groups(&self) -> impl Iterator<Item = (GroupKey, &Arc<dyn RenderableGroup>)> {
        self.groups.iter()
    }

    /// Whether any group of `kind` is currently in the scene
    pub fn has_group(&self, kind: RenderGroup) -> bool {
        self.groups.values().any(|g| g.group() == kind)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
