//! Parent/child tree of entities
//!
//! Each entity has at most one parent and an ordered list of children.
//! `set_parent` rejects self-parenting and cycles, so the structure stays a
//! forest.

use std::collections::HashMap;

use void_core::HierarchyError;

use crate::entity::EntityId;

#[derive(Debug, Default, Clone)]
struct Node {
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

#[derive(Debug, Default)]
pub struct Hierarchy {
    nodes: HashMap<EntityId, Node>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity as a root. Returns `false` if already present
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(id, Node::default());
        true
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove an entity. Its children become roots
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };
        if let Some(parent) = node.parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        for child in node.children {
            if let Some(c) = self.nodes.get_mut(&child) {
                c.parent = None;
            }
        }
        true
    }

    /// Attach `child` under `parent`, detaching it from any previous parent
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<(), HierarchyError> {
        if child == parent {
            return Err(HierarchyError::SelfParent(child));
        }
        for id in [child, parent] {
            if !self.nodes.contains_key(&id) {
                return Err(HierarchyError::UnknownEntity(id));
            }
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(HierarchyError::Cycle { child, parent });
        }

        self.clear_parent(child)?;
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `child` from its parent, returning the old parent
    pub fn clear_parent(&mut self, child: EntityId) -> Result<Option<EntityId>, HierarchyError> {
        let node = self
            .nodes
            .get_mut(&child)
            .ok_or(HierarchyError::UnknownEntity(child))?;
        let old = node.parent.take();
        if let Some(parent) = old {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != child);
            }
        }
        Ok(old)
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children in attachment order
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// All descendants, depth-first in child order
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn roots(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> EntityId {
        EntityId::new(n, 0)
    }

    fn tree() -> Hierarchy {
        let mut h = Hierarchy::new();
        for n in 0..5 {
            h.insert(id(n));
        }
        h.set_parent(id(1), id(0)).unwrap();
        h.set_parent(id(2), id(0)).unwrap();
        h.set_parent(id(3), id(1)).unwrap();
        h
    }

    #[test]
    fn test_children_keep_order() {
        let h = tree();
        assert_eq!(h.children(id(0)), &[id(1), id(2)]);
        assert_eq!(h.descendants(id(0)), vec![id(1), id(3), id(2)]);
        assert_eq!(h.ancestors(id(3)).collect::<Vec<_>>(), vec![id(1), id(0)]);
    }

    #[test]
    fn test_rejects_cycles() {
        let mut h = tree();
        assert_eq!(
            h.set_parent(id(0), id(3)),
            Err(HierarchyError::Cycle {
                child: id(0),
                parent: id(3)
            })
        );
        assert_eq!(h.set_parent(id(4), id(4)), Err(HierarchyError::SelfParent(id(4))));
        assert_eq!(
            h.set_parent(id(4), id(99)),
            Err(HierarchyError::UnknownEntity(id(99)))
        );
        // tree unchanged
        assert_eq!(h.parent(id(0)), None);
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut h = tree();
        h.set_parent(id(3), id(2)).unwrap();
        assert!(h.children(id(1)).is_empty());
        assert_eq!(h.children(id(2)), &[id(3)]);
        assert_eq!(h.clear_parent(id(3)), Ok(Some(id(2))));
        assert_eq!(h.parent(id(3)), None);
    }

    #[test]
    fn test_remove_orphans_children() {
        let mut h = tree();
        assert!(h.remove(id(1)));
        assert_eq!(h.parent(id(3)), None);
        assert_eq!(h.children(id(0)), &[id(2)]);
        assert!(!h.remove(id(1)));
    }
}
