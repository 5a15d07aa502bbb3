//! Arena storage for a document's entry hierarchy.
//!
//! Nodes live in one flat vector per [`Tree`]; children and parents refer to
//! each other through [`NodeId`] handles (index + generation) instead of
//! pointers. Deleting a node bumps the generation of its slot, so a handle
//! kept across a deletion is reported as [`Error::StaleHandle`] instead of
//! silently pointing at whatever reuses the slot.
//!
//! Reading goes through [`EntryRef`], a borrowed view that cannot outlive a
//! mutation of the tree. Writing goes through `Tree` methods addressed by
//! `NodeId`. Owned [`Entry`] values are deep-copied in on insertion and out
//! again with [`EntryRef::to_entry`].
//!
//! ## Deleting a node you hold
//!
//! Entries are deleted by name. To delete a specific node whose siblings may
//! share its name, [`Tree::delete_node`] first renames it to a synthetic name
//! that no sibling uses and then deletes by that name:
//!
//! ```rust
//! use uconfig::{Entry, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! tree.add_subentry(root, Entry::named("dup", 1)).unwrap();
//! let second = tree.add_subentry(root, Entry::named("dup", 1)).unwrap();
//!
//! tree.delete_node(second).unwrap();
//! assert_eq!(tree.entry(root).unwrap().subentry_count(), 1);
//! assert!(tree.get(second).is_none());
//! ```

use crate::{Entry, Error, Key, Result, Value};
use indexmap::IndexMap;
use std::fmt;

const RENAME_PREFIX: &str = "~uconfig-pending-delete";

/// A generational handle to a node in a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: Option<Vec<u8>>,
    kind: i32,
    keys: Vec<Key>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An entry hierarchy stored in an arena.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    rename_counter: u64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only an unnamed root of kind 0.
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            rename_counter: 0,
        };
        tree.root = tree.alloc(Node {
            name: None,
            kind: 0,
            keys: Vec::new(),
            children: Vec::new(),
            parent: None,
        });
        tree
    }

    /// Builds a tree whose root is a deep copy of `entry`.
    #[must_use]
    pub fn from_entry(entry: Entry) -> Self {
        let mut tree = Tree::new();
        let root = tree.root;
        let Entry {
            name,
            kind,
            keys,
            subentries,
        } = entry;
        let children: Vec<NodeId> = subentries
            .into_iter()
            .map(|child| tree.insert(child, root))
            .collect();
        if let Some(node) = tree.slots[root.index].node.as_mut() {
            node.name = name;
            node.kind = kind;
            node.keys = keys;
            node.children = children;
        }
        tree
    }

    /// Frees every node and starts over with an empty root.
    pub fn reset(&mut self) {
        *self = Tree::new();
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root)
            .map(|n| n.keys.is_empty() && n.children.is_empty())
            .unwrap_or(true)
    }

    /// Returns a view of a live node, or `None` for a stale handle.
    pub fn get(&self, id: NodeId) -> Option<EntryRef<'_>> {
        self.node(id).ok().map(|node| EntryRef {
            tree: self,
            id,
            node,
        })
    }

    /// Like [`Tree::get`], reporting stale handles as errors.
    pub fn entry(&self, id: NodeId) -> Result<EntryRef<'_>> {
        let node = self.node(id)?;
        Ok(EntryRef {
            tree: self,
            id,
            node,
        })
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(Error::StaleHandle {
                index: id.index,
                generation: id.generation,
            })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(Error::StaleHandle {
                index: id.index,
                generation: id.generation,
            })
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Moves an owned entry and its subtree into the arena under `parent`.
    /// The caller links the returned id into the parent's child list.
    fn insert(&mut self, entry: Entry, parent: NodeId) -> NodeId {
        let Entry {
            name,
            kind,
            keys,
            subentries,
        } = entry;
        let id = self.alloc(Node {
            name,
            kind,
            keys,
            children: Vec::with_capacity(subentries.len()),
            parent: Some(parent),
        });
        let children: Vec<NodeId> = subentries
            .into_iter()
            .map(|child| self.insert(child, id))
            .collect();
        if let Some(node) = self.slots[id.index].node.as_mut() {
            node.children = children;
        }
        id
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                stack.extend(node.children);
            }
        }
    }

    pub fn set_name(&mut self, id: NodeId, name: Option<Vec<u8>>) -> Result<()> {
        self.node_mut(id)?.name = name;
        Ok(())
    }

    pub fn set_kind(&mut self, id: NodeId, kind: i32) -> Result<()> {
        self.node_mut(id)?.kind = kind;
        Ok(())
    }

    pub fn set_keys(&mut self, id: NodeId, keys: Vec<Key>) -> Result<()> {
        self.node_mut(id)?.keys = keys;
        Ok(())
    }

    pub fn keys_mut(&mut self, id: NodeId) -> Result<&mut Vec<Key>> {
        Ok(&mut self.node_mut(id)?.keys)
    }

    pub fn add_key(&mut self, id: NodeId, key: Key) -> Result<()> {
        self.node_mut(id)?.keys.push(key);
        Ok(())
    }

    /// Removes the first key called `name`.
    pub fn delete_key(&mut self, id: NodeId, name: &[u8]) -> Result<()> {
        let keys = &mut self.node_mut(id)?.keys;
        let index = keys
            .iter()
            .position(|k| k.is_named(name))
            .ok_or_else(|| Error::not_found("key", name))?;
        keys.remove(index);
        Ok(())
    }

    /// Replaces the first key called `name` with `key`, in place.
    pub fn modify_key(&mut self, id: NodeId, name: &[u8], key: Key) -> Result<()> {
        let slot = self
            .node_mut(id)?
            .keys
            .iter_mut()
            .find(|k| k.is_named(name))
            .ok_or_else(|| Error::not_found("key", name))?;
        *slot = key;
        Ok(())
    }

    /// Appends a deep copy of `entry` as the last child of `parent`.
    pub fn add_subentry(&mut self, parent: NodeId, entry: Entry) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.insert(entry, parent);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Replaces all children of `parent`.
    pub fn set_subentries(&mut self, parent: NodeId, entries: Vec<Entry>) -> Result<Vec<NodeId>> {
        let old = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in old {
            self.free_subtree(child);
        }
        let ids: Vec<NodeId> = entries
            .into_iter()
            .map(|entry| self.insert(entry, parent))
            .collect();
        self.node_mut(parent)?.children = ids.clone();
        Ok(ids)
    }

    fn child_position(&self, parent: NodeId, name: &[u8]) -> Result<usize> {
        let node = self.node(parent)?;
        node.children
            .iter()
            .position(|&child| {
                self.node(child)
                    .map(|n| n.name.as_deref() == Some(name))
                    .unwrap_or(false)
            })
            .ok_or_else(|| Error::not_found("entry", name))
    }

    /// Deletes the first child of `parent` called `name`, with its subtree.
    pub fn delete_subentry(&mut self, parent: NodeId, name: &[u8]) -> Result<()> {
        let position = self.child_position(parent, name)?;
        let child = self.node_mut(parent)?.children.remove(position);
        self.free_subtree(child);
        Ok(())
    }

    /// Replaces the first child of `parent` called `name` with a deep copy
    /// of `entry`, keeping its position. Returns the new child's id.
    pub fn modify_subentry(&mut self, parent: NodeId, name: &[u8], entry: Entry) -> Result<NodeId> {
        let position = self.child_position(parent, name)?;
        let old = self.node(parent)?.children[position];
        self.free_subtree(old);
        let id = self.insert(entry, parent);
        self.node_mut(parent)?.children[position] = id;
        Ok(id)
    }

    pub fn exist_subentry(&self, parent: NodeId, name: &[u8]) -> bool {
        self.child_position(parent, name).is_ok()
    }

    /// Finds an entry called `name` below `from`.
    ///
    /// With `parent_name`, the search is scoped under the first entry of that
    /// name found below `from`. Direct children are checked before
    /// descending; `recursive` enables descending.
    pub fn search_subentry(
        &self,
        from: NodeId,
        name: &[u8],
        parent_name: Option<&[u8]>,
        recursive: bool,
    ) -> Option<NodeId> {
        let scope = match parent_name {
            Some(parent_name) => self.find_below(from, parent_name, recursive)?,
            None => from,
        };
        self.find_below(scope, name, recursive)
    }

    fn find_below(&self, parent: NodeId, name: &[u8], recursive: bool) -> Option<NodeId> {
        let node = self.node(parent).ok()?;
        let direct = node.children.iter().copied().find(|&child| {
            self.node(child)
                .map(|n| n.name.as_deref() == Some(name))
                .unwrap_or(false)
        });
        if direct.is_some() || !recursive {
            return direct;
        }
        node.children
            .iter()
            .find_map(|&child| self.find_below(child, name, true))
    }

    /// Returns a name of the form `~prefix-N` that no child of `parent` uses.
    pub fn unique_subentry_name(&mut self, parent: NodeId, prefix: &str) -> Result<Vec<u8>> {
        self.node(parent)?;
        loop {
            self.rename_counter += 1;
            let candidate = format!("{}-{}", prefix, self.rename_counter).into_bytes();
            if !self.exist_subentry(parent, &candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Returns a name of the form `~prefix-N` that no key of `id` uses.
    pub fn unique_key_name(&mut self, id: NodeId, prefix: &str) -> Result<Vec<u8>> {
        self.node(id)?;
        loop {
            self.rename_counter += 1;
            let candidate = format!("{}-{}", prefix, self.rename_counter).into_bytes();
            if !self.node(id)?.keys.iter().any(|k| k.is_named(&candidate)) {
                return Ok(candidate);
            }
        }
    }

    /// Deletes a specific node: rename it to a collision-free name, then
    /// delete by that name from its parent.
    pub fn delete_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| Error::invalid_operation("the root entry cannot be deleted"))?;
        let name = self.unique_subentry_name(parent, RENAME_PREFIX)?;
        self.set_name(id, Some(name.clone()))?;
        self.delete_subentry(parent, &name)
    }

    /// Deletes the key at `index` of `id` using the same rename-then-delete
    /// protocol as [`Tree::delete_node`].
    pub fn delete_key_at(&mut self, id: NodeId, index: usize) -> Result<()> {
        if index >= self.node(id)?.keys.len() {
            return Err(Error::not_found("key", index.to_string().as_bytes()));
        }
        let name = self.unique_key_name(id, RENAME_PREFIX)?;
        self.node_mut(id)?.keys[index].name = Some(name.clone());
        self.delete_key(id, &name)
    }

    /// Checks that every live node is reachable from the root exactly once
    /// and that parent links agree with child lists.
    pub fn validate(&self) -> Result<()> {
        let mut seen = vec![false; self.slots.len()];
        let mut visited = 0usize;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index], true) {
                return Err(Error::custom(format!("node {} reached twice", id.index)));
            }
            visited += 1;
            for &child in &self.node(id)?.children {
                if self.node(child)?.parent != Some(id) {
                    return Err(Error::custom(format!(
                        "node {} has a wrong parent link",
                        child.index
                    )));
                }
                stack.push(child);
            }
        }
        if visited != self.len() {
            return Err(Error::custom(format!(
                "{} live nodes but {} reachable",
                self.len(),
                visited
            )));
        }
        Ok(())
    }
}

/// A borrowed view of one node.
#[derive(Clone, Copy)]
pub struct EntryRef<'a> {
    tree: &'a Tree,
    id: NodeId,
    node: &'a Node,
}

impl<'a> EntryRef<'a> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> Option<&'a [u8]> {
        self.node.name.as_deref()
    }

    #[inline]
    pub fn is_named(&self, name: &[u8]) -> bool {
        self.node.name.as_deref() == Some(name)
    }

    #[inline]
    pub fn kind(&self) -> i32 {
        self.node.kind
    }

    #[inline]
    pub fn keys(&self) -> &'a [Key] {
        &self.node.keys
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.node.keys.len()
    }

    #[inline]
    pub fn subentry_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn subentries(&self) -> impl Iterator<Item = EntryRef<'a>> + 'a {
        let tree = self.tree;
        self.node
            .children
            .iter()
            .filter_map(move |&child| tree.get(child))
    }

    pub fn subentry(&self, index: usize) -> Option<EntryRef<'a>> {
        self.node
            .children
            .get(index)
            .and_then(|&child| self.tree.get(child))
    }

    pub fn parent(&self) -> Option<EntryRef<'a>> {
        self.node.parent.and_then(|parent| self.tree.get(parent))
    }

    pub fn exist_key(&self, name: &[u8]) -> bool {
        self.search_key(name).is_some()
    }

    pub fn search_key(&self, name: &[u8]) -> Option<&'a Key> {
        self.node.keys.iter().find(|k| k.is_named(name))
    }

    pub fn search_subentry(&self, name: &[u8], recursive: bool) -> Option<EntryRef<'a>> {
        self.tree
            .find_below(self.id, name, recursive)
            .and_then(|id| self.tree.get(id))
    }

    /// Named keys in insertion order; the first key wins on duplicate names.
    pub fn key_map(&self) -> IndexMap<&'a [u8], &'a Value> {
        let mut map = IndexMap::with_capacity(self.node.keys.len());
        for key in &self.node.keys {
            if let Some(name) = key.name() {
                map.entry(name).or_insert(&key.value);
            }
        }
        map
    }

    /// Deep copy of this node and its subtree.
    pub fn to_entry(&self) -> Entry {
        Entry {
            name: self.node.name.clone(),
            kind: self.node.kind,
            keys: self.node.keys.clone(),
            subentries: self.subentries().map(|child| child.to_entry()).collect(),
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.subentries().map(|c| c.node_count()).sum::<usize>()
    }
}

impl fmt::Debug for EntryRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("id", &self.id)
            .field("name", &self.name().map(String::from_utf8_lossy))
            .field("kind", &self.kind())
            .field("keys", &self.key_count())
            .field("subentries", &self.subentry_count())
            .finish()
    }
}
