//! In-memory namespace tree.
//!
//! Nodes live in a slot arena addressed by generational [`NodeId`]s. A node
//! owns an insertion-ordered list of child ids and keeps a non-owning parent
//! id for path reconstruction. Removing a subtree frees its slots and bumps
//! their generations, so a stale id resolves to nothing instead of to the
//! slot's next occupant.

pub mod path;

use omnifs_types::{DirEntry, NodeId};

use crate::error::{FsError, FsResult};

/// One namespace node.
#[derive(Debug, Clone)]
pub struct Node {
    pub entry: DirEntry,
    /// File payload; always empty for directories.
    pub data: Vec<u8>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(entry: DirEntry) -> Self {
        Self::with_data(entry, Vec::new())
    }

    pub fn with_data(entry: DirEntry, data: Vec<u8>) -> Self {
        Self {
            entry,
            data,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_dir(&self) -> bool {
        self.entry.is_dir()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed namespace tree with exactly one root.
#[derive(Debug)]
pub struct NamespaceTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
}

impl NamespaceTree {
    /// Tree holding only `root_entry`.
    pub fn new(root_entry: DirEntry) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
            live: 0,
        };
        tree.root = tree.alloc(Node::new(root_entry));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index() as usize) {
            if slot.generation == id.generation() && slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index());
                self.live -= 1;
            }
        }
    }

    /// Look up a node. Stale or foreign ids yield `None`.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn entry(&self, id: NodeId) -> Option<&DirEntry> {
        self.get(id).map(|n| &n.entry)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Exact-name lookup among `parent`'s children.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).is_some_and(|n| n.entry.name == name))
    }

    /// Walk an absolute path from the root.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root;
        for name in path::components(path)? {
            current = self.find_child(current, name)?;
        }
        Some(current)
    }

    /// Allocate `node` and append it to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> FsResult<NodeId> {
        self.check_can_adopt(parent, &node.entry.name)?;
        let id = self.alloc(node);
        self.link(parent, id);
        Ok(id)
    }

    /// Re-link a detached node under `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> FsResult<()> {
        let node = self
            .get(child)
            .ok_or_else(|| FsError::not_found(format!("node {}", child)))?;
        if node.parent.is_some() || child == self.root {
            return Err(FsError::invalid_operation(format!(
                "node {} is still attached",
                child
            )));
        }
        if self.is_ancestor(child, parent) {
            return Err(FsError::invalid_operation(format!(
                "cannot move node {} beneath itself",
                child
            )));
        }
        let name = node.entry.name.clone();
        self.check_can_adopt(parent, &name)?;
        self.link(parent, child);
        Ok(())
    }

    fn check_can_adopt(&self, parent: NodeId, name: &str) -> FsResult<()> {
        let p = self
            .get(parent)
            .ok_or_else(|| FsError::not_found(format!("node {}", parent)))?;
        if !p.is_dir() {
            return Err(FsError::invalid_operation(format!(
                "{} is not a directory",
                p.entry.name
            )));
        }
        if self.find_child(parent, name).is_some() {
            return Err(FsError::file_exists(name));
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
    }

    /// Unlink the child called `name` without freeing it.
    pub fn detach_child(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        let child = self.find_child(parent, name)?;
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
        Some(child)
    }

    /// Unlink the child called `name` and free its whole subtree.
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> bool {
        let Some(child) = self.detach_child(parent, name) else {
            return false;
        };
        for id in self.preorder(child) {
            self.release(id);
        }
        true
    }

    /// Absolute path of a node, rebuilt from parent links.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = id;
        loop {
            let node = self.get(current)?;
            match node.parent {
                Some(parent) => {
                    names.push(node.entry.name.as_str());
                    current = parent;
                }
                None if current == self.root => break,
                // detached
                None => return None,
            }
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// True if `ancestor` is `node` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Ids of `start`'s subtree in depth-first pre-order.
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// `(files, directories)` reachable from the root, root included.
    pub fn count_kinds(&self) -> (u32, u32) {
        let mut files = 0;
        let mut dirs = 0;
        for id in self.preorder(self.root) {
            match self.get(id) {
                Some(n) if n.is_dir() => dirs += 1,
                Some(_) => files += 1,
                None => {}
            }
        }
        (files, dirs)
    }

    /// Highest inode reachable from the root.
    pub fn max_inode(&self) -> u32 {
        self.preorder(self.root)
            .into_iter()
            .filter_map(|id| self.get(id).map(|n| n.entry.inode))
            .max()
            .unwrap_or(0)
    }
}

// ============================================================================
// Tests
// ============================================================================
