//! Arena-based scene tree.
//!
//! The [`Scene`] owns every node. Nodes reference each other through
//! [`NodeId`]s: the parent owns its children list, while `parent` and `root`
//! are plain ids pointing back up.
//!
//! ## Key Features
//!
//! - **Generational Indices**: NodeId contains index + generation so a stale
//!   id never resolves to a node allocated later in the same slot.
//!
//! - **Dense Storage**: Nodes are stored contiguously, with a sparse map for
//!   O(1) lookup and swap-remove on dispose.
//!
//! - **Per-frame traversals**: update (insertion order), pick and draw
//!   (stable z-order over a cached copy of the child list).
//!
//! - **Event dispatch**: capture/bubble along the path from the scene root
//!   to the target, plus tree-wide broadcast.

mod animate;
mod dispatch;
mod draw;
mod matrix;
mod pick;
mod update;

pub use dispatch::{EventCallback, ListenerId};
pub use update::FrameCallback;

use std::mem;

use crate::affine::Affine;
use crate::animation::{Animatable, AnimationHandle, AttrValue};
use crate::attrs::{Attr, NodeAttrs};
use crate::drawable::{ClipPath, Drawable};
use crate::error::{Result, SceneError};
use crate::event::{Event, EventType};
use crate::geometry::Geometry;

/// Unique identifier for a node in the scene.
///
/// Uses a generational index design:
/// - `index`: Position in the sparse array (reusable after dispose)
/// - `generation`: Version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Combines generation (high bits) with index (low bits).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

/// What a node draws itself as.
#[derive(Debug)]
pub enum NodeKind {
    /// Only transforms, paint state and children
    Group,
    Drawable(Drawable),
}

impl NodeKind {
    pub fn as_drawable(&self) -> Option<&Drawable> {
        match self {
            NodeKind::Drawable(d) => Some(d),
            NodeKind::Group => None,
        }
    }

    pub fn as_drawable_mut(&mut self) -> Option<&mut Drawable> {
        match self {
            NodeKind::Drawable(d) => Some(d),
            NodeKind::Group => None,
        }
    }
}

/// Entry in the sparse map, pointing to a dense array slot.
struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

pub(crate) struct Node {
    attrs: NodeAttrs,
    kind: NodeKind,
    clip_path: Option<ClipPath>,
    animation: Animatable,
    listeners: Vec<dispatch::Listener>,
    frame_listeners: Vec<(AnimationHandle, FrameCallback)>,

    parent: Option<NodeId>,
    root: NodeId,
    children: Vec<NodeId>,
    /// Reused buffer for the z-sorted copy of `children`
    sorted: Vec<NodeId>,

    current_matrix: Affine,
    previous_matrix: Affine,
    /// Stands in for the parent matrix of a detached node (markers)
    base_matrix: Option<Affine>,
    need_matrix_update: bool,

    changed: bool,
    will_be_drawn: bool,
    under_cursor: bool,

    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

/// Central storage for scene nodes plus the pointer, pick target and focus
/// shared by every tree in it.
pub struct Scene {
    dense: Vec<Node>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
    next_handle: u64,

    pointer: Option<(f64, f64)>,
    target: Option<NodeId>,
    focused: Option<NodeId>,
    time: f64,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            next_handle: 1,
            pointer: None,
            target: None,
            focused: None,
            time: 0.0,
        }
    }

    // Node creation

    /// Add a detached node and return its id. It is its own root.
    pub fn add_node(&mut self, kind: NodeKind, attrs: NodeAttrs) -> NodeId {
        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            let old_gen = self.sparse[idx as usize]
                .as_ref()
                .map(|e| e.generation)
                .unwrap_or(0);
            (idx, old_gen.wrapping_add(1))
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };
        let id = NodeId::new(sparse_index, generation);

        let dense_index = self.dense.len();
        self.dense.push(Node {
            attrs,
            kind,
            clip_path: None,
            animation: Animatable::new(),
            listeners: Vec::new(),
            frame_listeners: Vec::new(),
            parent: None,
            root: id,
            children: Vec::new(),
            sorted: Vec::new(),
            current_matrix: Affine::IDENTITY,
            previous_matrix: Affine::IDENTITY,
            base_matrix: None,
            need_matrix_update: true,
            changed: true,
            will_be_drawn: false,
            under_cursor: false,
            sparse_index,
        });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });
        id
    }

    pub fn add_group(&mut self, attrs: NodeAttrs) -> NodeId {
        self.add_node(NodeKind::Group, attrs)
    }

    pub fn add_drawable(&mut self, attrs: NodeAttrs, drawable: Drawable) -> NodeId {
        self.add_node(NodeKind::Drawable(drawable), attrs)
    }

    /// Add a drawable node with default compositing options.
    pub fn add_shape(&mut self, attrs: NodeAttrs, geometry: impl Geometry + 'static) -> NodeId {
        self.add_drawable(attrs, Drawable::new(geometry))
    }

    /// Detach `id` and free it together with its whole subtree. Ids of the
    /// freed nodes go stale.
    pub fn dispose(&mut self, id: NodeId) -> Result<()> {
        self.remove_self(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node(current) {
                stack.extend_from_slice(&node.children);
            }
            self.free(current);
        }
        Ok(())
    }

    fn free(&mut self, id: NodeId) {
        let Some(dense_index) = self.dense_index(id) else {
            return;
        };
        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);
        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(entry) = self.sparse[moved_sparse_idx as usize].as_mut() {
                entry.dense_index = dense_index;
            }
        }
        // Keep the generation so the next allocation bumps it
        self.sparse[id.index as usize] = Some(SparseEntry {
            dense_index: usize::MAX,
            generation: id.generation,
        });
        self.free_indices.push(id.index);

        if self.target == Some(id) {
            self.target = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        drop(removed);
    }

    // Lookup

    fn dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation && e.dense_index != usize::MAX)
            .map(|e| e.dense_index)
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.dense_index(id).map(|idx| &self.dense[idx])
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.dense_index(id).map(|idx| &mut self.dense[idx])
    }

    fn get(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(SceneError::StaleNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut(id).ok_or(SceneError::StaleNode(id))
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.dense.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Topmost ancestor, or the node itself when detached.
    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).map(|n| n.root)
    }

    /// Children in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// First node in the subtree of `root` (pre-order) whose `id` attribute
    /// equals `id`.
    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        let node = self.node(root)?;
        if node.attrs.id.as_deref() == Some(id) {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|&child| self.get_element_by_id(child, id))
    }

    // Attributes

    pub fn attrs(&self, id: NodeId) -> Option<&NodeAttrs> {
        self.node(id).map(|n| &n.attrs)
    }

    /// Mutable attributes. Marks the node changed and the matrices of its
    /// subtree stale.
    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut NodeAttrs> {
        self.invalidate_matrices(id);
        let node = self.node_mut(id)?;
        node.changed = true;
        Some(&mut node.attrs)
    }

    pub fn get_attr(&self, id: NodeId, attr: &Attr) -> Option<AttrValue> {
        self.node(id).and_then(|n| n.attrs.get(attr))
    }

    pub fn set_attr(&mut self, id: NodeId, attr: &Attr, value: impl Into<AttrValue>) -> Result<()> {
        let node = self.get_mut(id)?;
        node.attrs.set(attr, value.into())?;
        node.changed = true;
        if attr.affects_matrix() {
            self.invalidate_matrices(id);
        }
        Ok(())
    }

    /// Assign attributes given by name, see [`NodeAttrs::merge`].
    pub fn merge_attrs<'a, I>(&mut self, id: NodeId, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, AttrValue)>,
    {
        let node = self.get_mut(id)?;
        let result = node.attrs.merge(values);
        node.changed = true;
        self.invalidate_matrices(id);
        result
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn drawable(&self, id: NodeId) -> Option<&Drawable> {
        self.node(id).and_then(|n| n.kind.as_drawable())
    }

    /// Mutable drawable payload. Marks the node changed.
    pub fn drawable_mut(&mut self, id: NodeId) -> Option<&mut Drawable> {
        let node = self.node_mut(id)?;
        node.changed = true;
        node.kind.as_drawable_mut()
    }

    pub fn clip_path(&self, id: NodeId) -> Option<ClipPath> {
        self.node(id).and_then(|n| n.clip_path)
    }

    pub fn set_clip_path(&mut self, id: NodeId, clip_path: Option<ClipPath>) -> Result<()> {
        let node = self.get_mut(id)?;
        node.clip_path = clip_path;
        node.changed = true;
        Ok(())
    }

    // Per-frame flags

    /// Whether something in the subtree changed since the flag was last
    /// cleared. Changes propagate up to the root during update.
    pub fn is_changed(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.changed).unwrap_or(false)
    }

    pub fn clear_changed(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.changed = false;
        }
    }

    pub fn mark_changed(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.changed = true;
        }
    }

    /// Whether the node and all its ancestors were visible in the last
    /// update.
    pub fn will_be_drawn(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.will_be_drawn).unwrap_or(false)
    }

    /// Whether the node or one of its descendants was hit in the last pick.
    pub fn under_cursor(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.under_cursor).unwrap_or(false)
    }

    // Shared pointer state

    /// Pointer position in scene coordinates, used by picking.
    pub fn pointer(&self) -> Option<(f64, f64)> {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: Option<(f64, f64)>) {
        self.pointer = pointer;
    }

    /// Topmost pickable node hit by the last pick.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<NodeId>) {
        self.target = target;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Move keyboard focus, dispatching `blur` at the old node and `focus` at
    /// the new one.
    pub fn focus(&mut self, node: Option<NodeId>) -> Result<()> {
        let previous = self.focused;
        if previous == node {
            return Ok(());
        }
        log::debug!("focus {:?} -> {:?}", previous, node);
        self.focused = node;
        if let Some(old) = previous.filter(|&id| self.is_alive(id)) {
            let mut blur = Event::new(EventType::Blur)
                .target(old)
                .time(self.time)
                .related(node);
            self.dispatch_from_root(old, &mut blur)?;
        }
        if let Some(new) = node {
            let mut focus = Event::new(EventType::Focus)
                .target(new)
                .time(self.time)
                .related(previous);
            self.dispatch_from_root(new, &mut focus)?;
        }
        Ok(())
    }

    /// Time of the last update pass.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub(crate) fn next_handle(&mut self) -> AnimationHandle {
        let handle = AnimationHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    // Hierarchy

    /// Append `child` to `parent`, detaching it from its previous parent
    /// first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if self.contains(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if self.parent(child).is_some() {
            self.remove_self(child)?;
        }

        let root = {
            let node = self.get_mut(parent)?;
            node.children.push(child);
            node.changed = true;
            node.root
        };
        self.get_mut(child)?.parent = Some(parent);
        self.invalidate_matrices(child);
        self.set_root(child, root)
    }

    pub fn append_all(
        &mut self,
        parent: NodeId,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<()> {
        for child in children {
            self.append(parent, child)?;
        }
        Ok(())
    }

    /// Detach `child` from `parent`. A no-op if it is not a child of
    /// `parent`.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let node = self.get_mut(parent)?;
        let Some(pos) = node.children.iter().position(|&c| c == child) else {
            return Ok(());
        };
        node.children.remove(pos);
        node.changed = true;

        if let Some(node) = self.node_mut(child) {
            node.parent = None;
            self.invalidate_matrices(child);
            self.set_root(child, child)?;
        }
        Ok(())
    }

    /// Detach `id` from its parent, if it has one.
    pub fn remove_self(&mut self, id: NodeId) -> Result<()> {
        match self.get(id)?.parent {
            Some(parent) => self.remove(parent, id),
            None => Ok(()),
        }
    }

    /// Tell `id` about its new root, then record it through the subtree.
    fn set_root(&mut self, id: NodeId, root: NodeId) -> Result<()> {
        let mut event = Event::new(EventType::RootChanged)
            .target(id)
            .time(self.time)
            .related(Some(root));
        self.dispatch_event(id, &mut event)?;

        let children = {
            let node = self.get_mut(id)?;
            if node.root != root {
                log::debug!("root of {:?} changed to {:?}", id, root);
            }
            node.root = root;
            node.children.clone()
        };
        for child in children {
            self.set_root(child, root)?;
        }
        Ok(())
    }

    // Z-order

    /// Children of `id` stably sorted by z-index.
    pub fn z_sorted_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut sorted = self.children(id).to_vec();
        self.z_sort(&mut sorted);
        sorted
    }

    fn z_sort(&self, nodes: &mut [NodeId]) {
        nodes.sort_by_key(|&c| self.node(c).map(|n| n.attrs.z_index).unwrap_or(0));
    }

    /// Borrow the node's cached child copy, refreshed and z-sorted. Hand it
    /// back with [`Scene::put_sorted_children`].
    fn take_sorted_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(idx) = self.dense_index(id) else {
            return Vec::new();
        };
        let node = &mut self.dense[idx];
        let mut sorted = mem::take(&mut node.sorted);
        sorted.clear();
        sorted.extend_from_slice(&node.children);
        self.z_sort(&mut sorted);
        sorted
    }

    fn put_sorted_children(&mut self, id: NodeId, sorted: Vec<NodeId>) {
        if let Some(node) = self.node_mut(id) {
            node.sorted = sorted;
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
