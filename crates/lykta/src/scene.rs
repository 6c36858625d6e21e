//! # Scene Graph — Nodes, Hierarchy, and World Transforms
//!
//! A [`Scene`] owns every [`Node`] in an arena and links them into a tree
//! under a single root. Nodes are addressed by [`NodeId`], a generational
//! index: despawning a node bumps its slot's generation, so an old id can
//! never reach whatever reuses the slot.
//!
//! ```text
//! slots:  [root v0] [group v0] [cube v0] [  free v1  ] [light v0]
//!             │          │          ▲                       ▲
//!             └─children─┴──────────┘                       │
//!             └─children────────────────────────────────────┘
//! ```
//!
//! ## Attach, Detach, Despawn
//!
//! - [`add`](Scene::add) moves a node (and its subtree) under a new parent,
//!   unlinking it from the old one first. A node is never in two child
//!   lists, and a node can never become its own ancestor.
//! - [`remove`](Scene::remove) unlinks a subtree but keeps it in the arena.
//!   It stops rendering and its lights go dark, but it can be re-added.
//! - [`despawn`](Scene::despawn) frees the subtree for good.
//!
//! ## World Transforms
//!
//! [`world_transform`](Scene::world_transform) multiplies local matrices
//! root-to-leaf on every call. Nothing is cached between frames, so editing
//! any ancestor's transform is visible immediately.
//!
//! ## Traversal Order
//!
//! Depth-first, parent before children, siblings in insertion order. Render
//! collection uses the same order, so draw order is deterministic.
//!
//! ## Comparison
//!
//! - **three.js**: `Object3D.add` also reparents. `matrixWorld` is cached and
//!   refreshed by `updateMatrixWorld` once per render.
//! - **Bevy**: `Parent`/`Children` components with a transform propagation
//!   system that writes `GlobalTransform` each frame.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::{Mat4, Quat, Transform, Vec3, look_rotation};

/// Generational handle to a node in a [`Scene`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Renderable payload: shared geometry and material plus shadow flags.
///
/// Either resource may be missing while it is still loading. The renderer
/// skips a mesh until both are present.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub geometry: Option<Arc<Geometry>>,
    pub material: Option<Arc<Material>>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            geometry: Some(geometry),
            material: Some(material),
            ..Self::default()
        }
    }

    /// A mesh waiting for its resources to be delivered.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn with_cast_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast;
        self
    }

    pub fn with_receive_shadow(mut self, receive: bool) -> Self {
        self.receive_shadow = receive;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.geometry.is_some() && self.material.is_some()
    }
}

/// What a node is, beyond its transform.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    Camera(Camera),
    Light(Light),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh(_) => "mesh",
            NodeKind::Camera(_) => "camera",
            NodeKind::Light(_) => "light",
        }
    }
}

/// A transformable node.
///
/// Hierarchy links are owned by the [`Scene`]; a freshly built node has no
/// parent and no children.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn camera(name: impl Into<String>, camera: Camera) -> Self {
        Self::new(name, NodeKind::Camera(camera))
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.translation = Vec3::new(x, y, z);
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The scene graph.
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    lights: BTreeSet<NodeId>,
}

impl Scene {
    /// An empty scene with only the root group.
    pub fn new() -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            lights: BTreeSet::new(),
        };
        scene.root = scene.allocate(Node::group("scene"));
        scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(Error::StaleNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or(Error::StaleNode(id))
    }

    /// Number of live nodes, attached or not, including the root.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    // ── Building ────────────────────────────────────────────────────────

    /// Insert a node under the root.
    pub fn spawn(&mut self, node: Node) -> NodeId {
        let id = self.allocate(node);
        self.link(self.root, id);
        self.refresh_lights(id);
        id
    }

    /// Insert a node under `parent`.
    pub fn spawn_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.allocate(node);
        self.link(parent, id);
        self.refresh_lights(id);
        Ok(id)
    }

    /// Insert a node outside the tree. It renders only once [`add`](Self::add)ed.
    pub fn spawn_detached(&mut self, node: Node) -> NodeId {
        self.allocate(node)
    }

    fn allocate(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, node: Some(node) });
            NodeId { index, generation: 0 }
        }
    }

    // ── Hierarchy ───────────────────────────────────────────────────────

    /// Attach `child` (with its subtree) under `parent`, detaching it from
    /// its previous parent first. Re-adding to the same parent moves the
    /// child to the end of the sibling list.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(Error::RootNode);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(Error::CyclicHierarchy { parent, child });
        }
        self.unlink(child);
        self.link(parent, child);
        self.refresh_lights(child);
        log::debug!("attached {child:?} under {parent:?}");
        Ok(())
    }

    /// Detach a subtree from the tree without destroying it.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if id == self.root {
            return Err(Error::RootNode);
        }
        self.unlink(id);
        self.refresh_lights(id);
        Ok(())
    }

    /// Destroy a node and all of its descendants. Their ids become stale.
    pub fn despawn(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if id == self.root {
            return Err(Error::RootNode);
        }
        self.unlink(id);
        let doomed = self.subtree(id);
        for node in &doomed {
            self.lights.remove(node);
            let slot = &mut self.slots[node.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        log::debug!("despawned {} node(s) rooted at {id:?}", doomed.len());
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(old) = self.get_mut(child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(p) = self.get_mut(old) {
            p.children.retain(|&c| c != child);
        }
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Whether `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.get(id).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|n| n.parent);
        }
        false
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && (id == self.root || self.is_ancestor(self.root, id))
    }

    /// `id` and all of its descendants, in traversal order.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get(current) {
                out.push(current);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// All attached nodes: depth-first, parents before children, siblings in
    /// insertion order.
    pub fn traverse(&self) -> Vec<NodeId> {
        self.subtree(self.root)
    }

    /// Visit every attached node whose whole ancestor chain is visible,
    /// together with its world matrix, in traversal order.
    ///
    /// World matrices are composed on the way down, once per visit.
    pub fn visit_visible(&self, mut visit: impl FnMut(NodeId, &Node, Mat4)) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            visit(id, node, world);
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }
    }

    /// First attached node with this name, in traversal order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.traverse()
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|n| n.name == name))
    }

    // ── Transforms ──────────────────────────────────────────────────────

    /// Compose local transforms from the topmost ancestor down to `id`.
    ///
    /// For a detached subtree the composition starts at the subtree's own
    /// top node.
    pub fn world_transform(&self, id: NodeId) -> Result<Mat4> {
        let mut chain = vec![self.node(id)?];
        let mut cursor = chain[0].parent;
        while let Some(parent) = cursor {
            let node = self.node(parent)?;
            chain.push(node);
            cursor = node.parent;
        }
        Ok(chain
            .iter()
            .rev()
            .fold(Mat4::IDENTITY, |world, node| world * node.transform.matrix()))
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3> {
        Ok(self.world_transform(id)?.w_axis.truncate())
    }

    fn parent_world_rotation(&self, id: NodeId) -> Result<Quat> {
        match self.node(id)?.parent {
            Some(parent) => {
                let (_, rotation, _) = self.world_transform(parent)?.to_scale_rotation_translation();
                Ok(rotation)
            }
            None => Ok(Quat::IDENTITY),
        }
    }

    /// Rotate `id` so its -Z axis points at the world-space `target`.
    ///
    /// Position is untouched. If the node already sits on the target the
    /// rotation is left as is.
    pub fn look_at(&mut self, id: NodeId, target: Vec3) -> Result<()> {
        let eye = self.world_position(id)?;
        let Some(world_rotation) = look_rotation(eye, target, Vec3::Y) else {
            return Ok(());
        };
        let local = self.parent_world_rotation(id)?.inverse() * world_rotation;
        self.node_mut(id)?.transform.rotation = local.normalize();
        Ok(())
    }

    /// Move `id` so that its world position is `position`, then aim it at
    /// `target`. Used by camera controllers.
    pub fn place_looking_at(&mut self, id: NodeId, position: Vec3, target: Vec3) -> Result<()> {
        let parent_world = match self.node(id)?.parent {
            Some(parent) => self.world_transform(parent)?,
            None => Mat4::IDENTITY,
        };
        let local = parent_world.inverse().transform_point3(position);
        self.node_mut(id)?.transform.translation = local;
        self.look_at(id, target)
    }

    // ── Typed access ────────────────────────────────────────────────────

    pub fn camera(&self, id: NodeId) -> Result<&Camera> {
        match &self.node(id)?.kind {
            NodeKind::Camera(c) => Ok(c),
            other => Err(wrong_kind(id, "camera", other)),
        }
    }

    pub fn camera_mut(&mut self, id: NodeId) -> Result<&mut Camera> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Camera(c) => Ok(c),
            other => Err(wrong_kind(id, "camera", other)),
        }
    }

    pub fn light(&self, id: NodeId) -> Result<&Light> {
        match &self.node(id)?.kind {
            NodeKind::Light(l) => Ok(l),
            other => Err(wrong_kind(id, "light", other)),
        }
    }

    pub fn light_mut(&mut self, id: NodeId) -> Result<&mut Light> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Light(l) => Ok(l),
            other => Err(wrong_kind(id, "light", other)),
        }
    }

    pub fn mesh(&self, id: NodeId) -> Result<&Mesh> {
        match &self.node(id)?.kind {
            NodeKind::Mesh(m) => Ok(m),
            other => Err(wrong_kind(id, "mesh", other)),
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Result<&mut Mesh> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Mesh(m) => Ok(m),
            other => Err(wrong_kind(id, "mesh", other)),
        }
    }

    // ── Lights ──────────────────────────────────────────────────────────

    /// Light nodes currently reachable from the root, in id order.
    pub fn active_lights(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.lights.iter().copied()
    }

    pub fn is_light_active(&self, id: NodeId) -> bool {
        self.lights.contains(&id)
    }

    fn refresh_lights(&mut self, top: NodeId) {
        let attached = self.is_attached(top);
        for id in self.subtree(top) {
            let is_light = matches!(self.get(id).map(|n| &n.kind), Some(NodeKind::Light(_)));
            if is_light && attached {
                self.lights.insert(id);
            } else {
                self.lights.remove(&id);
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_kind(node: NodeId, expected: &'static str, found: &NodeKind) -> Error {
    Error::WrongKind { node, expected, found: found.label() }
}
