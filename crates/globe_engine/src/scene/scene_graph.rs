//! Flat scene graph
//!
//! Nodes live in a slot map and point at their parent. World matrices are
//! composed on demand by walking up the parent chain; the graph stays small
//! (a few dozen nodes) so nothing is cached.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Transform};
use crate::render::{GeometryHandle, MaterialHandle};

new_key_type! {
    /// Handle to a scene node
    pub struct NodeId;
}

/// Geometry and material a node draws with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    /// Backend geometry
    pub geometry: GeometryHandle,
    /// Backend material
    pub material: MaterialHandle,
}

/// One entry of the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Debug name
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Parent node, `None` for roots
    pub parent: Option<NodeId>,
    /// What to draw, `None` for pure pivots
    pub drawable: Option<Drawable>,
    /// Opacity multiplier for this node only
    pub opacity: f32,
    /// Hidden nodes hide their children too
    pub visible: bool,
}

impl SceneNode {
    /// Visible pivot with an identity transform
    pub fn pivot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            parent: None,
            drawable: None,
            opacity: 1.0,
            visible: true,
        }
    }

    /// Visible node drawing `drawable`
    pub fn drawable(name: impl Into<String>, drawable: Drawable) -> Self {
        Self {
            drawable: Some(drawable),
            ..Self::pivot(name)
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Node resolved for drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    /// What to draw
    pub drawable: Drawable,
    /// Object-to-world matrix
    pub world: Mat4,
    /// Node opacity
    pub opacity: f32,
}

/// Scene graph storage
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    order: Vec<NodeId>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; draw order follows insertion order
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = self.nodes.insert(node);
        self.order.push(id);
        id
    }

    /// Node by id
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutable node by id
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every drawable in the graph, in insertion order
    pub fn drawables(&self) -> impl Iterator<Item = Drawable> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(*id)?.drawable)
    }

    /// Direct children of a node, in insertion order
    pub fn children_of(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |id| self.nodes.get(*id).is_some_and(|node| node.parent == Some(parent)))
    }

    /// Local-to-world matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            matrix = node.transform.to_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// True if the node and all its ancestors are visible
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Visible drawables with their world matrices, in insertion order
    pub fn render_items(&self) -> impl Iterator<Item = RenderItem> + '_ {
        self.order.iter().filter_map(move |&id| {
            let node = self.nodes.get(id)?;
            let drawable = node.drawable?;
            if !self.is_visible(id) {
                return None;
            }
            Some(RenderItem {
                drawable,
                world: self.world_matrix(id),
                opacity: node.opacity,
            })
        })
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }
}
