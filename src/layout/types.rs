use std::collections::BTreeMap;

use crate::ir::NodeId;

/// Bounding box relative to a vertical reference axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    pub left: f32,
    pub right: f32,
    pub height: f32,
}

impl Extent {
    pub fn width(&self) -> f32 {
        self.left + self.right
    }
}

/// Size of a flow plus the records of every fork resolved along it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowDimensions {
    pub extent: Extent,
    pub forks: BTreeMap<NodeId, ForkDimensions>,
}

/// Size of a fork plus the flow record of each branch, keyed by branch start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForkDimensions {
    pub extent: Extent,
    pub flows: BTreeMap<NodeId, FlowDimensions>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeLayout {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub extent: Extent,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
