use crate::config::LayoutConfig;
use crate::ir::{Graph, NodeId, Point};

use super::error::{LayoutError, Result};
use super::types::FlowDimensions;
use super::walk::{FlowVisitor, Segment, walk_flow};

/// Nodes placed so far in one layout invocation.
pub(super) struct Placements {
    placed: Vec<bool>,
}

impl Placements {
    pub(super) fn new(graph: &Graph) -> Self {
        Self {
            placed: vec![false; graph.len()],
        }
    }

    pub(super) fn contains(&self, id: NodeId) -> bool {
        self.placed[id.index()]
    }

    fn mark(&mut self, graph: &Graph, id: NodeId) -> Result<()> {
        if std::mem::replace(&mut self.placed[id.index()], true) {
            return Err(LayoutError::NodePlacedTwice {
                id: graph.node(id).id.clone(),
            });
        }
        Ok(())
    }
}

struct Placer<'a> {
    config: &'a LayoutConfig,
    dimensions: &'a FlowDimensions,
    origin: Point,
    cursor: f32,
    placements: &'a mut Placements,
}

impl FlowVisitor for Placer<'_> {
    fn visit(&mut self, graph: &mut Graph, segment: Segment) -> Result<()> {
        let dimensions = self.dimensions;
        let axis = self.origin.x + dimensions.extent.left;
        match segment {
            Segment::Node(id) => {
                self.placements.mark(graph, id)?;
                let node = graph.node_mut(id);
                let mut y = self.cursor;
                if !node.predecessors.is_empty() {
                    y += self.config.gap.y;
                }
                node.position = Point::new(axis - node.size.width / 2.0, y);
                self.cursor = y + node.size.height;
                log::trace!("place {} at ({}, {})", node.id, node.position.x, y);
            }
            Segment::Fork { start, .. } => {
                let fork = dimensions.forks.get(&start).ok_or_else(|| {
                    LayoutError::MissingDimensions {
                        id: graph.node(start).id.clone(),
                    }
                })?;
                let branches = graph.node(start).successors.clone();
                let mut x = axis - fork.extent.left;
                let mut y = self.cursor;
                if !branches.is_empty() {
                    y += self.config.gap.y;
                }
                for branch in branches {
                    let flow = fork.flows.get(&branch).ok_or_else(|| {
                        LayoutError::MissingDimensions {
                            id: graph.node(branch).id.clone(),
                        }
                    })?;
                    assign_positions(
                        graph,
                        branch,
                        Point::new(x, y),
                        flow,
                        self.config,
                        self.placements,
                    )?;
                    x += flow.extent.width() + self.config.gap.x;
                }
                self.cursor = y + fork.extent.height;
            }
        }
        Ok(())
    }
}

/// Places the flow starting at `start` with its left edge at `origin.x` and
/// its top at `origin.y`, reading sizes from `dimensions`.
pub(super) fn assign_positions(
    graph: &mut Graph,
    start: NodeId,
    origin: Point,
    dimensions: &FlowDimensions,
    config: &LayoutConfig,
    placements: &mut Placements,
) -> Result<()> {
    let mut placer = Placer {
        config,
        dimensions,
        origin,
        cursor: origin.y,
        placements,
    };
    walk_flow(graph, start, &mut placer)
}
