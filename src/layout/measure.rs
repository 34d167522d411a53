use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::{Graph, NodeId};

use super::error::Result;
use super::types::{Extent, FlowDimensions, ForkDimensions};
use super::walk::{FlowVisitor, Segment, walk_flow};

struct FlowMeasurer<'a> {
    config: &'a LayoutConfig,
    extent: Extent,
    forks: BTreeMap<NodeId, ForkDimensions>,
}

impl FlowVisitor for FlowMeasurer<'_> {
    fn visit(&mut self, graph: &mut Graph, segment: Segment) -> Result<()> {
        match segment {
            Segment::Node(id) => {
                let node = graph.node(id);
                self.extent.height += node.size.height;
                if !node.predecessors.is_empty() {
                    self.extent.height += self.config.gap.y;
                }
                let half = node.size.width / 2.0;
                self.extent.left = self.extent.left.max(half);
                self.extent.right = self.extent.right.max(half);
            }
            Segment::Fork { start, merge } => {
                let fork = measure_fork(graph, start, self.config)?;
                log::debug!(
                    "fork {} -> {}: left {} right {} height {}",
                    graph.node(start).id,
                    graph.node(merge).id,
                    fork.extent.left,
                    fork.extent.right,
                    fork.extent.height
                );
                self.extent.height += fork.extent.height;
                if !graph.node(start).successors.is_empty() {
                    self.extent.height += self.config.gap.y;
                }
                self.extent.left = self.extent.left.max(fork.extent.left);
                self.extent.right = self.extent.right.max(fork.extent.right);
                self.forks.insert(start, fork);
            }
        }
        Ok(())
    }
}

/// Measures the flow that starts at `start`.
pub(super) fn measure_flow(
    graph: &mut Graph,
    start: NodeId,
    config: &LayoutConfig,
) -> Result<FlowDimensions> {
    let mut measurer = FlowMeasurer {
        config,
        extent: Extent::default(),
        forks: BTreeMap::new(),
    };
    walk_flow(graph, start, &mut measurer)?;
    Ok(FlowDimensions {
        extent: measurer.extent,
        forks: measurer.forks,
    })
}

/// Measures every branch of the fork at `start` side by side. The fork's axis
/// sits halfway between the first branch's axis and the last branch's axis.
pub(super) fn measure_fork(
    graph: &mut Graph,
    start: NodeId,
    config: &LayoutConfig,
) -> Result<ForkDimensions> {
    let branches = graph.node(start).successors.clone();
    let mut flows = BTreeMap::new();
    let mut height: f32 = 0.0;
    let mut width: f32 = 0.0;
    let mut first_axis = 0.0;
    let mut last_axis = 0.0;
    for (idx, &branch) in branches.iter().enumerate() {
        let flow = measure_flow(graph, branch, config)?;
        height = height.max(flow.extent.height);
        width += flow.extent.width();
        if idx == 0 {
            first_axis = flow.extent.left;
        }
        if idx + 1 == branches.len() {
            last_axis = width - flow.extent.right;
        } else {
            width += config.gap.x;
        }
        flows.insert(branch, flow);
    }
    let left = (first_axis + last_axis) / 2.0;
    Ok(ForkDimensions {
        extent: Extent {
            left,
            right: width - left,
            height,
        },
        flows,
    })
}
