mod error;
mod measure;
mod position;
mod splice;
pub(crate) mod types;
mod walk;

pub use error::LayoutError;
pub use types::*;

use error::Result;
use measure::measure_flow;
use position::{Placements, assign_positions};

use crate::config::LayoutConfig;
use crate::ir::{Graph, NodeId, Point};

/// Resolves a node id to its handle.
pub fn find_root(graph: &Graph, id: &str) -> Result<NodeId> {
    graph
        .find(id)
        .ok_or_else(|| LayoutError::UnknownNode { id: id.to_string() })
}

/// Computes the size tree of the flow rooted at `root` without placing
/// anything.
pub fn measure(graph: &mut Graph, root: NodeId, config: &LayoutConfig) -> Result<FlowDimensions> {
    config.validate()?;
    graph.validate(root)?;
    measure_flow(graph, root, config)
}

/// Lays out every node reachable from `root`, writing `position` on each one,
/// and returns the overall extent. The root's top-left corner lands at
/// `(root_extent.left - width / 2, 0)`; the drawing spans `0..extent.width()`
/// horizontally.
pub fn layout(graph: &mut Graph, root: NodeId, config: &LayoutConfig) -> Result<Extent> {
    let dimensions = measure(graph, root, config)?;
    log::debug!(
        "layout {} ({} nodes): left {} right {} height {}",
        graph.node(root).id,
        graph.len(),
        dimensions.extent.left,
        dimensions.extent.right,
        dimensions.extent.height
    );
    let mut placements = Placements::new(graph);
    assign_positions(
        graph,
        root,
        Point::default(),
        &dimensions,
        config,
        &mut placements,
    )?;
    if let Some(missing) = graph
        .reachable(root)
        .into_iter()
        .find(|&id| !placements.contains(id))
    {
        return Err(LayoutError::Unplaced {
            id: graph.node(missing).id.clone(),
        });
    }
    Ok(dimensions.extent)
}

/// Runs [`layout`] and snapshots the reachable nodes and edges for rendering.
pub fn compute_layout(graph: &mut Graph, root: NodeId, config: &LayoutConfig) -> Result<Layout> {
    let extent = layout(graph, root, config)?;
    let reachable = graph.reachable(root);

    let nodes = reachable
        .iter()
        .map(|&id| {
            let node = graph.node(id);
            NodeLayout {
                id: node.id.clone(),
                x: node.position.x,
                y: node.position.y,
                width: node.size.width,
                height: node.size.height,
            }
        })
        .collect();

    let mut edges = Vec::new();
    for &id in &reachable {
        let from = graph.node(id);
        for &next in &from.successors {
            let to = graph.node(next);
            edges.push(EdgeLayout {
                from: from.id.clone(),
                to: to.id.clone(),
                points: vec![
                    (
                        from.position.x + from.size.width / 2.0,
                        from.position.y + from.size.height,
                    ),
                    (to.position.x + to.size.width / 2.0, to.position.y),
                ],
            });
        }
    }

    Ok(Layout {
        extent,
        width: extent.width(),
        height: extent.height,
        nodes,
        edges,
    })
}
