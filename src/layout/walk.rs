use crate::ir::{Graph, NodeId};

use super::error::{LayoutError, Result};
use super::splice::Splice;

/// Unit of a flow handed to a [`FlowVisitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Segment {
    /// A node on the uncontested spine of the flow.
    Node(NodeId),
    /// A fork whose branches all reconverge at `merge`. Delivered while the
    /// fork/merge linkage is spliced out.
    Fork { start: NodeId, merge: NodeId },
}

pub(super) trait FlowVisitor {
    fn visit(&mut self, graph: &mut Graph, segment: Segment) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct PendingFork {
    start: NodeId,
}

/// Follows first successors from `start`, reporting spine nodes and resolved
/// forks in order. Forks nested along the spine are matched with merge points
/// by counting: every merge pops one pending fork, and only the outermost one
/// is resolved.
pub(super) fn walk_flow<V: FlowVisitor>(
    graph: &mut Graph,
    start: NodeId,
    visitor: &mut V,
) -> Result<()> {
    let mut pending: Vec<PendingFork> = Vec::new();
    let mut current = start;
    loop {
        if graph.node(current).is_merge() {
            let Some(fork) = pending.pop() else {
                return Err(LayoutError::UnmatchedMerge {
                    id: graph.node(current).id.clone(),
                });
            };
            if pending.is_empty() {
                let mut spliced = Splice::detach(graph, fork.start, current)?;
                visitor.visit(
                    &mut spliced,
                    Segment::Fork {
                        start: fork.start,
                        merge: current,
                    },
                )?;
                spliced.attach();
            }
        }
        if pending.is_empty() {
            visitor.visit(graph, Segment::Node(current))?;
        }
        let node = graph.node(current);
        if node.is_fork() {
            pending.push(PendingFork { start: current });
        }
        match node.successors.first() {
            Some(&next) => current = next,
            None => break,
        }
    }
    match pending.first() {
        Some(fork) => Err(LayoutError::UnmergedFork {
            id: graph.node(fork.start).id.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Size;

    #[derive(Default)]
    struct Recorder {
        segments: Vec<Segment>,
    }

    impl FlowVisitor for Recorder {
        fn visit(&mut self, _graph: &mut Graph, segment: Segment) -> Result<()> {
            self.segments.push(segment);
            Ok(())
        }
    }

    fn build(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph.ensure_node(id, Size::new(4.0, 4.0));
        }
        for (from, to) in edges {
            let from = graph.find(from).unwrap();
            let to = graph.find(to).unwrap();
            graph.connect(from, to);
        }
        graph
    }

    #[test]
    fn chain_reports_every_node() {
        let mut graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let a = graph.find("A").unwrap();
        let mut recorder = Recorder::default();
        walk_flow(&mut graph, a, &mut recorder).unwrap();
        let ids: Vec<NodeId> = ["A", "B", "C"]
            .iter()
            .map(|id| graph.find(id).unwrap())
            .collect();
        assert_eq!(
            recorder.segments,
            ids.iter().map(|&id| Segment::Node(id)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn diamond_reports_fork_then_merge() {
        let mut graph = build(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        let a = graph.find("A").unwrap();
        let d = graph.find("D").unwrap();
        let mut recorder = Recorder::default();
        walk_flow(&mut graph, a, &mut recorder).unwrap();
        assert_eq!(
            recorder.segments,
            vec![
                Segment::Node(a),
                Segment::Fork { start: a, merge: d },
                Segment::Node(d),
            ]
        );
    }

    #[test]
    fn nested_fork_is_resolved_by_the_outer_one() {
        let mut graph = build(
            &["A", "B", "C", "D", "E", "F", "Z"],
            &[
                ("A", "B"),
                ("A", "F"),
                ("B", "C"),
                ("B", "D"),
                ("C", "E"),
                ("D", "E"),
                ("E", "Z"),
                ("F", "Z"),
            ],
        );
        let a = graph.find("A").unwrap();
        let z = graph.find("Z").unwrap();
        let mut recorder = Recorder::default();
        walk_flow(&mut graph, a, &mut recorder).unwrap();
        assert_eq!(
            recorder.segments,
            vec![
                Segment::Node(a),
                Segment::Fork { start: a, merge: z },
                Segment::Node(z),
            ]
        );
    }

    #[test]
    fn fork_without_merge_is_rejected() {
        let mut graph = build(&["A", "B", "C"], &[("A", "B"), ("A", "C")]);
        let a = graph.find("A").unwrap();
        let before = graph.adjacency();
        let err = walk_flow(&mut graph, a, &mut Recorder::default()).unwrap_err();
        assert_eq!(err, LayoutError::UnmergedFork { id: "A".to_string() });
        assert_eq!(graph.adjacency(), before);
    }

    #[test]
    fn merge_without_fork_is_rejected() {
        let mut graph = build(&["A", "B", "C"], &[("A", "C"), ("B", "C")]);
        let a = graph.find("A").unwrap();
        let err = walk_flow(&mut graph, a, &mut Recorder::default()).unwrap_err();
        assert_eq!(err, LayoutError::UnmatchedMerge { id: "C".to_string() });
    }
}
