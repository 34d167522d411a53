use std::ops::{Deref, DerefMut};

use crate::ir::{Graph, NodeId};

use super::error::{LayoutError, Result};

#[derive(Debug, Clone, Copy)]
enum Side {
    Successors,
    Predecessors,
}

#[derive(Debug)]
struct Detached {
    owner: NodeId,
    side: Side,
    index: usize,
    target: NodeId,
}

/// Fork/merge linkage detached from a graph for the lifetime of the guard.
///
/// While a `Splice` is alive the successors of `fork` no longer list it as a
/// predecessor and the predecessors of `merge` no longer list it as a
/// successor, so each branch reads as a standalone flow. Dropping the guard
/// reinserts every reference at its original index in reverse order.
pub(super) struct Splice<'g> {
    graph: &'g mut Graph,
    detached: Vec<Detached>,
}

impl<'g> Splice<'g> {
    pub(super) fn detach(graph: &'g mut Graph, fork: NodeId, merge: NodeId) -> Result<Self> {
        if graph.node(fork).successors.contains(&merge) {
            return Err(LayoutError::EmptyBranch {
                fork: graph.node(fork).id.clone(),
                merge: graph.node(merge).id.clone(),
            });
        }
        let branches = graph.node(fork).successors.clone();
        let mut splice = Self {
            graph,
            detached: Vec::new(),
        };
        for branch in branches {
            splice.remove_last(branch, Side::Predecessors, fork)?;
        }
        let tails = splice.graph.node(merge).predecessors.clone();
        for tail in tails {
            splice.remove_last(tail, Side::Successors, merge)?;
        }
        Ok(splice)
    }

    /// Restores the linkage. Equivalent to dropping the guard.
    pub(super) fn attach(self) {}

    fn remove_last(&mut self, owner: NodeId, side: Side, target: NodeId) -> Result<()> {
        let list = list_mut(self.graph, owner, side);
        let Some(index) = list.iter().rposition(|&entry| entry == target) else {
            let (from, to) = match side {
                Side::Successors => (owner, target),
                Side::Predecessors => (target, owner),
            };
            return Err(LayoutError::AsymmetricEdge {
                from: self.graph.node(from).id.clone(),
                to: self.graph.node(to).id.clone(),
            });
        };
        list.remove(index);
        self.detached.push(Detached {
            owner,
            side,
            index,
            target,
        });
        Ok(())
    }
}

impl Drop for Splice<'_> {
    fn drop(&mut self) {
        while let Some(entry) = self.detached.pop() {
            list_mut(self.graph, entry.owner, entry.side).insert(entry.index, entry.target);
        }
    }
}

impl Deref for Splice<'_> {
    type Target = Graph;

    fn deref(&self) -> &Graph {
        self.graph
    }
}

impl DerefMut for Splice<'_> {
    fn deref_mut(&mut self) -> &mut Graph {
        self.graph
    }
}

fn list_mut(graph: &mut Graph, owner: NodeId, side: Side) -> &mut Vec<NodeId> {
    let node = graph.node_mut(owner);
    match side {
        Side::Successors => &mut node.successors,
        Side::Predecessors => &mut node.predecessors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Size;

    fn diamond() -> (Graph, [NodeId; 4]) {
        let mut graph = Graph::new();
        let size = Size::new(4.0, 4.0);
        let a = graph.ensure_node("A", size);
        let b = graph.ensure_node("B", size);
        let c = graph.ensure_node("C", size);
        let d = graph.ensure_node("D", size);
        graph.connect(a, b);
        graph.connect(a, c);
        graph.connect(b, d);
        graph.connect(c, d);
        (graph, [a, b, c, d])
    }

    #[test]
    fn detach_isolates_branches() {
        let (mut graph, [a, b, c, d]) = diamond();
        let splice = Splice::detach(&mut graph, a, d).unwrap();
        assert!(splice.node(b).predecessors.is_empty());
        assert!(splice.node(c).predecessors.is_empty());
        assert!(splice.node(b).successors.is_empty());
        assert!(splice.node(c).successors.is_empty());
        assert_eq!(splice.node(a).successors, vec![b, c]);
        assert_eq!(splice.node(d).predecessors, vec![b, c]);
    }

    #[test]
    fn attach_restores_exact_order() {
        let (mut graph, [a, _, _, d]) = diamond();
        let before = graph.adjacency();
        Splice::detach(&mut graph, a, d).unwrap().attach();
        assert_eq!(graph.adjacency(), before);
    }

    #[test]
    fn nested_splices_restore_in_order() {
        let (mut graph, [a, b, c, d]) = diamond();
        let e = graph.ensure_node("E", Size::new(4.0, 4.0));
        let f = graph.ensure_node("F", Size::new(4.0, 4.0));
        graph.connect(b, e);
        graph.connect(e, f);
        graph.connect(c, f);
        let before = graph.adjacency();
        {
            let mut outer = Splice::detach(&mut graph, a, d).unwrap();
            assert_eq!(outer.node(b).successors, vec![e]);
            let inner = Splice::detach(&mut outer, b, f).unwrap();
            assert!(inner.node(e).predecessors.is_empty());
            assert!(inner.node(c).successors.is_empty());
            inner.attach();
            assert_eq!(outer.node(e).predecessors, vec![b]);
            assert_eq!(outer.node(c).successors, vec![f]);
        }
        assert_eq!(graph.adjacency(), before);
    }

    #[test]
    fn failed_detach_leaves_graph_untouched() {
        let (mut graph, [a, b, _, d]) = diamond();
        graph.node_mut(d).predecessors.insert(0, a);
        let before = graph.adjacency();
        let err = Splice::detach(&mut graph, a, d).err().unwrap();
        assert!(matches!(err, LayoutError::AsymmetricEdge { .. }));
        assert_eq!(graph.adjacency(), before);
        assert_eq!(graph.node(b).predecessors, vec![a]);
    }

    #[test]
    fn direct_merge_edge_is_rejected() {
        let (mut graph, [a, _, _, d]) = diamond();
        graph.connect(a, d);
        let err = Splice::detach(&mut graph, a, d).err().unwrap();
        assert!(matches!(err, LayoutError::EmptyBranch { .. }));
    }
}
