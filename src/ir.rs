use std::collections::{BTreeMap, HashMap};

use crate::layout::LayoutError;

/// Handle to a node inside a [`Graph`].
///
/// Handles come from [`Graph::ensure_node`], [`Graph::find`] or
/// `layout::find_root` and are only meaningful for the graph that issued
/// them. [`Graph::node`], [`Graph::node_mut`] and [`Graph::connect`] panic on
/// a handle from another graph whose index is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub size: Size,
    pub position: Point,
    pub successors: Vec<NodeId>,
    pub predecessors: Vec<NodeId>,
}

impl Node {
    pub fn is_fork(&self) -> bool {
        self.successors.len() > 1
    }

    pub fn is_merge(&self) -> bool {
        self.predecessors.len() > 1
    }
}

/// Ordered successor/predecessor lists of every node, in arena order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency(Vec<(Vec<NodeId>, Vec<NodeId>)>);

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: BTreeMap<String, NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, or resizes the node that already carries `id`.
    pub fn ensure_node(&mut self, id: &str, size: Size) -> NodeId {
        if let Some(&existing) = self.index.get(id) {
            self.nodes[existing.0].size = size;
            return existing;
        }
        let handle = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            size,
            position: Point::default(),
            successors: Vec::new(),
            predecessors: Vec::new(),
        });
        self.index.insert(id.to_string(), handle);
        handle
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].successors.push(to);
        self.nodes[to.0].predecessors.push(from);
    }

    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this graph.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn adjacency(&self) -> Adjacency {
        Adjacency(
            self.nodes
                .iter()
                .map(|node| (node.successors.clone(), node.predecessors.clone()))
                .collect(),
        )
    }

    /// Nodes reachable from `root` through successor edges, in arena order.
    pub fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        seen[root.0] = true;
        while let Some(current) = stack.pop() {
            for &next in &self.nodes[current.0].successors {
                if !seen[next.0] {
                    seen[next.0] = true;
                    stack.push(next);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter(|(_, visited)| **visited)
            .map(|(idx, _)| NodeId(idx))
            .collect()
    }

    /// Checks the preconditions a layout from `root` relies on: a root without
    /// incoming edges, mirrored adjacency without duplicates, no cycle, and
    /// finite non-negative sizes on every reachable node.
    pub fn validate(&self, root: NodeId) -> Result<(), LayoutError> {
        let root_node = self.node(root);
        if !root_node.predecessors.is_empty() {
            return Err(LayoutError::RootHasPredecessors {
                id: root_node.id.clone(),
            });
        }
        self.validate_edges()?;
        self.validate_acyclic(root)?;
        self.validate_sizes(root)
    }

    fn validate_sizes(&self, root: NodeId) -> Result<(), LayoutError> {
        for id in self.reachable(root) {
            let node = self.node(id);
            let Size { width, height } = node.size;
            if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
                return Err(LayoutError::InvalidSize {
                    id: node.id.clone(),
                    width,
                    height,
                });
            }
        }
        Ok(())
    }

    fn validate_edges(&self) -> Result<(), LayoutError> {
        let mut outgoing: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for (from, node) in self.nodes() {
            for &to in &node.successors {
                let count = outgoing.entry((from, to)).or_default();
                *count += 1;
                if *count > 1 {
                    return Err(LayoutError::DuplicateEdge {
                        from: node.id.clone(),
                        to: self.node(to).id.clone(),
                    });
                }
            }
        }
        let mut incoming: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for (to, node) in self.nodes() {
            for &from in &node.predecessors {
                *incoming.entry((from, to)).or_default() += 1;
            }
        }
        for (&(from, to), &count) in &outgoing {
            if incoming.get(&(from, to)) != Some(&count) {
                return Err(self.asymmetric(from, to));
            }
        }
        for (&(from, to), &count) in &incoming {
            if outgoing.get(&(from, to)) != Some(&count) {
                return Err(self.asymmetric(from, to));
            }
        }
        Ok(())
    }

    fn validate_acyclic(&self, root: NodeId) -> Result<(), LayoutError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        marks[root.0] = Mark::Active;
        while let Some((current, cursor)) = stack.last().copied() {
            let successors = &self.nodes[current.0].successors;
            if cursor == successors.len() {
                marks[current.0] = Mark::Done;
                stack.pop();
                continue;
            }
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            let next = successors[cursor];
            match marks[next.0] {
                Mark::Active => {
                    return Err(LayoutError::Cycle {
                        id: self.node(next).id.clone(),
                    });
                }
                Mark::Unvisited => {
                    marks[next.0] = Mark::Active;
                    stack.push((next, 0));
                }
                Mark::Done => {}
            }
        }
        Ok(())
    }

    fn asymmetric(&self, from: NodeId, to: NodeId) -> LayoutError {
        LayoutError::AsymmetricEdge {
            from: self.node(from).id.clone(),
            to: self.node(to).id.clone(),
        }
    }
}
