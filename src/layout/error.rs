pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown node: {id}")]
    UnknownNode { id: String },

    #[error("root node {id} has incoming edges")]
    RootHasPredecessors { id: String },

    #[error("edge {from} -> {to} is not recorded in both directions")]
    AsymmetricEdge { from: String, to: String },

    #[error("edge {from} -> {to} appears more than once")]
    DuplicateEdge { from: String, to: String },

    #[error("graph contains a cycle through node {id}")]
    Cycle { id: String },

    #[error("merge point {id} is reached without a pending fork")]
    UnmatchedMerge { id: String },

    #[error("branches of fork {id} never reconverge")]
    UnmergedFork { id: String },

    #[error("fork {fork} links its merge point {merge} directly")]
    EmptyBranch { fork: String, merge: String },

    #[error("no size record for node {id}")]
    MissingDimensions { id: String },

    #[error("node {id} is reached from more than one converging path")]
    NodePlacedTwice { id: String },

    #[error("node {id} is reachable but was never placed")]
    Unplaced { id: String },

    #[error("node {id} has invalid size {width}x{height}")]
    InvalidSize { id: String, width: f32, height: f32 },

    #[error("{axis} gap must be finite and non-negative, got {value}")]
    InvalidGap { axis: char, value: f32 },
}
