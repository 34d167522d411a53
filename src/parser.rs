use crate::ir::{Graph, NodeId, Size};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

const DEFAULT_SIZE: Size = Size {
    width: 4.0,
    height: 4.0,
};

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i:flow|flowfork)\s*$").unwrap());
static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^size\s+(?P<w>\d+(?:\.\d+)?)\s*x\s*(?P<h>\d+(?:\.\d+)?)$").unwrap()
});
static ROOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^root\s+(?P<id>[A-Za-z0-9_]+)$").unwrap());
static NODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<id>[A-Za-z0-9_]+)(?:\s*\[\s*(?P<w>\d+(?:\.\d+)?)\s*x\s*(?P<h>\d+(?:\.\d+)?)\s*\])?$",
    )
    .unwrap()
});

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub graph: Graph,
    /// Explicit `root` statement, or the first node declared.
    pub root: Option<String>,
    pub init_config: Option<serde_json::Value>,
}

/// Parses the line-oriented flow format.
///
/// ```text
/// %%{init: {"gap": {"x": 8}}}%%
/// flow
/// size 4x4
/// G[12x8]
/// A --> B & D & H
/// B --> C
/// ```
pub fn parse_flow(input: &str) -> Result<ParseOutput> {
    let mut output = ParseOutput::default();
    let mut first_node: Option<String> = None;
    let mut default_size = DEFAULT_SIZE;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(line) {
            let value: serde_json::Value = json5::from_str(&caps[1])
                .map_err(|err| anyhow::anyhow!("line {line_no}: invalid init directive: {err}"))?;
            output.init_config = Some(value);
            continue;
        }
        if line.starts_with("%%") || line.starts_with('#') {
            continue;
        }
        let statement = strip_trailing_comment(line);
        if statement.is_empty() || HEADER_RE.is_match(statement) {
            continue;
        }
        if let Some(caps) = SIZE_RE.captures(statement) {
            default_size = Size::new(parse_number(&caps["w"])?, parse_number(&caps["h"])?);
            continue;
        }
        if let Some(caps) = ROOT_RE.captures(statement) {
            output.root = Some(caps["id"].to_string());
            continue;
        }

        let mut previous: Vec<NodeId> = Vec::new();
        for (step, part) in statement.split("-->").enumerate() {
            let part = part.trim();
            if part.is_empty() {
                return Err(anyhow::anyhow!("line {line_no}: missing node around '-->'"));
            }
            let mut current = Vec::new();
            for token in part.split('&') {
                let id = declare_node(&mut output.graph, token.trim(), default_size)
                    .with_context(|| format!("line {line_no}"))?;
                if first_node.is_none() {
                    first_node = Some(output.graph.node(id).id.clone());
                }
                current.push(id);
            }
            if step > 0 {
                for &from in &previous {
                    for &to in &current {
                        output.graph.connect(from, to);
                    }
                }
            }
            previous = current;
        }
    }

    if output.root.is_none() {
        output.root = first_node;
    }
    Ok(output)
}

fn declare_node(graph: &mut Graph, token: &str, default_size: Size) -> Result<NodeId> {
    let caps = NODE_RE
        .captures(token)
        .ok_or_else(|| anyhow::anyhow!("invalid node '{token}'"))?;
    let id = &caps["id"];
    let explicit = match (caps.name("w"), caps.name("h")) {
        (Some(w), Some(h)) => Some(Size::new(
            parse_number(w.as_str())?,
            parse_number(h.as_str())?,
        )),
        _ => None,
    };
    Ok(match (graph.find(id), explicit) {
        (Some(existing), None) => existing,
        (_, Some(size)) => graph.ensure_node(id, size),
        (None, None) => graph.ensure_node(id, default_size),
    })
}

fn parse_number(raw: &str) -> Result<f32> {
    raw.parse::<f32>()
        .map_err(|err| anyhow::anyhow!("invalid number '{raw}': {err}"))
}

fn strip_trailing_comment(line: &str) -> &str {
    match line.find("%%") {
        Some(idx) => line[..idx].trim_end(),
        None => line,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDocument {
    root: Option<String>,
    default_size: Option<SizeDocument>,
    nodes: Vec<NodeDocument>,
    #[serde(default)]
    edges: Vec<EdgeDocument>,
    init: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SizeDocument {
    width: f32,
    height: f32,
}

#[derive(Debug, Deserialize)]
struct NodeDocument {
    id: String,
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct EdgeDocument {
    from: String,
    to: String,
}

/// Parses a JSON graph document:
/// `{ "root": "A", "nodes": [{ "id": "A", "width": 4, "height": 4 }],
///    "edges": [{ "from": "A", "to": "B" }] }`.
pub fn parse_document(input: &str) -> Result<ParseOutput> {
    let document: GraphDocument =
        serde_json::from_str(input).context("invalid graph document")?;
    let fallback = document
        .default_size
        .map(|size| Size::new(size.width, size.height))
        .unwrap_or(DEFAULT_SIZE);

    let mut graph = Graph::new();
    for node in &document.nodes {
        if graph.find(&node.id).is_some() {
            return Err(anyhow::anyhow!("duplicate node id '{}'", node.id));
        }
        let size = Size::new(
            node.width.unwrap_or(fallback.width),
            node.height.unwrap_or(fallback.height),
        );
        graph.ensure_node(&node.id, size);
    }
    for edge in &document.edges {
        let from = graph
            .find(&edge.from)
            .ok_or_else(|| anyhow::anyhow!("edge references unknown node '{}'", edge.from))?;
        let to = graph
            .find(&edge.to)
            .ok_or_else(|| anyhow::anyhow!("edge references unknown node '{}'", edge.to))?;
        graph.connect(from, to);
    }

    let root = document
        .root
        .or_else(|| document.nodes.first().map(|node| node.id.clone()));
    Ok(ParseOutput {
        graph,
        root,
        init_config: document.init,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_with_sizes() {
        let parsed = parse_flow("flow\nA --> B[6x2] --> C\n").unwrap();
        let graph = &parsed.graph;
        assert_eq!(graph.len(), 3);
        let a = graph.find("A").unwrap();
        let b = graph.find("B").unwrap();
        let c = graph.find("C").unwrap();
        assert_eq!(graph.node(a).successors, vec![b]);
        assert_eq!(graph.node(b).successors, vec![c]);
        assert_eq!(graph.node(b).size, Size::new(6.0, 2.0));
        assert_eq!(graph.node(c).size, DEFAULT_SIZE);
        assert_eq!(parsed.root.as_deref(), Some("A"));
    }

    #[test]
    fn fan_out_keeps_source_order() {
        let parsed = parse_flow("A --> B & D & H\nB --> C\n").unwrap();
        let graph = &parsed.graph;
        let a = graph.find("A").unwrap();
        let targets: Vec<&str> = graph
            .node(a)
            .successors
            .iter()
            .map(|&id| graph.node(id).id.as_str())
            .collect();
        assert_eq!(targets, vec!["B", "D", "H"]);
    }

    #[test]
    fn fan_in_connects_every_source() {
        let parsed = parse_flow("B & C --> D").unwrap();
        let graph = &parsed.graph;
        let d = graph.find("D").unwrap();
        assert_eq!(graph.node(d).predecessors.len(), 2);
    }

    #[test]
    fn size_directive_applies_to_later_nodes() {
        let parsed = parse_flow("A\nsize 10x2\nA --> B\n").unwrap();
        let graph = &parsed.graph;
        assert_eq!(graph.node(graph.find("A").unwrap()).size, DEFAULT_SIZE);
        assert_eq!(
            graph.node(graph.find("B").unwrap()).size,
            Size::new(10.0, 2.0)
        );
    }

    #[test]
    fn root_statement_and_comments() {
        let parsed = parse_flow(
            "%% demo\nroot B\nA --> B %% trailing\n# hash comment\nB --> C\n",
        )
        .unwrap();
        assert_eq!(parsed.root.as_deref(), Some("B"));
        assert_eq!(parsed.graph.len(), 3);
    }

    #[test]
    fn init_directive_is_captured() {
        let parsed = parse_flow("%%{init: {gap: {x: 8}}}%%\nA --> B\n").unwrap();
        let init = parsed.init_config.unwrap();
        assert_eq!(init["gap"]["x"].as_f64(), Some(8.0));
    }

    #[test]
    fn malformed_lines_report_numbers() {
        let err = parse_flow("A --> B\nA --> \n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        let err = parse_flow("A --> B(x)\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid node"));
    }

    #[test]
    fn parses_json_document() {
        let parsed = parse_document(
            r#"{
                "defaultSize": { "width": 2, "height": 2 },
                "nodes": [{ "id": "A" }, { "id": "B", "width": 8 }],
                "edges": [{ "from": "A", "to": "B" }]
            }"#,
        )
        .unwrap();
        let graph = &parsed.graph;
        assert_eq!(parsed.root.as_deref(), Some("A"));
        assert_eq!(
            graph.node(graph.find("B").unwrap()).size,
            Size::new(8.0, 2.0)
        );
    }

    #[test]
    fn negative_document_sizes_fail_layout() {
        let mut parsed = parse_document(
            r#"{
                "nodes": [{ "id": "A", "width": -10, "height": -3 }, { "id": "B" }],
                "edges": [{ "from": "A", "to": "B" }]
            }"#,
        )
        .unwrap();
        let root = crate::layout::find_root(&parsed.graph, "A").unwrap();
        let err = crate::layout::layout(&mut parsed.graph, root, &crate::config::LayoutConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            crate::layout::LayoutError::InvalidSize {
                id: "A".to_string(),
                width: -10.0,
                height: -3.0,
            }
        );
    }

    #[test]
    fn json_document_rejects_unknown_endpoint() {
        let err = parse_document(r#"{ "nodes": [{ "id": "A" }], "edges": [{ "from": "A", "to": "Q" }] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("'Q'"));
    }
}
