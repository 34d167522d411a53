use crate::config::LayoutConfig;
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub root: String,
    pub gap_x: f32,
    pub gap_y: f32,
    pub left: f32,
    pub right: f32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, root: &str, config: &LayoutConfig) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        LayoutDump {
            root: root.to_string(),
            gap_x: config.gap.x,
            gap_y: config.gap.y,
            left: layout.extent.left,
            right: layout.extent.right,
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
        }
    }
}

pub fn layout_dump_json(layout: &Layout, root: &str, config: &LayoutConfig) -> anyhow::Result<String> {
    let dump = LayoutDump::from_layout(layout, root, config);
    Ok(serde_json::to_string_pretty(&dump)?)
}

pub fn write_layout_dump(
    path: &Path,
    layout: &Layout,
    root: &str,
    config: &LayoutConfig,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, root, config);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, find_root};
    use crate::parser::parse_flow;

    #[test]
    fn dump_carries_extent_and_nodes() {
        let mut parsed = parse_flow("A --> B & C\nB & C --> D\n").unwrap();
        let config = LayoutConfig::default();
        let root = find_root(&parsed.graph, "A").unwrap();
        let layout = compute_layout(&mut parsed.graph, root, &config).unwrap();
        let json = layout_dump_json(&layout, "A", &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["root"], "A");
        assert_eq!(value["left"].as_f64(), Some(6.0));
        assert_eq!(value["height"].as_f64(), Some(20.0));
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["nodes"][3]["id"], "D");
        assert_eq!(value["nodes"][3]["y"].as_f64(), Some(16.0));
    }
}
