use crate::config::{Config, load_config, merge_init_config};
use crate::layout::{compute_layout, find_root};
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::parser::{ParseOutput, parse_document, parse_flow};
use crate::render::{render_svg, render_table, write_output_png, write_output_svg};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "flowfork", version, about = "Fork/merge flow layout for sized boxes")]
pub struct Args {
    /// Input file (.flow, .json, .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for svg, json and table output.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Node to lay out from. Defaults to the `root` statement or the first node.
    #[arg(short = 'r', long = "root")]
    pub root: Option<String>,

    /// Horizontal gap between sibling branches
    #[arg(long = "gap-x")]
    pub gap_x: Option<f32>,

    /// Vertical gap between stacked nodes
    #[arg(long = "gap-y")]
    pub gap_y: Option<f32>,

    /// Scale from layout units to SVG pixels
    #[arg(short = 's', long = "scale")]
    pub scale: Option<f32>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
    Table,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
            OutputFormat::Table => "txt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Flow,
    Json,
    Markdown,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut base_config = load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        base_config.render.scale = scale;
    }

    let (input, kind) = read_input(args.input.as_deref())?;
    let diagrams = match kind {
        InputKind::Markdown => extract_flow_blocks(&input),
        _ => vec![input],
    };

    if diagrams.is_empty() {
        return Err(anyhow::anyhow!("No flow diagrams found in input"));
    }

    if diagrams.len() == 1 {
        let output = match args.output_format {
            OutputFormat::Png => Some(ensure_output(&args.output, "png")?),
            _ => args.output.clone(),
        };
        return render_one(&diagrams[0], kind, &base_config, &args, output.as_deref());
    }

    // Multiple diagrams (Markdown input)
    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, diagrams.len())?;
    for (idx, diagram) in diagrams.iter().enumerate() {
        render_one(diagram, kind, &base_config, &args, Some(&outputs[idx]))
            .with_context(|| format!("diagram {}", idx + 1))?;
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn render_one(
    source: &str,
    kind: InputKind,
    base_config: &Config,
    args: &Args,
    output: Option<&Path>,
) -> Result<()> {
    let mut parsed = parse_input(source, kind)?;
    let mut config = base_config.clone();
    if let Some(init_cfg) = parsed.init_config.take() {
        config = merge_init_config(config, init_cfg)?;
    }
    if let Some(x) = args.gap_x {
        config.layout.gap.x = x;
    }
    if let Some(y) = args.gap_y {
        config.layout.gap.y = y;
    }

    let root_id = args
        .root
        .clone()
        .or(parsed.root.take())
        .ok_or_else(|| anyhow::anyhow!("Graph has no nodes"))?;
    let root = find_root(&parsed.graph, &root_id)?;
    let layout = compute_layout(&mut parsed.graph, root, &config.layout)?;
    log::info!(
        "laid out {} nodes from {root_id}: {} x {}",
        layout.nodes.len(),
        layout.width,
        layout.height
    );

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config.theme, &config.render);
            write_output_svg(&svg, output)?;
        }
        OutputFormat::Png => {
            let svg = render_svg(&layout, &config.theme, &config.render);
            let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            write_output_png(&svg, output, &config.render)?;
        }
        OutputFormat::Json => match output {
            Some(path) => write_layout_dump(path, &layout, &root_id, &config.layout)?,
            None => println!("{}", layout_dump_json(&layout, &root_id, &config.layout)?),
        },
        OutputFormat::Table => {
            let table = render_table(&layout);
            match output {
                Some(path) => std::fs::write(path, table)?,
                None => print!("{table}"),
            }
        }
    }
    Ok(())
}

fn parse_input(source: &str, kind: InputKind) -> Result<ParseOutput> {
    match kind {
        InputKind::Json => parse_document(source),
        InputKind::Flow | InputKind::Markdown => {
            if source.trim_start().starts_with('{') {
                parse_document(source)
            } else {
                parse_flow(source)
            }
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<(String, InputKind)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, InputKind::Flow));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let kind = match path.extension().and_then(|e| e.to_str()) {
            Some("md" | "markdown") => InputKind::Markdown,
            Some("json") => InputKind::Json,
            _ => InputKind::Flow,
        };
        return Ok((content, kind));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, InputKind::Flow))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn extract_flow_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_flow_fence(trimmed) {
                in_block = true;
                fence = start_fence;
                continue;
            }
        } else if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }

        if in_block {
            current.push(line.to_string());
        }
    }

    blocks
}

fn detect_flow_fence(line: &str) -> Option<String> {
    for marker in ["```", "~~~"] {
        if let Some(rest) = line.strip_prefix(marker) {
            let info = rest.trim_start_matches(marker.chars().next()?).trim();
            if info == "flow" || info == "flowfork" {
                return Some(marker.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        let mut outputs = Vec::new();
        for idx in 0..count {
            outputs.push(base.join(format!("diagram-{}.{}", idx + 1, ext)));
        }
        return Ok(outputs);
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    let mut outputs = Vec::new();
    for idx in 0..count {
        outputs.push(parent.join(format!("{}-{}.{}", stem, idx + 1, ext)));
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_flow_blocks() {
        let input = r#"
text
``` flow
A --> B
```
more
~~~flowfork
X --> Y
~~~
```rust
fn main() {}
```
"#;
        let blocks = extract_flow_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("A --> B"));
        assert!(blocks[1].contains("X --> Y"));
    }

    #[test]
    fn multi_outputs_are_numbered() {
        let outputs =
            resolve_multi_outputs(Some(Path::new("out/chart.svg")), OutputFormat::Svg, 2).unwrap();
        assert_eq!(
            outputs,
            vec![PathBuf::from("out/chart-1.svg"), PathBuf::from("out/chart-2.svg")]
        );
        assert!(resolve_multi_outputs(None, OutputFormat::Json, 2).is_err());
    }

    #[test]
    fn json_sources_are_detected_in_flow_mode() {
        let parsed = parse_input(r#"{ "nodes": [{ "id": "A" }] }"#, InputKind::Flow).unwrap();
        assert_eq!(parsed.root.as_deref(), Some("A"));
    }

    #[test]
    fn args_parse_short_flags() {
        let args = Args::try_parse_from([
            "flowfork", "-i", "demo.flow", "-e", "table", "--gap-x", "8", "-vv",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Table);
        assert_eq!(args.gap_x, Some(8.0));
        assert_eq!(args.verbose, 2);
    }
}
