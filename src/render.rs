use crate::config::RenderConfig;
use crate::layout::Layout;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(layout: &Layout, theme: &Theme, config: &RenderConfig) -> String {
    let scale = config.scale;
    let pad = config.padding;
    let width = layout.width * scale + pad * 2.0;
    let height = layout.height * scale + pad * 2.0;
    let project = |x: f32, y: f32| (pad + x * scale, pad + y * scale);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&theme.background)
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        escape_xml(&theme.line_color)
    ));
    svg.push_str("</defs>");

    for edge in &layout.edges {
        let points: Vec<(f32, f32)> = edge.points.iter().map(|&(x, y)| project(x, y)).collect();
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" marker-end=\"url(#arrow)\"/>",
            points_to_path(&points),
            escape_xml(&theme.line_color),
            config.stroke_width
        ));
    }

    for node in &layout.nodes {
        let (x, y) = project(node.x, node.y);
        let w = node.width * scale;
        let h = node.height * scale;
        svg.push_str(&format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            escape_xml(&theme.node_fill),
            escape_xml(&theme.node_border),
            config.stroke_width,
            r = config.corner_radius
        ));
        if config.show_labels {
            let cx = x + w / 2.0;
            let cy = y + h / 2.0 + theme.font_size * 0.35;
            svg.push_str(&format!(
                "<text x=\"{cx:.2}\" y=\"{cy:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                escape_xml(&theme.font_family),
                theme.font_size,
                escape_xml(&theme.node_text),
                escape_xml(&node.id)
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

/// Renders the "Dimensions" and "Nodes" tables for console output.
pub fn render_table(layout: &Layout) -> String {
    let mut out = String::new();
    push_title(&mut out, "Dimensions");
    let dimensions = [
        ("L".to_string(), format_number(layout.extent.left)),
        ("R".to_string(), format_number(layout.extent.right)),
        ("H".to_string(), format_number(layout.extent.height)),
    ];
    push_table(&mut out, &["Name", "Value"], &dimensions.map(|(a, b)| vec![a, b]));

    push_title(&mut out, "Nodes");
    let rows: Vec<Vec<String>> = layout
        .nodes
        .iter()
        .map(|node| vec![node.id.clone(), format_number(node.x), format_number(node.y)])
        .collect();
    push_table(&mut out, &["Name", "X", "Y"], &rows);
    out
}

fn push_title(out: &mut String, title: &str) {
    let line = "━".repeat(title.chars().count() + 4);
    out.push_str(&format!("\n{line}\n┃ {title} ┃\n{line}\n\n"));
}

fn push_table(out: &mut String, header: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    let border = |left: &str, mid: &str, right: &str| {
        let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}\n", cells.join(mid))
    };
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, w)| format!(" {cell:<w$} "))
            .collect();
        format!("│{}│\n", padded.join("│"))
    };

    out.push_str(&border("┌", "┬", "┐"));
    out.push_str(&line(header.to_vec()));
    out.push_str(&border("├", "┼", "┤"));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out.push_str(&border("└", "┴", "┘"));
}

fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid raster size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
