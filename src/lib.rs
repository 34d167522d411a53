#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig};
pub use ir::{Graph, NodeId, Point, Size};
pub use layout::{Extent, Layout, LayoutError, compute_layout, find_root, layout, measure};
pub use parser::{parse_document, parse_flow};
pub use render::{render_svg, render_table};
pub use theme::Theme;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl RenderOptions {
    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            ..Self::default()
        }
    }

    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            ..Self::default()
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_layout_config(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}

/// Parses a flow source, lays it out from its root and renders SVG.
pub fn render_with_options(source: &str, options: RenderOptions) -> anyhow::Result<String> {
    let mut parsed = parse_flow(source)?;
    let mut config = Config {
        theme: options.theme,
        layout: options.layout,
        render: options.render,
    };
    if let Some(init) = parsed.init_config.take() {
        config = crate::config::merge_init_config(config, init)?;
    }
    let root_id = parsed
        .root
        .take()
        .ok_or_else(|| anyhow::anyhow!("Graph has no nodes"))?;
    let root = find_root(&parsed.graph, &root_id)?;
    let layout = compute_layout(&mut parsed.graph, root, &config.layout)?;
    Ok(render_svg(&layout, &config.theme, &config.render))
}

/// Parses and renders with the default options.
pub fn render(source: &str) -> anyhow::Result<String> {
    render_with_options(source, RenderOptions::default())
}
