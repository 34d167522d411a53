use crate::layout::LayoutError;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Between sibling branches of a fork.
    pub x: f32,
    /// Before every node with a predecessor, before a fork's branches and
    /// between a resolved fork and its continuation.
    pub y: f32,
}

impl Default for Gap {
    fn default() -> Self {
        Self { x: 4.0, y: 4.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub gap: Gap,
}

impl LayoutConfig {
    pub fn with_gaps(x: f32, y: f32) -> Self {
        Self { gap: Gap { x, y } }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        for (axis, value) in [('x', self.gap.x), ('y', self.gap.y)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidGap { axis, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Layout units to SVG pixels.
    pub scale: f32,
    pub padding: f32,
    pub show_labels: bool,
    pub corner_radius: f32,
    pub stroke_width: f32,
    /// Fallback raster size when the SVG carries none.
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 10.0,
            padding: 16.0,
            show_labels: true,
            corner_radius: 4.0,
            stroke_width: 1.4,
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    primary_color: Option<String>,
    primary_border_color: Option<String>,
    primary_text_color: Option<String>,
    line_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GapFile {
    x: Option<f32>,
    y: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct LayoutConfigFile {
    gap: Option<GapFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    scale: Option<f32>,
    padding: Option<f32>,
    show_labels: Option<bool>,
    corner_radius: Option<f32>,
    stroke_width: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    /// Shorthand for `layout.gap`, accepted in init directives.
    gap: Option<GapFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("invalid config {}: {err}", path.display()))?;
    let config = apply_config_file(config, parsed)?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

/// Overlays a `%%{init: ...}%%` directive taken from a source file.
pub fn merge_init_config(config: Config, init: serde_json::Value) -> anyhow::Result<Config> {
    let parsed: ConfigFile = serde_json::from_value(init)?;
    apply_config_file(config, parsed)
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> anyhow::Result<Config> {
    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme: {theme_name}"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.primary_color {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.primary_border_color {
            config.theme.node_border = v;
        }
        if let Some(v) = vars.primary_text_color {
            config.theme.node_text = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    let gaps = parsed
        .layout
        .and_then(|layout| layout.gap)
        .into_iter()
        .chain(parsed.gap);
    for gap in gaps {
        if let Some(x) = gap.x {
            config.layout.gap.x = x;
        }
        if let Some(y) = gap.y {
            config.layout.gap.y = y;
        }
    }
    config.layout.validate()?;

    if let Some(render) = parsed.render {
        if let Some(v) = render.scale {
            config.render.scale = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
        if let Some(v) = render.show_labels {
            config.render.show_labels = v;
        }
        if let Some(v) = render.corner_radius {
            config.render.corner_radius = v;
        }
        if let Some(v) = render.stroke_width {
            config.render.stroke_width = v;
        }
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> anyhow::Result<Config> {
        let parsed: ConfigFile = json5::from_str(input)?;
        apply_config_file(Config::default(), parsed)
    }

    #[test]
    fn defaults_match_reference_gaps() {
        let config = Config::default();
        assert_eq!(config.layout.gap, Gap { x: 4.0, y: 4.0 });
        assert!(config.layout.validate().is_ok());
    }

    #[test]
    fn json5_config_overrides_selected_keys() {
        let config = parse(
            r##"{
                // comments and trailing commas are fine
                theme: "classic",
                themeVariables: { lineColor: "#FF0000" },
                layout: { gap: { x: 10 } },
                render: { scale: 2, showLabels: false, },
            }"##,
        )
        .unwrap();
        assert_eq!(config.layout.gap, Gap { x: 10.0, y: 4.0 });
        assert_eq!(config.theme.line_color, "#FF0000");
        assert_eq!(config.theme.font_size, 16.0);
        assert_eq!(config.render.scale, 2.0);
        assert!(!config.render.show_labels);
    }

    #[test]
    fn negative_gap_in_file_is_rejected() {
        assert!(parse(r#"{ "layout": { "gap": { "y": -2 } } }"#).is_err());
    }

    #[test]
    fn unknown_theme_is_rejected() {
        assert!(parse(r#"{ "theme": "neon" }"#).is_err());
    }

    #[test]
    fn init_directive_accepts_gap_shorthand() {
        let init = serde_json::json!({ "gap": { "x": 0, "y": 12 } });
        let config = merge_init_config(Config::default(), init).unwrap();
        assert_eq!(config.layout.gap, Gap { x: 0.0, y: 12.0 });
    }
}
