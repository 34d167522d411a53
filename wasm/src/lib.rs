use flowfork::{LayoutConfig, RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    gap_x: Option<f32>,
    gap_y: Option<f32>,
    scale: Option<f32>,
    show_labels: Option<bool>,
}

fn build_render_options(options: FlowRenderOptions) -> RenderOptions {
    let mut render_options = match options.theme.as_deref() {
        Some("classic" | "default") => RenderOptions::classic(),
        _ => RenderOptions::modern(),
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    let gap = render_options.layout.gap;
    render_options.layout = LayoutConfig::with_gaps(
        options.gap_x.unwrap_or(gap.x),
        options.gap_y.unwrap_or(gap.y),
    );
    if let Some(scale) = options.scale {
        render_options.render.scale = scale;
    }
    if let Some(show_labels) = options.show_labels {
        render_options.render.show_labels = show_labels;
    }

    render_options
}

#[wasm_bindgen]
pub fn render_flowfork_svg(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<FlowRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        FlowRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(code, render_options).map_err(|error| JsValue::from_str(&format!("{error:#}")))
}

#[cfg(test)]
mod tests {
    use flowfork::render_with_options;

    use crate::{FlowRenderOptions, build_render_options};

    #[test]
    fn renders_nested_forks() {
        let code = r#"flow
root A
G[12x8]
H[4x8]
A --> B & D & H
B --> C
D --> E & G
E --> F
G --> F
F --> C
H --> I & L
I --> J --> K
L --> K
K --> C"#;

        let svg = render_with_options(code, build_render_options(FlowRenderOptions::default()))
            .expect("nested forks should render");

        assert!(svg.contains("<svg"));
        assert_eq!(svg.matches("<rect x=").count(), 12);
    }

    #[test]
    fn options_override_gaps() {
        let options: FlowRenderOptions =
            serde_json::from_str(r#"{ "theme": "classic", "gapX": 0, "scale": 2 }"#).unwrap();
        let render_options = build_render_options(options);
        assert_eq!(render_options.layout.gap.x, 0.0);
        assert_eq!(render_options.layout.gap.y, 4.0);
        assert_eq!(render_options.render.scale, 2.0);
        assert_eq!(render_options.theme.font_size, 16.0);
    }
}
