use crate::error::GraphError;
use crate::gestures::MouseButton;
use crate::gestures::resize::DEFAULT_HANDLE_SIZE;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Factor applied to the scale per scroll step.
    pub zoom_speed: f64,
    pub pan_button: MouseButton,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_speed: 1.2,
            pan_button: MouseButton::Primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionConfig {
    pub use_node_gestures: bool,
    pub use_viewport_gestures: bool,
    pub drag_button: MouseButton,
    pub handle_size: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            use_node_gestures: true,
            use_viewport_gestures: true,
            drag_button: MouseButton::Primary,
            handle_size: DEFAULT_HANDLE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    /// Margin kept around content when fitting it to the canvas.
    pub fit_padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            fit_padding: 20.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub viewport: ViewportConfig,
    pub interaction: InteractionConfig,
    pub canvas: CanvasConfig,
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0 && v.min_scale <= v.max_scale && v.max_scale.is_finite()) {
            return Err(GraphError::Config(format!(
                "zoom bounds [{}, {}] must be positive and ordered",
                v.min_scale, v.max_scale
            )));
        }
        if !(v.zoom_speed > 0.0 && v.zoom_speed.is_finite()) {
            return Err(GraphError::Config(format!("zoom speed {} must be positive", v.zoom_speed)));
        }
        if !(self.interaction.handle_size > 0.0) {
            return Err(GraphError::Config(format!(
                "handle size {} must be positive",
                self.interaction.handle_size
            )));
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(GraphError::Config(format!(
                "canvas size {}x{} must be positive",
                self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub graph: GraphConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::light();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            graph: GraphConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    cell_fill: Option<String>,
    cell_border: Option<String>,
    line_color: Option<String>,
    text_color: Option<String>,
    handle_fill: Option<String>,
    point_fill: Option<String>,
    show_handles: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewportConfigFile {
    min_scale: Option<f64>,
    max_scale: Option<f64>,
    zoom_speed: Option<f64>,
    pan_button: Option<MouseButton>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionConfigFile {
    use_node_gestures: Option<bool>,
    use_viewport_gestures: Option<bool>,
    drag_button: Option<MouseButton>,
    handle_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    fit_padding: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    viewport: Option<ViewportConfigFile>,
    interaction: Option<InteractionConfigFile>,
    canvas: Option<CanvasConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) -> anyhow::Result<()> {
    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.cell_fill {
            config.theme.cell_fill = v;
        }
        if let Some(v) = vars.cell_border {
            config.theme.cell_border = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.handle_fill {
            config.theme.handle_fill = v;
        }
        if let Some(v) = vars.point_fill {
            config.theme.point_fill = v;
        }
        if let Some(v) = vars.show_handles {
            config.theme.show_handles = v;
        }
    }

    if let Some(viewport) = parsed.viewport {
        let target = &mut config.graph.viewport;
        if let Some(v) = viewport.min_scale {
            target.min_scale = v;
        }
        if let Some(v) = viewport.max_scale {
            target.max_scale = v;
        }
        if let Some(v) = viewport.zoom_speed {
            target.zoom_speed = v;
        }
        if let Some(v) = viewport.pan_button {
            target.pan_button = v;
        }
    }

    if let Some(interaction) = parsed.interaction {
        let target = &mut config.graph.interaction;
        if let Some(v) = interaction.use_node_gestures {
            target.use_node_gestures = v;
        }
        if let Some(v) = interaction.use_viewport_gestures {
            target.use_viewport_gestures = v;
        }
        if let Some(v) = interaction.drag_button {
            target.drag_button = v;
        }
        if let Some(v) = interaction.handle_size {
            target.handle_size = v;
        }
    }

    if let Some(canvas) = parsed.canvas {
        let target = &mut config.graph.canvas;
        if let Some(v) = canvas.width {
            target.width = v;
            config.render.width = v as f32;
        }
        if let Some(v) = canvas.height {
            target.height = v;
            config.render.height = v as f32;
        }
        if let Some(v) = canvas.fit_padding {
            target.fit_padding = v;
        }
    }

    config.graph.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewport_conventions() {
        let config = Config::default();
        assert_eq!(config.graph.viewport.min_scale, 0.1);
        assert_eq!(config.graph.viewport.max_scale, 10.0);
        assert_eq!(config.graph.viewport.zoom_speed, 1.2);
        assert_eq!(config.graph.viewport.pan_button, MouseButton::Primary);
        assert_eq!(config.graph.interaction.handle_size, 6.0);
        assert!(config.graph.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let config = parse_config(
            r##"{
                "theme": "dark",
                "themeVariables": { "lineColor": "#ff0000" },
                "viewport": { "maxScale": 4.0, "panButton": "secondary" },
                "interaction": { "useNodeGestures": false },
                "canvas": { "width": 1024 }
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.theme.background, Theme::dark().background);
        assert_eq!(config.graph.viewport.max_scale, 4.0);
        assert_eq!(config.graph.viewport.min_scale, 0.1);
        assert_eq!(config.graph.viewport.pan_button, MouseButton::Secondary);
        assert!(!config.graph.interaction.use_node_gestures);
        assert_eq!(config.graph.canvas.width, 1024.0);
        assert_eq!(config.render.width, 1024.0);
    }

    #[test]
    fn inverted_zoom_bounds_fail_validation() {
        let err = parse_config(r#"{ "viewport": { "minScale": 5.0, "maxScale": 2.0 } }"#).unwrap_err();
        assert!(err.to_string().contains("zoom bounds"));
    }

    #[test]
    fn unknown_theme_is_an_error() {
        assert!(parse_config(r#"{ "theme": "neon" }"#).is_err());
    }
}
