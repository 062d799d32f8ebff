use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub cell_fill: String,
    pub cell_border: String,
    pub line_color: String,
    pub text_color: String,
    pub handle_fill: String,
    pub point_fill: String,
    pub show_handles: bool,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            cell_fill: "#F8FAFF".to_string(),
            cell_border: "#7A8AA6".to_string(),
            line_color: "#333333".to_string(),
            text_color: "#1C2430".to_string(),
            handle_fill: "#C7D2E5".to_string(),
            point_fill: "#000000".to_string(),
            show_handles: true,
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            background: "#1E1F24".to_string(),
            cell_fill: "#2B2E36".to_string(),
            cell_border: "#8A94A8".to_string(),
            line_color: "#D0D4DC".to_string(),
            text_color: "#ECEFF4".to_string(),
            handle_fill: "#4C566A".to_string(),
            point_fill: "#88C0D0".to_string(),
            show_handles: true,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "light" | "default" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
