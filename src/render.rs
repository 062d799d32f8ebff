use crate::config::RenderConfig;
use crate::geometry::{Point, arrow_heads};
use crate::scene::{PannableCanvas, Region, Shape};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const ARROW_LENGTH: f64 = 10.0;
const ARROW_WIDTH: f64 = 5.0;

/// Draws the canvas as the host would see it: the canvas transform is
/// applied to one group holding every visible graphic.
pub fn render_svg(canvas: &PannableCanvas, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = config.width.max(1.0);
    let height = config.height.max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&config.background)
    ));

    let scale = canvas.scale();
    let origin = canvas.local_to_parent(Point::new(0.0, 0.0));
    svg.push_str(&format!(
        "<g transform=\"matrix({scale:.4} 0 0 {scale:.4} {:.2} {:.2})\" font-family=\"{}\" font-size=\"{}\">",
        origin.x,
        origin.y,
        escape_xml(&theme.font_family),
        theme.font_size
    ));
    for child in canvas.region().children() {
        region_svg(&mut svg, &child, theme);
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

fn region_svg(svg: &mut String, region: &Region, theme: &Theme) {
    if !region.is_visible() {
        return;
    }
    let offset = region.offset();
    svg.push_str(&format!(
        "<g id=\"{}\" transform=\"translate({:.2} {:.2})\">",
        region.id(),
        offset.x,
        offset.y
    ));
    let (width, height) = (region.width().get(), region.height().get());
    match region.shape() {
        Shape::Pane => {}
        Shape::Rectangle { fill } => {
            svg.push_str(&format!(
                "<rect width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
                escape_xml(fill.as_deref().unwrap_or(&theme.cell_fill)),
                escape_xml(&theme.cell_border)
            ));
        }
        Shape::Circle { radius, fill } => {
            let r = radius.get();
            svg.push_str(&format!(
                "<circle cx=\"{r:.2}\" cy=\"{r:.2}\" r=\"{r:.2}\" fill=\"{}\"/>",
                escape_xml(&fill.get())
            ));
        }
        Shape::Line(line) => {
            let (start, end) = (line.start(), line.end());
            let dash = if line.dashed { " stroke-dasharray=\"6 4\"" } else { "" };
            svg.push_str(&format!(
                "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1.4\"{dash}/>",
                start.x,
                start.y,
                end.x,
                end.y,
                escape_xml(&theme.line_color)
            ));
            if line.arrow {
                let mut d = String::new();
                for (from, to) in arrow_heads(start, end, ARROW_LENGTH, ARROW_WIDTH) {
                    d.push_str(&format!("M {:.2} {:.2} L {:.2} {:.2} ", from.x, from.y, to.x, to.y));
                }
                svg.push_str(&format!(
                    "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"/>",
                    d.trim_end(),
                    escape_xml(&theme.line_color)
                ));
            }
        }
        Shape::Text(content) => {
            svg.push_str(&format!(
                "<text x=\"0\" y=\"{:.2}\" fill=\"{}\">{}</text>",
                theme.font_size,
                escape_xml(&theme.text_color),
                escape_xml(&content.get())
            ));
        }
        Shape::Handle(_) => {
            if theme.show_handles {
                svg.push_str(&format!(
                    "<rect width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
                    escape_xml(&theme.handle_fill),
                    escape_xml(&theme.cell_border)
                ));
            }
        }
    }
    for child in region.children() {
        region_svg(svg, &child, theme);
    }
    svg.push_str("</g>");
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
        .ok_or_else(|| anyhow::anyhow!("invalid output size {}x{}", render_cfg.width, render_cfg.height))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartesian::{CartesianGraph, PlotMode};
    use crate::cells::RectangleCell;
    use crate::graph::Graph;

    #[test]
    fn render_svg_basic() {
        let mut graph = Graph::new();
        let a = graph.model_mut().insert_cell(RectangleCell::new());
        let b = graph.model_mut().insert_cell(RectangleCell::new().with_fill("#abcdef"));
        graph.model_mut().add_cell(a).unwrap();
        graph.model_mut().add_cell(b).unwrap();
        graph.model_mut().connect(a, b, true).unwrap();
        graph.end_update().unwrap();
        graph.graphic(b).unwrap().relocate(200.0, 100.0);

        let svg = render_svg(graph.canvas(), &Theme::light(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("fill=\"#abcdef\""));
        assert!(svg.contains("<line"));
        assert!(svg.contains("<path d=\"M"));
        assert_eq!(svg.matches("<rect width=\"6.00\"").count(), 16);
    }

    #[test]
    fn hidden_graphics_and_handles_are_skipped() {
        let mut plot = CartesianGraph::new(PlotMode::Points);
        plot.add_dataset(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], Some("a"))
            .unwrap();
        let svg = render_svg(plot.graph().canvas(), &Theme::dark(), &RenderConfig::default());
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(!svg.contains("<line"));
        assert!(svg.contains("(1,1)"));

        let mut theme = Theme::light();
        theme.show_handles = false;
        let mut graph = Graph::new();
        let a = graph.model_mut().insert_cell(RectangleCell::new());
        graph.model_mut().add_cell(a).unwrap();
        graph.end_update().unwrap();
        let svg = render_svg(graph.canvas(), &theme, &RenderConfig::default());
        assert_eq!(svg.matches("<rect width=\"50.00\"").count(), 1);
        assert_eq!(svg.matches("<rect width=\"6.00\"").count(), 0);
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn colours_and_fonts_are_escaped() {
        let mut graph = Graph::new();
        let a = graph
            .model_mut()
            .insert_cell(RectangleCell::new().with_fill("red\" onload=\"x"));
        let b = graph.model_mut().insert_cell(RectangleCell::new());
        graph.model_mut().add_cell(a).unwrap();
        graph.model_mut().add_cell(b).unwrap();
        graph.model_mut().connect(a, b, true).unwrap();
        graph.end_update().unwrap();

        let mut theme = Theme::light();
        theme.cell_border = "<b>".to_string();
        theme.handle_fill = "a&b".to_string();
        theme.line_color = "\"blue\"".to_string();
        theme.font_family = "Fira \"Sans\"".to_string();
        let config = RenderConfig {
            background: "white\"/><script/>".to_string(),
            ..RenderConfig::default()
        };

        let svg = render_svg(graph.canvas(), &theme, &config);
        assert!(svg.contains("fill=\"white&quot;/&gt;&lt;script/&gt;\""));
        assert!(svg.contains("fill=\"red&quot; onload=&quot;x\""));
        assert!(svg.contains("stroke=\"&lt;b&gt;\""));
        assert!(svg.contains("fill=\"a&amp;b\""));
        assert!(svg.contains("stroke=\"&quot;blue&quot;\""));
        assert!(svg.contains("font-family=\"Fira &quot;Sans&quot;\""));
        assert!(!svg.contains("<script"));
        assert!(!svg.contains("<b>"));
    }
}
