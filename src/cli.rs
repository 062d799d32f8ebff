use crate::cartesian::{CartesianGraph, PlotMode, PointStyle};
use crate::config::load_config;
use crate::geometry::Point;
use crate::render::{render_svg, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fxgraph", version, about = "Plot x/y datasets as an SVG or PNG graph")]
pub struct Args {
    /// Input file with one "x y" or "x,y" pair per line, or '-' for stdin.
    /// A blank line starts a new dataset.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// How datasets are drawn
    #[arg(short = 'm', long = "mode", value_enum, default_value = "connected-points")]
    pub mode: PlotMode,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    #[cfg(feature = "png")]
    Png,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
        config.graph.canvas.width = f64::from(width);
    }
    if let Some(height) = args.height {
        config.render.height = height;
        config.graph.canvas.height = f64::from(height);
    }

    let input = read_input(args.input.as_deref())?;
    let datasets = parse_datasets(&input)?;
    if datasets.is_empty() {
        return Err(anyhow::anyhow!("No data points found in input"));
    }
    info!(datasets = datasets.len(), "plotting");

    let mut plot = CartesianGraph::with_config(args.mode, config.graph.clone())?;
    plot.set_point_style(PointStyle {
        fill: config.theme.point_fill.clone(),
        ..PointStyle::default()
    });
    for (idx, dataset) in datasets.iter().enumerate() {
        let name = plot
            .add_dataset(dataset, None)
            .with_context(|| format!("dataset {} is not a function of x", idx + 1))?;
        debug!(plot = %name, points = dataset.len(), "added dataset");
    }
    plot.layout()?;

    let svg = render_svg(plot.graph().canvas(), &config.theme, &config.render);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        #[cfg(feature = "png")]
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            crate::render::write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg_attr(not(feature = "png"), allow(dead_code))]
fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

/// Splits the input into datasets. Lines hold two numbers separated by
/// whitespace or a comma; `#` starts a comment; blank lines separate
/// datasets.
fn parse_datasets(input: &str) -> Result<Vec<Vec<Point>>> {
    let mut datasets = Vec::new();
    let mut current = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            if raw.trim().is_empty() && !current.is_empty() {
                datasets.push(std::mem::take(&mut current));
            }
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let [x, y] = fields.as_slice() else {
            return Err(anyhow::anyhow!(
                "line {}: expected two numbers, found '{line}'",
                idx + 1
            ));
        };
        let x: f64 = x.parse().with_context(|| format!("line {}: bad x value '{x}'", idx + 1))?;
        let y: f64 = y.parse().with_context(|| format!("line {}: bad y value '{y}'", idx + 1))?;
        current.push(Point::new(x, y));
    }
    if !current.is_empty() {
        datasets.push(current);
    }
    Ok(datasets)
}
