//! Plotting numeric datasets on cartesian axes.
//!
//! Points are cells whose parent is the point with the next lower x value,
//! so each plot forms a chain ordered by x.

mod graph;
mod multiplot;
mod point;

pub use graph::{CartesianGraph, PlotMode};
pub use multiplot::MultiplotModel;
pub use point::{BulletType, CartesianPoint, PointStyle, format_coordinate};
