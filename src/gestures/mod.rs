//! Pointer input and the controllers that react to it.
//!
//! A host forwards its pointer events to [`crate::graph::Graph`], which
//! routes them to the resize handles, the node drag controller and the
//! viewport, in that order.

pub mod node;
pub mod resize;
pub mod viewport;

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

pub use node::NodeGestures;
pub use resize::{Handle, ResizeGesture, make_resizable};
pub use viewport::ViewportGestures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub button: MouseButton,
    pub scene_x: f64,
    pub scene_y: f64,
    pub screen_x: f64,
    pub screen_y: f64,
}

impl MouseEvent {
    /// Event whose screen and scene coordinates coincide.
    pub fn at(button: MouseButton, x: f64, y: f64) -> Self {
        Self {
            button,
            scene_x: x,
            scene_y: y,
            screen_x: x,
            screen_y: y,
        }
    }

    pub fn scene(&self) -> Point {
        Point::new(self.scene_x, self.scene_y)
    }

    pub fn screen(&self) -> Point {
        Point::new(self.screen_x, self.screen_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    /// Positive values zoom in.
    pub delta_y: f64,
    pub scene_x: f64,
    pub scene_y: f64,
}

impl ScrollEvent {
    pub fn scene(&self) -> Point {
        Point::new(self.scene_x, self.scene_y)
    }
}
