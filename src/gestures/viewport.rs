use super::{MouseButton, MouseEvent, ScrollEvent};
use crate::config::ViewportConfig;
use crate::error::{GraphError, Result};
use crate::geometry::{Point, clamp};
use crate::scene::PannableCanvas;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct PanAnchor {
    mouse: Point,
    translate: Point,
}

/// Pan and zoom state for one canvas.
#[derive(Debug, Clone)]
pub struct ViewportGestures {
    min_scale: f64,
    max_scale: f64,
    zoom_speed: f64,
    pan_button: MouseButton,
    anchor: Option<PanAnchor>,
}

impl Default for ViewportGestures {
    fn default() -> Self {
        let config = ViewportConfig::default();
        Self {
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_speed: config.zoom_speed,
            pan_button: config.pan_button,
            anchor: None,
        }
    }
}

impl ViewportGestures {
    pub fn new(config: &ViewportConfig) -> Result<Self> {
        let mut gestures = Self::default();
        gestures.set_zoom_bounds(config.min_scale, config.max_scale)?;
        gestures.set_zoom_speed(config.zoom_speed)?;
        gestures.pan_button = config.pan_button;
        Ok(gestures)
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn zoom_speed(&self) -> f64 {
        self.zoom_speed
    }

    pub fn pan_button(&self) -> MouseButton {
        self.pan_button
    }

    pub fn set_pan_button(&mut self, button: MouseButton) {
        self.pan_button = button;
    }

    pub fn set_zoom_bounds(&mut self, min: f64, max: f64) -> Result<()> {
        check_scale(min, max)?;
        self.min_scale = min;
        self.max_scale = max;
        Ok(())
    }

    pub fn set_min_scale(&mut self, min: f64) -> Result<()> {
        self.set_zoom_bounds(min, self.max_scale)
    }

    pub fn set_max_scale(&mut self, max: f64) -> Result<()> {
        self.set_zoom_bounds(self.min_scale, max)
    }

    pub fn set_zoom_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(GraphError::invalid(format!("zoom speed must be positive, got {speed}")));
        }
        self.zoom_speed = speed;
        Ok(())
    }

    pub fn is_panning(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        clamp(scale, self.min_scale, self.max_scale)
    }

    pub fn press(&mut self, canvas: &PannableCanvas, event: &MouseEvent) -> bool {
        if event.button != self.pan_button {
            return false;
        }
        self.anchor = Some(PanAnchor {
            mouse: event.scene(),
            translate: canvas.translate(),
        });
        true
    }

    pub fn drag(&mut self, canvas: &PannableCanvas, event: &MouseEvent) -> bool {
        if event.button != self.pan_button {
            return false;
        }
        let Some(anchor) = self.anchor else {
            return false;
        };
        canvas.set_translate(anchor.translate + (event.scene() - anchor.mouse));
        true
    }

    /// Ends a pan. Returns whether a pan was in progress.
    pub fn release(&mut self, event: &MouseEvent) -> bool {
        if event.button != self.pan_button {
            return false;
        }
        self.anchor.take().is_some()
    }

    /// Zooms towards the cursor. The canvas point under the cursor stays
    /// under it unless the scale hits a bound.
    pub fn scroll(&mut self, canvas: &PannableCanvas, event: &ScrollEvent) -> bool {
        if event.delta_y == 0.0 {
            return false;
        }
        let old_scale = canvas.scale();
        let scale = if event.delta_y < 0.0 {
            old_scale / self.zoom_speed
        } else {
            old_scale * self.zoom_speed
        };
        let scale = self.clamp_scale(scale);
        let f = scale / old_scale - 1.0;

        let bounds = canvas.bounds_in_parent();
        let dx = event.scene_x - (bounds.width / 2.0 + bounds.min_x());
        let dy = event.scene_y - (bounds.height / 2.0 + bounds.min_y());

        trace!(old_scale, scale, dx, dy, "zoom");
        canvas.set_scale(scale);
        canvas.set_pivot(f * dx, f * dy);
        true
    }
}

fn check_scale(min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min <= 0.0 {
        return Err(GraphError::invalid(format!(
            "zoom bounds must be positive and finite, got [{min}, {max}]"
        )));
    }
    if min > max {
        return Err(GraphError::invalid(format!(
            "minimum scale {min} exceeds maximum scale {max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scroll(delta_y: f64, x: f64, y: f64) -> ScrollEvent {
        ScrollEvent {
            delta_y,
            scene_x: x,
            scene_y: y,
        }
    }

    #[test]
    fn pan_follows_mouse_from_snapshot() {
        let canvas = PannableCanvas::new(400.0, 300.0);
        canvas.set_translate(Point::new(5.0, 5.0));
        let mut viewport = ViewportGestures::default();

        assert!(viewport.press(&canvas, &MouseEvent::at(MouseButton::Primary, 100.0, 100.0)));
        viewport.drag(&canvas, &MouseEvent::at(MouseButton::Primary, 130.0, 80.0));
        assert_eq!(canvas.translate(), Point::new(35.0, -15.0));
        viewport.drag(&canvas, &MouseEvent::at(MouseButton::Primary, 90.0, 100.0));
        assert_eq!(canvas.translate(), Point::new(-5.0, 5.0));
        assert!(viewport.release(&MouseEvent::at(MouseButton::Primary, 90.0, 100.0)));
        assert!(!viewport.is_panning());
    }

    #[test]
    fn other_buttons_do_not_pan() {
        let canvas = PannableCanvas::new(400.0, 300.0);
        let mut viewport = ViewportGestures::default();
        viewport.set_pan_button(MouseButton::Secondary);
        assert!(!viewport.press(&canvas, &MouseEvent::at(MouseButton::Primary, 0.0, 0.0)));
        assert!(!viewport.drag(&canvas, &MouseEvent::at(MouseButton::Primary, 10.0, 0.0)));
        assert_eq!(canvas.translate(), Point::new(0.0, 0.0));
    }

    #[test]
    fn zoom_in_is_clamped_to_max() {
        let canvas = PannableCanvas::new(400.0, 300.0);
        let mut viewport = ViewportGestures::default();
        viewport.set_zoom_bounds(0.5, 2.0).unwrap();
        for _ in 0..20 {
            viewport.scroll(&canvas, &scroll(1.0, 200.0, 150.0));
        }
        assert_eq!(canvas.scale(), 2.0);
    }

    #[test]
    fn zoom_out_divides_by_speed() {
        let canvas = PannableCanvas::new(400.0, 300.0);
        let mut viewport = ViewportGestures::default();
        viewport.scroll(&canvas, &scroll(-1.0, 200.0, 150.0));
        assert!((canvas.scale() - 1.0 / 1.2).abs() < 1e-12);
        assert!(!viewport.scroll(&canvas, &scroll(0.0, 200.0, 150.0)));
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let canvas = PannableCanvas::new(400.0, 300.0);
        canvas.set_translate(Point::new(-30.0, 12.0));
        canvas.set_scale(1.5);
        let mut viewport = ViewportGestures::default();
        let cursor = Point::new(320.0, 40.0);
        let before = canvas.parent_to_local(cursor);
        viewport.scroll(&canvas, &scroll(1.0, cursor.x, cursor.y));
        let after = canvas.local_to_parent(before);
        assert!(after.distance(cursor) < 1e-9);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut viewport = ViewportGestures::default();
        let err = viewport.set_zoom_bounds(3.0, 1.0).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert_eq!((viewport.min_scale(), viewport.max_scale()), (0.1, 10.0));
        assert!(viewport.set_min_scale(11.0).is_err());
        assert!(viewport.set_zoom_speed(0.0).is_err());
    }

    proptest! {
        #[test]
        fn scale_stays_within_bounds(
            min in 0.05f64..1.0,
            span in 1.0f64..20.0,
            deltas in proptest::collection::vec(prop_oneof![Just(-1.0f64), Just(1.0f64), Just(0.0f64)], 0..60),
        ) {
            let canvas = PannableCanvas::new(640.0, 480.0);
            let mut viewport = ViewportGestures::default();
            viewport.set_zoom_bounds(min, min * span).unwrap();
            canvas.set_scale(viewport.clamp_scale(1.0));
            for delta in deltas {
                viewport.scroll(&canvas, &scroll(delta, 100.0, 50.0));
                prop_assert!(canvas.scale() >= min && canvas.scale() <= min * span);
            }
        }
    }
}
