use super::{MouseButton, MouseEvent};
use crate::geometry::Point;
use crate::scene::Region;

pub fn make_draggable(region: &Region) {
    region.set_draggable(true);
}

pub fn make_undraggable(region: &Region) {
    region.set_draggable(false);
}

pub fn make_hoverable(region: &Region) {
    region.set_hoverable(true);
}

pub fn make_unhoverable(region: &Region) {
    region.set_hoverable(false);
}

#[derive(Debug, Clone)]
struct NodeDrag {
    region: Region,
    context: Point,
}

/// Drag-to-move for cell graphics.
#[derive(Debug, Clone, Default)]
pub struct NodeGestures {
    drag_button: MouseButton,
    drag: Option<NodeDrag>,
}

impl NodeGestures {
    pub fn new(drag_button: MouseButton) -> Self {
        Self {
            drag_button,
            drag: None,
        }
    }

    pub fn drag_button(&self) -> MouseButton {
        self.drag_button
    }

    pub fn set_drag_button(&mut self, button: MouseButton) {
        self.drag_button = button;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts dragging `region` if the event uses the drag button.
    pub fn press(&mut self, region: &Region, event: &MouseEvent, scale: f64) -> bool {
        if event.button != self.drag_button || !region.is_draggable() {
            return false;
        }
        let bounds = region.bounds_in_parent();
        let context = Point::new(bounds.min_x(), bounds.min_y()) * scale - event.screen();
        self.drag = Some(NodeDrag {
            region: region.clone(),
            context,
        });
        true
    }

    pub fn drag(&mut self, event: &MouseEvent, scale: f64) -> bool {
        if event.button != self.drag_button {
            return false;
        }
        let Some(drag) = &self.drag else {
            return false;
        };
        let target = (event.screen() + drag.context) * (1.0 / scale);
        let bounds = drag.region.bounds_in_parent();
        let layout = Point::new(drag.region.layout_x().get(), drag.region.layout_y().get());
        drag.region
            .set_layout(layout.x + target.x - bounds.min_x(), layout.y + target.y - bounds.min_y());
        true
    }

    pub fn release(&mut self, event: &MouseEvent) -> bool {
        if event.button != self.drag_button {
            return false;
        }
        self.drag.take().is_some()
    }

    pub(crate) fn cancel(&mut self) {
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_moves_by_screen_delta_over_scale() {
        let region = Region::rectangle(50.0, 50.0, None);
        region.relocate(10.0, 20.0);
        make_draggable(&region);
        let mut gestures = NodeGestures::default();

        let press = MouseEvent::at(MouseButton::Primary, 100.0, 100.0);
        assert!(gestures.press(&region, &press, 2.0));
        gestures.drag(&MouseEvent::at(MouseButton::Primary, 140.0, 80.0), 2.0);
        assert_eq!(region.bounds_in_parent().min_x(), 30.0);
        assert_eq!(region.bounds_in_parent().min_y(), 10.0);
        assert!(gestures.release(&MouseEvent::at(MouseButton::Primary, 140.0, 80.0)));
        assert!(!gestures.is_dragging());
    }

    #[test]
    fn undraggable_regions_are_ignored() {
        let region = Region::rectangle(50.0, 50.0, None);
        let mut gestures = NodeGestures::default();
        assert!(!gestures.press(&region, &MouseEvent::at(MouseButton::Primary, 0.0, 0.0), 1.0));
        make_draggable(&region);
        make_undraggable(&region);
        assert!(!gestures.press(&region, &MouseEvent::at(MouseButton::Primary, 0.0, 0.0), 1.0));
    }

    #[test]
    fn translated_graphics_keep_their_offset() {
        let region = Region::rectangle(10.0, 10.0, None);
        region.translate_x().set(-5.0);
        region.relocate(20.0, 0.0);
        make_draggable(&region);
        let mut gestures = NodeGestures::default();
        gestures.press(&region, &MouseEvent::at(MouseButton::Primary, 0.0, 0.0), 1.0);
        gestures.drag(&MouseEvent::at(MouseButton::Primary, 7.0, 0.0), 1.0);
        assert_eq!(region.layout_x().get(), 27.0);
        assert_eq!(region.bounds_in_parent().min_x(), 22.0);
    }
}
