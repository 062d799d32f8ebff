use super::{MouseButton, MouseEvent};
use crate::geometry::Point;
use crate::scene::{Region, Shape};
use tracing::trace;

/// Default edge length of a resize handle.
pub const DEFAULT_HANDLE_SIZE: f64 = 6.0;

/// Position of a resize handle on its cell's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NorthWest,
        Handle::North,
        Handle::NorthEast,
        Handle::East,
        Handle::SouthEast,
        Handle::South,
        Handle::SouthWest,
        Handle::West,
    ];

    /// Where on the box the handle's centre sits, as fractions of width
    /// and height.
    fn placement(self) -> (f64, f64) {
        match self {
            Handle::NorthWest => (0.0, 0.0),
            Handle::North => (0.5, 0.0),
            Handle::NorthEast => (1.0, 0.0),
            Handle::East => (1.0, 0.5),
            Handle::SouthEast => (1.0, 1.0),
            Handle::South => (0.5, 1.0),
            Handle::SouthWest => (0.0, 1.0),
            Handle::West => (0.0, 0.5),
        }
    }

    fn north(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::North | Handle::NorthEast)
    }

    fn south(self) -> bool {
        matches!(self, Handle::SouthWest | Handle::South | Handle::SouthEast)
    }

    fn east(self) -> bool {
        matches!(self, Handle::NorthEast | Handle::East | Handle::SouthEast)
    }

    fn west(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::West | Handle::SouthWest)
    }
}

/// Gives `region` eight resize handles of edge `size`. The handles follow
/// the region's box and move with it between containers.
pub fn make_resizable(region: &Region, size: f64) -> Vec<Region> {
    let x = region.offset_x();
    let y = region.offset_y();
    let half = size / 2.0;
    let handles: Vec<Region> = Handle::ALL
        .iter()
        .map(|&which| {
            let handle = Region::handle(which, size, region);
            let (fx, fy) = which.placement();
            handle
                .layout_x()
                .bind(&x.combine(region.width(), move |x, w| x + w * fx - half));
            handle
                .layout_y()
                .bind(&y.combine(region.height(), move |y, h| y + h * fy - half));
            handle.visible().bind(region.visible());
            handle
        })
        .collect();

    if let Some(parent) = region.parent() {
        for handle in &handles {
            parent.add_child(handle);
        }
    }
    let attached = handles.clone();
    region.on_parent_changed(move |parent| {
        for handle in &attached {
            match parent {
                Some(parent) => parent.add_child(handle),
                None => {
                    if let Some(old) = handle.parent() {
                        old.remove_child(handle);
                    }
                }
            }
        }
    });
    handles
}

#[derive(Debug, Clone)]
struct ResizeDrag {
    handle: Handle,
    target: Region,
    last: Point,
    size: f64,
}

/// Resize drags started on a handle.
#[derive(Debug, Clone, Default)]
pub struct ResizeGesture {
    drag: Option<ResizeDrag>,
}

impl ResizeGesture {
    pub fn is_resizing(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts a resize when `region` is a handle pressed with `button`.
    pub fn press(&mut self, region: &Region, event: &MouseEvent, button: MouseButton) -> bool {
        let Shape::Handle(handle) = region.shape() else {
            return false;
        };
        if event.button != button {
            self.drag = None;
            return false;
        }
        let Some(target) = region.handle_target() else {
            return false;
        };
        self.drag = Some(ResizeDrag {
            handle: *handle,
            target,
            last: event.scene(),
            size: region.width().get(),
        });
        true
    }

    pub fn drag(&mut self, event: &MouseEvent, scale: f64) -> bool {
        let Some(drag) = &mut self.drag else {
            return false;
        };
        let delta = (event.scene() - drag.last) * (1.0 / scale);
        resize(&drag.target, drag.handle, delta, drag.size);
        drag.last = event.scene();
        true
    }

    pub fn release(&mut self) -> bool {
        self.drag.take().is_some()
    }
}

/// Applies a handle drag of `delta` to `target`. Each axis is applied only
/// if the moved edge stays inside the parent and at least `size` away from
/// the opposite edge.
pub fn resize(target: &Region, handle: Handle, delta: Point, size: f64) {
    let (parent_width, parent_height) = target
        .parent()
        .map(|p| (p.width().get(), p.height().get()))
        .unwrap_or((f64::INFINITY, f64::INFINITY));
    let x = target.layout_x().get();
    let y = target.layout_y().get();
    let width = target.width().get();
    let height = target.height().get();

    if handle.north() {
        let new_y = y + delta.y;
        if new_y >= size && new_y <= y + height - size {
            target.layout_y().set(new_y);
            target.height().set(height - delta.y);
        }
    }
    if handle.south() {
        let new_max_y = y + height + delta.y;
        if new_max_y >= y + size && new_max_y <= parent_height - size {
            target.height().set(height + delta.y);
        }
    }
    if handle.west() {
        let new_x = x + delta.x;
        if new_x >= size && new_x <= x + width - size {
            target.layout_x().set(new_x);
            target.width().set(width - delta.x);
        }
    }
    if handle.east() {
        let new_max_x = x + width + delta.x;
        if new_max_x >= x + size && new_max_x <= parent_width - size {
            target.width().set(width + delta.x);
        }
    }
    trace!(?handle, x = target.layout_x().get(), y = target.layout_y().get(), "resized");
}
