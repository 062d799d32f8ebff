//! Retained scene nodes.
//!
//! A [`Region`] is a shared handle to one node of the scene tree. Position
//! and size are [`Property`] values so edges, labels and resize handles can
//! follow a graphic without polling. The [`PannableCanvas`] is the root the
//! graph attaches every graphic to; the viewport scales and translates it.

use crate::gestures::resize::Handle;
use crate::geometry::{Point, Rect, segment_distance};
use crate::property::Property;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Approximate advance of one glyph at the default font size.
pub const TEXT_CHAR_WIDTH: f64 = 7.0;
pub const TEXT_LINE_HEIGHT: f64 = 16.0;
/// How far from a line a pointer may be and still hit it.
pub const LINE_PICK_TOLERANCE: f64 = 3.0;

static NEXT_GRAPHIC_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphicId(u64);

impl GraphicId {
    fn next() -> Self {
        Self(NEXT_GRAPHIC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Endpoints of a straight line, in the coordinates of the line's parent.
#[derive(Debug, Clone)]
pub struct LineShape {
    pub start_x: Property<f64>,
    pub start_y: Property<f64>,
    pub end_x: Property<f64>,
    pub end_y: Property<f64>,
    /// Draw arrow barbs at the end point.
    pub arrow: bool,
    pub dashed: bool,
}

impl LineShape {
    pub fn new(arrow: bool) -> Self {
        Self {
            start_x: Property::new(0.0),
            start_y: Property::new(0.0),
            end_x: Property::new(0.0),
            end_y: Property::new(0.0),
            arrow,
            dashed: false,
        }
    }

    pub fn with_dash(mut self) -> Self {
        self.dashed = true;
        self
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x.get(), self.start_y.get())
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x.get(), self.end_y.get())
    }

    fn bounds(&self) -> Rect {
        let (s, e) = (self.start(), self.end());
        Rect::from_corners(
            Point::new(s.x.min(e.x), s.y.min(e.y)),
            Point::new(s.x.max(e.x), s.y.max(e.y)),
        )
    }
}

#[derive(Debug, Clone)]
pub enum Shape {
    /// Plain container sized by `width`/`height`.
    Pane,
    Rectangle { fill: Option<String> },
    Circle { radius: Property<f64>, fill: Property<String> },
    Line(LineShape),
    Text(Property<String>),
    /// One of the eight squares that resize a cell.
    Handle(Handle),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Pane => "pane",
            Shape::Rectangle { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Line(_) => "line",
            Shape::Text(_) => "text",
            Shape::Handle(_) => "handle",
        }
    }
}

type ParentListener = Rc<dyn Fn(Option<&Region>)>;

struct RegionInner {
    id: GraphicId,
    shape: Shape,
    layout_x: Property<f64>,
    layout_y: Property<f64>,
    translate_x: Property<f64>,
    translate_y: Property<f64>,
    width: Property<f64>,
    height: Property<f64>,
    visible: Property<bool>,
    mouse_transparent: Cell<bool>,
    draggable: Cell<bool>,
    hoverable: Cell<bool>,
    children: RefCell<Vec<Region>>,
    parent: RefCell<Weak<RegionInner>>,
    parent_listeners: RefCell<Vec<ParentListener>>,
    handle_target: RefCell<Weak<RegionInner>>,
}

/// Shared handle to a scene node. Equality is identity.
#[derive(Clone)]
pub struct Region {
    inner: Rc<RegionInner>,
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Region {}

impl Hash for Region {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.inner.id)
            .field("shape", &self.inner.shape.name())
            .field("x", &self.inner.layout_x.get())
            .field("y", &self.inner.layout_y.get())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

impl Region {
    pub fn new(shape: Shape, width: f64, height: f64) -> Self {
        Self {
            inner: Rc::new(RegionInner {
                id: GraphicId::next(),
                shape,
                layout_x: Property::new(0.0),
                layout_y: Property::new(0.0),
                translate_x: Property::new(0.0),
                translate_y: Property::new(0.0),
                width: Property::new(width),
                height: Property::new(height),
                visible: Property::new(true),
                mouse_transparent: Cell::new(false),
                draggable: Cell::new(false),
                hoverable: Cell::new(false),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                parent_listeners: RefCell::new(Vec::new()),
                handle_target: RefCell::new(Weak::new()),
            }),
        }
    }

    pub fn pane(width: f64, height: f64) -> Self {
        Self::new(Shape::Pane, width, height)
    }

    pub fn rectangle(width: f64, height: f64, fill: Option<String>) -> Self {
        Self::new(Shape::Rectangle { fill }, width, height)
    }

    /// Circle whose box tracks `radius`.
    pub fn circle(radius: Property<f64>, fill: Property<String>) -> Self {
        let region = Self::new(
            Shape::Circle {
                radius: radius.clone(),
                fill,
            },
            radius.get() * 2.0,
            radius.get() * 2.0,
        );
        region.width().bind(&radius.map(|r| r * 2.0));
        region.height().bind(&radius.map(|r| r * 2.0));
        region
    }

    pub fn line(line: LineShape) -> Self {
        Self::new(Shape::Line(line), 0.0, 0.0)
    }

    /// Text region whose box tracks the length of `content`.
    pub fn text(content: Property<String>) -> Self {
        let region = Self::new(Shape::Text(content.clone()), 0.0, TEXT_LINE_HEIGHT);
        region
            .width()
            .bind(&content.map(|text| text.chars().count() as f64 * TEXT_CHAR_WIDTH));
        region
    }

    pub(crate) fn handle(handle: Handle, size: f64, target: &Region) -> Self {
        let region = Self::new(Shape::Handle(handle), size, size);
        *region.inner.handle_target.borrow_mut() = Rc::downgrade(&target.inner);
        region
    }

    pub fn id(&self) -> GraphicId {
        self.inner.id
    }

    pub fn shape(&self) -> &Shape {
        &self.inner.shape
    }

    pub fn layout_x(&self) -> &Property<f64> {
        &self.inner.layout_x
    }

    pub fn layout_y(&self) -> &Property<f64> {
        &self.inner.layout_y
    }

    pub fn translate_x(&self) -> &Property<f64> {
        &self.inner.translate_x
    }

    pub fn translate_y(&self) -> &Property<f64> {
        &self.inner.translate_y
    }

    pub fn width(&self) -> &Property<f64> {
        &self.inner.width
    }

    pub fn height(&self) -> &Property<f64> {
        &self.inner.height
    }

    pub fn visible(&self) -> &Property<bool> {
        &self.inner.visible
    }

    pub fn is_visible(&self) -> bool {
        self.inner.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.inner.visible.set(visible);
    }

    /// Moves the region so its local box starts at `(x, y)` in the parent.
    pub fn relocate(&self, x: f64, y: f64) {
        let local = self.own_box();
        self.inner.layout_x.set(x - local.x);
        self.inner.layout_y.set(y - local.y);
    }

    pub fn set_layout(&self, x: f64, y: f64) {
        self.inner.layout_x.set(x);
        self.inner.layout_y.set(y);
    }

    pub fn offset(&self) -> Point {
        Point::new(
            self.inner.layout_x.get() + self.inner.translate_x.get(),
            self.inner.layout_y.get() + self.inner.translate_y.get(),
        )
    }

    /// Reactive x offset within the parent (layout plus translate).
    pub fn offset_x(&self) -> Property<f64> {
        self.inner.layout_x.combine(&self.inner.translate_x, |l, t| l + t)
    }

    pub fn offset_y(&self) -> Property<f64> {
        self.inner.layout_y.combine(&self.inner.translate_y, |l, t| l + t)
    }

    fn own_box(&self) -> Rect {
        match &self.inner.shape {
            Shape::Line(line) => line.bounds(),
            _ => Rect::new(0.0, 0.0, self.inner.width.get(), self.inner.height.get()),
        }
    }

    /// Box of the region's own shape and visible children in local
    /// coordinates.
    pub fn bounds_in_local(&self) -> Rect {
        let own = self.own_box();
        let children = self.inner.children.borrow();
        let mut bounds: Option<Rect> = None;
        if own.width > 0.0 || own.height > 0.0 || children.is_empty() {
            bounds = Some(own);
        }
        for child in children.iter().filter(|c| c.is_visible()) {
            let b = child.bounds_in_parent();
            bounds = Some(match bounds {
                Some(acc) => acc.union(&b),
                None => b,
            });
        }
        bounds.unwrap_or(own)
    }

    pub fn bounds_in_parent(&self) -> Rect {
        let local = self.bounds_in_local();
        let offset = self.offset();
        Rect::new(local.x + offset.x, local.y + offset.y, local.width, local.height)
    }

    /// Hit test against the region's own shape, in local coordinates.
    pub fn contains(&self, p: Point) -> bool {
        match &self.inner.shape {
            Shape::Line(line) => segment_distance(p, line.start(), line.end()) <= LINE_PICK_TOLERANCE,
            Shape::Circle { radius, .. } => {
                let r = radius.get();
                p.distance(Point::new(r, r)) <= r
            }
            _ => Rect::new(0.0, 0.0, self.inner.width.get(), self.inner.height.get()).contains(p),
        }
    }

    /// Topmost visible, non-transparent region under `p`, given in the
    /// coordinates of this region's parent.
    pub fn pick(&self, p: Point) -> Option<Region> {
        if !self.is_visible() || self.is_mouse_transparent() {
            return None;
        }
        let local = p - self.offset();
        let children = self.children();
        for child in children.iter().rev() {
            if let Some(hit) = child.pick(local) {
                return Some(hit);
            }
        }
        if matches!(self.inner.shape, Shape::Pane) && !children.is_empty() {
            return None;
        }
        self.contains(local).then(|| self.clone())
    }

    pub fn children(&self) -> Vec<Region> {
        self.inner.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub fn contains_child(&self, child: &Region) -> bool {
        self.inner.children.borrow().iter().any(|c| c == child)
    }

    /// Appends `child`, taking it away from any previous parent.
    pub fn add_child(&self, child: &Region) {
        if let Some(previous) = child.parent() {
            if previous == *self {
                return;
            }
            previous.detach_child(child);
        }
        self.inner.children.borrow_mut().push(child.clone());
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        child.fire_parent_changed();
    }

    pub fn remove_child(&self, child: &Region) -> bool {
        if !self.detach_child(child) {
            return false;
        }
        child.fire_parent_changed();
        true
    }

    fn detach_child(&self, child: &Region) -> bool {
        let mut children = self.inner.children.borrow_mut();
        let Some(index) = children.iter().position(|c| c == child) else {
            return false;
        };
        children.remove(index);
        *child.inner.parent.borrow_mut() = Weak::new();
        true
    }

    pub fn clear_children(&self) {
        for child in self.children() {
            self.remove_child(&child);
        }
    }

    pub fn parent(&self) -> Option<Region> {
        self.inner.parent.borrow().upgrade().map(|inner| Region { inner })
    }

    /// Calls `f` with the new parent every time the region is attached to
    /// or detached from a container.
    pub fn on_parent_changed(&self, f: impl Fn(Option<&Region>) + 'static) {
        self.inner.parent_listeners.borrow_mut().push(Rc::new(f));
    }

    fn fire_parent_changed(&self) {
        let listeners: Vec<ParentListener> = self.inner.parent_listeners.borrow().clone();
        let parent = self.parent();
        for listener in listeners {
            listener(parent.as_ref());
        }
    }

    /// The region a resize handle acts on.
    pub fn handle_target(&self) -> Option<Region> {
        self.inner.handle_target.borrow().upgrade().map(|inner| Region { inner })
    }

    pub fn is_mouse_transparent(&self) -> bool {
        self.inner.mouse_transparent.get()
    }

    pub fn set_mouse_transparent(&self, value: bool) {
        self.inner.mouse_transparent.set(value);
    }

    pub fn set_mouse_transparent_recursive(&self, value: bool) {
        self.set_mouse_transparent(value);
        for child in self.children() {
            child.set_mouse_transparent_recursive(value);
        }
    }

    pub fn is_draggable(&self) -> bool {
        self.inner.draggable.get()
    }

    pub(crate) fn set_draggable(&self, value: bool) {
        self.inner.draggable.set(value);
    }

    pub fn is_hoverable(&self) -> bool {
        self.inner.hoverable.get()
    }

    pub(crate) fn set_hoverable(&self, value: bool) {
        self.inner.hoverable.set(value);
    }

    /// Walks from this region up through its ancestors.
    pub fn ancestors(&self) -> impl Iterator<Item = Region> {
        std::iter::successors(Some(self.clone()), |r| r.parent())
    }
}

/// Root pane of a graph, scaled about the centre of its nominal size.
#[derive(Debug, Clone)]
pub struct PannableCanvas {
    region: Region,
    scale: Property<f64>,
}

impl PannableCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            region: Region::pane(width, height),
            scale: Property::new(1.0),
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn scale(&self) -> f64 {
        self.scale.get()
    }

    pub fn scale_property(&self) -> &Property<f64> {
        &self.scale
    }

    pub fn set_scale(&self, scale: f64) {
        self.scale.set(scale);
    }

    pub fn translate(&self) -> Point {
        Point::new(self.region.translate_x().get(), self.region.translate_y().get())
    }

    pub fn set_translate(&self, t: Point) {
        self.region.translate_x().set(t.x);
        self.region.translate_y().set(t.y);
    }

    /// Shifts the canvas by `-(x, y)`.
    pub fn set_pivot(&self, x: f64, y: f64) {
        let t = self.translate();
        self.set_translate(Point::new(t.x - x, t.y - y));
    }

    pub fn nominal_size(&self) -> (f64, f64) {
        (self.region.width().get(), self.region.height().get())
    }

    fn pivot(&self) -> Point {
        let (w, h) = self.nominal_size();
        Point::new(w / 2.0, h / 2.0)
    }

    pub fn local_to_parent(&self, p: Point) -> Point {
        let c = self.pivot();
        self.region.offset() + c + (p - c) * self.scale()
    }

    pub fn parent_to_local(&self, p: Point) -> Point {
        let c = self.pivot();
        c + (p - self.region.offset() - c) * (1.0 / self.scale())
    }

    /// Nominal box after scale and translate, in the host's coordinates.
    pub fn bounds_in_parent(&self) -> Rect {
        let (w, h) = self.nominal_size();
        let min = self.local_to_parent(Point::new(0.0, 0.0));
        let max = self.local_to_parent(Point::new(w, h));
        Rect::from_corners(min, max)
    }

    /// Box of every visible graphic on the canvas, in canvas coordinates.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.region
            .children()
            .iter()
            .filter(|c| c.is_visible())
            .map(Region::bounds_in_parent)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Topmost graphic under a scene point.
    pub fn pick(&self, scene: Point) -> Option<Region> {
        let local = self.parent_to_local(scene);
        self.region
            .children()
            .iter()
            .rev()
            .find_map(|child| child.pick(local))
    }

    pub fn add(&self, child: &Region) {
        self.region.add_child(child);
    }

    pub fn remove(&self, child: &Region) -> bool {
        self.region.remove_child(child)
    }

    pub fn clear(&self) {
        self.region.clear_children();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_reparents_and_notifies() {
        let a = Region::pane(100.0, 100.0);
        let b = Region::pane(100.0, 100.0);
        let child = Region::rectangle(10.0, 10.0, None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        child.on_parent_changed(move |p| log.borrow_mut().push(p.map(Region::id)));

        a.add_child(&child);
        b.add_child(&child);
        assert!(!a.contains_child(&child));
        assert!(b.contains_child(&child));
        b.remove_child(&child);
        assert_eq!(*seen.borrow(), vec![Some(a.id()), Some(b.id()), None]);
        assert!(child.parent().is_none());
    }

    #[test]
    fn bounds_follow_layout_and_translate() {
        let r = Region::rectangle(20.0, 10.0, None);
        r.relocate(5.0, 6.0);
        r.translate_x().set(-1.0);
        assert_eq!(r.bounds_in_parent(), Rect::new(4.0, 6.0, 20.0, 10.0));
    }

    #[test]
    fn pane_bounds_cover_children() {
        let group = Region::pane(0.0, 0.0);
        let a = Region::rectangle(10.0, 10.0, None);
        let b = Region::rectangle(10.0, 10.0, None);
        a.relocate(10.0, 10.0);
        b.relocate(40.0, 30.0);
        group.add_child(&a);
        group.add_child(&b);
        assert_eq!(group.bounds_in_local(), Rect::new(10.0, 10.0, 40.0, 30.0));
    }

    #[test]
    fn text_width_tracks_content() {
        let content = Property::new("ab".to_string());
        let text = Region::text(content.clone());
        assert_eq!(text.width().get(), 2.0 * TEXT_CHAR_WIDTH);
        content.set("abcd".to_string());
        assert_eq!(text.width().get(), 4.0 * TEXT_CHAR_WIDTH);
    }

    #[test]
    fn pick_skips_transparent_regions() {
        let canvas = PannableCanvas::new(200.0, 200.0);
        let below = Region::rectangle(50.0, 50.0, None);
        let above = Region::rectangle(50.0, 50.0, None);
        canvas.add(&below);
        canvas.add(&above);
        assert_eq!(canvas.pick(Point::new(10.0, 10.0)), Some(above.clone()));
        above.set_mouse_transparent(true);
        assert_eq!(canvas.pick(Point::new(10.0, 10.0)), Some(below));
    }

    #[test]
    fn line_hit_uses_tolerance() {
        let line = LineShape::new(false);
        line.end_x.set(100.0);
        let region = Region::line(line);
        assert!(region.contains(Point::new(50.0, 2.0)));
        assert!(!region.contains(Point::new(50.0, 5.0)));
    }

    #[test]
    fn canvas_scales_about_its_centre() {
        let canvas = PannableCanvas::new(100.0, 100.0);
        canvas.set_scale(2.0);
        assert_eq!(canvas.local_to_parent(Point::new(50.0, 50.0)), Point::new(50.0, 50.0));
        assert_eq!(canvas.local_to_parent(Point::new(0.0, 0.0)), Point::new(-50.0, -50.0));
        canvas.set_pivot(10.0, -10.0);
        let p = Point::new(30.0, 70.0);
        assert_eq!(canvas.parent_to_local(canvas.local_to_parent(p)), p);
        assert_eq!(canvas.bounds_in_parent(), Rect::new(-60.0, -40.0, 200.0, 200.0));
    }
}
