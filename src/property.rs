//! Push-based observable values.
//!
//! A [`Property`] is a shared cell that notifies its subscribers whenever
//! its value changes. Derived properties (`map`, `combine`, `derive`)
//! recompute eagerly when any dependency changes, so readers never observe
//! a stale anchor or label.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
    next_id: Cell<u64>,
    binding: RefCell<Option<Binding<T>>>,
    /// Properties this one is derived from.
    upstream: RefCell<Vec<Box<dyn Any>>>,
    /// Listeners this property placed on `upstream`.
    sources: RefCell<Vec<Subscription>>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        for subscription in self.sources.get_mut().drain(..) {
            subscription.cancel();
        }
    }
}

/// A unidirectional binding keeps its source alive.
struct Binding<T> {
    _source: Property<T>,
    subscription: Subscription,
}

/// Shared observable value. Cloning a `Property` clones the handle.
pub struct Property<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.inner.value.borrow()).finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Handle returned by `subscribe`. Listeners stay registered until
/// `cancel` is called; dropping the handle leaves them in place.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Anything a derived property can depend on.
pub trait Observable {
    fn on_invalidated(&self, f: Rc<dyn Fn()>) -> Subscription;

    /// A strong handle that keeps the observable alive.
    fn share(&self) -> Box<dyn Any>;
}

impl<T: Clone + PartialEq + 'static> Observable for Property<T> {
    fn on_invalidated(&self, f: Rc<dyn Fn()>) -> Subscription {
        self.subscribe(move |_| f())
    }

    fn share(&self) -> Box<dyn Any> {
        Box::new(self.clone())
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                binding: RefCell::new(None),
                upstream: RefCell::new(Vec::new()),
                sources: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Stores `value` and notifies subscribers if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value.clone();
        }
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(f)));
        let weak = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let removed = {
                        let mut listeners = inner.listeners.borrow_mut();
                        let index = listeners.iter().position(|(other, _)| *other == id);
                        index.map(|index| listeners.remove(index))
                    };
                    drop(removed);
                }
            })),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn downgrade(&self) -> Weak<Inner<T>> {
        Rc::downgrade(&self.inner)
    }

    fn from_weak(weak: &Weak<Inner<T>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Follows `source` until `unbind` or another `bind` call.
    pub fn bind(&self, source: &Property<T>) {
        self.unbind();
        self.set(source.get());
        let target = self.downgrade();
        let subscription = source.subscribe(move |value| {
            if let Some(target) = Property::from_weak(&target) {
                target.set(value.clone());
            }
        });
        *self.inner.binding.borrow_mut() = Some(Binding {
            _source: source.clone(),
            subscription,
        });
    }

    pub fn unbind(&self) {
        let previous = self.inner.binding.borrow_mut().take();
        if let Some(binding) = previous {
            binding.subscription.cancel();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.inner.binding.borrow().is_some()
    }

    /// Keeps both properties equal. `self` takes `other`'s value first.
    pub fn bind_bidirectional(&self, other: &Property<T>) {
        self.set(other.get());
        let this = self.downgrade();
        other.subscribe(move |value| {
            if let Some(this) = Property::from_weak(&this) {
                this.set(value.clone());
            }
        });
        let that = other.downgrade();
        self.subscribe(move |value| {
            if let Some(that) = Property::from_weak(&that) {
                that.set(value.clone());
            }
        });
    }

    pub fn map<U, F>(&self, f: F) -> Property<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let derived = Property::new(self.with(&f));
        derived.inner.upstream.borrow_mut().push(self.share());
        let weak = derived.downgrade();
        let subscription = self.subscribe(move |value| {
            if let Some(derived) = Property::from_weak(&weak) {
                derived.set(f(value));
            }
        });
        derived.inner.sources.borrow_mut().push(subscription);
        derived
    }

    pub fn combine<U, V, F>(&self, other: &Property<U>, f: F) -> Property<V>
    where
        U: Clone + PartialEq + 'static,
        V: Clone + PartialEq + 'static,
        F: Fn(&T, &U) -> V + 'static,
    {
        let a = self.clone();
        let b = other.clone();
        derive(&[self as &dyn Observable, other], move || f(&a.get(), &b.get()))
    }
}

/// Builds a property whose value is `compute()` and recomputes it whenever
/// one of `deps` changes. The result keeps its dependencies alive; they
/// only refer back to it weakly, and its listeners on them go away when it
/// is dropped.
pub fn derive<T, F>(deps: &[&dyn Observable], compute: F) -> Property<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    let compute = Rc::new(compute);
    let derived = Property::new(compute());
    let weak = derived.downgrade();
    let recompute: Rc<dyn Fn()> = Rc::new(move || {
        if let Some(derived) = Property::from_weak(&weak) {
            derived.set(compute());
        }
    });
    for dep in deps {
        let subscription = dep.on_invalidated(Rc::clone(&recompute));
        derived.inner.sources.borrow_mut().push(subscription);
        derived.inner.upstream.borrow_mut().push(dep.share());
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let prop = Property::new(1.0);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        prop.subscribe(move |_| counter.set(counter.get() + 1));
        prop.set(1.0);
        prop.set(2.0);
        prop.set(2.0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cancelled_subscription_stops_notifications() {
        let prop = Property::new(0);
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let sub = prop.subscribe(move |v| sink.set(*v));
        prop.set(3);
        sub.cancel();
        prop.set(7);
        assert_eq!(seen.get(), 3);
        assert_eq!(prop.listener_count(), 0);
    }

    #[test]
    fn bind_follows_source_until_unbound() {
        let source = Property::new(5.0);
        let target = Property::new(0.0);
        target.bind(&source);
        assert_eq!(target.get(), 5.0);
        source.set(8.0);
        assert_eq!(target.get(), 8.0);
        target.unbind();
        source.set(9.0);
        assert_eq!(target.get(), 8.0);
        assert!(!target.is_bound());
    }

    #[test]
    fn bidirectional_binding_syncs_both_ways() {
        let a = Property::new(1);
        let b = Property::new(2);
        a.bind_bidirectional(&b);
        assert_eq!(a.get(), 2);
        a.set(10);
        assert_eq!(b.get(), 10);
        b.set(20);
        assert_eq!(a.get(), 20);
    }

    #[test]
    fn derived_values_are_pushed() {
        let x = Property::new(10.0);
        let width = Property::new(50.0);
        let center = x.combine(&width, |x, w| x + w / 2.0);
        assert_eq!(center.get(), 35.0);
        x.set(20.0);
        assert_eq!(center.get(), 45.0);
        width.set(10.0);
        assert_eq!(center.get(), 25.0);

        let label = center.map(|c| format!("{c}"));
        center.set(1.5);
        assert_eq!(label.get(), "1.5");
    }

    #[test]
    fn derived_chain_survives_dropped_intermediates() {
        let x = Property::new(1.0);
        let y = Property::new(2.0);
        let tail = {
            let sum = x.combine(&y, |a, b| a + b);
            sum.map(|s| s * 10.0)
        };
        x.set(4.0);
        assert_eq!(tail.get(), 60.0);
    }

    #[test]
    fn dropped_derived_property_is_not_kept_alive() {
        let x = Property::new(1);
        let doubled = x.map(|v| v * 2);
        let weak = doubled.downgrade();
        drop(doubled);
        x.set(2);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn dropped_derived_values_release_their_listeners() {
        let x = Property::new(1.0);
        let y = Property::new(2.0);
        for _ in 0..100 {
            let sum = x.combine(&y, |a, b| a + b);
            let _label = sum.map(|s| format!("{s}"));
        }
        assert_eq!(x.listener_count(), 0);
        assert_eq!(y.listener_count(), 0);

        let kept = x.map(|v| v * 2.0);
        {
            let _dropped = x.map(|v| v * 3.0);
            assert_eq!(x.listener_count(), 2);
        }
        assert_eq!(x.listener_count(), 1);
        x.set(5.0);
        assert_eq!(kept.get(), 10.0);
    }

    #[test]
    fn bound_derived_value_stays_subscribed() {
        let x = Property::new(1.0);
        let target = Property::new(0.0);
        target.bind(&x.map(|v| v + 1.0));
        x.set(4.0);
        assert_eq!(target.get(), 5.0);
        target.unbind();
        assert_eq!(x.listener_count(), 0);
    }
}
