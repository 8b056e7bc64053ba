//! Style attributes that are either a constant or derived per frame.

use std::fmt;
use std::sync::Arc;

/// A style value: fixed at creation, or computed from a subject each frame.
///
/// `S` is the subject a derived value is computed from: an
/// [`Agent`](sim_core::Agent) for agent styles, the
/// [`Simulation`](sim_core::Simulation) for the background.
pub enum Attr<S, T> {
    /// Applied once when the display object is created.
    Constant(T),
    /// Re-evaluated every frame when its update toggle is on.
    Derived(Arc<dyn Fn(&S) -> T + Send + Sync>),
}

impl<S, T> Attr<S, T> {
    /// Wrap a callback.
    pub fn derived(f: impl Fn(&S) -> T + Send + Sync + 'static) -> Self {
        Attr::Derived(Arc::new(f))
    }

    /// True for callback-valued attributes.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Attr::Derived(_))
    }
}

impl<S, T: Clone> Attr<S, T> {
    /// Evaluate against a subject.
    pub fn resolve(&self, subject: &S) -> T {
        match self {
            Attr::Constant(value) => value.clone(),
            Attr::Derived(f) => f(subject),
        }
    }
}

impl<S, T: Clone> Attr<S, Option<T>> {
    /// Evaluate, substituting `fallback` when the result is absent.
    pub fn resolve_or(&self, subject: &S, fallback: T) -> T {
        self.resolve(subject).unwrap_or(fallback)
    }
}

impl<S, T> From<T> for Attr<S, T> {
    fn from(value: T) -> Self {
        Attr::Constant(value)
    }
}

impl<S, T: Clone> Clone for Attr<S, T> {
    fn clone(&self) -> Self {
        match self {
            Attr::Constant(value) => Attr::Constant(value.clone()),
            Attr::Derived(f) => Attr::Derived(Arc::clone(f)),
        }
    }
}

impl<S, T: fmt::Debug> fmt::Debug for Attr<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Attr::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}
