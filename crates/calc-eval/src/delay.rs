//! The suspension effect and the per-evaluation pending-request tracer.
//!
//! A value that may not be computable yet is a [`Delayed`]. Host objects never
//! produce `Delayed` directly: they answer reads with a [`Read`], which is either
//! a value or a [`Pending`] request. The [`Tracer`] owned by each evaluation is
//! the only place a `Read` is turned into a `Delayed`, recording every pending
//! request it sees on the way.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Either a resolved value or the suspended marker.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Delayed<T> {
    /// The computation completed with a value.
    Resolved(T),
    /// The computation cannot complete in this pass.
    Suspended,
}

impl<T> Delayed<T> {
    /// Check if this is the suspended marker.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Delayed::Suspended)
    }

    /// Check if this holds a resolved value.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Delayed::Resolved(_))
    }

    /// Convert into an `Option`, dropping the suspended marker.
    pub fn resolved(self) -> Option<T> {
        match self {
            Delayed::Resolved(value) => Some(value),
            Delayed::Suspended => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Delayed<U> {
        match self {
            Delayed::Resolved(value) => Delayed::Resolved(f(value)),
            Delayed::Suspended => Delayed::Suspended,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Delayed<U>) -> Delayed<U> {
        match self {
            Delayed::Resolved(value) => f(value),
            Delayed::Suspended => Delayed::Suspended,
        }
    }
}

impl<T> From<T> for Delayed<T> {
    fn from(value: T) -> Self {
        Delayed::Resolved(value)
    }
}

/// Collecting stops pulling from the iterator at the first `Suspended`.
impl<T, V: FromIterator<T>> FromIterator<Delayed<T>> for Delayed<V> {
    fn from_iter<I: IntoIterator<Item = Delayed<T>>>(iter: I) -> Self {
        match iter.into_iter().map(Delayed::resolved).collect::<Option<V>>() {
            Some(values) => Delayed::Resolved(values),
            None => Delayed::Suspended,
        }
    }
}

/// An opaque token for one blocked request.
///
/// Tokens compare by identity: two tokens are equal only if one is a clone of
/// the other. The evaluation core only stores and returns them; what a request
/// means is up to the host that created it.
#[derive(Clone)]
pub struct Pending(Rc<dyn Any>);

impl Pending {
    /// Wrap a host request.
    pub fn new<T: Any>(request: T) -> Self {
        Pending(Rc::new(request))
    }

    /// Recover the host request, if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Pending {}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pending({:p})", Rc::as_ptr(&self.0))
    }
}

/// The raw answer of a host capability: a value, or a request that blocks it.
#[derive(Debug, Clone, PartialEq)]
pub enum Read<T> {
    Value(T),
    Pending(Pending),
}

/// Records the pending requests observed during one evaluation attempt.
///
/// A tracer belongs to exactly one attempt; create a new one for every pass.
#[derive(Debug, Default)]
pub struct Tracer {
    pending: RefCell<Vec<Pending>>,
}

impl Tracer {
    /// Create a tracer with an empty pending list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lift a raw read result into `Delayed`.
    ///
    /// A pending request is appended to the list (in call order, duplicates
    /// kept) and becomes `Suspended`; a value passes through untouched.
    pub fn trace<T>(&self, read: Read<T>) -> Delayed<T> {
        match read {
            Read::Value(value) => Delayed::Resolved(value),
            Read::Pending(request) => {
                let mut pending = self.pending.borrow_mut();
                pending.push(request);
                tracing::trace!(count = pending.len(), "recorded pending request");
                Delayed::Suspended
            }
        }
    }

    /// Snapshot of the requests recorded so far.
    pub fn pending(&self) -> Vec<Pending> {
        self.pending.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Consume the tracer, returning the recorded requests in discovery order.
    pub fn into_pending(self) -> Vec<Pending> {
        self.pending.into_inner()
    }
}
