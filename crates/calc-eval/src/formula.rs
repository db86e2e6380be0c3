//! The formula entry point.

use crate::delay::{Delayed, Pending};
use crate::runtime::Runtime;
use crate::value::{CalcValue, ObjRef};

/// A compiled formula: something that evaluates against a root object.
///
/// Closures of the shape `Fn(&Runtime<O>, &O, &ObjRef<O>) -> Delayed<CalcValue<O>>`
/// are formulas.
pub trait Formula<O> {
    fn evaluate(&self, rt: &Runtime<O>, origin: &O, context: &ObjRef<O>) -> Delayed<CalcValue<O>>;
}

impl<O, F> Formula<O> for F
where
    F: Fn(&Runtime<O>, &O, &ObjRef<O>) -> Delayed<CalcValue<O>>,
{
    fn evaluate(&self, rt: &Runtime<O>, origin: &O, context: &ObjRef<O>) -> Delayed<CalcValue<O>> {
        self(rt, origin, context)
    }
}

/// Run one evaluation pass with a fresh runtime.
///
/// Returns the pending requests met during the pass, in the order they were
/// encountered, together with the result.
pub fn evaluate<O, F>(
    formula: &F,
    origin: &O,
    context: &ObjRef<O>,
) -> (Vec<Pending>, Delayed<CalcValue<O>>)
where
    F: Formula<O> + ?Sized,
{
    let rt = Runtime::new();
    let value = formula.evaluate(&rt, origin, context);
    (rt.into_pending(), value)
}
