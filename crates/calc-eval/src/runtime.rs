//! The evaluation runtime.
//!
//! Every operation threads the suspension effect: a suspended input produces
//! a suspended output without calling the supplied operator, continuation or
//! function. Reads of host objects go through the runtime's [`Tracer`], so the
//! pending requests met during one pass are collected in order.

use std::marker::PhantomData;

use crate::delay::{Delayed, Pending, Tracer};
use crate::value::{CalcValue, Primitive, Property};

/// Per-evaluation dispatcher. Create a fresh runtime for every attempt.
pub struct Runtime<O> {
    tracer: Tracer,
    _origin: PhantomData<fn(&O)>,
}

impl<O> Runtime<O> {
    pub fn new() -> Self {
        Self {
            tracer: Tracer::new(),
            _origin: PhantomData,
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Consume the runtime, returning the pending requests it recorded.
    pub fn into_pending(self) -> Vec<Pending> {
        self.tracer.into_pending()
    }

    /// Read `prop` off `context`.
    ///
    /// Primitives and functions have no properties; reading one yields
    /// `fallback`.
    pub fn read(
        &self,
        origin: &O,
        context: Delayed<CalcValue<O>>,
        prop: Property<'_>,
        fallback: CalcValue<O>,
    ) -> Delayed<CalcValue<O>> {
        let Delayed::Resolved(context) = context else {
            return Delayed::Suspended;
        };
        match context {
            CalcValue::Object(obj) => self.tracer.trace(obj.read(prop, origin)),
            CalcValue::Primitive(_) | CalcValue::Function(_) => Delayed::Resolved(fallback),
        }
    }

    /// Choose a branch once `cond` is known.
    pub fn if_s<T>(
        &self,
        cond: Delayed<bool>,
        then: impl FnOnce(bool) -> Delayed<T>,
    ) -> Delayed<T> {
        match cond {
            Delayed::Resolved(cond) => then(cond),
            Delayed::Suspended => Delayed::Suspended,
        }
    }

    /// Apply a unary operator to a resolved operand.
    pub fn app1<A, R>(
        &self,
        origin: &O,
        op: impl FnOnce(&Self, &O, A) -> Delayed<R>,
        expr: Delayed<A>,
    ) -> Delayed<R> {
        match expr {
            Delayed::Resolved(expr) => op(self, origin, expr),
            Delayed::Suspended => Delayed::Suspended,
        }
    }

    /// Apply a binary operator once both operands are resolved.
    pub fn app2<A, B, R>(
        &self,
        origin: &O,
        op: impl FnOnce(&Self, &O, A, B) -> Delayed<R>,
        l: Delayed<A>,
        r: Delayed<B>,
    ) -> Delayed<R> {
        match (l, r) {
            (Delayed::Resolved(l), Delayed::Resolved(r)) => op(self, origin, l, r),
            _ => Delayed::Suspended,
        }
    }

    /// Apply `f` to `args`.
    ///
    /// An object in function position is coerced through `AsPrimitive`
    /// first. Arguments are pulled in order and the first suspended one ends
    /// the scan, so arguments produced lazily after it are never evaluated.
    /// A target that is not a function yields `fallback`, unless an
    /// argument is suspended: a suspended argument wins over the fallback.
    pub fn app_n<I>(
        &self,
        origin: &O,
        f: Delayed<CalcValue<O>>,
        args: I,
        fallback: CalcValue<O>,
    ) -> Delayed<CalcValue<O>>
    where
        I: IntoIterator<Item = Delayed<CalcValue<O>>>,
    {
        let Delayed::Resolved(f) = f else {
            return Delayed::Suspended;
        };
        let target = match f {
            CalcValue::Object(obj) => {
                match self.tracer.trace(obj.read(Property::AsPrimitive, origin)) {
                    Delayed::Resolved(target) => target,
                    Delayed::Suspended => return Delayed::Suspended,
                }
            }
            other => other,
        };
        let Delayed::Resolved(args) = args.into_iter().collect::<Delayed<Vec<_>>>() else {
            return Delayed::Suspended;
        };
        match target {
            CalcValue::Function(fun) => fun.call(self, origin, args),
            CalcValue::Primitive(_) | CalcValue::Object(_) => Delayed::Resolved(fallback),
        }
    }

    /// Render a value as text.
    ///
    /// Objects are asked for `AsString`; a string answer is used verbatim.
    pub fn stringify(&self, origin: &O, value: Delayed<CalcValue<O>>) -> Delayed<String> {
        let Delayed::Resolved(value) = value else {
            return Delayed::Suspended;
        };
        match value {
            CalcValue::Primitive(p) => Delayed::Resolved(p.to_string_value()),
            CalcValue::Function(_) => Delayed::Resolved("[function]".to_string()),
            CalcValue::Object(obj) => {
                let text = self.tracer.trace(obj.read(Property::AsString, origin));
                text.map(|text| match text {
                    CalcValue::Primitive(p) => p.to_string_value(),
                    CalcValue::Object(_) => "[object]".to_string(),
                    CalcValue::Function(_) => "[function]".to_string(),
                })
            }
        }
    }

    /// Coerce a value for use as a condition.
    ///
    /// Primitives yield their truthiness. Anything that does not coerce to a
    /// primitive (an error object, a function) comes back as `Err` so the
    /// caller can return it in place of either branch.
    pub fn condition(
        &self,
        origin: &O,
        value: Delayed<CalcValue<O>>,
    ) -> Delayed<Result<bool, CalcValue<O>>> {
        let Delayed::Resolved(value) = value else {
            return Delayed::Suspended;
        };
        let coerced =
            self.read(origin, Delayed::Resolved(value.clone()), Property::AsPrimitive, value);
        coerced.map(|coerced| match coerced {
            CalcValue::Primitive(p) => Ok(Primitive::to_bool(&p)),
            other => Err(other),
        })
    }
}

impl<O> Default for Runtime<O> {
    fn default() -> Self {
        Self::new()
    }
}
