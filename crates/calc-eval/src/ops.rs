//! Arithmetic and comparison operators lifted over formula values.
//!
//! A lifted operator coerces its operands through `AsPrimitive`. An object
//! that survives coercion (an error, an unresolved value) is returned in place
//! of the result, the left operand first; a function operand yields the
//! `FunctionAsOpArgument` error.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::delay::Delayed;
use crate::error_value::ErrorKind;
use crate::runtime::Runtime;
use crate::value::{CalcValue, Primitive, Property};

/// A binary operator over formula values.
pub type BinOp<O> =
    Rc<dyn Fn(&Runtime<O>, &O, CalcValue<O>, CalcValue<O>) -> Delayed<CalcValue<O>>>;

/// A unary operator over formula values.
pub type UnaryOp<O> = Rc<dyn Fn(&Runtime<O>, &O, CalcValue<O>) -> Delayed<CalcValue<O>>>;

fn coerce<O>(rt: &Runtime<O>, origin: &O, operand: CalcValue<O>) -> Delayed<CalcValue<O>> {
    rt.read(origin, Delayed::Resolved(operand.clone()), Property::AsPrimitive, operand)
}

/// Lift a function on primitives into a binary operator.
pub fn lift_bin_op<O: 'static>(
    f: impl Fn(Primitive, Primitive) -> CalcValue<O> + 'static,
) -> BinOp<O> {
    Rc::new(move |rt: &Runtime<O>, origin: &O, l: CalcValue<O>, r: CalcValue<O>| {
        let l = coerce(rt, origin, l);
        let r = coerce(rt, origin, r);
        let (Delayed::Resolved(l), Delayed::Resolved(r)) = (l, r) else {
            return Delayed::Suspended;
        };
        let result = match (l, r) {
            (obj @ CalcValue::Object(_), _) => obj,
            (CalcValue::Function(_), _) | (_, CalcValue::Function(_)) => {
                ErrorKind::FunctionAsOpArgument.value()
            }
            (_, obj @ CalcValue::Object(_)) => obj,
            (CalcValue::Primitive(l), CalcValue::Primitive(r)) => f(l, r),
        };
        Delayed::Resolved(result)
    })
}

/// Lift a function on primitives into a unary operator.
pub fn lift_unary_op<O: 'static>(f: impl Fn(Primitive) -> Primitive + 'static) -> UnaryOp<O> {
    Rc::new(move |rt: &Runtime<O>, origin: &O, operand: CalcValue<O>| {
        coerce(rt, origin, operand).map(|operand| match operand {
            obj @ CalcValue::Object(_) => obj,
            CalcValue::Function(_) => ErrorKind::FunctionAsOpArgument.value(),
            CalcValue::Primitive(p) => CalcValue::Primitive(f(p)),
        })
    })
}

/// Guard a division: a zero divisor yields the `Div0` error without calling `f`.
pub fn non_zero_divisor<O: 'static>(
    f: impl Fn(Primitive, Primitive) -> CalcValue<O> + 'static,
) -> impl Fn(Primitive, Primitive) -> CalcValue<O> + 'static {
    move |l, r| {
        if r.to_number() == 0.0 {
            ErrorKind::Div0.value()
        } else {
            f(l, r)
        }
    }
}

fn numeric<O>(f: fn(f64, f64) -> f64) -> impl Fn(Primitive, Primitive) -> CalcValue<O> {
    move |l, r| CalcValue::from(f(l.to_number(), r.to_number()))
}

fn add<O>(l: Primitive, r: Primitive) -> CalcValue<O> {
    match (&l, &r) {
        (Primitive::String(_), _) | (_, Primitive::String(_)) => {
            CalcValue::from(l.to_string_value() + &r.to_string_value())
        }
        _ => CalcValue::from(l.to_number() + r.to_number()),
    }
}

fn ordered<O>(
    accept: fn(std::cmp::Ordering) -> bool,
) -> impl Fn(Primitive, Primitive) -> CalcValue<O> {
    move |l, r| CalcValue::from(l.compare(&r).is_some_and(accept))
}

/// An operator symbol that is not in either table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator `{0}`")]
pub struct UnknownOperator(pub String);

/// Binary operator tags, as produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
}

impl BinaryOpKind {
    pub const ALL: [BinaryOpKind; 10] = [
        BinaryOpKind::Add,
        BinaryOpKind::Sub,
        BinaryOpKind::Mul,
        BinaryOpKind::Div,
        BinaryOpKind::Eq,
        BinaryOpKind::Lt,
        BinaryOpKind::Gt,
        BinaryOpKind::Le,
        BinaryOpKind::Ge,
        BinaryOpKind::Ne,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOpKind::Add => "+",
            BinaryOpKind::Sub => "-",
            BinaryOpKind::Mul => "*",
            BinaryOpKind::Div => "/",
            BinaryOpKind::Eq => "=",
            BinaryOpKind::Lt => "<",
            BinaryOpKind::Gt => ">",
            BinaryOpKind::Le => "<=",
            BinaryOpKind::Ge => ">=",
            BinaryOpKind::Ne => "<>",
        }
    }

    /// Build the operator for this tag.
    pub fn op<O: 'static>(self) -> BinOp<O> {
        match self {
            BinaryOpKind::Add => lift_bin_op(add),
            BinaryOpKind::Sub => lift_bin_op(numeric(|l, r| l - r)),
            BinaryOpKind::Mul => lift_bin_op(numeric(|l, r| l * r)),
            BinaryOpKind::Div => lift_bin_op(non_zero_divisor(numeric(|l, r| l / r))),
            BinaryOpKind::Eq => lift_bin_op(|l, r| CalcValue::from(l == r)),
            BinaryOpKind::Lt => lift_bin_op(ordered(|o| o.is_lt())),
            BinaryOpKind::Gt => lift_bin_op(ordered(|o| o.is_gt())),
            BinaryOpKind::Le => lift_bin_op(ordered(|o| o.is_le())),
            BinaryOpKind::Ge => lift_bin_op(ordered(|o| o.is_ge())),
            BinaryOpKind::Ne => lift_bin_op(|l, r| CalcValue::from(l != r)),
        }
    }
}

impl fmt::Display for BinaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for BinaryOpKind {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BinaryOpKind::ALL
            .into_iter()
            .find(|kind| kind.symbol() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Unary operator tags, as produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOpKind {
    Plus,
    Minus,
}

impl UnaryOpKind {
    pub const ALL: [UnaryOpKind; 2] = [UnaryOpKind::Plus, UnaryOpKind::Minus];

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOpKind::Plus => "+",
            UnaryOpKind::Minus => "-",
        }
    }

    /// Build the operator for this tag.
    ///
    /// Unary plus hands back its operand as is, without `AsPrimitive`
    /// coercion; unary minus coerces like every binary operator.
    pub fn op<O: 'static>(self) -> UnaryOp<O> {
        match self {
            UnaryOpKind::Plus => {
                let identity: UnaryOp<O> = Rc::new(|_: &Runtime<O>, _: &O, operand: CalcValue<O>| {
                    Delayed::Resolved(operand)
                });
                identity
            }
            UnaryOpKind::Minus => lift_unary_op(|p| Primitive::Number(-p.to_number())),
        }
    }
}

impl fmt::Display for UnaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for UnaryOpKind {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnaryOpKind::ALL
            .into_iter()
            .find(|kind| kind.symbol() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// The binary operator table.
pub fn binary_ops<O: 'static>() -> HashMap<BinaryOpKind, BinOp<O>> {
    BinaryOpKind::ALL.into_iter().map(|kind| (kind, kind.op())).collect()
}

/// The unary operator table.
pub fn unary_ops<O: 'static>() -> HashMap<UnaryOpKind, UnaryOp<O>> {
    UnaryOpKind::ALL.into_iter().map(|kind| (kind, kind.op())).collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::delay::{Pending, Read};
    use crate::error_value::make_error;
    use crate::value::CalcObj;

    struct Fixed(Read<CalcValue<()>>);

    impl CalcObj<()> for Fixed {
        fn read(&self, _property: Property<'_>, _origin: &()) -> Read<CalcValue<()>> {
            self.0.clone()
        }
    }

    fn num(n: f64) -> Delayed<CalcValue<()>> {
        Delayed::Resolved(CalcValue::from(n))
    }

    fn binary(
        kind: BinaryOpKind,
        l: Delayed<CalcValue<()>>,
        r: Delayed<CalcValue<()>>,
    ) -> Delayed<CalcValue<()>> {
        let rt = Runtime::new();
        let op: BinOp<()> = kind.op();
        rt.app2(&(), &*op, l, r)
    }

    #[test]
    fn test_arithmetic_matches_native() {
        let pairs = [(1.0, 2.0), (-3.5, 0.25), (1e10, -7.0), (0.0, 0.0)];
        for (x, y) in pairs {
            assert_eq!(binary(BinaryOpKind::Add, num(x), num(y)), num(x + y));
            assert_eq!(binary(BinaryOpKind::Sub, num(x), num(y)), num(x - y));
            assert_eq!(binary(BinaryOpKind::Mul, num(x), num(y)), num(x * y));
        }
        assert_eq!(binary(BinaryOpKind::Div, num(7.0), num(2.0)), num(3.5));
    }

    #[test]
    fn test_division_by_zero_is_div0_singleton() {
        let got = binary(BinaryOpKind::Div, num(5.0), num(0.0));
        assert_eq!(got, Delayed::Resolved(ErrorKind::Div0.value()));
        let got = binary(BinaryOpKind::Div, num(5.0), num(-0.0));
        assert_eq!(got, Delayed::Resolved(ErrorKind::Div0.value()));
    }

    #[test]
    fn test_div0_guard_skips_numeric_function() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let op: BinOp<()> = lift_bin_op(non_zero_divisor(move |l: Primitive, r: Primitive| {
            counter.set(counter.get() + 1);
            CalcValue::from(l.to_number() / r.to_number())
        }));
        let rt = Runtime::new();
        let got = rt.app2(&(), &*op, num(1.0), num(0.0));
        assert_eq!(got, Delayed::Resolved(ErrorKind::Div0.value()));
        assert_eq!(calls.get(), 0);
        let _ = rt.app2(&(), &*op, num(1.0), num(4.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_string_concatenation() {
        let got = binary(BinaryOpKind::Add, Delayed::Resolved(CalcValue::from("a")), num(1.0));
        assert_eq!(got, Delayed::Resolved(CalcValue::from("a1")));
    }

    #[test]
    fn test_comparisons() {
        let t = Delayed::Resolved(CalcValue::from(true));
        let f = Delayed::Resolved(CalcValue::from(false));
        assert_eq!(binary(BinaryOpKind::Lt, num(1.0), num(2.0)), t);
        assert_eq!(binary(BinaryOpKind::Gt, num(1.0), num(2.0)), f);
        assert_eq!(binary(BinaryOpKind::Le, num(2.0), num(2.0)), t);
        assert_eq!(binary(BinaryOpKind::Ge, num(1.0), num(2.0)), f);
        assert_eq!(binary(BinaryOpKind::Eq, num(2.0), num(2.0)), t);
        assert_eq!(binary(BinaryOpKind::Ne, num(2.0), num(2.0)), f);
        assert_eq!(
            binary(BinaryOpKind::Eq, num(1.0), Delayed::Resolved(CalcValue::from("1"))),
            f
        );
        assert_eq!(binary(BinaryOpKind::Lt, num(f64::NAN), num(1.0)), f);
    }

    #[test]
    fn test_object_operands_are_coerced() {
        let cell = Delayed::Resolved(CalcValue::object(Fixed(Read::Value(CalcValue::from(40.0)))));
        assert_eq!(binary(BinaryOpKind::Add, cell, num(2.0)), num(42.0));
    }

    #[test]
    fn test_error_operands_propagate_left_first() {
        let left = CalcValue::Object(make_error("left"));
        let right = CalcValue::Object(make_error("right"));
        let got = binary(
            BinaryOpKind::Add,
            Delayed::Resolved(left.clone()),
            Delayed::Resolved(right.clone()),
        );
        assert_eq!(got, Delayed::Resolved(left));
        let got = binary(BinaryOpKind::Mul, num(1.0), Delayed::Resolved(right.clone()));
        assert_eq!(got, Delayed::Resolved(right));
    }

    #[test]
    fn test_function_operand_is_an_error() {
        let fun = CalcValue::function(|_, _, _| Delayed::Resolved(CalcValue::from(1.0)));
        let expected = Delayed::Resolved(ErrorKind::FunctionAsOpArgument.value());
        assert_eq!(binary(BinaryOpKind::Add, Delayed::Resolved(fun.clone()), num(1.0)), expected);
        assert_eq!(binary(BinaryOpKind::Add, num(1.0), Delayed::Resolved(fun.clone())), expected);

        // left error object wins over a function on the right
        let err = CalcValue::Object(make_error("left"));
        let got = binary(BinaryOpKind::Add, Delayed::Resolved(err.clone()), Delayed::Resolved(fun));
        assert_eq!(got, Delayed::Resolved(err));
    }

    #[test]
    fn test_pending_operands_suspend_and_record_both() {
        let a = Pending::new("a");
        let b = Pending::new("b");
        let rt = Runtime::new();
        let op: BinOp<()> = BinaryOpKind::Add.op();
        let l = Delayed::Resolved(CalcValue::object(Fixed(Read::Pending(a.clone()))));
        let r = Delayed::Resolved(CalcValue::object(Fixed(Read::Pending(b.clone()))));
        assert!(rt.app2(&(), &*op, l, r).is_suspended());
        assert_eq!(rt.into_pending(), vec![a, b]);
    }

    #[test]
    fn test_left_error_waits_for_pending_right() {
        let request = Pending::new("right");
        let rt = Runtime::new();
        let op: BinOp<()> = BinaryOpKind::Add.op();
        let l = Delayed::Resolved(CalcValue::Object(make_error("left")));
        let r = Delayed::Resolved(CalcValue::object(Fixed(Read::Pending(request.clone()))));
        assert!(rt.app2(&(), &*op, l, r).is_suspended());
        assert_eq!(rt.into_pending(), vec![request]);
    }

    #[test]
    fn test_unary_minus_coerces() {
        let rt = Runtime::new();
        let minus: UnaryOp<()> = UnaryOpKind::Minus.op();
        assert_eq!(rt.app1(&(), &*minus, num(3.0)), num(-3.0));
        let cell = Delayed::Resolved(CalcValue::object(Fixed(Read::Value(CalcValue::from("4")))));
        assert_eq!(rt.app1(&(), &*minus, cell), num(-4.0));
        let fun = CalcValue::function(|_, _, _| Delayed::Resolved(CalcValue::from(1.0)));
        assert_eq!(
            rt.app1(&(), &*minus, Delayed::Resolved(fun)),
            Delayed::Resolved(ErrorKind::FunctionAsOpArgument.value())
        );
    }

    #[test]
    fn test_unary_plus_skips_coercion() {
        let request = Pending::new("never read");
        let rt = Runtime::new();
        let plus: UnaryOp<()> = UnaryOpKind::Plus.op();
        let cell = CalcValue::object(Fixed(Read::Pending(request)));
        assert_eq!(rt.app1(&(), &*plus, Delayed::Resolved(cell.clone())), Delayed::Resolved(cell));
        assert!(rt.tracer().is_empty());

        let fun = CalcValue::function(|_, _, _| Delayed::Resolved(CalcValue::from(1.0)));
        assert_eq!(rt.app1(&(), &*plus, Delayed::Resolved(fun.clone())), Delayed::Resolved(fun));
    }

    #[test]
    fn test_unary_minus_passes_objects_through() {
        let rt = Runtime::new();
        let minus: UnaryOp<()> = UnaryOpKind::Minus.op();
        let err = CalcValue::Object(make_error("bad cell"));
        let got = rt.app1(&(), &*minus, Delayed::Resolved(err.clone()));
        assert_eq!(got, Delayed::Resolved(err));

        let div0 = ErrorKind::Div0.value();
        let cell = Delayed::Resolved(CalcValue::object(Fixed(Read::Value(div0.clone()))));
        assert_eq!(rt.app1(&(), &*minus, cell), Delayed::Resolved(div0));
        assert!(rt.tracer().is_empty());
    }

    #[test]
    fn test_unary_minus_pending_operand_suspends() {
        let request = Pending::new("A1");
        let rt = Runtime::new();
        let minus: UnaryOp<()> = UnaryOpKind::Minus.op();
        let cell = Delayed::Resolved(CalcValue::object(Fixed(Read::Pending(request.clone()))));
        assert!(rt.app1(&(), &*minus, cell).is_suspended());
        assert_eq!(rt.into_pending(), vec![request]);
    }

    #[test]
    fn test_tables_and_symbols() {
        let binary = binary_ops::<()>();
        let unary = unary_ops::<()>();
        assert_eq!(binary.len(), 10);
        assert_eq!(unary.len(), 2);
        for kind in BinaryOpKind::ALL {
            assert_eq!(kind.symbol().parse::<BinaryOpKind>(), Ok(kind));
        }
        assert_eq!("-".parse::<UnaryOpKind>(), Ok(UnaryOpKind::Minus));
        assert_eq!("%".parse::<BinaryOpKind>(), Err(UnknownOperator("%".to_string())));
    }
}
