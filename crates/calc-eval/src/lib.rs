//! Formula evaluation with suspendable reads.
//!
//! Formulas are evaluated against host objects whose values may not be
//! available yet. Instead of failing, a read of such a value suspends the
//! computation, and the pending request behind it is recorded. One pass yields
//! either a value or [`Delayed::Suspended`] plus the requests that blocked it;
//! the host resolves those and evaluates again. The [`Interpreter`] drives
//! that loop.
//!
//! Formula failures such as division by zero are ordinary values (see
//! [`ErrorKind`]) that propagate through every later read and operator.
//! [`Error`] is reserved for failures of the driver loop.

mod delay;
mod value;
mod error_value;
mod runtime;
mod ops;
mod formula;
mod interpreter;
mod error;

pub use delay::{Delayed, Pending, Read, Tracer};
pub use value::{CalcFun, CalcObj, CalcValue, ObjRef, Primitive, Property};
pub use error_value::{make_error, ErrorKind, ErrorObj};
pub use runtime::Runtime;
pub use ops::{
    binary_ops, lift_bin_op, lift_unary_op, non_zero_divisor, unary_ops, BinOp, BinaryOpKind,
    UnaryOp, UnaryOpKind, UnknownOperator,
};
pub use formula::{evaluate, Formula};
pub use interpreter::{ControlState, EvalOptions, Interpreter};
pub use error::Error;

/// Result type for interpreter operations.
pub type Result<T> = std::result::Result<T, Error>;
