//! Error values produced by formulas.
//!
//! A formula error is an ordinary object, not a Rust error. Reading
//! `AsString` off it yields its message; reading anything else, including
//! `AsPrimitive`, yields the very same object. That fixed point is what carries
//! an error through any chain of reads and operators unchanged.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::delay::Read;
use crate::value::{CalcObj, CalcValue, Primitive, Property};

/// An error object.
pub struct ErrorObj {
    message: String,
    this: Weak<ErrorObj>,
}

impl ErrorObj {
    pub fn message(&self) -> &str {
        &self.message
    }

    fn to_value<O>(&self) -> Option<CalcValue<O>> {
        let this: Rc<ErrorObj> = self.this.upgrade()?;
        Some(CalcValue::Object(this))
    }
}

impl<O> CalcObj<O> for ErrorObj {
    fn read(&self, property: Property<'_>, _origin: &O) -> Read<CalcValue<O>> {
        match property {
            Property::AsString => Read::Value(Primitive::String(self.message.clone()).into()),
            _ => match self.to_value() {
                Some(this) => Read::Value(this),
                // Only reachable while the last handle is being dropped.
                None => Read::Value(Primitive::String(self.message.clone()).into()),
            },
        }
    }
}

impl fmt::Debug for ErrorObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorObj").field("message", &self.message).finish()
    }
}

/// Create a new error object carrying `message`.
pub fn make_error(message: impl Into<String>) -> Rc<ErrorObj> {
    let message = message.into();
    Rc::new_cyclic(|this| ErrorObj {
        message,
        this: this.clone(),
    })
}

/// The builtin error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Applying a value that is not a function.
    AppOnNonFunction,
    /// Dividing by zero.
    Div0,
    /// Calling a function with the wrong number of arguments. Never produced
    /// by this crate; available to function layers that check arity.
    FunctionArity,
    /// Using a function where an operator needs a primitive.
    FunctionAsOpArgument,
    /// Using a non-string as a field name.
    NonStringField,
    /// Reading a property off something that is not an object.
    ReadOnNonObject,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::AppOnNonFunction,
        ErrorKind::Div0,
        ErrorKind::FunctionArity,
        ErrorKind::FunctionAsOpArgument,
        ErrorKind::NonStringField,
        ErrorKind::ReadOnNonObject,
    ];

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::AppOnNonFunction => "Cannot apply a value that is not a function",
            ErrorKind::Div0 => "Division by zero",
            ErrorKind::FunctionArity => "Wrong number of arguments for function",
            ErrorKind::FunctionAsOpArgument => "A function cannot be used as an operand",
            ErrorKind::NonStringField => "Field name must be a string",
            ErrorKind::ReadOnNonObject => "Cannot read a property of a value that is not an object",
        }
    }

    /// The singleton error object for this kind.
    ///
    /// Every call on the same thread returns the same object.
    pub fn object(self) -> Rc<ErrorObj> {
        BUILTIN_ERRORS.with(|errors| Rc::clone(&errors[self as usize]))
    }

    /// The singleton error object as a value.
    pub fn value<O>(self) -> CalcValue<O> {
        CalcValue::Object(self.object())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

thread_local! {
    static BUILTIN_ERRORS: [Rc<ErrorObj>; 6] =
        ErrorKind::ALL.map(|kind| make_error(kind.message()));
}
