//! Values computed by formulas.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::delay::{Delayed, Read};
use crate::runtime::Runtime;

/// A scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// A numeric value (always f64).
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Primitive {
    /// Coerce this value to a string.
    pub fn to_string_value(&self) -> String {
        match self {
            Primitive::String(s) => s.clone(),
            Primitive::Number(n) => {
                if n.is_nan() {
                    "NaN".to_string()
                } else if n.is_infinite() {
                    let s = if *n > 0.0 { "Infinity" } else { "-Infinity" };
                    s.to_string()
                } else if *n == n.trunc() && n.abs() < 1e15 {
                    // Integer-like numbers without decimal point
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Primitive::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        }
    }

    /// Coerce this value to a number.
    ///
    /// Strings are trimmed first; an empty string is 0 and anything
    /// unparsable is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Primitive::Number(n) => *n,
            Primitive::Boolean(b) => f64::from(u8::from(*b)),
            Primitive::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Coerce this value to a boolean.
    pub fn to_bool(&self) -> bool {
        match self {
            Primitive::String(s) => !s.is_empty(),
            Primitive::Number(n) => *n != 0.0 && !n.is_nan(),
            Primitive::Boolean(b) => *b,
        }
    }

    /// Order two primitives.
    ///
    /// Two strings compare lexicographically; every other pairing compares
    /// numerically. `None` when the pair is unordered (NaN).
    pub fn compare(&self, other: &Primitive) -> Option<Ordering> {
        match (self, other) {
            (Primitive::String(a), Primitive::String(b)) => Some(a.cmp(b)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }

    /// Convert a scalar JSON value. Arrays, objects and null have no
    /// primitive form.
    pub fn from_json(json: &serde_json::Value) -> Option<Primitive> {
        match json {
            serde_json::Value::Bool(b) => Some(Primitive::Boolean(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Primitive::Number),
            serde_json::Value::String(s) => Some(Primitive::String(s.clone())),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    /// Convert to JSON. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Primitive::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Primitive::String(s) => serde_json::Value::String(s.clone()),
            Primitive::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

impl From<f64> for Primitive {
    fn from(n: f64) -> Self {
        Primitive::Number(n)
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Primitive::Boolean(b)
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::String(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Primitive::String(s)
    }
}

/// The name of a property read off an object.
///
/// Besides ordinary named fields, two reserved capabilities exist that no
/// field name can collide with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property<'a> {
    /// Coerce the object for arithmetic or boolean use.
    AsPrimitive,
    /// Coerce the object to a human-readable message.
    AsString,
    Named(&'a str),
}

impl fmt::Display for Property<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::AsPrimitive => f.write_str("AsPrimitive"),
            Property::AsString => f.write_str("AsString"),
            Property::Named(name) => f.write_str(name),
        }
    }
}

/// A readable entity: a data cell, a record, an error.
///
/// `O` is the caller's origin type, threaded through every read untouched.
pub trait CalcObj<O> {
    /// Read a property. Returning [`Read::Pending`] means the answer is not
    /// available yet.
    fn read(&self, property: Property<'_>, origin: &O) -> Read<CalcValue<O>>;
}

/// Shared handle to a host object.
pub type ObjRef<O> = Rc<dyn CalcObj<O>>;

type CalcFunInner<O> = dyn Fn(&Runtime<O>, &O, Vec<CalcValue<O>>) -> Delayed<CalcValue<O>>;

/// A formula function value.
pub struct CalcFun<O> {
    func: Rc<CalcFunInner<O>>,
}

impl<O> CalcFun<O> {
    pub fn new(
        f: impl Fn(&Runtime<O>, &O, Vec<CalcValue<O>>) -> Delayed<CalcValue<O>> + 'static,
    ) -> Self {
        Self { func: Rc::new(f) }
    }

    /// Invoke the function with resolved arguments.
    pub fn call(
        &self,
        rt: &Runtime<O>,
        origin: &O,
        args: Vec<CalcValue<O>>,
    ) -> Delayed<CalcValue<O>> {
        (self.func)(rt, origin, args)
    }

    /// Check if both handles refer to the same function.
    pub fn ptr_eq(&self, other: &CalcFun<O>) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl<O> Clone for CalcFun<O> {
    fn clone(&self) -> Self {
        Self {
            func: Rc::clone(&self.func),
        }
    }
}

impl<O> fmt::Debug for CalcFun<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalcFun({:p})", Rc::as_ptr(&self.func))
    }
}

/// A value computed by a formula.
///
/// Equality is structural for primitives and by identity for objects and
/// functions.
pub enum CalcValue<O> {
    Primitive(Primitive),
    Object(ObjRef<O>),
    Function(CalcFun<O>),
}

impl<O> CalcValue<O> {
    pub fn object(obj: impl CalcObj<O> + 'static) -> Self {
        CalcValue::Object(Rc::new(obj))
    }

    pub fn function(
        f: impl Fn(&Runtime<O>, &O, Vec<CalcValue<O>>) -> Delayed<CalcValue<O>> + 'static,
    ) -> Self {
        CalcValue::Function(CalcFun::new(f))
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            CalcValue::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjRef<O>> {
        match self {
            CalcValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&CalcFun<O>> {
        match self {
            CalcValue::Function(fun) => Some(fun),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, CalcValue::Object(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, CalcValue::Function(_))
    }
}

impl<O> Clone for CalcValue<O> {
    fn clone(&self) -> Self {
        match self {
            CalcValue::Primitive(p) => CalcValue::Primitive(p.clone()),
            CalcValue::Object(obj) => CalcValue::Object(Rc::clone(obj)),
            CalcValue::Function(fun) => CalcValue::Function(fun.clone()),
        }
    }
}

impl<O> PartialEq for CalcValue<O> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CalcValue::Primitive(a), CalcValue::Primitive(b)) => a == b,
            (CalcValue::Object(a), CalcValue::Object(b)) => Rc::ptr_eq(a, b),
            (CalcValue::Function(a), CalcValue::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<O> fmt::Debug for CalcValue<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcValue::Primitive(p) => f.debug_tuple("Primitive").field(p).finish(),
            CalcValue::Object(obj) => write!(f, "Object({:p})", Rc::as_ptr(obj)),
            CalcValue::Function(fun) => fun.fmt(f),
        }
    }
}

impl<O> From<Primitive> for CalcValue<O> {
    fn from(p: Primitive) -> Self {
        CalcValue::Primitive(p)
    }
}

impl<O> From<f64> for CalcValue<O> {
    fn from(n: f64) -> Self {
        CalcValue::Primitive(Primitive::Number(n))
    }
}

impl<O> From<bool> for CalcValue<O> {
    fn from(b: bool) -> Self {
        CalcValue::Primitive(Primitive::Boolean(b))
    }
}

impl<O> From<&str> for CalcValue<O> {
    fn from(s: &str) -> Self {
        CalcValue::Primitive(Primitive::from(s))
    }
}

impl<O> From<String> for CalcValue<O> {
    fn from(s: String) -> Self {
        CalcValue::Primitive(Primitive::String(s))
    }
}
