//! The resolve-and-retry driver.
//!
//! One evaluation pass may stop at the first suspension it meets, so a formula
//! that depends on several unavailable values can need several passes. The
//! [`Interpreter`] yields the pending requests of each pass to its host and
//! re-evaluates from scratch on `resume`, until the formula returns a value.

use std::fmt;
use std::marker::PhantomData;

use crate::delay::{Delayed, Pending};
use crate::error::Error;
use crate::formula::{evaluate, Formula};
use crate::value::{CalcValue, ObjRef};

/// Options controlling the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum number of evaluation passes before giving up.
    pub max_passes: usize,
}

impl EvalOptions {
    pub fn new() -> Self {
        Self { max_passes: 32 }
    }

    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// The control state of the interpreter.
pub enum ControlState<O> {
    /// Ready to evaluate.
    Eval,

    /// The last pass suspended on these requests.
    Yield {
        /// Requests in the order they were encountered.
        pending: Vec<Pending>,
    },

    /// The formula completed with a value. An error object is a value too.
    Return(CalcValue<O>),
}

impl<O> ControlState<O> {
    /// Check if the interpreter has completed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControlState::Return(_))
    }

    /// Check if the interpreter is waiting for pending requests.
    pub fn is_yield(&self) -> bool {
        matches!(self, ControlState::Yield { .. })
    }
}

impl<O> fmt::Debug for ControlState<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Eval => f.write_str("Eval"),
            ControlState::Yield { pending } => {
                f.debug_struct("Yield").field("pending", pending).finish()
            }
            ControlState::Return(value) => f.debug_tuple("Return").field(value).finish(),
        }
    }
}

/// Drives a formula through as many passes as its pending requests need.
pub struct Interpreter<O, F> {
    formula: F,
    options: EvalOptions,
    passes: usize,
    state: ControlState<O>,
    _origin: PhantomData<fn(&O)>,
}

impl<O, F: Formula<O>> Interpreter<O, F> {
    /// Create a new interpreter in the Eval state.
    pub fn new(formula: F) -> Self {
        Self::with_options(formula, EvalOptions::default())
    }

    pub fn with_options(formula: F, options: EvalOptions) -> Self {
        Self {
            formula,
            options,
            passes: 0,
            state: ControlState::Eval,
            _origin: PhantomData,
        }
    }

    /// Get the current control state.
    pub fn state(&self) -> &ControlState<O> {
        &self.state
    }

    /// Number of passes run since the last `eval`.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Start a new evaluation and run its first pass.
    pub fn eval(&mut self, origin: &O, context: &ObjRef<O>) -> crate::Result<&ControlState<O>> {
        self.passes = 0;
        self.state = ControlState::Eval;
        self.pass(origin, context)
    }

    /// Re-evaluate after the host has resolved the yielded requests.
    ///
    /// Only valid while the interpreter is in the `Yield` state.
    pub fn resume(&mut self, origin: &O, context: &ObjRef<O>) -> crate::Result<&ControlState<O>> {
        if !self.state.is_yield() {
            return Err(Error::InvalidResume);
        }
        if self.passes >= self.options.max_passes {
            tracing::warn!(passes = self.passes, "pass limit reached");
            return Err(Error::PassLimit { passes: self.passes });
        }
        self.pass(origin, context)
    }

    /// Evaluate to completion, handing each pass's pending requests to
    /// `resolve` before retrying.
    pub fn run<E, R>(
        &mut self,
        origin: &O,
        context: &ObjRef<O>,
        mut resolve: R,
    ) -> crate::Result<CalcValue<O>>
    where
        E: fmt::Display,
        R: FnMut(&[Pending]) -> Result<(), E>,
    {
        self.eval(origin, context)?;
        loop {
            match &self.state {
                ControlState::Return(value) => return Ok(value.clone()),
                ControlState::Yield { pending } => {
                    resolve(pending).map_err(|e| Error::Resolve(e.to_string()))?;
                }
                ControlState::Eval => unreachable!("a pass always leaves the Eval state"),
            }
            self.resume(origin, context)?;
        }
    }

    fn pass(&mut self, origin: &O, context: &ObjRef<O>) -> crate::Result<&ControlState<O>> {
        self.passes += 1;
        let (pending, value) = evaluate(&self.formula, origin, context);
        match value {
            Delayed::Resolved(value) => {
                tracing::debug!(pass = self.passes, "formula returned");
                self.state = ControlState::Return(value);
            }
            Delayed::Suspended if pending.is_empty() => {
                tracing::warn!(pass = self.passes, "formula suspended with nothing pending");
                self.state = ControlState::Eval;
                return Err(Error::Stalled { pass: self.passes });
            }
            Delayed::Suspended => {
                tracing::debug!(pass = self.passes, pending = pending.len(), "formula suspended");
                self.state = ControlState::Yield { pending };
            }
        }
        Ok(&self.state)
    }
}
