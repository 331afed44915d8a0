#![deny(missing_docs)]
//! Core effect execution traits and errors.
//!
//! An [`Operator`][layer0::Operator] declares [`Effect`][layer0::Effect]s but
//! never executes them — this crate defines the seam that turns a declared
//! effect into something that actually happened: a memory write, an enqueued
//! delegate dispatch, a signal. `neuron-effects-local` is the in-process
//! implementation; other layers (a durable workflow engine, a test harness)
//! implement the same [`EffectExecutor`] trait differently.

mod error;
mod executor;
mod trace;

pub use error::EffectError;
pub use executor::EffectExecutor;
pub use trace::{ExecutionEvent, ExecutionTrace};
