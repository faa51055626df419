//! Composable straight-line code and its stack bookkeeping
//!
//! [`CodeFragment`] is the unit everything else in the crate produces: a sequence of
//! [`Instruction`]s with an incrementally maintained [`StackEffect`]. [`Outcome`] wraps a fragment
//! with the possibility that a binding step refused, and keeps refusals composable so candidate
//! attempts can be assembled speculatively and checked once at the end.

mod code;
mod effect;

pub use code::{CodeFragment, CodeSink, ConstantData, Instruction, Outcome, UnboundReason};
pub use effect::StackEffect;
