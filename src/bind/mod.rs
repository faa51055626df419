//! Choosing a delegation target and producing the code that reaches it
//!
//! Resolution runs in layers:
//!
//!   1. [`CallSignature`] and [`Candidate`] describe the intercepted call and the pool of methods
//!      it might delegate to.
//!   2. The [`ParameterBinder`] registry and a [`DefaultsProvider`] fill each candidate parameter
//!      from a [`BindingHint`], producing [`ParameterBinding`]s.
//!   3. A [`TerminationHandler`] bridges the target's return back to the call.
//!   4. The [`AmbiguityResolver`] chain orders rival successes.
//!   5. [`BindingResolver`] drives all of the above and hands back a [`ResolvedBinding`].

mod ambiguity;
mod binders;
mod binding;
mod resolver;
mod signature;
mod termination;

pub use ambiguity::{
    AmbiguityResolver, ArgumentTypeResolver, BoundCountResolver, NameEqualityResolver,
    PriorityResolver, Resolution, ResolverChain,
};
pub use binders::{
    bind_with, standard_binders, AllArgumentsBinder, ArgumentBinder, BindOutcome, BindRequest,
    ConstantBinder, DefaultsProvider, NextUnclaimedArgument, OriginBinder, ParameterBinder,
    SuperHandleBinder, ThisBinder,
};
pub use binding::{BindingBuilder, ParameterBinding, ResolvedBinding};
pub use resolver::{default_visibility, BindingResolver, BindingSettings};
pub use signature::{BindingHint, CallSignature, Candidate};
pub use termination::TerminationHandler;
