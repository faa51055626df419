//! End-to-end resolution of one intercepted call against a candidate pool

use super::ambiguity::{AmbiguityResolver, Resolution, ResolverChain};
use super::binders::{
    bind_with, standard_binders, BindRequest, DefaultsProvider, NextUnclaimedArgument,
    ParameterBinder,
};
use super::binding::{BindingBuilder, ParameterBinding, ResolvedBinding};
use super::signature::{CallSignature, Candidate};
use super::termination::TerminationHandler;
use crate::assign::Assigner;
use crate::errors::Error;
use crate::fragment::{CodeFragment, Instruction, Outcome};
use crate::jvm::{ClassGraph, FieldType, JavaLibrary, MethodAccessFlags, MethodId, RefType};
use log::{debug, trace};

/// The complete configuration surface of a [`BindingResolver`]
///
/// Everything is supplied up front; resolution itself takes no options.
pub struct BindingSettings<'g> {
    /// Ordered binder registry, first taker per hint wins
    pub binders: Vec<Box<dyn ParameterBinder<'g>>>,

    /// Fallback for parameters without an explicit hint
    pub defaults: Box<dyn DefaultsProvider<'g>>,

    /// Tie-breaking chain for rival successful bindings
    pub resolvers: ResolverChain<'g>,

    /// What happens after the delegation target returns
    pub termination: TerminationHandler,

    /// Permit `checkcast` downcasts, value narrowing, and conjured defaults in conversions
    pub allow_dynamic_cast: bool,

    /// Which candidates the intercepted call may legally reach
    pub visibility: Box<dyn Fn(&CallSignature<'g>, MethodId<'g>) -> bool>,

    /// Optional construction-time pool filter
    pub prefilter: Option<Box<dyn Fn(&Candidate<'g>) -> bool>>,
}

impl<'g> BindingSettings<'g> {
    /// The conventional setup: every provided binder, positional defaults, the standard resolver
    /// chain, returning termination, static typing, and JVM access rules for visibility
    pub fn standard() -> BindingSettings<'g> {
        BindingSettings {
            binders: standard_binders(),
            defaults: Box::new(NextUnclaimedArgument),
            resolvers: ResolverChain::standard(),
            termination: TerminationHandler::Returning,
            allow_dynamic_cast: false,
            visibility: Box::new(default_visibility),
            prefilter: None,
        }
    }
}

/// Visibility along the JVM access rules, judged from the intercepted call's owner
pub fn default_visibility<'g>(call: &CallSignature<'g>, target: MethodId<'g>) -> bool {
    let flags = target.access_flags;
    if flags.contains(MethodAccessFlags::PUBLIC) {
        return true;
    }
    if flags.contains(MethodAccessFlags::PRIVATE) {
        return target.class == call.owner();
    }
    let same_package = target.class.name.package() == call.owner().name.package();
    if flags.contains(MethodAccessFlags::PROTECTED) {
        same_package
            || ClassGraph::is_java_assignable(
                &RefType::Object(call.owner()),
                &RefType::Object(target.class),
            )
    } else {
        same_package
    }
}

/// Resolves intercepted calls against a fixed candidate pool
///
/// Construction validates the pool once; [`BindingResolver::resolve`] can then be called for any
/// number of calls. Resolution is deterministic: the pool order is the only order there is.
pub struct BindingResolver<'g> {
    class_graph: &'g ClassGraph<'g>,
    java: &'g JavaLibrary<'g>,
    assigner: Assigner<'g>,
    pool: Vec<Candidate<'g>>,
    settings: BindingSettings<'g>,
}

impl<'g> BindingResolver<'g> {
    pub fn new(
        class_graph: &'g ClassGraph<'g>,
        java: &'g JavaLibrary<'g>,
        pool: Vec<Candidate<'g>>,
        settings: BindingSettings<'g>,
    ) -> Result<BindingResolver<'g>, Error> {
        let pool: Vec<Candidate<'g>> = match &settings.prefilter {
            Some(prefilter) => pool.into_iter().filter(|c| prefilter(c)).collect(),
            None => pool,
        };
        if pool.is_empty() {
            return Err(Error::NoCandidates);
        }
        let assigner = Assigner::new(java, settings.allow_dynamic_cast);
        Ok(BindingResolver {
            class_graph,
            java,
            assigner,
            pool,
            settings,
        })
    }

    /// Pick the one winning candidate for a call and produce its delegation code
    pub fn resolve(&self, call: CallSignature<'g>) -> Result<ResolvedBinding<'g>, Error> {
        debug!("Resolving {} against {} candidates", call.render(), self.pool.len());

        let visible: Vec<&Candidate<'g>> = self
            .pool
            .iter()
            .filter(|candidate| (self.settings.visibility)(&call, candidate.method))
            .collect();
        if visible.is_empty() {
            return Err(Error::NoVisibleCandidate {
                call: call.render(),
            });
        }

        let successes: Vec<ResolvedBinding<'g>> = visible
            .iter()
            .filter_map(|candidate| self.try_bind(call, candidate))
            .collect();
        match successes.len() {
            0 => {
                return Err(Error::NoBindableCandidate {
                    call: call.render(),
                    considered: visible.iter().map(|c| c.render()).collect(),
                })
            }
            1 => {
                let binding = successes.into_iter().next().unwrap();
                debug!("Resolved {} to {}", call.render(), binding.render());
                return Ok(binding);
            }
            _ => {}
        }

        // Fold the successes down to an incumbent, then demand the incumbent beats every rival
        // outright: a fold alone could crown a winner that merely never lost to its neighbor
        let mut incumbent = 0;
        for challenger in 1..successes.len() {
            if self.settings.resolvers.resolve(
                &call,
                &successes[incumbent],
                &successes[challenger],
            ) == Resolution::Right
            {
                incumbent = challenger;
            }
        }
        for rival in 0..successes.len() {
            if rival == incumbent {
                continue;
            }
            let resolution =
                self.settings
                    .resolvers
                    .resolve(&call, &successes[incumbent], &successes[rival]);
            if resolution != Resolution::Left {
                return Err(Error::AmbiguousBinding {
                    call: call.render(),
                    left: successes[incumbent].render(),
                    right: successes[rival].render(),
                });
            }
        }

        let binding = successes.into_iter().nth(incumbent).unwrap();
        debug!("Resolved {} to {}", call.render(), binding.render());
        Ok(binding)
    }

    /// One candidate attempt; `None` abandons the candidate without affecting the others
    fn try_bind(
        &self,
        call: CallSignature<'g>,
        candidate: &Candidate<'g>,
    ) -> Option<ResolvedBinding<'g>> {
        let target = candidate.method;
        let mut builder = BindingBuilder::new(target).with_priority(candidate.priority);

        let receiver = match self.receiver_fragment(call, target) {
            Outcome::Bound(fragment) => fragment,
            Outcome::Unbound(reason) => {
                trace!("Skipping {}: {:?}", candidate.render(), reason);
                return None;
            }
        };

        for (parameter, parameter_type) in target.descriptor.parameters.iter().enumerate() {
            let request = BindRequest {
                call,
                target,
                parameter,
                parameter_type: *parameter_type,
                assigner: &self.assigner,
                class_graph: self.class_graph,
                java: self.java,
            };
            let hint = match &candidate.hints[parameter] {
                Some(hint) => hint.clone(),
                None => match self.settings.defaults.provide(&request, &builder) {
                    Some(hint) => hint,
                    None => {
                        trace!(
                            "Skipping {}: no default for parameter {}",
                            candidate.render(),
                            parameter,
                        );
                        return None;
                    }
                },
            };
            let bound = bind_with(&self.settings.binders, &hint, &request);
            match bound.outcome {
                Outcome::Bound(fragment) => {
                    trace!(
                        "Bound parameter {} of {} from {:?}",
                        parameter,
                        candidate.render(),
                        hint,
                    );
                    builder.bind(ParameterBinding {
                        target_parameter: parameter,
                        fragment,
                        claims: bound.claims,
                    })
                }
                Outcome::Unbound(reason) => {
                    trace!("Skipping {}: {:?}", candidate.render(), reason);
                    return None;
                }
            }
        }

        let termination = match self.settings.termination.terminate(&self.assigner, &call, target)
        {
            Outcome::Bound(fragment) => fragment,
            Outcome::Unbound(reason) => {
                trace!("Skipping {}: {:?}", candidate.render(), reason);
                return None;
            }
        };

        let invocation =
            CodeFragment::of(vec![Instruction::Invoke(target.infer_invoke_type(), target)]);
        Some(builder.build(receiver, invocation, termination))
    }

    /// Code putting the target's receiver (if it needs one) on the stack
    fn receiver_fragment(&self, call: CallSignature<'g>, target: MethodId<'g>) -> Outcome<'g> {
        if target.is_static() {
            return Outcome::empty();
        }
        if call.is_static() {
            return Outcome::Unbound(crate::fragment::UnboundReason::NoReceiver);
        }
        let owner = FieldType::object(call.owner());
        let target_owner = FieldType::object(target.class);
        Outcome::Bound(CodeFragment::of(vec![Instruction::ALoad(0)]))
            .then(self.assigner.assign(Some(owner), Some(target_owner)))
    }
}
