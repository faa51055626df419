use crate::fragment::{CodeFragment, CodeSink};
use crate::jvm::MethodId;
use std::collections::BTreeMap;

/// Code that fills one parameter of the delegation target
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding<'g> {
    /// Index of the target parameter this binding fills
    pub target_parameter: usize,

    /// Code leaving the parameter's value on the stack
    pub fragment: CodeFragment<'g>,

    /// Call-argument index this binding consumed, if it consumed one
    ///
    /// Bindings sourced from the receiver, a constant, or the call's reflective description claim
    /// nothing. Claims are what the argument-type resolver compares across candidates.
    pub claims: Option<usize>,
}

/// Accumulates parameter bindings for one candidate attempt
///
/// The builder is cheap and disposable: a refusal partway through an attempt abandons the whole
/// builder without affecting other candidates.
pub struct BindingBuilder<'g> {
    target: MethodId<'g>,
    priority: Option<u32>,
    bindings: Vec<ParameterBinding<'g>>,
    argument_claims: BTreeMap<usize, usize>,
}

impl<'g> BindingBuilder<'g> {
    pub fn new(target: MethodId<'g>) -> BindingBuilder<'g> {
        BindingBuilder {
            target,
            priority: None,
            bindings: vec![],
            argument_claims: BTreeMap::new(),
        }
    }

    /// Carry the candidate's explicit priority weight through to the resolved binding
    pub fn with_priority(mut self, priority: Option<u32>) -> BindingBuilder<'g> {
        self.priority = priority;
        self
    }

    pub fn target(&self) -> MethodId<'g> {
        self.target
    }

    /// Has a call argument already been consumed by an earlier parameter?
    pub fn is_claimed(&self, argument: usize) -> bool {
        self.argument_claims.contains_key(&argument)
    }

    /// Record a completed parameter binding (and its claim, if any)
    pub fn bind(&mut self, binding: ParameterBinding<'g>) {
        if let Some(argument) = binding.claims {
            self.argument_claims.insert(argument, binding.target_parameter);
        }
        self.bindings.push(binding);
    }

    /// Assemble the final code: receiver, parameters in declaration order, invocation, then
    /// termination
    pub fn build(
        self,
        receiver: CodeFragment<'g>,
        invocation: CodeFragment<'g>,
        termination: CodeFragment<'g>,
    ) -> ResolvedBinding<'g> {
        let mut fragment = receiver;
        for binding in &self.bindings {
            fragment = fragment.then(binding.fragment.clone());
        }
        let fragment = fragment.then(invocation).then(termination);
        ResolvedBinding {
            target: self.target,
            priority: self.priority,
            bindings: self.bindings,
            argument_claims: self.argument_claims,
            fragment,
        }
    }
}

/// A successful, fully validated binding of a call to one delegation target
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding<'g> {
    target: MethodId<'g>,
    priority: Option<u32>,
    bindings: Vec<ParameterBinding<'g>>,
    argument_claims: BTreeMap<usize, usize>,
    fragment: CodeFragment<'g>,
}

impl<'g> ResolvedBinding<'g> {
    pub fn target(&self) -> MethodId<'g> {
        self.target
    }

    /// The candidate's explicit priority weight, if it had one
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    /// Target parameter that consumed the given call argument, if any did
    pub fn target_parameter_for_argument(&self, argument: usize) -> Option<usize> {
        self.argument_claims.get(&argument).copied()
    }

    /// Number of call arguments this binding consumed
    pub fn claim_count(&self) -> usize {
        self.argument_claims.len()
    }

    pub fn bindings(&self) -> &[ParameterBinding<'g>] {
        &self.bindings
    }

    /// The complete delegation code
    pub fn fragment(&self) -> &CodeFragment<'g> {
        &self.fragment
    }

    /// Stream the complete delegation code into a sink
    pub fn emit<S: CodeSink<'g>>(&self, sink: &mut S) -> Result<(), S::Error> {
        self.fragment.emit(sink)
    }

    /// `Class.name:(args)ret` rendering of the target for errors and logs
    pub fn render(&self) -> String {
        format!("{:?}", self.target.0)
    }
}
