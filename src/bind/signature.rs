use crate::fragment::ConstantData;
use crate::jvm::{ClassId, FieldType, MethodDescriptor, MethodId, UnqualifiedName};

/// Shape of the intercepted call being delegated away
///
/// A thin copyable wrapper over the call's entry in the class graph. Resolution never mutates the
/// call; everything here is a read-only view.
#[derive(Copy, Clone, Debug)]
pub struct CallSignature<'g> {
    method: MethodId<'g>,
}

impl<'g> CallSignature<'g> {
    pub fn new(method: MethodId<'g>) -> CallSignature<'g> {
        CallSignature { method }
    }

    pub fn method(&self) -> MethodId<'g> {
        self.method
    }

    pub fn owner(&self) -> ClassId<'g> {
        self.method.class
    }

    pub fn name(&self) -> &'g UnqualifiedName {
        &self.method.0.name
    }

    pub fn descriptor(&self) -> &'g MethodDescriptor<ClassId<'g>> {
        &self.method.0.descriptor
    }

    pub fn is_static(&self) -> bool {
        self.method.is_static()
    }

    pub fn is_constructor(&self) -> bool {
        self.method.is_constructor()
    }

    pub fn argument_count(&self) -> usize {
        self.descriptor().parameters.len()
    }

    pub fn argument_type(&self, index: usize) -> Option<FieldType<ClassId<'g>>> {
        self.descriptor().parameters.get(index).copied()
    }

    /// Local variable slot the argument occupies on entry to the intercepted call
    pub fn argument_offset(&self, index: usize) -> u16 {
        self.descriptor().parameter_offset(!self.is_static(), index) as u16
    }

    pub fn return_type(&self) -> Option<FieldType<ClassId<'g>>> {
        self.descriptor().return_type
    }

    /// `Class.name:(args)ret` rendering for errors and logs
    pub fn render(&self) -> String {
        format!("{:?}", self.method.0)
    }
}

/// Where one delegation-target parameter should get its value from
///
/// A hint names a source of a value, never the conversion to reach it; the binder that accepts
/// the hint works out the code (or refuses).
#[derive(Clone, Debug, PartialEq)]
pub enum BindingHint<'g> {
    /// The intercepted call's argument at this index
    Argument(usize),

    /// The intercepted call's receiver
    This,

    /// A fixed constant value
    Constant(ConstantData<'g>),

    /// All of the intercepted call's arguments, collected into an object array
    AllArguments,

    /// A reflective description of the intercepted call (`String`, `Class`, or `MethodHandle`)
    Origin,

    /// A handle through which the intercepted call's super implementation is reachable
    SuperHandle,
}

/// One delegation target up for consideration
///
/// Parameters without an explicit hint fall back to the defaults provider at binding time. The
/// priority weight only matters to the ambiguity resolvers.
#[derive(Clone, Debug)]
pub struct Candidate<'g> {
    pub method: MethodId<'g>,
    pub hints: Vec<Option<BindingHint<'g>>>,
    pub priority: Option<u32>,
}

impl<'g> Candidate<'g> {
    /// Candidate with no explicit hints and no priority
    pub fn new(method: MethodId<'g>) -> Candidate<'g> {
        let hints = vec![None; method.descriptor.parameters.len()];
        Candidate {
            method,
            hints,
            priority: None,
        }
    }

    pub fn with_hint(mut self, parameter: usize, hint: BindingHint<'g>) -> Candidate<'g> {
        assert!(
            parameter < self.hints.len(),
            "{} has no parameter {}",
            self.render(),
            parameter,
        );
        self.hints[parameter] = Some(hint);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Candidate<'g> {
        self.priority = Some(priority);
        self
    }

    /// `Class.name:(args)ret` rendering for errors and logs
    pub fn render(&self) -> String {
        format!("{:?}", self.method.0)
    }
}
