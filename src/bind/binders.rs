//! The parameter binders: one small strategy per hint kind
//!
//! A binder looks at a hint and either produces the code filling one target parameter, refuses
//! with a reason, or declares the hint is not its kind and lets the next binder in the registry
//! try. Registration order is the only precedence there is.

use super::binding::BindingBuilder;
use super::signature::{BindingHint, CallSignature};
use crate::assign::Assigner;
use crate::fragment::{CodeFragment, ConstantData, Instruction, Outcome, UnboundReason};
use crate::jvm::{
    synthetic_member_name, ArrayType, BaseType, ClassGraph, ClassId, FieldType, JavaLibrary,
    MethodAccessFlags, MethodData, MethodId, RefType, RenderDescriptor,
};

/// Everything a binder may need to fill one parameter
pub struct BindRequest<'a, 'g> {
    /// The intercepted call being delegated
    pub call: CallSignature<'g>,

    /// The candidate method under consideration
    pub target: MethodId<'g>,

    /// Index of the target parameter being filled
    pub parameter: usize,

    /// Declared type of that parameter
    pub parameter_type: FieldType<ClassId<'g>>,

    pub assigner: &'a Assigner<'g>,
    pub class_graph: &'a ClassGraph<'g>,
    pub java: &'a JavaLibrary<'g>,
}

/// What a binder produced for one parameter
pub struct BindOutcome<'g> {
    pub outcome: Outcome<'g>,

    /// Call-argument index consumed, meaningful only when the outcome is bound
    pub claims: Option<usize>,
}

impl<'g> BindOutcome<'g> {
    fn bound(fragment_outcome: Outcome<'g>, claims: Option<usize>) -> BindOutcome<'g> {
        BindOutcome {
            outcome: fragment_outcome,
            claims,
        }
    }

    fn unbound(reason: UnboundReason) -> BindOutcome<'g> {
        BindOutcome {
            outcome: Outcome::Unbound(reason),
            claims: None,
        }
    }
}

/// One strategy for filling a target parameter from a hint
pub trait ParameterBinder<'g> {
    /// `None` means "not my hint kind"; a `Some` with an unbound outcome is a refusal that
    /// abandons the candidate
    fn bind(&self, hint: &BindingHint<'g>, request: &BindRequest<'_, 'g>)
        -> Option<BindOutcome<'g>>;
}

/// Run a hint through an ordered registry, first taker wins
pub fn bind_with<'g>(
    binders: &[Box<dyn ParameterBinder<'g>>],
    hint: &BindingHint<'g>,
    request: &BindRequest<'_, 'g>,
) -> BindOutcome<'g> {
    for binder in binders {
        if let Some(outcome) = binder.bind(hint, request) {
            return outcome;
        }
    }
    BindOutcome::unbound(UnboundReason::NoBinderForHint)
}

/// The full set of provided binders, in their conventional order
pub fn standard_binders<'g>() -> Vec<Box<dyn ParameterBinder<'g>>> {
    vec![
        Box::new(ArgumentBinder),
        Box::new(ThisBinder),
        Box::new(ConstantBinder),
        Box::new(AllArgumentsBinder),
        Box::new(OriginBinder),
        Box::new(SuperHandleBinder),
    ]
}

/// Binds a fixed call argument ([`BindingHint::Argument`])
pub struct ArgumentBinder;

impl<'g> ParameterBinder<'g> for ArgumentBinder {
    fn bind(
        &self,
        hint: &BindingHint<'g>,
        request: &BindRequest<'_, 'g>,
    ) -> Option<BindOutcome<'g>> {
        let index = match hint {
            BindingHint::Argument(index) => *index,
            _ => return None,
        };
        let source = match request.call.argument_type(index) {
            Some(typ) => typ,
            None => return Some(BindOutcome::unbound(UnboundReason::NoSuchArgument(index))),
        };
        let load = CodeFragment::of(vec![load_local(
            &source,
            request.call.argument_offset(index),
        )]);
        let outcome = Outcome::Bound(load).then(
            request
                .assigner
                .assign(Some(source), Some(request.parameter_type)),
        );
        Some(BindOutcome::bound(outcome, Some(index)))
    }
}

/// Binds the intercepted call's receiver ([`BindingHint::This`])
pub struct ThisBinder;

impl<'g> ParameterBinder<'g> for ThisBinder {
    fn bind(
        &self,
        hint: &BindingHint<'g>,
        request: &BindRequest<'_, 'g>,
    ) -> Option<BindOutcome<'g>> {
        if !matches!(hint, BindingHint::This) {
            return None;
        }
        if request.call.is_static() {
            return Some(BindOutcome::unbound(UnboundReason::NoReceiver));
        }
        let owner = FieldType::object(request.call.owner());
        let load = CodeFragment::of(vec![Instruction::ALoad(0)]);
        let outcome = Outcome::Bound(load).then(
            request
                .assigner
                .assign(Some(owner), Some(request.parameter_type)),
        );
        Some(BindOutcome::bound(outcome, None))
    }
}

/// Binds a fixed constant ([`BindingHint::Constant`])
pub struct ConstantBinder;

impl<'g> ParameterBinder<'g> for ConstantBinder {
    fn bind(
        &self,
        hint: &BindingHint<'g>,
        request: &BindRequest<'_, 'g>,
    ) -> Option<BindOutcome<'g>> {
        let constant = match hint {
            BindingHint::Constant(constant) => constant.clone(),
            _ => return None,
        };
        let natural = constant_type(&constant, request.java);
        let load = match &constant {
            ConstantData::Long(_) | ConstantData::Double(_) => Instruction::Ldc2(constant.clone()),
            _ => Instruction::Ldc(constant.clone()),
        };
        let outcome = Outcome::Bound(CodeFragment::of(vec![load])).then(
            request
                .assigner
                .assign(Some(natural), Some(request.parameter_type)),
        );
        Some(BindOutcome::bound(outcome, None))
    }
}

/// Collects every call argument into an object array ([`BindingHint::AllArguments`])
pub struct AllArgumentsBinder;

impl<'g> ParameterBinder<'g> for AllArgumentsBinder {
    fn bind(
        &self,
        hint: &BindingHint<'g>,
        request: &BindRequest<'_, 'g>,
    ) -> Option<BindOutcome<'g>> {
        if !matches!(hint, BindingHint::AllArguments) {
            return None;
        }
        let array_type = match request.parameter_type {
            FieldType::Ref(ref_type) => ref_type,
            FieldType::Base(_) => {
                return Some(BindOutcome::unbound(UnboundReason::NotAnObjectArray {
                    target: request.parameter_type.render(),
                }))
            }
        };
        let (component, component_class) = match array_component(&array_type) {
            Some(found) => found,
            None => {
                return Some(BindOutcome::unbound(UnboundReason::NotAnObjectArray {
                    target: request.parameter_type.render(),
                }))
            }
        };

        let mut outcome = Outcome::Bound(CodeFragment::of(vec![
            int_const(request.call.argument_count() as i32),
            Instruction::ANewArray(component_class),
        ]));
        for index in 0..request.call.argument_count() {
            let source = request.call.argument_type(index).unwrap();
            let prelude = CodeFragment::of(vec![
                Instruction::Dup,
                int_const(index as i32),
                load_local(&source, request.call.argument_offset(index)),
            ]);
            outcome = outcome
                .then(Outcome::Bound(prelude))
                .then(request.assigner.assign(Some(source), Some(component)))
                .then(Outcome::Bound(CodeFragment::of(vec![Instruction::AAStore])));
        }
        Some(BindOutcome::bound(outcome, None))
    }
}

/// Binds a reflective description of the intercepted call ([`BindingHint::Origin`])
///
/// The representation is chosen by the parameter's type: `String` gets the rendered signature,
/// `Class` gets the owner, and `MethodHandle` gets a handle to the call itself.
pub struct OriginBinder;

impl<'g> ParameterBinder<'g> for OriginBinder {
    fn bind(
        &self,
        hint: &BindingHint<'g>,
        request: &BindRequest<'_, 'g>,
    ) -> Option<BindOutcome<'g>> {
        if !matches!(hint, BindingHint::Origin) {
            return None;
        }
        let classes = &request.java.classes;
        let constant = match request.parameter_type {
            FieldType::Ref(RefType::Object(class)) if class == classes.string => {
                ConstantData::String(request.call.render())
            }
            FieldType::Ref(RefType::Object(class)) if class == classes.class => {
                ConstantData::Class(request.call.owner())
            }
            FieldType::Ref(RefType::Object(class)) if class == classes.method_handle => {
                ConstantData::MethodHandle(request.call.method())
            }
            _ => {
                return Some(BindOutcome::unbound(UnboundReason::NoOriginRepresentation {
                    target: request.parameter_type.render(),
                }))
            }
        };
        let fragment = CodeFragment::of(vec![Instruction::Ldc(constant)]);
        Some(BindOutcome::bound(Outcome::Bound(fragment), None))
    }
}

/// Binds a handle to the intercepted call's super implementation ([`BindingHint::SuperHandle`])
///
/// `invokespecial` to a super member is only legal from inside the declaring class, so the binder
/// registers a synthetic accessor method on the call's owner and hands out a handle to that
/// accessor, pre-bound to the receiver. The accessor's name is derived from the call's name and
/// descriptor, so repeated resolutions of the same call shape reuse one accessor.
pub struct SuperHandleBinder;

impl<'g> ParameterBinder<'g> for SuperHandleBinder {
    fn bind(
        &self,
        hint: &BindingHint<'g>,
        request: &BindRequest<'_, 'g>,
    ) -> Option<BindOutcome<'g>> {
        if !matches!(hint, BindingHint::SuperHandle) {
            return None;
        }
        if request.call.is_static() {
            return Some(BindOutcome::unbound(UnboundReason::NoReceiver));
        }
        if request.call.is_constructor()
            || request
                .class_graph
                .resolve_super_method(
                    request.call.owner(),
                    request.call.name(),
                    request.call.descriptor(),
                )
                .is_none()
        {
            return Some(BindOutcome::unbound(UnboundReason::NoSuperImplementation {
                call: request.call.render(),
            }));
        }

        let accessor = request.class_graph.add_method(MethodData {
            class: request.call.owner(),
            name: synthetic_member_name(
                request.call.name(),
                "super",
                &request.call.descriptor().render(),
            ),
            descriptor: request.call.descriptor().clone(),
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::SYNTHETIC,
        });

        let bind_to = request.java.members.bind_to;
        let handle = CodeFragment::of(vec![
            Instruction::Ldc(ConstantData::MethodHandle(accessor)),
            Instruction::ALoad(0),
            Instruction::Invoke(bind_to.infer_invoke_type(), bind_to),
        ]);
        let method_handle = FieldType::object(request.java.classes.method_handle);
        let outcome = Outcome::Bound(handle).then(
            request
                .assigner
                .assign(Some(method_handle), Some(request.parameter_type)),
        );
        Some(BindOutcome::bound(outcome, None))
    }
}

/// Supplies a fallback hint for parameters that have none
pub trait DefaultsProvider<'g> {
    /// A hint to try, or `None` to refuse the parameter (and with it the candidate)
    fn provide(
        &self,
        request: &BindRequest<'_, 'g>,
        builder: &BindingBuilder<'g>,
    ) -> Option<BindingHint<'g>>;
}

/// Hands out call arguments positionally: the lowest index not yet claimed
pub struct NextUnclaimedArgument;

impl<'g> DefaultsProvider<'g> for NextUnclaimedArgument {
    fn provide(
        &self,
        request: &BindRequest<'_, 'g>,
        builder: &BindingBuilder<'g>,
    ) -> Option<BindingHint<'g>> {
        (0..request.call.argument_count())
            .find(|index| !builder.is_claimed(*index))
            .map(BindingHint::Argument)
    }
}

/// Load of a local variable slot, picked by the type's computational kind
fn load_local<'g>(typ: &FieldType<ClassId<'g>>, slot: u16) -> Instruction<'g> {
    match typ {
        FieldType::Base(BaseType::Long) => Instruction::LLoad(slot),
        FieldType::Base(BaseType::Float) => Instruction::FLoad(slot),
        FieldType::Base(BaseType::Double) => Instruction::DLoad(slot),
        FieldType::Base(_) => Instruction::ILoad(slot),
        FieldType::Ref(_) => Instruction::ALoad(slot),
    }
}

/// Smallest instruction pushing an `int` constant
fn int_const<'g>(value: i32) -> Instruction<'g> {
    match value {
        -1 => Instruction::IConstM1,
        0 => Instruction::IConst0,
        1 => Instruction::IConst1,
        2 => Instruction::IConst2,
        3 => Instruction::IConst3,
        4 => Instruction::IConst4,
        5 => Instruction::IConst5,
        value if i8::try_from(value).is_ok() => Instruction::BiPush(value as i8),
        value if i16::try_from(value).is_ok() => Instruction::SiPush(value as i16),
        value => Instruction::Ldc(ConstantData::Integer(value)),
    }
}

/// The natural type a loaded constant has on the stack
fn constant_type<'g>(
    constant: &ConstantData<'g>,
    java: &JavaLibrary<'g>,
) -> FieldType<ClassId<'g>> {
    match constant {
        ConstantData::String(_) => FieldType::object(java.classes.string),
        ConstantData::Class(_) => FieldType::object(java.classes.class),
        ConstantData::Integer(_) => FieldType::int(),
        ConstantData::Long(_) => FieldType::long(),
        ConstantData::Float(_) => FieldType::float(),
        ConstantData::Double(_) => FieldType::double(),
        ConstantData::MethodHandle(_) => FieldType::object(java.classes.method_handle),
    }
}

/// Component type of a reference array whose elements are themselves references
///
/// Returns the component as a field type plus the class to name in `anewarray`. Primitive arrays
/// of one dimension have value components, which `aastore` cannot fill, so they are rejected.
fn array_component<'g>(
    array: &RefType<ClassId<'g>>,
) -> Option<(FieldType<ClassId<'g>>, ClassId<'g>)> {
    match array {
        RefType::Object(_) => None,
        RefType::ObjectArray(arr) if arr.additional_dimensions == 0 => {
            Some((FieldType::object(arr.element_type), arr.element_type))
        }
        RefType::ObjectArray(arr) => {
            let component = RefType::ObjectArray(ArrayType {
                additional_dimensions: arr.additional_dimensions - 1,
                element_type: arr.element_type,
            });
            Some((FieldType::Ref(component), arr.element_type))
        }
        RefType::PrimitiveArray(_) => None,
    }
}
