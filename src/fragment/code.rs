use super::StackEffect;
use crate::errors::Error;
use crate::jvm::{ClassId, InvokeType, MethodId, RefType};
use crate::util::Width;

/// Loadable constant
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantData<'g> {
    String(String),
    Class(ClassId<'g>),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    MethodHandle(MethodId<'g>),
}

impl<'g> Width for ConstantData<'g> {
    fn width(&self) -> usize {
        match self {
            ConstantData::Long(_) | ConstantData::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Straight-line JVM instruction
///
/// This is the subset of the instruction set that delegation code ever produces: loads of
/// arguments, constants, conversions, array plumbing, invocations, and returns. There is no
/// control flow. Every instruction knows its own [`StackEffect`].
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction<'g> {
    AConstNull,
    IConstM1,
    IConst0,
    IConst1,
    IConst2,
    IConst3,
    IConst4,
    IConst5,
    LConst0,
    FConst0,
    DConst0,
    BiPush(i8),
    SiPush(i16),
    Ldc(ConstantData<'g>), // covers both `ldc` and `ldc_w`
    Ldc2(ConstantData<'g>),
    ILoad(u16), // covers `iload`, `iload_{0,3}`, and `wide iload`
    LLoad(u16),
    FLoad(u16),
    DLoad(u16),
    ALoad(u16),
    AAStore,
    Pop,
    Pop2,
    Dup,
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    Invoke(InvokeType, MethodId<'g>),
    ANewArray(ClassId<'g>),
    CheckCast(RefType<ClassId<'g>>),
    Return,
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
}

impl<'g> Instruction<'g> {
    pub fn effect(&self) -> StackEffect {
        use Instruction::*;
        match self {
            AConstNull | IConstM1 | IConst0 | IConst1 | IConst2 | IConst3 | IConst4 | IConst5
            | FConst0 | BiPush(_) | SiPush(_) => StackEffect::new(1),
            LConst0 | DConst0 => StackEffect::new(2),
            Ldc(_) => StackEffect::new(1),
            Ldc2(_) => StackEffect::new(2),
            ILoad(_) | FLoad(_) | ALoad(_) => StackEffect::new(1),
            LLoad(_) | DLoad(_) => StackEffect::new(2),
            AAStore => StackEffect::new(-3),
            Pop => StackEffect::new(-1),
            Pop2 => StackEffect::new(-2),
            Dup => StackEffect::new(1),
            I2F | F2I | I2B | I2C | I2S | L2D | D2L => StackEffect::NONE,
            I2L | I2D | F2L | F2D => StackEffect::new(1),
            L2I | L2F | D2I | D2F => StackEffect::new(-1),
            Invoke(invoke_type, method) => {
                let has_receiver = !matches!(invoke_type, InvokeType::Static);
                let popped = method.descriptor.parameter_length(has_receiver) as i32;
                let pushed = match &method.descriptor.return_type {
                    None => 0,
                    Some(typ) => typ.width() as i32,
                };
                StackEffect::new(pushed - popped)
            }
            ANewArray(_) | CheckCast(_) => StackEffect::NONE,
            Return => StackEffect::NONE,
            IReturn | FReturn | AReturn => StackEffect::new(-1),
            LReturn | DReturn => StackEffect::new(-2),
        }
    }
}

/// Where emitted instructions go
///
/// The code-emission collaborator (classfile builder, interpreter, printer) implements this.
pub trait CodeSink<'g> {
    type Error;

    fn emit(&mut self, instruction: &Instruction<'g>) -> Result<(), Self::Error>;
}

impl<'g> CodeSink<'g> for Vec<Instruction<'g>> {
    type Error = std::convert::Infallible;

    fn emit(&mut self, instruction: &Instruction<'g>) -> Result<(), Self::Error> {
        self.push(instruction.clone());
        Ok(())
    }
}

/// Straight-line code along with its aggregate stack effect
///
/// A fragment is always legal to emit. The effect is maintained incrementally, so composing
/// fragments never rescans instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFragment<'g> {
    instructions: Vec<Instruction<'g>>,
    effect: StackEffect,
}

impl<'g> CodeFragment<'g> {
    /// Fragment with no instructions (the compound identity)
    pub fn empty() -> CodeFragment<'g> {
        CodeFragment {
            instructions: vec![],
            effect: StackEffect::NONE,
        }
    }

    pub fn of(instructions: impl IntoIterator<Item = Instruction<'g>>) -> CodeFragment<'g> {
        let mut fragment = CodeFragment::empty();
        for instruction in instructions {
            fragment.push(instruction);
        }
        fragment
    }

    /// Append a single instruction
    pub fn push(&mut self, instruction: Instruction<'g>) {
        self.effect = self.effect.then(instruction.effect());
        self.instructions.push(instruction);
    }

    /// Sequence another fragment after this one
    pub fn then(mut self, next: CodeFragment<'g>) -> CodeFragment<'g> {
        self.effect = self.effect.then(next.effect);
        self.instructions.extend(next.instructions);
        self
    }

    pub fn effect(&self) -> StackEffect {
        self.effect
    }

    pub fn instructions(&self) -> &[Instruction<'g>] {
        &self.instructions
    }

    /// Stream the instructions into a sink
    pub fn emit<S: CodeSink<'g>>(&self, sink: &mut S) -> Result<(), S::Error> {
        for instruction in &self.instructions {
            sink.emit(instruction)?;
        }
        Ok(())
    }
}

/// Why a binding step could not produce code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnboundReason {
    /// The source type cannot be converted into the target type
    Unassignable { source: String, target: String },

    /// The intercepted call has no argument at this index
    NoSuchArgument(usize),

    /// The intercepted call is static, so there is no receiver to bind
    NoReceiver,

    /// The delegated call has no non-abstract super implementation to dispatch to
    NoSuperImplementation { call: String },

    /// A collected-arguments parameter must be an object array
    NotAnObjectArray { target: String },

    /// A reflective-origin parameter must be typed at one of the origin representations
    NoOriginRepresentation { target: String },

    /// No registered binder accepts this hint kind
    NoBinderForHint,

    /// The defaults provider could not supply a hint for this parameter
    NoDefaultForParameter(usize),
}

/// Result of trying to produce code for one step of a binding
///
/// `Unbound` outcomes still compose: speculative construction can sequence steps first and check
/// legality at the end. Sequencing is `Bound` only when both sides are, and otherwise keeps the
/// first failure's reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'g> {
    Bound(CodeFragment<'g>),
    Unbound(UnboundReason),
}

impl<'g> Outcome<'g> {
    /// Bound outcome with no instructions
    pub fn empty() -> Outcome<'g> {
        Outcome::Bound(CodeFragment::empty())
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Outcome::Bound(_))
    }

    /// Sequence another outcome after this one
    pub fn then(self, next: Outcome<'g>) -> Outcome<'g> {
        match (self, next) {
            (Outcome::Bound(first), Outcome::Bound(second)) => Outcome::Bound(first.then(second)),
            (unbound @ Outcome::Unbound(_), _) => unbound,
            (_, unbound @ Outcome::Unbound(_)) => unbound,
        }
    }

    /// Extract the code, erroring if there is none
    pub fn fragment(self) -> Result<CodeFragment<'g>, Error> {
        match self {
            Outcome::Bound(fragment) => Ok(fragment),
            Outcome::Unbound(reason) => Err(Error::IllegalFragmentUse {
                reason: format!("{:?}", reason),
            }),
        }
    }
}
