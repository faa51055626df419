use super::signature::CallSignature;
use crate::assign::Assigner;
use crate::fragment::{CodeFragment, Instruction, Outcome};
use crate::jvm::{BaseType, ClassId, FieldType, MethodId};
use crate::util::Width;

/// What happens after the delegation target returns
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TerminationHandler {
    /// Hand the target's return value back as the intercepted call's return value
    Returning,

    /// Discard the target's return value and fall through (for chained interception)
    Dropping,
}

impl TerminationHandler {
    /// Code bridging from the target's return to the end of the intercepted call
    ///
    /// `Returning` must convert the target's return type onto the call's, so it can refuse a
    /// pairing. `Dropping` accepts any pairing.
    pub fn terminate<'g>(
        &self,
        assigner: &Assigner<'g>,
        call: &CallSignature<'g>,
        target: MethodId<'g>,
    ) -> Outcome<'g> {
        let target_return = target.descriptor.return_type;
        match self {
            TerminationHandler::Returning => assigner
                .assign(target_return, call.return_type())
                .then(Outcome::Bound(CodeFragment::of(vec![return_op(
                    &call.return_type(),
                )]))),
            TerminationHandler::Dropping => {
                let code = match target_return {
                    None => vec![],
                    Some(typ) if typ.width() == 2 => vec![Instruction::Pop2],
                    Some(_) => vec![Instruction::Pop],
                };
                Outcome::Bound(CodeFragment::of(code))
            }
        }
    }
}

fn return_op<'g>(return_type: &Option<FieldType<ClassId<'g>>>) -> Instruction<'g> {
    match return_type {
        None => Instruction::Return,
        Some(FieldType::Base(BaseType::Long)) => Instruction::LReturn,
        Some(FieldType::Base(BaseType::Float)) => Instruction::FReturn,
        Some(FieldType::Base(BaseType::Double)) => Instruction::DReturn,
        Some(FieldType::Base(_)) => Instruction::IReturn,
        Some(FieldType::Ref(_)) => Instruction::AReturn,
    }
}
