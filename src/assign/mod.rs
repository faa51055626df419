//! Type conversion oracle
//!
//! The [`Assigner`] answers one question: can a value of a source type be turned into a value of
//! a target type, and if so, by what code? Every answer is an [`Outcome`](crate::fragment::Outcome),
//! so callers can fold conversions into larger speculative constructions. `void` is modeled as
//! `None` on either side.

use crate::errors::Error;
use crate::fragment::{CodeFragment, Instruction, Outcome, UnboundReason};
use crate::jvm::{
    BaseType, ClassGraph, ClassId, FieldType, InvokeType, JavaLibrary, RefType, RenderDescriptor,
};
use crate::util::Width;

/// A source or target type (`None` is `void`)
pub type AssignableType<'g> = Option<FieldType<ClassId<'g>>>;

/// Produces conversion code between JVM types
///
/// Immutable and freely shareable. The `allow_dynamic_cast` flag chooses between static typing
/// (only conversions that can never fail at run time) and dynamic typing (also `checkcast`
/// downcasts, value-narrowing casts, and default values for missing inputs).
pub struct Assigner<'g> {
    java: &'g JavaLibrary<'g>,
    allow_dynamic_cast: bool,
}

impl<'g> Assigner<'g> {
    pub fn new(java: &'g JavaLibrary<'g>, allow_dynamic_cast: bool) -> Assigner<'g> {
        Assigner {
            java,
            allow_dynamic_cast,
        }
    }

    /// Conversion code from `source` to `target` under the configured strictness
    pub fn assign(&self, source: AssignableType<'g>, target: AssignableType<'g>) -> Outcome<'g> {
        self.assign_with(source, target, self.allow_dynamic_cast)
    }

    /// Like [`Assigner::assign`], but raising refusal to an [`Error`]
    pub fn try_assign(
        &self,
        source: AssignableType<'g>,
        target: AssignableType<'g>,
    ) -> Result<CodeFragment<'g>, Error> {
        match self.assign(source, target) {
            Outcome::Bound(fragment) => Ok(fragment),
            Outcome::Unbound(_) => Err(Error::UnsupportedConversion {
                source: render_type(&source),
                target: render_type(&target),
            }),
        }
    }

    /// Conversion code from `source` to `target`, with an explicit strictness override
    pub fn assign_with(
        &self,
        source: AssignableType<'g>,
        target: AssignableType<'g>,
        dynamic: bool,
    ) -> Outcome<'g> {
        match (source, target) {
            (None, None) => Outcome::empty(),

            // A missing input can be conjured as the target's default value, but only when the
            // caller opted into dynamic typing
            (None, Some(target_type)) if dynamic => {
                Outcome::Bound(CodeFragment::of(vec![default_value(&target_type)]))
            }
            (None, Some(_)) => self.unassignable(&source, &target),

            // Discarding a value always works
            (Some(source_type), None) => {
                let pop = match source_type.width() {
                    2 => Instruction::Pop2,
                    _ => Instruction::Pop,
                };
                Outcome::Bound(CodeFragment::of(vec![pop]))
            }

            (Some(source_type), Some(target_type)) => {
                self.convert(source_type, target_type, dynamic)
            }
        }
    }

    fn convert(
        &self,
        source: FieldType<ClassId<'g>>,
        target: FieldType<ClassId<'g>>,
        dynamic: bool,
    ) -> Outcome<'g> {
        if source == target {
            return Outcome::empty();
        }
        match (source, target) {
            (FieldType::Base(from), FieldType::Base(to)) => {
                self.convert_primitive(from, to, dynamic)
            }
            (FieldType::Base(from), FieldType::Ref(to)) => self.box_primitive(from, to, dynamic),
            (FieldType::Ref(from), FieldType::Base(to)) => self.unbox_reference(from, to, dynamic),
            (FieldType::Ref(from), FieldType::Ref(to)) => self.convert_reference(from, to, dynamic),
        }
    }

    fn convert_primitive(&self, from: BaseType, to: BaseType, dynamic: bool) -> Outcome<'g> {
        if let Some(code) = widening(from, to) {
            Outcome::Bound(CodeFragment::of(code))
        } else if dynamic {
            match narrowing(from, to) {
                Some(code) => Outcome::Bound(CodeFragment::of(code)),
                None => self.unassignable(&Some(FieldType::Base(from)), &Some(FieldType::Base(to))),
            }
        } else {
            self.unassignable(&Some(FieldType::Base(from)), &Some(FieldType::Base(to)))
        }
    }

    /// Box a primitive through its wrapper's `valueOf`, then treat the wrapper as a reference
    fn box_primitive(
        &self,
        from: BaseType,
        to: RefType<ClassId<'g>>,
        dynamic: bool,
    ) -> Outcome<'g> {
        let value_of = self.java.box_method(from);
        let boxed = Outcome::Bound(CodeFragment::of(vec![Instruction::Invoke(
            InvokeType::Static,
            value_of,
        )]));
        let wrapper = RefType::Object(self.java.wrapper_class(from));
        boxed.then(self.convert_reference(wrapper, to, dynamic))
    }

    /// Unbox a reference through the wrapper's `*Value` accessor
    ///
    /// A value statically typed at the wrapper unboxes directly. Anything more general (say,
    /// `Object` or `Number`) needs a `checkcast` down to the target's wrapper first, which is only
    /// available under dynamic typing.
    fn unbox_reference(
        &self,
        from: RefType<ClassId<'g>>,
        to: BaseType,
        dynamic: bool,
    ) -> Outcome<'g> {
        let source_primitive = match from {
            RefType::Object(class) => self.primitive_for_wrapper(class),
            _ => None,
        };
        if let Some(primitive) = source_primitive {
            let unbox = Outcome::Bound(CodeFragment::of(vec![Instruction::Invoke(
                self.java.unbox_method(primitive).infer_invoke_type(),
                self.java.unbox_method(primitive),
            )]));
            unbox.then(self.convert_primitive_or_identity(primitive, to, dynamic))
        } else if dynamic {
            let wrapper = self.java.wrapper_class(to);
            let unbox_method = self.java.unbox_method(to);
            Outcome::Bound(CodeFragment::of(vec![
                Instruction::CheckCast(RefType::Object(wrapper)),
                Instruction::Invoke(unbox_method.infer_invoke_type(), unbox_method),
            ]))
        } else {
            self.unassignable(&Some(FieldType::Ref(from)), &Some(FieldType::Base(to)))
        }
    }

    fn convert_primitive_or_identity(
        &self,
        from: BaseType,
        to: BaseType,
        dynamic: bool,
    ) -> Outcome<'g> {
        if from == to {
            Outcome::empty()
        } else {
            self.convert_primitive(from, to, dynamic)
        }
    }

    fn convert_reference(
        &self,
        from: RefType<ClassId<'g>>,
        to: RefType<ClassId<'g>>,
        dynamic: bool,
    ) -> Outcome<'g> {
        if from == to || ClassGraph::is_java_assignable(&from, &to) {
            Outcome::empty()
        } else if dynamic {
            Outcome::Bound(CodeFragment::of(vec![Instruction::CheckCast(to)]))
        } else {
            self.unassignable(&Some(FieldType::Ref(from)), &Some(FieldType::Ref(to)))
        }
    }

    fn primitive_for_wrapper(&self, class: ClassId<'g>) -> Option<BaseType> {
        let classes = &self.java.classes;
        if class == classes.boolean {
            Some(BaseType::Boolean)
        } else if class == classes.byte {
            Some(BaseType::Byte)
        } else if class == classes.character {
            Some(BaseType::Char)
        } else if class == classes.short {
            Some(BaseType::Short)
        } else if class == classes.integer {
            Some(BaseType::Int)
        } else if class == classes.long {
            Some(BaseType::Long)
        } else if class == classes.float {
            Some(BaseType::Float)
        } else if class == classes.double {
            Some(BaseType::Double)
        } else {
            None
        }
    }

    fn unassignable(
        &self,
        source: &AssignableType<'g>,
        target: &AssignableType<'g>,
    ) -> Outcome<'g> {
        Outcome::Unbound(UnboundReason::Unassignable {
            source: render_type(source),
            target: render_type(target),
        })
    }
}

fn render_type(typ: &AssignableType) -> String {
    match typ {
        None => String::from("V"),
        Some(typ) => typ.render(),
    }
}

/// Instruction pushing the default value of a type
fn default_value<'g>(typ: &FieldType<ClassId<'g>>) -> Instruction<'g> {
    match typ {
        FieldType::Base(BaseType::Long) => Instruction::LConst0,
        FieldType::Base(BaseType::Float) => Instruction::FConst0,
        FieldType::Base(BaseType::Double) => Instruction::DConst0,
        FieldType::Base(_) => Instruction::IConst0,
        FieldType::Ref(_) => Instruction::AConstNull,
    }
}

/// Conversion code for a widening primitive conversion, if there is one
///
/// `byte`, `short`, and `char` are already `int`-shaped on the operand stack, so widening within
/// that group emits nothing. `boolean` widens to and from nothing.
fn widening<'g>(from: BaseType, to: BaseType) -> Option<Vec<Instruction<'g>>> {
    use BaseType::*;
    use Instruction::*;
    match (from, to) {
        (Byte, Short | Int) | (Short, Int) | (Char, Int) => Some(vec![]),
        (Byte | Short | Char | Int, Long) => Some(vec![I2L]),
        (Byte | Short | Char | Int, Float) => Some(vec![I2F]),
        (Byte | Short | Char | Int, Double) => Some(vec![I2D]),
        (Long, Float) => Some(vec![L2F]),
        (Long, Double) => Some(vec![L2D]),
        (Float, Double) => Some(vec![F2D]),
        _ => None,
    }
}

/// Conversion code for a narrowing primitive conversion, if there is one
fn narrowing<'g>(from: BaseType, to: BaseType) -> Option<Vec<Instruction<'g>>> {
    use BaseType::*;
    use Instruction::*;
    match (from, to) {
        (Short | Char | Int, Byte) => Some(vec![I2B]),
        (Char | Int, Short) => Some(vec![I2S]),
        (Short | Int, Char) => Some(vec![I2C]),
        (Long, Int) => Some(vec![L2I]),
        (Long, Byte) => Some(vec![L2I, I2B]),
        (Long, Short) => Some(vec![L2I, I2S]),
        (Long, Char) => Some(vec![L2I, I2C]),
        (Float, Int) => Some(vec![F2I]),
        (Float, Long) => Some(vec![F2L]),
        (Float, Byte) => Some(vec![F2I, I2B]),
        (Float, Short) => Some(vec![F2I, I2S]),
        (Float, Char) => Some(vec![F2I, I2C]),
        (Double, Int) => Some(vec![D2I]),
        (Double, Long) => Some(vec![D2L]),
        (Double, Float) => Some(vec![D2F]),
        (Double, Byte) => Some(vec![D2I, I2B]),
        (Double, Short) => Some(vec![D2I, I2S]),
        (Double, Char) => Some(vec![D2I, I2C]),
        _ => None,
    }
}
