//! Tie-breaking between rival successful bindings
//!
//! Resolvers only ever see two already-successful bindings and say which (if either) should win.
//! They are pure: no resolver mutates a binding or consults anything outside the two bindings and
//! the call.

use super::binding::ResolvedBinding;
use super::signature::CallSignature;
use crate::jvm::{BaseType, ClassGraph, ClassId, FieldType};

/// Verdict on a pair of rival bindings
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Left,
    Right,

    /// No preference; also the answer when a resolver has nothing to say about the pair
    Ambiguous,
}

/// One heuristic for ordering two rival bindings
pub trait AmbiguityResolver<'g> {
    fn resolve(
        &self,
        call: &CallSignature<'g>,
        left: &ResolvedBinding<'g>,
        right: &ResolvedBinding<'g>,
    ) -> Resolution;
}

/// Ordered sequence of resolvers; the first one with a preference decides
pub struct ResolverChain<'g> {
    resolvers: Vec<Box<dyn AmbiguityResolver<'g>>>,
}

impl<'g> ResolverChain<'g> {
    pub fn new(resolvers: Vec<Box<dyn AmbiguityResolver<'g>>>) -> ResolverChain<'g> {
        ResolverChain { resolvers }
    }

    /// The conventional chain: explicit priority, then name equality, then argument-type
    /// specificity, then bound-parameter count
    pub fn standard() -> ResolverChain<'g> {
        ResolverChain::new(vec![
            Box::new(PriorityResolver),
            Box::new(NameEqualityResolver),
            Box::new(ArgumentTypeResolver),
            Box::new(BoundCountResolver),
        ])
    }

    /// Add a resolver with lower precedence than everything already in the chain
    pub fn append(&mut self, resolver: Box<dyn AmbiguityResolver<'g>>) {
        self.resolvers.push(resolver);
    }
}

impl<'g> AmbiguityResolver<'g> for ResolverChain<'g> {
    fn resolve(
        &self,
        call: &CallSignature<'g>,
        left: &ResolvedBinding<'g>,
        right: &ResolvedBinding<'g>,
    ) -> Resolution {
        for resolver in &self.resolvers {
            match resolver.resolve(call, left, right) {
                Resolution::Ambiguous => continue,
                decided => return decided,
            }
        }
        Resolution::Ambiguous
    }
}

/// Higher explicit priority weight wins (absent counts as zero)
pub struct PriorityResolver;

impl<'g> AmbiguityResolver<'g> for PriorityResolver {
    fn resolve(
        &self,
        _call: &CallSignature<'g>,
        left: &ResolvedBinding<'g>,
        right: &ResolvedBinding<'g>,
    ) -> Resolution {
        let left_priority = left.priority().unwrap_or(0);
        let right_priority = right.priority().unwrap_or(0);
        match left_priority.cmp(&right_priority) {
            std::cmp::Ordering::Greater => Resolution::Left,
            std::cmp::Ordering::Less => Resolution::Right,
            std::cmp::Ordering::Equal => Resolution::Ambiguous,
        }
    }
}

/// A target named exactly like the intercepted call wins
pub struct NameEqualityResolver;

impl<'g> AmbiguityResolver<'g> for NameEqualityResolver {
    fn resolve(
        &self,
        call: &CallSignature<'g>,
        left: &ResolvedBinding<'g>,
        right: &ResolvedBinding<'g>,
    ) -> Resolution {
        let left_matches = &left.target().name == call.name();
        let right_matches = &right.target().name == call.name();
        match (left_matches, right_matches) {
            (true, false) => Resolution::Left,
            (false, true) => Resolution::Right,
            _ => Resolution::Ambiguous,
        }
    }
}

/// The side binding call arguments at strictly more specific parameter types wins
///
/// Each call argument claimed by both sides contributes a per-argument verdict; an argument
/// claimed by only one side favors that side. Conflicting verdicts make the pair ambiguous. If no
/// argument distinguishes the two, the side that claimed more arguments wins.
pub struct ArgumentTypeResolver;

impl<'g> AmbiguityResolver<'g> for ArgumentTypeResolver {
    fn resolve(
        &self,
        call: &CallSignature<'g>,
        left: &ResolvedBinding<'g>,
        right: &ResolvedBinding<'g>,
    ) -> Resolution {
        let mut merged: Option<Resolution> = None;
        for argument in 0..call.argument_count() {
            let verdict = match (
                left.target_parameter_for_argument(argument),
                right.target_parameter_for_argument(argument),
            ) {
                (Some(left_parameter), Some(right_parameter)) => compare_rivals(
                    call.argument_type(argument).unwrap(),
                    left.target().descriptor.parameters[left_parameter],
                    right.target().descriptor.parameters[right_parameter],
                ),
                (Some(_), None) => Some(Resolution::Left),
                (None, Some(_)) => Some(Resolution::Right),
                (None, None) => None,
            };
            merged = match (merged, verdict) {
                (None, verdict) => verdict,
                (merged, None) => merged,
                (Some(Resolution::Ambiguous), _) | (_, Some(Resolution::Ambiguous)) => {
                    Some(Resolution::Ambiguous)
                }
                (Some(a), Some(b)) if a == b => Some(a),
                _ => Some(Resolution::Ambiguous),
            };
        }
        match merged {
            Some(decided) => decided,
            // No argument distinguishes the two; fall back to how many each consumed
            None => match left.claim_count().cmp(&right.claim_count()) {
                std::cmp::Ordering::Greater => Resolution::Left,
                std::cmp::Ordering::Less => Resolution::Right,
                std::cmp::Ordering::Equal => Resolution::Ambiguous,
            },
        }
    }
}

/// Per-argument verdict when both sides claimed the argument (`None` when the types tie)
fn compare_rivals<'g>(
    source: FieldType<ClassId<'g>>,
    left: FieldType<ClassId<'g>>,
    right: FieldType<ClassId<'g>>,
) -> Option<Resolution> {
    if left == right {
        return None;
    }
    match (left, right) {
        (FieldType::Base(left), FieldType::Base(right)) => {
            match primitive_precedence(left).cmp(&primitive_precedence(right)) {
                std::cmp::Ordering::Less => Some(Resolution::Left),
                std::cmp::Ordering::Greater => Some(Resolution::Right),
                std::cmp::Ordering::Equal => None,
            }
        }
        // A primitive parameter is the better match for a primitive argument, and a reference
        // parameter for a reference argument
        (FieldType::Base(_), FieldType::Ref(_)) => match source {
            FieldType::Base(_) => Some(Resolution::Left),
            FieldType::Ref(_) => Some(Resolution::Right),
        },
        (FieldType::Ref(_), FieldType::Base(_)) => match source {
            FieldType::Base(_) => Some(Resolution::Right),
            FieldType::Ref(_) => Some(Resolution::Left),
        },
        (FieldType::Ref(left), FieldType::Ref(right)) => {
            let left_more_specific = ClassGraph::is_java_assignable(&left, &right);
            let right_more_specific = ClassGraph::is_java_assignable(&right, &left);
            match (left_more_specific, right_more_specific) {
                (true, false) => Some(Resolution::Left),
                (false, true) => Some(Resolution::Right),
                _ => Some(Resolution::Ambiguous),
            }
        }
    }
}

/// Rank of a primitive type among the widening conversions (smaller is more specific)
fn primitive_precedence(base_type: BaseType) -> u8 {
    match base_type {
        BaseType::Boolean => 0,
        BaseType::Byte => 1,
        BaseType::Short => 2,
        BaseType::Char => 3,
        BaseType::Int => 4,
        BaseType::Long => 5,
        BaseType::Float => 6,
        BaseType::Double => 7,
    }
}

/// The side that bound more target parameters wins
pub struct BoundCountResolver;

impl<'g> AmbiguityResolver<'g> for BoundCountResolver {
    fn resolve(
        &self,
        _call: &CallSignature<'g>,
        left: &ResolvedBinding<'g>,
        right: &ResolvedBinding<'g>,
    ) -> Resolution {
        match left.bindings().len().cmp(&right.bindings().len()) {
            std::cmp::Ordering::Greater => Resolution::Left,
            std::cmp::Ordering::Less => Resolution::Right,
            std::cmp::Ordering::Equal => Resolution::Ambiguous,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bind::{BindingBuilder, ParameterBinding};
    use crate::fragment::CodeFragment;
    use crate::jvm::{
        BinaryName, ClassAccessFlags, ClassData, ClassGraphArenas, MethodAccessFlags, MethodData,
        MethodDescriptor, MethodId, Name, UnqualifiedName,
    };

    fn binding<'g>(
        target: MethodId<'g>,
        priority: Option<u32>,
        claims: &[(usize, usize)],
    ) -> ResolvedBinding<'g> {
        let mut builder = BindingBuilder::new(target).with_priority(priority);
        for (target_parameter, argument) in claims {
            builder.bind(ParameterBinding {
                target_parameter: *target_parameter,
                fragment: CodeFragment::empty(),
                claims: Some(*argument),
            });
        }
        builder.build(
            CodeFragment::empty(),
            CodeFragment::empty(),
            CodeFragment::empty(),
        )
    }

    #[test]
    fn chain_takes_the_first_preference() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types();

        let class = class_graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("me/example/Example")).unwrap(),
            java.classes.object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ));
        let call_method = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("source")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC,
        });
        let call = CallSignature::new(call_method);

        // `source` matches the call name, but the rival's priority outranks name equality
        let named_like_call = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("source")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![crate::jvm::FieldType::int()],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let prioritized = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("other")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });

        let chain = ResolverChain::standard();
        let left = binding(named_like_call, None, &[]);
        let right = binding(prioritized, Some(10), &[]);
        assert_eq!(chain.resolve(&call, &left, &right), Resolution::Right);

        // With equal priorities, name equality gets its say
        let right = binding(prioritized, None, &[]);
        assert_eq!(chain.resolve(&call, &left, &right), Resolution::Left);
    }

    #[test]
    fn argument_types_pick_the_more_specific_side() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types();

        let class = class_graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("me/example/Example")).unwrap(),
            java.classes.object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ));
        let string = crate::jvm::FieldType::object(java.classes.string);
        let object = crate::jvm::FieldType::object(java.classes.object);
        let call_method = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("source")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![string],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let call = CallSignature::new(call_method);

        let takes_string = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("takesString")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![string],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let takes_object = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("takesObject")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![object],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });

        let resolver = ArgumentTypeResolver;
        let left = binding(takes_string, None, &[(0, 0)]);
        let right = binding(takes_object, None, &[(0, 0)]);
        assert_eq!(resolver.resolve(&call, &left, &right), Resolution::Left);
        assert_eq!(resolver.resolve(&call, &right, &left), Resolution::Right);

        // Claiming an argument beats not claiming it
        let unclaimed = binding(takes_object, None, &[]);
        assert_eq!(
            resolver.resolve(&call, &right, &unclaimed),
            Resolution::Left
        );
    }

    #[test]
    fn primitive_precedence_prefers_the_narrower_parameter() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types();

        let class = class_graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("me/example/Example")).unwrap(),
            java.classes.object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ));
        let call_method = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("source")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![crate::jvm::FieldType::int()],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let call = CallSignature::new(call_method);

        let takes_int = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("takesInt")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![crate::jvm::FieldType::int()],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let takes_long = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("takesLong")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![crate::jvm::FieldType::long()],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });

        let resolver = ArgumentTypeResolver;
        let left = binding(takes_int, None, &[(0, 0)]);
        let right = binding(takes_long, None, &[(0, 0)]);
        assert_eq!(resolver.resolve(&call, &left, &right), Resolution::Left);
    }

    #[test]
    fn unrelated_reference_parameters_are_ambiguous() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types();

        let class = class_graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("me/example/Example")).unwrap(),
            java.classes.object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        ));
        let string = crate::jvm::FieldType::object(java.classes.string);
        let number = crate::jvm::FieldType::object(java.classes.number);
        let call_method = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("source")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![string],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let call = CallSignature::new(call_method);

        let takes_string = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("takesString")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![string],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });
        let takes_number = class_graph.add_method(MethodData {
            class,
            name: UnqualifiedName::from_string(String::from("takesNumber")).unwrap(),
            descriptor: MethodDescriptor {
                parameters: vec![number],
                return_type: None,
            },
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        });

        // String and Number are unrelated, so specificity cannot order them, and the claim
        // counts are equal
        let resolver = ArgumentTypeResolver;
        let left = binding(takes_string, None, &[(0, 0)]);
        let right = binding(takes_number, None, &[(0, 0)]);
        assert_eq!(
            resolver.resolve(&call, &left, &right),
            Resolution::Ambiguous
        );
    }
}
