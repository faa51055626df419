//! End-to-end delegation scenarios: candidate pools, tie-breaking, and failure reporting

use jbind::bind::{
    BindingHint, BindingResolver, BindingSettings, CallSignature, Candidate, TerminationHandler,
};
use jbind::fragment::Instruction;
use jbind::jvm::*;
use jbind::Error;

fn add_class<'g>(
    class_graph: &ClassGraph<'g>,
    java: &JavaLibrary<'g>,
    name: &str,
) -> ClassId<'g> {
    class_graph.add_class(ClassData::new(
        BinaryName::from_string(String::from(name)).unwrap(),
        java.classes.object,
        ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
    ))
}

fn add_method<'g>(
    class_graph: &ClassGraph<'g>,
    class: ClassId<'g>,
    name: &str,
    parameters: Vec<FieldType<ClassId<'g>>>,
    return_type: Option<FieldType<ClassId<'g>>>,
    access_flags: MethodAccessFlags,
) -> MethodId<'g> {
    class_graph.add_method(MethodData {
        class,
        name: UnqualifiedName::from_string(String::from(name)).unwrap(),
        descriptor: MethodDescriptor {
            parameters,
            return_type,
        },
        access_flags,
    })
}

const PUBLIC_STATIC: MethodAccessFlags =
    MethodAccessFlags::from_bits_truncate(0x0001 | 0x0008);

#[test]
fn resolves_the_only_candidate() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Greeter");
    let call = add_method(
        &class_graph,
        class,
        "greet",
        vec![FieldType::int()],
        Some(FieldType::long()),
        MethodAccessFlags::PUBLIC,
    );
    let target = add_method(
        &class_graph,
        class,
        "intercepted",
        vec![FieldType::long()],
        Some(FieldType::long()),
        PUBLIC_STATIC,
    );

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![Candidate::new(target)],
        BindingSettings::standard(),
    )
    .unwrap();
    let binding = resolver.resolve(CallSignature::new(call)).unwrap();

    assert_eq!(binding.target(), target);
    assert_eq!(
        binding.fragment().instructions(),
        &[
            Instruction::ILoad(1),
            Instruction::I2L,
            Instruction::Invoke(InvokeType::Static, target),
            Instruction::LReturn,
        ]
    );
    // The delegation code needs two interim stack slots (the widened long) and nets to zero
    assert_eq!(binding.fragment().effect().net(), 0);
    assert_eq!(binding.fragment().effect().peak(), 2);
}

#[test]
fn resolution_is_deterministic() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let object = FieldType::object(java.classes.object);
    let call = add_method(
        &class_graph,
        class,
        "source",
        vec![string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    let pool = vec![
        Candidate::new(add_method(
            &class_graph,
            class,
            "first",
            vec![object],
            None,
            PUBLIC_STATIC,
        )),
        Candidate::new(add_method(
            &class_graph,
            class,
            "second",
            vec![string],
            None,
            PUBLIC_STATIC,
        )),
    ];

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        pool.clone(),
        BindingSettings::standard(),
    )
    .unwrap();
    let once = resolver.resolve(CallSignature::new(call)).unwrap();
    let again = resolver.resolve(CallSignature::new(call)).unwrap();
    assert_eq!(once, again);

    // A separately constructed resolver over the same pool agrees
    let other_resolver =
        BindingResolver::new(&class_graph, &java, pool, BindingSettings::standard()).unwrap();
    assert_eq!(once, other_resolver.resolve(CallSignature::new(call)).unwrap());
}

#[test]
fn name_equality_beats_later_resolvers() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let call = add_method(
        &class_graph,
        class,
        "frobnicate",
        vec![string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    let namesake = add_method(
        &class_graph,
        class,
        "frobnicate",
        vec![string],
        None,
        PUBLIC_STATIC,
    );
    let other = add_method(
        &class_graph,
        class,
        "unrelated",
        vec![string],
        None,
        PUBLIC_STATIC,
    );

    // Pool order does not matter: the namesake wins from either position
    for pool in [
        vec![Candidate::new(namesake), Candidate::new(other)],
        vec![Candidate::new(other), Candidate::new(namesake)],
    ] {
        let resolver =
            BindingResolver::new(&class_graph, &java, pool, BindingSettings::standard()).unwrap();
        let binding = resolver.resolve(CallSignature::new(call)).unwrap();
        assert_eq!(binding.target(), namesake);
    }
}

#[test]
fn more_specific_parameter_types_win() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let char_sequence = FieldType::object(java.classes.char_sequence);
    let object = FieldType::object(java.classes.object);
    let call = add_method(
        &class_graph,
        class,
        "source",
        vec![string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    let takes_object = add_method(
        &class_graph,
        class,
        "takesObject",
        vec![object],
        None,
        PUBLIC_STATIC,
    );
    let takes_char_sequence = add_method(
        &class_graph,
        class,
        "takesCharSequence",
        vec![char_sequence],
        None,
        PUBLIC_STATIC,
    );

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![Candidate::new(takes_object), Candidate::new(takes_char_sequence)],
        BindingSettings::standard(),
    )
    .unwrap();
    let binding = resolver.resolve(CallSignature::new(call)).unwrap();
    assert_eq!(binding.target(), takes_char_sequence);
}

#[test]
fn unorderable_rivals_are_reported_as_ambiguous() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let object = FieldType::object(java.classes.object);
    let call = add_method(
        &class_graph,
        class,
        "source",
        vec![string, string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    // Each candidate is more specific on a different argument
    let first = add_method(
        &class_graph,
        class,
        "first",
        vec![string, object],
        None,
        PUBLIC_STATIC,
    );
    let second = add_method(
        &class_graph,
        class,
        "second",
        vec![object, string],
        None,
        PUBLIC_STATIC,
    );

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![Candidate::new(first), Candidate::new(second)],
        BindingSettings::standard(),
    )
    .unwrap();
    match resolver.resolve(CallSignature::new(call)) {
        Err(Error::AmbiguousBinding { call, left, right }) => {
            assert_eq!(call, "me/example/Example.source:(Ljava/lang/String;Ljava/lang/String;)V");
            assert!(left.contains("first") || right.contains("first"));
            assert!(left.contains("second") || right.contains("second"));
        }
        other => panic!("expected AmbiguousBinding, got {:?}", other),
    }
}

#[test]
fn explicit_priority_overrides_the_rest_of_the_chain() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let call = add_method(
        &class_graph,
        class,
        "frobnicate",
        vec![string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    let namesake = add_method(
        &class_graph,
        class,
        "frobnicate",
        vec![string],
        None,
        PUBLIC_STATIC,
    );
    let weighted = add_method(
        &class_graph,
        class,
        "unrelated",
        vec![string],
        None,
        PUBLIC_STATIC,
    );

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![
            Candidate::new(namesake),
            Candidate::new(weighted).with_priority(5),
        ],
        BindingSettings::standard(),
    )
    .unwrap();
    let binding = resolver.resolve(CallSignature::new(call)).unwrap();
    assert_eq!(binding.target(), weighted);
}

#[test]
fn unconvertible_candidates_are_skipped_not_fatal() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let object = FieldType::object(java.classes.object);
    let call = add_method(
        &class_graph,
        class,
        "source",
        vec![string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    // A String argument can never become an int, so this candidate drops out quietly
    let takes_int = add_method(
        &class_graph,
        class,
        "takesInt",
        vec![FieldType::int()],
        None,
        PUBLIC_STATIC,
    );
    let takes_object = add_method(
        &class_graph,
        class,
        "takesObject",
        vec![object],
        None,
        PUBLIC_STATIC,
    );

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![Candidate::new(takes_int), Candidate::new(takes_object)],
        BindingSettings::standard(),
    )
    .unwrap();
    let binding = resolver.resolve(CallSignature::new(call)).unwrap();
    assert_eq!(binding.target(), takes_object);

    // With only the unconvertible candidate, the failure names what was considered
    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![Candidate::new(takes_int)],
        BindingSettings::standard(),
    )
    .unwrap();
    match resolver.resolve(CallSignature::new(call)) {
        Err(Error::NoBindableCandidate { considered, .. }) => {
            assert_eq!(considered, vec![String::from("me/example/Example.takesInt:(I)V")]);
        }
        other => panic!("expected NoBindableCandidate, got {:?}", other),
    }
}

#[test]
fn dropping_termination_discards_the_result() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let call = add_method(
        &class_graph,
        class,
        "source",
        vec![FieldType::int()],
        None,
        MethodAccessFlags::PUBLIC,
    );
    // The target's int return would never convert onto the call's void return, but a dropping
    // handler discards it instead of refusing
    let target = add_method(
        &class_graph,
        class,
        "compute",
        vec![FieldType::int()],
        Some(FieldType::int()),
        PUBLIC_STATIC,
    );

    let mut settings = BindingSettings::standard();
    settings.termination = TerminationHandler::Dropping;
    let resolver =
        BindingResolver::new(&class_graph, &java, vec![Candidate::new(target)], settings).unwrap();
    let binding = resolver.resolve(CallSignature::new(call)).unwrap();
    assert_eq!(
        binding.fragment().instructions(),
        &[
            Instruction::ILoad(1),
            Instruction::Invoke(InvokeType::Static, target),
            Instruction::Pop,
        ]
    );
}

#[test]
fn explicit_hints_drive_the_binders() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let string = FieldType::object(java.classes.string);
    let object = FieldType::object(java.classes.object);
    let call = add_method(
        &class_graph,
        class,
        "source",
        vec![FieldType::int(), string],
        None,
        MethodAccessFlags::PUBLIC,
    );
    // Parameters bound out of order and from the receiver
    let target = add_method(
        &class_graph,
        class,
        "handle",
        vec![string, object, FieldType::int()],
        None,
        PUBLIC_STATIC,
    );

    let candidate = Candidate::new(target)
        .with_hint(0, BindingHint::Argument(1))
        .with_hint(1, BindingHint::This)
        .with_hint(2, BindingHint::Argument(0));
    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![candidate],
        BindingSettings::standard(),
    )
    .unwrap();
    let binding = resolver.resolve(CallSignature::new(call)).unwrap();
    assert_eq!(
        binding.fragment().instructions(),
        &[
            Instruction::ALoad(2),
            Instruction::ALoad(0),
            Instruction::ILoad(1),
            Instruction::Invoke(InvokeType::Static, target),
            Instruction::Return,
        ]
    );
    assert_eq!(binding.target_parameter_for_argument(0), Some(2));
    assert_eq!(binding.target_parameter_for_argument(1), Some(0));
    assert_eq!(binding.claim_count(), 2);
}

#[test]
fn instance_calls_cannot_delegate_from_static_calls() {
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    let java = class_graph.insert_java_library_types();

    let class = add_class(&class_graph, &java, "me/example/Example");
    let static_call = add_method(
        &class_graph,
        class,
        "source",
        vec![],
        None,
        PUBLIC_STATIC,
    );
    // An instance target needs a receiver, which a static call cannot supply
    let instance_target = add_method(
        &class_graph,
        class,
        "target",
        vec![],
        None,
        MethodAccessFlags::PUBLIC,
    );

    let resolver = BindingResolver::new(
        &class_graph,
        &java,
        vec![Candidate::new(instance_target)],
        BindingSettings::standard(),
    )
    .unwrap();
    let result = resolver.resolve(CallSignature::new(static_call));
    assert!(matches!(result, Err(Error::NoBindableCandidate { .. })));
}
