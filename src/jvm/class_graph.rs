use super::{
    BaseType, BinaryName, ClassAccessFlags, MethodAccessFlags, MethodDescriptor, Name, RefType,
    RenderDescriptor, UnqualifiedName,
};
use crate::util::RefId;
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::collections::HashSet;
use std::fmt;
use std::fmt::Debug;
use typed_arena::Arena;

/// Pointer-identity handle to a class in the graph
pub type ClassId<'g> = RefId<'g, ClassData<'g>>;

/// Pointer-identity handle to a method in the graph
pub type MethodId<'g> = RefId<'g, MethodData<'g>>;

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
    method_arena: Arena<MethodData<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
            method_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the relationships between classes/interfaces and the members on those classes
///
/// Binding resolution never inspects classfile bytes - it works entirely off of this graph, which
/// the metadata-extraction collaborator populates up front. The graph is append-only: references
/// into it stay valid for the lifetime of the arenas.
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    classes: FrozenMap<&'g BinaryName, &'g ClassData<'g>>,
}

impl<'g> ClassGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        ClassGraph {
            arenas,
            classes: FrozenMap::new(),
        }
    }

    /// Query if one type is assignable to another
    ///
    /// This matches the semantics of the prolog predicate `isJavaAssignable(sub_type, super_type)`
    /// in the JVM verifier specification.
    pub fn is_java_assignable(
        sub_type: &RefType<ClassId<'g>>,
        super_type: &RefType<ClassId<'g>>,
    ) -> bool {
        match (sub_type, super_type) {
            // Special superclass and interfaces of all arrays
            (
                RefType::PrimitiveArray(_) | RefType::ObjectArray(_),
                RefType::Object(object_type),
            ) => Self::is_array_type_assignable(&object_type.name),

            // Primitive arrays must match in dimension and type
            (RefType::PrimitiveArray(arr1), RefType::PrimitiveArray(arr2)) => arr1 == arr2,

            // Higher dimensional primitive arrays can be subtypes of object arrays
            (RefType::PrimitiveArray(arr1), RefType::ObjectArray(arr2)) => {
                arr1.additional_dimensions > arr2.additional_dimensions
                    && Self::is_array_type_assignable(&arr2.element_type.name)
            }

            // Cursed (unsound) covariance of arrays
            (RefType::ObjectArray(arr1), RefType::ObjectArray(arr2)) => {
                if arr1.additional_dimensions < arr2.additional_dimensions {
                    false
                } else if arr1.additional_dimensions == arr2.additional_dimensions {
                    Self::is_object_type_assignable(arr1.element_type, arr2.element_type)
                } else {
                    Self::is_array_type_assignable(&arr2.element_type.name)
                }
            }

            // Object-to-object assignability holds if there is a path through super type edges
            (RefType::Object(cls1), RefType::Object(cls2)) => {
                Self::is_object_type_assignable(*cls1, *cls2)
            }

            _ => false,
        }
    }

    /// Object to object assignability
    ///
    /// This does a search up the superclasses and superinterfaces looking for the super type.
    fn is_object_type_assignable(sub_type: ClassId<'g>, super_type: ClassId<'g>) -> bool {
        let mut supertypes_to_visit: Vec<ClassId<'g>> = vec![sub_type];
        let mut dont_revisit: HashSet<ClassId<'g>> = HashSet::new();
        dont_revisit.insert(sub_type);

        // Optimization: if the super type is a class, then skip visiting interfaces
        let super_is_class: bool = !super_type.is_interface();

        while let Some(class_data) = supertypes_to_visit.pop() {
            if class_data == super_type {
                return true;
            }
            let class_data = class_data.0;

            // Enqueue next types to visit
            if let Some(superclass) = class_data.superclass {
                if dont_revisit.insert(superclass) {
                    supertypes_to_visit.push(superclass);
                }
            }
            if !super_is_class {
                for interface in &class_data.interfaces {
                    let interface = RefId(interface);
                    if dont_revisit.insert(interface) {
                        supertypes_to_visit.push(interface);
                    }
                }
            }
        }

        false
    }

    /// Check if arrays can be assigned to a super type
    ///
    /// This bakes in knowledge of the small, finite set of super types arrays have.
    fn is_array_type_assignable(super_type: &BinaryName) -> bool {
        super_type == &BinaryName::OBJECT
            || super_type == &BinaryName::CLONEABLE
            || super_type == &BinaryName::SERIALIZABLE
    }

    pub fn lookup_class(&'g self, name: &BinaryName) -> Option<ClassId<'g>> {
        self.classes.get(name).map(RefId)
    }

    /// Add a new class to the class graph
    pub fn add_class(&self, data: ClassData<'g>) -> ClassId<'g> {
        let data = &*self.arenas.class_arena.alloc(data);
        self.classes.insert(&data.name, data);
        RefId(data)
    }

    /// Add a method to the class graph and to its class
    ///
    /// Structurally equal methods are deduplicated, so registering the same member twice hands
    /// back the handle of the first registration.
    pub fn add_method(&self, method: MethodData<'g>) -> MethodId<'g> {
        let class: &'g ClassData<'g> = method.class.0;
        if let Some(found) = class
            .methods
            .iter()
            .find(|m| m.name == method.name && m.descriptor == method.descriptor)
        {
            RefId(found)
        } else {
            let data = &*self.arenas.method_arena.alloc(method);
            data.class.methods.push(data);
            RefId(data)
        }
    }

    /// Find the method a `invokespecial` super call from `class` would select
    ///
    /// Walks the superclass chain (not interfaces) looking for a member with a matching name and
    /// descriptor.
    pub fn resolve_super_method(
        &self,
        class: ClassId<'g>,
        name: &UnqualifiedName,
        descriptor: &MethodDescriptor<ClassId<'g>>,
    ) -> Option<MethodId<'g>> {
        let mut next_class = class.superclass;
        while let Some(superclass) = next_class {
            let superclass: &'g ClassData<'g> = superclass.0;
            if let Some(found) = superclass
                .methods
                .iter()
                .find(|m| &m.name == name && &m.descriptor == descriptor)
            {
                return Some(RefId(found));
            }
            next_class = superclass.superclass;
        }
        None
    }

    /// Add standard library types to the class graph
    pub fn insert_java_library_types(&self) -> JavaLibrary<'g> {
        JavaLibrary::add_to_graph(self)
    }
}

pub struct ClassData<'g> {
    /// Name of the class
    pub name: BinaryName,

    /// Superclass is only ever missing for `java/lang/Object` itself
    pub superclass: Option<ClassId<'g>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<&'g ClassData<'g>>,

    /// Class-level access flags
    pub access_flags: ClassAccessFlags,

    /// Methods
    pub methods: FrozenVec<&'g MethodData<'g>>,
}

impl<'g> ClassData<'g> {
    pub fn new(
        name: BinaryName,
        superclass: ClassId<'g>,
        access_flags: ClassAccessFlags,
    ) -> ClassData<'g> {
        ClassData {
            name,
            superclass: Some(superclass),
            interfaces: FrozenVec::new(),
            access_flags,
            methods: FrozenVec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }
}

impl<'g> PartialEq for ClassData<'g> {
    fn eq(&self, other: &ClassData<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for ClassData<'g> {}

impl<'g> RenderDescriptor for ClassData<'g> {
    fn render_to(&self, write_to: &mut String) {
        self.name.render_to(write_to)
    }
}

impl<'g> Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

pub struct MethodData<'g> {
    /// Class
    pub class: ClassId<'g>,

    /// Name of the method
    pub name: UnqualifiedName,

    /// Type of the method
    pub descriptor: MethodDescriptor<ClassId<'g>>,

    /// Method-level access flags
    pub access_flags: MethodAccessFlags,
}

impl<'g> MethodData<'g> {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == UnqualifiedName::INIT
    }

    /// With the exception of `invokespecial` vs. `invokevirtual`, there is usually only one valid
    /// way to invoke a method. This function finds it.
    pub fn infer_invoke_type(&self) -> InvokeType {
        if self.is_static() {
            InvokeType::Static
        } else if self.name == UnqualifiedName::INIT
            || self.name == UnqualifiedName::CLINIT
            || self.access_flags.contains(MethodAccessFlags::PRIVATE)
        {
            InvokeType::Special
        } else if self.class.is_interface() {
            let n = self.descriptor.parameter_length(true) as u8;
            InvokeType::Interface(n)
        } else {
            InvokeType::Virtual
        }
    }
}

impl<'g> Debug for MethodData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}.{}:{}",
            self.class.name.as_str(),
            self.name.as_str(),
            self.descriptor.render(),
        ))
    }
}

/// How a method gets invoked
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum InvokeType {
    Static,
    Special,
    Virtual,

    /// The `u8` is the total size of the arguments (plus one for `this`)
    Interface(u8),
}

/// References to standard library types and members which binding and assignment need
pub struct JavaLibrary<'g> {
    pub classes: JavaClasses<'g>,
    pub members: JavaMembers<'g>,
}

impl<'g> JavaLibrary<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> JavaLibrary<'g> {
        let classes = JavaClasses::add_to_graph(class_graph);
        let members = JavaMembers::add_to_graph(class_graph, &classes);
        JavaLibrary { classes, members }
    }

    /// Wrapper (boxed) class corresponding to a primitive type
    pub fn wrapper_class(&self, base_type: BaseType) -> ClassId<'g> {
        match base_type {
            BaseType::Boolean => self.classes.boolean,
            BaseType::Byte => self.classes.byte,
            BaseType::Char => self.classes.character,
            BaseType::Short => self.classes.short,
            BaseType::Int => self.classes.integer,
            BaseType::Long => self.classes.long,
            BaseType::Float => self.classes.float,
            BaseType::Double => self.classes.double,
        }
    }

    /// The static `valueOf` factory turning a primitive into its wrapper
    pub fn box_method(&self, base_type: BaseType) -> MethodId<'g> {
        match base_type {
            BaseType::Boolean => self.members.boolean_value_of,
            BaseType::Byte => self.members.byte_value_of,
            BaseType::Char => self.members.character_value_of,
            BaseType::Short => self.members.short_value_of,
            BaseType::Int => self.members.integer_value_of,
            BaseType::Long => self.members.long_value_of,
            BaseType::Float => self.members.float_value_of,
            BaseType::Double => self.members.double_value_of,
        }
    }

    /// The instance `*Value` accessor turning a wrapper back into its primitive
    pub fn unbox_method(&self, base_type: BaseType) -> MethodId<'g> {
        match base_type {
            BaseType::Boolean => self.members.boolean_value,
            BaseType::Byte => self.members.byte_value,
            BaseType::Char => self.members.char_value,
            BaseType::Short => self.members.short_value,
            BaseType::Int => self.members.int_value,
            BaseType::Long => self.members.long_value,
            BaseType::Float => self.members.float_value,
            BaseType::Double => self.members.double_value,
        }
    }
}

/// Classes inside `java.*` that the assigner and binders reason about
pub struct JavaClasses<'g> {
    pub object: ClassId<'g>,
    pub char_sequence: ClassId<'g>,
    pub string: ClassId<'g>,
    pub class: ClassId<'g>,
    pub number: ClassId<'g>,
    pub boolean: ClassId<'g>,
    pub byte: ClassId<'g>,
    pub character: ClassId<'g>,
    pub short: ClassId<'g>,
    pub integer: ClassId<'g>,
    pub long: ClassId<'g>,
    pub float: ClassId<'g>,
    pub double: ClassId<'g>,
    pub method_handle: ClassId<'g>,
}

impl<'g> JavaClasses<'g> {
    fn add_to_graph(class_graph: &ClassGraph<'g>) -> JavaClasses<'g> {
        let object = class_graph.add_class(ClassData {
            name: BinaryName::OBJECT,
            superclass: None,
            interfaces: FrozenVec::new(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            methods: FrozenVec::new(),
        });

        let public_class = ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER;
        let public_interface =
            ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT;

        let char_sequence = class_graph.add_class(ClassData::new(
            BinaryName::CHARSEQUENCE,
            object,
            public_interface,
        ));
        let string = class_graph.add_class(ClassData::new(
            BinaryName::STRING,
            object,
            public_class | ClassAccessFlags::FINAL,
        ));
        string.interfaces.push(char_sequence.0);
        let class = class_graph.add_class(ClassData::new(
            BinaryName::CLASS,
            object,
            public_class | ClassAccessFlags::FINAL,
        ));
        let number = class_graph.add_class(ClassData::new(
            BinaryName::NUMBER,
            object,
            public_class | ClassAccessFlags::ABSTRACT,
        ));
        let final_class = public_class | ClassAccessFlags::FINAL;
        let boolean =
            class_graph.add_class(ClassData::new(BinaryName::BOOLEAN, object, final_class));
        let byte = class_graph.add_class(ClassData::new(BinaryName::BYTE, number, final_class));
        let character =
            class_graph.add_class(ClassData::new(BinaryName::CHARACTER, object, final_class));
        let short = class_graph.add_class(ClassData::new(BinaryName::SHORT, number, final_class));
        let integer =
            class_graph.add_class(ClassData::new(BinaryName::INTEGER, number, final_class));
        let long = class_graph.add_class(ClassData::new(BinaryName::LONG, number, final_class));
        let float = class_graph.add_class(ClassData::new(BinaryName::FLOAT, number, final_class));
        let double = class_graph.add_class(ClassData::new(BinaryName::DOUBLE, number, final_class));
        let method_handle = class_graph.add_class(ClassData::new(
            BinaryName::METHODHANDLE,
            object,
            public_class | ClassAccessFlags::ABSTRACT,
        ));

        JavaClasses {
            object,
            char_sequence,
            string,
            class,
            number,
            boolean,
            byte,
            character,
            short,
            integer,
            long,
            float,
            double,
            method_handle,
        }
    }
}

/// Members on the classes in [`JavaClasses`]
pub struct JavaMembers<'g> {
    pub boolean_value_of: MethodId<'g>,
    pub byte_value_of: MethodId<'g>,
    pub character_value_of: MethodId<'g>,
    pub short_value_of: MethodId<'g>,
    pub integer_value_of: MethodId<'g>,
    pub long_value_of: MethodId<'g>,
    pub float_value_of: MethodId<'g>,
    pub double_value_of: MethodId<'g>,

    pub boolean_value: MethodId<'g>,
    pub byte_value: MethodId<'g>,
    pub char_value: MethodId<'g>,
    pub short_value: MethodId<'g>,
    pub int_value: MethodId<'g>,
    pub long_value: MethodId<'g>,
    pub float_value: MethodId<'g>,
    pub double_value: MethodId<'g>,

    pub bind_to: MethodId<'g>,
}

impl<'g> JavaMembers<'g> {
    fn add_to_graph(class_graph: &ClassGraph<'g>, classes: &JavaClasses<'g>) -> JavaMembers<'g> {
        let public_static = MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC;

        let value_of = |wrapper: ClassId<'g>, base_type: BaseType| -> MethodId<'g> {
            class_graph.add_method(MethodData {
                class: wrapper,
                name: UnqualifiedName::VALUEOF,
                descriptor: MethodDescriptor {
                    parameters: vec![super::FieldType::Base(base_type)],
                    return_type: Some(super::FieldType::object(wrapper)),
                },
                access_flags: public_static,
            })
        };
        let unbox = |wrapper: ClassId<'g>,
                     name: UnqualifiedName,
                     base_type: BaseType|
         -> MethodId<'g> {
            class_graph.add_method(MethodData {
                class: wrapper,
                name,
                descriptor: MethodDescriptor {
                    parameters: vec![],
                    return_type: Some(super::FieldType::Base(base_type)),
                },
                access_flags: MethodAccessFlags::PUBLIC,
            })
        };

        let boolean_value_of = value_of(classes.boolean, BaseType::Boolean);
        let byte_value_of = value_of(classes.byte, BaseType::Byte);
        let character_value_of = value_of(classes.character, BaseType::Char);
        let short_value_of = value_of(classes.short, BaseType::Short);
        let integer_value_of = value_of(classes.integer, BaseType::Int);
        let long_value_of = value_of(classes.long, BaseType::Long);
        let float_value_of = value_of(classes.float, BaseType::Float);
        let double_value_of = value_of(classes.double, BaseType::Double);

        let boolean_value = unbox(
            classes.boolean,
            UnqualifiedName::BOOLEANVALUE,
            BaseType::Boolean,
        );
        let byte_value = unbox(classes.byte, UnqualifiedName::BYTEVALUE, BaseType::Byte);
        let char_value = unbox(
            classes.character,
            UnqualifiedName::CHARVALUE,
            BaseType::Char,
        );
        let short_value = unbox(classes.short, UnqualifiedName::SHORTVALUE, BaseType::Short);
        let int_value = unbox(classes.integer, UnqualifiedName::INTVALUE, BaseType::Int);
        let long_value = unbox(classes.long, UnqualifiedName::LONGVALUE, BaseType::Long);
        let float_value = unbox(classes.float, UnqualifiedName::FLOATVALUE, BaseType::Float);
        let double_value = unbox(
            classes.double,
            UnqualifiedName::DOUBLEVALUE,
            BaseType::Double,
        );

        let bind_to = class_graph.add_method(MethodData {
            class: classes.method_handle,
            name: UnqualifiedName::BINDTO,
            descriptor: MethodDescriptor {
                parameters: vec![super::FieldType::object(classes.object)],
                return_type: Some(super::FieldType::object(classes.method_handle)),
            },
            access_flags: MethodAccessFlags::PUBLIC,
        });

        JavaMembers {
            boolean_value_of,
            byte_value_of,
            character_value_of,
            short_value_of,
            integer_value_of,
            long_value_of,
            float_value_of,
            double_value_of,
            boolean_value,
            byte_value,
            char_value,
            short_value,
            int_value,
            long_value,
            float_value,
            double_value,
            bind_to,
        }
    }
}
