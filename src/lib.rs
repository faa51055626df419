//! Bind intercepted JVM calls to delegation targets
//!
//! Given the shape of an intercepted method call and a pool of candidate methods, this crate
//! picks the one candidate the call should delegate to and produces the straight-line bytecode
//! that performs the delegation: argument loads, type conversions, the invocation, and the
//! return. It never touches classfile bytes; emission is left to a [`fragment::CodeSink`]
//! implemented by the caller.
//!
//! ```
//! use jbind::bind::{BindingResolver, BindingSettings, CallSignature, Candidate};
//! use jbind::fragment::Instruction;
//! use jbind::jvm::*;
//!
//! let arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&arenas);
//! let java = class_graph.insert_java_library_types();
//!
//! let class = class_graph.add_class(ClassData::new(
//!     BinaryName::from_string(String::from("me/example/Greeter")).unwrap(),
//!     java.classes.object,
//!     ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
//! ));
//! let call = class_graph.add_method(MethodData {
//!     class,
//!     name: UnqualifiedName::from_string(String::from("greet")).unwrap(),
//!     descriptor: MethodDescriptor {
//!         parameters: vec![FieldType::int()],
//!         return_type: Some(FieldType::long()),
//!     },
//!     access_flags: MethodAccessFlags::PUBLIC,
//! });
//! let target = class_graph.add_method(MethodData {
//!     class,
//!     name: UnqualifiedName::from_string(String::from("intercepted")).unwrap(),
//!     descriptor: MethodDescriptor {
//!         parameters: vec![FieldType::long()],
//!         return_type: Some(FieldType::long()),
//!     },
//!     access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
//! });
//!
//! let resolver = BindingResolver::new(
//!     &class_graph,
//!     &java,
//!     vec![Candidate::new(target)],
//!     BindingSettings::standard(),
//! )
//! .unwrap();
//! let binding = resolver.resolve(CallSignature::new(call)).unwrap();
//! assert_eq!(
//!     binding.fragment().instructions(),
//!     &[
//!         Instruction::ILoad(1),
//!         Instruction::I2L,
//!         Instruction::Invoke(InvokeType::Static, target),
//!         Instruction::LReturn,
//!     ]
//! );
//! ```

pub mod assign;
pub mod bind;
mod errors;
pub mod fragment;
pub mod jvm;
pub mod util;

pub use errors::Error;
