//! Model of the JVM types and members that delegation reasons about
//!
//! The starting point is always a [`ClassGraph`]: an arena-backed, append-only index of classes,
//! interfaces, and methods. Everything else in the crate works off of handles into that graph.
//!
//! ```
//! use jbind::jvm::*;
//!
//! let arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&arenas);
//! let java = class_graph.insert_java_library_types();
//!
//! let greeter = class_graph.add_class(ClassData::new(
//!     BinaryName::from_string(String::from("me/example/Greeter")).unwrap(),
//!     java.classes.object,
//!     ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
//! ));
//! let greet = class_graph.add_method(MethodData {
//!     class: greeter,
//!     name: UnqualifiedName::from_string(String::from("greet")).unwrap(),
//!     descriptor: MethodDescriptor {
//!         parameters: vec![FieldType::object(java.classes.string)],
//!         return_type: None,
//!     },
//!     access_flags: MethodAccessFlags::PUBLIC,
//! });
//!
//! assert_eq!(greet.infer_invoke_type(), InvokeType::Virtual);
//! ```

mod access_flags;
pub mod class_graph;
mod descriptors;
mod names;

pub use access_flags::*;
pub use class_graph::{
    ClassData, ClassGraph, ClassGraphArenas, ClassId, InvokeType, JavaClasses, JavaLibrary,
    JavaMembers, MethodData, MethodId,
};
pub use descriptors::*;
pub use names::*;
