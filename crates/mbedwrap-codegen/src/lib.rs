//! JerryScript binding generation for mbed C++ classes.
//!
//! Given a resolved [`SymbolTree`](mbedwrap_dwarf::SymbolTree) and a class
//! node, this crate produces the C++ glue that exposes the class to
//! JerryScript:
//!
//! 1. [`classify`] decides which public members are constructors or
//!    instance methods.
//! 2. [`categorize`] maps every parameter and return type onto a
//!    [`TypeCategory`].
//! 3. The policy table in [`policy`] turns each category into argument
//!    checks, conversions and return statements.
//! 4. [`BindingGenerator`] groups overloads, collects enumerations and
//!    renders the final text.

mod category;
mod class;
mod classify;
mod enums;
mod error;
pub mod policy;
mod writer;

pub use category::{categorize, spelling, NativeType, StringKind, TypeCategory, MAX_TYPE_DEPTH};
pub use class::{
    BindingGenerator, ClassBindings, ClassEmitter, DroppedFunction, FunctionBinding,
    CONSTRUCTOR_NAME,
};
pub use classify::{base_name, classify, MemberKind};
pub use enums::{EnumBinding, EnumRegistry};
pub use error::{CodegenError, Result};
pub use writer::CodeWriter;
