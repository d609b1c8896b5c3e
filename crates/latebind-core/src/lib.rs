//! Latebind Core crate.
//!
//! Shared vocabulary for the latebind crates:
//! - [`Span`] source locations
//! - [`QualifiedName`] dotted names identifying modules and types
//! - [`TypeHash`] stable identities derived from qualified names
//! - [`Value`] / [`Instance`] runtime objects produced by instantiation
//! - [`ConcreteType`] the "real" implementation behind a type placeholder
//! - the unified error hierarchy in [`error`]

pub mod concrete;
pub mod error;
mod qualified_name;
mod span;
mod type_hash;
pub mod value;

pub use concrete::{Allocator, ConcreteType, Initializer, PostInit, bind_arguments};
pub use error::{
    DeferredError, DispatchError, HostError, InstanceError, LatebindError, LexError, ParseError,
    ParseErrorKind, ParseErrors, RegistrationError,
};
pub use qualified_name::QualifiedName;
pub use span::Span;
pub use type_hash::TypeHash;
pub use value::{Argument, Instance, Value};
