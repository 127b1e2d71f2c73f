//! The abstract metadata schema this crate clones against: target-side entities
//! (arena-allocated, interior-mutable — this crate's own write surface) and
//! source-side entities (an owned, object-safe trait contract any metadata
//! reader can implement). See `crate::source` for concrete implementations of
//! the latter.

pub mod attributes;
pub mod il;
pub mod members;
pub mod method_ref;
pub mod source;
pub mod target;
pub mod type_ref;

pub use attributes::*;
pub use il::*;
pub use members::*;
pub use method_ref::*;
pub use target::*;
pub use type_ref::*;
