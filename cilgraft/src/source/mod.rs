//! Concrete `SourceModule` implementations: [`fake`] backs the
//! crate's own tests with an in-memory, builder-constructed module; the
//! `dotscope` feature (default-on) adds [`dotscope_module`], a thin adapter
//! over a real PE/metadata reader.

pub mod fake;

#[cfg(feature = "dotscope")]
pub mod dotscope_module;
